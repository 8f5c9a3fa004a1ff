//! In-memory assembly of reply forests.
//!
//! Works on the flat, ordered rows of one video. Assembly is iterative so
//! arbitrarily deep reply chains cannot exhaust the stack.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::models::{CommentAuthor, CommentNode, CommentReactionTally, ThreadComment};

/// Builds the forest hanging below `root`, or the top-level forest when
/// `root` is `None`.
///
/// `rows` must be ordered by `(created_at, id)`; siblings keep that order.
/// Rows unreachable from `root` are left out and every reachable row appears
/// exactly once, even if the stored parent links contain a cycle.
pub fn build_forest(
    rows: Vec<ThreadComment>,
    tallies: &HashMap<Uuid, CommentReactionTally>,
    requester: Option<Uuid>,
    root: Option<Uuid>,
) -> Vec<CommentNode> {
    let mut children: HashMap<Option<Uuid>, Vec<usize>> = HashMap::new();
    for (index, row) in rows.iter().enumerate() {
        children.entry(row.parent_id).or_default().push(index);
    }

    let top: Vec<usize> = children.get(&root).cloned().unwrap_or_default();

    // Pre-order walk: a parent always precedes its descendants.
    let mut order = Vec::with_capacity(rows.len());
    let mut seen = HashSet::new();
    if let Some(root_id) = root {
        seen.insert(root_id);
    }
    let mut stack: Vec<usize> = top.iter().rev().copied().collect();
    while let Some(index) = stack.pop() {
        if !seen.insert(rows[index].id) {
            continue;
        }
        order.push(index);
        if let Some(kids) = children.get(&Some(rows[index].id)) {
            stack.extend(kids.iter().rev().copied());
        }
    }

    let mut built: Vec<Option<CommentNode>> = Vec::with_capacity(rows.len());
    built.resize_with(rows.len(), || None);
    let mut rows: Vec<Option<ThreadComment>> = rows.into_iter().map(Some).collect();

    // Reverse pre-order finishes every child before its parent.
    for &index in order.iter().rev() {
        let Some(row) = rows[index].take() else {
            continue;
        };
        let replies = children
            .get(&Some(row.id))
            .map(|kids| kids.iter().filter_map(|&kid| built[kid].take()).collect())
            .unwrap_or_default();
        built[index] = Some(to_node(row, tallies, requester, replies));
    }

    top.iter().filter_map(|&index| built[index].take()).collect()
}

fn to_node(
    row: ThreadComment,
    tallies: &HashMap<Uuid, CommentReactionTally>,
    requester: Option<Uuid>,
    replies: Vec<CommentNode>,
) -> CommentNode {
    let (like_count, dislike_count) = tallies
        .get(&row.id)
        .map(|t| (t.like_count, t.dislike_count))
        .unwrap_or((0, 0));

    CommentNode {
        id: row.id,
        comment: row.comment,
        is_owner: requester == Some(row.author_id),
        user: CommentAuthor {
            id: row.author_id,
            name: row.author_name,
            avatar: row.author_avatar,
        },
        parent_id: row.parent_id,
        created_at: row.created_at,
        updated_at: row.updated_at,
        like_count,
        dislike_count,
        replies,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn row(id: Uuid, parent_id: Option<Uuid>, author: Uuid, minute: i64) -> ThreadComment {
        let at = Utc::now() + Duration::minutes(minute);
        ThreadComment {
            id,
            video_id: Uuid::nil(),
            parent_id,
            comment: format!("comment {minute}"),
            created_at: at,
            updated_at: at,
            author_id: author,
            author_name: "author".into(),
            author_avatar: "avatar".into(),
        }
    }

    fn ids(nodes: &[CommentNode]) -> Vec<Uuid> {
        nodes.iter().map(|n| n.id).collect()
    }

    #[test]
    fn every_comment_lands_once_in_read_order() {
        let author = Uuid::new_v4();
        let (a, b, a1, a2, a1x) = (
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let rows = vec![
            row(a, None, author, 0),
            row(b, None, author, 1),
            row(a1, Some(a), author, 2),
            row(a2, Some(a), author, 3),
            row(a1x, Some(a1), author, 4),
        ];

        let forest = build_forest(rows, &HashMap::new(), None, None);

        assert_eq!(ids(&forest), vec![a, b]);
        assert_eq!(ids(&forest[0].replies), vec![a1, a2]);
        assert_eq!(ids(&forest[0].replies[0].replies), vec![a1x]);
        assert!(forest[1].replies.is_empty());
        assert!(forest[0].replies[1].replies.is_empty());
        let total: usize = forest.iter().map(CommentNode::subtree_len).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn subtree_of_a_comment_excludes_the_comment_itself() {
        let author = Uuid::new_v4();
        let (top, reply, nested, other) = (
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
        );
        let rows = vec![
            row(top, None, author, 0),
            row(other, None, author, 1),
            row(reply, Some(top), author, 2),
            row(nested, Some(reply), author, 3),
        ];

        let forest = build_forest(rows, &HashMap::new(), None, Some(top));

        assert_eq!(ids(&forest), vec![reply]);
        assert_eq!(ids(&forest[0].replies), vec![nested]);
    }

    #[test]
    fn decorates_with_tallies_and_ownership() {
        let (me, them) = (Uuid::new_v4(), Uuid::new_v4());
        let (mine, theirs) = (Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![row(mine, None, me, 0), row(theirs, Some(mine), them, 1)];
        let tallies = HashMap::from([(
            mine,
            CommentReactionTally {
                comment_id: mine,
                like_count: 3,
                dislike_count: 1,
            },
        )]);

        let forest = build_forest(rows, &tallies, Some(me), None);

        assert!(forest[0].is_owner);
        assert_eq!((forest[0].like_count, forest[0].dislike_count), (3, 1));
        let reply = &forest[0].replies[0];
        assert!(!reply.is_owner);
        assert_eq!((reply.like_count, reply.dislike_count), (0, 0));
    }

    #[test]
    fn deep_chains_are_assembled_without_recursion() {
        let author = Uuid::new_v4();
        let depth = 1_000;
        let mut rows = Vec::with_capacity(depth);
        let mut parent = None;
        for minute in 0..depth {
            let id = Uuid::new_v4();
            rows.push(row(id, parent, author, minute as i64));
            parent = Some(id);
        }

        let forest = build_forest(rows, &HashMap::new(), None, None);

        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].subtree_len(), depth);
    }

    #[test]
    fn cyclic_links_do_not_loop() {
        let author = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let rows = vec![row(a, Some(b), author, 0), row(b, Some(a), author, 1)];

        let forest = build_forest(rows, &HashMap::new(), None, Some(a));

        assert_eq!(ids(&forest), vec![b]);
        assert!(forest[0].replies.is_empty());
    }
}

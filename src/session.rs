use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;

/// Live login sessions keyed by token id (`jti`).
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn store_session(&self, session_id: &str, user_id: &str, ttl_seconds: u64) -> Result<()>;

    async fn get_session(&self, session_id: &str) -> Result<Option<String>>;

    async fn delete_session(&self, session_id: &str) -> Result<()>;
}

/// Process-local sessions, used when no Redis is wired in (tests).
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, (String, Instant)>>,
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn store_session(&self, session_id: &str, user_id: &str, ttl_seconds: u64) -> Result<()> {
        let expires_at = Instant::now() + Duration::from_secs(ttl_seconds);
        self.sessions
            .lock()
            .await
            .insert(session_id.to_string(), (user_id.to_string(), expires_at));
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<String>> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(session_id) {
            Some((user_id, expires_at)) if *expires_at > Instant::now() => Ok(Some(user_id.clone())),
            Some(_) => {
                sessions.remove(session_id);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.sessions.lock().await.remove(session_id);
        Ok(())
    }
}

use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::{error::Result, session::SessionStore};

#[derive(Clone)]
pub struct RedisClient {
    manager: Arc<Mutex<ConnectionManager>>,
}

impl RedisClient {
    pub async fn new(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(Self {
            manager: Arc::new(Mutex::new(manager)),
        })
    }

    fn session_key(session_id: &str) -> String {
        format!("session:{}", session_id)
    }
}

#[async_trait]
impl SessionStore for RedisClient {
    async fn store_session(&self, session_id: &str, user_id: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let _: () = conn
            .set_ex(Self::session_key(session_id), user_id, ttl_seconds)
            .await?;
        Ok(())
    }

    async fn get_session(&self, session_id: &str) -> Result<Option<String>> {
        let mut conn = self.manager.lock().await;
        let user_id: Option<String> = conn.get(Self::session_key(session_id)).await?;
        Ok(user_id)
    }

    async fn delete_session(&self, session_id: &str) -> Result<()> {
        let mut conn = self.manager.lock().await;
        let _: () = conn.del(Self::session_key(session_id)).await?;
        Ok(())
    }
}

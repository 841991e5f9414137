use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::error::SinkError;
use crate::store::ListStore;

/// Redis-backed [`ListStore`] over a multiplexed async connection.
///
/// URL format: `redis://[:password@]host:port[/db]`.
#[derive(Clone)]
pub struct RedisListStore {
    connection: MultiplexedConnection,
}

impl RedisListStore {
    /// Open a connection to the Redis server at `url`.
    pub async fn connect(url: &str) -> Result<Self, SinkError> {
        let client = redis::Client::open(url).map_err(store_error)?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(store_error)?;
        Ok(RedisListStore { connection })
    }
}

fn store_error(e: redis::RedisError) -> SinkError {
    SinkError::Store(e.to_string())
}

fn index(value: usize) -> isize {
    isize::try_from(value).unwrap_or(isize::MAX)
}

#[async_trait]
impl ListStore for RedisListStore {
    async fn push_capped(&self, key: &str, value: &str, cap: usize) -> Result<(), SinkError> {
        let mut connection = self.connection.clone();
        // MULTI / EXEC so concurrent writers never observe the untrimmed list.
        redis::pipe()
            .atomic()
            .rpush(key, value)
            .ignore()
            .ltrim(key, -index(cap), -1)
            .ignore()
            .query_async::<_, ()>(&mut connection)
            .await
            .map_err(store_error)
    }

    async fn range(&self, key: &str, start: isize, stop: isize) -> Result<Vec<String>, SinkError> {
        let mut connection = self.connection.clone();
        connection.lrange(key, start, stop).await.map_err(store_error)
    }

    async fn len(&self, key: &str) -> Result<usize, SinkError> {
        let mut connection = self.connection.clone();
        connection.llen(key).await.map_err(store_error)
    }

    async fn pop_front(&self, key: &str) -> Result<Option<String>, SinkError> {
        let mut connection = self.connection.clone();
        connection.lpop(key, None).await.map_err(store_error)
    }

    async fn pop_back(&self, key: &str) -> Result<Option<String>, SinkError> {
        let mut connection = self.connection.clone();
        connection.rpop(key, None).await.map_err(store_error)
    }

    async fn del(&self, key: &str) -> Result<(), SinkError> {
        let mut connection = self.connection.clone();
        connection.del(key).await.map_err(store_error)
    }
}

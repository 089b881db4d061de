use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, RedisResult};
use tracing::info;

#[derive(Clone)]
pub struct RedisClient {
    conn: MultiplexedConnection,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        let conn = client.get_multiplexed_async_connection().await?;
        info!("Connected to Redis");
        Ok(Self { conn })
    }

    pub async fn ping(&self) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }

    // Plain values

    pub async fn get_value(&self, key: &str) -> RedisResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    pub async fn set_value(&self, key: &str, value: &str) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await
    }

    pub async fn set_value_ex(&self, key: &str, value: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds).await
    }

    /// SET NX: only the first writer of `key` wins.
    pub async fn claim_key(&self, key: &str, value: &str) -> RedisResult<bool> {
        let mut conn = self.conn.clone();
        let result: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .query_async(&mut conn)
            .await?;

        Ok(result.is_some())
    }

    pub async fn del_key(&self, key: &str) -> RedisResult<bool> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    // Sorted-set indexes

    pub async fn index_add(&self, index: &str, member: &str, score: i64) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.zadd::<_, _, _, ()>(index, member, score).await
    }

    pub async fn index_remove(&self, index: &str, member: &str) -> RedisResult<()> {
        let mut conn = self.conn.clone();
        conn.zrem::<_, _, ()>(index, member).await
    }

    /// Members ordered by descending score.
    pub async fn index_members(&self, index: &str) -> RedisResult<Vec<String>> {
        let mut conn = self.conn.clone();
        conn.zrevrange(index, 0, -1).await
    }

    /// Fixed window counter: the window starts with the first hit on `key`.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: i64) -> RedisResult<bool> {
        let mut conn = self.conn.clone();

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .incr(key, 1)
            .cmd("EXPIRE")
            .arg(key)
            .arg(window_seconds)
            .arg("NX")
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

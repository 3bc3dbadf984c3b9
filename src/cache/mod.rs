use redis::{aio::MultiplexedConnection, Client};

pub mod catalog;

pub use catalog::CachedCatalog;

#[derive(Clone)]
pub struct CacheService {
    conn: MultiplexedConnection,
    catalog_ttl_seconds: u64,
}

impl CacheService {
    pub async fn connect(redis_url: &str, catalog_ttl_seconds: u64) -> redis::RedisResult<Self> {
        let client = Client::open(redis_url)?;
        let conn = client.get_multiplexed_tokio_connection().await?;
        Ok(Self {
            conn,
            catalog_ttl_seconds,
        })
    }
}

fn show_key(show_id: i64) -> String {
    format!("show:{}:catalog", show_id)
}

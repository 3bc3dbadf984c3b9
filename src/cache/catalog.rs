use async_trait::async_trait;
use redis::AsyncCommands;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{show_key, CacheService};
use crate::models::ShowCatalogEntry;
use crate::store::{ShowCatalog, StoreError};

impl CacheService {
    pub async fn get_show(&self, show_id: i64) -> Result<Option<ShowCatalogEntry>, redis::RedisError> {
        let mut conn = self.conn.clone();
        let data: Option<String> = conn.get(show_key(show_id)).await?;
        let Some(data) = data else {
            return Ok(None);
        };
        let entry = serde_json::from_str(&data).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Parse error"))
        })?;
        Ok(Some(entry))
    }

    pub async fn save_show(&self, entry: &ShowCatalogEntry) -> Result<(), redis::RedisError> {
        let data = serde_json::to_string(entry).map_err(|_| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "Serialize error"))
        })?;
        let mut conn = self.conn.clone();
        conn.set_ex(show_key(entry.show.id), data, self.catalog_ttl_seconds)
            .await
    }
}

/// Read-through cache in front of a catalog. Only static show data goes
/// through here; seat claims are always read from the ledger.
pub struct CachedCatalog {
    inner: Arc<dyn ShowCatalog>,
    cache: CacheService,
}

impl CachedCatalog {
    pub fn new(inner: Arc<dyn ShowCatalog>, cache: CacheService) -> Self {
        Self { inner, cache }
    }
}

#[async_trait]
impl ShowCatalog for CachedCatalog {
    async fn load_show(&self, show_id: i64) -> Result<Option<ShowCatalogEntry>, StoreError> {
        match self.cache.get_show(show_id).await {
            Ok(Some(entry)) => {
                debug!("Catalog cache hit for show {}", show_id);
                return Ok(Some(entry));
            }
            Ok(None) => {}
            // Redis trouble falls back to the database
            Err(e) => warn!("Catalog cache read failed for show {}: {:?}", show_id, e),
        }

        let entry = self.inner.load_show(show_id).await?;
        if let Some(entry) = &entry {
            if let Err(e) = self.cache.save_show(entry).await {
                warn!("Failed to cache catalog for show {}: {:?}", show_id, e);
            }
        }
        Ok(entry)
    }
}

//! Catalog cache tests against a live Redis. Ignored by default:
//! `REDIS_URL=redis://127.0.0.1:6379 cargo test -- --ignored` runs them.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use redis::AsyncCommands;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cinema_booking::{
    cache::{CacheService, CachedCatalog},
    models::{Auditorium, Seat, SeatPrice, Show, ShowCatalogEntry},
    store::{ShowCatalog, StoreError},
};

fn redis_url() -> String {
    std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string())
}

fn entry(show_id: i64) -> ShowCatalogEntry {
    ShowCatalogEntry {
        show: Show {
            id: show_id,
            movie_id: 3,
            auditorium_id: 7,
            start_at: Utc.with_ymd_and_hms(2024, 5, 1, 20, 0, 0).unwrap(),
        },
        auditorium: Auditorium {
            id: 7,
            name: "Hall 1".to_string(),
            cinema_id: 1,
        },
        seats: vec![Seat {
            id: 1,
            row: "A".to_string(),
            number: 1,
            seat_type: "STANDARD".to_string(),
            row_offset: 0,
            column_offset: 0,
        }],
        prices: vec![SeatPrice {
            seat_type: "STANDARD".to_string(),
            price_cents: 1000,
        }],
    }
}

/// Catalog that knows a single show and counts how often it is asked.
struct CountingCatalog {
    show_id: i64,
    loads: AtomicUsize,
}

impl CountingCatalog {
    fn new(show_id: i64) -> Arc<Self> {
        Arc::new(Self {
            show_id,
            loads: AtomicUsize::new(0),
        })
    }

    fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ShowCatalog for CountingCatalog {
    async fn load_show(&self, show_id: i64) -> Result<Option<ShowCatalogEntry>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok((show_id == self.show_id).then(|| entry(show_id)))
    }
}

async fn raw_connection() -> redis::aio::MultiplexedConnection {
    redis::Client::open(redis_url())
        .unwrap()
        .get_multiplexed_tokio_connection()
        .await
        .unwrap()
}

async fn cached(inner: Arc<CountingCatalog>) -> CachedCatalog {
    let cache = CacheService::connect(&redis_url(), 60).await.unwrap();
    CachedCatalog::new(inner, cache)
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn miss_fills_cache_and_next_load_is_a_hit() {
    let mut conn = raw_connection().await;
    let _: () = conn.del("show:10:catalog").await.unwrap();
    let inner = CountingCatalog::new(10);
    let catalog = cached(inner.clone()).await;

    let first = catalog.load_show(10).await.unwrap().unwrap();
    assert_eq!(inner.loads(), 1);
    let stored: Option<String> = conn.get("show:10:catalog").await.unwrap();
    assert!(stored.is_some());

    let second = catalog.load_show(10).await.unwrap().unwrap();
    assert_eq!(inner.loads(), 1);
    assert_eq!(second.show.id, first.show.id);
    assert_eq!(second.seats.len(), 1);
    assert_eq!(second.prices[0].price_cents, 1000);

    let _: () = conn.del("show:10:catalog").await.unwrap();
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn corrupt_entry_falls_back_to_inner_catalog() {
    let mut conn = raw_connection().await;
    let _: () = conn.set("show:20:catalog", "garbage").await.unwrap();
    let inner = CountingCatalog::new(20);
    let catalog = cached(inner.clone()).await;

    let loaded = catalog.load_show(20).await.unwrap().unwrap();

    assert_eq!(loaded.show.id, 20);
    assert_eq!(inner.loads(), 1);
    // The fresh load overwrites the unreadable value
    let stored: String = conn.get("show:20:catalog").await.unwrap();
    assert_ne!(stored, "garbage");

    let _: () = conn.del("show:20:catalog").await.unwrap();
}

#[tokio::test]
#[ignore = "requires REDIS_URL"]
async fn missing_show_is_not_cached() {
    let mut conn = raw_connection().await;
    let _: () = conn.del("show:31:catalog").await.unwrap();
    let catalog = cached(CountingCatalog::new(30)).await;

    assert!(catalog.load_show(31).await.unwrap().is_none());

    let exists: bool = conn.exists("show:31:catalog").await.unwrap();
    assert!(!exists);
}

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use crate::clock::Clock;
use crate::store::BookingLedger;

/// Background housekeeping that rewrites lapsed holds as `EXPIRED`.
///
/// Seat availability never depends on it: expiry is evaluated when the seat
/// map is read, so this only keeps the ledger tidy.
pub struct HoldSweeper {
    ledger: Arc<dyn BookingLedger>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl HoldSweeper {
    pub fn new(ledger: Arc<dyn BookingLedger>, clock: Arc<dyn Clock>, interval: Duration) -> Self {
        Self {
            ledger,
            clock,
            interval,
        }
    }

    /// One pass; returns how many holds were expired.
    pub async fn sweep_once(&self) -> u64 {
        match self.ledger.expire_lapsed_holds(self.clock.now()).await {
            Ok(0) => 0,
            Ok(expired) => {
                info!("🧹 Expired {} lapsed holds", expired);
                expired
            }
            Err(e) => {
                error!("Hold sweep failed: {:?}", e);
                0
            }
        }
    }

    pub async fn run(self) {
        info!("Hold sweeper running every {:?}", self.interval);
        loop {
            self.sweep_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }
}

//! Periodic idle counter for connected remotes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use xyfi_core::RandomSource;

use crate::application::relay_service::RelayCore;

/// Calls [`RelayCore::tick_idle`] every `period` until `running` is cleared.
///
/// The immediate first tick of the interval is skipped, so the first
/// increment happens one full period after start.
pub async fn run_idle_ticker<R: RandomSource>(
    core: Arc<RelayCore<R>>,
    period: Duration,
    running: Arc<AtomicBool>,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    info!(?period, "idle ticker started");
    loop {
        ticker.tick().await;
        if !running.load(Ordering::SeqCst) {
            break;
        }
        debug!("idle tick");
        core.tick_idle();
    }
    info!("idle ticker stopped");
}

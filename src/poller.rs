use crate::domain::utility::VOLATILE_UTILITIES;
use crate::ws::CommandDispatcher;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, instrument, trace};

/// Re-reads the utilities that change without user action, the device never pushes them.
#[instrument(skip(dispatcher))]
pub async fn poll(dispatcher: CommandDispatcher, period: Duration) {
    info!("🔁 Polling {:?} every {:?}", VOLATILE_UTILITIES, period);

    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately and the full read on connect already covers it
    ticker.tick().await;

    loop {
        ticker.tick().await;
        if !dispatcher.is_open() {
            debug!("🔁 Skipped poll, device not connected");
            continue;
        }
        if dispatcher.read_utilities(&VOLATILE_UTILITIES).await {
            trace!("🔁 Polled volatile utilities");
        }
    }
}

//! Tick source for a shared registry

use embassy_time::{Duration, Ticker};

use crate::detect::Detect;
use crate::registry::Handler;
use crate::shared::SharedRegistry;

/// Polls every enabled key of `registry` once per `period`, forever.
///
/// Key timings are counted in passes, so `period` must match the tick the keys were configured
/// for, see [`KeyConfig::from_durations`](crate::config::KeyConfig::from_durations).
pub async fn run<D: Detect, H: Handler, const N: usize>(registry: &SharedRegistry<D, H, N>, period: Duration) -> ! {
    debug!("polling keys every {} us", period.as_micros());
    let mut ticker = Ticker::every(period);

    loop {
        ticker.next().await;
        registry.poll_all();
    }
}

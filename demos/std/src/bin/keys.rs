use core::sync::atomic::{AtomicBool, Ordering};

use embassy_executor::{Executor, Spawner};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Duration, Timer};
use key_service::forward::Forward;
use key_service::{ActiveState, Detect, EventMask, KeyConfig, KeyId, Notification, SharedRegistry};
use log::info;
use static_cell::StaticCell;

const TICK: Duration = Duration::from_millis(5);
const QUEUE_SIZE: usize = 8;

/// Mock pulled-up key lines, low while held
mod line {
    use super::*;

    pub static POWER: AtomicBool = AtomicBool::new(true);
    pub static VOLUME: AtomicBool = AtomicBool::new(true);

    #[derive(Copy, Clone)]
    pub struct Line(pub &'static AtomicBool);

    impl Detect for Line {
        fn detect(&mut self) -> bool {
            self.0.load(Ordering::Relaxed)
        }
    }

    pub async fn hold(line: &AtomicBool, ms: u64) {
        line.store(false, Ordering::Relaxed);
        Timer::after_millis(ms).await;
        line.store(true, Ordering::Relaxed);
    }
}

type Queue = Channel<CriticalSectionRawMutex, Notification, QUEUE_SIZE>;
type Keys = SharedRegistry<line::Line, Forward<'static, CriticalSectionRawMutex, QUEUE_SIZE>, 4>;

static QUEUE: Queue = Channel::new();
static KEYS: Keys = SharedRegistry::new();

/// Presses the mock keys in a loop
#[embassy_executor::task]
async fn user() {
    loop {
        info!("Single press on power");
        line::hold(&line::POWER, 100).await;
        Timer::after_secs(1).await;

        info!("Double press on power");
        line::hold(&line::POWER, 80).await;
        Timer::after_millis(120).await;
        line::hold(&line::POWER, 80).await;
        Timer::after_secs(1).await;

        info!("Long press on volume");
        line::hold(&line::VOLUME, 1500).await;
        Timer::after_secs(2).await;
    }
}

#[embassy_executor::task]
async fn ticker() {
    key_service::task::run(&KEYS, TICK).await
}

/// Consumes the forwarded key events
#[embassy_executor::task]
async fn host(power: KeyId, volume: KeyId) {
    loop {
        let Notification { key, event, count } = QUEUE.receive().await;
        let name = if key == power {
            "power"
        } else if key == volume {
            "volume"
        } else {
            "unknown"
        };
        info!("Host received {:?} from {} key (count {})", event, name, count);
    }
}

#[embassy_executor::task]
async fn run(spawner: Spawner) {
    let config = KeyConfig::from_durations(
        TICK,
        Duration::from_millis(1000),
        Duration::from_millis(15),
        Duration::from_millis(300),
        ActiveState::ActiveLow,
    );

    let (power, volume) = KEYS
        .lock(|keys| -> key_service::Result<_> {
            let power = keys.create(config, line::Line(&line::POWER), Forward::new(&QUEUE))?;
            let volume = keys.create(
                config,
                line::Line(&line::VOLUME),
                Forward::with_mask(&QUEUE, EventMask::ALL_PRESS | EventMask::ALL_RELEASE),
            )?;
            keys.enable(power)?;
            keys.enable(volume)?;
            Ok((power, volume))
        })
        .and_then(|created| created)
        .unwrap();
    info!("Keys created");

    spawner.must_spawn(host(power, volume));
    spawner.must_spawn(ticker());
    spawner.must_spawn(user());
}

fn main() {
    env_logger::builder().filter_level(log::LevelFilter::Info).init();

    static EXECUTOR: StaticCell<Executor> = StaticCell::new();
    let executor = EXECUTOR.init(Executor::new());
    executor.run(|spawner| {
        spawner.must_spawn(run(spawner));
    });
}

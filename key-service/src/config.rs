//! Key configuration

use embassy_time::Duration;

use crate::key::MAX_TICKS;

/// Default debounce time, 10ms at a 100Hz tick.
pub const DEFAULT_DEBOUNCE_TICKS: u16 = 1;
/// Default long press duration, 250ms at a 100Hz tick.
pub const DEFAULT_HOLD_TICKS: u16 = 25;
/// Default multi-press window, 150ms at a 100Hz tick.
pub const DEFAULT_MULTI_PRESS_INTERVAL_TICKS: u16 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Enum representing if the key is active low or active high.
pub enum ActiveState {
    /// Key reads low while pressed.
    ActiveLow,
    /// Key reads high while pressed.
    ActiveHigh,
}

impl ActiveState {
    /// Line level that means "pressed", `true` being high.
    pub const fn pressed_level(self) -> bool {
        matches!(self, ActiveState::ActiveHigh)
    }

    /// Returns true if a line reading of `level` means the key is pressed.
    pub const fn is_pressed(self, level: bool) -> bool {
        level == self.pressed_level()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Struct representing the timing and polarity of a key, all durations in ticks.
pub struct KeyConfig {
    pub(crate) hold_ticks: u16,
    pub(crate) debounce_ticks: u16,
    pub(crate) multi_press_interval_ticks: u16,
    pub(crate) active_state: ActiveState,
}

impl KeyConfig {
    /// Creates a new KeyConfig from tick counts.
    pub const fn new(
        hold_ticks: u16,
        debounce_ticks: u16,
        multi_press_interval_ticks: u16,
        active_state: ActiveState,
    ) -> Self {
        Self {
            hold_ticks,
            debounce_ticks,
            multi_press_interval_ticks,
            active_state,
        }
    }

    /// Creates a new KeyConfig from durations, given the period the key will be polled at.
    ///
    /// Durations are truncated to whole ticks and clamp to [`MAX_TICKS`]. A zero `tick` period
    /// yields thresholds that are never reached.
    pub fn from_durations(
        tick: Duration,
        hold: Duration,
        debounce: Duration,
        multi_press_interval: Duration,
        active_state: ActiveState,
    ) -> Self {
        Self::new(
            to_ticks(hold, tick),
            to_ticks(debounce, tick),
            to_ticks(multi_press_interval, tick),
            active_state,
        )
    }

    /// Gets the long press duration.
    pub fn hold_ticks(&self) -> u16 {
        self.hold_ticks
    }

    /// Gets the debounce time.
    pub fn debounce_ticks(&self) -> u16 {
        self.debounce_ticks
    }

    /// Gets the multi-press window.
    pub fn multi_press_interval_ticks(&self) -> u16 {
        self.multi_press_interval_ticks
    }

    /// Gets the key polarity.
    pub fn active_state(&self) -> ActiveState {
        self.active_state
    }
}

/// Default KeyConfig: 1 tick debounce, 25 tick hold, 15 tick multi-press window, active low.
impl Default for KeyConfig {
    fn default() -> Self {
        Self::new(
            DEFAULT_HOLD_TICKS,
            DEFAULT_DEBOUNCE_TICKS,
            DEFAULT_MULTI_PRESS_INTERVAL_TICKS,
            ActiveState::ActiveLow,
        )
    }
}

fn to_ticks(duration: Duration, tick: Duration) -> u16 {
    duration
        .as_ticks()
        .checked_div(tick.as_ticks())
        .map_or(MAX_TICKS, |ticks| u16::try_from(ticks).unwrap_or(MAX_TICKS))
}

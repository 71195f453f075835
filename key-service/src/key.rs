//! Key state machine
//!
//! A [`Key`] turns one polled line reading per tick into debounced press/release transitions,
//! long presses and multi-press runs. It owns no callbacks: [`Key::poll`] takes the line reader
//! and the event sink per call, so a key can be driven on its own or through a
//! [`Registry`](crate::registry::Registry).

use crate::config::{ActiveState, KeyConfig};
use crate::detect::Detect;
use crate::event::Event;

/// Ceiling of the tick counters, they saturate here.
pub const MAX_TICKS: u16 = u16::MAX;
/// Ceiling of the multi-press count.
pub const MAX_COUNT: u8 = u8::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Debounced key state.
pub enum PressState {
    /// Key is up
    Unpressed,
    /// Key is down
    Pressed,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
/// Debounce and gesture state of a single key.
pub struct Key {
    config: KeyConfig,
    pressed_ticks: u16,
    multi_press_ticks: u16,
    multi_press_count: u8,
    press_state: PressState,
    long_pressed: bool,
}

impl Key {
    /// Creates a new, unpressed key.
    pub const fn new(config: KeyConfig) -> Self {
        Self {
            config,
            pressed_ticks: 0,
            multi_press_ticks: 0,
            multi_press_count: 0,
            press_state: PressState::Unpressed,
            long_pressed: false,
        }
    }

    /// Runs one tick: multi-press expiry, then one reading of `detect`, then classification.
    ///
    /// `emit` receives every event of this tick, with the multi-press count it was raised at.
    pub fn poll<D: Detect + ?Sized>(&mut self, detect: &mut D, mut emit: impl FnMut(Event, u8)) {
        if let Some((event, count)) = self.expire() {
            emit(event, count);
        }

        let level = detect.detect();
        if let Some((event, count)) = self.update(level) {
            emit(event, count);
        }
    }

    /// First half of a tick: advance the multi-press window and close the run once it has elapsed.
    pub fn expire(&mut self) -> Option<(Event, u8)> {
        if self.multi_press_count == 0 {
            return None;
        }

        self.multi_press_ticks = self.multi_press_ticks.saturating_add(1);
        if self.multi_press_ticks <= self.config.multi_press_interval_ticks {
            return None;
        }

        let event = match self.press_state {
            PressState::Pressed => Event::PressTimeout,
            PressState::Unpressed => Event::ReleaseTimeout,
        };
        let count = self.multi_press_count;
        self.multi_press_count = 0;
        self.multi_press_ticks = 0;
        Some((event, count))
    }

    /// Second half of a tick: classify the line `level` read this tick.
    pub fn update(&mut self, level: bool) -> Option<(Event, u8)> {
        let pressed = self.config.active_state.is_pressed(level);

        match self.press_state {
            PressState::Unpressed => {
                if !pressed {
                    // debounce needs an unbroken run of pressed readings
                    self.pressed_ticks = 0;
                    return None;
                }

                self.pressed_ticks = self.pressed_ticks.saturating_add(1);
                if self.pressed_ticks < self.config.debounce_ticks {
                    return None;
                }

                self.press_state = PressState::Pressed;
                self.pressed_ticks = 0;
                self.multi_press_ticks = 0;
                self.multi_press_count = self.multi_press_count.saturating_add(1);

                let event = if self.multi_press_count > 1 {
                    Event::MultiPress
                } else {
                    Event::Press
                };
                Some((event, self.multi_press_count))
            }
            PressState::Pressed => {
                self.pressed_ticks = self.pressed_ticks.saturating_add(1);

                if !pressed {
                    self.press_state = PressState::Unpressed;
                    self.pressed_ticks = 0;

                    let event = if self.long_pressed {
                        self.long_pressed = false;
                        Event::LongRelease
                    } else if self.multi_press_count > 1 {
                        Event::MultiRelease
                    } else {
                        Event::Release
                    };
                    Some((event, self.multi_press_count))
                } else if !self.long_pressed && self.pressed_ticks == self.config.hold_ticks {
                    self.long_pressed = true;
                    Some((Event::LongPress, self.multi_press_count))
                } else {
                    None
                }
            }
        }
    }

    /// Returns the key configuration.
    pub fn config(&self) -> &KeyConfig {
        &self.config
    }

    /// Replaces the key configuration, counters are kept.
    pub fn set_config(&mut self, config: KeyConfig) {
        self.config = config;
    }

    /// Sets the long press duration.
    pub fn set_hold_ticks(&mut self, hold_ticks: u16) {
        self.config.hold_ticks = hold_ticks;
    }

    /// Sets the debounce time.
    pub fn set_debounce_ticks(&mut self, debounce_ticks: u16) {
        self.config.debounce_ticks = debounce_ticks;
    }

    /// Sets the multi-press window.
    pub fn set_multi_press_interval_ticks(&mut self, multi_press_interval_ticks: u16) {
        self.config.multi_press_interval_ticks = multi_press_interval_ticks;
    }

    /// Sets the key polarity.
    pub fn set_active_state(&mut self, active_state: ActiveState) {
        self.config.active_state = active_state;
    }

    /// Ticks spent in the current state: debounce progress while unpressed, hold time while pressed.
    pub fn pressed_ticks(&self) -> u16 {
        self.pressed_ticks
    }

    /// Ticks since the last press of the current multi-press run.
    pub fn multi_press_ticks(&self) -> u16 {
        self.multi_press_ticks
    }

    /// Presses in the current multi-press run, 0 when no run is open.
    pub fn multi_press_count(&self) -> u8 {
        self.multi_press_count
    }

    /// Debounced key state.
    pub fn press_state(&self) -> PressState {
        self.press_state
    }

    /// Returns true while the debounced key is down.
    pub fn is_pressed(&self) -> bool {
        self.press_state == PressState::Pressed
    }

    /// Returns true once the current press has been reported as a long press.
    pub fn is_long_pressed(&self) -> bool {
        self.long_pressed
    }
}

impl Default for Key {
    fn default() -> Self {
        Self::new(KeyConfig::default())
    }
}

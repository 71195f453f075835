//! Line readers for keys

use embedded_hal::digital::InputPin;

use crate::config::ActiveState;

/// Reads the raw line level of a key, once per tick
pub trait Detect {
    /// Returns the current level, `true` being high
    fn detect(&mut self) -> bool;
}

impl<F: FnMut() -> bool> Detect for F {
    fn detect(&mut self) -> bool {
        self()
    }
}

#[derive(Debug)]
/// Reads a key from a GPIO input.
pub struct Gpio<I> {
    pin: I,
    active_state: ActiveState,
}

impl<I: InputPin> Gpio<I> {
    /// Wraps `pin`. A failed read is reported as the released level for `active_state`.
    pub fn new(pin: I, active_state: ActiveState) -> Self {
        Self { pin, active_state }
    }

    /// Returns the wrapped pin.
    pub fn into_inner(self) -> I {
        self.pin
    }
}

impl<I: InputPin> Detect for Gpio<I> {
    fn detect(&mut self) -> bool {
        let released = !self.active_state.pressed_level();
        self.pin.is_high().unwrap_or(released)
    }
}

#[cfg(test)]
mod test {
    use embedded_hal_mock::eh1::digital::{Mock, State, Transaction};

    use super::*;
    use crate::config::KeyConfig;
    use crate::event::Event;
    use crate::key::Key;

    #[test]
    fn test_gpio_levels() {
        let expectations = [Transaction::get(State::High), Transaction::get(State::Low)];
        let mut gpio = Gpio::new(Mock::new(&expectations), ActiveState::ActiveLow);

        assert!(gpio.detect());
        assert!(!gpio.detect());

        gpio.into_inner().done();
    }

    #[test]
    fn test_gpio_key() {
        let expectations = [
            Transaction::get(State::High),
            Transaction::get(State::Low),
            Transaction::get(State::Low),
            Transaction::get(State::High),
        ];
        let mut gpio = Gpio::new(Mock::new(&expectations), ActiveState::ActiveLow);
        let mut key = Key::new(KeyConfig::default());

        let mut last = None;
        for _ in 0..expectations.len() {
            key.poll(&mut gpio, |event, count| last = Some((event, count)));
        }
        assert_eq!(last, Some((Event::Release, 1)));

        gpio.into_inner().done();
    }
}

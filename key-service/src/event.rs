//! Key event definitions
use bitflags::bitflags;

use crate::registry::KeyId;

/// Key event kind, delivered at most once per classification per tick
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Event {
    /// Debounced press, first of a run
    Press = 0x01,
    /// Release after a single press
    Release = 0x02,
    /// Key held for the hold time
    LongPress = 0x04,
    /// Release after a long press
    LongRelease = 0x08,
    /// Second or later press of a run
    MultiPress = 0x10,
    /// Release after a multi-press
    MultiRelease = 0x20,
    /// Multi-press window elapsed while pressed
    PressTimeout = 0x40,
    /// Multi-press window elapsed while released
    ReleaseTimeout = 0x80,
}

impl Event {
    /// Returns the mask containing only this event
    pub const fn mask(self) -> EventMask {
        EventMask(self as u8)
    }

    /// Returns true for the press side of a key transition
    pub fn is_press(self) -> bool {
        EventMask::ALL_PRESS.matches(self)
    }

    /// Returns true for the release side of a key transition
    pub fn is_release(self) -> bool {
        EventMask::ALL_RELEASE.matches(self)
    }
}

/// Set of event kinds, for filtering
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EventMask(pub u8);

bitflags! {
    impl EventMask: u8 {
        /// No event
        const NONE = 0;
        /// See [`Event::Press`]
        const PRESS = Event::Press as u8;
        /// See [`Event::Release`]
        const RELEASE = Event::Release as u8;
        /// See [`Event::LongPress`]
        const LONG_PRESS = Event::LongPress as u8;
        /// See [`Event::LongRelease`]
        const LONG_RELEASE = Event::LongRelease as u8;
        /// See [`Event::MultiPress`]
        const MULTI_PRESS = Event::MultiPress as u8;
        /// See [`Event::MultiRelease`]
        const MULTI_RELEASE = Event::MultiRelease as u8;
        /// See [`Event::PressTimeout`]
        const PRESS_TIMEOUT = Event::PressTimeout as u8;
        /// See [`Event::ReleaseTimeout`]
        const RELEASE_TIMEOUT = Event::ReleaseTimeout as u8;
        /// Every press-side event
        const ALL_PRESS = Self::PRESS.bits() | Self::LONG_PRESS.bits() | Self::MULTI_PRESS.bits();
        /// Every release-side event
        const ALL_RELEASE = Self::RELEASE.bits() | Self::LONG_RELEASE.bits() | Self::MULTI_RELEASE.bits();
        /// Presses that start or extend a run
        const DEFAULT_PRESS = Self::PRESS.bits() | Self::MULTI_PRESS.bits();
        /// Same as `ALL_RELEASE`
        const DEFAULT_RELEASE = Self::ALL_RELEASE.bits();
    }
}

impl EventMask {
    /// Returns true if `event` is part of this mask
    pub fn matches(self, event: Event) -> bool {
        self & event.mask() != Self::NONE
    }
}

impl From<Event> for EventMask {
    fn from(event: Event) -> Self {
        event.mask()
    }
}

/// An event as delivered for one key, in value form
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Notification {
    /// key that produced the event
    pub key: KeyId,
    /// what happened
    pub event: Event,
    /// multi-press count at the time of the event, 2 for a double press and so on
    pub count: u8,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_group_masks() {
        assert!(EventMask::ALL_PRESS.matches(Event::LongPress));
        assert!(!EventMask::ALL_PRESS.matches(Event::PressTimeout));
        assert!(EventMask::DEFAULT_PRESS.matches(Event::MultiPress));
        assert!(!EventMask::DEFAULT_PRESS.matches(Event::LongPress));
        assert_eq!(EventMask::DEFAULT_RELEASE, EventMask::ALL_RELEASE);
        assert!(!EventMask::NONE.matches(Event::Press));
        assert!(EventMask::all().matches(Event::ReleaseTimeout));
    }

    #[test]
    fn test_event_sides() {
        assert!(Event::MultiPress.is_press());
        assert!(Event::LongRelease.is_release());
        assert!(!Event::ReleaseTimeout.is_press());
        assert!(!Event::ReleaseTimeout.is_release());
        assert_eq!(EventMask::from(Event::Release) | Event::Press.mask(), EventMask(0x03));
    }
}

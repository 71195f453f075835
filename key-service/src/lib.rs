//! Tick-driven key debounce and gesture classification
//!
//! Each key is sampled once per tick. Debounced transitions are classified into press, release,
//! long press and multi-press events and handed to the key's [`Handler`] from within the tick.
//! Keys are either driven one by one through [`Key::poll`], or created in a [`Registry`] which
//! polls every enabled key from a single call to [`Registry::poll_all`].

#![no_std]
#![warn(missing_docs)]

// must come first so the logging macros are visible to the other modules
mod fmt;

pub mod config;
pub mod detect;
pub mod event;
pub mod forward;
pub mod key;
pub mod registry;
pub mod shared;
pub mod slot_list;
pub mod task;

pub use config::{ActiveState, KeyConfig};
pub use detect::{Detect, Gpio};
pub use event::{Event, EventMask, Notification};
pub use key::Key;
pub use registry::{Control, Handler, KeyId, Registry};
pub use shared::SharedRegistry;

/// Key service error class information
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// no free key slot
    Full,
    /// key handle is unknown or the key has been deleted
    InvalidKey,
    /// operation requires the key to be disabled
    Enabled,
    /// key has no line reader or no event handler
    Inert,
    /// registry is in the middle of a poll pass
    Busy,
}

/// override Result type for shorthand -> Result<T>
pub type Result<T> = core::result::Result<T, Error>;

impl From<slot_list::Error> for Error {
    fn from(error: slot_list::Error) -> Self {
        match error {
            slot_list::Error::Full => Error::Full,
            slot_list::Error::InvalidHandle => Error::InvalidKey,
        }
    }
}

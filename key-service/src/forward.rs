//! Event handler forwarding notifications to a channel
//!
//! Lets the tick context stay short: the handler only queues a [`Notification`], and tasks
//! consume them from the channel at their own pace.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::Channel;

use crate::event::{Event, EventMask, Notification};
use crate::registry::{Control, Handler, KeyId};

/// [`Handler`] that queues the events matching its mask, dropping them when the channel is full
pub struct Forward<'a, M: RawMutex, const N: usize> {
    channel: &'a Channel<M, Notification, N>,
    mask: EventMask,
}

impl<'a, M: RawMutex, const N: usize> Forward<'a, M, N> {
    /// Forwards every event.
    pub fn new(channel: &'a Channel<M, Notification, N>) -> Self {
        Self::with_mask(channel, EventMask::all())
    }

    /// Forwards the events in `mask` only.
    pub fn with_mask(channel: &'a Channel<M, Notification, N>, mask: EventMask) -> Self {
        Self { channel, mask }
    }
}

impl<M: RawMutex, const N: usize> Handler for Forward<'_, M, N> {
    fn on_event(&mut self, _control: &mut dyn Control, key: KeyId, event: Event, count: u8) {
        if !self.mask.matches(event) {
            return;
        }

        if self.channel.try_send(Notification { key, event, count }).is_err() {
            warn!("notification queue full, dropped {:?} from key {:?}", event, key);
        }
    }
}

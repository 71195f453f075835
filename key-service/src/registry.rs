//! Registry of keys polled together
//!
//! Keys live in a fixed-capacity arena and are addressed by [`KeyId`]. Enabled keys are linked in
//! enable order and visited once per [`Registry::poll_all`] pass. Handlers receive the registry as
//! `&mut dyn Control` and may enable, disable or delete any key, including their own, while the
//! pass is running.

use crate::config::{ActiveState, KeyConfig};
use crate::detect::Detect;
use crate::event::Event;
use crate::key::Key;
use crate::slot_list::{Handle, SlotList};
use crate::{Error, Result};

/// Handle to a key created in a [`Registry`]
///
/// Handles are generational: once the key is deleted, the handle is rejected with
/// [`Error::InvalidKey`] even if its slot is reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct KeyId(Handle);

/// Registry operations available from within an event handler
pub trait Control {
    /// See [`Registry::enable`]
    fn enable(&mut self, key: KeyId) -> Result<()>;
    /// See [`Registry::disable`]
    fn disable(&mut self, key: KeyId) -> Result<()>;
    /// See [`Registry::delete`]
    fn delete(&mut self, key: KeyId) -> Result<()>;
    /// See [`Registry::is_enabled`]
    fn is_enabled(&self, key: KeyId) -> bool;
    /// See [`Registry::set_config`]
    fn set_config(&mut self, key: KeyId, config: KeyConfig) -> Result<()>;
    /// See [`Registry::poll_all`], always skipped when called from a handler
    fn poll_all(&mut self);
}

/// Receives the events of a key
///
/// Called synchronously from the poll pass, so implementations must not block.
pub trait Handler {
    /// `count` is the multi-press count the event was raised at
    fn on_event(&mut self, control: &mut dyn Control, key: KeyId, event: Event, count: u8);
}

impl<F> Handler for F
where
    F: FnMut(&mut dyn Control, KeyId, Event, u8),
{
    fn on_event(&mut self, control: &mut dyn Control, key: KeyId, event: Event, count: u8) {
        self(control, key, event, count)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Phase {
    Idle,
    /// reader and handler are moved out while the key's tick runs
    Ticking,
}

struct Entry<D, H> {
    key: Key,
    detect: Option<D>,
    handler: Option<H>,
    phase: Phase,
    pending_delete: bool,
    /// pass in which the key was last ticked
    last_pass: u32,
}

impl<D, H> Entry<D, H> {
    fn is_inert(&self) -> bool {
        self.phase == Phase::Idle && (self.detect.is_none() || self.handler.is_none())
    }
}

/// Set of up to `N` keys sharing one line reader type `D` and one handler type `H`
pub struct Registry<D, H, const N: usize> {
    keys: SlotList<Entry<D, H>, N>,
    polling: bool,
    pass: u32,
}

impl<D, H, const N: usize> Default for Registry<D, H, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, H, const N: usize> Registry<D, H, N> {
    /// construct an empty registry
    pub const fn new() -> Self {
        Self {
            keys: SlotList::new(),
            polling: false,
            pass: 0,
        }
    }

    /// Creates a disabled key.
    pub fn create(&mut self, config: KeyConfig, detect: D, handler: H) -> Result<KeyId> {
        let entry = Entry {
            key: Key::new(config),
            detect: Some(detect),
            handler: Some(handler),
            phase: Phase::Idle,
            pending_delete: false,
            last_pass: self.pass.wrapping_sub(1),
        };

        let handle = self.keys.insert(entry).inspect_err(|_| warn!("no free key slot"))?;
        let id = KeyId(handle);
        debug!("key {:?} created", id);
        Ok(id)
    }

    /// Creates a disabled key with [`KeyConfig::default`].
    pub fn create_default(&mut self, detect: D, handler: H) -> Result<KeyId> {
        self.create(KeyConfig::default(), detect, handler)
    }

    fn entry(&self, id: KeyId) -> Result<&Entry<D, H>> {
        self.keys
            .get(id.0)
            .filter(|entry| !entry.pending_delete)
            .ok_or(Error::InvalidKey)
    }

    fn entry_mut(&mut self, id: KeyId) -> Result<&mut Entry<D, H>> {
        self.keys
            .get_mut(id.0)
            .filter(|entry| !entry.pending_delete)
            .ok_or(Error::InvalidKey)
    }

    /// Returns true if `id` refers to a key that has not been deleted.
    pub fn contains(&self, id: KeyId) -> bool {
        self.entry(id).is_ok()
    }

    /// Returns true if the key takes part in poll passes.
    pub fn is_enabled(&self, id: KeyId) -> bool {
        matches!(self.keys.is_linked(id.0), Ok(true))
    }

    /// Adds the key to the end of the poll order. No-op if it is enabled already.
    ///
    /// Fails with [`Error::Inert`] if the key lacks a line reader or a handler.
    pub fn enable(&mut self, id: KeyId) -> Result<()> {
        if self.entry(id)?.is_inert() {
            warn!("key {:?} has no line reader or handler", id);
            return Err(Error::Inert);
        }

        if self.keys.push_back(id.0)? {
            debug!("key {:?} enabled", id);
        }
        Ok(())
    }

    /// Removes the key from the poll order. No-op if it is not enabled.
    pub fn disable(&mut self, id: KeyId) -> Result<()> {
        self.entry(id)?;

        if self.keys.unlink(id.0)? {
            debug!("key {:?} disabled", id);
        }
        Ok(())
    }

    /// Deletes a disabled key, `id` is invalid afterwards.
    ///
    /// Deleting an enabled key fails with [`Error::Enabled`]. A key deleted from within its own
    /// tick is removed once that tick returns.
    pub fn delete(&mut self, id: KeyId) -> Result<()> {
        if self.is_enabled(id) {
            warn!("key {:?} must be disabled before deletion", id);
            return Err(Error::Enabled);
        }

        let entry = self.entry_mut(id)?;
        if entry.phase == Phase::Ticking {
            entry.pending_delete = true;
            debug!("key {:?} deletion deferred to the end of its tick", id);
            return Ok(());
        }

        self.keys.remove(id.0)?;
        debug!("key {:?} deleted", id);
        Ok(())
    }

    fn configurable(&mut self, id: KeyId) -> Result<&mut Entry<D, H>> {
        if self.is_enabled(id) {
            warn!("key {:?} must be disabled to be reconfigured", id);
            return Err(Error::Enabled);
        }
        self.entry_mut(id)
    }

    /// Replaces the configuration of a disabled key.
    pub fn set_config(&mut self, id: KeyId, config: KeyConfig) -> Result<()> {
        self.configurable(id)?.key.set_config(config);
        Ok(())
    }

    /// Sets the long press duration of a disabled key.
    pub fn set_hold_ticks(&mut self, id: KeyId, hold_ticks: u16) -> Result<()> {
        self.configurable(id)?.key.set_hold_ticks(hold_ticks);
        Ok(())
    }

    /// Sets the debounce time of a disabled key.
    pub fn set_debounce_ticks(&mut self, id: KeyId, debounce_ticks: u16) -> Result<()> {
        self.configurable(id)?.key.set_debounce_ticks(debounce_ticks);
        Ok(())
    }

    /// Sets the multi-press window of a disabled key.
    pub fn set_multi_press_interval_ticks(&mut self, id: KeyId, multi_press_interval_ticks: u16) -> Result<()> {
        self.configurable(id)?
            .key
            .set_multi_press_interval_ticks(multi_press_interval_ticks);
        Ok(())
    }

    /// Sets the polarity of a disabled key.
    pub fn set_active_state(&mut self, id: KeyId, active_state: ActiveState) -> Result<()> {
        self.configurable(id)?.key.set_active_state(active_state);
        Ok(())
    }

    /// Replaces the line reader and handler of a disabled key.
    pub fn register_callbacks(&mut self, id: KeyId, detect: D, handler: H) -> Result<()> {
        let entry = self.configurable(id)?;
        entry.detect = Some(detect);
        entry.handler = Some(handler);
        Ok(())
    }

    /// Drops the line reader and handler of a disabled key, leaving it inert.
    pub fn clear_callbacks(&mut self, id: KeyId) -> Result<()> {
        let entry = self.configurable(id)?;
        entry.detect = None;
        entry.handler = None;
        Ok(())
    }

    /// Returns the state machine of a key.
    pub fn key(&self, id: KeyId) -> Result<&Key> {
        Ok(&self.entry(id)?.key)
    }

    /// Returns the configuration of a key.
    pub fn config(&self, id: KeyId) -> Result<KeyConfig> {
        Ok(*self.key(id)?.config())
    }

    /// See [`Key::pressed_ticks`].
    pub fn pressed_ticks(&self, id: KeyId) -> Result<u16> {
        Ok(self.key(id)?.pressed_ticks())
    }

    /// See [`Key::multi_press_ticks`].
    pub fn multi_press_ticks(&self, id: KeyId) -> Result<u16> {
        Ok(self.key(id)?.multi_press_ticks())
    }

    /// Enabled keys, in poll order.
    pub fn active(&self) -> impl Iterator<Item = KeyId> + '_ {
        self.keys.linked().map(KeyId)
    }

    /// Number of keys, enabled or not.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns true if no key exists.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Maximum number of keys.
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<D: Detect, H: Handler, const N: usize> Registry<D, H, N> {
    /// Ticks every enabled key once, in enable order.
    ///
    /// A key is ticked at most once per pass; keys enabled by a handler are ticked in the same pass
    /// if the walk has not passed them yet. Calls made while a pass is running are skipped.
    pub fn poll_all(&mut self) {
        if self.polling {
            trace!("poll pass already running, skipped");
            return;
        }

        self.polling = true;
        self.pass = self.pass.wrapping_add(1);

        self.keys.rewind();
        while let Some(handle) = self.keys.advance() {
            self.poll_key(KeyId(handle));
        }

        self.polling = false;
    }

    fn poll_key(&mut self, id: KeyId) {
        let pass = self.pass;
        let Some(entry) = self.keys.get_mut(id.0) else {
            return;
        };
        if entry.last_pass == pass {
            return;
        }
        entry.last_pass = pass;

        let (mut detect, mut handler) = match (entry.detect.take(), entry.handler.take()) {
            (Some(detect), Some(handler)) => (detect, handler),
            (detect, handler) => {
                entry.detect = detect;
                entry.handler = handler;
                return;
            }
        };
        entry.phase = Phase::Ticking;

        if let Some((event, count)) = entry.key.expire() {
            self.dispatch(&mut handler, id, event, count);
        }

        // a handler that disabled or deleted the key ends its tick
        if self.is_enabled(id) {
            let level = detect.detect();
            let classified = self.keys.get_mut(id.0).and_then(|entry| entry.key.update(level));
            if let Some((event, count)) = classified {
                self.dispatch(&mut handler, id, event, count);
            }
        }

        let Some(entry) = self.keys.get_mut(id.0) else {
            return;
        };
        entry.detect = Some(detect);
        entry.handler = Some(handler);
        entry.phase = Phase::Idle;

        if entry.pending_delete && self.keys.remove(id.0).is_ok() {
            debug!("key {:?} deleted", id);
        }
    }

    fn dispatch(&mut self, handler: &mut H, id: KeyId, event: Event, count: u8) {
        trace!("key {:?}: {:?} ({})", id, event, count);
        handler.on_event(self, id, event, count);
    }
}

impl<D: Detect, H: Handler, const N: usize> Control for Registry<D, H, N> {
    fn enable(&mut self, key: KeyId) -> Result<()> {
        Registry::enable(self, key)
    }

    fn disable(&mut self, key: KeyId) -> Result<()> {
        Registry::disable(self, key)
    }

    fn delete(&mut self, key: KeyId) -> Result<()> {
        Registry::delete(self, key)
    }

    fn is_enabled(&self, key: KeyId) -> bool {
        Registry::is_enabled(self, key)
    }

    fn set_config(&mut self, key: KeyId, config: KeyConfig) -> Result<()> {
        Registry::set_config(self, key, config)
    }

    fn poll_all(&mut self) {
        Registry::poll_all(self)
    }
}

//! A fixed-capacity arena addressed by generational handles, with an ordered list threaded through it
//!
//! Every occupied slot may additionally be linked into a single doubly linked list (by slot index),
//! giving O(1) append and O(1) unlink from any position. The list can be walked with an internal
//! cursor that survives unlinking of any entry, including the one just returned.

use heapless::Vec;

/// Slot list error class information
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// every slot is occupied
    Full,
    /// handle refers to a vacant slot, or to one that has been reused since
    InvalidHandle,
}

/// override Result type for shorthand -> Result<T>
pub type Result<T> = core::result::Result<T, Error>;

/// Stable reference to an occupied slot
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Handle {
    index: u16,
    generation: u16,
}

impl Handle {
    /// slot index, stable for the lifetime of the value
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// number of times the slot had been vacated before this value moved in
    pub fn generation(&self) -> u16 {
        self.generation
    }
}

#[derive(Copy, Clone, Debug)]
struct Link {
    prev: Option<u16>,
    next: Option<u16>,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u16,
    /// generations exhausted, never reused
    retired: bool,
    value: Option<T>,
    /// Some while the slot is part of the list
    link: Option<Link>,
}

/// Arena of up to `N` values (at most 65536) with an insertion-ordered list over a subset of them
///
/// A slot is retired once it has been vacated 65536 times, so a stale [`Handle`] can never match a
/// later value. Retired slots count against the capacity.
#[derive(Debug)]
pub struct SlotList<T, const N: usize> {
    slots: Vec<Slot<T>, N>,
    head: Option<u16>,
    tail: Option<u16>,
    /// next slot a walk will return
    cursor: Option<u16>,
    len: usize,
    linked: usize,
}

impl<T, const N: usize> Default for SlotList<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> SlotList<T, N> {
    /// construct an empty slot list
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            head: None,
            tail: None,
            cursor: None,
            len: 0,
            linked: 0,
        }
    }

    /// maximum number of values
    pub const fn capacity(&self) -> usize {
        N
    }

    /// number of values stored
    pub fn len(&self) -> usize {
        self.len
    }

    /// true if no value is stored
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// number of values currently linked into the list
    pub fn linked_len(&self) -> usize {
        self.linked
    }

    /// store `value` in a free slot, unlinked
    pub fn insert(&mut self, value: T) -> Result<Handle> {
        let index = match self
            .slots
            .iter()
            .position(|slot| slot.value.is_none() && !slot.retired)
        {
            Some(index) => index,
            None => {
                let slot = Slot {
                    generation: 0,
                    retired: false,
                    value: None,
                    link: None,
                };
                self.slots.push(slot).map_err(|_| Error::Full)?;
                self.slots.len() - 1
            }
        };
        let index = u16::try_from(index).map_err(|_| Error::Full)?;

        let slot = &mut self.slots[index as usize];
        slot.value = Some(value);
        self.len += 1;

        Ok(Handle {
            index,
            generation: slot.generation,
        })
    }

    /// unlink and take the value out, `handle` is invalid afterwards
    pub fn remove(&mut self, handle: Handle) -> Result<T> {
        self.unlink(handle)?;

        let slot = &mut self.slots[handle.index()];
        let value = slot.value.take().ok_or(Error::InvalidHandle)?;
        match slot.generation.checked_add(1) {
            Some(generation) => slot.generation = generation,
            None => {
                slot.retired = true;
                warn!("slot {} retired", handle.index);
            }
        }
        self.len -= 1;

        Ok(value)
    }

    fn slot(&self, handle: Handle) -> Result<&Slot<T>> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation && slot.value.is_some())
            .ok_or(Error::InvalidHandle)
    }

    /// true if `handle` refers to a stored value
    pub fn contains(&self, handle: Handle) -> bool {
        self.slot(handle).is_ok()
    }

    /// access the value behind `handle`
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slot(handle).ok().and_then(|slot| slot.value.as_ref())
    }

    /// mutably access the value behind `handle`
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.slot(handle).ok()?;
        self.slots[handle.index()].value.as_mut()
    }

    /// true if the value behind `handle` is linked into the list
    pub fn is_linked(&self, handle: Handle) -> Result<bool> {
        Ok(self.slot(handle)?.link.is_some())
    }

    /// link the value behind `handle` at the tail of the list. Returns false if it was linked already
    pub fn push_back(&mut self, handle: Handle) -> Result<bool> {
        if self.is_linked(handle)? {
            return Ok(false);
        }

        let index = handle.index;
        self.slots[index as usize].link = Some(Link {
            prev: self.tail,
            next: None,
        });

        match self.tail {
            Some(tail) => self.set_next(tail, Some(index)),
            None => self.head = Some(index),
        }
        self.tail = Some(index);
        self.linked += 1;

        Ok(true)
    }

    /// unlink the value behind `handle`, keeping it stored. Returns false if it was not linked
    pub fn unlink(&mut self, handle: Handle) -> Result<bool> {
        let Some(link) = self.slot(handle)?.link else {
            return Ok(false);
        };
        let index = handle.index;

        match link.prev {
            Some(prev) => self.set_next(prev, link.next),
            None => self.head = link.next,
        }
        match link.next {
            Some(next) => self.set_prev(next, link.prev),
            None => self.tail = link.prev,
        }

        // a walk never lands on an unlinked slot
        if self.cursor == Some(index) {
            self.cursor = link.next;
        }

        self.slots[index as usize].link = None;
        self.linked -= 1;

        Ok(true)
    }

    fn set_next(&mut self, index: u16, next: Option<u16>) {
        if let Some(link) = self.slots[index as usize].link.as_mut() {
            link.next = next;
        }
    }

    fn set_prev(&mut self, index: u16, prev: Option<u16>) {
        if let Some(link) = self.slots[index as usize].link.as_mut() {
            link.prev = prev;
        }
    }

    fn handle_at(&self, index: u16) -> Handle {
        Handle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    /// start a walk of the list from its head
    pub fn rewind(&mut self) {
        self.cursor = self.head;
    }

    /// return the handle under the walk cursor and step the cursor to its successor
    ///
    /// The list may be modified between calls: unlinking moves the cursor past the unlinked slot,
    /// and values linked during the walk are reached once the cursor gets to the tail.
    pub fn advance(&mut self) -> Option<Handle> {
        let index = self.cursor?;
        self.cursor = self.slots[index as usize].link.and_then(|link| link.next);
        Some(self.handle_at(index))
    }

    /// iterate over the handles of the linked values, in list order
    pub fn linked(&self) -> Linked<'_, T, N> {
        Linked {
            list: self,
            current: self.head,
        }
    }
}

/// iterator over the linked handles of a [`SlotList`]
pub struct Linked<'a, T, const N: usize> {
    list: &'a SlotList<T, N>,
    current: Option<u16>,
}

impl<T, const N: usize> Iterator for Linked<'_, T, N> {
    type Item = Handle;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.current?;
        self.current = self.list.slots[index as usize].link.and_then(|link| link.next);
        Some(self.list.handle_at(index))
    }
}

#[cfg(test)]
mod test {
    extern crate std;
    use std::vec::Vec;

    use super::*;

    fn linked_values<const N: usize>(list: &SlotList<u32, N>) -> Vec<u32> {
        list.linked().filter_map(|handle| list.get(handle).copied()).collect()
    }

    #[test]
    fn test_empty_list() {
        let mut list: SlotList<u32, 4> = SlotList::new();
        assert!(list.is_empty());
        assert_eq!(list.linked().count(), 0);

        list.rewind();
        assert!(list.advance().is_none());
    }

    #[test]
    fn test_insert_until_full() {
        let mut list: SlotList<u32, 2> = SlotList::new();
        let a = list.insert(1).unwrap();
        let _b = list.insert(2).unwrap();
        assert_eq!(list.insert(3), Err(Error::Full));

        // freed slot is reused under a new generation
        assert_eq!(list.remove(a), Ok(1));
        let c = list.insert(3).unwrap();
        assert_eq!(c.index(), a.index());
        assert_ne!(c.generation(), a.generation());

        assert!(!list.contains(a));
        assert_eq!(list.get(a), None);
        assert_eq!(list.remove(a), Err(Error::InvalidHandle));
        assert_eq!(list.get(c), Some(&3));
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_exhausted_slot_retired() {
        let mut list: SlotList<u32, 1> = SlotList::new();
        let first = list.insert(0).unwrap();
        list.remove(first).unwrap();

        let mut last = first;
        for value in 1..=u32::from(u16::MAX) {
            last = list.insert(value).unwrap();
            list.remove(last).unwrap();
        }
        assert_eq!(last.index(), first.index());
        assert_eq!(last.generation(), u16::MAX);

        // the generation would wrap back to the first handle's
        assert_eq!(list.insert(0), Err(Error::Full));
        assert!(!list.contains(first));
        assert!(!list.contains(last));
        assert!(list.is_empty());
    }

    #[test]
    fn test_link_order() {
        let mut list: SlotList<u32, 4> = SlotList::new();
        let handles: Vec<Handle> = (0..4).map(|value| list.insert(value).unwrap()).collect();

        for &index in &[2, 0, 3] {
            assert_eq!(list.push_back(handles[index]), Ok(true));
        }
        // already linked
        assert_eq!(list.push_back(handles[0]), Ok(false));
        assert_eq!(linked_values(&list), [2, 0, 3]);
        assert_eq!(list.linked_len(), 3);

        // middle, head, tail
        assert_eq!(list.unlink(handles[0]), Ok(true));
        assert_eq!(linked_values(&list), [2, 3]);
        assert_eq!(list.unlink(handles[2]), Ok(true));
        assert_eq!(linked_values(&list), [3]);
        assert_eq!(list.unlink(handles[3]), Ok(true));
        assert!(linked_values(&list).is_empty());

        assert_eq!(list.unlink(handles[3]), Ok(false));
        assert_eq!(list.len(), 4);
        assert_eq!(list.linked_len(), 0);

        // relinking appends
        assert_eq!(list.push_back(handles[1]), Ok(true));
        assert_eq!(list.push_back(handles[2]), Ok(true));
        assert_eq!(linked_values(&list), [1, 2]);
    }

    #[test]
    fn test_remove_unlinks() {
        let mut list: SlotList<u32, 4> = SlotList::new();
        let a = list.insert(10).unwrap();
        let b = list.insert(20).unwrap();
        list.push_back(a).unwrap();
        list.push_back(b).unwrap();

        assert_eq!(list.remove(a), Ok(10));
        assert_eq!(linked_values(&list), [20]);
        assert_eq!(list.is_linked(a), Err(Error::InvalidHandle));
        assert_eq!(list.push_back(a), Err(Error::InvalidHandle));
    }

    #[test]
    fn test_walk_survives_unlink() {
        let mut list: SlotList<u32, 8> = SlotList::new();
        let handles: Vec<Handle> = (0..5).map(|value| list.insert(value).unwrap()).collect();
        for &handle in &handles {
            list.push_back(handle).unwrap();
        }

        let mut visited = Vec::new();
        list.rewind();
        while let Some(handle) = list.advance() {
            visited.push(*list.get(handle).unwrap());
            match handle {
                // current entry removed
                h if h == handles[0] => {
                    list.remove(h).unwrap();
                }
                // successor unlinked
                h if h == handles[1] => {
                    list.unlink(handles[2]).unwrap();
                }
                // appended during the walk
                h if h == handles[3] => {
                    list.push_back(handles[2]).unwrap();
                }
                _ => {}
            }
        }

        assert_eq!(visited, [0, 1, 3, 4, 2]);
        assert_eq!(linked_values(&list), [1, 3, 4, 2]);
    }
}

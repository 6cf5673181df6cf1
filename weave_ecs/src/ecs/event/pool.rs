//! Per-type event buffers.
//!
//! Unlike the teacher's double-buffered broker, an [`EventPool`] is
//! append-only within a frame: every reader keeps its own cursor into the
//! buffer rather than the pool swapping a front/back buffer under them. The
//! buffer is only ever truncated by an explicit [`EventPool::clear`] call,
//! which the world drives once per frame via `clean_for_next_frame`, not
//! once per stage.

use std::any::Any;

use super::Event;

/// An append-only buffer of `E` events published this frame.
pub struct EventPool<E: Event> {
    events: Vec<E>,
}

impl<E: Event> EventPool<E> {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn push(&mut self, event: E) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events published since `cursor`, and the cursor's new position.
    ///
    /// `cursor` values beyond `self.events.len()` (e.g. a reader created
    /// after a clear) are clamped rather than panicking.
    pub fn read(&self, cursor: usize) -> (&[E], usize) {
        let cursor = cursor.min(self.events.len());
        (&self.events[cursor..], self.events.len())
    }
}

impl<E: Event> Default for EventPool<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased handle to an [`EventPool<E>`] so many event types can share
/// one map in [`super::EventStorage`].
pub(super) trait ErasedEventPool: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn clear(&mut self);
    fn len(&self) -> usize;
}

impl<E: Event> ErasedEventPool for EventPool<E> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn clear(&mut self) {
        self.events.clear();
    }

    fn len(&self) -> usize {
        self.events.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Hit(u32);
    impl Event for Hit {}

    #[test]
    fn independent_readers_advance_independently() {
        let mut pool = EventPool::new();
        pool.push(Hit(1));
        pool.push(Hit(2));

        let (batch_a, cursor_a) = pool.read(0);
        assert_eq!(batch_a.len(), 2);

        pool.push(Hit(3));

        let (batch_b, cursor_b) = pool.read(cursor_a);
        assert_eq!(batch_b.len(), 1);
        assert_eq!(batch_b[0].0, 3);

        let (batch_a2, _) = pool.read(0);
        assert_eq!(batch_a2.len(), 3);
        assert_ne!(cursor_a, cursor_b);
    }

    #[test]
    fn clear_truncates_but_read_still_works_with_clamped_cursor() {
        let mut pool: EventPool<Hit> = EventPool::new();
        pool.push(Hit(1));
        let (_, cursor) = pool.read(0);

        ErasedEventPool::clear(&mut pool);

        let (batch, new_cursor) = pool.read(cursor);
        assert!(batch.is_empty());
        assert_eq!(new_cursor, 0);
    }
}

//! Signals: typed notification lists.
//!
//! Controls report edits, tables report window moves, popovers report their
//! outcome and the view builder reports rejected writes through a
//! [`Signal`]. Slots run synchronously inside [`Signal::emit`], in the order
//! they were connected, on the surface's control thread.
//!
//! ```
//! use horizon_facet_core::Signal;
//!
//! let window_moved = Signal::<(usize, usize)>::new();
//! let id = window_moved.connect(|(start, end)| {
//!     println!("rows {start}..{end}");
//! });
//!
//! window_moved.emit((0, 12));
//! assert!(window_moved.disconnect(id));
//! ```

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::logging::targets;

/// Handle for removing a slot from the signal it was connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// A list of slots invoked with `&Args` on every emission.
pub struct Signal<Args> {
    slots: Mutex<Vec<(ConnectionId, Slot<Args>)>>,
    next_id: AtomicU64,
}

impl<Args: 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: 'static> Signal<Args> {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Append a slot.
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots.lock().push((id, Arc::new(slot)));
        id
    }

    /// Remove the slot behind `id`. Returns `false` if it was already gone.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|(slot_id, _)| *slot_id != id);
        slots.len() != before
    }

    /// Remove every slot.
    pub fn disconnect_all(&self) {
        self.slots.lock().clear();
    }

    pub fn connection_count(&self) -> usize {
        self.slots.lock().len()
    }

    /// Run every slot connected at the time of the call.
    ///
    /// The slot list is copied first and no lock is held while slots run, so
    /// a slot may connect, disconnect or emit on this signal. Slots connected
    /// during an emission first run on the next one.
    pub fn emit(&self, args: Args) {
        let slots: Vec<Slot<Args>> = self.slots.lock().iter().map(|(_, slot)| slot.clone()).collect();
        if slots.is_empty() {
            return;
        }
        tracing::trace!(target: targets::SIGNAL, slots = slots.len(), "emit");
        for slot in slots {
            slot(&args);
        }
    }
}

impl<Args> fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("slots", &self.slots.lock().len())
            .finish()
    }
}

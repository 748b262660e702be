//! The stack of open popovers.

use std::fmt;
use std::sync::Arc;

use horizon_facet_core::logging::targets;
use horizon_facet_core::surface::{NodeId, StateFlag, Surface};
use horizon_facet_core::SurfaceError;
use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::error::LifecycleError;

new_key_type! {
    /// Identifies one entry on a [`PopoverStack`].
    pub struct PopoverId;
}

/// Stacking order given to the bottom popover. Each popover above it gets
/// the next value.
pub const BASE_STACK_ORDER: i32 = 1000;

struct StackState {
    entries: SlotMap<PopoverId, NodeId>,
    order: Vec<PopoverId>,
}

/// Open popovers, bottom to top.
///
/// The stack is an explicit value: create one per surface and hand clones to
/// whatever opens popovers. Clones share the same stack.
///
/// Only the top entry is [`Visible`](super::LifecycleState::Visible); every
/// entry below it carries the surface `Obscured` flag.
#[derive(Clone)]
pub struct PopoverStack {
    inner: Arc<Mutex<StackState>>,
    surface: Arc<dyn Surface>,
}

impl PopoverStack {
    /// Create an empty stack for `surface`.
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(StackState {
                entries: SlotMap::with_key(),
                order: Vec::new(),
            })),
            surface,
        }
    }

    /// Push a popover node. It becomes the top; the previous top is obscured.
    ///
    /// Fails if the surface does not know `node`.
    pub fn push(&self, node: NodeId) -> Result<PopoverId, SurfaceError> {
        let mut state = self.inner.lock();
        let position = state.order.len();
        self.surface.set_stack_order(node, stack_order(position))?;
        self.surface.set_state_flag(node, StateFlag::Obscured, false)?;

        if let Some(previous) = state.order.last().and_then(|id| state.entries.get(*id).copied()) {
            self.set_obscured(previous, true);
        }
        let id = state.entries.insert(node);
        state.order.push(id);

        tracing::debug!(target: targets::POPOVER, ?id, ?node, depth = state.order.len(), "popover pushed");
        Ok(id)
    }

    /// Pop `id`, which must be the top. The popover below becomes visible.
    pub fn pop(&self, id: PopoverId) -> Result<NodeId, LifecycleError> {
        let mut state = self.inner.lock();
        match state.order.last() {
            Some(top) if *top == id => {}
            _ if state.entries.contains_key(id) => {
                tracing::warn!(target: targets::POPOVER, ?id, "refusing to pop a popover that is not on top");
                return Err(LifecycleError::NotTopmost);
            }
            _ => return Err(LifecycleError::Dismissed),
        }

        state.order.pop();
        let node = state.entries.remove(id).ok_or(LifecycleError::Dismissed)?;
        if let Some(revealed) = state.order.last().and_then(|top| state.entries.get(*top).copied()) {
            self.set_obscured(revealed, false);
        }

        tracing::debug!(target: targets::POPOVER, ?id, depth = state.order.len(), "popover popped");
        Ok(node)
    }

    /// The topmost popover.
    pub fn top(&self) -> Option<PopoverId> {
        self.inner.lock().order.last().copied()
    }

    pub fn is_top(&self, id: PopoverId) -> bool {
        self.top() == Some(id)
    }

    pub fn contains(&self, id: PopoverId) -> bool {
        self.inner.lock().entries.contains_key(id)
    }

    /// Position from the bottom, starting at 0.
    pub fn position(&self, id: PopoverId) -> Option<usize> {
        self.inner.lock().order.iter().position(|entry| *entry == id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The node of an open popover.
    pub fn node(&self, id: PopoverId) -> Option<NodeId> {
        self.inner.lock().entries.get(id).copied()
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    fn set_obscured(&self, node: NodeId, obscured: bool) {
        if let Err(err) = self.surface.set_state_flag(node, StateFlag::Obscured, obscured) {
            tracing::warn!(target: targets::POPOVER, ?node, %err, "obscured flag not applied");
        }
    }
}

fn stack_order(position: usize) -> i32 {
    BASE_STACK_ORDER.saturating_add(i32::try_from(position).unwrap_or(i32::MAX))
}

impl fmt::Debug for PopoverStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.lock();
        f.debug_struct("PopoverStack").field("order", &state.order).finish()
    }
}

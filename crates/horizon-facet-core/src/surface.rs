//! The rendering-surface abstraction.
//!
//! The runtime needs very little from whatever actually draws: create a node,
//! set its display value, append/remove child nodes, and subscribe to
//! activation, change and scroll events. [`Surface`] captures exactly that,
//! plus two presentation hints (state flags and stacking order) that popovers
//! and validation use. Style options travel opaquely with each node.
//!
//! [`MemorySurface`] is an arena-backed implementation used for headless
//! operation and tests. It can [`dispatch`](MemorySurface::dispatch) synthetic
//! user events to nodes and exposes the realized tree for inspection.
//!
//! # Example
//!
//! ```
//! use horizon_facet_core::surface::{EventKind, MemorySurface, NodeKind, Surface, SurfaceEvent};
//! use serde_json::{json, Map};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let surface = MemorySurface::new();
//! let button = surface.create_node(NodeKind::Button, Some("ok"), &Map::new());
//!
//! let taps = Arc::new(AtomicUsize::new(0));
//! let taps_clone = taps.clone();
//! surface
//!     .subscribe(button, EventKind::Activate, Arc::new(move |_| {
//!         taps_clone.fetch_add(1, Ordering::SeqCst);
//!     }))
//!     .unwrap();
//!
//! surface.dispatch(button, SurfaceEvent::Activate);
//! assert_eq!(taps.load(Ordering::SeqCst), 1);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Map, Value};
use slotmap::{SlotMap, new_key_type};

use crate::error::SurfaceError;
use crate::logging::targets;

new_key_type! {
    /// Identifier of a node on a rendering surface.
    ///
    /// Ids stay valid until the node (or an ancestor) is destroyed.
    pub struct NodeId;

    /// Identifier of an event subscription.
    pub struct SubscriptionId;
}

/// What a surface node represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// A generic container.
    Container,
    /// A pressable button.
    Button,
    /// An editable single-line text field.
    TextField,
    /// A static label.
    Label,
    /// A table body that hosts virtualized rows.
    Table,
    /// One realized table row.
    Row,
    /// The root of a popover overlay.
    Popover,
}

impl NodeKind {
    /// Short tag used in debug output.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Button => "button",
            Self::TextField => "text-field",
            Self::Label => "label",
            Self::Table => "table",
            Self::Row => "row",
            Self::Popover => "popover",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Kinds of events a handler can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Tap / click / keyboard activation.
    Activate,
    /// A user-committed value change.
    Change,
    /// A scroll offset change.
    Scroll,
    /// A pointer press at a surface position.
    Pointer,
    /// A cancel gesture (Escape).
    Cancel,
}

/// An event delivered by the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The node was activated.
    Activate,
    /// The user committed a new value.
    Change(Value),
    /// The node was scrolled to a vertical offset.
    Scroll {
        /// New vertical offset.
        offset: f32,
    },
    /// A pointer was pressed at a position.
    Pointer {
        /// Horizontal position in surface coordinates.
        x: f32,
        /// Vertical position in surface coordinates.
        y: f32,
    },
    /// The user cancelled (Escape).
    Cancel,
}

impl SurfaceEvent {
    /// The subscription kind this event is delivered to.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Activate => EventKind::Activate,
            Self::Change(_) => EventKind::Change,
            Self::Scroll { .. } => EventKind::Scroll,
            Self::Pointer { .. } => EventKind::Pointer,
            Self::Cancel => EventKind::Cancel,
        }
    }
}

/// Presentation state a node can be flagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateFlag {
    /// The control failed validation.
    Invalid,
    /// The overlay is covered by another overlay.
    Obscured,
}

/// Callback invoked with events delivered to a node.
pub type EventHandler = Arc<dyn Fn(&SurfaceEvent) + Send + Sync>;

/// The operations the runtime requires from a rendering surface.
pub trait Surface: Send + Sync {
    /// Create a detached node.
    fn create_node(&self, kind: NodeKind, name: Option<&str>, options: &Map<String, Value>) -> NodeId;

    /// Set the value a node displays.
    fn set_display_value(&self, node: NodeId, value: &Value) -> Result<(), SurfaceError>;

    /// Append `child` as the last child of `parent`, detaching it from any previous parent.
    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError>;

    /// Detach `child` from `parent` without destroying it.
    fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError>;

    /// Detach and destroy a node, its descendants and their subscriptions.
    ///
    /// Destroying an unknown node is a no-op.
    fn destroy_node(&self, node: NodeId);

    /// Subscribe a handler to events of `kind` delivered to `node`.
    fn subscribe(
        &self,
        node: NodeId,
        kind: EventKind,
        handler: EventHandler,
    ) -> Result<SubscriptionId, SurfaceError>;

    /// Remove a subscription. Returns `false` if it was already gone.
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Set or clear a presentation flag.
    fn set_state_flag(&self, node: NodeId, flag: StateFlag, on: bool) -> Result<(), SurfaceError>;

    /// Set the stacking order of an overlay node (higher is on top).
    fn set_stack_order(&self, node: NodeId, order: i32) -> Result<(), SurfaceError>;
}

// ============================================================================
// MemorySurface
// ============================================================================

struct NodeData {
    kind: NodeKind,
    name: Option<String>,
    options: Map<String, Value>,
    display: Value,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    flags: Vec<StateFlag>,
    stack_order: i32,
    subscriptions: Vec<SubscriptionId>,
}

struct SubscriptionData {
    node: NodeId,
    kind: EventKind,
    handler: EventHandler,
}

#[derive(Default)]
struct SurfaceState {
    nodes: SlotMap<NodeId, NodeData>,
    subscriptions: SlotMap<SubscriptionId, SubscriptionData>,
}

impl SurfaceState {
    fn node(&self, id: NodeId) -> Result<&NodeData, SurfaceError> {
        self.nodes.get(id).ok_or(SurfaceError::UnknownNode)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, SurfaceError> {
        self.nodes.get_mut(id).ok_or(SurfaceError::UnknownNode)
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes.get(id).and_then(|n| n.parent);
        }
        false
    }

    fn detach(&mut self, child: NodeId) {
        let parent = self.nodes.get_mut(child).and_then(|n| n.parent.take());
        if let Some(parent) = parent
            && let Some(parent_data) = self.nodes.get_mut(parent)
        {
            parent_data.children.retain(|&c| c != child);
        }
    }

    /// Depth-first list of `id` and all of its descendants.
    fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(data) = self.nodes.get(current) {
                result.push(current);
                stack.extend(data.children.iter().rev().copied());
            }
        }
        result
    }
}

/// An in-memory rendering surface.
///
/// Nodes live in an arena keyed by [`NodeId`]. Event handlers are invoked
/// without holding the surface lock, so handlers may freely create, destroy
/// and re-wire nodes.
#[derive(Default)]
pub struct MemorySurface {
    state: Mutex<SurfaceState>,
}

impl MemorySurface {
    /// Create an empty surface.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty surface behind an `Arc`, ready to be shared.
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Deliver an event to every handler subscribed on `node` for its kind.
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, node: NodeId, event: SurfaceEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = {
            let state = self.state.lock();
            let Some(data) = state.nodes.get(node) else {
                tracing::debug!(target: targets::SURFACE, ?node, ?kind, "event for unknown node ignored");
                return 0;
            };
            data.subscriptions
                .iter()
                .filter_map(|id| state.subscriptions.get(*id))
                .filter(|sub| sub.kind == kind)
                .map(|sub| sub.handler.clone())
                .collect()
        };

        tracing::trace!(target: targets::SURFACE, ?node, ?kind, handlers = handlers.len(), "dispatching event");
        for handler in &handlers {
            handler(&event);
        }
        handlers.len()
    }

    /// Whether the node exists.
    pub fn contains(&self, node: NodeId) -> bool {
        self.state.lock().nodes.contains_key(node)
    }

    /// Number of live nodes.
    pub fn node_count(&self) -> usize {
        self.state.lock().nodes.len()
    }

    /// Number of live subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.state.lock().subscriptions.len()
    }

    /// The kind of a node.
    pub fn kind(&self, node: NodeId) -> Option<NodeKind> {
        self.state.lock().nodes.get(node).map(|n| n.kind)
    }

    /// The name a node was created with.
    pub fn name(&self, node: NodeId) -> Option<String> {
        self.state.lock().nodes.get(node).and_then(|n| n.name.clone())
    }

    /// The opaque options a node was created with.
    pub fn options(&self, node: NodeId) -> Option<Map<String, Value>> {
        self.state.lock().nodes.get(node).map(|n| n.options.clone())
    }

    /// The value a node currently displays.
    pub fn display_value(&self, node: NodeId) -> Option<Value> {
        self.state.lock().nodes.get(node).map(|n| n.display.clone())
    }

    /// Parent of a node.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.state.lock().nodes.get(node).and_then(|n| n.parent)
    }

    /// Children of a node in order.
    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.state
            .lock()
            .nodes
            .get(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Whether a flag is set on a node.
    pub fn has_flag(&self, node: NodeId, flag: StateFlag) -> bool {
        self.state
            .lock()
            .nodes
            .get(node)
            .is_some_and(|n| n.flags.contains(&flag))
    }

    /// Stacking order of a node.
    pub fn stack_order(&self, node: NodeId) -> Option<i32> {
        self.state.lock().nodes.get(node).map(|n| n.stack_order)
    }

    /// Nodes without a parent.
    pub fn roots(&self) -> Vec<NodeId> {
        self.state
            .lock()
            .nodes
            .iter()
            .filter(|(_, n)| n.parent.is_none())
            .map(|(id, _)| id)
            .collect()
    }

    /// Depth-first search below (and including) `root` for a named node.
    pub fn find_descendant(&self, root: NodeId, name: &str) -> Option<NodeId> {
        let state = self.state.lock();
        state
            .collect_subtree(root)
            .into_iter()
            .find(|id| state.nodes[*id].name.as_deref() == Some(name))
    }

    /// All nodes below (and including) `root` of a given kind, depth-first.
    pub fn descendants_of_kind(&self, root: NodeId, kind: NodeKind) -> Vec<NodeId> {
        let state = self.state.lock();
        state
            .collect_subtree(root)
            .into_iter()
            .filter(|id| state.nodes[*id].kind == kind)
            .collect()
    }
}

impl Surface for MemorySurface {
    fn create_node(&self, kind: NodeKind, name: Option<&str>, options: &Map<String, Value>) -> NodeId {
        let data = NodeData {
            kind,
            name: name.map(str::to_string),
            options: options.clone(),
            display: Value::Null,
            parent: None,
            children: Vec::new(),
            flags: Vec::new(),
            stack_order: 0,
            subscriptions: Vec::new(),
        };
        let id = self.state.lock().nodes.insert(data);
        tracing::trace!(target: targets::SURFACE, ?id, %kind, "created node");
        id
    }

    fn set_display_value(&self, node: NodeId, value: &Value) -> Result<(), SurfaceError> {
        self.state.lock().node_mut(node)?.display = value.clone();
        Ok(())
    }

    fn append_child(&self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        let mut state = self.state.lock();
        state.node(parent)?;
        state.node(child)?;
        if state.is_ancestor_or_self(child, parent) {
            return Err(SurfaceError::CircularParentage);
        }

        state.detach(child);
        state.node_mut(child)?.parent = Some(parent);
        state.node_mut(parent)?.children.push(child);
        Ok(())
    }

    fn remove_child(&self, parent: NodeId, child: NodeId) -> Result<(), SurfaceError> {
        let mut state = self.state.lock();
        state.node(parent)?;
        if state.node(child)?.parent != Some(parent) {
            return Err(SurfaceError::UnknownNode);
        }
        state.detach(child);
        Ok(())
    }

    fn destroy_node(&self, node: NodeId) {
        let mut state = self.state.lock();
        if !state.nodes.contains_key(node) {
            return;
        }

        state.detach(node);
        let doomed = state.collect_subtree(node);
        for id in &doomed {
            if let Some(data) = state.nodes.remove(*id) {
                for sub in data.subscriptions {
                    state.subscriptions.remove(sub);
                }
            }
        }
        tracing::trace!(target: targets::SURFACE, ?node, destroyed = doomed.len(), "destroyed subtree");
    }

    fn subscribe(
        &self,
        node: NodeId,
        kind: EventKind,
        handler: EventHandler,
    ) -> Result<SubscriptionId, SurfaceError> {
        let mut state = self.state.lock();
        state.node(node)?;
        let id = state.subscriptions.insert(SubscriptionData { node, kind, handler });
        state.node_mut(node)?.subscriptions.push(id);
        Ok(id)
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut state = self.state.lock();
        let Some(sub) = state.subscriptions.remove(id) else {
            return false;
        };
        if let Some(node) = state.nodes.get_mut(sub.node) {
            node.subscriptions.retain(|&s| s != id);
        }
        true
    }

    fn set_state_flag(&self, node: NodeId, flag: StateFlag, on: bool) -> Result<(), SurfaceError> {
        let mut state = self.state.lock();
        let flags = &mut state.node_mut(node)?.flags;
        if on {
            if !flags.contains(&flag) {
                flags.push(flag);
            }
        } else {
            flags.retain(|&f| f != flag);
        }
        Ok(())
    }

    fn set_stack_order(&self, node: NodeId, order: i32) -> Result<(), SurfaceError> {
        self.state.lock().node_mut(node)?.stack_order = order;
        Ok(())
    }
}

impl fmt::Debug for MemorySurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("MemorySurface")
            .field("nodes", &state.nodes.len())
            .field("subscriptions", &state.subscriptions.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn node(surface: &MemorySurface, kind: NodeKind, name: &str) -> NodeId {
        surface.create_node(kind, Some(name), &Map::new())
    }

    #[test]
    fn test_append_and_order() {
        let surface = MemorySurface::new();
        let root = node(&surface, NodeKind::Container, "root");
        let a = node(&surface, NodeKind::Label, "a");
        let b = node(&surface, NodeKind::Label, "b");

        surface.append_child(root, a).unwrap();
        surface.append_child(root, b).unwrap();

        assert_eq!(surface.children(root), vec![a, b]);
        assert_eq!(surface.parent(b), Some(root));
        assert_eq!(surface.roots(), vec![root]);
    }

    #[test]
    fn test_append_reparents() {
        let surface = MemorySurface::new();
        let first = node(&surface, NodeKind::Container, "first");
        let second = node(&surface, NodeKind::Container, "second");
        let child = node(&surface, NodeKind::Label, "child");

        surface.append_child(first, child).unwrap();
        surface.append_child(second, child).unwrap();

        assert!(surface.children(first).is_empty());
        assert_eq!(surface.children(second), vec![child]);
    }

    #[test]
    fn test_circular_append_rejected() {
        let surface = MemorySurface::new();
        let parent = node(&surface, NodeKind::Container, "parent");
        let child = node(&surface, NodeKind::Container, "child");
        surface.append_child(parent, child).unwrap();

        assert_eq!(
            surface.append_child(child, parent),
            Err(SurfaceError::CircularParentage)
        );
        assert_eq!(
            surface.append_child(parent, parent),
            Err(SurfaceError::CircularParentage)
        );
    }

    #[test]
    fn test_destroy_cascades_and_drops_subscriptions() {
        let surface = MemorySurface::new();
        let root = node(&surface, NodeKind::Container, "root");
        let inner = node(&surface, NodeKind::Container, "inner");
        let leaf = node(&surface, NodeKind::Button, "leaf");
        surface.append_child(root, inner).unwrap();
        surface.append_child(inner, leaf).unwrap();
        surface
            .subscribe(leaf, EventKind::Activate, Arc::new(|_| {}))
            .unwrap();

        surface.destroy_node(inner);

        assert!(surface.contains(root));
        assert!(!surface.contains(inner));
        assert!(!surface.contains(leaf));
        assert!(surface.children(root).is_empty());
        assert_eq!(surface.subscription_count(), 0);

        // Destroying again is harmless.
        surface.destroy_node(inner);
    }

    #[test]
    fn test_dispatch_matches_kind() {
        let surface = MemorySurface::new();
        let field = node(&surface, NodeKind::TextField, "field");
        let changes = Arc::new(AtomicUsize::new(0));

        let changes_clone = changes.clone();
        surface
            .subscribe(
                field,
                EventKind::Change,
                Arc::new(move |event| {
                    if let SurfaceEvent::Change(_) = event {
                        changes_clone.fetch_add(1, Ordering::SeqCst);
                    }
                }),
            )
            .unwrap();

        assert_eq!(surface.dispatch(field, SurfaceEvent::Activate), 0);
        assert_eq!(surface.dispatch(field, SurfaceEvent::Change(json!("x"))), 1);
        assert_eq!(changes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_may_destroy_its_own_node() {
        let surface = MemorySurface::shared();
        let button = node(&surface, NodeKind::Button, "close");

        let weak = Arc::downgrade(&surface);
        surface
            .subscribe(
                button,
                EventKind::Activate,
                Arc::new(move |_| {
                    if let Some(surface) = weak.upgrade() {
                        surface.destroy_node(button);
                    }
                }),
            )
            .unwrap();

        assert_eq!(surface.dispatch(button, SurfaceEvent::Activate), 1);
        assert!(!surface.contains(button));
        assert_eq!(surface.dispatch(button, SurfaceEvent::Activate), 0);
    }

    #[test]
    fn test_unsubscribe() {
        let surface = MemorySurface::new();
        let button = node(&surface, NodeKind::Button, "b");
        let id = surface
            .subscribe(button, EventKind::Activate, Arc::new(|_| {}))
            .unwrap();

        assert!(surface.unsubscribe(id));
        assert!(!surface.unsubscribe(id));
        assert_eq!(surface.dispatch(button, SurfaceEvent::Activate), 0);
    }

    #[test]
    fn test_flags_and_display() {
        let surface = MemorySurface::new();
        let label = node(&surface, NodeKind::Label, "l");

        surface.set_display_value(label, &json!("hi")).unwrap();
        surface.set_state_flag(label, StateFlag::Invalid, true).unwrap();
        surface.set_state_flag(label, StateFlag::Invalid, true).unwrap();
        assert_eq!(surface.display_value(label), Some(json!("hi")));
        assert!(surface.has_flag(label, StateFlag::Invalid));

        surface.set_state_flag(label, StateFlag::Invalid, false).unwrap();
        assert!(!surface.has_flag(label, StateFlag::Invalid));
    }

    #[test]
    fn test_find_descendant() {
        let surface = MemorySurface::new();
        let root = node(&surface, NodeKind::Container, "root");
        let name = node(&surface, NodeKind::TextField, "name");
        surface.append_child(root, name).unwrap();

        assert_eq!(surface.find_descendant(root, "name"), Some(name));
        assert_eq!(surface.find_descendant(root, "missing"), None);
        assert_eq!(surface.descendants_of_kind(root, NodeKind::TextField), vec![name]);
    }
}

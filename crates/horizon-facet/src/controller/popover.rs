//! Popover view controllers.
//!
//! A popover is a view controller shown in its own surface node, stacked
//! above the content it was opened from. It ends in exactly one of three
//! ways:
//!
//! - **apply**: the view validates, the apply callback receives a snapshot of
//!   the data, and the popover is dismissed. A failing validation blocks both.
//! - **remove**: the removal callback receives a snapshot and the popover is
//!   dismissed.
//! - **dismiss**: the popover closes without calling anything.
//!
//! Buttons declared with [`ButtonAction::Apply`](crate::node::ButtonAction::Apply),
//! `Remove` or `Dismiss` trigger these from inside the popover.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_facet::prelude::*;
//! use parking_lot::Mutex;
//! use serde_json::{Map, json};
//!
//! let surface = MemorySurface::shared();
//! let builder = ViewBuilder::new(surface.clone());
//! let stack = PopoverStack::new(surface.clone());
//! let host = surface.create_node(NodeKind::Container, Some("host"), &Map::new());
//!
//! let saved = Arc::new(Mutex::new(None));
//! let sink = saved.clone();
//! let editor = ConfigNode::from(ContainerSpec::new().child(ControlSpec::text_field("name")));
//! let popover = PopoverBuilder::new(editor, BindingContext::new(json!({"id": 3})))
//!     .on_apply(move |value| *sink.lock() = Some(value))
//!     .show(&builder, &stack, host)
//!     .unwrap();
//!
//! popover.control("name").unwrap().set_value(json!("Jane")).unwrap();
//! assert_eq!(popover.apply(), Ok(ApplyOutcome::Applied));
//! assert_eq!(*saved.lock(), Some(json!({"id": 3, "name": "Jane"})));
//! assert_eq!(popover.state(), LifecycleState::Dismissed);
//! ```

use std::fmt;
use std::sync::{Arc, Weak};

use horizon_facet_core::logging::targets;
use horizon_facet_core::surface::{EventKind, NodeId, NodeKind, SubscriptionId, Surface, SurfaceEvent};
use horizon_facet_core::{BindingContext, Signal, WeakBindingContext};
use parking_lot::Mutex;
use serde_json::{Map, Value, json};

use super::placement::{PopoverFlags, PopoverPlacement};
use super::stack::{PopoverId, PopoverStack};
use super::view_controller::ViewController;
use super::LifecycleState;
use crate::builder::{ActionSink, PopoverAction, ViewBuilder};
use crate::error::{LifecycleError, Result};
use crate::geometry::{Point, Rect, Size};
use crate::node::ConfigNode;
use crate::view::validate_all;
use crate::widget::control::Control;

/// Receives the data snapshot when a popover is applied or removed.
type OutcomeCallback = Box<dyn FnOnce(Value) + Send>;

/// How a popover ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopoverOutcome {
    Applied,
    Removed,
    Dismissed,
}

/// Result of [`PopoverViewController::apply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyOutcome {
    /// Validation passed; the callback ran and the popover is dismissed.
    Applied,
    /// Validation failed; nothing else happened.
    Invalid,
}

#[derive(Default)]
struct Callbacks {
    on_apply: Option<OutcomeCallback>,
    on_remove: Option<OutcomeCallback>,
}

struct PopoverInner {
    id: PopoverId,
    node: NodeId,
    name: Option<String>,
    anchor: Option<NodeId>,
    attachment: NodeId,
    frame: Rect,
    placed: bool,
    flags: PopoverFlags,
    stack: PopoverStack,
    surface: Arc<dyn Surface>,
    weak_data: WeakBindingContext,
    controller: Mutex<Option<ViewController>>,
    outcome: Mutex<Option<PopoverOutcome>>,
    callbacks: Mutex<Callbacks>,
    subscriptions: Mutex<Vec<SubscriptionId>>,
    dismissed: Signal<PopoverOutcome>,
}

/// Configures a popover before it is shown.
pub struct PopoverBuilder {
    source: ConfigNode,
    data: BindingContext,
    name: Option<String>,
    anchor: Option<(NodeId, Rect)>,
    placement: PopoverPlacement,
    size: Size,
    bounds: Option<Rect>,
    flags: PopoverFlags,
    callbacks: Callbacks,
}

impl PopoverBuilder {
    /// A popover showing `source` bound to `data`.
    ///
    /// To edit a copy rather than the opener's data, pass a fresh context
    /// holding a clone of the value.
    pub fn new(source: ConfigNode, data: BindingContext) -> Self {
        Self {
            source,
            data,
            name: None,
            anchor: None,
            placement: PopoverPlacement::default(),
            size: Size::new(320.0, 240.0),
            bounds: None,
            flags: PopoverFlags::DEFAULT,
            callbacks: Callbacks::default(),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Anchor the popover to a node occupying `rect`.
    pub fn anchored_to(mut self, node: NodeId, rect: Rect) -> Self {
        self.anchor = Some((node, rect));
        self
    }

    pub fn with_placement(mut self, placement: PopoverPlacement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_size(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    /// Keep the popover frame inside `bounds`.
    pub fn within(mut self, bounds: Rect) -> Self {
        self.bounds = Some(bounds);
        self
    }

    pub fn with_flags(mut self, flags: PopoverFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Called with a snapshot of the data when the popover is applied.
    pub fn on_apply<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.callbacks.on_apply = Some(Box::new(callback));
        self
    }

    /// Called with a snapshot of the data when the popover is removed.
    pub fn on_remove<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.callbacks.on_remove = Some(Box::new(callback));
        self
    }

    fn frame(&self) -> Rect {
        match self.anchor {
            Some((_, rect)) => self.placement.frame(rect, self.size, self.bounds),
            None => PopoverPlacement::Center.frame(self.bounds.unwrap_or(Rect::ZERO), self.size, self.bounds),
        }
    }

    /// Realize the popover under `attachment` and push it on `stack`.
    ///
    /// The popover is visible on return; whatever was on top of the stack is
    /// obscured.
    pub fn show(self, builder: &ViewBuilder, stack: &PopoverStack, attachment: NodeId) -> Result<PopoverViewController> {
        let surface = builder.surface().clone();
        let frame = self.frame();

        let mut options = Map::new();
        options.insert("x".into(), json!(frame.left()));
        options.insert("y".into(), json!(frame.top()));
        options.insert("width".into(), json!(frame.width()));
        options.insert("height".into(), json!(frame.height()));

        let node = surface.create_node(NodeKind::Popover, self.name.as_deref(), &options);
        let id = match surface.append_child(attachment, node).and_then(|()| stack.push(node)) {
            Ok(id) => id,
            Err(err) => {
                surface.destroy_node(node);
                return Err(err.into());
            }
        };

        let popover = PopoverViewController {
            inner: Arc::new(PopoverInner {
                id,
                node,
                name: self.name,
                anchor: self.anchor.map(|(node, _)| node),
                attachment,
                frame,
                placed: self.anchor.is_some() || self.bounds.is_some(),
                flags: self.flags,
                stack: stack.clone(),
                surface: surface.clone(),
                weak_data: self.data.downgrade(),
                controller: Mutex::new(None),
                outcome: Mutex::new(None),
                callbacks: Mutex::new(self.callbacks),
                subscriptions: Mutex::new(Vec::new()),
                dismissed: Signal::new(),
            }),
        };

        let sink: Arc<dyn ActionSink> = Arc::new(PopoverSink(Arc::downgrade(&popover.inner)));
        let content = ViewController::new(&builder.with_action_sink(sink), self.source, self.data, node)
            .and_then(|controller| {
                *popover.inner.controller.lock() = Some(controller);
                popover.subscribe_outside_input()
            });
        if let Err(err) = content {
            popover.abort();
            return Err(err);
        }

        tracing::debug!(
            target: targets::POPOVER,
            name = ?popover.inner.name,
            ?node,
            depth = stack.len(),
            "popover shown"
        );
        Ok(popover)
    }
}

impl fmt::Debug for PopoverBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopoverBuilder")
            .field("name", &self.name)
            .field("placement", &self.placement)
            .field("size", &self.size)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// A shown popover.
///
/// Cloning yields another handle to the same popover. An open popover stays
/// alive while it is subscribed to its attachment, even without handles.
///
/// # Signals
///
/// - [`dismissed`](Self::dismissed): once, with the outcome, when the popover closes
#[derive(Clone)]
pub struct PopoverViewController {
    inner: Arc<PopoverInner>,
}

impl PopoverViewController {
    /// Start configuring a popover.
    pub fn builder(source: ConfigNode, data: BindingContext) -> PopoverBuilder {
        PopoverBuilder::new(source, data)
    }

    pub fn id(&self) -> PopoverId {
        self.inner.id
    }

    /// The popover's own surface node.
    pub fn node(&self) -> NodeId {
        self.inner.node
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn anchor(&self) -> Option<NodeId> {
        self.inner.anchor
    }

    pub fn attachment(&self) -> NodeId {
        self.inner.attachment
    }

    /// Where the popover sits, in surface coordinates.
    ///
    /// Without an anchor or bounds the frame is centred on the origin and
    /// only nominal; see [`is_placed`](Self::is_placed).
    pub fn frame(&self) -> Rect {
        self.inner.frame
    }

    /// Whether the frame was computed from an anchor or bounds.
    pub fn is_placed(&self) -> bool {
        self.inner.placed
    }

    pub fn flags(&self) -> PopoverFlags {
        self.inner.flags
    }

    /// The current lifecycle state.
    pub fn state(&self) -> LifecycleState {
        if self.inner.outcome.lock().is_some() {
            LifecycleState::Dismissed
        } else if self.inner.stack.is_top(self.inner.id) {
            LifecycleState::Visible
        } else {
            LifecycleState::Obscured
        }
    }

    /// How the popover ended, once it has.
    pub fn outcome(&self) -> Option<PopoverOutcome> {
        *self.inner.outcome.lock()
    }

    /// The bound data, until dismissal.
    pub fn data(&self) -> Option<BindingContext> {
        self.inner.controller.lock().as_ref().and_then(|c| c.data().cloned())
    }

    /// A handle that writes only while the popover's data is alive.
    ///
    /// Give this to work that may finish after the popover closes.
    pub fn weak_data(&self) -> WeakBindingContext {
        self.inner.weak_data.clone()
    }

    /// The root node of the popover's view, until dismissal.
    pub fn view_root(&self) -> Option<NodeId> {
        self.inner.controller.lock().as_ref().and_then(|c| c.view()).map(|v| v.root_node())
    }

    /// The first control named `name` in the popover's view.
    pub fn control(&self, name: &str) -> Option<Control> {
        self.inner
            .controller
            .lock()
            .as_ref()
            .and_then(|c| c.view())
            .and_then(|v| v.control(name))
    }

    /// Every control in the popover's view.
    pub fn controls(&self) -> Vec<Control> {
        self.inner
            .controller
            .lock()
            .as_ref()
            .and_then(|c| c.view())
            .map(|v| v.controls())
            .unwrap_or_default()
    }

    /// Validate the popover's view without applying.
    pub fn validate(&self) -> bool {
        self.outcome().is_none() && validate_all(&self.controls())
    }

    /// Emitted once with the outcome when the popover closes.
    pub fn dismissed(&self) -> &Signal<PopoverOutcome> {
        &self.inner.dismissed
    }

    /// Replace the apply callback while the popover is open.
    pub fn set_on_apply<F>(&self, callback: F) -> std::result::Result<(), LifecycleError>
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.ensure_open()?;
        self.inner.callbacks.lock().on_apply = Some(Box::new(callback));
        Ok(())
    }

    /// Replace the removal callback while the popover is open.
    pub fn set_on_remove<F>(&self, callback: F) -> std::result::Result<(), LifecycleError>
    where
        F: FnOnce(Value) + Send + 'static,
    {
        self.ensure_open()?;
        self.inner.callbacks.lock().on_remove = Some(Box::new(callback));
        Ok(())
    }

    /// Validate, then hand a snapshot of the data to the apply callback and dismiss.
    ///
    /// A failing validation leaves the popover open and skips the callback.
    /// The snapshot is taken while the popover is open, but the callback runs
    /// after it has been popped: inside the callback the popover is already
    /// [`Dismissed`](LifecycleState::Dismissed), and the callback may open
    /// another popover. [`remove`](Self::remove) behaves the same way.
    pub fn apply(&self) -> std::result::Result<ApplyOutcome, LifecycleError> {
        self.ensure_actionable()?;
        if !validate_all(&self.controls()) {
            tracing::debug!(target: targets::POPOVER, name = ?self.inner.name, "apply blocked by validation");
            return Ok(ApplyOutcome::Invalid);
        }

        let snapshot = self.snapshot();
        let callback = self.inner.callbacks.lock().on_apply.take();
        if let Err(err) = self.finish(PopoverOutcome::Applied) {
            self.inner.callbacks.lock().on_apply = callback;
            return Err(err);
        }
        if let Some(callback) = callback {
            callback(snapshot);
        }
        Ok(ApplyOutcome::Applied)
    }

    /// Hand a snapshot of the data to the removal callback and dismiss.
    pub fn remove(&self) -> std::result::Result<(), LifecycleError> {
        self.ensure_actionable()?;

        let snapshot = self.snapshot();
        let callback = self.inner.callbacks.lock().on_remove.take();
        if let Err(err) = self.finish(PopoverOutcome::Removed) {
            self.inner.callbacks.lock().on_remove = callback;
            return Err(err);
        }
        if let Some(callback) = callback {
            callback(snapshot);
        }
        Ok(())
    }

    /// Close without calling either callback.
    ///
    /// Dismissing a closed popover does nothing. A popover with another one
    /// above it cannot be dismissed.
    pub fn dismiss(&self) -> std::result::Result<(), LifecycleError> {
        if self.outcome().is_some() {
            return Ok(());
        }
        self.finish(PopoverOutcome::Dismissed)
    }

    /// Discard the popover's view and build it again from its source.
    pub fn rebuild(&self) -> Result<()> {
        self.ensure_open()?;
        let Some(mut controller) = self.inner.controller.lock().take() else {
            return Err(LifecycleError::Dismissed.into());
        };
        let result = controller.rebuild();
        *self.inner.controller.lock() = Some(controller);
        result
    }

    /// Close the popover if the pointer went down outside it.
    ///
    /// An unplaced popover has no real frame to test against and never
    /// closes this way. Returns whether the popover closed.
    pub fn handle_outside_pointer(&self, point: Point) -> bool {
        if !self.inner.placed
            || !self.inner.flags.has(PopoverFlags::CLOSE_ON_OUTSIDE_POINTER)
            || self.state() != LifecycleState::Visible
            || self.inner.frame.contains(point)
        {
            return false;
        }
        tracing::trace!(target: targets::POPOVER, x = point.x, y = point.y, "outside pointer");
        self.dismiss().is_ok()
    }

    /// Close the popover on escape, if it is on top.
    ///
    /// Returns whether the popover closed.
    pub fn handle_escape(&self) -> bool {
        if !self.inner.flags.has(PopoverFlags::CLOSE_ON_ESCAPE) || self.state() != LifecycleState::Visible {
            return false;
        }
        self.dismiss().is_ok()
    }

    fn ensure_open(&self) -> std::result::Result<(), LifecycleError> {
        match self.outcome() {
            Some(_) => Err(LifecycleError::Dismissed),
            None => Ok(()),
        }
    }

    fn ensure_actionable(&self) -> std::result::Result<(), LifecycleError> {
        self.ensure_open()?;
        if self.inner.stack.is_top(self.inner.id) {
            Ok(())
        } else {
            Err(LifecycleError::NotTopmost)
        }
    }

    fn snapshot(&self) -> Value {
        self.data().map_or(Value::Null, |data| data.snapshot())
    }

    fn subscribe_outside_input(&self) -> Result<()> {
        let surface = &self.inner.surface;
        let attachment = self.inner.attachment;

        let popover = self.clone();
        let pointer = surface.subscribe(
            attachment,
            EventKind::Pointer,
            Arc::new(move |event| {
                if let SurfaceEvent::Pointer { x, y } = event {
                    popover.handle_outside_pointer(Point::new(*x, *y));
                }
            }),
        )?;
        self.inner.subscriptions.lock().push(pointer);

        let popover = self.clone();
        let cancel = surface.subscribe(
            attachment,
            EventKind::Cancel,
            Arc::new(move |_| {
                popover.handle_escape();
            }),
        )?;
        self.inner.subscriptions.lock().push(cancel);
        Ok(())
    }

    /// Tear everything down. The popover must be on top.
    fn finish(&self, outcome: PopoverOutcome) -> std::result::Result<(), LifecycleError> {
        {
            let mut current = self.inner.outcome.lock();
            if current.is_some() {
                return Err(LifecycleError::Dismissed);
            }
            self.inner.stack.pop(self.inner.id)?;
            *current = Some(outcome);
        }

        self.release();
        tracing::debug!(target: targets::POPOVER, name = ?self.inner.name, ?outcome, "popover dismissed");
        self.inner.dismissed.emit(outcome);
        Ok(())
    }

    /// Undo a partially shown popover.
    fn abort(&self) {
        *self.inner.outcome.lock() = Some(PopoverOutcome::Dismissed);
        if let Err(err) = self.inner.stack.pop(self.inner.id) {
            tracing::warn!(target: targets::POPOVER, %err, "aborted popover was not on top");
        }
        self.release();
    }

    fn release(&self) {
        let subscriptions = std::mem::take(&mut *self.inner.subscriptions.lock());
        for id in subscriptions {
            self.inner.surface.unsubscribe(id);
        }

        let controller = self.inner.controller.lock().take();
        if let Some(mut controller) = controller {
            controller.dismiss();
        }
        self.inner.surface.destroy_node(self.inner.node);

        let callbacks = std::mem::take(&mut *self.inner.callbacks.lock());
        drop(callbacks);
    }
}

impl fmt::Debug for PopoverViewController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopoverViewController")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("node", &self.inner.node)
            .field("state", &self.state())
            .finish()
    }
}

/// Routes popover buttons back to their popover.
struct PopoverSink(Weak<PopoverInner>);

impl ActionSink for PopoverSink {
    fn perform(&self, action: PopoverAction) {
        let Some(inner) = self.0.upgrade() else {
            return;
        };
        let popover = PopoverViewController { inner };
        let result = match action {
            PopoverAction::Apply => popover.apply().map(|_| ()),
            PopoverAction::Remove => popover.remove(),
            PopoverAction::Dismiss => popover.dismiss(),
        };
        if let Err(err) = result {
            tracing::warn!(target: targets::POPOVER, ?action, %err, "popover action rejected");
        }
    }
}

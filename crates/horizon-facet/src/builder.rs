//! The view builder.
//!
//! [`ViewBuilder::build`] interprets a [`ConfigNode`] against a
//! [`BindingContext`] and realizes it on a [`Surface`]. Building is
//! synchronous. A configuration error anywhere in a subtree aborts the whole
//! subtree and destroys every node created for it, so callers never see a
//! partially wired tree.
//!
//! Re-rendering is discard-and-rebuild: [`View::rebuild`] builds the same
//! node again and tears the previous tree down. Only tables update
//! incrementally, through their row window.
//!
//! # Example
//!
//! ```
//! use horizon_facet::prelude::*;
//! use serde_json::json;
//!
//! let surface = MemorySurface::shared();
//! let builder = ViewBuilder::new(surface.clone());
//! let data = BindingContext::new(json!({"name": "Jane"}));
//!
//! let node = ConfigNode::from(
//!     ContainerSpec::new().child(ControlSpec::text_field("name")),
//! );
//! let view = builder.build(&node, &data).unwrap();
//!
//! let field = view.control("name").unwrap();
//! assert_eq!(surface.display_value(field.node()), Some(json!("Jane")));
//! ```

use std::fmt;
use std::sync::Arc;

use horizon_facet_core::logging::{PerfSpan, span_names, targets};
use horizon_facet_core::surface::{NodeId, NodeKind, Surface};
use horizon_facet_core::{BindingContext, DataKey, Signal};
use serde_json::{Map, Value};

use crate::config::BuilderConfig;
use crate::error::BuildError;
use crate::node::{ButtonAction, ConfigNode, ControlSpec, TapHandler};
use crate::view::{ContainerView, View, ViewNode};
use crate::widget::control::{BindingFailure, Control, ControlWiring};
use crate::widget::table::Table;

/// A terminal action a button can request from its enclosing popover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PopoverAction {
    Apply,
    Remove,
    Dismiss,
}

/// Receives popover actions from buttons.
///
/// A popover installs itself as the sink of the builder that realizes its
/// content.
pub trait ActionSink: Send + Sync {
    fn perform(&self, action: PopoverAction);
}

/// Realizes configuration nodes on a surface.
///
/// Cloning is cheap; clones share the surface and the `binding_failed`
/// signal.
#[derive(Clone)]
pub struct ViewBuilder {
    surface: Arc<dyn Surface>,
    config: BuilderConfig,
    binding_failed: Arc<Signal<BindingFailure>>,
    actions: Option<Arc<dyn ActionSink>>,
}

impl ViewBuilder {
    /// Create a builder with the default configuration.
    pub fn new(surface: Arc<dyn Surface>) -> Self {
        Self::with_config(surface, BuilderConfig::default())
    }

    /// Create a builder with an explicit configuration.
    pub fn with_config(surface: Arc<dyn Surface>, config: BuilderConfig) -> Self {
        Self {
            surface,
            config,
            binding_failed: Arc::new(Signal::new()),
            actions: None,
        }
    }

    /// A builder whose popover buttons route to `sink`.
    pub fn with_action_sink(&self, sink: Arc<dyn ActionSink>) -> Self {
        Self {
            actions: Some(sink),
            ..self.clone()
        }
    }

    pub fn surface(&self) -> &Arc<dyn Surface> {
        &self.surface
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Emitted when a user edit cannot be written to its context.
    ///
    /// The edit is dropped; the control keeps showing the stored value.
    pub fn binding_failed(&self) -> &Signal<BindingFailure> {
        &self.binding_failed
    }

    /// Realize `node` against `context`.
    ///
    /// The returned view's root is not attached to any parent.
    pub fn build(&self, node: &ConfigNode, context: &BindingContext) -> Result<View, BuildError> {
        let _perf = PerfSpan::new(span_names::BUILD);
        match self.realize(node, context) {
            Ok(root) => {
                tracing::debug!(
                    target: targets::BUILDER,
                    root = ?root.node(),
                    name = ?node.name(),
                    "view built"
                );
                Ok(View::new(root, node.clone(), context.clone(), self.clone()))
            }
            Err(err) => {
                tracing::warn!(target: targets::BUILDER, name = ?node.name(), %err, "view build failed");
                Err(err)
            }
        }
    }

    fn realize(&self, node: &ConfigNode, context: &BindingContext) -> Result<ViewNode, BuildError> {
        match node {
            ConfigNode::Container(spec) => self.realize_container(
                spec.name.as_deref(),
                &spec.options,
                spec.context_key.as_ref(),
                &spec.children,
                context,
            ),
            ConfigNode::Array(children) => self.realize_container(None, &Map::new(), None, children, context),
            ConfigNode::Control(spec) => self.realize_control(spec, context).map(ViewNode::Control),
            ConfigNode::Table(spec) => Table::realize(
                self.surface.clone(),
                spec,
                context.clone(),
                &self.config,
                Some(self.binding_failed.clone()),
            )
            .map(ViewNode::Table),
        }
    }

    fn realize_container(
        &self,
        name: Option<&str>,
        options: &Map<String, Value>,
        context_key: Option<&DataKey>,
        children: &[ConfigNode],
        context: &BindingContext,
    ) -> Result<ViewNode, BuildError> {
        let node = self.surface.create_node(NodeKind::Container, name, options);
        let context = match context_key {
            Some(key) => context.child(key),
            None => context.clone(),
        };

        match self.realize_children(node, children, &context) {
            Ok(children) => Ok(ViewNode::Container(ContainerView {
                node,
                name: name.map(str::to_string),
                context,
                children,
            })),
            Err(err) => {
                // Cascades to every child realized so far.
                self.surface.destroy_node(node);
                Err(err)
            }
        }
    }

    fn realize_children(
        &self,
        parent: NodeId,
        children: &[ConfigNode],
        context: &BindingContext,
    ) -> Result<Vec<ViewNode>, BuildError> {
        let mut realized = Vec::with_capacity(children.len());
        for child in children {
            let view = self.realize(child, context)?;
            if let Err(err) = self.surface.append_child(parent, view.node()) {
                self.surface.destroy_node(view.node());
                return Err(err.into());
            }
            realized.push(view);
        }
        Ok(realized)
    }

    fn realize_control(&self, spec: &ControlSpec, context: &BindingContext) -> Result<Control, BuildError> {
        let wiring = ControlWiring {
            on_activate: spec.action.as_ref().map(|action| self.action_handler(action)),
            renderer: None,
            binding_failed: Some(self.binding_failed.clone()),
        };
        Control::realize(&self.surface, spec, context.clone(), wiring)
    }

    fn action_handler(&self, action: &ButtonAction) -> TapHandler {
        let action = match action {
            ButtonAction::Tap(handler) => return handler.clone(),
            ButtonAction::Apply => PopoverAction::Apply,
            ButtonAction::Remove => PopoverAction::Remove,
            ButtonAction::Dismiss => PopoverAction::Dismiss,
        };

        match &self.actions {
            Some(sink) => {
                let sink = sink.clone();
                Arc::new(move |_| sink.perform(action))
            }
            None => Arc::new(move |_| {
                tracing::warn!(target: targets::BUILDER, ?action, "popover action outside a popover ignored");
            }),
        }
    }
}

impl fmt::Debug for ViewBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewBuilder")
            .field("config", &self.config)
            .field("routes_actions", &self.actions.is_some())
            .finish_non_exhaustive()
    }
}

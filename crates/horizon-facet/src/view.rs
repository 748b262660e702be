//! Realized view trees.

use std::sync::atomic::{AtomicBool, Ordering};

use horizon_facet_core::logging::{PerfSpan, span_names, targets};
use horizon_facet_core::surface::NodeId;
use horizon_facet_core::BindingContext;

use crate::builder::ViewBuilder;
use crate::error::BuildError;
use crate::node::ConfigNode;
use crate::widget::control::Control;
use crate::widget::table::Table;

/// A realized container.
#[derive(Debug, Clone)]
pub struct ContainerView {
    pub node: NodeId,
    pub name: Option<String>,
    /// The context the children were built against.
    pub context: BindingContext,
    pub children: Vec<ViewNode>,
}

/// One realized node of a view tree.
#[derive(Debug, Clone)]
pub enum ViewNode {
    Container(ContainerView),
    Control(Control),
    Table(Table),
}

impl ViewNode {
    /// The surface node this view node owns.
    pub fn node(&self) -> NodeId {
        match self {
            Self::Container(container) => container.node,
            Self::Control(control) => control.node(),
            Self::Table(table) => table.node(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Container(container) => container.name.as_deref(),
            Self::Control(control) => control.name(),
            Self::Table(table) => Some(table.name()),
        }
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a ViewNode)) {
        f(self);
        if let Self::Container(container) = self {
            for child in &container.children {
                child.visit(f);
            }
        }
    }
}

/// A realized tree together with what it was built from.
///
/// Dropping a view does not remove it from the surface; call
/// [`teardown`](Self::teardown).
#[derive(Debug)]
pub struct View {
    root: ViewNode,
    source: ConfigNode,
    context: BindingContext,
    builder: ViewBuilder,
    torn_down: AtomicBool,
}

impl View {
    pub(crate) fn new(root: ViewNode, source: ConfigNode, context: BindingContext, builder: ViewBuilder) -> Self {
        Self {
            root,
            source,
            context,
            builder,
            torn_down: AtomicBool::new(false),
        }
    }

    pub fn root(&self) -> &ViewNode {
        &self.root
    }

    pub fn root_node(&self) -> NodeId {
        self.root.node()
    }

    /// The node this view was built from.
    pub fn source(&self) -> &ConfigNode {
        &self.source
    }

    pub fn context(&self) -> &BindingContext {
        &self.context
    }

    /// Every control in the tree, depth first. Table cells are not included.
    pub fn controls(&self) -> Vec<Control> {
        let mut controls = Vec::new();
        self.root.visit(&mut |node| {
            if let ViewNode::Control(control) = node {
                controls.push(control.clone());
            }
        });
        controls
    }

    /// The first control named `name`, depth first.
    pub fn control(&self, name: &str) -> Option<Control> {
        self.controls().into_iter().find(|c| c.name() == Some(name))
    }

    /// Every table in the tree, depth first.
    pub fn tables(&self) -> Vec<Table> {
        let mut tables = Vec::new();
        self.root.visit(&mut |node| {
            if let ViewNode::Table(table) = node {
                tables.push(table.clone());
            }
        });
        tables
    }

    pub fn table(&self, name: &str) -> Option<Table> {
        self.tables().into_iter().find(|t| t.name() == name)
    }

    /// Validate every control and report whether all passed.
    ///
    /// Every control is evaluated, so each one records its own failure.
    pub fn validate(&self) -> bool {
        let _perf = PerfSpan::new(span_names::VALIDATE);
        validate_all(&self.controls())
    }

    /// Remove the tree from the surface.
    ///
    /// Calling it again does nothing.
    pub fn teardown(&self) {
        if self.torn_down.swap(true, Ordering::AcqRel) {
            return;
        }
        for table in self.tables() {
            table.teardown();
        }
        self.builder.surface().destroy_node(self.root_node());
        tracing::debug!(target: targets::BUILDER, root = ?self.root_node(), "view torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Build the source node again against the same context, leaving this
    /// tree untouched.
    pub fn rebuilt(&self) -> Result<View, BuildError> {
        self.builder.build(&self.source, &self.context)
    }

    /// Build the source node again and replace this tree with the result.
    ///
    /// The new tree is built before the old one is torn down, so a failed
    /// rebuild leaves the view as it was. Returns the new, unattached root.
    pub fn rebuild(&mut self) -> Result<NodeId, BuildError> {
        let fresh = self.rebuilt()?;
        self.teardown();
        *self = fresh;
        Ok(self.root_node())
    }
}

/// Validate each control and AND the results without short-circuiting.
pub(crate) fn validate_all(controls: &[Control]) -> bool {
    controls.iter().fold(true, |all_valid, control| control.validate() && all_valid)
}

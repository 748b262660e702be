use std::fmt;
use std::sync::Arc;

use horizon_facet_core::logging::targets;
use horizon_facet_core::surface::{NodeId, Surface};
use horizon_facet_core::BindingContext;

use super::LifecycleState;
use crate::builder::ViewBuilder;
use crate::error::{LifecycleError, Result};
use crate::node::ConfigNode;
use crate::view::View;

/// Owns a realized view, its data and its attachment point.
///
/// The view is built and attached during [`new`](Self::new).
/// [`dismiss`](Self::dismiss) tears it down and releases the data.
pub struct ViewController {
    surface: Arc<dyn Surface>,
    attachment: NodeId,
    view: Option<View>,
    state: LifecycleState,
}

impl ViewController {
    /// Build `source` against `data` and insert it under `attachment`.
    pub fn new(builder: &ViewBuilder, source: ConfigNode, data: BindingContext, attachment: NodeId) -> Result<Self> {
        let mut controller = Self {
            surface: builder.surface().clone(),
            attachment,
            view: None,
            state: LifecycleState::Constructed,
        };

        let view = builder.build(&source, &data)?;
        if let Err(err) = controller.surface.append_child(attachment, view.root_node()) {
            view.teardown();
            return Err(err.into());
        }
        controller.view = Some(view);
        controller.state = LifecycleState::Attached;

        tracing::debug!(target: targets::CONTROLLER, ?attachment, "view controller attached");
        Ok(controller)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// The realized view, until dismissal.
    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    /// The bound data, until dismissal.
    pub fn data(&self) -> Option<&BindingContext> {
        self.view.as_ref().map(View::context)
    }

    pub fn attachment(&self) -> NodeId {
        self.attachment
    }

    /// Validate the whole view. A dismissed controller is never valid.
    pub fn validate(&self) -> bool {
        self.view.as_ref().is_some_and(View::validate)
    }

    /// Discard the view and build it again from its source.
    ///
    /// On failure the previous view stays in place.
    pub fn rebuild(&mut self) -> Result<()> {
        let view = self.view.as_mut().ok_or(LifecycleError::Dismissed)?;
        let fresh = view.rebuilt()?;
        let root = fresh.root_node();
        if let Err(err) = self.surface.append_child(self.attachment, root) {
            fresh.teardown();
            return Err(err.into());
        }
        view.teardown();
        *view = fresh;
        tracing::debug!(target: targets::CONTROLLER, ?root, "view controller rebuilt");
        Ok(())
    }

    /// Detach and destroy the view and release the data.
    ///
    /// Dismissing twice is a no-op.
    pub fn dismiss(&mut self) {
        let Some(view) = self.view.take() else {
            return;
        };
        view.teardown();
        self.state = LifecycleState::Dismissed;
        tracing::debug!(target: targets::CONTROLLER, attachment = ?self.attachment, "view controller dismissed");
    }
}

impl Drop for ViewController {
    fn drop(&mut self) {
        self.dismiss();
    }
}

impl fmt::Debug for ViewController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewController")
            .field("attachment", &self.attachment)
            .field("view", &self.view)
            .field("state", &self.state)
            .finish()
    }
}

//! Horizon Facet - a declarative view and data-binding runtime.
//!
//! Application code describes UI as a tree of [`ConfigNode`]s: containers,
//! buttons, text fields, labels and virtualized tables. A [`ViewBuilder`]
//! realizes that tree on a [`Surface`], binds each control to a key in a
//! [`BindingContext`], and writes user edits straight back into the data.
//! Overlays are [`PopoverViewController`]s on an explicit [`PopoverStack`].
//!
//! The core crate's items are re-exported here.
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
//! let view = builder
//!     .build(&ConfigNode::from(ControlSpec::text_field("name")), &data)
//!     .unwrap();
//!
//! // The user types into the field.
//! surface.dispatch(view.root_node(), SurfaceEvent::Change(json!("Ann")));
//! assert_eq!(data.snapshot(), json!({"name": "Ann"}));
//! ```

pub use horizon_facet_core::*;

pub mod builder;
pub mod config;
pub mod controller;
mod error;
pub mod format;
pub mod geometry;
pub mod node;
pub mod prelude;
pub mod view;
pub mod widget;

pub use builder::{ActionSink, PopoverAction, ViewBuilder};
pub use config::BuilderConfig;
pub use controller::{
    ApplyOutcome, LifecycleState, PopoverBuilder, PopoverFlags, PopoverId, PopoverOutcome,
    PopoverPlacement, PopoverStack, PopoverViewController, ViewController,
};
pub use error::{BuildError, ConfigurationError, Error, LifecycleError, Result};
pub use node::{ButtonAction, ColumnSpec, ConfigNode, ContainerSpec, ControlKind, ControlSpec, TableSpec};
pub use view::{ContainerView, View, ViewNode};
pub use widget::{BindingFailure, Control, RowWindow, Table, ValidationFailure};

static_assertions::assert_impl_all!(ViewBuilder: Send, Sync, Clone);
static_assertions::assert_impl_all!(Control: Send, Sync, Clone);
static_assertions::assert_impl_all!(Table: Send, Sync, Clone);
static_assertions::assert_impl_all!(View: Send, Sync);
static_assertions::assert_impl_all!(PopoverViewController: Send, Sync, Clone);
static_assertions::assert_impl_all!(PopoverStack: Send, Sync, Clone);
static_assertions::assert_impl_all!(ConfigNode: Send, Sync, Clone);

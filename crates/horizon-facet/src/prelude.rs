//! Prelude module for Horizon Facet.
//!
//! ```ignore
//! use horizon_facet::prelude::*;
//! ```
//!
//! This provides access to:
//! - Data binding (`BindingContext`, `DataKey`)
//! - Node descriptions (`ConfigNode`, `ContainerSpec`, `ControlSpec`, `TableSpec`)
//! - The builder and realized views (`ViewBuilder`, `View`, `Control`, `Table`)
//! - Controllers and popovers (`ViewController`, `PopoverBuilder`, `PopoverStack`)
//! - The surface contract and the in-memory surface

// ============================================================================
// Data Binding
// ============================================================================

pub use crate::{BindingContext, DataKey, WeakBindingContext};

// ============================================================================
// Signal and Property System
// ============================================================================

pub use crate::{ConnectionId, Property, Signal};

// ============================================================================
// Surface
// ============================================================================

pub use crate::{EventKind, MemorySurface, NodeId, NodeKind, StateFlag, Surface, SurfaceEvent};

// ============================================================================
// Node Descriptions
// ============================================================================

pub use crate::node::{ButtonAction, ColumnSpec, ConfigNode, ContainerSpec, ControlKind, ControlSpec, TableSpec};

// ============================================================================
// Building
// ============================================================================

pub use crate::builder::ViewBuilder;
pub use crate::config::BuilderConfig;
pub use crate::view::View;
pub use crate::widget::{BindingFailure, Control, RowWindow, Table, ValidationFailure};

// ============================================================================
// Controllers
// ============================================================================

pub use crate::controller::{
    ApplyOutcome, LifecycleState, PopoverBuilder, PopoverFlags, PopoverOutcome, PopoverPlacement,
    PopoverStack, PopoverViewController, ViewController,
};

// ============================================================================
// Geometry and Formatting
// ============================================================================

pub use crate::format::CellFormat;
pub use crate::geometry::{Point, Rect, Size};

// ============================================================================
// Errors
// ============================================================================

pub use crate::{BuildError, ConfigurationError, Error, LifecycleError};

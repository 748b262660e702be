//! Core systems for Horizon Facet.
//!
//! This crate provides the foundational pieces of the Horizon Facet
//! declarative UI runtime:
//!
//! - **Path Resolver**: Dot/bracket data keys resolved against structured values
//! - **Binding Context**: Shared, rebindable data scopes for control subtrees
//! - **Signal/Slot System**: Type-safe notification between runtime parts
//! - **Property System**: Values with change detection
//! - **Surface**: The minimal rendering-surface contract, plus an in-memory implementation
//!
//! # Binding Example
//!
//! ```
//! use horizon_facet_core::{BindingContext, DataKey};
//! use serde_json::json;
//!
//! let ctx = BindingContext::new(json!({"id": 3}));
//! ctx.write(&DataKey::parse("address.city"), json!("Oslo")).unwrap();
//!
//! assert_eq!(ctx.snapshot(), json!({"id": 3, "address": {"city": "Oslo"}}));
//! ```
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_facet_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

mod context;
mod error;
pub mod logging;
pub mod path;
pub mod property;
pub mod signal;
pub mod surface;

pub use context::{BindingContext, WeakBindingContext};
pub use error::{BindingError, FacetError, Result, SurfaceError};
pub use logging::{PerfSpan, SurfaceTreeDebug, TreeFormatOptions, TreeStyle};
pub use path::{DataKey, DataPath, PathSegment};
pub use property::Property;
pub use signal::{ConnectionId, Signal};
pub use surface::{
    EventHandler, EventKind, MemorySurface, NodeId, NodeKind, StateFlag, SubscriptionId, Surface,
    SurfaceEvent,
};

static_assertions::assert_impl_all!(BindingContext: Send, Sync, Clone);
static_assertions::assert_impl_all!(WeakBindingContext: Send, Sync);
static_assertions::assert_impl_all!(MemorySurface: Send, Sync);
static_assertions::assert_impl_all!(Signal<()>: Send, Sync);

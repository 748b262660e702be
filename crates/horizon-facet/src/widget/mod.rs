//! Realized widgets.
//!
//! This module holds the runtime side of the node descriptions in
//! [`crate::node`]:
//!
//! - [`Control`]: a bound button, text field or label
//! - [`Table`]: a virtualized table over a row sequence
//! - [`validator`]: the declarative rules a control checks its value against
//!
//! Widgets are normally created by the [`ViewBuilder`](crate::ViewBuilder).
//! Each one owns exactly one surface node (tables also own their realized
//! rows) and releases it on teardown.

pub mod control;
pub mod table;
pub mod validator;

pub use control::{BindingFailure, Control};
pub use table::{RowWindow, Table, clamp_offset, compute_row_window};
pub use validator::{PatternValidator, RequiredValidator, RuleSet, ValidationFailure, Validator};

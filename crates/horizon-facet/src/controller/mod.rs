//! View controllers and popovers.
//!
//! A [`ViewController`] owns one realized view, the binding context it was
//! built against, and the surface node it is attached under. A
//! [`PopoverViewController`] additionally sits on a [`PopoverStack`] and
//! reports back to its opener through apply and removal callbacks.
//!
//! # Lifecycle
//!
//! ```text
//! Constructed -> Attached -> Dismissed                     (view controllers)
//! Constructed -> Attached -> Visible <-> Obscured -> Dismissed   (popovers)
//! ```
//!
//! Attachment happens once, at construction. Dismissal is idempotent.
//!
//! Popover dismissal is strictly last-opened, first-dismissed: dismissing a
//! popover that has another one above it fails with
//! [`LifecycleError::NotTopmost`](crate::LifecycleError::NotTopmost) and
//! changes nothing.

mod placement;
mod popover;
mod stack;
mod view_controller;

use std::fmt;

pub use placement::{PopoverFlags, PopoverPlacement};
pub use popover::{ApplyOutcome, PopoverBuilder, PopoverOutcome, PopoverViewController};
pub use stack::{BASE_STACK_ORDER, PopoverId, PopoverStack};
pub use view_controller::ViewController;

/// Lifecycle state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// Created, view not yet realized.
    Constructed,
    /// View realized and inserted under the attachment node.
    Attached,
    /// Popover on top of the stack.
    Visible,
    /// Popover with another popover above it.
    Obscured,
    /// Torn down. Terminal.
    Dismissed,
}

impl LifecycleState {
    /// Whether the controller still owns a realized view.
    pub fn is_live(&self) -> bool {
        !matches!(self, Self::Constructed | Self::Dismissed)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Constructed => "constructed",
            Self::Attached => "attached",
            Self::Visible => "visible",
            Self::Obscured => "obscured",
            Self::Dismissed => "dismissed",
        };
        f.write_str(name)
    }
}

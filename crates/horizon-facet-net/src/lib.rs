//! Request helper for Horizon Facet.
//!
//! - [`RequestPolicy`]: base URL, default headers and timeout, created once
//!   by the application and passed to each client explicitly.
//! - [`RequestClient`]: issues a request and settles with a decoded JSON
//!   payload or a [`RequestError`] carrying the status and message.
//! - [`FailurePresenter`]: turns a failure into a message for the user.
//!
//! Responses that land after the view that asked for them is gone are
//! written through a [`WeakBindingContext`](horizon_facet_core::WeakBindingContext)
//! and become no-ops; see [`settle_into`].
//!
//! ```ignore
//! use horizon_facet_net::{FailurePresenter, RequestClient, RequestPolicy};
//!
//! let policy = RequestPolicy::new().with_base_url("https://api.example.com/v1")?;
//! let client = RequestClient::new(&policy)?;
//! let presenter = FailurePresenter::new();
//!
//! if let Some(user) = presenter.handle(client.get("/users/7").await) {
//!     data.write(&"user".into(), user)?;
//! }
//! ```

mod client;
mod error;
mod policy;
mod presenter;

pub use client::{RequestClient, RequestMethod, settle_into};
pub use error::{RequestError, Result};
pub use policy::RequestPolicy;
pub use presenter::FailurePresenter;

static_assertions::assert_impl_all!(RequestClient: Send, Sync, Clone);
static_assertions::assert_impl_all!(FailurePresenter: Send, Sync);

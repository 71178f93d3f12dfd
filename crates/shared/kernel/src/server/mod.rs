//! HTTP plumbing shared by server-side slices.

mod error;
mod health;
pub mod router;
mod state;

pub use error::{ApiError, BusinessCode, ErrorBody};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};

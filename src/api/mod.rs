//! HTTP API
//!
//! A thin axum layer over [`DirectoryService`](crate::service::DirectoryService).
//! The requesting principal is read from a header (default `uid`); every
//! response uses the `{success, message, data}` envelope.

pub mod extract;
pub mod response;
pub mod routes;
pub mod server;

pub use extract::Principal;
pub use response::{ApiError, ApiResponse};
pub use routes::{ApiState, router};
pub use server::serve;

//! # conductor-extras
//!
//! Collaborators built on the Conductor handler and middleware contracts:
//!
//! - [`RequestLogLayer`] - `Started ...` / `Completed ...` request logging
//! - [`read_json`], [`write_json`], [`Json`] - JSON bodies
//! - [`Resource`], [`register_resource`] - REST routes for a collection
//!
//! ## Example
//!
//! ```rust,ignore
//! use conductor_core::{App, RequestIdLayer};
//! use conductor_extras::{RequestLogLayer, register_resource};
//! use tracing::Level;
//!
//! let app = App::new()
//!     .layer(RequestIdLayer::new())
//!     .layer(RequestLogLayer::tracing(Level::INFO));
//! register_resource(app.router(), "/posts", Arc::new(Posts::default()))?;
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod json;
pub mod request_log;
pub mod resource;

pub use json::{read_json, write_json, Created, Json};
pub use request_log::{LogSink, RequestLogConfig, RequestLogLayer, TracingSink};
pub use resource::{register_resource, Resource, ResourceHandler};

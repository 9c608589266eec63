//! The toolbus command router.
//!
//! A single long-lived HTTP service that accepts the uniform command envelope,
//! classifies each command by namespace, and forwards it to the responsible
//! backend - the asset-authoring backend, the engine backend, or the
//! generative proxy. Every response is normalized into one result envelope:
//! callers never see a raw transport error, even when a backend is down or
//! the generative provider times out.
//!
//! The router is stateless across requests. The one process-wide invariant is
//! the listening port: at most one router binds it, and a launcher that finds
//! the port already bound reuses the running instance.

pub mod config;
pub mod dispatch;
pub mod generative;
mod proxy;
pub mod routes;
pub mod server;

pub use config::{AiConfig, RouterConfig};
pub use dispatch::RouterState;
pub use routes::create_router;
pub use server::run;

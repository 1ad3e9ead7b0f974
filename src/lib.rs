//! # seam
//!
//! A minimal HTTP framework where middleware are plain functions and their
//! parameters are wired by type.
//!
//! ## The idea
//!
//! There is no fixed handler signature. A stage declares whatever it needs
//! as parameters and whatever it produces as its return tuple; per request,
//! seam resolves each parameter — by exact type identity — from a small set
//! of built-in capabilities or from the values earlier stages returned.
//! Cross-cutting concerns stop being towers of wrapper types and become
//! functions you can read top to bottom.
//!
//! Four capability types are always available to a stage:
//!
//! - [`ResponseWriter`] — write side of the current request
//! - [`Req`] — the incoming request (shared handle, derefs to [`Request`])
//! - [`StopChain`] — skip every later stage (chainable stages only)
//! - [`AfterNext`] — defer a callback until downstream stages finish
//!   (chainable stages only)
//!
//! Everything else resolves from the per-request value store, falling back
//! to the type's `Default` when nothing produced it — a missing dependency
//! is never a request failure here, so keep an eye on the `debug!` logs it
//! leaves behind.
//!
//! Signatures are inspected once, at registration: a function declaring the
//! same type twice among its parameters or its returns is a configuration
//! error surfaced by [`chainable`]/[`terminal`], not a crash mid-request.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use seam::{chainable, terminal, AfterNext, Method, Req, ResponseWriter, Router, Server};
//! use std::time::Instant;
//!
//! #[derive(Clone, Default)]
//! struct Caller(String);
//!
//! #[tokio::main]
//! async fn main() -> Result<(), seam::Error> {
//!     let app = Router::new()
//!         .with(chainable(stamp)?)
//!         .with(chainable(timing)?)
//!         .on(Method::Get, "/hello", terminal(hello)?);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! // Publishes a Caller for every stage after it.
//! fn stamp(req: Req) -> (Caller,) {
//!     (Caller(format!("{} {}", req.method(), req.path())),)
//! }
//!
//! // Consumes the Caller; logs once the rest of the chain has finished.
//! fn timing(caller: Caller, after: AfterNext) {
//!     let start = Instant::now();
//!     after.defer(move || {
//!         tracing::info!(caller = caller.0, elapsed = ?start.elapsed(), "served");
//!     });
//! }
//!
//! fn hello(w: ResponseWriter) {
//!     w.write("hello");
//! }
//! ```
//!
//! ## What seam leaves to the proxy
//!
//! Like any service meant to sit behind nginx or an ingress, seam skips
//! what the proxy already ships: TLS termination, body-size limits, rate
//! limiting, slow-client protection. What's left is routing
//! ([`matchit`] radix trees), async I/O (tokio + hyper, with graceful
//! SIGTERM/Ctrl-C shutdown), and the stage chain.

mod error;
mod method;
mod request;
mod response;
mod router;
mod server;
mod status;

pub mod health;
pub mod middleware;

pub use error::Error;
pub use method::Method;
pub use middleware::{
    chainable, terminal, AfterNext, Chainable, Req, ResponseWriter, StopChain, Terminal,
};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::Server;
pub use status::Status;

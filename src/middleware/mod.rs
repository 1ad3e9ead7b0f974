//! Middleware as plain functions, wired together by type.
//!
//! A stage declares what it needs as ordinary parameters and what it
//! produces as its return tuple. Per request, each parameter resolves from
//! a closed set of built-in capabilities ([`ResponseWriter`], [`Req`],
//! [`StopChain`], [`AfterNext`]) or from the per-request [`ValueStore`]
//! that earlier stages' return values were published into — matched by
//! exact type identity, nothing structural.
//!
//! ```rust
//! use seam::{chainable, terminal, AfterNext, Req, ResponseWriter};
//! use std::time::Instant;
//!
//! // Produced by one stage, consumed by a later one. Newtypes keep store
//! // keys unambiguous.
//! #[derive(Clone, Default)]
//! struct Caller(String);
//!
//! let stamp = chainable(|req: Req| {
//!     (Caller(format!("{} {}", req.method(), req.path())),)
//! })?;
//!
//! let timing = chainable(|caller: Caller, after: AfterNext| {
//!     let start = Instant::now();
//!     after.defer(move || {
//!         println!("{} in {:?}", caller.0, start.elapsed());
//!     });
//! })?;
//!
//! let hello = terminal(|w: ResponseWriter| w.write("hello"))?;
//! # let (_, _, _) = (stamp, timing, hello);
//! # Ok::<(), seam::Error>(())
//! ```
//!
//! Two things are easy to trip over, both inherited behaviours this layer
//! deliberately preserves:
//!
//! - **Missing dependencies do not fail.** A parameter type no stage has
//!   produced arrives as its `Default`. A stage seeing empty values where
//!   it expected data is usually a wiring gap — run with
//!   `RUST_LOG=seam=debug` to see each substitution.
//! - **Last writer wins.** Two stages publishing the same type is legal;
//!   later stages see only the most recent value.

mod capability;
mod signature;
mod stage;
mod store;

pub use capability::{AfterNext, Req, ResponseWriter, StopChain};
pub use signature::Signature;
pub use stage::{chainable, terminal, Chainable, Injectable, Outputs, StageFn, Terminal};
pub use store::ValueStore;

#[doc(hidden)]
pub use signature::TypeSpec;
#[doc(hidden)]
pub use stage::Invocation;

pub(crate) use stage::{Next, StageCx};

//! Built-in Kubernetes health-check stages.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? Failure → restart. |
//! | **Readiness** | `/readyz` | Can the pod serve traffic? Failure → pulled from load-balancer. |
//!
//! Register them as terminal stages:
//!
//! ```rust
//! use seam::{health, terminal, Method, Router};
//!
//! # fn main() -> Result<(), seam::Error> {
//! let app = Router::new()
//!     .on(Method::Get, "/healthz", terminal(health::liveness)?)
//!     .on(Method::Get, "/readyz", terminal(health::readiness)?);
//! # let _ = app; Ok(())
//! # }
//! ```
//!
//! Replace `readiness` with your own terminal stage if traffic must be
//! gated on dependency availability (database connections, downstream
//! services, etc.) — a readiness stage can consume values published by
//! earlier chain stages like any other.

use crate::middleware::ResponseWriter;

/// Kubernetes liveness probe stage.
///
/// Always writes `200 OK` with body `"ok"`. If the process can respond to
/// HTTP at all, it is alive — this stage intentionally has no dependencies.
pub fn liveness(w: ResponseWriter) {
    w.write("ok");
}

/// Kubernetes readiness probe stage (default implementation).
///
/// Writes `200 OK` with body `"ready"`. Replace with your own stage if your
/// application needs a warm-up period or must verify dependency health
/// before accepting traffic.
pub fn readiness(w: ResponseWriter) {
    w.write("ready");
}

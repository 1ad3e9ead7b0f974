//! Built-in injectable capabilities.
//!
//! Four types are reserved: declaring a parameter of one of these types
//! hands a stage the corresponding request-scoped capability instead of a
//! store value. The set is closed — it is checked by type identity before
//! any store lookup, store contents can never shadow it, and values of these
//! types returned by a stage are discarded rather than published. A user
//! type that merely looks like a capability is an ordinary store value as
//! long as its type identity differs.
//!
//! | Parameter type | Injected value |
//! |---|---|
//! | [`ResponseWriter`] | handle to this request's in-progress response |
//! | [`Req`] | shared handle to the incoming [`Request`] |
//! | [`StopChain`] | flag that skips every later stage when raised |
//! | [`AfterNext`] | slot for a callback to run after downstream stages |
//!
//! All four are cheap clonable handles. `StopChain` and `AfterNext` are
//! created fresh for each chainable-stage invocation; terminal stages are
//! not offered them (there is nothing left to stop or defer around), so a
//! terminal stage that declares one receives a detached handle that does
//! nothing when used.

use std::any::TypeId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::method::Method;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::status::Status;

// ── ResponseWriter ────────────────────────────────────────────────────────────

/// Write side of the current request.
///
/// Every stage that wants to touch the response declares a `ResponseWriter`
/// parameter. Writes accumulate across stages; whatever the response holds
/// when the chain unwinds is what the transport sends. A request nothing
/// wrote to goes out as `200 OK` with an empty body.
///
/// ```rust
/// use seam::{ResponseWriter, Status};
///
/// fn not_ready(w: ResponseWriter) {
///     w.status(Status::ServiceUnavailable);
///     w.write("warming up");
/// }
/// ```
#[derive(Clone)]
pub struct ResponseWriter {
    response: Arc<Mutex<Response>>,
}

impl ResponseWriter {
    pub(crate) fn new() -> Self {
        Self { response: Arc::new(Mutex::new(Response::default())) }
    }

    /// Sets the status code.
    pub fn status(&self, code: Status) {
        self.lock().status = code.into();
    }

    /// Appends a header.
    pub fn header(&self, name: &str, value: &str) {
        self.lock().headers.push((name.to_owned(), value.to_owned()));
    }

    /// Appends bytes to the body.
    pub fn write(&self, bytes: impl AsRef<[u8]>) {
        self.lock().body.extend_from_slice(bytes.as_ref());
    }

    /// Replaces the response wholesale.
    ///
    /// Accepts anything implementing [`IntoResponse`]:
    /// `w.send("hello")`, `w.send(Status::NotFound)`,
    /// `w.send(Response::json(bytes))`.
    pub fn send(&self, response: impl IntoResponse) {
        *self.lock() = response.into_response();
    }

    /// Takes the accumulated response, leaving the empty default behind.
    pub(crate) fn take_response(&self) -> Response {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Response> {
        // A poisoning panic came from a stage, not from us; the response
        // value itself is still coherent.
        self.response.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResponseWriter {
    /// A writer backed by a response nobody will send. Only reachable when a
    /// stage asks for a `ResponseWriter` out of the store, which the
    /// reserved-type check prevents in practice.
    fn default() -> Self {
        Self::new()
    }
}

// ── Req ───────────────────────────────────────────────────────────────────────

/// Shared handle to the incoming [`Request`].
///
/// Dereferences to `&Request`, so `req.method()`, `req.path()`,
/// `req.header(..)` and `req.param(..)` all work directly.
#[derive(Clone)]
pub struct Req {
    request: Arc<Request>,
}

impl Req {
    pub(crate) fn new(request: Arc<Request>) -> Self {
        Self { request }
    }
}

impl std::ops::Deref for Req {
    type Target = Request;

    fn deref(&self) -> &Request {
        &self.request
    }
}

impl Default for Req {
    /// An empty `GET /`. Never injected for a live request; exists because
    /// every injectable type carries a default.
    fn default() -> Self {
        Self { request: Arc::new(Request::new(Method::Get, "/")) }
    }
}

// ── StopChain ─────────────────────────────────────────────────────────────────

/// Stops chain propagation.
///
/// Calling [`stop`](StopChain::stop) inside a chainable stage prevents every
/// later stage — including the terminal one — from running for this request.
/// The stopping stage's own [`AfterNext`] callback still fires, as do those
/// of the stages that already ran.
#[derive(Clone)]
pub struct StopChain {
    raised: Arc<AtomicBool>,
}

impl StopChain {
    pub(crate) fn new() -> Self {
        Self { raised: Arc::new(AtomicBool::new(false)) }
    }

    /// Raises the stop flag. Idempotent.
    pub fn stop(&self) {
        self.raised.store(true, Ordering::Relaxed);
    }

    pub(crate) fn raised(&self) -> bool {
        self.raised.load(Ordering::Relaxed)
    }
}

impl Default for StopChain {
    /// A detached flag nothing reads. This is what a terminal stage gets if
    /// it declares a `StopChain` parameter.
    fn default() -> Self {
        Self::new()
    }
}

// ── AfterNext ─────────────────────────────────────────────────────────────────

/// Defers a callback until the rest of the chain has finished.
///
/// The callback runs after the next stage (and everything beyond it) has
/// fully returned — or immediately after the current stage if propagation
/// was stopped. Registering a second callback within the same stage
/// invocation replaces the first; the slot holds at most one action.
///
/// Across stages, deferred callbacks unwind in reverse registration order,
/// mirroring nested scopes.
///
/// ```rust
/// use seam::AfterNext;
/// use std::time::Instant;
///
/// fn timing(after: AfterNext) {
///     let start = Instant::now();
///     after.defer(move || {
///         tracing::info!(elapsed = ?start.elapsed(), "request served");
///     });
/// }
/// ```
#[derive(Clone)]
pub struct AfterNext {
    slot: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>,
}

impl AfterNext {
    pub(crate) fn new() -> Self {
        Self { slot: Arc::new(Mutex::new(None)) }
    }

    /// Registers `f` to run once the rest of the chain is done.
    pub fn defer(&self, f: impl FnOnce() + Send + 'static) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(Box::new(f));
    }

    pub(crate) fn take(&self) -> Option<Box<dyn FnOnce() + Send>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

impl Default for AfterNext {
    /// A detached slot nothing drains. This is what a terminal stage gets if
    /// it declares an `AfterNext` parameter.
    fn default() -> Self {
        Self::new()
    }
}

// ── Reserved set ──────────────────────────────────────────────────────────────

/// The closed set of capability type identities, consulted before any store
/// lookup and again when discarding returned values.
pub(crate) fn is_reserved(id: TypeId) -> bool {
    id == TypeId::of::<ResponseWriter>()
        || id == TypeId::of::<Req>()
        || id == TypeId::of::<StopChain>()
        || id == TypeId::of::<AfterNext>()
}

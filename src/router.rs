//! Radix-tree request router and per-request dispatch.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. The
//! router also owns the middleware chain: chainable stages registered with
//! [`Router::with`] run in registration order around every route — matched
//! or not — before the terminal stage for the path (or the 404 fallback)
//! runs.

use std::collections::HashMap;

use matchit::Router as MatchitRouter;
use tracing::debug;

use crate::method::Method;
use crate::middleware::{terminal, Chainable, Next, ResponseWriter, StageCx, Terminal};
use crate::request::Request;
use crate::response::Response;
use crate::status::Status;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration call returns `self` so they chain naturally:
///
/// ```rust
/// use seam::{chainable, terminal, Method, Req, ResponseWriter, Router};
///
/// # fn main() -> Result<(), seam::Error> {
/// let app = Router::new()
///     .with(chainable(|req: Req| {
///         tracing::info!(path = req.path(), "incoming");
///     })?)
///     .on(Method::Get, "/hello", terminal(|w: ResponseWriter| {
///         w.write("hello");
///     })?);
/// # let _ = app; Ok(())
/// # }
/// ```
pub struct Router {
    chain: Vec<Chainable>,
    routes: HashMap<Method, MatchitRouter<Terminal>>,
    fallback: Terminal,
}

impl Router {
    pub fn new() -> Self {
        Self {
            chain: Vec::new(),
            routes: HashMap::new(),
            fallback: terminal(not_found).expect("fallback stage has a valid signature"),
        }
    }

    /// Appends a chainable stage. Stages run in registration order on the
    /// way in; their deferred callbacks unwind in reverse on the way out.
    pub fn with(mut self, stage: Chainable) -> Self {
        self.chain.push(stage);
        self
    }

    /// Registers a terminal stage for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax — `req.param("name")` retrieves
    /// them inside a stage:
    ///
    /// ```rust,no_run
    /// # use seam::{terminal, Method, Req, ResponseWriter, Router};
    /// # fn main() -> Result<(), seam::Error> {
    /// Router::new().on(Method::Get, "/users/{id}", terminal(
    ///     |req: Req, w: ResponseWriter| {
    ///         let id = req.param("id").unwrap_or("unknown");
    ///         w.write(format!(r#"{{"id":"{id}"}}"#));
    ///     },
    /// )?);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route pattern. Route tables are
    /// wired at startup; a bad pattern is unrecoverable.
    pub fn on(mut self, method: Method, path: &str, stage: Terminal) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, stage)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    /// Replaces the terminal stage used when no route matches.
    ///
    /// The default writes an empty `404 Not Found`. The chain still runs in
    /// full for unmatched paths.
    pub fn fallback(mut self, stage: Terminal) -> Self {
        self.fallback = stage;
        self
    }

    /// Runs one request through the chain and its terminal stage.
    ///
    /// This is the synchronous core the server calls once per request, and
    /// the entry point for testing stages without a socket:
    ///
    /// ```rust
    /// use seam::{terminal, Method, Request, ResponseWriter, Router};
    ///
    /// # fn main() -> Result<(), seam::Error> {
    /// let app = Router::new()
    ///     .on(Method::Get, "/ping", terminal(|w: ResponseWriter| w.write("pong"))?);
    ///
    /// let res = app.dispatch(Request::new(Method::Get, "/ping"));
    /// assert_eq!(res.body(), b"pong");
    /// # Ok(())
    /// # }
    /// ```
    pub fn dispatch(&self, mut req: Request) -> Response {
        let route = match self.lookup(req.method(), req.path()) {
            Some((stage, params)) => {
                req.set_params(params);
                stage
            }
            None => self.fallback.clone(),
        };

        let method = req.method();
        let path = req.path().to_owned();

        let mut cx = StageCx::new(req);
        Next::new(&self.chain, &route).run(&mut cx);
        let response = cx.finish();

        debug!(%method, path, status = response.status_code(), "dispatched");
        response
    }

    fn lookup(&self, method: Method, path: &str) -> Option<(Terminal, HashMap<String, String>)> {
        let tree = self.routes.get(&method)?;
        let matched = tree.at(path).ok()?;
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((matched.value.clone(), params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Default fallback terminal stage.
fn not_found(w: ResponseWriter) {
    w.status(Status::NotFound);
}

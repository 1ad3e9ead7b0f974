//! Minimal seam example — type-injected middleware around two endpoints.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/hello
//!   curl -H 'authorization: Bearer dev' http://localhost:3000/whoami
//!   curl http://localhost:3000/whoami          # stopped by the auth stage
//!   curl http://localhost:3000/healthz

use std::time::Instant;

use seam::{
    chainable, health, terminal, AfterNext, Method, Req, ResponseWriter, Router, Server, Status,
    StopChain,
};

// Values flowing through the store. Newtypes keep the type-indexed keys
// unambiguous.
#[derive(Clone, Default)]
struct Caller(String);

#[derive(Clone, Default)]
struct BearerToken(String);

#[tokio::main]
async fn main() -> Result<(), seam::Error> {
    tracing_subscriber::fmt::init();

    let app = Router::new()
        .with(chainable(stamp)?)
        .with(chainable(timing)?)
        .with(chainable(auth)?)
        .on(Method::Get, "/hello", terminal(hello)?)
        .on(Method::Get, "/whoami", terminal(whoami)?)
        .on(Method::Get, "/healthz", terminal(health::liveness)?)
        .on(Method::Get, "/readyz", terminal(health::readiness)?);

    Server::bind("0.0.0.0:3000").serve(app).await
}

// Publishes who is calling, for every stage after this one.
fn stamp(req: Req) -> (Caller, BearerToken) {
    let token = req
        .header("authorization")
        .and_then(|v| v.strip_prefix("Bearer "))
        .unwrap_or_default();
    (
        Caller(format!("{} {}", req.method(), req.path())),
        BearerToken(token.to_owned()),
    )
}

// Logs one timing line after the rest of the chain has finished.
fn timing(caller: Caller, after: AfterNext) {
    let start = Instant::now();
    after.defer(move || {
        tracing::info!(caller = caller.0, elapsed = ?start.elapsed(), "served");
    });
}

// Stops the chain for protected paths when no token was presented.
fn auth(req: Req, token: BearerToken, stop: StopChain, w: ResponseWriter) {
    if req.path() == "/whoami" && token.0.is_empty() {
        w.send(Status::Unauthorized);
        stop.stop();
    }
}

fn hello(w: ResponseWriter) {
    w.write("hello");
}

fn whoami(token: BearerToken, w: ResponseWriter) {
    w.write(format!("token: {}", token.0));
}

//! End-to-end chain behaviour through the public API.
//!
//! Everything here goes through `Router::dispatch` — no sockets involved.

use std::sync::{Arc, Mutex};

use seam::{
    chainable, terminal, AfterNext, Error, Method, Req, Request, ResponseWriter, Router, Status,
    StopChain,
};

#[derive(Clone, Default, Debug, PartialEq)]
struct Caller(String);

#[derive(Clone, Default, Debug, PartialEq)]
struct Marker(u32);

type Log = Arc<Mutex<Vec<String>>>;

fn log_entry(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

// ── Configuration faults ─────────────────────────────────────────────────────

#[test]
fn duplicate_parameter_type_is_a_registration_error() {
    let result = chainable(|_a: Marker, _b: Caller, _c: Marker| ());
    match result {
        Err(Error::DuplicateParameter { ty, .. }) => assert!(ty.contains("Marker")),
        other => panic!("expected DuplicateParameter, got {other:?}"),
    }
}

#[test]
fn duplicate_return_type_is_a_registration_error() {
    let result = terminal(|| (Caller("a".into()), Caller("b".into())));
    match result {
        Err(Error::DuplicateReturn { ty, .. }) => assert!(ty.contains("Caller")),
        other => panic!("expected DuplicateReturn, got {other:?}"),
    }
}

#[test]
fn duplicate_capability_parameters_are_also_rejected() {
    assert!(matches!(
        chainable(|_a: StopChain, _b: Caller, _c: StopChain| ()),
        Err(Error::DuplicateParameter { .. })
    ));
}

// ── Value propagation ────────────────────────────────────────────────────────

#[test]
fn values_flow_from_producer_to_later_consumers() {
    let app = Router::new()
        .with(chainable(|req: Req| (Caller(req.path().to_owned()),)).unwrap())
        .on(
            Method::Get,
            "/echo",
            terminal(|caller: Caller, w: ResponseWriter| w.write(caller.0)).unwrap(),
        );

    let res = app.dispatch(Request::new(Method::Get, "/echo"));
    assert_eq!(res.body(), b"/echo");
}

#[test]
fn later_producer_overwrites_earlier_value_of_same_type() {
    // Scenario C: two stages publish the same type; all later stages must
    // see the second value.
    let app = Router::new()
        .with(chainable(|| (Marker(1),)).unwrap())
        .with(chainable(|m: Marker| (Marker(m.0 + 10),)).unwrap())
        .on(
            Method::Get,
            "/",
            terminal(|m: Marker, w: ResponseWriter| w.write(m.0.to_string())).unwrap(),
        );

    let res = app.dispatch(Request::new(Method::Get, "/"));
    assert_eq!(res.body(), b"11");
}

#[test]
fn missing_dependency_arrives_as_default_and_does_not_fail() {
    let app = Router::new().on(
        Method::Get,
        "/",
        terminal(|caller: Caller, w: ResponseWriter| {
            assert_eq!(caller, Caller::default());
            w.write("still served");
        })
        .unwrap(),
    );

    let res = app.dispatch(Request::new(Method::Get, "/"));
    assert_eq!(res.body(), b"still served");
    assert_eq!(res.status_code(), 200);
}

#[test]
fn each_request_owns_an_independent_store() {
    let app = Router::new()
        .with(chainable(|m: Marker| (Marker(m.0 + 1),)).unwrap())
        .on(
            Method::Get,
            "/",
            terminal(|m: Marker, w: ResponseWriter| w.write(m.0.to_string())).unwrap(),
        );

    // If stores leaked across requests the second dispatch would see 2.
    assert_eq!(app.dispatch(Request::new(Method::Get, "/")).body(), b"1");
    assert_eq!(app.dispatch(Request::new(Method::Get, "/")).body(), b"1");
}

// ── Chain control ────────────────────────────────────────────────────────────

#[test]
fn stop_prevents_all_later_stages_but_runs_own_after_callback() {
    let log: Log = Log::default();

    let l = log.clone();
    let stopper = chainable(move |stop: StopChain, after: AfterNext| {
        let l = l.clone();
        after.defer(move || log_entry(&l, "stopper-after"));
        stop.stop();
    })
    .unwrap();

    let l = log.clone();
    let unreachable = chainable(move || log_entry(&l, "later-stage")).unwrap();

    let l = log.clone();
    let end = terminal(move || log_entry(&l, "terminal")).unwrap();

    let app = Router::new()
        .with(stopper)
        .with(unreachable)
        .on(Method::Get, "/", end);

    app.dispatch(Request::new(Method::Get, "/"));
    assert_eq!(*log.lock().unwrap(), vec!["stopper-after"]);
}

#[test]
fn stopping_without_writing_yields_an_empty_ok_response() {
    // Scenario B: the terminal never executes; the response is whatever the
    // stopping stage wrote — here, nothing.
    let app = Router::new()
        .with(chainable(|stop: StopChain| stop.stop()).unwrap())
        .on(
            Method::Get,
            "/",
            terminal(|w: ResponseWriter| w.write("never")).unwrap(),
        );

    let res = app.dispatch(Request::new(Method::Get, "/"));
    assert_eq!(res.status_code(), 200);
    assert!(res.body().is_empty());
}

#[test]
fn stopping_stage_response_is_what_gets_sent() {
    let app = Router::new()
        .with(
            chainable(|stop: StopChain, w: ResponseWriter| {
                w.send(Status::Unauthorized);
                stop.stop();
            })
            .unwrap(),
        )
        .on(
            Method::Get,
            "/",
            terminal(|w: ResponseWriter| w.write("never")).unwrap(),
        );

    let res = app.dispatch(Request::new(Method::Get, "/"));
    assert_eq!(res.status_code(), 401);
    assert!(res.body().is_empty());
}

#[test]
fn after_callbacks_unwind_in_reverse_registration_order() {
    let log: Log = Log::default();

    let mut app = Router::new();
    for name in ["first", "second", "third"] {
        let l = log.clone();
        app = app.with(
            chainable(move |after: AfterNext| {
                let l = l.clone();
                after.defer(move || log_entry(&l, format!("{name}-after")));
            })
            .unwrap(),
        );
    }
    let l = log.clone();
    let app = app.on(
        Method::Get,
        "/",
        terminal(move || log_entry(&l, "terminal")).unwrap(),
    );

    app.dispatch(Request::new(Method::Get, "/"));
    assert_eq!(
        *log.lock().unwrap(),
        vec!["terminal", "third-after", "second-after", "first-after"]
    );
}

#[test]
fn after_callbacks_still_unwind_in_reverse_when_the_chain_is_stopped() {
    let log: Log = Log::default();

    let l = log.clone();
    let outer = chainable(move |after: AfterNext| {
        let l = l.clone();
        after.defer(move || log_entry(&l, "outer-after"));
    })
    .unwrap();

    let l = log.clone();
    let inner = chainable(move |stop: StopChain, after: AfterNext| {
        let l = l.clone();
        after.defer(move || log_entry(&l, "inner-after"));
        stop.stop();
    })
    .unwrap();

    let app = Router::new().with(outer).with(inner).on(
        Method::Get,
        "/",
        terminal(|| ()).unwrap(),
    );

    app.dispatch(Request::new(Method::Get, "/"));
    assert_eq!(*log.lock().unwrap(), vec!["inner-after", "outer-after"]);
}

// ── End-to-end scenario A ────────────────────────────────────────────────────

#[test]
fn produce_consume_time_and_respond() {
    // stage1 publishes the caller; stage2 defers a timing line; the
    // terminal writes "hello". Exactly one timing line, logged after the
    // body was written.
    let log: Log = Log::default();

    let stamp = chainable(|req: Req| {
        (Caller(format!("{} {}", req.method(), req.path())),)
    })
    .unwrap();

    let l = log.clone();
    let timing = chainable(move |caller: Caller, after: AfterNext| {
        let l = l.clone();
        after.defer(move || log_entry(&l, format!("timed {}", caller.0)));
    })
    .unwrap();

    let l = log.clone();
    let hello = terminal(move |w: ResponseWriter| {
        w.write("hello");
        log_entry(&l, "body written");
    })
    .unwrap();

    let app = Router::new()
        .with(stamp)
        .with(timing)
        .on(Method::Get, "/hello", hello);

    let res = app.dispatch(Request::new(Method::Get, "/hello"));
    assert_eq!(res.body(), b"hello");
    assert_eq!(
        *log.lock().unwrap(),
        vec!["body written", "timed GET /hello"]
    );
}

// ── Routing integration ──────────────────────────────────────────────────────

#[test]
fn unmatched_paths_run_the_chain_and_hit_the_fallback() {
    let log: Log = Log::default();

    let l = log.clone();
    let observer = chainable(move |after: AfterNext| {
        let l = l.clone();
        after.defer(move || log_entry(&l, "observed"));
    })
    .unwrap();

    let app = Router::new().with(observer);

    let res = app.dispatch(Request::new(Method::Get, "/nowhere"));
    assert_eq!(res.status_code(), 404);
    assert_eq!(*log.lock().unwrap(), vec!["observed"]);
}

#[test]
fn route_parameters_reach_stages_through_the_request_handle() {
    let app = Router::new().on(
        Method::Get,
        "/users/{id}",
        terminal(|req: Req, w: ResponseWriter| {
            w.write(req.param("id").unwrap_or("unknown"));
        })
        .unwrap(),
    );

    let res = app.dispatch(Request::new(Method::Get, "/users/42"));
    assert_eq!(res.body(), b"42");
}

#[test]
fn request_headers_and_body_are_visible_to_stages() {
    let app = Router::new().on(
        Method::Post,
        "/echo",
        terminal(|req: Req, w: ResponseWriter| {
            let kind = req.header("Content-Type").unwrap_or("none").to_owned();
            w.header("x-received", &kind);
            w.write(req.body().to_vec());
        })
        .unwrap(),
    );

    let res = app.dispatch(
        Request::new(Method::Post, "/echo")
            .with_header("content-type", "text/plain")
            .with_body(b"payload".to_vec()),
    );
    assert_eq!(res.body(), b"payload");
    assert_eq!(
        res.headers(),
        vec![("x-received".to_owned(), "text/plain".to_owned())]
    );
}

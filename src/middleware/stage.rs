//! Stage adapters and type-directed parameter injection.
//!
//! # How plain functions become stages
//!
//! A stage is any `Fn` whose parameters are all [`Injectable`] and whose
//! return type is an output tuple ([`Outputs`]). The generic machinery
//! captures the concrete parameter and return types at the call site where
//! [`chainable`] or [`terminal`] wraps the function, so type matching costs
//! nothing per request — no registry probing, no reflection, just `TypeId`
//! comparisons against a four-entry reserved set and one map lookup per
//! store-resolved parameter.
//!
//! The chain from user code to vtable call mirrors how route handlers are
//! erased in conventional routers:
//!
//! ```text
//! fn track(m: Caller, after: AfterNext) { … }     ← user writes this
//!        ↓ chainable(track)?
//! Signature check (duplicate types → Error)        ← once, at registration
//!        ↓
//! Arc::new(FnStage { f: track, … })                ← heap-allocated wrapper
//!        ↓  stored as Arc<dyn ErasedStage>
//! stage.invoke(&mut inv)  at request time          ← one vtable dispatch
//! ```
//!
//! # Invocation sequence (chainable stages)
//!
//! 1. Resolve every parameter in declared order: reserved capability →
//!    store lookup → the type's `Default`.
//! 2. Invoke the function.
//! 3. Publish each returned value into the store by type, discarding any
//!    whose type is a reserved capability.
//! 4. Unless [`StopChain::stop`] was called, run the next stage — an
//!    ordinary synchronous call, so the call stack nests one frame per
//!    stage.
//! 5. Run the [`AfterNext`] callback, if one was registered. Because step 4
//!    happens first, callbacks unwind in reverse stage order.
//!
//! Terminal stages perform steps 1–3 only, without the stop/after
//! capabilities.
//!
//! A missing dependency is not an error: the parameter arrives as its
//! type's default value and the request proceeds. That leniency is easy to
//! mistake for correct wiring — watch the `debug!` log lines it emits if a
//! stage sees empty values it did not expect.

use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::Error;
use crate::request::Request;
use crate::response::Response;

use super::capability::{is_reserved, AfterNext, Req, ResponseWriter, StopChain};
use super::signature::{Signature, TypeSpec};
use super::store::ValueStore;

// ── Parameter and output bounds ───────────────────────────────────────────────

/// Satisfied by every type a stage may declare as a parameter.
///
/// You never implement this yourself; it holds automatically for any
/// `'static` type that is `Clone + Default + Send`. `Clone` lets the store
/// hand the value out without giving it up, `Default` is the fallback when
/// no stage has produced the type yet, and `Send` lets the surrounding
/// connection task migrate between runtime threads.
pub trait Injectable: Any + Clone + Default + Send {}

impl<T: Any + Clone + Default + Send> Injectable for T {}

/// The return shape of a stage function: `()` or a tuple of values to
/// publish.
///
/// A stage's outputs are declared as a tuple — one element per published
/// value, each stored under its own type. A single output is written
/// `(value,)`. Returning a capability type is allowed but pointless: those
/// elements are discarded instead of stored.
pub trait Outputs: 'static {
    #[doc(hidden)]
    fn specs() -> Vec<TypeSpec>;
    #[doc(hidden)]
    fn publish(self, store: &mut ValueStore);
}

impl Outputs for () {
    fn specs() -> Vec<TypeSpec> {
        Vec::new()
    }

    fn publish(self, _store: &mut ValueStore) {}
}

macro_rules! impl_outputs {
    ($(($r:ident, $idx:tt)),+) => {
        impl<$($r: Any + Send),+> Outputs for ($($r,)+) {
            fn specs() -> Vec<TypeSpec> {
                vec![$(TypeSpec::of::<$r>()),+]
            }

            fn publish(self, store: &mut ValueStore) {
                $(
                    if !is_reserved(TypeId::of::<$r>()) {
                        store.set(self.$idx);
                    }
                )+
            }
        }
    };
}

impl_outputs!((R1, 0));
impl_outputs!((R1, 0), (R2, 1));
impl_outputs!((R1, 0), (R2, 1), (R3, 2));
impl_outputs!((R1, 0), (R2, 1), (R3, 2), (R4, 3));

// ── Per-invocation resolution context ─────────────────────────────────────────

/// Everything one stage invocation resolves its parameters from.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// public [`StageFn`] trait's `invoke` method. External crates cannot
/// usefully interact with it.
#[doc(hidden)]
pub struct Invocation<'a> {
    store: &'a mut ValueStore,
    req: &'a Req,
    writer: &'a ResponseWriter,
    // Offered to chainable stages only; terminal stages have nothing left
    // to stop or defer around.
    stop: Option<&'a StopChain>,
    after: Option<&'a AfterNext>,
}

impl Invocation<'_> {
    /// Resolves one parameter: reserved capability first, then the store,
    /// then the type's default.
    fn resolve<T: Injectable>(&self) -> T {
        let id = TypeId::of::<T>();
        if id == TypeId::of::<ResponseWriter>() {
            return cast(self.writer.clone());
        }
        if id == TypeId::of::<Req>() {
            return cast(self.req.clone());
        }
        if let Some(stop) = self.stop {
            if id == TypeId::of::<StopChain>() {
                return cast(stop.clone());
            }
        }
        if let Some(after) = self.after {
            if id == TypeId::of::<AfterNext>() {
                return cast(after.clone());
            }
        }
        match self.store.get::<T>() {
            Some(value) => value,
            None => {
                debug!(
                    ty = std::any::type_name::<T>(),
                    "no value of this type in the store; injecting its default"
                );
                T::default()
            }
        }
    }

    fn store_mut(&mut self) -> &mut ValueStore {
        self.store
    }
}

/// Converts a capability handle into the parameter type whose identity was
/// just checked against it.
fn cast<C: Any, T: Any>(capability: C) -> T {
    *(Box::new(capability) as Box<dyn Any>)
        .downcast::<T>()
        .expect("capability type identity checked before cast")
}

// ── StageFn ───────────────────────────────────────────────────────────────────

/// Implemented for every function usable as a stage.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `Fn` of up to eight [`Injectable`] parameters returning an output tuple
/// ([`Outputs`]) — named functions, closures, and `Fn` structs alike.
///
/// The trait is **sealed** (via the private `Sealed` supertrait): only the
/// arity impls below can satisfy it. `P` is a marker for the parameter
/// tuple, which lets each arity get its own impl without overlap.
pub trait StageFn<P>: private::Sealed<P> + Send + Sync + 'static {
    #[doc(hidden)]
    fn describe() -> (Vec<TypeSpec>, Vec<TypeSpec>);
    #[doc(hidden)]
    fn invoke(&self, inv: &mut Invocation<'_>);
}

/// The sealing module. Because `Sealed` is private, external crates cannot
/// name it and therefore cannot implement `StageFn` on their own types.
mod private {
    pub trait Sealed<P> {}
}

macro_rules! impl_stage_fn {
    ($($p:ident),*) => {
        impl<Func, Out, $($p,)*> private::Sealed<($($p,)*)> for Func
        where
            Func: Fn($($p),*) -> Out + Send + Sync + 'static,
            Out: Outputs,
            $($p: Injectable,)*
        {
        }

        impl<Func, Out, $($p,)*> StageFn<($($p,)*)> for Func
        where
            Func: Fn($($p),*) -> Out + Send + Sync + 'static,
            Out: Outputs,
            $($p: Injectable,)*
        {
            fn describe() -> (Vec<TypeSpec>, Vec<TypeSpec>) {
                (vec![$(TypeSpec::of::<$p>()),*], Out::specs())
            }

            #[allow(non_snake_case, unused_variables)]
            fn invoke(&self, inv: &mut Invocation<'_>) {
                // Declared order, left to right.
                $(let $p = inv.resolve::<$p>();)*
                let out = (self)($($p),*);
                out.publish(inv.store_mut());
            }
        }
    };
}

impl_stage_fn!();
impl_stage_fn!(P1);
impl_stage_fn!(P1, P2);
impl_stage_fn!(P1, P2, P3);
impl_stage_fn!(P1, P2, P3, P4);
impl_stage_fn!(P1, P2, P3, P4, P5);
impl_stage_fn!(P1, P2, P3, P4, P5, P6);
impl_stage_fn!(P1, P2, P3, P4, P5, P6, P7);
impl_stage_fn!(P1, P2, P3, P4, P5, P6, P7, P8);

// ── Type erasure ──────────────────────────────────────────────────────────────

/// Internal dispatch interface; one vtable call per stage per request.
trait ErasedStage: Send + Sync {
    fn invoke(&self, inv: &mut Invocation<'_>);
}

/// Newtype wrapper holding a concrete stage function `F`, bridging the
/// typed world to the trait-object world.
struct FnStage<F, P> {
    f: F,
    // `fn(P)` keeps the marker Send + Sync regardless of P.
    _marker: PhantomData<fn(P)>,
}

impl<F, P> ErasedStage for FnStage<F, P>
where
    F: StageFn<P>,
    P: 'static,
{
    fn invoke(&self, inv: &mut Invocation<'_>) {
        self.f.invoke(inv);
    }
}

// ── Registration constructors ─────────────────────────────────────────────────

/// Wraps `f` as a chainable stage.
///
/// A chainable stage may be followed by further stages; it is offered all
/// four capabilities ([`ResponseWriter`], [`Req`], [`StopChain`],
/// [`AfterNext`]) on top of store-resolved parameters.
///
/// # Errors
///
/// Returns a configuration fault if `f` declares the same type twice among
/// its parameters, or twice in its return tuple. Registration is the only
/// point where this surfaces — a stage that wires is a stage that runs.
///
/// ```rust
/// use seam::{chainable, Req};
///
/// #[derive(Clone, Default)]
/// struct Caller(String);
///
/// let stage = chainable(|req: Req| (Caller(req.method().to_string()),))?;
/// # let _ = stage;
/// # Ok::<(), seam::Error>(())
/// ```
pub fn chainable<F, P>(f: F) -> Result<Chainable, Error>
where
    F: StageFn<P>,
    P: 'static,
{
    let stage = std::any::type_name::<F>();
    let (params, returns) = F::describe();
    let signature = Signature::validate(stage, params, returns)?;
    trace!(stage, %signature, "registered chainable stage");
    Ok(Chainable {
        signature,
        stage: Arc::new(FnStage { f, _marker: PhantomData }),
    })
}

/// Wraps `f` as a terminal stage — the end of a chain.
///
/// A terminal stage never has a next stage, so it is offered only
/// [`ResponseWriter`] and [`Req`]; every other parameter resolves from the
/// store. It is expected to produce the final observable effect: writing
/// the response.
///
/// # Errors
///
/// Same configuration faults as [`chainable`].
///
/// ```rust
/// use seam::{terminal, ResponseWriter};
///
/// let hello = terminal(|w: ResponseWriter| w.write("hello"))?;
/// # let _ = hello;
/// # Ok::<(), seam::Error>(())
/// ```
pub fn terminal<F, P>(f: F) -> Result<Terminal, Error>
where
    F: StageFn<P>,
    P: 'static,
{
    let stage = std::any::type_name::<F>();
    let (params, returns) = F::describe();
    let signature = Signature::validate(stage, params, returns)?;
    trace!(stage, %signature, "registered terminal stage");
    Ok(Terminal {
        signature,
        stage: Arc::new(FnStage { f, _marker: PhantomData }),
    })
}

// ── Stage handles ─────────────────────────────────────────────────────────────

/// A registered chainable stage. Cheap to clone; shared across requests.
#[derive(Clone)]
pub struct Chainable {
    signature: Signature,
    stage: Arc<dyn ErasedStage>,
}

impl Chainable {
    /// The stage's inspected parameter and return types.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn call(&self, cx: &mut StageCx, next: Next<'_>) {
        // Fresh per invocation; never reused across stages or requests.
        let stop = StopChain::new();
        let after = AfterNext::new();
        {
            let mut inv = Invocation {
                store: &mut cx.store,
                req: &cx.req,
                writer: &cx.writer,
                stop: Some(&stop),
                after: Some(&after),
            };
            self.stage.invoke(&mut inv);
        }
        if !stop.raised() {
            next.run(cx);
        }
        if let Some(callback) = after.take() {
            callback();
        }
    }
}

impl fmt::Debug for Chainable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Chainable{}", self.signature)
    }
}

/// A registered terminal stage. Cheap to clone; shared across requests.
#[derive(Clone)]
pub struct Terminal {
    signature: Signature,
    stage: Arc<dyn ErasedStage>,
}

impl Terminal {
    /// The stage's inspected parameter and return types.
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub(crate) fn call(&self, cx: &mut StageCx) {
        let mut inv = Invocation {
            store: &mut cx.store,
            req: &cx.req,
            writer: &cx.writer,
            stop: None,
            after: None,
        };
        self.stage.invoke(&mut inv);
    }
}

impl fmt::Debug for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Terminal{}", self.signature)
    }
}

// ── Per-request plumbing ──────────────────────────────────────────────────────

/// Per-request context: the value store plus the shared request and writer
/// handles every capability clones from. Created by `Router::dispatch`,
/// dropped when it returns.
pub(crate) struct StageCx {
    store: ValueStore,
    req: Req,
    writer: ResponseWriter,
}

impl StageCx {
    pub(crate) fn new(request: Request) -> Self {
        Self {
            store: ValueStore::new(),
            req: Req::new(Arc::new(request)),
            writer: ResponseWriter::new(),
        }
    }

    /// Takes whatever the chain wrote as the final response.
    pub(crate) fn finish(self) -> Response {
        self.writer.take_response()
    }
}

/// The remainder of a chain: zero or more chainable stages, then the
/// terminal. Running it recurses — one stack frame per stage — which is
/// what makes [`AfterNext`] callbacks unwind LIFO.
pub(crate) struct Next<'a> {
    rest: &'a [Chainable],
    terminal: &'a Terminal,
}

impl<'a> Next<'a> {
    pub(crate) fn new(rest: &'a [Chainable], terminal: &'a Terminal) -> Self {
        Self { rest, terminal }
    }

    pub(crate) fn run(self, cx: &mut StageCx) {
        match self.rest.split_first() {
            Some((stage, rest)) => stage.call(cx, Next { rest, terminal: self.terminal }),
            None => self.terminal.call(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::method::Method;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Counter(u32);

    #[derive(Clone, Default, Debug, PartialEq)]
    struct Tag(String);

    fn run(chain: &[Chainable], terminal: &Terminal) -> Response {
        let mut cx = StageCx::new(Request::new(Method::Get, "/"));
        Next::new(chain, terminal).run(&mut cx);
        cx.finish()
    }

    #[test]
    fn duplicate_parameter_types_fail_registration() {
        let result = chainable(|_a: Counter, _b: Counter| ());
        assert!(matches!(result, Err(Error::DuplicateParameter { .. })));
    }

    #[test]
    fn duplicate_return_types_fail_registration() {
        let result = terminal(|| (Counter(1), Counter(2)));
        assert!(matches!(result, Err(Error::DuplicateReturn { .. })));
    }

    #[test]
    fn same_type_in_params_and_returns_is_accepted() {
        assert!(chainable(|c: Counter| (Counter(c.0 + 1),)).is_ok());
    }

    #[test]
    fn missing_dependency_arrives_as_default() {
        let seen = Arc::new(AtomicU32::new(u32::MAX));
        let seen2 = Arc::clone(&seen);
        let stage = chainable(move |c: Counter| {
            seen2.store(c.0, Ordering::Relaxed);
        })
        .unwrap();
        let end = terminal(|| ()).unwrap();

        run(&[stage], &end);
        assert_eq!(seen.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn published_values_flow_to_later_stages() {
        let produce = chainable(|| (Tag("abc".into()),)).unwrap();
        let end = terminal(|t: Tag, w: ResponseWriter| w.write(t.0)).unwrap();

        let res = run(&[produce], &end);
        assert_eq!(res.body, b"abc");
    }

    #[test]
    fn returned_capabilities_are_discarded_not_stored() {
        let leak = chainable(|stop: StopChain| (stop,)).unwrap();
        let end = terminal(|| ()).unwrap();

        let mut cx = StageCx::new(Request::new(Method::Get, "/"));
        Next::new(std::slice::from_ref(&leak), &end).run(&mut cx);
        assert!(cx.store.get::<StopChain>().is_none());
    }

    #[test]
    fn terminal_gets_detached_chain_control_handles() {
        // Declaring StopChain/AfterNext in a terminal stage is legal but
        // inert: the handles are detached defaults.
        let end = terminal(|stop: StopChain, after: AfterNext, w: ResponseWriter| {
            stop.stop();
            after.defer(|| panic!("detached slot must never be drained"));
            w.write("done");
        })
        .unwrap();

        let res = run(&[], &end);
        assert_eq!(res.body, b"done");
    }

    #[test]
    fn stop_skips_next_but_runs_own_after_callback() {
        let order: Arc<Mutex<Vec<&'static str>>> = Arc::new(Mutex::new(Vec::new()));

        let o = Arc::clone(&order);
        let stopper = chainable(move |stop: StopChain, after: AfterNext| {
            let o = Arc::clone(&o);
            stop.stop();
            after.defer(move || o.lock().unwrap().push("after"));
        })
        .unwrap();

        let o = Arc::clone(&order);
        let end = terminal(move || o.lock().unwrap().push("terminal")).unwrap();

        run(&[stopper], &end);
        assert_eq!(*order.lock().unwrap(), vec!["after"]);
    }
}

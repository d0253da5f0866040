//! Evaluation context: heap arena, symbol table, environment and GC roots.
//!
//! A context is itself a heap object so that it can travel as a `Sexp`
//! through the shim surface. Its own cell lives outside the arena and is
//! released by [`destroy_context`].

use std::cell::{Cell, RefCell};
use std::sync::Once;

use rustc_hash::FxHashMap;
use tracing::debug;

use super::heap::{CoreForm, HeapCell, HeapObject, HeapTag};
use super::port::Port;
use super::sexp::Sexp;

/// Tunables read when a context is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextConfig {
    /// Language version used by `load_standard_env` when none is given.
    pub scheme_version: u32,
    /// Initial arena capacity, in objects.
    pub heap_hint: usize,
    /// Report every collection at debug level instead of trace.
    pub gc_trace: bool,
}

impl Default for ContextConfig {
    fn default() -> Self {
        ContextConfig {
            scheme_version: 7,
            heap_hint: 1024,
            gc_trace: false,
        }
    }
}

impl ContextConfig {
    /// Defaults overridden by `SCHEME_SHIM_VERSION`, `SCHEME_SHIM_HEAP_HINT`
    /// and `SCHEME_SHIM_GC_TRACE`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut config = ContextConfig::default();
        if let Some(v) = env_parse("SCHEME_SHIM_VERSION") {
            config.scheme_version = v;
        }
        if let Some(v) = env_parse("SCHEME_SHIM_HEAP_HINT") {
            config.heap_hint = v;
        }
        if let Ok(v) = std::env::var("SCHEME_SHIM_GC_TRACE") {
            config.gc_trace = matches!(v.as_str(), "1" | "true" | "yes");
        }
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(key, value = %raw, "ignoring unparsable environment override");
            None
        }
    }
}

pub struct Context {
    pub(crate) heap: RefCell<Vec<Box<HeapCell>>>,
    pub(crate) symbols: RefCell<FxHashMap<Box<str>, Sexp>>,
    pub(crate) env: Cell<Sexp>,
    /// Host-owned root slots (see `ChibiVar`).
    pub(crate) saves: RefCell<Vec<*const Cell<Sexp>>>,
    pub(crate) preserved: RefCell<Vec<Sexp>>,
    /// User type descriptors, indexed by `id - HeapTag::BUILTIN.len()`.
    pub(crate) types: RefCell<Vec<Sexp>>,
    /// Parameter objects for the current input, output and error ports.
    pub(crate) port_params: [Cell<Sexp>; 3],
    pub(crate) collecting: Cell<bool>,
    config: ContextConfig,
    self_sexp: Cell<Sexp>,
}

static INIT: Once = Once::new();

/// Process-wide initialization. Idempotent.
pub fn scheme_init() {
    INIT.call_once(|| debug!("scheme runtime initialized"));
}

impl Context {
    /// Create a context holding a primitive environment (core forms and
    /// port parameters) and return its handle.
    pub fn make_eval_context(config: ContextConfig) -> Sexp {
        scheme_init();
        let context = Context {
            heap: RefCell::new(Vec::with_capacity(config.heap_hint)),
            symbols: RefCell::new(FxHashMap::default()),
            env: Cell::new(Sexp::FALSE),
            saves: RefCell::new(Vec::new()),
            preserved: RefCell::new(Vec::new()),
            types: RefCell::new(Vec::new()),
            port_params: [
                Cell::new(Sexp::FALSE),
                Cell::new(Sexp::FALSE),
                Cell::new(Sexp::FALSE),
            ],
            collecting: Cell::new(false),
            config,
            self_sexp: Cell::new(Sexp::FALSE),
        };
        let cell = Box::into_raw(Box::new(HeapCell::new(HeapObject::Context(Box::new(
            context,
        )))));
        let ctx = Sexp::from_cell(cell);
        // SAFETY: `ctx` was just built from a live context cell.
        let c = unsafe { Context::from_sexp(ctx) };
        c.self_sexp.set(ctx);
        c.init_primitive_env();
        debug!(version = c.config.scheme_version, "context created");
        ctx
    }

    /// Borrow the context behind a handle. Panics if `ctx` is not a context.
    ///
    /// # Safety
    /// `ctx` must not have been passed to `destroy_context`.
    pub unsafe fn from_sexp<'a>(ctx: Sexp) -> &'a Context {
        match ctx.object() {
            Some(HeapObject::Context(c)) => c,
            _ => panic!("not a context: {:?}", ctx),
        }
    }

    pub fn sexp(&self) -> Sexp {
        self.self_sexp.get()
    }

    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    pub fn alloc(&self, obj: HeapObject) -> Sexp {
        let cell = Box::new(HeapCell::new(obj));
        let sexp = Sexp::from_cell(&*cell);
        self.heap.borrow_mut().push(cell);
        sexp
    }

    /// Number of live objects in the arena.
    pub fn heap_len(&self) -> usize {
        self.heap.borrow().len()
    }

    pub fn intern(&self, name: &str) -> Sexp {
        if let Some(&sym) = self.symbols.borrow().get(name) {
            return sym;
        }
        let sym = self.alloc(HeapObject::Symbol(name.into()));
        self.symbols.borrow_mut().insert(name.into(), sym);
        sym
    }

    pub fn env(&self) -> Sexp {
        self.env.get()
    }

    pub fn set_env(&self, env: Sexp) {
        self.env.set(env);
    }

    // -------------------------------------------------------------------------
    // Roots
    // -------------------------------------------------------------------------

    /// Keep `obj` alive until a matching `release_object`. Nests.
    pub fn preserve_object(&self, obj: Sexp) {
        if obj.is_pointer() {
            self.preserved.borrow_mut().push(obj);
        }
    }

    pub fn release_object(&self, obj: Sexp) {
        let mut preserved = self.preserved.borrow_mut();
        if let Some(pos) = preserved.iter().rposition(|&x| x == obj) {
            preserved.swap_remove(pos);
        }
    }

    /// Register a host slot whose current value is a GC root.
    ///
    /// # Safety
    /// `slot` must stay valid until `unregister_root` is called with it.
    pub unsafe fn register_root(&self, slot: *const Cell<Sexp>) {
        self.saves.borrow_mut().push(slot);
    }

    pub fn unregister_root(&self, slot: *const Cell<Sexp>) {
        let mut saves = self.saves.borrow_mut();
        if let Some(pos) = saves.iter().rposition(|&s| std::ptr::eq(s, slot)) {
            saves.remove(pos);
        }
    }

    // -------------------------------------------------------------------------
    // Ports
    // -------------------------------------------------------------------------

    fn port_param(&self, which: usize) -> Sexp {
        match self.port_params[which].get().object() {
            Some(HeapObject::Parameter { value, .. }) => value.get(),
            _ => Sexp::FALSE,
        }
    }

    pub fn current_input_port(&self) -> Sexp {
        self.port_param(0)
    }

    pub fn current_output_port(&self) -> Sexp {
        self.port_param(1)
    }

    pub fn current_error_port(&self) -> Sexp {
        self.port_param(2)
    }

    // -------------------------------------------------------------------------
    // Environments
    // -------------------------------------------------------------------------

    fn init_primitive_env(&self) {
        let env = self.make_env(Sexp::FALSE);
        self.env.set(env);
        for (form, name) in CoreForm::ALL {
            let sym = self.intern(name);
            let core = self.alloc(HeapObject::Core { form, name: sym });
            self.env_define(env, sym, core);
        }
        let ports = [
            ("current-input-port", Port::stdin()),
            ("current-output-port", Port::stdout()),
            ("current-error-port", Port::stderr()),
        ];
        for (i, (name, port)) in ports.into_iter().enumerate() {
            let port = self.alloc(HeapObject::Port(RefCell::new(port)));
            let param = self.make_parameter(port, Sexp::FALSE);
            self.port_params[i].set(param);
            let sym = self.intern(name);
            self.env_define(env, sym, param);
        }
    }

    /// Install the standard bindings into `env` (the context environment
    /// when `env` is not an environment). `version` is a fixnum; anything
    /// else selects the configured version. Returns the environment or an
    /// exception.
    pub fn load_standard_env(&self, env: Sexp, version: Sexp) -> Sexp {
        let env = if env.is_env() { env } else { self.env() };
        let version = if version.is_fixnum() {
            version.unbox_fixnum()
        } else {
            self.config.scheme_version as isize
        };

        let mut features = vec!["chibi", "full-unicode", "ratios", "exact-complex"];
        if version >= 7 {
            features.insert(0, "r7rs");
        }
        let syms: Vec<Sexp> = features.iter().map(|f| self.intern(f)).collect();
        let list = self.list(&syms);
        let key = self.intern("*features*");
        self.env_define(env, key, list);

        let res = super::builtins::register_builtins(self, env);
        if res.is_exception() {
            return res;
        }
        debug!(version, "standard environment loaded");
        env
    }

    /// Type descriptor registered under `id`, if any.
    pub fn type_by_id(&self, id: usize) -> Option<Sexp> {
        let index = id.checked_sub(HeapTag::BUILTIN.len())?;
        self.types.borrow().get(index).copied()
    }
}

/// Run every pending finalizer and release the context and its heap.
///
/// # Safety
/// `ctx` must be a live context handle; it and every handle allocated in it
/// are dangling afterwards.
pub unsafe fn destroy_context(ctx: Sexp) -> Sexp {
    if !ctx.is_context() {
        return Sexp::FALSE;
    }
    let c = Context::from_sexp(ctx);
    let freed = c.collect(Vec::new());
    debug!(freed, "context destroyed");
    drop(Box::from_raw(ctx.raw() as *mut HeapCell));
    Sexp::TRUE
}

//! Script frames and name resolution
//!
//! A [`ScriptFrame`] is the state one evaluation runs in: the local scope,
//! the implicit receiver `this`, the sandbox flag, the depth counter and the
//! namespaces brought in with `using`. Frames are passed explicitly to every
//! evaluation call; a function call creates a fresh frame that inherits the
//! depth, sandbox flag and imports of its caller.
//!
//! Scopes are dictionaries chained through their `__parent` key, so a
//! closure or loop body sees the variables of the scopes it was opened in.

mod frame;
pub mod prelude;
pub(crate) mod prototype;

pub use frame::ScopeGuard;

use std::sync::Arc;

use crate::container::Dictionary;
use crate::context::EvalContext;
use crate::error::EvalError;
use crate::value::Value;

/// Evaluation state for one activation.
pub struct ScriptFrame<'ctx> {
    ctx: &'ctx EvalContext,

    /// Local scope; allocated on first write
    pub locals: Option<Arc<Dictionary>>,

    /// Implicit receiver
    pub this: Value,

    /// Forbid side-effecting constructs
    pub sandboxed: bool,

    depth: usize,
    imports: Vec<Value>,
}

impl<'ctx> ScriptFrame<'ctx> {
    /// Create a top-level frame with no locals and an Empty receiver.
    pub fn new(ctx: &'ctx EvalContext) -> Self {
        Self {
            ctx,
            locals: None,
            this: Value::Empty,
            sandboxed: false,
            depth: 0,
            imports: Vec::new(),
        }
    }

    /// Use `locals` as the local scope.
    pub fn with_locals(mut self, locals: Arc<Dictionary>) -> Self {
        self.locals = Some(locals);
        self
    }

    /// Use `this` as the implicit receiver.
    pub fn with_this(mut self, this: Value) -> Self {
        self.this = this;
        self
    }

    /// Set the sandbox flag.
    pub fn with_sandbox(mut self, sandboxed: bool) -> Self {
        self.sandboxed = sandboxed;
        self
    }

    /// The shared evaluation context.
    pub fn context(&self) -> &'ctx EvalContext {
        self.ctx
    }

    /// Current evaluation depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Namespaces imported with `using`, in import order.
    pub fn imports(&self) -> &[Value] {
        &self.imports
    }

    /// Add a namespace to the lookup path.
    pub fn add_import(&mut self, namespace: Value) {
        self.imports.push(namespace);
    }

    /// Frame for a nested call: same context, depth, sandbox flag and
    /// imports; fresh locals and receiver.
    pub fn call_frame(&self) -> ScriptFrame<'ctx> {
        ScriptFrame {
            ctx: self.ctx,
            locals: None,
            this: Value::Empty,
            sandboxed: self.sandboxed,
            depth: self.depth,
            imports: self.imports.clone(),
        }
    }

    /// The local scope, allocating it if necessary.
    pub fn ensure_locals(&mut self) -> Arc<Dictionary> {
        Arc::clone(self.locals.get_or_insert_with(|| Arc::new(Dictionary::new())))
    }

    // ═══════════════════════════════════════════════════════════════════
    // Depth Tracking
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a nested evaluation. Returns error if max depth exceeded.
    pub fn enter_eval(&mut self) -> Result<(), EvalError> {
        if self.depth >= self.ctx.max_depth {
            return Err(EvalError::StackOverflow {
                depth: self.depth + 1,
                max: self.ctx.max_depth,
                location: None,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Leave a nested evaluation.
    pub fn exit_eval(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Name Resolution
    // ═══════════════════════════════════════════════════════════════════

    fn this_is_scope(&self, scope: &Arc<Dictionary>) -> bool {
        matches!(&self.this, Value::Dictionary(this) if Arc::ptr_eq(this, scope))
    }

    /// Resolve `name`: local scope chain, then the receiver's own fields,
    /// then imported namespaces, then globals. Constants cannot be removed
    /// or replaced through the globals dictionary.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.locals.clone();
        while let Some(scope) = current {
            if let Some(value) = scope.get(name) {
                return Some(value);
            }
            current = scope.parent_scope();
        }

        match &self.this {
            Value::Dictionary(this) => {
                let is_locals = self.locals.as_ref().is_some_and(|l| Arc::ptr_eq(l, this));
                if !is_locals {
                    if let Some(value) = this.get(name) {
                        return Some(value);
                    }
                }
            }
            Value::Object(obj) => {
                if let Some(id) = obj.field_id(name) {
                    return Some(obj.get_field(id));
                }
            }
            _ => {}
        }

        for namespace in &self.imports {
            if let Value::Dictionary(ns) = namespace {
                if let Some(value) = ns.get(name) {
                    return Some(value);
                }
            }
        }

        self.ctx
            .constant(name)
            .or_else(|| self.ctx.globals().get(name))
    }

    /// Resolve `name`, yielding Empty if it is not defined anywhere.
    pub fn get(&self, name: &str) -> Value {
        self.lookup(name).unwrap_or_default()
    }

    /// Container a write to `name` should go to.
    ///
    /// The local scope chain is searched up to the scope that is also the
    /// receiver (the object under construction). Names not found there go
    /// to the receiver when it is a dictionary or reflected object and to
    /// the local scope otherwise.
    pub fn write_target(&mut self, name: &str) -> Value {
        let mut current = self.locals.clone();
        while let Some(scope) = current {
            if scope.contains(name) {
                return Value::Dictionary(scope);
            }
            if self.this_is_scope(&scope) {
                break;
            }
            current = scope.parent_scope();
        }

        if matches!(self.this, Value::Dictionary(_) | Value::Object(_)) {
            return self.this.clone();
        }
        Value::Dictionary(self.ensure_locals())
    }

    /// Define `name` in the local scope.
    pub fn define(&mut self, name: impl Into<String>, value: Value) -> Result<(), EvalError> {
        self.ensure_locals().set(name, value)?;
        Ok(())
    }
}

impl std::fmt::Debug for ScriptFrame<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptFrame")
            .field("locals", &self.locals)
            .field("this", &self.this)
            .field("sandboxed", &self.sandboxed)
            .field("depth", &self.depth)
            .field("imports", &self.imports.len())
            .finish()
    }
}

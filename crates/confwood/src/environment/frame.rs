//! RAII scope guard for automatic scope restoration

use std::sync::Arc;

use super::ScriptFrame;
use crate::container::Dictionary;
use crate::value::Value;

/// RAII guard that swaps a new scope into a frame and restores the previous
/// one when dropped.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use confwood::{Dictionary, EvalContext, ScriptFrame, Value};
///
/// let ctx = EvalContext::new();
/// let mut frame = ScriptFrame::new(&ctx);
/// frame.define("x", Value::from(1)).unwrap();
///
/// {
///     let child = Dictionary::child_of(&frame.ensure_locals());
///     let mut guard = frame.enter_scope(child);
///     guard.define("y", Value::from(2)).unwrap();
///     // x and y are visible here
///     assert_eq!(guard.get("x"), Value::from(1));
/// }
/// // guard dropped, y is gone
/// assert!(frame.lookup("y").is_none());
/// assert!(frame.lookup("x").is_some());
/// ```
pub struct ScopeGuard<'f, 'ctx> {
    frame: &'f mut ScriptFrame<'ctx>,
    saved_locals: Option<Option<Arc<Dictionary>>>,
    saved_this: Option<Value>,
}

impl<'ctx> ScriptFrame<'ctx> {
    /// Make `locals` the local scope until the guard is dropped.
    pub fn enter_scope(&mut self, locals: Arc<Dictionary>) -> ScopeGuard<'_, 'ctx> {
        let saved_locals = self.locals.replace(locals);
        ScopeGuard {
            frame: self,
            saved_locals: Some(saved_locals),
            saved_this: None,
        }
    }

    /// Make `scope` both the local scope and the receiver until the guard is
    /// dropped. Used for object bodies.
    pub fn enter_object_scope(&mut self, scope: Arc<Dictionary>) -> ScopeGuard<'_, 'ctx> {
        let saved_this = std::mem::replace(&mut self.this, Value::Dictionary(Arc::clone(&scope)));
        let saved_locals = self.locals.replace(scope);
        ScopeGuard {
            frame: self,
            saved_locals: Some(saved_locals),
            saved_this: Some(saved_this),
        }
    }

    /// Make `this` the receiver until the guard is dropped.
    pub fn enter_receiver(&mut self, this: Value) -> ScopeGuard<'_, 'ctx> {
        let saved_this = std::mem::replace(&mut self.this, this);
        ScopeGuard {
            frame: self,
            saved_locals: None,
            saved_this: Some(saved_this),
        }
    }
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        if let Some(locals) = self.saved_locals.take() {
            self.frame.locals = locals;
        }
        if let Some(this) = self.saved_this.take() {
            self.frame.this = this;
        }
    }
}

impl<'ctx> std::ops::Deref for ScopeGuard<'_, 'ctx> {
    type Target = ScriptFrame<'ctx>;

    fn deref(&self) -> &Self::Target {
        self.frame
    }
}

impl std::ops::DerefMut for ScopeGuard<'_, '_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.frame
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EvalContext;

    #[test]
    fn test_scope_restored_on_drop() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        let outer = frame.ensure_locals();

        {
            let child = Dictionary::child_of(&outer);
            let guard = frame.enter_scope(Arc::clone(&child));
            assert!(Arc::ptr_eq(guard.locals.as_ref().unwrap(), &child));
        }

        assert!(Arc::ptr_eq(frame.locals.as_ref().unwrap(), &outer));
    }

    #[test]
    fn test_object_scope_swaps_this() {
        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx).with_this(Value::from("outer"));
        let object = Arc::new(Dictionary::new());

        {
            let guard = frame.enter_object_scope(Arc::clone(&object));
            assert!(guard.this.is_same_object(&Value::Dictionary(Arc::clone(&object))));
        }

        assert_eq!(frame.this, Value::from("outer"));
        assert!(frame.locals.is_none());
    }

    #[test]
    fn test_restored_on_early_return() {
        fn fails(frame: &mut ScriptFrame<'_>) -> Result<(), ()> {
            let _guard = frame.enter_receiver(Value::from(1));
            Err(())
        }

        let ctx = EvalContext::new();
        let mut frame = ScriptFrame::new(&ctx);
        assert!(fails(&mut frame).is_err());
        assert!(frame.this.is_empty());
    }
}

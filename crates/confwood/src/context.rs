//! Evaluation context configuration

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::apply::ApplyRuleIndex;
use crate::container::Dictionary;
use crate::debug_info::DebugInfo;
use crate::environment::{prelude, ScriptFrame};
use crate::error::EvalError;
use crate::registry::ItemRegistry;
use crate::value::Value;

/// Callback invoked for `debugger` statements and for errors at the node
/// that raised them.
pub type BreakpointHook =
    Arc<dyn Fn(&ScriptFrame<'_>, Option<&EvalError>, &DebugInfo) + Send + Sync>;

/// Configuration and shared state for evaluation.
///
/// One context is shared by every frame of a configuration load. It is
/// `Send + Sync`; the mutable parts (globals, registry, rule index) do their
/// own locking.
#[derive(Clone)]
pub struct EvalContext {
    /// Maximum evaluation depth (stack overflow protection)
    pub max_depth: usize,

    /// Interrupt flag - set to true to abort evaluation
    pub interrupt: Arc<AtomicBool>,

    /// Whether to trace evaluation (for debugging)
    pub trace: bool,

    globals: Arc<Dictionary>,
    constants: Arc<DashMap<String, Value>>,
    registry: Arc<ItemRegistry>,
    rules: Arc<RwLock<ApplyRuleIndex>>,
    breakpoint: Option<BreakpointHook>,
}

impl Default for EvalContext {
    fn default() -> Self {
        let globals = Arc::new(Dictionary::new());
        prelude::load_prelude(&globals);

        Self {
            max_depth: 300,
            interrupt: Arc::new(AtomicBool::new(false)),
            trace: false,
            globals,
            constants: Arc::new(DashMap::new()),
            registry: Arc::new(ItemRegistry::new()),
            rules: Arc::new(RwLock::new(ApplyRuleIndex::with_default_types())),
            breakpoint: None,
        }
    }
}

impl EvalContext {
    /// Create a new context with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a context with a custom depth limit.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Default::default()
        }
    }

    /// Install a breakpoint hook.
    pub fn with_breakpoint_hook(mut self, hook: BreakpointHook) -> Self {
        self.breakpoint = Some(hook);
        self
    }

    /// Check if evaluation has been interrupted.
    pub fn is_interrupted(&self) -> bool {
        self.interrupt.load(Ordering::Relaxed)
    }

    /// Request interruption of evaluation.
    pub fn interrupt(&self) {
        self.interrupt.store(true, Ordering::Relaxed);
    }

    /// Reset the interrupt flag.
    pub fn reset_interrupt(&self) {
        self.interrupt.store(false, Ordering::Relaxed);
    }

    /// The global scope, consulted last during name resolution.
    pub fn globals(&self) -> &Arc<Dictionary> {
        &self.globals
    }

    /// Value of a `const` definition.
    pub fn constant(&self, name: &str) -> Option<Value> {
        self.constants.get(name).map(|entry| entry.value().clone())
    }

    /// Define a constant, visible as a global that can never change.
    ///
    /// # Errors
    ///
    /// `ConstantRedefined` if `name` is already a constant or a global.
    pub fn define_constant(&self, name: &str, value: Value) -> Result<(), EvalError> {
        let redefined = || EvalError::ConstantRedefined {
            name: name.to_string(),
            location: None,
        };
        if self.globals.contains(name) {
            return Err(redefined());
        }
        match self.constants.entry(name.to_string()) {
            Entry::Occupied(_) => Err(redefined()),
            Entry::Vacant(slot) => {
                self.globals.set(name, value.clone())?;
                slot.insert(value);
                Ok(())
            }
        }
    }

    /// Registered configuration items.
    pub fn registry(&self) -> &ItemRegistry {
        &self.registry
    }

    /// Read access to the apply rule index.
    pub fn apply_rules(&self) -> RwLockReadGuard<'_, ApplyRuleIndex> {
        self.rules.read()
    }

    /// Write access to the apply rule index.
    pub fn apply_rules_mut(&self) -> RwLockWriteGuard<'_, ApplyRuleIndex> {
        self.rules.write()
    }

    pub(crate) fn breakpoint(
        &self,
        frame: &ScriptFrame<'_>,
        error: Option<&EvalError>,
        debug_info: &DebugInfo,
    ) {
        if let Some(hook) = &self.breakpoint {
            hook(frame, error, debug_info);
        }
    }
}

impl std::fmt::Debug for EvalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvalContext")
            .field("max_depth", &self.max_depth)
            .field("interrupted", &self.is_interrupted())
            .field("trace", &self.trace)
            .field("items", &self.registry.len())
            .finish()
    }
}

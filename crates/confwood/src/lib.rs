//! # Confwood
//!
//! A tree-walking interpreter for monitoring configuration expressions.
//!
//! Configuration files are parsed elsewhere into an [`Expr`] tree; confwood
//! evaluates that tree. Evaluating `object` and `template` statements
//! registers [`ConfigItem`]s, evaluating `apply` statements registers
//! [`ApplyRule`]s, and [`ItemRegistry::commit`] turns the registered items
//! into frozen objects.
//!
//! ## Architecture
//!
//! - **Values**: [`Value`] with shared, lockable [`Array`] and
//!   [`Dictionary`] containers
//! - **Locking**: [`AdaptiveMutex`] and the recursive [`ObjectLock`]
//! - **Frames**: [`ScriptFrame`] scope chains and name resolution
//! - **Evaluation**: [`Expr::evaluate`] with `return`/`break`/`continue`
//!   carried in [`ExpressionResult`]
//! - **Apply rules**: [`ApplyRuleIndex`], which indexes rules whose filter
//!   only matches specific host or service names
//!
//! ## Example
//!
//! ```
//! use confwood::{EvalContext, Expr, ScriptFrame, Value};
//! use confwood::expr::BinaryOp;
//!
//! let ctx = EvalContext::new();
//! let mut frame = ScriptFrame::new(&ctx);
//! let sum = Expr::binary(BinaryOp::Add, Expr::literal(40), Expr::literal(2));
//! assert_eq!(sum.evaluate_value(&mut frame).unwrap(), Value::from(42));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod apply;
pub mod container;
pub mod context;
pub mod debug_info;
pub mod environment;
pub mod error;
pub mod eval;
pub mod expr;
pub mod lock;
pub mod registry;
pub mod value;

// Re-export main types
pub use apply::{ApplyRule, ApplyRuleIndex};
pub use container::{Array, Dictionary};
pub use context::EvalContext;
pub use debug_info::DebugInfo;
pub use environment::{ScopeGuard, ScriptFrame};
pub use error::{ContainerError, EvalError, FieldError, Result};
pub use eval::{ControlCode, Evaluate, ExpressionResult, Reference};
pub use expr::Expr;
pub use lock::{AdaptiveMutex, Lockable, ObjectLock};
pub use registry::{CommitReport, ConfigItem, ItemRegistry};
pub use value::{FieldId, Function, FunctionBody, Reflect, Value};

/// Confwood version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

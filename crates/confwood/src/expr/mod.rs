//! Expression tree
//!
//! An external parser builds an [`Expr`] tree once; the evaluator then walks
//! it as often as needed. Every node carries the [`DebugInfo`] of the source
//! text it came from. Nodes are plain data: trees are immutable once built
//! and can be shared across threads (function and rule bodies are held in
//! `Arc`).

mod build;
mod ops;

pub use ops::{BinaryOp, LogicalOp, ScopeSpecifier, SetOp, UnaryOp};

use std::sync::Arc;

use indexmap::IndexMap;

use crate::debug_info::DebugInfo;
use crate::value::Value;

/// Variables evaluated once when a function, rule or object is defined and
/// made visible to its body (`use (a, b = 1)`).
pub type ClosedVars = IndexMap<String, Expr>;

/// A configuration language expression.
#[derive(Debug, Clone)]
pub enum Expr {
    // ═══════════════════════════════════════════════════════════════════
    // Values and operators
    // ═══════════════════════════════════════════════════════════════════
    /// Constant value
    Literal(ExprLiteral),
    /// Name lookup through the scope chain
    Variable(ExprVariable),
    /// Prefix operator
    Unary(ExprUnary),
    /// Strict binary operator
    Binary(ExprBinary),
    /// `&&` / `||`
    Logical(ExprLogical),
    /// `a[b]` and `a.b`
    Indexer(ExprIndexer),
    /// Assignment and compound assignment
    Set(ExprSet),
    /// `[a, b, c]`
    Array(ExprArray),
    /// `{ ... }`
    Dict(ExprDict),

    // ═══════════════════════════════════════════════════════════════════
    // Control flow
    // ═══════════════════════════════════════════════════════════════════
    /// `if (c) { } else { }`
    Conditional(ExprConditional),
    /// `while (c) { }`
    While(ExprWhile),
    /// `for (x in a) { }` / `for (k => v in d) { }`
    For(ExprFor),
    /// `return`
    Return(ExprReturn),
    /// `break`
    Break(ExprBreak),
    /// `continue`
    Continue(ExprContinue),
    /// `try { } except { }`
    TryExcept(ExprTryExcept),
    /// `throw`
    Throw(ExprThrow),

    // ═══════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════
    /// `f(a, b)`
    FunctionCall(ExprCall),
    /// `function name(a, b) use (c) { }`
    Function(ExprFunction),

    // ═══════════════════════════════════════════════════════════════════
    // Configuration statements
    // ═══════════════════════════════════════════════════════════════════
    /// `apply Service "name" to Host assign where ...`
    Apply(ExprApply),
    /// `object Host "name" { }` / `template Host "name" { }`
    Object(ExprObject),
    /// `import "template"`
    Import(ExprImport),
    /// Implicit import of a type's default templates
    ImportDefaultTemplates(ExprImportDefaultTemplates),
    /// `locals`, `this`, `globals`
    GetScope(ExprGetScope),
    /// `using namespace`
    Using(ExprUsing),
    /// `const NAME = value`
    SetConst(ExprSetConst),
    /// `debugger`
    Breakpoint(ExprBreakpoint),
}

// ═══════════════════════════════════════════════════════════════════════
// Node payloads
// ═══════════════════════════════════════════════════════════════════════

/// Constant value
#[derive(Debug, Clone)]
pub struct ExprLiteral {
    /// The value
    pub value: Value,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Name lookup
#[derive(Debug, Clone)]
pub struct ExprVariable {
    /// Variable name
    pub name: String,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Prefix operator
#[derive(Debug, Clone)]
pub struct ExprUnary {
    /// Operator
    pub op: UnaryOp,
    /// Operand
    pub operand: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Strict binary operator
#[derive(Debug, Clone)]
pub struct ExprBinary {
    /// Operator
    pub op: BinaryOp,
    /// Left operand
    pub left: Box<Expr>,
    /// Right operand
    pub right: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Short-circuiting operator
#[derive(Debug, Clone)]
pub struct ExprLogical {
    /// Operator
    pub op: LogicalOp,
    /// Left operand, always evaluated
    pub left: Box<Expr>,
    /// Right operand, evaluated only if the left one does not decide
    pub right: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `base[index]`; `base.name` is an indexer with a string literal index
#[derive(Debug, Clone)]
pub struct ExprIndexer {
    /// Indexed value
    pub base: Box<Expr>,
    /// Key or position
    pub index: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Assignment
#[derive(Debug, Clone)]
pub struct ExprSet {
    /// Variable or indexer being assigned
    pub target: Box<Expr>,
    /// `=`, `+=`, ...
    pub op: SetOp,
    /// Right-hand side
    pub value: Box<Expr>,
    /// Allow writing into frozen containers
    pub override_frozen: bool,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Array literal
#[derive(Debug, Clone)]
pub struct ExprArray {
    /// Element expressions, evaluated left to right
    pub items: Vec<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Braced block
///
/// A non-inline block opens a new scope dictionary and evaluates to it. An
/// inline block runs its statements in the current scope and evaluates to
/// the last statement's value.
#[derive(Debug, Clone)]
pub struct ExprDict {
    /// Statements, evaluated in order
    pub statements: Vec<Expr>,
    /// Run in the current scope instead of a new one
    pub inline: bool,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `if`
#[derive(Debug, Clone)]
pub struct ExprConditional {
    /// Condition
    pub condition: Box<Expr>,
    /// Evaluated when the condition is truthy
    pub then_branch: Box<Expr>,
    /// Evaluated otherwise
    pub else_branch: Option<Box<Expr>>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `while`
#[derive(Debug, Clone)]
pub struct ExprWhile {
    /// Loop condition
    pub condition: Box<Expr>,
    /// Loop body
    pub body: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `for`
#[derive(Debug, Clone)]
pub struct ExprFor {
    /// Element variable (arrays) or key variable (dictionaries)
    pub key_var: String,
    /// Value variable, dictionaries only
    pub value_var: Option<String>,
    /// Iterated value
    pub source: Box<Expr>,
    /// Loop body
    pub body: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `return`
#[derive(Debug, Clone)]
pub struct ExprReturn {
    /// Returned value; Empty when absent
    pub value: Option<Box<Expr>>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `break`
#[derive(Debug, Clone)]
pub struct ExprBreak {
    /// Source location
    pub debug_info: DebugInfo,
}

/// `continue`
#[derive(Debug, Clone)]
pub struct ExprContinue {
    /// Source location
    pub debug_info: DebugInfo,
}

/// `try { body } except { handler }`
#[derive(Debug, Clone)]
pub struct ExprTryExcept {
    /// Protected expression
    pub body: Box<Expr>,
    /// Evaluated if `body` raised an error
    pub handler: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `throw message`
#[derive(Debug, Clone)]
pub struct ExprThrow {
    /// Message expression
    pub message: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Function call
#[derive(Debug, Clone)]
pub struct ExprCall {
    /// Function expression; an indexer binds `this` to its base
    pub callee: Box<Expr>,
    /// Argument expressions, evaluated left to right
    pub args: Vec<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Function definition
#[derive(Debug, Clone)]
pub struct ExprFunction {
    /// Function name (may be empty for anonymous functions)
    pub name: String,
    /// Parameter names
    pub params: Vec<String>,
    /// Variables captured at definition time
    pub closed_vars: ClosedVars,
    /// Function body
    pub body: Arc<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `for` clause of an apply rule
#[derive(Debug, Clone)]
pub struct ApplyFor {
    /// Element or key variable
    pub key_var: String,
    /// Value variable for dictionaries
    pub value_var: Option<String>,
    /// Expression producing the iterated value
    pub source: Arc<Expr>,
}

/// `apply` rule definition
#[derive(Debug, Clone)]
pub struct ExprApply {
    /// Type of the objects the rule creates
    pub source_type: String,
    /// Type of the objects the rule is applied to (empty: the only valid one)
    pub target_type: String,
    /// Name expression
    pub name: Box<Expr>,
    /// `assign where` / `ignore where` filter
    pub filter: Option<Arc<Expr>>,
    /// Optional `for` clause
    pub for_spec: Option<ApplyFor>,
    /// Variables captured at definition time
    pub closed_vars: ClosedVars,
    /// Ignore errors while instantiating objects from this rule
    pub ignore_on_error: bool,
    /// Body evaluated for each created object
    pub body: Arc<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `object` / `template` definition
#[derive(Debug, Clone)]
pub struct ExprObject {
    /// `template` instead of `object`
    pub is_template: bool,
    /// Type name expression
    pub type_name: Box<Expr>,
    /// Name expression
    pub name: Box<Expr>,
    /// Imported automatically into every object of the type
    pub default_template: bool,
    /// Errors during instantiation are ignored
    pub ignore_on_error: bool,
    /// Variables captured at definition time
    pub closed_vars: ClosedVars,
    /// Object body
    pub body: Arc<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `import "name"`
#[derive(Debug, Clone)]
pub struct ExprImport {
    /// Template name expression
    pub name: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// Import of all default templates for the type of `this`
#[derive(Debug, Clone)]
pub struct ExprImportDefaultTemplates {
    /// Source location
    pub debug_info: DebugInfo,
}

/// `locals` / `this` / `globals`
#[derive(Debug, Clone)]
pub struct ExprGetScope {
    /// Which scope
    pub scope: ScopeSpecifier,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `using namespace`
#[derive(Debug, Clone)]
pub struct ExprUsing {
    /// Namespace expression, must evaluate to a dictionary
    pub namespace: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `const NAME = value`
#[derive(Debug, Clone)]
pub struct ExprSetConst {
    /// Constant name
    pub name: String,
    /// Value expression
    pub value: Box<Expr>,
    /// Source location
    pub debug_info: DebugInfo,
}

/// `debugger`
#[derive(Debug, Clone)]
pub struct ExprBreakpoint {
    /// Source location
    pub debug_info: DebugInfo,
}

impl Expr {
    /// Source location of this node.
    pub fn debug_info(&self) -> &DebugInfo {
        match self {
            Expr::Literal(e) => &e.debug_info,
            Expr::Variable(e) => &e.debug_info,
            Expr::Unary(e) => &e.debug_info,
            Expr::Binary(e) => &e.debug_info,
            Expr::Logical(e) => &e.debug_info,
            Expr::Indexer(e) => &e.debug_info,
            Expr::Set(e) => &e.debug_info,
            Expr::Array(e) => &e.debug_info,
            Expr::Dict(e) => &e.debug_info,
            Expr::Conditional(e) => &e.debug_info,
            Expr::While(e) => &e.debug_info,
            Expr::For(e) => &e.debug_info,
            Expr::Return(e) => &e.debug_info,
            Expr::Break(e) => &e.debug_info,
            Expr::Continue(e) => &e.debug_info,
            Expr::TryExcept(e) => &e.debug_info,
            Expr::Throw(e) => &e.debug_info,
            Expr::FunctionCall(e) => &e.debug_info,
            Expr::Function(e) => &e.debug_info,
            Expr::Apply(e) => &e.debug_info,
            Expr::Object(e) => &e.debug_info,
            Expr::Import(e) => &e.debug_info,
            Expr::ImportDefaultTemplates(e) => &e.debug_info,
            Expr::GetScope(e) => &e.debug_info,
            Expr::Using(e) => &e.debug_info,
            Expr::SetConst(e) => &e.debug_info,
            Expr::Breakpoint(e) => &e.debug_info,
        }
    }

    /// Short name of the node kind, used in trace output.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Literal(_) => "Literal",
            Expr::Variable(_) => "Variable",
            Expr::Unary(_) => "Unary",
            Expr::Binary(_) => "Binary",
            Expr::Logical(_) => "Logical",
            Expr::Indexer(_) => "Indexer",
            Expr::Set(_) => "Set",
            Expr::Array(_) => "Array",
            Expr::Dict(_) => "Dict",
            Expr::Conditional(_) => "Conditional",
            Expr::While(_) => "While",
            Expr::For(_) => "For",
            Expr::Return(_) => "Return",
            Expr::Break(_) => "Break",
            Expr::Continue(_) => "Continue",
            Expr::TryExcept(_) => "TryExcept",
            Expr::Throw(_) => "Throw",
            Expr::FunctionCall(_) => "FunctionCall",
            Expr::Function(_) => "Function",
            Expr::Apply(_) => "Apply",
            Expr::Object(_) => "Object",
            Expr::Import(_) => "Import",
            Expr::ImportDefaultTemplates(_) => "ImportDefaultTemplates",
            Expr::GetScope(_) => "GetScope",
            Expr::Using(_) => "Using",
            Expr::SetConst(_) => "SetConst",
            Expr::Breakpoint(_) => "Breakpoint",
        }
    }

    /// Replace the node's source location.
    pub fn at(mut self, debug_info: DebugInfo) -> Self {
        match &mut self {
            Expr::Literal(e) => e.debug_info = debug_info,
            Expr::Variable(e) => e.debug_info = debug_info,
            Expr::Unary(e) => e.debug_info = debug_info,
            Expr::Binary(e) => e.debug_info = debug_info,
            Expr::Logical(e) => e.debug_info = debug_info,
            Expr::Indexer(e) => e.debug_info = debug_info,
            Expr::Set(e) => e.debug_info = debug_info,
            Expr::Array(e) => e.debug_info = debug_info,
            Expr::Dict(e) => e.debug_info = debug_info,
            Expr::Conditional(e) => e.debug_info = debug_info,
            Expr::While(e) => e.debug_info = debug_info,
            Expr::For(e) => e.debug_info = debug_info,
            Expr::Return(e) => e.debug_info = debug_info,
            Expr::Break(e) => e.debug_info = debug_info,
            Expr::Continue(e) => e.debug_info = debug_info,
            Expr::TryExcept(e) => e.debug_info = debug_info,
            Expr::Throw(e) => e.debug_info = debug_info,
            Expr::FunctionCall(e) => e.debug_info = debug_info,
            Expr::Function(e) => e.debug_info = debug_info,
            Expr::Apply(e) => e.debug_info = debug_info,
            Expr::Object(e) => e.debug_info = debug_info,
            Expr::Import(e) => e.debug_info = debug_info,
            Expr::ImportDefaultTemplates(e) => e.debug_info = debug_info,
            Expr::GetScope(e) => e.debug_info = debug_info,
            Expr::Using(e) => e.debug_info = debug_info,
            Expr::SetConst(e) => e.debug_info = debug_info,
            Expr::Breakpoint(e) => e.debug_info = debug_info,
        }
        self
    }
}

//! Constructors used by the parser (and by tests) to build trees
//!
//! Every constructor creates a node with an unknown location; chain
//! [`Expr::at`] to attach one.

use std::sync::Arc;

use super::*;

impl Expr {
    // ═══════════════════════════════════════════════════════════════════
    // Values and operators
    // ═══════════════════════════════════════════════════════════════════

    /// Constant value
    pub fn literal(value: impl Into<Value>) -> Self {
        Expr::Literal(ExprLiteral {
            value: value.into(),
            debug_info: DebugInfo::default(),
        })
    }

    /// The `null` literal
    pub fn empty() -> Self {
        Self::literal(Value::Empty)
    }

    /// Name lookup
    pub fn variable(name: impl Into<String>) -> Self {
        Expr::Variable(ExprVariable {
            name: name.into(),
            debug_info: DebugInfo::default(),
        })
    }

    /// Prefix operator
    pub fn unary(op: UnaryOp, operand: Expr) -> Self {
        Expr::Unary(ExprUnary {
            op,
            operand: Box::new(operand),
            debug_info: DebugInfo::default(),
        })
    }

    /// `!operand`
    pub fn not(operand: Expr) -> Self {
        Self::unary(UnaryOp::Not, operand)
    }

    /// Strict binary operator
    pub fn binary(op: BinaryOp, left: Expr, right: Expr) -> Self {
        Expr::Binary(ExprBinary {
            op,
            left: Box::new(left),
            right: Box::new(right),
            debug_info: DebugInfo::default(),
        })
    }

    /// `left == right`
    pub fn equal(left: Expr, right: Expr) -> Self {
        Self::binary(BinaryOp::Equal, left, right)
    }

    /// Short-circuiting operator
    pub fn logical(op: LogicalOp, left: Expr, right: Expr) -> Self {
        Expr::Logical(ExprLogical {
            op,
            left: Box::new(left),
            right: Box::new(right),
            debug_info: DebugInfo::default(),
        })
    }

    /// `left && right`
    pub fn and(left: Expr, right: Expr) -> Self {
        Self::logical(LogicalOp::And, left, right)
    }

    /// `left || right`
    pub fn or(left: Expr, right: Expr) -> Self {
        Self::logical(LogicalOp::Or, left, right)
    }

    /// `base[index]`
    pub fn index(base: Expr, index: Expr) -> Self {
        Expr::Indexer(ExprIndexer {
            base: Box::new(base),
            index: Box::new(index),
            debug_info: DebugInfo::default(),
        })
    }

    /// `base.field`
    pub fn dot(base: Expr, field: impl Into<String>) -> Self {
        Self::index(base, Self::literal(field.into()))
    }

    /// `target op value`
    pub fn set_op(target: Expr, op: SetOp, value: Expr) -> Self {
        Expr::Set(ExprSet {
            target: Box::new(target),
            op,
            value: Box::new(value),
            override_frozen: false,
            debug_info: DebugInfo::default(),
        })
    }

    /// `target = value`
    pub fn set(target: Expr, value: Expr) -> Self {
        Self::set_op(target, SetOp::Assign, value)
    }

    /// Array literal
    pub fn array(items: Vec<Expr>) -> Self {
        Expr::Array(ExprArray {
            items,
            debug_info: DebugInfo::default(),
        })
    }

    /// Braced block opening a new scope
    pub fn dict(statements: Vec<Expr>) -> Self {
        Expr::Dict(ExprDict {
            statements,
            inline: false,
            debug_info: DebugInfo::default(),
        })
    }

    /// Statement list evaluated in the current scope
    pub fn block(statements: Vec<Expr>) -> Self {
        Expr::Dict(ExprDict {
            statements,
            inline: true,
            debug_info: DebugInfo::default(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Control flow
    // ═══════════════════════════════════════════════════════════════════

    /// `if (condition) then_branch else else_branch`
    pub fn conditional(condition: Expr, then_branch: Expr, else_branch: Option<Expr>) -> Self {
        Expr::Conditional(ExprConditional {
            condition: Box::new(condition),
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
            debug_info: DebugInfo::default(),
        })
    }

    /// `while (condition) body`
    pub fn while_loop(condition: Expr, body: Expr) -> Self {
        Expr::While(ExprWhile {
            condition: Box::new(condition),
            body: Box::new(body),
            debug_info: DebugInfo::default(),
        })
    }

    /// `for (var in source) body`
    pub fn for_each(var: impl Into<String>, source: Expr, body: Expr) -> Self {
        Expr::For(ExprFor {
            key_var: var.into(),
            value_var: None,
            source: Box::new(source),
            body: Box::new(body),
            debug_info: DebugInfo::default(),
        })
    }

    /// `for (key => value in source) body`
    pub fn for_pairs(
        key_var: impl Into<String>,
        value_var: impl Into<String>,
        source: Expr,
        body: Expr,
    ) -> Self {
        Expr::For(ExprFor {
            key_var: key_var.into(),
            value_var: Some(value_var.into()),
            source: Box::new(source),
            body: Box::new(body),
            debug_info: DebugInfo::default(),
        })
    }

    /// `return value`
    pub fn return_value(value: Option<Expr>) -> Self {
        Expr::Return(ExprReturn {
            value: value.map(Box::new),
            debug_info: DebugInfo::default(),
        })
    }

    /// `break`
    pub fn break_loop() -> Self {
        Expr::Break(ExprBreak {
            debug_info: DebugInfo::default(),
        })
    }

    /// `continue`
    pub fn continue_loop() -> Self {
        Expr::Continue(ExprContinue {
            debug_info: DebugInfo::default(),
        })
    }

    /// `try { body } except { handler }`
    pub fn try_except(body: Expr, handler: Expr) -> Self {
        Expr::TryExcept(ExprTryExcept {
            body: Box::new(body),
            handler: Box::new(handler),
            debug_info: DebugInfo::default(),
        })
    }

    /// `throw message`
    pub fn throw(message: Expr) -> Self {
        Expr::Throw(ExprThrow {
            message: Box::new(message),
            debug_info: DebugInfo::default(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Functions
    // ═══════════════════════════════════════════════════════════════════

    /// `callee(args...)`
    pub fn call(callee: Expr, args: Vec<Expr>) -> Self {
        Expr::FunctionCall(ExprCall {
            callee: Box::new(callee),
            args,
            debug_info: DebugInfo::default(),
        })
    }

    /// `base.method(args...)`
    pub fn method_call(base: Expr, method: impl Into<String>, args: Vec<Expr>) -> Self {
        Self::call(Self::dot(base, method), args)
    }

    /// `function name(params) body`
    pub fn function(name: impl Into<String>, params: Vec<&str>, body: Expr) -> Self {
        Self::closure(name, params, ClosedVars::new(), body)
    }

    /// `function name(params) use (closed_vars) body`
    pub fn closure(
        name: impl Into<String>,
        params: Vec<&str>,
        closed_vars: ClosedVars,
        body: Expr,
    ) -> Self {
        Expr::Function(ExprFunction {
            name: name.into(),
            params: params.into_iter().map(String::from).collect(),
            closed_vars,
            body: Arc::new(body),
            debug_info: DebugInfo::default(),
        })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Configuration statements
    // ═══════════════════════════════════════════════════════════════════

    /// `apply source_type name to target_type assign where filter { body }`
    pub fn apply(
        source_type: impl Into<String>,
        target_type: impl Into<String>,
        name: Expr,
        filter: Option<Expr>,
        body: Expr,
    ) -> Self {
        Expr::Apply(ExprApply {
            source_type: source_type.into(),
            target_type: target_type.into(),
            name: Box::new(name),
            filter: filter.map(Arc::new),
            for_spec: None,
            closed_vars: ClosedVars::new(),
            ignore_on_error: false,
            body: Arc::new(body),
            debug_info: DebugInfo::default(),
        })
    }

    /// `object type_name name { body }`
    pub fn object(type_name: impl Into<String>, name: impl Into<String>, body: Expr) -> Self {
        Self::object_like(false, type_name.into(), name.into(), body)
    }

    /// `template type_name name { body }`
    pub fn template(type_name: impl Into<String>, name: impl Into<String>, body: Expr) -> Self {
        Self::object_like(true, type_name.into(), name.into(), body)
    }

    fn object_like(is_template: bool, type_name: String, name: String, body: Expr) -> Self {
        Expr::Object(ExprObject {
            is_template,
            type_name: Box::new(Self::literal(type_name)),
            name: Box::new(Self::literal(name)),
            default_template: false,
            ignore_on_error: false,
            closed_vars: ClosedVars::new(),
            body: Arc::new(body),
            debug_info: DebugInfo::default(),
        })
    }

    /// `import name`
    pub fn import(name: Expr) -> Self {
        Expr::Import(ExprImport {
            name: Box::new(name),
            debug_info: DebugInfo::default(),
        })
    }

    /// Import the default templates for the type of `this`
    pub fn import_default_templates() -> Self {
        Expr::ImportDefaultTemplates(ExprImportDefaultTemplates {
            debug_info: DebugInfo::default(),
        })
    }

    /// `locals`, `this` or `globals`
    pub fn scope(scope: ScopeSpecifier) -> Self {
        Expr::GetScope(ExprGetScope {
            scope,
            debug_info: DebugInfo::default(),
        })
    }

    /// `using namespace`
    pub fn using(namespace: Expr) -> Self {
        Expr::Using(ExprUsing {
            namespace: Box::new(namespace),
            debug_info: DebugInfo::default(),
        })
    }

    /// `const name = value`
    pub fn set_const(name: impl Into<String>, value: Expr) -> Self {
        Expr::SetConst(ExprSetConst {
            name: name.into(),
            value: Box::new(value),
            debug_info: DebugInfo::default(),
        })
    }

    /// `debugger`
    pub fn breakpoint() -> Self {
        Expr::Breakpoint(ExprBreakpoint {
            debug_info: DebugInfo::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_is_indexer_with_literal() {
        let expr = Expr::dot(Expr::variable("host"), "name");
        let Expr::Indexer(indexer) = expr else {
            panic!("expected indexer");
        };
        assert!(matches!(*indexer.base, Expr::Variable(ref v) if v.name == "host"));
        assert!(matches!(*indexer.index, Expr::Literal(ref l) if l.value == Value::from("name")));
    }

    #[test]
    fn test_at_sets_location() {
        let di = DebugInfo::at("x.conf", 4, 2);
        let expr = Expr::literal(1).at(di.clone());
        assert_eq!(expr.debug_info(), &di);
        assert_eq!(expr.kind_name(), "Literal");
    }
}

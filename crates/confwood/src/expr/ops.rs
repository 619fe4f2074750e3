//! Operator enums used by expression nodes

use std::fmt;

/// Prefix operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Minus,
    /// `~x`
    BitNot,
    /// `!x`
    Not,
}

/// Strict binary operators (both operands are always evaluated)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `^`
    Xor,
    /// `&`
    BinaryAnd,
    /// `|`
    BinaryOr,
    /// `<<`
    ShiftLeft,
    /// `>>`
    ShiftRight,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `>`
    GreaterThan,
    /// `<=`
    LessThanOrEqual,
    /// `>=`
    GreaterThanOrEqual,
    /// `in`
    In,
    /// `!in`
    NotIn,
}

impl BinaryOp {
    /// Source spelling of the operator.
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Xor => "^",
            BinaryOp::BinaryAnd => "&",
            BinaryOp::BinaryOr => "|",
            BinaryOp::ShiftLeft => "<<",
            BinaryOp::ShiftRight => ">>",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::LessThan => "<",
            BinaryOp::GreaterThan => ">",
            BinaryOp::LessThanOrEqual => "<=",
            BinaryOp::GreaterThanOrEqual => ">=",
            BinaryOp::In => "in",
            BinaryOp::NotIn => "!in",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Short-circuiting operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOp {
    /// `&&`
    And,
    /// `||`
    Or,
}

/// Assignment operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOp {
    /// `=`
    Assign,
    /// `+=`
    Add,
    /// `-=`
    Subtract,
    /// `*=`
    Multiply,
    /// `/=`
    Divide,
    /// `%=`
    Modulo,
    /// `^=`
    Xor,
    /// `&=`
    BinaryAnd,
    /// `|=`
    BinaryOr,
}

impl SetOp {
    /// The binary operator a compound assignment applies, if any.
    pub fn binary_op(&self) -> Option<BinaryOp> {
        match self {
            SetOp::Assign => None,
            SetOp::Add => Some(BinaryOp::Add),
            SetOp::Subtract => Some(BinaryOp::Subtract),
            SetOp::Multiply => Some(BinaryOp::Multiply),
            SetOp::Divide => Some(BinaryOp::Divide),
            SetOp::Modulo => Some(BinaryOp::Modulo),
            SetOp::Xor => Some(BinaryOp::Xor),
            SetOp::BinaryAnd => Some(BinaryOp::BinaryAnd),
            SetOp::BinaryOr => Some(BinaryOp::BinaryOr),
        }
    }
}

/// Which scope a `GetScope` node yields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeSpecifier {
    /// `locals`
    Local,
    /// `this`
    This,
    /// `globals`
    Global,
}

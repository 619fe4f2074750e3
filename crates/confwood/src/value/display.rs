//! Display and Debug implementations for Value

use std::cell::RefCell;
use std::fmt;

use super::*;

thread_local! {
    static IN_PROGRESS: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a container as being formatted on the current thread.
///
/// `enter` returns `None` when the container is already being formatted
/// further up the stack, i.e. it contains itself.
pub(crate) struct CycleGuard(usize);

impl CycleGuard {
    pub(crate) fn enter<T>(container: &T) -> Option<Self> {
        let addr = container as *const T as usize;
        IN_PROGRESS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.contains(&addr) {
                return None;
            }
            stack.push(addr);
            Some(CycleGuard(addr))
        })
    }
}

impl Drop for CycleGuard {
    fn drop(&mut self) {
        IN_PROGRESS.with(|stack| {
            let mut stack = stack.borrow_mut();
            if let Some(pos) = stack.iter().rposition(|addr| *addr == self.0) {
                stack.remove(pos);
            }
        });
    }
}

/// Integral numbers print without a fraction.
fn format_number(f: &mut fmt::Formatter<'_>, n: f64) -> fmt::Result {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        write!(f, "{}", n as i64)
    } else {
        write!(f, "{}", n)
    }
}

impl fmt::Display for Value {
    /// String conversion used by concatenation, `string()` and log output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => format_number(f, *n),
            Value::String(s) => write!(f, "{}", s),
            Value::Array(_) | Value::Dictionary(_) => match self.to_json_string() {
                Ok(json) => write!(f, "{}", json),
                Err(_) => write!(f, "Object of type '{}'", self.type_name()),
            },
            Value::Function(func) => write!(f, "Object of type 'Function' ({})", func.name),
            Value::Object(obj) => write!(f, "{}", obj.display_name()),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => write!(f, "Empty"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => format_number(f, *n),
            Value::String(s) => write!(f, "{:?}", s.as_str()),
            Value::Array(a) => write!(f, "{:?}", a),
            Value::Dictionary(d) => write!(f, "{:?}", d),
            Value::Function(func) => write!(f, "{:?}", func),
            Value::Object(obj) => write!(f, "<{}>", obj.display_name()),
        }
    }
}

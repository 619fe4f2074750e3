//! Filter shape recognition for the targeted rule index
//!
//! Recognizes filters that can only ever match objects with specific
//! names, so the rule can be looked up by name instead of evaluated
//! against every candidate:
//!
//! ```text
//! host.name == "H" [|| host.name == "h" ...]                           (to Host)
//! host.name == "H" && service.name == "S" [|| ... && ... ]             (to Service)
//! ```
//!
//! Operand order of `||`, `&&` and `==` does not matter. A name is either a
//! string literal or a variable the caller resolves to a constant string.
//! The recognizer only inspects node kinds; it never evaluates anything.

use crate::expr::{BinaryOp, Expr, LogicalOp};

/// Resolves a variable used as a target name. Only names that can never
/// change between indexing and filter evaluation may resolve.
pub(crate) type ConstantNames<'a> = &'a dyn Fn(&str) -> Option<String>;

/// Host names of a `host.name == "H" || ...` filter.
///
/// Returns `None` unless every OR-ed clause is such an equality.
pub(crate) fn target_hosts(filter: &Expr, constants: ConstantNames<'_>) -> Option<Vec<String>> {
    let mut hosts = Vec::new();
    collect_hosts(filter, constants, &mut hosts).then_some(hosts)
}

fn collect_hosts(filter: &Expr, constants: ConstantNames<'_>, hosts: &mut Vec<String>) -> bool {
    if let Some((left, right)) = logical(filter, LogicalOp::Or) {
        return collect_hosts(left, constants, hosts) && collect_hosts(right, constants, hosts);
    }

    match compared_name(filter, "host", constants) {
        Some(host) => {
            hosts.push(host);
            true
        }
        None => false,
    }
}

/// `(host, service)` pairs of a `host.name == "H" && service.name == "S"
/// || ...` filter.
///
/// Returns `None` unless every OR-ed clause is such a conjunction.
pub(crate) fn target_services(
    filter: &Expr,
    constants: ConstantNames<'_>,
) -> Option<Vec<(String, String)>> {
    let mut services = Vec::new();
    collect_services(filter, constants, &mut services).then_some(services)
}

fn collect_services(
    filter: &Expr,
    constants: ConstantNames<'_>,
    services: &mut Vec<(String, String)>,
) -> bool {
    if let Some((left, right)) = logical(filter, LogicalOp::Or) {
        return collect_services(left, constants, services)
            && collect_services(right, constants, services);
    }

    match target_service(filter, constants) {
        Some(pair) => {
            services.push(pair);
            true
        }
        None => false,
    }
}

/// `host.name == "H" && service.name == "S"`, conjuncts in either order.
fn target_service(filter: &Expr, constants: ConstantNames<'_>) -> Option<(String, String)> {
    let (mut first, mut second) = logical(filter, LogicalOp::And)?;

    let host = match compared_name(first, "host", constants) {
        Some(host) => host,
        None => {
            std::mem::swap(&mut first, &mut second);
            compared_name(first, "host", constants)?
        }
    };

    let service = compared_name(second, "service", constants)?;
    Some((host, service))
}

/// `var.name == N` or `N == var.name`.
fn compared_name(expr: &Expr, var: &str, constants: ConstantNames<'_>) -> Option<String> {
    let Expr::Binary(binary) = expr else {
        return None;
    };
    if binary.op != BinaryOp::Equal {
        return None;
    }

    if is_name_indexer(&binary.left, var) {
        return target_name(&binary.right, constants);
    }
    if is_name_indexer(&binary.right, var) {
        return target_name(&binary.left, constants);
    }
    None
}

/// `var.name` / `var["name"]`
fn is_name_indexer(expr: &Expr, var: &str) -> bool {
    let Expr::Indexer(indexer) = expr else {
        return false;
    };
    matches!(indexer.base.as_ref(), Expr::Variable(v) if v.name == var)
        && literal_string(&indexer.index) == Some("name")
}

fn target_name(expr: &Expr, constants: ConstantNames<'_>) -> Option<String> {
    match expr {
        Expr::Variable(var) => constants(&var.name),
        other => literal_string(other).map(str::to_string),
    }
}

fn literal_string(expr: &Expr) -> Option<&str> {
    match expr {
        Expr::Literal(lit) => lit.value.as_str(),
        _ => None,
    }
}

fn logical(expr: &Expr, op: LogicalOp) -> Option<(&Expr, &Expr)> {
    match expr {
        Expr::Logical(logical) if logical.op == op => {
            Some((logical.left.as_ref(), logical.right.as_ref()))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn name_of(var: &str) -> Expr {
        Expr::dot(Expr::variable(var), "name")
    }

    fn host_is(name: &str) -> Expr {
        Expr::equal(name_of("host"), Expr::literal(name))
    }

    fn service_is(name: &str) -> Expr {
        Expr::equal(name_of("service"), Expr::literal(name))
    }

    fn no_constants(_: &str) -> Option<String> {
        None
    }

    fn hosts(filter: &Expr) -> Option<Vec<String>> {
        target_hosts(filter, &no_constants)
    }

    fn services(filter: &Expr) -> Option<Vec<(String, String)>> {
        target_services(filter, &no_constants)
    }

    fn owned(names: &[&str]) -> Option<Vec<String>> {
        Some(names.iter().map(|n| n.to_string()).collect())
    }

    #[test]
    fn test_single_host() {
        assert_eq!(hosts(&host_is("web1")), owned(&["web1"]));
    }

    #[test]
    fn test_reversed_operands() {
        let filter = Expr::equal(Expr::literal("web1"), name_of("host"));
        assert_eq!(hosts(&filter), owned(&["web1"]));
    }

    #[test]
    fn test_or_chain_keeps_order() {
        let filter = Expr::or(Expr::or(host_is("a"), host_is("b")), host_is("c"));
        assert_eq!(hosts(&filter), owned(&["a", "b", "c"]));
    }

    #[test]
    fn test_any_foreign_clause_rejects_chain() {
        let filter = Expr::or(host_is("a"), Expr::literal(true));
        assert_eq!(hosts(&filter), None);

        let not_equal = Expr::binary(BinaryOp::NotEqual, name_of("host"), Expr::literal("a"));
        assert_eq!(hosts(&not_equal), None);

        let other_field = Expr::equal(
            Expr::dot(Expr::variable("host"), "address"),
            Expr::literal("a"),
        );
        assert_eq!(hosts(&other_field), None);

        let non_string = Expr::equal(name_of("host"), Expr::literal(1));
        assert_eq!(hosts(&non_string), None);

        let computed = Expr::equal(name_of("host"), Expr::variable("h"));
        assert_eq!(hosts(&computed), None);
    }

    #[test]
    fn test_service_pairs_either_order() {
        let filter = Expr::or(
            Expr::and(host_is("web1"), service_is("http")),
            Expr::and(service_is("ssh"), host_is("web2")),
        );
        assert_eq!(
            services(&filter),
            Some(vec![
                ("web1".to_string(), "http".to_string()),
                ("web2".to_string(), "ssh".to_string())
            ])
        );
    }

    #[test]
    fn test_service_needs_both_names() {
        assert_eq!(services(&host_is("web1")), None);
        let two_hosts = Expr::and(host_is("web1"), host_is("web2"));
        assert_eq!(services(&two_hosts), None);
    }

    #[test]
    fn test_constant_names() {
        let constants = |name: &str| (name == "PrimaryHost").then(|| "web1".to_string());
        let filter = Expr::or(
            Expr::equal(name_of("host"), Expr::variable("PrimaryHost")),
            host_is("web2"),
        );
        assert_eq!(target_hosts(&filter, &constants), owned(&["web1", "web2"]));

        let unknown = Expr::equal(name_of("host"), Expr::variable("Other"));
        assert_eq!(target_hosts(&unknown, &constants), None);
    }

    #[test]
    fn test_and_is_not_a_host_filter() {
        let filter = Expr::and(host_is("web1"), host_is("web1"));
        assert_eq!(hosts(&filter), None);
    }
}

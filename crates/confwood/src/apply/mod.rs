//! Apply rules and the targeted rule index
//!
//! An `apply` statement does not create objects itself; it registers an
//! [`ApplyRule`] that a driver later instantiates once per matching target
//! object. Matching means evaluating the rule's filter against every
//! candidate, which is the expensive part of a configuration load.
//!
//! [`ApplyRuleIndex`] avoids most of that work. When a rule's filter can
//! only match objects with specific names, the rule is additionally filed
//! under those names and the driver looks it up by name instead of
//! evaluating it. Rules with any other filter shape stay in the
//! per-target-type "regular" list and are evaluated as before.

mod targeted;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::container::Dictionary;
use crate::context::EvalContext;
use crate::debug_info::DebugInfo;
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{ApplyFor, Expr};
use crate::value::Value;

// ═══════════════════════════════════════════════════════════════════════
// Apply Rule
// ═══════════════════════════════════════════════════════════════════════

/// One `apply` statement.
///
/// Immutable once registered, except for the "has matched" flag used for
/// dead-rule diagnostics.
#[derive(Debug)]
pub struct ApplyRule {
    /// Type of the objects the rule creates
    pub source_type: String,
    /// Type of the objects the rule is applied to
    pub target_type: String,
    /// Rule name; also the name of the created objects
    pub name: String,
    /// Body evaluated for every created object
    pub body: Arc<Expr>,
    /// `assign where` filter; `None` matches every candidate
    pub filter: Option<Arc<Expr>>,
    /// Optional `for` clause
    pub for_spec: Option<ApplyFor>,
    /// Errors while instantiating objects from this rule are ignored
    pub ignore_on_error: bool,
    /// Where the rule was defined
    pub debug_info: DebugInfo,
    /// Variables captured at definition time
    pub scope: Option<Arc<Dictionary>>,
    has_matches: AtomicBool,
}

impl ApplyRule {
    /// Create a rule without filter, `for` clause or captured scope.
    pub fn new(
        source_type: impl Into<String>,
        target_type: impl Into<String>,
        name: impl Into<String>,
        body: Arc<Expr>,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            target_type: target_type.into(),
            name: name.into(),
            body,
            filter: None,
            for_spec: None,
            ignore_on_error: false,
            debug_info: DebugInfo::default(),
            scope: None,
            has_matches: AtomicBool::new(false),
        }
    }

    /// Set the `assign where` filter.
    pub fn with_filter(mut self, filter: Option<Arc<Expr>>) -> Self {
        self.filter = filter;
        self
    }

    /// Set the `for` clause.
    pub fn with_for(mut self, for_spec: Option<ApplyFor>) -> Self {
        self.for_spec = for_spec;
        self
    }

    /// Set the captured scope.
    pub fn with_scope(mut self, scope: Option<Arc<Dictionary>>) -> Self {
        self.scope = scope;
        self
    }

    /// Mark instantiation errors as ignorable.
    pub fn with_ignore_on_error(mut self, ignore_on_error: bool) -> Self {
        self.ignore_on_error = ignore_on_error;
        self
    }

    /// Set the definition location.
    pub fn at(mut self, debug_info: DebugInfo) -> Self {
        self.debug_info = debug_info;
        self
    }

    /// Evaluate the filter for one candidate.
    ///
    /// `bindings` name the candidate objects (`host`, `service`, ...). They
    /// are visible on top of the rule's captured scope. The filter runs
    /// sandboxed: it may read anything but change nothing. A rule without a
    /// filter matches.
    ///
    /// # Errors
    ///
    /// Whatever the filter raises, including `SandboxViolation` for filters
    /// that try to assign or call functions with side effects.
    pub fn evaluate_filter(
        &self,
        ctx: &EvalContext,
        bindings: &[(&str, Value)],
    ) -> Result<bool, EvalError> {
        let Some(filter) = &self.filter else {
            return Ok(true);
        };

        let locals = match &self.scope {
            Some(scope) => Dictionary::child_of(scope),
            None => Arc::new(Dictionary::new()),
        };
        for (name, value) in bindings {
            locals.set(*name, value.clone())?;
        }

        let mut frame = ScriptFrame::new(ctx).with_locals(locals).with_sandbox(true);
        Ok(filter.evaluate_value(&mut frame)?.to_bool())
    }

    /// Record that the rule created at least one object.
    pub fn add_match(&self) {
        self.has_matches.store(true, Ordering::Relaxed);
    }

    /// True once [`add_match`](Self::add_match) was called.
    pub fn has_matches(&self) -> bool {
        self.has_matches.load(Ordering::Relaxed)
    }
}

// ═══════════════════════════════════════════════════════════════════════
// Rule Index
// ═══════════════════════════════════════════════════════════════════════

type Rules = Vec<Arc<ApplyRule>>;

#[derive(Debug, Default)]
struct PerHost {
    for_host: Rules,
    for_services: HashMap<String, Rules>,
}

#[derive(Debug, Default)]
struct PerSourceType {
    all: Rules,
    regular: HashMap<String, Rules>,
    targeted: HashMap<String, PerHost>,
}

/// All registered apply rules, indexed by source type, target type and,
/// where the filter allows it, by target name.
#[derive(Debug, Default)]
pub struct ApplyRuleIndex {
    types: IndexMap<String, Vec<String>>,
    rules: HashMap<String, PerSourceType>,
}

impl ApplyRuleIndex {
    /// Create an index with no valid types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an index with the stock monitoring types registered.
    pub fn with_default_types() -> Self {
        let mut index = Self::new();
        index.register_type("Service", &["Host"]);
        index.register_type("Dependency", &["Host", "Service"]);
        index.register_type("Notification", &["Host", "Service"]);
        index.register_type("ScheduledDowntime", &["Host", "Service"]);
        index
    }

    // ═══════════════════════════════════════════════════════════════════
    // Types
    // ═══════════════════════════════════════════════════════════════════

    /// Allow rules creating `source` objects for the given target types.
    pub fn register_type(&mut self, source: &str, targets: &[&str]) {
        self.types.insert(
            source.to_string(),
            targets.iter().map(|t| t.to_string()).collect(),
        );
    }

    /// True if `source` was registered.
    pub fn is_valid_source_type(&self, source: &str) -> bool {
        self.types.contains_key(source)
    }

    /// True if `target` is a registered target of `source`. An empty target
    /// is valid when `source` has exactly one target type.
    pub fn is_valid_target_type(&self, source: &str, target: &str) -> bool {
        let targets = self.target_types(source);
        if target.is_empty() {
            return targets.len() == 1;
        }
        targets.iter().any(|t| t == target)
    }

    /// Target types registered for `source`.
    pub fn target_types(&self, source: &str) -> &[String] {
        self.types.get(source).map(Vec::as_slice).unwrap_or_default()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Registration
    // ═══════════════════════════════════════════════════════════════════

    /// Store a rule.
    ///
    /// An empty target type is replaced by the source's only target type.
    /// Returns `true` if the rule went into the targeted index and `false`
    /// if it is a regular rule.
    pub fn add_rule(&mut self, rule: ApplyRule) -> bool {
        self.add_rule_with_constants(rule, &|_| None)
    }

    /// Store a rule, resolving variables compared against `host.name` or
    /// `service.name` through `constants`.
    ///
    /// A variable is only resolved when neither the candidate bindings
    /// (`host`, `service`) nor the rule's captured scope can shadow it.
    pub fn add_rule_with_constants(
        &mut self,
        mut rule: ApplyRule,
        constants: &dyn Fn(&str) -> Option<String>,
    ) -> bool {
        if rule.target_type.is_empty() {
            if let [only] = self.target_types(&rule.source_type) {
                rule.target_type = only.clone();
            }
        }

        let rule = Arc::new(rule);
        let per_source = self.rules.entry(rule.source_type.clone()).or_default();
        per_source.all.push(Arc::clone(&rule));

        let scope = rule.scope.clone();
        let unshadowed = |name: &str| {
            let shadowed = CANDIDATE_BINDINGS.iter().any(|binding| *binding == name)
                || scope.as_ref().is_some_and(|scope| scope.contains(name));
            if shadowed {
                None
            } else {
                constants(name)
            }
        };
        let targeted = add_targeted_rule(&rule, per_source, &unshadowed);
        if !targeted {
            per_source
                .regular
                .entry(rule.target_type.clone())
                .or_default()
                .push(Arc::clone(&rule));
        }

        debug!(
            source = %rule.source_type,
            target = %rule.target_type,
            name = %rule.name,
            targeted,
            "registered apply rule"
        );
        targeted
    }

    /// Drop every rule. Registered types are kept.
    pub fn clear(&mut self) {
        self.rules.clear();
    }

    // ═══════════════════════════════════════════════════════════════════
    // Queries
    // ═══════════════════════════════════════════════════════════════════

    /// Every rule creating `source` objects, in definition order.
    pub fn rules_for(&self, source: &str) -> &[Arc<ApplyRule>] {
        self.rules
            .get(source)
            .map(|per_source| per_source.all.as_slice())
            .unwrap_or_default()
    }

    /// Rules for `source` → `target` whose filter must be evaluated per
    /// candidate.
    pub fn regular_rules(&self, source: &str, target: &str) -> &[Arc<ApplyRule>] {
        self.rules
            .get(source)
            .and_then(|per_source| per_source.regular.get(target))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Host-targeted rules for `source` that match the host named `host`.
    pub fn targeted_host_rules(&self, source: &str, host: &str) -> &[Arc<ApplyRule>] {
        self.rules
            .get(source)
            .and_then(|per_source| per_source.targeted.get(host))
            .map(|per_host| per_host.for_host.as_slice())
            .unwrap_or_default()
    }

    /// Service-targeted rules for `source` that match service `service` on
    /// host `host`.
    pub fn targeted_service_rules(
        &self,
        source: &str,
        host: &str,
        service: &str,
    ) -> &[Arc<ApplyRule>] {
        self.rules
            .get(source)
            .and_then(|per_source| per_source.targeted.get(host))
            .and_then(|per_host| per_host.for_services.get(service))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of stored rules.
    pub fn len(&self) -> usize {
        self.rules.values().map(|per_source| per_source.all.len()).sum()
    }

    /// True if no rule is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Log a warning for every rule that never matched and return them.
    pub fn check_matches(&self) -> Vec<Arc<ApplyRule>> {
        let mut unmatched = Vec::new();
        for per_source in self.rules.values() {
            for rule in per_source.all.iter().filter(|rule| !rule.has_matches()) {
                warn!(
                    "Apply rule '{}' ({}) for type '{}' does not match anywhere!",
                    rule.name, rule.debug_info, rule.source_type
                );
                unmatched.push(Arc::clone(rule));
            }
        }
        unmatched
    }
}

/// Names the driver binds candidates to when evaluating filters.
const CANDIDATE_BINDINGS: [&str; 2] = ["host", "service"];

/// File `rule` under the names its filter targets, if it targets any.
fn add_targeted_rule(
    rule: &Arc<ApplyRule>,
    per_source: &mut PerSourceType,
    constants: targeted::ConstantNames<'_>,
) -> bool {
    let Some(filter) = rule.filter.as_deref() else {
        return false;
    };

    match rule.target_type.as_str() {
        "Host" => {
            let Some(hosts) = targeted::target_hosts(filter, constants) else {
                return false;
            };
            for host in dedup(hosts) {
                per_source
                    .targeted
                    .entry(host)
                    .or_default()
                    .for_host
                    .push(Arc::clone(rule));
            }
            true
        }
        "Service" => {
            let Some(services) = targeted::target_services(filter, constants) else {
                return false;
            };
            for (host, service) in dedup(services) {
                per_source
                    .targeted
                    .entry(host)
                    .or_default()
                    .for_services
                    .entry(service)
                    .or_default()
                    .push(Arc::clone(rule));
            }
            true
        }
        _ => false,
    }
}

fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut unique = Vec::with_capacity(items.len());
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}

//! Registry of declared configuration items
//!
//! `object` and `template` statements do not build anything when they are
//! evaluated; they register a [`ConfigItem`] holding the body and the
//! captured scope. [`ItemRegistry::commit`] later instantiates every
//! concrete item into a frozen dictionary. Templates stay in the registry
//! so `import` can find them by type and name.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::container::Dictionary;
use crate::context::EvalContext;
use crate::debug_info::DebugInfo;
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::eval::item::import_default_templates;
use crate::expr::Expr;
use crate::value::Value;

/// A declared `object` or `template`.
#[derive(Debug, Clone)]
pub struct ConfigItem {
    /// Type name, e.g. `Host`
    pub type_name: String,
    /// Item name, unique per type
    pub name: String,
    /// `template` rather than `object`; never instantiated
    pub is_abstract: bool,
    /// Imported automatically into every object of the type
    pub default_template: bool,
    /// Instantiation errors are logged and the item skipped
    pub ignore_on_error: bool,
    /// Object body, evaluated with the new object as `this`
    pub body: Arc<Expr>,
    /// Captured `use (...)` variables
    pub scope: Option<Arc<Dictionary>>,
    /// Source location of the declaration
    pub debug_info: DebugInfo,
}

impl ConfigItem {
    /// Build the object this item describes.
    ///
    /// The object starts with `type` and `name` set. Default templates of
    /// the type are imported before the body runs. The result is frozen.
    pub fn instantiate(&self, ctx: &EvalContext) -> Result<Arc<Dictionary>, EvalError> {
        let object = Arc::new(Dictionary::new());
        object.set("type", Value::from(self.type_name.as_str()))?;
        object.set("name", Value::from(self.name.as_str()))?;

        let locals = match &self.scope {
            Some(scope) => Arc::new(scope.shallow_clone()),
            None => Arc::new(Dictionary::new()),
        };
        let mut frame = ScriptFrame::new(ctx)
            .with_locals(locals)
            .with_this(Value::Dictionary(Arc::clone(&object)));

        if !self.is_abstract {
            import_default_templates(&mut frame).map_err(|err| self.locate(err))?;
        }
        self.body.evaluate(&mut frame).map_err(|err| self.locate(err))?;

        object.freeze();
        Ok(object)
    }

    fn locate(&self, err: EvalError) -> EvalError {
        if err.location().is_some() || self.debug_info.is_unknown() {
            return err;
        }
        err.with_location(&self.debug_info)
    }
}

/// Outcome of [`ItemRegistry::commit`].
#[derive(Debug, Default)]
pub struct CommitReport {
    /// Successfully built objects, in declaration order
    pub objects: Vec<(Arc<ConfigItem>, Arc<Dictionary>)>,
    /// Instantiation failures of items without `ignore_on_error`
    pub errors: Vec<EvalError>,
    /// Failed items that were skipped because of `ignore_on_error`
    pub ignored: Vec<Arc<ConfigItem>>,
}

impl CommitReport {
    /// Whether every item was instantiated or deliberately skipped.
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Find a committed object by type and name.
    pub fn object(&self, type_name: &str, name: &str) -> Option<&Arc<Dictionary>> {
        self.objects
            .iter()
            .find(|(item, _)| item.type_name == type_name && item.name == name)
            .map(|(_, object)| object)
    }
}

/// Concurrent store of declared items, keyed by `(type, name)`.
#[derive(Debug, Default)]
pub struct ItemRegistry {
    items: DashMap<(String, String), Arc<ConfigItem>>,
    order: Mutex<Vec<Arc<ConfigItem>>>,
}

impl ItemRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an item. Fails if one with the same type and name exists.
    pub fn register(&self, item: ConfigItem) -> Result<Arc<ConfigItem>, EvalError> {
        let key = (item.type_name.clone(), item.name.clone());
        match self.items.entry(key) {
            Entry::Occupied(existing) => {
                let err = EvalError::DuplicateObject {
                    type_name: item.type_name,
                    name: item.name,
                    location: None,
                };
                let first = &existing.get().debug_info;
                if !first.is_unknown() {
                    debug!(first = %first, "duplicate item declaration");
                }
                if item.debug_info.is_unknown() {
                    Err(err)
                } else {
                    Err(err.with_location(&item.debug_info))
                }
            }
            Entry::Vacant(slot) => {
                let item = Arc::new(item);
                slot.insert(Arc::clone(&item));
                self.order.lock().push(Arc::clone(&item));
                debug!(
                    type_name = %item.type_name,
                    name = %item.name,
                    is_abstract = item.is_abstract,
                    "registered item"
                );
                Ok(item)
            }
        }
    }

    /// Look up an item by type and name.
    pub fn lookup(&self, type_name: &str, name: &str) -> Option<Arc<ConfigItem>> {
        self.items
            .get(&(type_name.to_string(), name.to_string()))
            .map(|item| Arc::clone(item.value()))
    }

    /// Items of one type, in registration order.
    pub fn items_of_type(&self, type_name: &str) -> Vec<Arc<ConfigItem>> {
        self.order
            .lock()
            .iter()
            .filter(|item| item.type_name == type_name)
            .cloned()
            .collect()
    }

    /// Default templates of a type, sorted by name.
    pub fn default_templates(&self, type_name: &str) -> Vec<Arc<ConfigItem>> {
        let mut templates: Vec<_> = self
            .items_of_type(type_name)
            .into_iter()
            .filter(|item| item.is_abstract && item.default_template)
            .collect();
        templates.sort_by(|a, b| a.name.cmp(&b.name));
        templates
    }

    /// Number of registered items, templates included.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Forget every item.
    pub fn clear(&self) {
        self.items.clear();
        self.order.lock().clear();
    }

    /// Instantiate every concrete item.
    ///
    /// Failures do not stop the commit. Items declared with
    /// `ignore_on_error` are skipped quietly; other failures are collected
    /// in the report.
    #[tracing::instrument(level = "debug", skip_all, fields(count = self.len()))]
    pub fn commit(&self, ctx: &EvalContext) -> CommitReport {
        let items: Vec<_> = self.order.lock().clone();
        let mut report = CommitReport::default();

        for item in items.into_iter().filter(|item| !item.is_abstract) {
            match item.instantiate(ctx) {
                Ok(object) => report.objects.push((item, object)),
                Err(EvalError::Interrupted) => {
                    report.errors.push(EvalError::Interrupted);
                    break;
                }
                Err(err) if item.ignore_on_error => {
                    debug!(
                        type_name = %item.type_name,
                        name = %item.name,
                        error = %err.diagnostic(),
                        "ignoring item that failed to build"
                    );
                    report.ignored.push(item);
                }
                Err(err) => {
                    warn!(
                        "Object '{}' of type '{}' could not be built: {}",
                        item.name,
                        item.type_name,
                        err.diagnostic()
                    );
                    report.errors.push(err);
                }
            }
        }

        debug!(
            objects = report.objects.len(),
            errors = report.errors.len(),
            ignored = report.ignored.len(),
            "commit finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn item(type_name: &str, name: &str, body: Expr) -> ConfigItem {
        ConfigItem {
            type_name: type_name.to_string(),
            name: name.to_string(),
            is_abstract: false,
            default_template: false,
            ignore_on_error: false,
            body: Arc::new(body),
            scope: None,
            debug_info: DebugInfo::default(),
        }
    }

    fn set(name: &str, value: impl Into<Value>) -> Expr {
        Expr::set(Expr::variable(name), Expr::literal(value))
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ItemRegistry::new();
        registry.register(item("Host", "web1", Expr::empty())).unwrap();
        registry.register(item("Service", "web1", Expr::empty())).unwrap();

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("Host", "web1").is_some());
        assert!(registry.lookup("Host", "web2").is_none());
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let registry = ItemRegistry::new();
        registry.register(item("Host", "web1", set("a", 1))).unwrap();

        let mut dup = item("Host", "web1", Expr::empty());
        dup.debug_info = DebugInfo::at("hosts.conf", 7, 1);
        let err = registry.register(dup).unwrap_err();
        assert_eq!(
            err.to_string(),
            "An object with type 'Host' and name 'web1' already exists"
        );
        assert_eq!(err.location(), Some(&DebugInfo::at("hosts.conf", 7, 1)));

        let kept = registry.lookup("Host", "web1").unwrap();
        assert!(matches!(kept.body.as_ref(), Expr::Set(_)));
        assert_eq!(registry.items_of_type("Host").len(), 1);
    }

    #[test]
    fn test_default_templates_sorted() {
        let registry = ItemRegistry::new();
        for name in ["zz", "aa", "mm"] {
            let mut template = item("Host", name, Expr::empty());
            template.is_abstract = true;
            template.default_template = name != "mm";
            registry.register(template).unwrap();
        }
        registry.register(item("Host", "bb", Expr::empty())).unwrap();

        let names: Vec<_> = registry
            .default_templates("Host")
            .iter()
            .map(|t| t.name.clone())
            .collect();
        assert_eq!(names, vec!["aa", "zz"]);
    }

    #[test]
    fn test_instantiate_sets_identity_and_freezes() {
        let ctx = EvalContext::new();
        let web1 = item("Host", "web1", Expr::block(vec![set("address", "10.0.0.1")]));
        let object = web1.instantiate(&ctx).unwrap();

        assert_eq!(object.get("type"), Some(Value::from("Host")));
        assert_eq!(object.get("name"), Some(Value::from("web1")));
        assert_eq!(object.get("address"), Some(Value::from("10.0.0.1")));
        assert!(object.is_frozen());
    }

    #[test]
    fn test_instantiate_sees_captured_scope() {
        let ctx = EvalContext::new();
        let scope = Dictionary::new();
        scope.set("zone", Value::from("dmz")).unwrap();

        let mut web1 = item(
            "Host",
            "web1",
            Expr::set(Expr::variable("zone_name"), Expr::variable("zone")),
        );
        web1.scope = Some(Arc::new(scope));
        let object = web1.instantiate(&ctx).unwrap();
        assert_eq!(object.get("zone_name"), Some(Value::from("dmz")));
        assert!(object.get("zone").is_none());
    }

    #[test]
    fn test_commit_applies_default_templates() {
        let ctx = EvalContext::new();
        let registry = ctx.registry();

        let mut defaults = item("Host", "defaults", set("check_interval", 60));
        defaults.is_abstract = true;
        defaults.default_template = true;
        registry.register(defaults).unwrap();
        registry
            .register(item("Host", "web1", set("check_interval", 30)))
            .unwrap();
        registry.register(item("Host", "web2", Expr::empty())).unwrap();

        let report = registry.commit(&ctx);
        assert!(report.is_ok());
        assert_eq!(report.objects.len(), 2);
        assert_eq!(
            report.object("Host", "web1").unwrap().get("check_interval"),
            Some(Value::from(30))
        );
        assert_eq!(
            report.object("Host", "web2").unwrap().get("check_interval"),
            Some(Value::from(60))
        );
        assert!(report.object("Host", "defaults").is_none());
    }

    #[test]
    fn test_commit_collects_and_ignores_errors() {
        let ctx = EvalContext::new();
        let registry = ctx.registry();

        let failing = || Expr::throw(Expr::literal("broken"));
        registry.register(item("Host", "bad", failing())).unwrap();
        let mut tolerated = item("Host", "tolerated", failing());
        tolerated.ignore_on_error = true;
        registry.register(tolerated).unwrap();
        registry.register(item("Host", "good", Expr::empty())).unwrap();

        let report = registry.commit(&ctx);
        assert!(!report.is_ok());
        assert_eq!(report.errors, vec![EvalError::script("broken")]);
        assert_eq!(report.ignored.len(), 1);
        assert_eq!(report.ignored[0].name, "tolerated");
        assert_eq!(report.objects.len(), 1);
    }

    #[test]
    fn test_clear() {
        let registry = ItemRegistry::new();
        registry.register(item("Host", "web1", Expr::empty())).unwrap();
        registry.clear();
        assert!(registry.is_empty());
        assert!(registry.items_of_type("Host").is_empty());
    }
}

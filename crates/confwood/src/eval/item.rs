//! Configuration statements: `object`, `template`, `apply` and `import`

use super::function::evaluate_closed_vars;
use super::{check_sandbox, expect_string, Evaluate, ExpressionResult};
use crate::apply::ApplyRule;
use crate::environment::ScriptFrame;
use crate::error::EvalError;
use crate::expr::{ExprApply, ExprImport, ExprImportDefaultTemplates, ExprObject};
use crate::registry::ConfigItem;
use crate::value::Value;

// ═══════════════════════════════════════════════════════════════════════
// object / template
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for ExprObject {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        let construct = if self.is_template {
            "Template definitions"
        } else {
            "Object definitions"
        };
        check_sandbox(frame, construct)?;

        let type_name = expect_string(self.type_name.evaluate_value(frame)?, "Object type")?;
        let name = expect_string(self.name.evaluate_value(frame)?, "Object name")?;
        let scope = evaluate_closed_vars(frame, &self.closed_vars)?;

        frame.context().registry().register(ConfigItem {
            type_name,
            name,
            is_abstract: self.is_template,
            default_template: self.default_template,
            ignore_on_error: self.ignore_on_error,
            body: self.body.clone(),
            scope,
            debug_info: self.debug_info.clone(),
        })?;

        Ok(Value::Empty.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// apply
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for ExprApply {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        check_sandbox(frame, "Apply rules")?;

        let ctx = frame.context();
        {
            let rules = ctx.apply_rules();
            if !rules.is_valid_source_type(&self.source_type) {
                return Err(EvalError::type_mismatch(format!(
                    "'apply' cannot be used with type '{}'",
                    self.source_type
                )));
            }
            if !rules.is_valid_target_type(&self.source_type, &self.target_type) {
                return Err(EvalError::type_mismatch(format!(
                    "'apply' target type '{}' is invalid for type '{}'",
                    self.target_type, self.source_type
                )));
            }
        }

        let name = expect_string(self.name.evaluate_value(frame)?, "Apply rule name")?;
        let scope = evaluate_closed_vars(frame, &self.closed_vars)?;

        let rule = ApplyRule::new(
            self.source_type.as_str(),
            self.target_type.as_str(),
            name,
            self.body.clone(),
        )
        .with_filter(self.filter.clone())
        .with_for(self.for_spec.clone())
        .with_scope(scope)
        .with_ignore_on_error(self.ignore_on_error)
        .at(self.debug_info.clone());

        let constants = |name: &str| {
            ctx.constant(name)
                .and_then(|value| value.as_str().map(str::to_string))
        };
        ctx.apply_rules_mut().add_rule_with_constants(rule, &constants);
        Ok(Value::Empty.into())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// import
// ═══════════════════════════════════════════════════════════════════════

impl Evaluate for ExprImport {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        check_sandbox(frame, "Imports")?;

        let name = expect_string(self.name.evaluate_value(frame)?, "Template name")?;
        let type_name = receiver_type(frame)?;

        let Some(item) = frame.context().registry().lookup(&type_name, &name) else {
            return Err(EvalError::UnknownTemplate {
                type_name,
                name,
                location: None,
            });
        };

        import_item(frame, &item)?;
        Ok(Value::Empty.into())
    }
}

impl Evaluate for ExprImportDefaultTemplates {
    fn eval(&self, frame: &mut ScriptFrame<'_>) -> Result<ExpressionResult, EvalError> {
        check_sandbox(frame, "Imports")?;
        import_default_templates(frame)?;
        Ok(Value::Empty.into())
    }
}

/// Import every default template of the receiver's type, by name, except
/// the receiver itself.
pub(crate) fn import_default_templates(frame: &mut ScriptFrame<'_>) -> Result<(), EvalError> {
    let type_name = receiver_type(frame)?;
    let own_name = match &frame.this {
        Value::Dictionary(this) => this.get("name"),
        _ => None,
    };

    for item in frame.context().registry().default_templates(&type_name) {
        if own_name.as_ref().and_then(Value::as_str) == Some(item.name.as_str()) {
            continue;
        }
        import_item(frame, &item)?;
    }
    Ok(())
}

/// Evaluate a template body against the current receiver.
///
/// The template's captured variables are copied into the local scope
/// first so its body sees them.
fn import_item(frame: &mut ScriptFrame<'_>, item: &ConfigItem) -> Result<(), EvalError> {
    if let Some(scope) = &item.scope {
        scope.copy_to(&frame.ensure_locals())?;
    }
    item.body.evaluate(frame)?;
    Ok(())
}

/// Type name of the object under construction.
fn receiver_type(frame: &ScriptFrame<'_>) -> Result<String, EvalError> {
    let type_name = match &frame.this {
        Value::Dictionary(this) => this.get("type").and_then(|t| t.as_str().map(String::from)),
        Value::Object(object) => Some(object.type_name().to_string()),
        _ => None,
    };
    type_name.ok_or_else(|| {
        EvalError::type_mismatch("'import' can only be used inside an object definition")
    })
}

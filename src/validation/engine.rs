//! # The field validation engine.
//!
//! Owns the validator set, adapter chain, and touch state. Validation is
//! opt-in per field via `data-val="true"`; rules ride on `data-val-*`
//! attributes. Failure messages render into `[data-valmsg-for]` spans and
//! the visible element gets error styling plus `aria-invalid`.
//!
//! ## Rules
//! - Rules run in attribute order; the first failure short-circuits.
//! - An unknown rule name is skipped with a warning, never a failure.
//! - Hidden fields are skipped unless `data-val-always` is present, except
//!   composite-backed hidden inputs, which validate when their widget is
//!   visible.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::dom::Element;
use crate::error::EngineError;
use crate::model::{FieldError, ValidationOutcome, ValidationSource};
use crate::validation::adapters::{CompositeAdapter, DefaultAdapter, FieldAdapter};
use crate::validation::rules::parse_rules;
use crate::validation::touch::TouchState;
use crate::validation::validators::{builtin_validators, Validator, ValidatorCx};

const MSG_ERROR_CLASS: &str = "field-validation-error";
const MSG_VALID_CLASS: &str = "field-validation-valid";
const FIELD_ERROR_CLASS: &str = "input-validation-error";

/// Validator set + adapter chain + touch state.
pub struct FieldValidator {
    validators: RwLock<HashMap<String, Validator>>,
    adapters: RwLock<Vec<Arc<dyn FieldAdapter>>>,
    touch: TouchState,
}

impl Default for FieldValidator {
    fn default() -> Self {
        Self {
            validators: RwLock::new(builtin_validators()),
            adapters: RwLock::new(vec![Arc::new(CompositeAdapter), Arc::new(DefaultAdapter)]),
            touch: TouchState::default(),
        }
    }
}

impl FieldValidator {
    /// Registers a custom validator. Built-in names are taken.
    pub fn register_validator(&self, name: &str, validator: Validator) -> Result<(), EngineError> {
        let mut validators = self.validators.write().expect("validator lock");
        if validators.contains_key(name) {
            return Err(EngineError::config(format!(
                "validator '{name}' is already registered"
            )));
        }
        validators.insert(name.to_string(), validator);
        Ok(())
    }

    /// Registers or replaces a validator.
    pub fn register_validator_override(&self, name: &str, validator: Validator) {
        self.validators
            .write()
            .expect("validator lock")
            .insert(name.to_string(), validator);
    }

    /// Registers a custom adapter ahead of the built-ins.
    pub fn register_adapter(&self, adapter: Arc<dyn FieldAdapter>) {
        self.adapters
            .write()
            .expect("adapter lock")
            .insert(0, adapter);
    }

    /// First adapter claiming the field. The default adapter claims
    /// everything, so this always resolves.
    pub fn adapter_for(&self, field: &Element) -> Arc<dyn FieldAdapter> {
        let adapters = self.adapters.read().expect("adapter lock");
        adapters
            .iter()
            .find(|a| a.matches(field))
            .cloned()
            .unwrap_or_else(|| Arc::new(DefaultAdapter))
    }

    /// Touched/invalid bookkeeping, shared with the engine's event path.
    pub fn touch(&self) -> &TouchState {
        &self.touch
    }

    /// True when the field opts into validation.
    pub fn is_enabled(field: &Element) -> bool {
        field.attr("data-val").as_deref() == Some("true")
    }

    /// Validates one field. `None` means valid (or validation not enabled).
    /// With `show_errors` the verdict also renders into the document.
    pub fn validate_field(&self, field: &Element, show_errors: bool) -> Option<FieldError> {
        if !Self::is_enabled(field) {
            return None;
        }
        let name = field.name()?;
        let adapter = self.adapter_for(field);
        let value = adapter.value(field);
        let cx = ValidatorCx {
            field: field.clone(),
            document: field.document(),
        };

        let validators = self.validators.read().expect("validator lock");
        for rule in parse_rules(field) {
            let Some(validator) = validators.get(&rule.name) else {
                tracing::warn!(rule = %rule.name, field = %name, "unknown validation rule, skipping");
                continue;
            };
            if !validator(&value, &rule.params, &cx) {
                let message = if rule.message.is_empty() {
                    format!("The field {name} is invalid.")
                } else {
                    rule.message.clone()
                };
                self.touch.set_invalid(field.node_id(), true);
                if show_errors {
                    self.render_error(field, &adapter, &name, &message);
                }
                return Some(FieldError {
                    field: name,
                    messages: vec![message],
                });
            }
        }

        self.touch.set_invalid(field.node_id(), false);
        if show_errors {
            self.clear_error(field, &adapter, &name);
        }
        None
    }

    /// Validates every eligible field under `form`, aggregating failures.
    pub fn validate_form(&self, form: &Element, show_errors: bool) -> ValidationOutcome {
        let mut fields = Vec::new();
        for field in self.eligible_fields(form) {
            if let Some(err) = self.validate_field(&field, show_errors) {
                fields.push(err);
            }
        }
        let messages = fields.iter().flat_map(|f| f.messages.clone()).collect();
        ValidationOutcome {
            is_valid: fields.is_empty(),
            source: ValidationSource::Client,
            messages,
            fields,
            title: None,
            detail: None,
        }
    }

    /// Renders server-side field errors into the same spans client-side
    /// validation uses. Field names match exactly first, then
    /// case-insensitively.
    pub fn display_server_errors(&self, scope: &Element, errors: &[FieldError]) {
        for field in self.eligible_fields(scope) {
            if let Some(name) = field.name() {
                let adapter = self.adapter_for(&field);
                self.clear_error(&field, &adapter, &name);
            }
        }

        let named: Vec<(String, Element)> = scope
            .descendants()
            .into_iter()
            .filter_map(|el| el.name().map(|n| (n, el)))
            .collect();

        for error in errors {
            let hit = named
                .iter()
                .find(|(n, _)| *n == error.field)
                .or_else(|| {
                    named
                        .iter()
                        .find(|(n, _)| n.eq_ignore_ascii_case(&error.field))
                });
            let Some((name, field)) = hit else {
                tracing::debug!(field = %error.field, "server error for unknown field");
                continue;
            };
            let adapter = self.adapter_for(field);
            if let Some(message) = error.messages.first() {
                self.touch.set_invalid(field.node_id(), true);
                self.render_error(field, &adapter, name, message);
            }
        }
    }

    /// Moves focus to the first invalid field under `scope`, if any.
    pub fn focus_first_invalid(&self, scope: &Element) {
        for field in self.eligible_fields(scope) {
            if self.touch.is_invalid(field.node_id()) {
                let adapter = self.adapter_for(&field);
                adapter.visible_element(&field).focus();
                return;
            }
        }
    }

    fn eligible_fields(&self, scope: &Element) -> Vec<Element> {
        let mut out = Vec::new();
        let mut candidates = vec![scope.clone()];
        candidates.extend(scope.descendants());
        for el in candidates {
            if !matches!(el.tag().as_str(), "input" | "select" | "textarea") {
                continue;
            }
            if !Self::is_enabled(&el) || el.name().is_none() || el.disabled() {
                continue;
            }
            if el.has_attr("data-val-always") {
                out.push(el);
                continue;
            }
            let visible = if el.type_attr().as_deref() == Some("hidden") {
                // Composite-backed hidden inputs follow their widget.
                let adapter = self.adapter_for(&el);
                let proxy = adapter.visible_element(&el);
                proxy != el && proxy.is_visible()
            } else {
                el.is_visible()
            };
            if visible {
                out.push(el);
            }
        }
        out
    }

    fn message_span(field: &Element, name: &str) -> Option<Element> {
        let scope = field
            .enclosing_form()
            .unwrap_or_else(|| field.document().root());
        scope
            .descendants()
            .into_iter()
            .find(|el| el.attr("data-valmsg-for").as_deref() == Some(name))
    }

    fn render_error(
        &self,
        field: &Element,
        adapter: &Arc<dyn FieldAdapter>,
        name: &str,
        message: &str,
    ) {
        if let Some(span) = Self::message_span(field, name) {
            span.set_text(message);
            span.remove_class(MSG_VALID_CLASS);
            span.add_class(MSG_ERROR_CLASS);
        }
        let visible = adapter.visible_element(field);
        visible.add_class(FIELD_ERROR_CLASS);
        visible.set_attr("aria-invalid", "true");
    }

    fn clear_error(&self, field: &Element, adapter: &Arc<dyn FieldAdapter>, name: &str) {
        if let Some(span) = Self::message_span(field, name) {
            span.set_text("");
            span.remove_class(MSG_ERROR_CLASS);
            span.add_class(MSG_VALID_CLASS);
        }
        let visible = adapter.visible_element(field);
        visible.remove_class(FIELD_ERROR_CLASS);
        visible.remove_attr("aria-invalid");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;

    fn form_with_email() -> (Document, Element, Element, Element) {
        let doc = Document::new();
        let form = doc.create_element("form");
        doc.root().append_child(&form);

        let email = doc.create_element("input");
        email.set_attr("type", "text");
        email.set_attr("name", "Email");
        email.set_attr("data-val", "true");
        email.set_attr("data-val-required", "Email is required");
        email.set_attr("data-val-email", "Not an email");
        form.append_child(&email);

        let span = doc.create_element("span");
        span.set_attr("data-valmsg-for", "Email");
        form.append_child(&span);

        (doc, form, email, span)
    }

    #[test]
    fn test_first_failure_short_circuits_and_renders() {
        let (_, _, email, span) = form_with_email();
        let err = FieldValidator::default().validate_field(&email, true).unwrap();
        assert_eq!(err.messages, vec!["Email is required".to_string()]);
        assert_eq!(span.text(), "Email is required");
        assert!(span.has_class(MSG_ERROR_CLASS));
        assert!(email.has_class(FIELD_ERROR_CLASS));
        assert_eq!(email.attr("aria-invalid").as_deref(), Some("true"));
    }

    #[test]
    fn test_first_declared_rule_message_wins() {
        let doc = Document::new();
        let form = doc.create_element("form");
        doc.root().append_child(&form);
        let input = doc.create_element("input");
        input.set_attr("name", "Handle");
        input.set_attr("data-val", "true");
        input.set_attr("data-val-minlength", "Too short");
        input.set_attr("data-val-minlength-min", "5");
        input.set_attr("data-val-email", "Not an email");
        input.set_value("ab");
        form.append_child(&input);

        // "ab" fails both rules; the first-declared one reports.
        let err = FieldValidator::default().validate_field(&input, false).unwrap();
        assert_eq!(err.messages, vec!["Too short".to_string()]);
    }

    #[test]
    fn test_composite_hidden_field_follows_wrapper_visibility() {
        let doc = Document::new();
        let form = doc.create_element("form");
        doc.root().append_child(&form);
        let wrapper = doc.create_element("div");
        wrapper.set_attr("data-widget", "picker");
        form.append_child(&wrapper);
        let hidden = doc.create_element("input");
        hidden.set_attr("type", "hidden");
        hidden.set_attr("name", "Picked");
        hidden.set_attr("data-val", "true");
        hidden.set_attr("data-val-required", "Pick something");
        wrapper.append_child(&hidden);

        let v = FieldValidator::default();
        let outcome = v.validate_form(&form, false);
        assert!(!outcome.is_valid);
        assert_eq!(outcome.fields[0].field, "Picked");

        wrapper.set_hidden(true);
        assert!(v.validate_form(&form, false).is_valid);
    }

    #[test]
    fn test_passing_field_clears_rendering() {
        let (_, _, email, span) = form_with_email();
        let v = FieldValidator::default();
        v.validate_field(&email, true);
        email.set_value("bob@example.com");
        assert!(v.validate_field(&email, true).is_none());
        assert_eq!(span.text(), "");
        assert!(span.has_class(MSG_VALID_CLASS));
        assert!(!email.has_class(FIELD_ERROR_CLASS));
        assert!(email.attr("aria-invalid").is_none());
    }

    #[test]
    fn test_validation_is_opt_in() {
        let (_, _, email, _) = form_with_email();
        email.remove_attr("data-val");
        assert!(FieldValidator::default().validate_field(&email, true).is_none());
    }

    #[test]
    fn test_unknown_rule_is_skipped() {
        let (_, _, email, _) = form_with_email();
        email.set_value("bob@example.com");
        email.set_attr("data-val-telepathy", "Cannot read minds");
        assert!(FieldValidator::default().validate_field(&email, false).is_none());
    }

    #[test]
    fn test_form_aggregation_skips_hidden_fields() {
        let (doc, form, _, _) = form_with_email();

        let hidden = doc.create_element("input");
        hidden.set_attr("name", "Secret");
        hidden.set_attr("data-val", "true");
        hidden.set_attr("data-val-required", "missing");
        hidden.set_hidden(true);
        form.append_child(&hidden);

        let outcome = FieldValidator::default().validate_form(&form, false);
        assert!(!outcome.is_valid);
        assert_eq!(outcome.fields.len(), 1);
        assert_eq!(outcome.fields[0].field, "Email");
    }

    #[test]
    fn test_server_errors_match_case_insensitively() {
        let (_, form, _, span) = form_with_email();
        let v = FieldValidator::default();
        v.display_server_errors(
            &form,
            &[FieldError {
                field: "email".into(),
                messages: vec!["Taken".into()],
            }],
        );
        assert_eq!(span.text(), "Taken");
        assert!(span.has_class(MSG_ERROR_CLASS));
    }

    #[test]
    fn test_focus_first_invalid() {
        let (doc, form, email, _) = form_with_email();
        let v = FieldValidator::default();
        v.validate_form(&form, true);
        v.focus_first_invalid(&form);
        assert_eq!(doc.focused().unwrap(), email);
    }
}

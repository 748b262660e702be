//! Declarative validation rules for bound controls.
//!
//! Rules are read from a control's options map:
//!
//! - `"required": true` fails when the bound value is absent, null, an empty
//!   string or an empty collection.
//! - `"pattern": "<regex>"` fails when the stringified scalar does not match
//!   the whole pattern. Empty values are left to `required`.
//!
//! A failing rule is not an error. The control records the
//! [`ValidationFailure`] and flags its surface node.
//!
//! # Example
//!
//! ```
//! use horizon_facet::widget::validator::{RuleSet, ValidationFailure};
//! use serde_json::json;
//!
//! let options = json!({"required": true, "pattern": "[0-9]{4}"});
//! let rules = RuleSet::from_options(options.as_object().unwrap()).unwrap();
//!
//! assert_eq!(rules.check(Some(&json!(""))), Err(ValidationFailure::Required));
//! assert!(rules.check(Some(&json!("2024"))).is_ok());
//! assert!(rules.check(Some(&json!("24"))).is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::ConfigurationError;

/// Why a control failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValidationFailure {
    /// A required value is missing or empty.
    Required,
    /// The value does not match the declared pattern.
    PatternMismatch { pattern: String },
    /// A custom validator rejected the value.
    Rejected { message: String },
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => write!(f, "A value is required"),
            Self::PatternMismatch { pattern } => write!(f, "Value must match '{pattern}'"),
            Self::Rejected { message } => write!(f, "{message}"),
        }
    }
}

/// Trait for value validators.
///
/// Validators must be `Send + Sync` so that controls can be driven from
/// surface event handlers.
pub trait Validator: Send + Sync {
    /// Check the bound value. `None` means the key did not resolve.
    fn validate(&self, value: Option<&Value>) -> Result<(), ValidationFailure>;
}

impl<V: Validator + ?Sized> Validator for Arc<V> {
    fn validate(&self, value: Option<&Value>) -> Result<(), ValidationFailure> {
        (**self).validate(value)
    }
}

impl<V: Validator + ?Sized> Validator for Box<V> {
    fn validate(&self, value: Option<&Value>) -> Result<(), ValidationFailure> {
        (**self).validate(value)
    }
}

/// Whether a value counts as empty for `required`.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        Some(Value::Bool(_) | Value::Number(_)) => false,
    }
}

/// Fails on empty values.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequiredValidator;

impl Validator for RequiredValidator {
    fn validate(&self, value: Option<&Value>) -> Result<(), ValidationFailure> {
        if is_empty_value(value) {
            Err(ValidationFailure::Required)
        } else {
            Ok(())
        }
    }
}

/// Fails when a non-empty scalar does not fully match a regular expression.
#[derive(Debug, Clone)]
pub struct PatternValidator {
    source: String,
    anchored: Regex,
}

impl PatternValidator {
    /// Compile a pattern. The match is anchored at both ends.
    pub fn new(pattern: &str) -> Result<Self, ConfigurationError> {
        let anchored = Regex::new(&format!("^(?:{pattern})$"))
            .map_err(|err| ConfigurationError::invalid_pattern(pattern, err))?;
        Ok(Self {
            source: pattern.to_string(),
            anchored,
        })
    }

    /// The pattern as written.
    pub fn pattern(&self) -> &str {
        &self.source
    }
}

impl Validator for PatternValidator {
    fn validate(&self, value: Option<&Value>) -> Result<(), ValidationFailure> {
        if is_empty_value(value) {
            return Ok(());
        }
        let text = match value {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            Some(Value::Bool(b)) => b.to_string(),
            _ => String::new(),
        };

        if self.anchored.is_match(&text) {
            Ok(())
        } else {
            Err(ValidationFailure::PatternMismatch {
                pattern: self.source.clone(),
            })
        }
    }
}

/// The ordered set of validators attached to one control.
#[derive(Clone, Default)]
pub struct RuleSet {
    validators: Vec<Arc<dyn Validator>>,
}

impl RuleSet {
    /// An empty rule set; everything passes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the declarative rules from a control's options.
    pub fn from_options(options: &Map<String, Value>) -> Result<Self, ConfigurationError> {
        let mut rules = Self::new();

        match options.get("required") {
            None | Some(Value::Bool(false)) => {}
            Some(Value::Bool(true)) => rules.push(RequiredValidator),
            Some(other) => {
                return Err(ConfigurationError::malformed(format!(
                    "'required' must be a boolean, got {other}"
                )));
            }
        }

        match options.get("pattern") {
            None | Some(Value::Null) => {}
            Some(Value::String(pattern)) => rules.push(PatternValidator::new(pattern)?),
            Some(other) => {
                return Err(ConfigurationError::malformed(format!(
                    "'pattern' must be a string, got {other}"
                )));
            }
        }

        Ok(rules)
    }

    /// Append a validator.
    pub fn push(&mut self, validator: impl Validator + 'static) {
        self.validators.push(Arc::new(validator));
    }

    /// Append every validator of `other`, sharing them.
    pub fn extend(&mut self, other: &RuleSet) {
        self.validators.extend(other.validators.iter().cloned());
    }

    /// Whether any rule is attached.
    pub fn is_empty(&self) -> bool {
        self.validators.is_empty()
    }

    /// Run every rule in order and report the first failure.
    pub fn check(&self, value: Option<&Value>) -> Result<(), ValidationFailure> {
        self.validators.iter().try_for_each(|v| v.validate(value))
    }
}

impl fmt::Debug for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuleSet")
            .field("validators", &self.validators.len())
            .finish()
    }
}

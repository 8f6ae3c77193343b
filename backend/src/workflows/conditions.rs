// Workflow Conditions - Conditional logic gating workflow execution

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single condition to evaluate against the trigger payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowCondition {
    /// Field name to evaluate (supports dot notation for nested fields)
    pub field: String,
    /// Operator tag for comparison; unrecognized tags evaluate to false
    pub operator: String,
    /// Value to compare against (absent for `exists`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

/// Recognized condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
    Exists,
}

impl ConditionOperator {
    /// Parse a wire tag. Condition data arrives as JSON configuration, so
    /// the tag is only checked here, at the evaluation boundary.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "equals" => Some(Self::Equals),
            "not_equals" => Some(Self::NotEquals),
            "greater_than" => Some(Self::GreaterThan),
            "less_than" => Some(Self::LessThan),
            "contains" => Some(Self::Contains),
            "exists" => Some(Self::Exists),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::Contains => "contains",
            Self::Exists => "exists",
        }
    }
}

/// Evaluate all conditions against the input payload.
///
/// Logical AND with short-circuit; an empty list is vacuously true.
/// Pure function, no side effects.
pub fn evaluate_conditions(conditions: &[WorkflowCondition], input: &Value) -> bool {
    conditions.iter().all(|c| evaluate_condition(c, input))
}

/// Evaluate a single condition.
///
/// An unrecognized operator tag evaluates to false rather than erroring.
/// `greater_than`/`less_than` require both operands to read as f64; any
/// other pairing evaluates to false.
pub fn evaluate_condition(condition: &WorkflowCondition, input: &Value) -> bool {
    let resolved = resolve_field(input, &condition.field);

    let Some(operator) = ConditionOperator::from_tag(&condition.operator) else {
        return false;
    };

    match operator {
        ConditionOperator::Equals => match (resolved, condition.value.as_ref()) {
            (Some(v), Some(target)) => v == target,
            (None, None) => true,
            _ => false,
        },
        ConditionOperator::NotEquals => match (resolved, condition.value.as_ref()) {
            (Some(v), Some(target)) => v != target,
            (None, None) => false,
            _ => true,
        },
        ConditionOperator::GreaterThan => match (resolved, condition.value.as_ref()) {
            (Some(v), Some(target)) => match (v.as_f64(), target.as_f64()) {
                (Some(a), Some(b)) => a > b,
                _ => false,
            },
            _ => false,
        },
        ConditionOperator::LessThan => match (resolved, condition.value.as_ref()) {
            (Some(v), Some(target)) => match (v.as_f64(), target.as_f64()) {
                (Some(a), Some(b)) => a < b,
                _ => false,
            },
            _ => false,
        },
        ConditionOperator::Contains => match (resolved, condition.value.as_ref()) {
            (Some(v), Some(target)) => stringify(v).contains(&stringify(target)),
            _ => false,
        },
        ConditionOperator::Exists => matches!(resolved, Some(v) if !v.is_null()),
    }
}

/// Resolve a dot-separated path into the payload. A missing root key (or
/// any missing segment) resolves to None.
fn resolve_field<'a>(input: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = input;
    for part in path.split('.') {
        current = current.get(part)?;
    }
    Some(current)
}

/// Stringify a JSON value the way the UI layer would display it: strings
/// without quotes, everything else in its JSON rendering.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

impl WorkflowCondition {
    pub fn new(field: &str, operator: &str, value: Value) -> Self {
        Self {
            field: field.to_string(),
            operator: operator.to_string(),
            value: Some(value),
        }
    }

    pub fn equals(field: &str, value: Value) -> Self {
        Self::new(field, "equals", value)
    }

    pub fn not_equals(field: &str, value: Value) -> Self {
        Self::new(field, "not_equals", value)
    }

    pub fn greater_than(field: &str, value: f64) -> Self {
        Self::new(field, "greater_than", serde_json::json!(value))
    }

    pub fn less_than(field: &str, value: f64) -> Self {
        Self::new(field, "less_than", serde_json::json!(value))
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self::new(field, "contains", Value::String(value.to_string()))
    }

    pub fn exists(field: &str) -> Self {
        Self {
            field: field.to_string(),
            operator: "exists".to_string(),
            value: None,
        }
    }
}

//! Merge actions: compute a new leaf value from the existing and incoming
//! values.
//!
//! Actions receive owned copies of both values and return the value to
//! write. They never see the live tree.

use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};

use crate::error::ActionError;

/// Signature of a caller-registered action.
///
/// `existing` is `None` when the key is absent or `null`.
pub type ActionFn = dyn Fn(Option<Value>, Value) -> Result<Value, ActionError> + Send + Sync;

/// A merge action bound to a symbol in the operator registry.
#[derive(Clone)]
pub enum Action {
    /// `+`: concatenate arrays and strings, add numbers.
    Add,
    /// `-`: remove array elements, subtract numbers, strip substrings.
    Subtract,
    /// `=`: keep the existing value and ignore the incoming one.
    Copy,
    /// Domain-specific action supplied by the embedding application.
    Custom { name: String, func: Arc<ActionFn> },
}

impl Action {
    /// Wrap a closure as a custom action.
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Option<Value>, Value) -> Result<Value, ActionError> + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::Copy => "copy",
            Self::Custom { name, .. } => name,
        }
    }

    /// Apply the action. `symbol` is only used for error reporting.
    pub fn apply(
        &self,
        symbol: char,
        existing: Option<Value>,
        incoming: Value,
    ) -> Result<Value, ActionError> {
        match self {
            Self::Add => add(symbol, existing, incoming),
            Self::Subtract => subtract(symbol, existing, incoming),
            Self::Copy => Ok(existing.unwrap_or(Value::Null)),
            Self::Custom { func, .. } => func(existing, incoming),
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Custom { name, .. } => f.debug_struct("Custom").field("name", name).finish(),
            builtin => f.write_str(builtin.name()),
        }
    }
}

fn add(symbol: char, existing: Option<Value>, incoming: Value) -> Result<Value, ActionError> {
    let Some(existing) = existing else {
        return Ok(incoming);
    };
    match (existing, incoming) {
        (Value::Array(mut items), Value::Array(more)) => {
            items.extend(more);
            Ok(Value::Array(items))
        }
        (Value::String(mut text), Value::String(more)) => {
            text.push_str(&more);
            Ok(Value::String(text))
        }
        (Value::Number(a), Value::Number(b)) => {
            combine_numbers(symbol, &a, &b, i64::checked_add, |x, y| x + y)
        }
        (existing, incoming) => Err(mismatch(symbol, &existing, &incoming)),
    }
}

fn subtract(symbol: char, existing: Option<Value>, incoming: Value) -> Result<Value, ActionError> {
    let Some(existing) = existing else {
        return Ok(Value::Null);
    };
    match (existing, incoming) {
        (Value::Array(mut items), Value::Array(remove)) => {
            for element in remove {
                remove_first(&mut items, element)?;
            }
            Ok(Value::Array(items))
        }
        (Value::Array(mut items), element) => {
            remove_first(&mut items, element)?;
            Ok(Value::Array(items))
        }
        (Value::String(text), Value::String(pattern)) => {
            if pattern.is_empty() {
                return Ok(Value::String(text));
            }
            Ok(Value::String(text.replace(&pattern, "")))
        }
        (Value::Number(a), Value::Number(b)) => {
            combine_numbers(symbol, &a, &b, i64::checked_sub, |x, y| x - y)
        }
        (existing, incoming) => Err(mismatch(symbol, &existing, &incoming)),
    }
}

fn remove_first(items: &mut Vec<Value>, element: Value) -> Result<(), ActionError> {
    match items.iter().position(|item| *item == element) {
        Some(index) => {
            items.remove(index);
            Ok(())
        }
        None => Err(ActionError::ElementNotFound { element }),
    }
}

/// Integer arithmetic when both sides are integers, float otherwise.
fn combine_numbers(
    symbol: char,
    a: &Number,
    b: &Number,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, ActionError> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return int_op(x, y)
            .map(|n| Value::Number(n.into()))
            .ok_or(ActionError::Overflow { action: symbol });
    }
    let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) else {
        return Err(ActionError::Overflow { action: symbol });
    };
    Number::from_f64(float_op(x, y))
        .map(Value::Number)
        .ok_or(ActionError::NonFinite { action: symbol })
}

fn mismatch(symbol: char, existing: &Value, incoming: &Value) -> ActionError {
    ActionError::TypeMismatch {
        action: symbol,
        existing: type_name(existing),
        incoming: type_name(incoming),
    }
}

/// Human-readable JSON type name.
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(action: &Action, existing: Value, incoming: Value) -> Result<Value, ActionError> {
        action.apply('?', Some(existing), incoming)
    }

    #[test]
    fn add_concatenates_and_sums() {
        assert_eq!(run(&Action::Add, json!([1, 2]), json!([3, 4])).unwrap(), json!([1, 2, 3, 4]));
        assert_eq!(run(&Action::Add, json!(5), json!(5)).unwrap(), json!(10));
        assert_eq!(run(&Action::Add, json!(1.5), json!(1)).unwrap(), json!(2.5));
        assert_eq!(
            run(&Action::Add, json!("A sentence"), json!(" more")).unwrap(),
            json!("A sentence more")
        );
    }

    #[test]
    fn add_to_absent_value_sets_it() {
        assert_eq!(Action::Add.apply('+', None, json!([1])).unwrap(), json!([1]));
    }

    #[test]
    fn add_rejects_mixed_types() {
        let err = run(&Action::Add, json!([1]), json!(2)).unwrap_err();
        assert!(matches!(
            err,
            ActionError::TypeMismatch { existing: "array", incoming: "number", .. }
        ));
    }

    #[test]
    fn add_detects_overflow() {
        let err = run(&Action::Add, json!(i64::MAX), json!(1)).unwrap_err();
        assert!(matches!(err, ActionError::Overflow { .. }));
    }

    #[test]
    fn subtract_removes_elements() {
        assert_eq!(run(&Action::Subtract, json!([1, 2]), json!([1])).unwrap(), json!([2]));
        assert_eq!(run(&Action::Subtract, json!([1, 2, 1]), json!(1)).unwrap(), json!([2, 1]));
    }

    #[test]
    fn subtract_missing_element_fails() {
        let err = run(&Action::Subtract, json!([1, 2]), json!([3])).unwrap_err();
        assert!(matches!(err, ActionError::ElementNotFound { element } if element == json!(3)));
    }

    #[test]
    fn subtract_numbers_and_strings() {
        assert_eq!(run(&Action::Subtract, json!(5), json!(5)).unwrap(), json!(0));
        assert_eq!(run(&Action::Subtract, json!("A sentence"), json!("e")).unwrap(), json!("A sntnc"));
        assert_eq!(run(&Action::Subtract, json!("abc"), json!("")).unwrap(), json!("abc"));
    }

    #[test]
    fn subtract_from_absent_is_null() {
        assert_eq!(Action::Subtract.apply('-', None, json!(1)).unwrap(), Value::Null);
    }

    #[test]
    fn copy_keeps_existing() {
        assert_eq!(run(&Action::Copy, json!(5), json!(0)).unwrap(), json!(5));
        assert_eq!(Action::Copy.apply('=', None, json!(0)).unwrap(), Value::Null);
    }

    #[test]
    fn custom_action_runs_closure() {
        let concat = Action::custom("concat-digits", |existing, incoming| {
            let joined = format!("{}{}", existing.unwrap_or(Value::Null), incoming);
            joined
                .parse::<i64>()
                .map(Value::from)
                .map_err(|e| ActionError::Custom(e.to_string()))
        });
        assert_eq!(run(&concat, json!(1), json!(2)).unwrap(), json!(12));
        assert_eq!(format!("{concat:?}"), r#"Custom { name: "concat-digits" }"#);
    }
}

/// Type narrowing for updates
///
/// An update names bins that may already hold a typed value. The new text is
/// re-read as that type so an integer bin stays an integer even when the
/// operator quoted the number. When the text does not parse, it is stored as
/// a string and a fallback notice is produced.

use aqlite_core::aql::Assignment;
use aqlite_core::Value;
use std::fmt;

/// Notice emitted when text could not be read as the bin's existing type
#[derive(Debug, Clone, PartialEq)]
pub struct TypeFallback {
    pub bin: String,
    /// Type name of the existing value
    pub expected: &'static str,
    pub text: String,
}

impl fmt::Display for TypeFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot update {} ({}) with '{}'. Treating as String.",
            self.bin, self.expected, self.text
        )
    }
}

/// Value to store plus the fallback, if one happened
#[derive(Debug, Clone, PartialEq)]
pub struct Narrowed {
    pub value: Value,
    pub fallback: Option<TypeFallback>,
}

impl Narrowed {
    fn exact(value: Value) -> Self {
        Self {
            value,
            fallback: None,
        }
    }
}

fn parse_bool(text: &str) -> Option<bool> {
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Re-read `text` as the type of `existing`.
pub fn narrow_text(bin: &str, text: &str, existing: &Value) -> Narrowed {
    let parsed = match existing {
        Value::Int(_) => text.parse::<i64>().ok().map(Value::Int),
        Value::Float(_) => text
            .parse::<f64>()
            .ok()
            .filter(|f| f.is_finite())
            .map(Value::Float),
        Value::Bool(_) => parse_bool(text).map(Value::Bool),
        _ => return Narrowed::exact(Value::string(text)),
    };

    match parsed {
        Some(value) => Narrowed::exact(value),
        None => Narrowed {
            value: Value::string(text),
            fallback: Some(TypeFallback {
                bin: bin.to_string(),
                expected: existing.type_name(),
                text: text.to_string(),
            }),
        },
    }
}

/// Narrow a SET clause value. The text as written is re-read against an
/// existing value; bins without one keep the literal's own type.
pub fn narrow_assignment(bin: &str, assignment: &Assignment, existing: Option<&Value>) -> Narrowed {
    match existing {
        Some(existing) => narrow_text(bin, &assignment.text, existing),
        None => Narrowed::exact(assignment.value.to_value()),
    }
}

/// Narrow raw text typed into a single cell. Without an existing value the
/// text is stored as a string.
pub fn narrow_raw(bin: &str, text: &str, existing: Option<&Value>) -> Narrowed {
    match existing {
        Some(existing) => narrow_text(bin, text, existing),
        None => Narrowed::exact(Value::string(text)),
    }
}

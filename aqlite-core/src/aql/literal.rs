/// Literal coercion: raw statement text to typed values
///
/// Statements carry untyped text. Coercion decides between string, integer
/// and float by shape alone and never fails; anything that is neither quoted
/// nor numeric is kept verbatim as a string.

use crate::types::Value;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref INT_PATTERN: Regex = Regex::new(r"^-?[0-9]+$").expect("valid integer pattern");
    static ref FLOAT_PATTERN: Regex =
        Regex::new(r"^-?[0-9]+(\.[0-9]+)?$").expect("valid float pattern");
}

/// Typed literal produced from statement text
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Literal {
    /// Coerce a raw token. Surrounding whitespace is ignored.
    pub fn coerce(raw: &str) -> Literal {
        let raw = raw.trim();

        if raw.len() >= 2 && raw.starts_with('\'') && raw.ends_with('\'') {
            return Literal::Str(raw[1..raw.len() - 1].to_string());
        }

        if INT_PATTERN.is_match(raw) {
            // Out-of-range integers fall through to the float rule
            if let Ok(n) = raw.parse::<i64>() {
                return Literal::Int(n);
            }
        }

        if FLOAT_PATTERN.is_match(raw) {
            if let Ok(f) = raw.parse::<f64>() {
                return Literal::Float(f);
            }
        }

        Literal::Str(raw.to_string())
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Literal::Str(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Text form used when the literal has to be re-read as another type.
    /// Floats keep their decimal point so `3.0` never passes as an integer.
    pub fn text(&self) -> String {
        match self {
            Literal::Str(s) => s.clone(),
            Literal::Int(n) => n.to_string(),
            Literal::Float(f) => format!("{:?}", f),
        }
    }

    /// Bin value this literal is stored as
    pub fn to_value(&self) -> Value {
        match self {
            Literal::Str(s) => Value::Str(s.clone()),
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(f) => Value::Float(*f),
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "'{}'", s),
            Literal::Int(n) => write!(f, "{}", n),
            Literal::Float(x) => write!(f, "{:?}", x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_coerce_quoted_string() {
        assert_eq!(Literal::coerce("'abc'"), Literal::Str("abc".into()));
        assert_eq!(Literal::coerce("''"), Literal::Str(String::new()));
        assert_eq!(Literal::coerce("'John Doe'"), Literal::Str("John Doe".into()));
    }

    #[test]
    fn test_coerce_numbers() {
        assert_eq!(Literal::coerce("42"), Literal::Int(42));
        assert_eq!(Literal::coerce("-17"), Literal::Int(-17));
        assert_eq!(Literal::coerce("-3.5"), Literal::Float(-3.5));
        assert_eq!(Literal::coerce("10.25"), Literal::Float(10.25));
    }

    #[test]
    fn test_coerce_fallback_is_verbatim() {
        assert_eq!(Literal::coerce("abc"), Literal::Str("abc".into()));
        assert_eq!(Literal::coerce("'abc"), Literal::Str("'abc".into()));
        assert_eq!(Literal::coerce("'"), Literal::Str("'".into()));
        assert_eq!(Literal::coerce("1.2.3"), Literal::Str("1.2.3".into()));
        assert_eq!(Literal::coerce(".5"), Literal::Str(".5".into()));
        assert_eq!(Literal::coerce("true"), Literal::Str("true".into()));
    }

    #[test]
    fn test_coerce_trims() {
        assert_eq!(Literal::coerce("  30 "), Literal::Int(30));
    }

    #[test]
    fn test_coerce_beyond_i64_becomes_float() {
        let lit = Literal::coerce("99999999999999999999");
        assert!(matches!(lit, Literal::Float(_)));
    }

    #[test]
    fn test_quoted_number_stays_string() {
        assert_eq!(Literal::coerce("'31'"), Literal::Str("31".into()));
    }

    #[test]
    fn test_text_keeps_float_shape() {
        assert_eq!(Literal::Float(3.0).text(), "3.0");
        assert_eq!(Literal::Float(-3.5).text(), "-3.5");
        assert_eq!(Literal::Int(31).text(), "31");
        assert_eq!(Literal::Str("x".into()).text(), "x");
    }

    #[test]
    fn test_to_value() {
        assert_eq!(Literal::Int(30).to_value(), Value::Int(30));
        assert_eq!(Literal::Str("a".into()).to_value(), Value::Str("a".into()));
        assert_eq!(Literal::Float(1.5).to_value(), Value::Float(1.5));
    }

    proptest! {
        #[test]
        fn prop_coerce_is_total(raw in ".*") {
            let _ = Literal::coerce(&raw);
        }

        #[test]
        fn prop_integers_round_trip(n in any::<i64>()) {
            prop_assert_eq!(Literal::coerce(&n.to_string()), Literal::Int(n));
        }

        #[test]
        fn prop_quoted_text_is_stripped(body in "[^']*") {
            let raw = format!("'{}'", body);
            prop_assert_eq!(Literal::coerce(&raw), Literal::Str(body));
        }
    }
}

//! Submitted exam scores

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use thiserror::Error;

/// Form field names, in feature order
pub const SCORE_FIELDS: [&str; 3] = ["math", "reading", "writing"];

/// Error raised when a submitted field is not a usable number
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreParseError {
    #[error("field `{field}` is not a number: {value:?}")]
    NotNumeric { field: &'static str, value: String },

    #[error("field `{field}` is not finite: {value}")]
    NotFinite { field: &'static str, value: f64 },
}

/// Three exam scores forming a single feature row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreInput {
    /// Math score
    pub math: f64,
    /// Reading score
    pub reading: f64,
    /// Writing score
    pub writing: f64,
}

impl ScoreInput {
    pub fn new(math: f64, reading: f64, writing: f64) -> Self {
        Self {
            math,
            reading,
            writing,
        }
    }

    /// Parse scores from submitted form pairs, in submission order.
    ///
    /// Absent fields count as `0` and a field submitted more than once takes
    /// its first value. Values are trimmed before parsing, and anything that
    /// is not a finite number rejects the whole submission. Underscores are
    /// accepted only between digits (`1_000`).
    pub fn from_pairs(pairs: &[(String, String)]) -> Result<Self, ScoreParseError> {
        let lookup = |field: &str| {
            pairs
                .iter()
                .find(|(key, _)| key == field)
                .map(|(_, value)| value.as_str())
        };
        let [math, reading, writing] = SCORE_FIELDS;

        Ok(Self {
            math: parse_field(lookup(math), math)?,
            reading: parse_field(lookup(reading), reading)?,
            writing: parse_field(lookup(writing), writing)?,
        })
    }
}

fn parse_field(raw: Option<&str>, field: &'static str) -> Result<f64, ScoreParseError> {
    let Some(raw) = raw else {
        return Ok(0.0);
    };

    let not_numeric = || ScoreParseError::NotNumeric {
        field,
        value: raw.to_string(),
    };

    let value: f64 = strip_digit_separators(raw.trim())
        .ok_or_else(not_numeric)?
        .parse()
        .map_err(|_| not_numeric())?;

    if !value.is_finite() {
        return Err(ScoreParseError::NotFinite { field, value });
    }

    Ok(value)
}

/// Drop `_` separators that sit between two digits. Any other underscore
/// makes the value unparseable.
fn strip_digit_separators(value: &str) -> Option<Cow<'_, str>> {
    if !value.contains('_') {
        return Some(Cow::Borrowed(value));
    }

    let bytes = value.as_bytes();
    let mut cleaned = String::with_capacity(value.len());
    for (i, c) in value.char_indices() {
        if c != '_' {
            cleaned.push(c);
            continue;
        }
        let before = i.checked_sub(1).map(|j| bytes[j]);
        let after = bytes.get(i + 1).copied();
        match (before, after) {
            (Some(b), Some(a)) if b.is_ascii_digit() && a.is_ascii_digit() => {}
            _ => return None,
        }
    }
    Some(Cow::Owned(cleaned))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_all_fields() {
        let input =
            ScoreInput::from_pairs(&form(&[("math", "60"), ("reading", "70.5"), ("writing", " 65 ")]))
                .unwrap();

        assert_eq!(input, ScoreInput::new(60.0, 70.5, 65.0));
    }

    #[test]
    fn test_missing_fields_default_to_zero() {
        let input = ScoreInput::from_pairs(&form(&[("reading", "42")])).unwrap();
        assert_eq!(input, ScoreInput::new(0.0, 42.0, 0.0));

        let input = ScoreInput::from_pairs(&[]).unwrap();
        assert_eq!(input, ScoreInput::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_non_numeric_field_is_rejected() {
        let err = ScoreInput::from_pairs(&form(&[("math", "60"), ("reading", "abc")])).unwrap_err();
        assert_eq!(
            err,
            ScoreParseError::NotNumeric {
                field: "reading",
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_empty_field_is_rejected() {
        assert!(ScoreInput::from_pairs(&form(&[("writing", "")])).is_err());
    }

    #[test]
    fn test_non_finite_field_is_rejected() {
        let err = ScoreInput::from_pairs(&form(&[("math", "inf")])).unwrap_err();
        assert!(matches!(err, ScoreParseError::NotFinite { field: "math", .. }));
        assert!(ScoreInput::from_pairs(&form(&[("math", "NaN")])).is_err());
    }

    #[test]
    fn test_scientific_notation() {
        let input = ScoreInput::from_pairs(&form(&[("math", "6e1")])).unwrap();
        assert_eq!(input.math, 60.0);
    }

    #[test]
    fn test_digit_separators() {
        let input = ScoreInput::from_pairs(&form(&[("math", "1_000"), ("reading", "6_5.2_5")])).unwrap();
        assert_eq!(input.math, 1000.0);
        assert_eq!(input.reading, 65.25);

        for bad in ["_1", "1_", "1__0", "1_.5", "_"] {
            assert!(
                ScoreInput::from_pairs(&form(&[("math", bad)])).is_err(),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_duplicate_field_takes_first_value() {
        let pairs = vec![
            ("math".to_string(), "60".to_string()),
            ("math".to_string(), "abc".to_string()),
            ("writing".to_string(), "70".to_string()),
        ];

        let input = ScoreInput::from_pairs(&pairs).unwrap();
        assert_eq!(input, ScoreInput::new(60.0, 0.0, 70.0));
    }
}

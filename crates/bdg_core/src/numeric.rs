//! Numeric safety helpers.
//!
//! Every value entering arithmetic goes through [`sanitize`]. Raw input fields are
//! carried as [`RawNumber`] so that spreadsheet strings and database nulls are
//! resolved at the point of use, never raised as errors.
//!
//! Lenient text parsing:
//! - currency markers (`R$`, `$`), `%`, and all whitespace (including NBSP) are dropped
//! - when both `.` and `,` occur, the one appearing last is the decimal separator
//! - a single `,` is a decimal separator; repeated identical separators are grouping
//! - a single `.` is a decimal separator
//! - anything unparseable is `0`

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Map NaN and ±inf to 0.
#[inline]
pub fn sanitize(x: f64) -> f64 {
    if x.is_finite() {
        x
    } else {
        0.0
    }
}

#[inline]
pub fn safe_mul(a: f64, b: f64) -> f64 {
    sanitize(sanitize(a) * sanitize(b))
}

#[inline]
pub fn safe_add(a: f64, b: f64) -> f64 {
    sanitize(sanitize(a) + sanitize(b))
}

/// `(1 + percent/100)`, sanitized on both sides.
#[inline]
pub fn markup_multiplier(percent: f64) -> f64 {
    sanitize(1.0 + sanitize(percent) / 100.0)
}

/// `part / whole * 100`, with a zero `whole` treated as 1.
#[inline]
pub fn percent_of(part: f64, whole: f64) -> f64 {
    let whole = sanitize(whole);
    let den = if whole == 0.0 { 1.0 } else { whole };
    sanitize(sanitize(part) / den * 100.0)
}

/// Parse a possibly locale-formatted number. Never fails; returns 0 on garbage.
pub fn parse_lenient(s: &str) -> f64 {
    try_parse_lenient(s).unwrap_or(0.0)
}

/// Same rules as `parse_lenient`, but `None` for empty, unparseable or non-finite text.
pub fn try_parse_lenient(s: &str) -> Option<f64> {
    let cleaned: String = s
        .replace("R$", "")
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '$' | '%'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    normalize_separators(&cleaned)
        .parse::<f64>()
        .ok()
        .filter(|x| x.is_finite())
}

fn normalize_separators(s: &str) -> String {
    match (s.rfind('.'), s.rfind(',')) {
        (Some(dot), Some(comma)) => {
            let (decimal, grouping) = if comma > dot { (',', '.') } else { ('.', ',') };
            s.chars()
                .filter(|&c| c != grouping)
                .map(|c| if c == decimal { '.' } else { c })
                .collect()
        }
        (None, Some(_)) => {
            if s.matches(',').count() > 1 {
                s.replace(',', "")
            } else {
                s.replace(',', ".")
            }
        }
        (Some(_), None) if s.matches('.').count() > 1 => s.replace('.', ""),
        _ => s.to_string(),
    }
}

/// A numeric field as received: absent/null, a JSON number, or text.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum RawNumber {
    #[default]
    Missing,
    Number(f64),
    Text(String),
}

impl RawNumber {
    /// Sanitized value; `Missing`, NaN, ±inf and unparseable text are 0.
    pub fn value(&self) -> f64 {
        match self {
            RawNumber::Missing => 0.0,
            RawNumber::Number(x) => sanitize(*x),
            RawNumber::Text(s) => parse_lenient(s),
        }
    }

    #[inline]
    pub fn is_missing(&self) -> bool {
        matches!(self, RawNumber::Missing)
    }
}

impl From<f64> for RawNumber {
    fn from(x: f64) -> Self {
        RawNumber::Number(x)
    }
}

impl From<Option<f64>> for RawNumber {
    fn from(x: Option<f64>) -> Self {
        x.map_or(RawNumber::Missing, RawNumber::Number)
    }
}

impl From<&str> for RawNumber {
    fn from(s: &str) -> Self {
        RawNumber::Text(s.to_string())
    }
}

impl From<String> for RawNumber {
    fn from(s: String) -> Self {
        RawNumber::Text(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_non_finite() {
        assert_eq!(sanitize(f64::NAN), 0.0);
        assert_eq!(sanitize(f64::INFINITY), 0.0);
        assert_eq!(sanitize(f64::NEG_INFINITY), 0.0);
        assert_eq!(sanitize(-3.5), -3.5);
    }

    #[test]
    fn strict_variant_reports_garbage() {
        assert_eq!(try_parse_lenient("1.000,5"), Some(1000.5));
        assert_eq!(try_parse_lenient(" "), None);
        assert_eq!(try_parse_lenient("abc"), None);
        assert_eq!(try_parse_lenient("inf"), None);
    }

    #[test]
    fn lenient_locale_formats() {
        assert_eq!(parse_lenient("1.234,56"), 1234.56);
        assert_eq!(parse_lenient("1,234.56"), 1234.56);
        assert_eq!(parse_lenient("12,5"), 12.5);
        assert_eq!(parse_lenient("12.5"), 12.5);
        assert_eq!(parse_lenient("1.234.567"), 1_234_567.0);
        assert_eq!(parse_lenient("1,234,567"), 1_234_567.0);
        assert_eq!(parse_lenient("R$ 1.000,00"), 1000.0);
        assert_eq!(parse_lenient("R$\u{a0}2.500,75"), 2500.75);
        assert_eq!(parse_lenient("25%"), 25.0);
        assert_eq!(parse_lenient("-3,5"), -3.5);
    }

    #[test]
    fn lenient_garbage_is_zero() {
        assert_eq!(parse_lenient(""), 0.0);
        assert_eq!(parse_lenient("   "), 0.0);
        assert_eq!(parse_lenient("abc"), 0.0);
        assert_eq!(parse_lenient("NaN"), 0.0);
        assert_eq!(parse_lenient("inf"), 0.0);
        assert_eq!(parse_lenient("1e400"), 0.0);
    }

    #[test]
    fn raw_number_values() {
        assert_eq!(RawNumber::Missing.value(), 0.0);
        assert_eq!(RawNumber::from(f64::NAN).value(), 0.0);
        assert_eq!(RawNumber::from("1.234,56").value(), 1234.56);
        assert_eq!(RawNumber::from(Some(2.0)).value(), 2.0);
        assert!(RawNumber::from(None).is_missing());
    }

    #[test]
    fn multiplier_and_percent() {
        assert_eq!(markup_multiplier(10.0), 1.1);
        assert_eq!(markup_multiplier(f64::NAN), 1.0);
        assert_eq!(percent_of(50.0, 200.0), 25.0);
        assert_eq!(percent_of(0.0, 0.0), 0.0);
        assert_eq!(safe_mul(f64::MAX, 10.0), 0.0);
        assert_eq!(safe_add(f64::MAX, f64::MAX), 0.0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn raw_number_from_json() {
        let v: Vec<RawNumber> = serde_json::from_str(r#"[null, 3, 2.5, "1.234,56"]"#).unwrap();
        assert_eq!(v[0], RawNumber::Missing);
        assert_eq!(v[1].value(), 3.0);
        assert_eq!(v[2].value(), 2.5);
        assert_eq!(v[3].value(), 1234.56);
    }
}

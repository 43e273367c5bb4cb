//! Normalization of CSL `date-parts` into TEI date strings
//!
//! A CSL date is `{"date-parts": [[year, month, day]]}`. Only the first inner
//! array is used. Every component must coerce to an integer or the whole date
//! is rejected; a partially valid date is never written.

use serde_json::Value;

/// Integer date components, year first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateParts {
    pub year: i64,
    pub month: Option<i64>,
    pub day: Option<i64>,
}

impl DateParts {
    /// Build from raw JSON components.
    ///
    /// Returns `None` when the slice is empty or any component (including
    /// ones past the third, which are otherwise ignored) fails coercion.
    pub fn from_values(values: &[Value]) -> Option<Self> {
        let ints: Vec<i64> = values.iter().map(coerce_int).collect::<Option<_>>()?;
        let (&year, rest) = ints.split_first()?;

        Some(Self {
            year,
            month: rest.first().copied(),
            day: rest.get(1).copied(),
        })
    }

    /// Extract from a CSL date object (`issued`, `accessed`, ...).
    pub fn from_csl_date(date: &Value) -> Option<Self> {
        let first = date.get("date-parts")?.as_array()?.first()?.as_array()?;
        Self::from_values(first)
    }

    /// `YYYY`, `YYYY-MM` or `YYYY-MM-DD`; month and day padded to two digits.
    pub fn to_iso_string(&self) -> String {
        let mut out = self.year.to_string();
        if let Some(month) = self.month {
            out.push_str(&format!("-{:02}", month));
            if let Some(day) = self.day {
                out.push_str(&format!("-{:02}", day));
            }
        }
        out
    }
}

impl std::fmt::Display for DateParts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso_string())
    }
}

/// Normalize a CSL date object straight to its string form.
pub fn normalize_csl_date(date: &Value) -> Option<String> {
    DateParts::from_csl_date(date).map(|parts| parts.to_iso_string())
}

/// Integer coercion for a single component.
///
/// Integers pass through, finite floats truncate toward zero and strings are
/// parsed after trimming. Null, booleans, arrays and objects are rejected.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

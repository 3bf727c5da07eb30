//! Collection filters and the property predicate mini-language.
//!
//! Filters on facility tables are written as short strings such as
//! `STATE != 'HI'` or `STATE == 'AK'`. [`PropertyPredicate`] parses those
//! strings once and can both build the remote [`Filter`] and evaluate the
//! same condition against local properties.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde_json::Value;
use thiserror::Error;

use super::feature::Geometry;
use super::graph::Expr;

/// Remote filter expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter(Expr);

impl Filter {
    pub fn expr(&self) -> &Expr {
        &self.0
    }

    /// `property == value`
    pub fn eq(property: &str, value: impl Into<Expr>) -> Self {
        Self(
            Expr::call("Filter.equals")
                .arg("leftField", property)
                .arg("rightValue", value)
                .build(),
        )
    }

    /// `property != value`
    pub fn neq(property: &str, value: impl Into<Expr>) -> Self {
        Self::eq(property, value).not()
    }

    pub fn not(self) -> Self {
        Self(Expr::call("Filter.not").arg("filter", self.0).build())
    }

    /// Logical AND of all given filters.
    pub fn and(filters: Vec<Filter>) -> Self {
        Self(
            Expr::call("Filter.and")
                .arg("filters", Expr::Array(filters.into_iter().map(|f| f.0).collect()))
                .build(),
        )
    }

    /// Keeps elements whose listed properties are all non-null.
    pub fn not_null(properties: &[&str]) -> Self {
        Self(
            Expr::call("Filter.notNull")
                .arg("properties", Expr::strings(properties.iter().copied()))
                .build(),
        )
    }

    /// Calendar field range, inclusive on both ends (e.g. months 6..=8).
    pub fn calendar_range(start: u32, end: u32, field: &str) -> Self {
        Self(
            Expr::call("Filter.calendarRange")
                .arg("start", i64::from(start))
                .arg("end", i64::from(end))
                .arg("field", field)
                .build(),
        )
    }

    /// `system:time_start` within `[start, end)`; dates are `YYYY-MM-DD`.
    pub fn date_range(start: &str, end: &str) -> Self {
        let range = Expr::call("DateRange")
            .arg("start", Expr::call("Date").arg("value", start).build())
            .arg("end", Expr::call("Date").arg("value", end).build())
            .build();
        Self(
            Expr::call("Filter.dateRangeContains")
                .arg("leftValue", range)
                .arg("rightField", "system:time_start")
                .build(),
        )
    }

    /// Elements whose footprint intersects `geometry`.
    pub fn bounds(geometry: &Geometry) -> Self {
        Self(
            Expr::call("Filter.intersects")
                .arg("leftField", ".all")
                .arg("rightValue", geometry.expr().clone())
                .build(),
        )
    }
}

/// Errors parsing a property predicate string.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PredicateError {
    #[error("Missing comparison operator in '{0}'")]
    MissingOperator(String),

    #[error("Empty property name in '{0}'")]
    EmptyProperty(String),

    #[error("Invalid value '{0}': expected a quoted string or a number")]
    InvalidValue(String),
}

/// Comparison operator in a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredicateOp {
    Eq,
    Neq,
}

impl fmt::Display for PredicateOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredicateOp::Eq => write!(f, "=="),
            PredicateOp::Neq => write!(f, "!="),
        }
    }
}

/// A parsed `PROPERTY op VALUE` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyPredicate {
    pub property: String,
    pub op: PredicateOp,
    pub value: Value,
}

impl PropertyPredicate {
    /// The equivalent remote filter.
    pub fn to_filter(&self) -> Filter {
        let value = Expr::Constant(self.value.clone());
        match self.op {
            PredicateOp::Eq => Filter::eq(&self.property, value),
            PredicateOp::Neq => Filter::neq(&self.property, value),
        }
    }

    /// Evaluates the predicate against local properties.
    ///
    /// A missing property compares unequal to every value.
    pub fn matches(&self, properties: &BTreeMap<String, Value>) -> bool {
        let equal = properties.get(&self.property) == Some(&self.value);
        match self.op {
            PredicateOp::Eq => equal,
            PredicateOp::Neq => !equal,
        }
    }
}

impl fmt::Display for PropertyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Value::String(s) => write!(f, "{} {} '{}'", self.property, self.op, s),
            other => write!(f, "{} {} {}", self.property, self.op, other),
        }
    }
}

impl FromStr for PropertyPredicate {
    type Err = PredicateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The first operator splits; later ones belong to the value.
        let (idx, op) = [("!=", PredicateOp::Neq), ("==", PredicateOp::Eq)]
            .into_iter()
            .filter_map(|(token, op)| s.find(token).map(|i| (i, op)))
            .min_by_key(|(i, _)| *i)
            .ok_or_else(|| PredicateError::MissingOperator(s.to_string()))?;

        let property = s[..idx].trim();
        if property.is_empty() {
            return Err(PredicateError::EmptyProperty(s.to_string()));
        }

        let raw = s[idx + 2..].trim();
        let value = parse_value(raw)?;

        Ok(Self {
            property: property.to_string(),
            op,
            value,
        })
    }
}

fn parse_value(raw: &str) -> Result<Value, PredicateError> {
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Ok(Value::String(raw[1..raw.len() - 1].to_string()));
        }
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Ok(Value::from(i));
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Ok(Value::from(f)),
        _ => Err(PredicateError::InvalidValue(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(state: &str) -> BTreeMap<String, Value> {
        let mut m = BTreeMap::new();
        m.insert("STATE".to_string(), Value::from(state));
        m
    }

    #[test]
    fn test_parse_not_equal() {
        let p: PropertyPredicate = "STATE != 'HI'".parse().unwrap();
        assert_eq!(p.property, "STATE");
        assert_eq!(p.op, PredicateOp::Neq);
        assert_eq!(p.value, Value::from("HI"));
    }

    #[test]
    fn test_parse_equal_double_quotes() {
        let p: PropertyPredicate = "STATE == \"AK\"".parse().unwrap();
        assert_eq!(p.op, PredicateOp::Eq);
        assert_eq!(p.value, Value::from("AK"));
    }

    #[test]
    fn test_operator_inside_quoted_value() {
        let p: PropertyPredicate = "NAME == 'A!=B'".parse().unwrap();
        assert_eq!(p.property, "NAME");
        assert_eq!(p.op, PredicateOp::Eq);
        assert_eq!(p.value, Value::from("A!=B"));

        let p: PropertyPredicate = "NAME != 'A==B'".parse().unwrap();
        assert_eq!(p.op, PredicateOp::Neq);
        assert_eq!(p.value, Value::from("A==B"));
    }

    #[test]
    fn test_parse_numeric_value() {
        let p: PropertyPredicate = "YEAR == 2016".parse().unwrap();
        assert_eq!(p.value, Value::from(2016));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(
            "STATE 'HI'".parse::<PropertyPredicate>(),
            Err(PredicateError::MissingOperator("STATE 'HI'".to_string()))
        );
        assert!(matches!(
            " == 'HI'".parse::<PropertyPredicate>(),
            Err(PredicateError::EmptyProperty(_))
        ));
        assert!(matches!(
            "STATE == HI".parse::<PropertyPredicate>(),
            Err(PredicateError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_matches_local_properties() {
        let not_hi: PropertyPredicate = "STATE != 'HI'".parse().unwrap();
        assert!(not_hi.matches(&props("CO")));
        assert!(!not_hi.matches(&props("HI")));
        assert!(not_hi.matches(&BTreeMap::new()));

        let ak: PropertyPredicate = "STATE == 'AK'".parse().unwrap();
        assert!(ak.matches(&props("AK")));
        assert!(!ak.matches(&BTreeMap::new()));
    }

    #[test]
    fn test_neq_filter_is_negated_equals() {
        let p: PropertyPredicate = "STATE != 'HI'".parse().unwrap();
        match p.to_filter().expr() {
            Expr::Invocation { function, args } => {
                assert_eq!(function, "Filter.not");
                match &args["filter"] {
                    Expr::Invocation { function, args } => {
                        assert_eq!(function, "Filter.equals");
                        assert_eq!(args["leftField"], Expr::string("STATE"));
                        assert_eq!(args["rightValue"], Expr::string("HI"));
                    }
                    _ => panic!("Expected inner equals"),
                }
            }
            _ => panic!("Expected invocation"),
        }
    }

    #[test]
    fn test_display_round_trips() {
        let p: PropertyPredicate = "STATE != 'HI'".parse().unwrap();
        assert_eq!(p.to_string(), "STATE != 'HI'");
    }
}

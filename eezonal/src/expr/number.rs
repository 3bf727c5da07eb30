//! Scalar helpers: numbers, dictionaries and dates.

use super::graph::Expr;

/// `|left - right|`
pub fn abs_difference(left: Expr, right: impl Into<Expr>) -> Expr {
    let diff = Expr::call("Number.subtract")
        .arg("left", left)
        .arg("right", right)
        .build();
    Expr::call("Number.abs").arg("input", diff).build()
}

/// Formats a date expression, e.g. with `YYYY-MM-dd`.
pub fn format_date(date: Expr, format: &str) -> Expr {
    Expr::call("Date.format")
        .arg("date", date)
        .arg("format", format)
        .build()
}

/// Returns `dictionary` with `key` set to `value`.
pub fn dictionary_set(dictionary: Expr, key: &str, value: Expr) -> Expr {
    Expr::call("Dictionary.set")
        .arg("dictionary", dictionary)
        .arg("key", key)
        .arg("value", value)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abs_difference_nests_subtract() {
        match abs_difference(Expr::constant(5), 3i64) {
            Expr::Invocation { function, args } => {
                assert_eq!(function, "Number.abs");
                match &args["input"] {
                    Expr::Invocation { function, args } => {
                        assert_eq!(function, "Number.subtract");
                        assert_eq!(args["right"], Expr::constant(3));
                    }
                    _ => panic!("Expected subtract"),
                }
            }
            _ => panic!("Expected invocation"),
        }
    }
}

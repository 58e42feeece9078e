//! Custom test assertions
//!
//! Scenarios must not panic: a failed check turns into an `Err` so the runner
//! can record it and move on to the next scenario. `ensure!` and `ensure_eq!`
//! are the non-panicking counterparts of `assert!` / `assert_eq!`.

use std::fmt;

use crate::common::{TestError, TestResult};

/// Custom assertion error with detailed information
#[derive(Debug)]
pub struct AssertionError {
    pub message: String,
    pub expected: String,
    pub actual: String,
}

impl fmt::Display for AssertionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\n  Expected: {}\n  Actual: {}",
            self.message, self.expected, self.actual
        )
    }
}

impl std::error::Error for AssertionError {}

impl AssertionError {
    pub fn new(
        message: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

/// The broker or client library lacks an optional capability
#[derive(Debug)]
pub struct Skipped {
    pub reason: String,
}

impl fmt::Display for Skipped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "skipped: {}", self.reason)
    }
}

impl std::error::Error for Skipped {}

/// Build a skip error
pub fn skip(reason: impl Into<String>) -> TestError {
    Box::new(Skipped {
        reason: reason.into(),
    })
}

/// Reason text when `err` is a skip rather than a failure
pub fn skip_reason(err: &TestError) -> Option<&str> {
    err.downcast_ref::<Skipped>().map(|s| s.reason.as_str())
}

/// Return an `AssertionError` from the enclosing function unless `cond` holds
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)+) => {
        if !$cond {
            return Err($crate::assertions::AssertionError::new(
                format!($($msg)+),
                "true",
                stringify!($cond),
            )
            .into());
        }
    };
}

/// Return an `AssertionError` from the enclosing function unless both sides are equal
#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr, $($msg:tt)+) => {
        match (&$left, &$right) {
            (left, right) => {
                if left != right {
                    return Err($crate::assertions::AssertionError::new(
                        format!($($msg)+),
                        format!("{:?}", right),
                        format!("{:?}", left),
                    )
                    .into());
                }
            }
        }
    };
}

/// Check that offsets are strictly increasing
pub fn assert_offsets_increasing(offsets: &[i64]) -> TestResult {
    if let Some(pair) = offsets.windows(2).find(|w| w[1] <= w[0]) {
        return Err(AssertionError::new(
            "Offsets are not strictly increasing",
            format!("{} > {}", pair[1], pair[0]),
            format!("{:?}", offsets),
        )
        .into());
    }
    Ok(())
}

/// Check that a partition/offset pair returned by a delivery is valid
pub fn assert_valid_delivery(partition: i32, offset: i64) -> TestResult {
    ensure!(partition >= 0, "Delivery reported negative partition {}", partition);
    ensure!(offset >= 0, "Delivery reported negative offset {}", offset);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_positive(n: i32) -> TestResult {
        ensure!(n > 0, "{} is not positive", n);
        Ok(())
    }

    fn check_equal(a: &str, b: &str) -> TestResult {
        ensure_eq!(a, b, "values differ");
        Ok(())
    }

    #[test]
    fn test_ensure() {
        assert!(check_positive(1).is_ok());
        let err = check_positive(-1).unwrap_err();
        let assertion = err.downcast_ref::<AssertionError>().unwrap();
        assert_eq!(assertion.message, "-1 is not positive");
        assert_eq!(assertion.actual, "n > 0");
    }

    #[test]
    fn test_ensure_eq() {
        assert!(check_equal("a", "a").is_ok());
        let err = check_equal("a", "b").unwrap_err();
        let assertion = err.downcast_ref::<AssertionError>().unwrap();
        assert_eq!(assertion.expected, "\"b\"");
        assert_eq!(assertion.actual, "\"a\"");
    }

    #[test]
    fn test_skip_detection() {
        let err = skip("cooperative-sticky needs librdkafka 1.6");
        assert_eq!(skip_reason(&err), Some("cooperative-sticky needs librdkafka 1.6"));

        let failure: TestError = AssertionError::new("m", "e", "a").into();
        assert_eq!(skip_reason(&failure), None);
    }

    #[test]
    fn test_offsets_increasing() {
        assert!(assert_offsets_increasing(&[0, 1, 5]).is_ok());
        assert!(assert_offsets_increasing(&[0, 1, 1]).is_err());
        assert!(assert_offsets_increasing(&[]).is_ok());
    }

    #[test]
    fn test_valid_delivery() {
        assert!(assert_valid_delivery(0, 0).is_ok());
        assert!(assert_valid_delivery(-1, 3).is_err());
    }
}

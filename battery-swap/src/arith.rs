//! Checked arithmetic for counters and wallets
//!
//! Integer overflow is detected from operand and result signs, computed with
//! wrapping arithmetic. Floating point overflow shows up as a non-finite
//! result. Both fail with [`Error::ArithmeticOverflow`] instead of wrapping
//! or saturating to infinity.

use crate::{Error, Result};

/// `a + b` over `i64`
pub fn add(a: i64, b: i64) -> Result<i64> {
    let sum = a.wrapping_add(b);
    // Same-sign operands must produce a result of that sign
    if (a >= 0) == (b >= 0) && (sum >= 0) != (a >= 0) {
        return Err(Error::ArithmeticOverflow(format!(
            "addition overflow {} + {}",
            a, b
        )));
    }
    Ok(sum)
}

/// `a - b` over `i64`
pub fn sub(a: i64, b: i64) -> Result<i64> {
    let diff = a.wrapping_sub(b);
    if (a >= 0) != (b >= 0) && (diff >= 0) != (a >= 0) {
        return Err(Error::ArithmeticOverflow(format!(
            "subtraction overflow {} - {}",
            a, b
        )));
    }
    Ok(diff)
}

/// `a + b` over `f64`
pub fn add_float(a: f64, b: f64) -> Result<f64> {
    finite(a + b, || format!("addition overflow {} + {}", a, b), a, b)
}

/// `a - b` over `f64`
pub fn sub_float(a: f64, b: f64) -> Result<f64> {
    finite(a - b, || format!("subtraction overflow {} - {}", a, b), a, b)
}

fn finite(result: f64, describe: impl FnOnce() -> String, a: f64, b: f64) -> Result<f64> {
    if a.is_finite() && b.is_finite() && result.is_finite() {
        Ok(result)
    } else {
        Err(Error::ArithmeticOverflow(describe()))
    }
}

/// Apply a signed delta to a named counter
///
/// Only overflow is rejected. A counter may go negative when a transition
/// moves a battery out of a bucket it was never counted in.
pub fn adjust_counter(value: i64, delta: i64, name: &str) -> Result<i64> {
    add(value, delta).map_err(|_| {
        Error::ArithmeticOverflow(format!("{} overflow ({} {:+})", name, value, delta))
    })
}

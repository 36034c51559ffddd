//! Descriptive statistics over decimal columns.

use rust_decimal::{Decimal, MathematicalOps};

use super::reporting_model::ColumnStats;
use crate::constants::RECORD_DECIMAL_PRECISION;

pub fn column_stats(column: &str, values: &[Decimal]) -> ColumnStats {
    let mut sorted = values.to_vec();
    sorted.sort();

    let mean = mean(values);
    ColumnStats {
        column: column.to_string(),
        count: values.len(),
        min: sorted.first().copied(),
        max: sorted.last().copied(),
        mean: mean.map(round),
        median: median(&sorted).map(round),
        std: mean.and_then(|m| sample_std(values, m)).map(round),
    }
}

pub fn sum(values: &[Decimal]) -> Option<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| acc.checked_add(*v))
}

pub fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    sum(values)?.checked_div(Decimal::from(values.len()))
}

/// Median of an already sorted slice.
fn median(sorted: &[Decimal]) -> Option<Decimal> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    if n % 2 == 1 {
        Some(sorted[n / 2])
    } else {
        (sorted[n / 2 - 1].checked_add(sorted[n / 2]))?.checked_div(Decimal::TWO)
    }
}

fn sample_std(values: &[Decimal], mean: Decimal) -> Option<Decimal> {
    if values.len() < 2 {
        return None;
    }
    let squares = values.iter().try_fold(Decimal::ZERO, |acc, v| {
        let diff = v.checked_sub(mean)?;
        acc.checked_add(diff.checked_mul(diff)?)
    })?;
    squares
        .checked_div(Decimal::from(values.len() - 1))?
        .sqrt()
}

fn round(value: Decimal) -> Decimal {
    value.round_dp(RECORD_DECIMAL_PRECISION).normalize()
}

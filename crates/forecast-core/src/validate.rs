//! Invariant checks for normalized parameters and engine output.

use crate::outcome::SimulationResult;
use crate::params::*;
use thiserror::Error;

/// Validation errors for forecast invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Horizon outside [1, 120].
    #[error("horizon of {0} months is outside [1, 120]")]
    HorizonOutOfRange(u32),
    /// Numeric field must be finite.
    #[error("{0} is not finite")]
    NonFinite(&'static str),
    /// Quantities, prices and costs must be non-negative.
    #[error("{0} is negative")]
    Negative(&'static str),
    /// Compound growth rate outside [0, 10].
    #[error("monthly growth rate {0} is outside [0, 10]")]
    GrowthRateOutOfRange(f64),
    /// Ratio or penetration outside [0, 1].
    #[error("{0} is outside [0, 1]")]
    ShareOutOfRange(&'static str),
    /// Segment ratios must sum to 1.
    #[error("segment ratios sum to {0}, expected 1")]
    RatioSum(f64),
    /// One row per month of the horizon.
    #[error("expected {expected} rows, found {actual}")]
    RowCount { expected: u32, actual: usize },
    /// Rows must be numbered 1..=N in order.
    #[error("row {position} carries month {month}")]
    MonthOutOfSequence { position: usize, month: u32 },
    /// Cumulative columns must equal the running sum of the monthly ones.
    #[error("cumulative totals do not add up at month {0}")]
    CumulativeMismatch(u32),
    /// Summary totals must equal the last row's cumulative values.
    #[error("summary totals disagree with the last row")]
    SummaryMismatch,
}

fn finite_non_negative(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFinite(field));
    }
    if value < 0.0 {
        return Err(ValidationError::Negative(field));
    }
    Ok(())
}

fn share(value: f64, field: &'static str) -> Result<(), ValidationError> {
    finite_non_negative(value, field)?;
    if value > 1.0 {
        return Err(ValidationError::ShareOutOfRange(field));
    }
    Ok(())
}

/// Validate normalized parameters.
pub fn validate_parameters(p: &NormalizedParameters) -> Result<(), ValidationError> {
    if !(MIN_HORIZON_MONTHS..=MAX_HORIZON_MONTHS).contains(&p.horizon_months) {
        return Err(ValidationError::HorizonOutOfRange(p.horizon_months));
    }
    if let GrowthModel::CompoundRate {
        monthly_growth_rate,
        ..
    } = p.growth_model
    {
        finite_non_negative(monthly_growth_rate, "monthly growth rate")?;
        if monthly_growth_rate > MAX_MONTHLY_GROWTH_RATE {
            return Err(ValidationError::GrowthRateOutOfRange(monthly_growth_rate));
        }
    }
    finite_non_negative(p.free_policy.free_uses_per_user_per_month, "free uses")?;

    let mut ratio_sum = 0.0;
    for s in &p.usage_segments {
        // ratios within tolerance of a full split are kept as submitted
        finite_non_negative(s.ratio, "segment ratio")?;
        if s.ratio > 1.0 + RATIO_SUM_TOLERANCE {
            return Err(ValidationError::ShareOutOfRange("segment ratio"));
        }
        finite_non_negative(s.extra_paid_uses_per_user_per_month, "extra paid uses")?;
        ratio_sum += s.ratio;
    }
    if (ratio_sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
        return Err(ValidationError::RatioSum(ratio_sum));
    }

    match p.monetization_model {
        MonetizationModel::PerUse { price_per_paid_use } => {
            finite_non_negative(price_per_paid_use, "price per paid use")?
        }
        MonetizationModel::Subscription {
            price_per_user_per_month,
            penetration_rate,
            included_uses_per_subscriber_per_month,
        } => {
            finite_non_negative(price_per_user_per_month, "subscription price")?;
            share(penetration_rate, "penetration rate")?;
            finite_non_negative(included_uses_per_subscriber_per_month, "included uses")?;
        }
        MonetizationModel::Lifetime {
            one_time_price_per_user,
        } => finite_non_negative(one_time_price_per_user, "one-time price")?,
    }

    finite_non_negative(p.cost_model.fixed_cost_per_month, "fixed cost")?;
    finite_non_negative(p.cost_model.cost_per_use, "cost per use")?;
    Ok(())
}

/// Validate a result: parameters, row sequence, cumulative chain and summary.
pub fn validate_result(r: &SimulationResult) -> Result<(), ValidationError> {
    validate_parameters(&r.normalized_parameters)?;
    let expected = r.normalized_parameters.horizon_months;
    if r.rows.len() != expected as usize {
        return Err(ValidationError::RowCount {
            expected,
            actual: r.rows.len(),
        });
    }

    let mut prev: Option<&crate::MonthRow> = None;
    for (position, row) in r.rows.iter().enumerate() {
        if row.month as usize != position + 1 {
            return Err(ValidationError::MonthOutOfSequence {
                position,
                month: row.month,
            });
        }
        let (rev, cost, profit) = match prev {
            Some(p) => (
                p.cumulative_revenue.saturating_add(row.revenue),
                p.cumulative_cost.saturating_add(row.total_cost),
                p.cumulative_profit.saturating_add(row.profit),
            ),
            None => (row.revenue, row.total_cost, row.profit),
        };
        if rev != row.cumulative_revenue
            || cost != row.cumulative_cost
            || profit != row.cumulative_profit
        {
            return Err(ValidationError::CumulativeMismatch(row.month));
        }
        prev = Some(row);
    }

    if let Some(last) = prev {
        if last.cumulative_revenue != r.summary.total_revenue
            || last.cumulative_cost != r.summary.total_cost
            || last.cumulative_profit != r.summary.total_profit
        {
            return Err(ValidationError::SummaryMismatch);
        }
    }
    Ok(())
}

//! Post-projection risk checks and final flag ordering.

use crate::project::Projection;
use forecast_core::*;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Free-quota cost share of variable cost above which free usage dominates.
pub const FREE_COST_DOMINANCE_THRESHOLD: f64 = 0.5;

/// First month whose cumulative profit is non-negative.
pub fn break_even_month(rows: &[MonthRow]) -> Option<u32> {
    rows.iter()
        .find(|r| r.cumulative_profit >= Decimal::ZERO)
        .map(|r| r.month)
}

/// Share of variable cost spent on free-quota uses; `None` without any
/// variable cost.
pub fn free_cost_share(projection: &Projection) -> Option<f64> {
    (projection.variable_cost > 0.0)
        .then(|| projection.free_variable_cost / projection.variable_cost)
}

/// Checks that need the whole series. Returns new flags only.
pub fn evaluate(params: &NormalizedParameters, projection: &Projection) -> Vec<RiskFlag> {
    let months = params.horizon_months;
    let mut flags = Vec::new();

    if projection.rows.iter().all(|r| r.profit < Decimal::ZERO) {
        flags.push(RiskFlag::critical(
            RiskCode::NegativeProfitAllYear,
            format!("Profit is negative in every month ({months} months)."),
        ));
    }

    if break_even_month(&projection.rows).is_none() {
        flags.push(RiskFlag::warning(
            RiskCode::BreakEvenNotReached,
            format!("Break-even not reached within {months} months."),
        ));
    }

    if let Some(share) = free_cost_share(projection) {
        if share > FREE_COST_DOMINANCE_THRESHOLD {
            flags.push(RiskFlag::warning(
                RiskCode::FreeCostDominant,
                format!(
                    "Free usage drives {:.0}% of variable cost. \
                     Consider lowering the free quota or the cost per use.",
                    share * 100.0
                ),
            ));
        }
    }

    flags
}

/// Drop repeated `(code, message)` pairs, keeping the first, then order by
/// severity. The sort is stable so equal severities keep emission order.
pub fn finalize(mut flags: Vec<RiskFlag>) -> Vec<RiskFlag> {
    let mut seen = HashSet::new();
    flags.retain(|f| seen.insert((f.code, f.message.clone())));
    flags.sort_by_key(|f| f.severity);
    flags
}

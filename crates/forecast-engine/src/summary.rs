//! Summary assembly over projected rows.

use crate::risk::break_even_month;
use forecast_core::{round_cents, MonthRow, Summary};
use rust_decimal::Decimal;

/// Totals come from the last row's cumulative columns.
pub fn summarize(rows: &[MonthRow]) -> Summary {
    let (total_revenue, total_cost, total_profit) = rows
        .last()
        .map(|r| (r.cumulative_revenue, r.cumulative_cost, r.cumulative_profit))
        .unwrap_or_default();

    let user_months = rows.iter().fold(0u64, |acc, r| acc.saturating_add(r.users));
    let per_user_month = |total: Decimal| -> Decimal {
        let average = match user_months {
            0 => None,
            n => total.checked_div(Decimal::from(n)),
        };
        round_cents(average.unwrap_or(Decimal::ZERO))
    };

    Summary {
        total_revenue,
        total_cost,
        total_profit,
        break_even_month: break_even_month(rows),
        avg_revenue_per_user_per_month: per_user_month(total_revenue),
        avg_cost_per_user_per_month: per_user_month(total_cost),
    }
}

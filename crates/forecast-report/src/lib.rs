#![deny(warnings)]

//! Presentation-side views over a forecast result.
//!
//! Everything here is derived from a finished [`SimulationResult`]: usage
//! totals, cost breakdown, per-user unit economics and chart series, plus the
//! text and JSON renderers used by the CLI. Divisions by zero fall back to
//! zero or to "not reachable" rather than failing.

pub mod render;

use forecast_core::{round_cents, round_money, MonthRow, SimulationResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

pub use render::{month_label, parse_start_month, render, render_json, render_text, OutputFormat};

/// Errors produced while rendering a report.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("unknown output format '{0}' (expected 'table' or 'json')")]
    UnknownFormat(String),
    #[error("invalid start month '{0}' (expected YYYY-MM)")]
    InvalidStartMonth(String),
    #[error("month {0} is past the end of the calendar")]
    CalendarOverflow(u32),
    #[error(transparent)]
    Fmt(#[from] std::fmt::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Usage summed over every projected month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageTotals {
    pub total_uses: u64,
    pub free_uses: u64,
    pub included_uses: u64,
    pub paid_uses: u64,
    /// Sum of monthly active users over the horizon.
    pub user_months: u64,
}

impl UsageTotals {
    pub fn from_rows(rows: &[MonthRow]) -> Self {
        rows.iter().fold(Self::default(), |acc, r| Self {
            total_uses: acc.total_uses.saturating_add(r.total_uses),
            free_uses: acc.free_uses.saturating_add(r.free_uses),
            included_uses: acc.included_uses.saturating_add(r.included_uses),
            paid_uses: acc.paid_uses.saturating_add(r.paid_uses),
            user_months: acc.user_months.saturating_add(r.users),
        })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub fixed_cost_total: Decimal,
    pub variable_cost_total: Decimal,
    pub free_usage_cost: Decimal,
    pub included_usage_cost: Decimal,
    /// Free usage cost over variable cost; 0 without variable cost.
    pub free_share_of_variable_cost: f64,
}

impl CostBreakdown {
    pub fn new(result: &SimulationResult, usage: &UsageTotals) -> Self {
        let cost_per_use = result.normalized_parameters.cost_model.cost_per_use;
        let (fixed_cost_total, variable_cost_total) = result.rows.iter().fold(
            (Decimal::ZERO, Decimal::ZERO),
            |(fixed, variable), r| {
                (
                    fixed.saturating_add(r.fixed_cost),
                    variable.saturating_add(r.variable_cost),
                )
            },
        );
        let free_usage_cost = round_money(usage.free_uses as f64 * cost_per_use);
        let free_share_of_variable_cost = if variable_cost_total > Decimal::ZERO {
            free_usage_cost
                .checked_div(variable_cost_total)
                .and_then(|share| share.to_f64())
                .unwrap_or(0.0)
        } else {
            0.0
        };
        Self {
            fixed_cost_total,
            variable_cost_total,
            free_usage_cost,
            included_usage_cost: round_money(usage.included_uses as f64 * cost_per_use),
            free_share_of_variable_cost,
        }
    }
}

/// Per active user-month economics.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitEconomics {
    pub avg_revenue_per_user_month: Decimal,
    pub avg_variable_cost_per_user_month: Decimal,
    pub contribution_margin_per_user_month: Decimal,
    /// Monthly active users needed to cover the fixed cost; `None` when the
    /// contribution margin is not positive.
    pub break_even_mau: Option<u64>,
}

impl UnitEconomics {
    pub fn new(result: &SimulationResult, usage: &UsageTotals, costs: &CostBreakdown) -> Self {
        let per_user_month = |total: Decimal| -> Decimal {
            if usage.user_months == 0 {
                return Decimal::ZERO;
            }
            total
                .checked_div(Decimal::from(usage.user_months))
                .unwrap_or(Decimal::ZERO)
        };
        let revenue = per_user_month(result.summary.total_revenue);
        let variable = per_user_month(costs.variable_cost_total);
        let contribution = revenue.saturating_sub(variable);

        let fixed_per_month = round_money(
            result
                .normalized_parameters
                .cost_model
                .fixed_cost_per_month,
        );
        let break_even_mau = if contribution > Decimal::ZERO {
            fixed_per_month
                .checked_div(contribution)
                .and_then(|users| users.ceil().to_u64())
        } else {
            None
        };

        Self {
            avg_revenue_per_user_month: round_cents(revenue),
            avg_variable_cost_per_user_month: round_cents(variable),
            contribution_margin_per_user_month: round_cents(contribution),
            break_even_mau,
        }
    }
}

/// One chart point: a month and the two values plotted against each other.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub month: u32,
    pub first: Decimal,
    pub second: Decimal,
}

/// The two chart pairs shown next to the table.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartSeries {
    /// Monthly revenue against monthly total cost.
    pub revenue_vs_cost: Vec<SeriesPoint>,
    /// Monthly profit against cumulative profit.
    pub profit_vs_cumulative: Vec<SeriesPoint>,
}

impl ChartSeries {
    pub fn from_rows(rows: &[MonthRow]) -> Self {
        let point = |month, first, second| SeriesPoint {
            month,
            first,
            second,
        };
        Self {
            revenue_vs_cost: rows
                .iter()
                .map(|r| point(r.month, r.revenue, r.total_cost))
                .collect(),
            profit_vs_cumulative: rows
                .iter()
                .map(|r| point(r.month, r.profit, r.cumulative_profit))
                .collect(),
        }
    }
}

/// All derived views for one result.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub usage: UsageTotals,
    pub costs: CostBreakdown,
    pub unit_economics: UnitEconomics,
}

impl Insights {
    pub fn from_result(result: &SimulationResult) -> Self {
        let usage = UsageTotals::from_rows(&result.rows);
        let costs = CostBreakdown::new(result, &usage);
        let unit_economics = UnitEconomics::new(result, &usage, &costs);
        Self {
            usage,
            costs,
            unit_economics,
        }
    }

    /// Whether free usage is the main driver of variable cost.
    pub fn free_usage_dominates(&self) -> bool {
        self.costs.free_share_of_variable_cost >= 0.5
    }
}

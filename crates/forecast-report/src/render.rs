//! Text and JSON renderers.

use crate::{ChartSeries, Insights, ReportError};
use chrono::{Datelike, Months, NaiveDate};
use forecast_core::*;
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

impl FromStr for OutputFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "table" | "text" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(ReportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Parse `YYYY-MM` into the first day of that month.
pub fn parse_start_month(s: &str) -> Result<NaiveDate, ReportError> {
    let invalid = || ReportError::InvalidStartMonth(s.to_string());
    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

/// Label for a 1-based month: `YYYY-MM` from `start`, or `M<n>` without one.
pub fn month_label(start: Option<NaiveDate>, month: u32) -> Result<String, ReportError> {
    let Some(start) = start else {
        return Ok(format!("M{month}"));
    };
    let date = start
        .checked_add_months(Months::new(month.saturating_sub(1)))
        .ok_or(ReportError::CalendarOverflow(month))?;
    Ok(format!("{:04}-{:02}", date.year(), date.month()))
}

pub fn render(
    result: &SimulationResult,
    format: OutputFormat,
    start: Option<NaiveDate>,
) -> Result<String, ReportError> {
    match format {
        OutputFormat::Table => render_text(result, start),
        OutputFormat::Json => render_json(result),
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    #[serde(flatten)]
    result: &'a SimulationResult,
    insights: Insights,
    charts: ChartSeries,
}

/// The result with derived insights and chart series alongside.
pub fn render_json(result: &SimulationResult) -> Result<String, ReportError> {
    let report = JsonReport {
        result,
        insights: Insights::from_result(result),
        charts: ChartSeries::from_rows(&result.rows),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn describe_growth(growth: &GrowthModel) -> String {
    match *growth {
        GrowthModel::Linear {
            initial_users,
            monthly_increase,
        } => format!("linear, initial MAU {initial_users}, +{monthly_increase} per month"),
        GrowthModel::CompoundRate {
            initial_users,
            monthly_growth_rate,
        } => format!(
            "compound, initial MAU {initial_users}, {:.1}% per month",
            monthly_growth_rate * 100.0
        ),
    }
}

fn describe_monetization(model: &MonetizationModel) -> String {
    match *model {
        MonetizationModel::PerUse { price_per_paid_use } => {
            format!("per use, {price_per_paid_use} per paid use")
        }
        MonetizationModel::Subscription {
            price_per_user_per_month,
            penetration_rate,
            included_uses_per_subscriber_per_month,
        } => format!(
            "subscription, {price_per_user_per_month} per subscriber per month, \
             {:.1}% penetration, {included_uses_per_subscriber_per_month} included uses",
            penetration_rate * 100.0
        ),
        MonetizationModel::Lifetime {
            one_time_price_per_user,
        } => format!("lifetime, {one_time_price_per_user} once per user in month 1"),
    }
}

fn write_assumptions(out: &mut String, p: &NormalizedParameters) -> std::fmt::Result {
    writeln!(out, "Assumptions")?;
    writeln!(out, "  Months: {}", p.horizon_months)?;
    writeln!(out, "  Growth: {}", describe_growth(&p.growth_model))?;
    writeln!(
        out,
        "  Free uses per user per month: {}",
        p.free_policy.free_uses_per_user_per_month
    )?;
    for s in &p.usage_segments {
        writeln!(
            out,
            "  Segment {:<5} {:>5.1}% of users, {} paid uses per user",
            s.name.as_str(),
            s.ratio * 100.0,
            s.extra_paid_uses_per_user_per_month
        )?;
    }
    writeln!(
        out,
        "  Monetization: {}",
        describe_monetization(&p.monetization_model)
    )?;
    writeln!(
        out,
        "  Costs: fixed {} per month, {} per use",
        p.cost_model.fixed_cost_per_month, p.cost_model.cost_per_use
    )
}

fn write_table(
    out: &mut String,
    rows: &[MonthRow],
    start: Option<NaiveDate>,
) -> Result<(), ReportError> {
    writeln!(
        out,
        "{:<8} {:>10} {:>10} {:>10} {:>10} {:>14} {:>14} {:>14} {:>16}",
        "Month", "Users", "Free", "Included", "Paid", "Revenue", "Cost", "Profit", "Cum. profit"
    )?;
    for r in rows {
        writeln!(
            out,
            "{:<8} {:>10} {:>10} {:>10} {:>10} {:>14} {:>14} {:>14} {:>16}",
            month_label(start, r.month)?,
            r.users,
            r.free_uses,
            r.included_uses,
            r.paid_uses,
            r.revenue,
            r.total_cost,
            r.profit,
            r.cumulative_profit
        )?;
    }
    Ok(())
}

/// Human-readable report: assumptions, monthly table, summary, cost
/// breakdown, unit economics, modeling notes and risks.
pub fn render_text(result: &SimulationResult, start: Option<NaiveDate>) -> Result<String, ReportError> {
    let p = &result.normalized_parameters;
    let s = &result.summary;
    let insights = Insights::from_result(result);
    let mut out = String::new();

    write_assumptions(&mut out, p)?;
    writeln!(out)?;
    write_table(&mut out, &result.rows, start)?;
    writeln!(out)?;

    writeln!(out, "Summary")?;
    writeln!(out, "  Total revenue: {}", s.total_revenue)?;
    writeln!(out, "  Total cost:    {}", s.total_cost)?;
    writeln!(out, "  Total profit:  {}", s.total_profit)?;
    match s.break_even_month {
        Some(month) => writeln!(
            out,
            "  Break-even reached in month {month} ({})",
            month_label(start, month)?
        )?,
        None => writeln!(out, "  Break-even not reached within the simulated period")?,
    }
    writeln!(
        out,
        "  Avg revenue per user / month: {}",
        s.avg_revenue_per_user_per_month
    )?;
    writeln!(
        out,
        "  Avg cost per user / month:    {}",
        s.avg_cost_per_user_per_month
    )?;
    writeln!(out)?;

    let u = &insights.usage;
    let c = &insights.costs;
    writeln!(out, "Cost breakdown")?;
    writeln!(
        out,
        "  Fixed cost ({} months): {}",
        p.horizon_months, c.fixed_cost_total
    )?;
    writeln!(
        out,
        "  Usage: {} total ({} free, {} included, {} paid)",
        u.total_uses, u.free_uses, u.included_uses, u.paid_uses
    )?;
    writeln!(
        out,
        "  Free usage cost: {} ({:.0}% of variable cost){}",
        c.free_usage_cost,
        c.free_share_of_variable_cost * 100.0,
        if insights.free_usage_dominates() {
            ", the dominant driver of variable cost"
        } else {
            ""
        }
    )?;
    writeln!(out, "  Included usage cost: {}", c.included_usage_cost)?;
    writeln!(out, "  Variable cost: {}", c.variable_cost_total)?;
    writeln!(out)?;

    let e = &insights.unit_economics;
    writeln!(out, "Unit economics (per active user / month)")?;
    writeln!(out, "  Avg revenue:         {}", e.avg_revenue_per_user_month)?;
    writeln!(out, "  Avg variable cost:   {}", e.avg_variable_cost_per_user_month)?;
    writeln!(out, "  Contribution margin: {}", e.contribution_margin_per_user_month)?;
    match e.break_even_mau {
        Some(mau) => writeln!(out, "  Break-even MAU:      {mau}")?,
        None => writeln!(out, "  Break-even MAU:      not reachable")?,
    }
    writeln!(out)?;

    writeln!(out, "Notes")?;
    writeln!(
        out,
        "  - Every active user gets {} free uses per month, whatever the segment.",
        p.free_policy.free_uses_per_user_per_month
    )?;
    if let MonetizationModel::Subscription { .. } = p.monetization_model {
        writeln!(out, "  - Included uses are assumed fully used by subscribers.")?;
    }
    writeln!(
        out,
        "  - Break-even is the first month where cumulative profit >= 0."
    )?;
    if p.cost_model.cost_per_use == 0.0 {
        writeln!(
            out,
            "  - Cost per use is 0: usage is modeled as free to serve at any volume."
        )?;
    }
    writeln!(out)?;

    writeln!(out, "Risks")?;
    if result.risks.is_empty() {
        writeln!(out, "  none")?;
    }
    for r in &result.risks {
        writeln!(
            out,
            "  [{}] {}: {}",
            r.severity.as_str(),
            r.code.as_str(),
            r.message
        )?;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_engine::simulate;
    use proptest::prelude::*;

    #[test]
    fn parses_formats() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!(" JSON ".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!(matches!(
            "csv".parse::<OutputFormat>(),
            Err(ReportError::UnknownFormat(_))
        ));
    }

    #[test]
    fn start_month_labels() {
        let start = parse_start_month("2026-11").unwrap();
        assert_eq!(month_label(Some(start), 1).unwrap(), "2026-11");
        assert_eq!(month_label(Some(start), 3).unwrap(), "2027-01");
        assert_eq!(month_label(None, 7).unwrap(), "M7");
        assert!(parse_start_month("2026-13").is_err());
        assert!(parse_start_month("november").is_err());
    }

    #[test]
    fn text_report_has_every_section() {
        let result = simulate(&SimulationParameters::quick_start());
        let text = render_text(&result, None).unwrap();
        for heading in [
            "Assumptions",
            "Summary",
            "Cost breakdown",
            "Unit economics",
            "Notes",
            "Risks",
        ] {
            assert!(text.contains(heading), "missing {heading}");
        }
        assert!(text.contains("M12"));
        assert!(!text.contains("M13"));
        assert!(text.contains("compound, initial MAU 100, 15.0% per month"));
    }

    #[test]
    fn text_report_lists_risks_with_severity() {
        let result = simulate(&SimulationParameters::default());
        let text = render_text(&result, None).unwrap();
        assert!(text.contains("[critical] INVALID_INPUT: Growth model is missing or invalid."));
    }

    #[test]
    fn json_report_embeds_result_and_insights() {
        let result = simulate(&SimulationParameters::quick_start());
        let json: serde_json::Value = serde_json::from_str(&render_json(&result).unwrap()).unwrap();
        assert_eq!(json["rows"].as_array().unwrap().len(), 12);
        assert_eq!(json["normalizedParameters"]["horizonMonths"], 12);
        assert!(json["insights"]["unitEconomics"].is_object());
        assert_eq!(json["charts"]["revenueVsCost"].as_array().unwrap().len(), 12);
    }

    proptest! {
        #[test]
        fn labels_advance_one_month_at_a_time(year in 1970i32..2200, month in 1u32..=12, offset in 1u32..=120) {
            let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
            let label = month_label(Some(start), offset).unwrap();
            let months_since_start = (offset - 1) as i32;
            let total = year * 12 + (month as i32 - 1) + months_since_start;
            prop_assert_eq!(label, format!("{:04}-{:02}", total / 12, total % 12 + 1));
        }
    }
}

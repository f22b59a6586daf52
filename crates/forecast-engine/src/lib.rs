#![deny(warnings)]

//! Launch forecast engine.
//!
//! [`simulate`] is a pure function: it normalizes a raw scenario, projects it
//! month by month, runs the risk checks and returns a fully populated
//! [`SimulationResult`]. It never fails; malformed input is replaced by
//! defaults and reported through the result's risk flags.

pub mod normalize;
pub mod project;
pub mod risk;
pub mod summary;

pub use forecast_core::*;
pub use normalize::{normalize, Normalized};
pub use project::{monthly_usage, project, users_in_month, Projection, Usage};
pub use summary::summarize;

use tracing::debug;

/// Run a scenario end to end.
///
/// Example:
/// let result = simulate(&SimulationParameters::quick_start());
/// assert_eq!(result.rows.len(), 12);
pub fn simulate(params: &SimulationParameters) -> SimulationResult {
    let Normalized {
        parameters,
        mut flags,
    } = normalize(params);
    let projection = project(&parameters);
    let late_flags = risk::evaluate(&parameters, &projection);
    let summary = summarize(&projection.rows);

    let Projection {
        rows,
        flags: monthly_flags,
        ..
    } = projection;
    flags.extend(monthly_flags);
    flags.extend(late_flags);
    let risks = risk::finalize(flags);

    debug!(
        months = parameters.horizon_months,
        total_revenue = %summary.total_revenue,
        total_profit = %summary.total_profit,
        break_even_month = ?summary.break_even_month,
        risks = risks.len(),
        "simulation complete"
    );

    SimulationResult {
        normalized_parameters: parameters,
        rows,
        summary,
        risks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_start_runs_clean_enough() {
        let result = simulate(&SimulationParameters::quick_start());
        assert_eq!(result.rows.len(), 12);
        validate_result(&result).unwrap();
        assert!(!result.has_risk(RiskCode::InvalidInput));
    }

    #[test]
    fn empty_scenario_still_produces_a_result() {
        let result = simulate(&SimulationParameters::default());
        assert_eq!(result.rows.len(), 12);
        validate_result(&result).unwrap();
        assert_eq!(result.risks_with(RiskCode::InvalidInput).count(), 3);
        assert!(result.risks[..3]
            .iter()
            .all(|r| r.severity == Severity::Critical));
    }
}

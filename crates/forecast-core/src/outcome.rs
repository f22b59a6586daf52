//! Engine output: month rows, summary, risk flags.

use crate::params::NormalizedParameters;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One projected month. Currency fields carry two fractional digits.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthRow {
    /// 1-based month index.
    pub month: u32,
    /// Monthly active users.
    pub users: u64,
    pub free_uses: u64,
    pub included_uses: u64,
    pub paid_uses: u64,
    pub total_uses: u64,
    pub revenue: Decimal,
    pub variable_cost: Decimal,
    pub fixed_cost: Decimal,
    pub total_cost: Decimal,
    pub profit: Decimal,
    pub cumulative_revenue: Decimal,
    pub cumulative_cost: Decimal,
    /// Break-even signal: first month where this is >= 0.
    pub cumulative_profit: Decimal,
}

/// Ordered most to least severe; the derived `Ord` is the sort rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskCode {
    InvalidInput,
    #[serde(rename = "RATIO_NOT_100")]
    RatioNot100,
    NegativeProfitAllYear,
    BreakEvenNotReached,
    FreeCostDominant,
    PriceTooLowVsCost,
    SubPenetrationZero,
}

impl RiskCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCode::InvalidInput => "INVALID_INPUT",
            RiskCode::RatioNot100 => "RATIO_NOT_100",
            RiskCode::NegativeProfitAllYear => "NEGATIVE_PROFIT_ALL_YEAR",
            RiskCode::BreakEvenNotReached => "BREAK_EVEN_NOT_REACHED",
            RiskCode::FreeCostDominant => "FREE_COST_DOMINANT",
            RiskCode::PriceTooLowVsCost => "PRICE_TOO_LOW_VS_COST",
            RiskCode::SubPenetrationZero => "SUB_PENETRATION_ZERO",
        }
    }
}

/// Advisory diagnostic about a scenario. Never an error.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlag {
    pub code: RiskCode,
    pub severity: Severity,
    pub message: String,
}

impl RiskFlag {
    pub fn new(code: RiskCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
        }
    }

    pub fn critical(code: RiskCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Critical, message)
    }

    pub fn warning(code: RiskCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    pub fn info(code: RiskCode, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Info, message)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_revenue: Decimal,
    pub total_cost: Decimal,
    pub total_profit: Decimal,
    /// First month with cumulative profit >= 0; `None` if never reached.
    pub break_even_month: Option<u32>,
    pub avg_revenue_per_user_per_month: Decimal,
    pub avg_cost_per_user_per_month: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    /// The parameters the projection actually ran on.
    pub normalized_parameters: NormalizedParameters,
    pub rows: Vec<MonthRow>,
    pub summary: Summary,
    /// Deduplicated, critical first.
    pub risks: Vec<RiskFlag>,
}

impl SimulationResult {
    pub fn has_risk(&self, code: RiskCode) -> bool {
        self.risks.iter().any(|r| r.code == code)
    }

    pub fn risks_with(&self, code: RiskCode) -> impl Iterator<Item = &RiskFlag> {
        self.risks.iter().filter(move |r| r.code == code)
    }
}

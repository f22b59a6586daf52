//! Scenario parameters: the raw shape callers submit and the normalized
//! shape the engine runs on.

use serde::{Deserialize, Serialize};

/// Shortest supported forecast horizon in months.
pub const MIN_HORIZON_MONTHS: u32 = 1;
/// Longest supported forecast horizon in months.
pub const MAX_HORIZON_MONTHS: u32 = 120;
/// Horizon used when the submitted one is missing or not positive.
pub const DEFAULT_HORIZON_MONTHS: u32 = 12;
/// Upper bound on compound monthly growth (10.0 = 1000% per month).
pub const MAX_MONTHLY_GROWTH_RATE: f64 = 10.0;
/// Segment split substituted when the submitted ratios are unusable.
pub const DEFAULT_SEGMENT_SPLIT: [f64; 3] = [0.5, 0.3, 0.2];
/// Ratios whose sum is within this distance of 1.0 are kept as submitted.
pub const RATIO_SUM_TOLERANCE: f64 = 1e-3;

/// Label of a usage cohort. Labels carry no behavior of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentName {
    Free,
    Light,
    Heavy,
}

impl SegmentName {
    /// Positional order of the three cohorts.
    pub const ALL: [SegmentName; 3] = [SegmentName::Free, SegmentName::Light, SegmentName::Heavy];

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentName::Free => "free",
            SegmentName::Light => "light",
            SegmentName::Heavy => "heavy",
        }
    }
}

/// Who receives the monthly free quota. Only one scope exists for now.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreeQuotaScope {
    #[default]
    AllUsers,
}

// ---------------------------------------------------------------------------
// Raw input
// ---------------------------------------------------------------------------

/// A scenario as submitted by the presentation layer.
///
/// Every field is optional and numeric fields may be negative or non-finite;
/// the engine's normalizer decides what each malformed value becomes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimulationParameters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizon_months: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub growth_model: Option<GrowthInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_policy: Option<FreePolicyInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage_segments: Option<Vec<SegmentInput>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monetization_model: Option<MonetizationInput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_model: Option<CostInput>,
}

impl SimulationParameters {
    /// Starting scenario offered to new users: a year of 15% monthly growth
    /// from 100 users, a small free quota and per-use pricing.
    pub fn quick_start() -> Self {
        Self {
            horizon_months: Some(f64::from(DEFAULT_HORIZON_MONTHS)),
            growth_model: Some(GrowthInput::compound(100.0, 0.15)),
            free_policy: Some(FreePolicyInput::quota(3.0)),
            usage_segments: Some(vec![
                SegmentInput::named(SegmentName::Free, 0.5, 0.0),
                SegmentInput::named(SegmentName::Light, 0.3, 5.0),
                SegmentInput::named(SegmentName::Heavy, 0.2, 20.0),
            ]),
            monetization_model: Some(MonetizationInput::per_use(1.0)),
            cost_model: Some(CostInput::new(300.0, 0.05)),
        }
    }
}

/// Growth model as submitted. Unknown `type` tags land in `Unrecognized`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GrowthInput {
    Linear {
        initial_users: Option<f64>,
        monthly_increase: Option<f64>,
    },
    #[serde(rename = "rate")]
    CompoundRate {
        initial_users: Option<f64>,
        monthly_growth_rate: Option<f64>,
    },
    #[serde(other)]
    Unrecognized,
}

impl GrowthInput {
    pub fn linear(initial_users: f64, monthly_increase: f64) -> Self {
        GrowthInput::Linear {
            initial_users: Some(initial_users),
            monthly_increase: Some(monthly_increase),
        }
    }

    pub fn compound(initial_users: f64, monthly_growth_rate: f64) -> Self {
        GrowthInput::CompoundRate {
            initial_users: Some(initial_users),
            monthly_growth_rate: Some(monthly_growth_rate),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FreePolicyInput {
    pub free_uses_per_user_per_month: Option<f64>,
    pub applies_to: Option<FreeQuotaScope>,
}

impl FreePolicyInput {
    pub fn quota(free_uses_per_user_per_month: f64) -> Self {
        Self {
            free_uses_per_user_per_month: Some(free_uses_per_user_per_month),
            applies_to: Some(FreeQuotaScope::AllUsers),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SegmentInput {
    pub name: Option<SegmentName>,
    pub ratio: Option<f64>,
    pub extra_paid_uses_per_user_per_month: Option<f64>,
}

impl SegmentInput {
    /// Unnamed cohort; the normalizer labels it by position.
    pub fn new(ratio: f64, extra_paid_uses_per_user_per_month: f64) -> Self {
        Self {
            name: None,
            ratio: Some(ratio),
            extra_paid_uses_per_user_per_month: Some(extra_paid_uses_per_user_per_month),
        }
    }

    pub fn named(name: SegmentName, ratio: f64, extra_paid_uses_per_user_per_month: f64) -> Self {
        Self {
            name: Some(name),
            ..Self::new(ratio, extra_paid_uses_per_user_per_month)
        }
    }

    /// Three cohorts from a paying share alone: non-payers `{1 - p, 0}`,
    /// payers `{p, uses}` and an empty heavy cohort. `p` is clamped to
    /// [0, 1]; a non-finite share counts as 0.
    ///
    /// Example:
    /// let segments = SegmentInput::simple_split(0.3, 10.0);
    /// assert_eq!(segments[1].ratio, Some(0.3));
    pub fn simple_split(paying_ratio: f64, paid_uses_per_paying_user: f64) -> Vec<SegmentInput> {
        let paying = if paying_ratio.is_finite() {
            paying_ratio.clamp(0.0, 1.0)
        } else {
            0.0
        };
        vec![
            Self::named(SegmentName::Free, 1.0 - paying, 0.0),
            Self::named(SegmentName::Light, paying, paid_uses_per_paying_user),
            Self::named(SegmentName::Heavy, 0.0, 0.0),
        ]
    }
}

/// Paid usage given as one paying share instead of three cohorts.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SimpleUsageInput {
    /// Share of active users who pay, in [0, 1].
    pub paying_user_ratio: Option<f64>,
    pub paid_uses_per_paying_user: Option<f64>,
}

impl SimpleUsageInput {
    /// Expand into the three-cohort form; missing values count as 0.
    pub fn segments(&self) -> Vec<SegmentInput> {
        SegmentInput::simple_split(
            self.paying_user_ratio.unwrap_or(0.0),
            self.paid_uses_per_paying_user.unwrap_or(0.0),
        )
    }
}

/// Monetization model as submitted. Unknown `type` tags land in `Unrecognized`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MonetizationInput {
    PerUse {
        price_per_paid_use: Option<f64>,
    },
    Subscription {
        price_per_user_per_month: Option<f64>,
        penetration_rate: Option<f64>,
        included_uses_per_subscriber_per_month: Option<f64>,
    },
    Lifetime {
        one_time_price_per_user: Option<f64>,
    },
    #[serde(other)]
    Unrecognized,
}

impl MonetizationInput {
    pub fn per_use(price_per_paid_use: f64) -> Self {
        MonetizationInput::PerUse {
            price_per_paid_use: Some(price_per_paid_use),
        }
    }

    pub fn subscription(price: f64, penetration_rate: f64, included_uses: f64) -> Self {
        MonetizationInput::Subscription {
            price_per_user_per_month: Some(price),
            penetration_rate: Some(penetration_rate),
            included_uses_per_subscriber_per_month: Some(included_uses),
        }
    }

    pub fn lifetime(one_time_price_per_user: f64) -> Self {
        MonetizationInput::Lifetime {
            one_time_price_per_user: Some(one_time_price_per_user),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CostInput {
    pub fixed_cost_per_month: Option<f64>,
    pub cost_per_use: Option<f64>,
}

impl CostInput {
    pub fn new(fixed_cost_per_month: f64, cost_per_use: f64) -> Self {
        Self {
            fixed_cost_per_month: Some(fixed_cost_per_month),
            cost_per_use: Some(cost_per_use),
        }
    }
}

// ---------------------------------------------------------------------------
// Normalized parameters
// ---------------------------------------------------------------------------

/// How the monthly active user count evolves.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum GrowthModel {
    /// `initial + (month - 1) * increase`
    Linear {
        initial_users: u64,
        monthly_increase: u64,
    },
    /// `initial * (1 + rate)^(month - 1)`, rate in [0, 10].
    #[serde(rename = "rate")]
    CompoundRate {
        initial_users: u64,
        monthly_growth_rate: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FreePolicy {
    /// Free uses granted to every active user each month (>= 0).
    pub free_uses_per_user_per_month: f64,
    pub applies_to: FreeQuotaScope,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSegment {
    pub name: SegmentName,
    /// Population share in [0, 1]; the three shares sum to 1.
    pub ratio: f64,
    /// Paid uses per user per month beyond the free quota (>= 0).
    pub extra_paid_uses_per_user_per_month: f64,
}

/// How usage turns into revenue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum MonetizationModel {
    PerUse {
        price_per_paid_use: f64,
    },
    Subscription {
        price_per_user_per_month: f64,
        /// Share of active users who subscribe, in [0, 1].
        penetration_rate: f64,
        included_uses_per_subscriber_per_month: f64,
    },
    /// One-time purchase, recognized in month 1 only.
    Lifetime {
        one_time_price_per_user: f64,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostModel {
    pub fixed_cost_per_month: f64,
    /// Applied to every use: free, included and paid alike.
    pub cost_per_use: f64,
}

/// Fully populated, finite, in-range parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedParameters {
    pub horizon_months: u32,
    pub growth_model: GrowthModel,
    pub free_policy: FreePolicy,
    pub usage_segments: [UsageSegment; 3],
    pub monetization_model: MonetizationModel,
    pub cost_model: CostModel,
}

impl From<&NormalizedParameters> for SimulationParameters {
    fn from(p: &NormalizedParameters) -> Self {
        let growth_model = match p.growth_model {
            GrowthModel::Linear {
                initial_users,
                monthly_increase,
            } => GrowthInput::linear(initial_users as f64, monthly_increase as f64),
            GrowthModel::CompoundRate {
                initial_users,
                monthly_growth_rate,
            } => GrowthInput::compound(initial_users as f64, monthly_growth_rate),
        };
        let monetization_model = match p.monetization_model {
            MonetizationModel::PerUse { price_per_paid_use } => {
                MonetizationInput::per_use(price_per_paid_use)
            }
            MonetizationModel::Subscription {
                price_per_user_per_month,
                penetration_rate,
                included_uses_per_subscriber_per_month,
            } => MonetizationInput::subscription(
                price_per_user_per_month,
                penetration_rate,
                included_uses_per_subscriber_per_month,
            ),
            MonetizationModel::Lifetime {
                one_time_price_per_user,
            } => MonetizationInput::lifetime(one_time_price_per_user),
        };
        Self {
            horizon_months: Some(f64::from(p.horizon_months)),
            growth_model: Some(growth_model),
            free_policy: Some(FreePolicyInput {
                free_uses_per_user_per_month: Some(p.free_policy.free_uses_per_user_per_month),
                applies_to: Some(p.free_policy.applies_to),
            }),
            usage_segments: Some(
                p.usage_segments
                    .iter()
                    .map(|s| SegmentInput::named(s.name, s.ratio, s.extra_paid_uses_per_user_per_month))
                    .collect(),
            ),
            monetization_model: Some(monetization_model),
            cost_model: Some(CostInput::new(
                p.cost_model.fixed_cost_per_month,
                p.cost_model.cost_per_use,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_scenario_parses_with_missing_fields() {
        let raw: SimulationParameters = serde_json::from_str(
            r#"{"horizonMonths": 24, "growthModel": {"type": "linear", "initialUsers": 50}}"#,
        )
        .unwrap();
        assert_eq!(raw.horizon_months, Some(24.0));
        assert_eq!(
            raw.growth_model,
            Some(GrowthInput::Linear {
                initial_users: Some(50.0),
                monthly_increase: None,
            })
        );
        assert!(raw.monetization_model.is_none());
        assert!(raw.cost_model.is_none());
    }

    #[test]
    fn unknown_model_tags_are_captured() {
        let raw: SimulationParameters = serde_json::from_str(
            r#"{"growthModel": {"type": "logistic"}, "monetizationModel": {"type": "ads"}}"#,
        )
        .unwrap();
        assert_eq!(raw.growth_model, Some(GrowthInput::Unrecognized));
        assert_eq!(raw.monetization_model, Some(MonetizationInput::Unrecognized));
    }

    #[test]
    fn model_tags_use_short_names() {
        let json = serde_json::to_value(GrowthModel::CompoundRate {
            initial_users: 10,
            monthly_growth_rate: 0.1,
        })
        .unwrap();
        assert_eq!(json["type"], "rate");
        assert_eq!(json["initialUsers"], 10);

        let json = serde_json::to_value(MonetizationModel::PerUse {
            price_per_paid_use: 2.0,
        })
        .unwrap();
        assert_eq!(json["type"], "per_use");
        assert_eq!(json["pricePerPaidUse"], 2.0);
    }

    #[test]
    fn simple_split_maps_paying_share_to_light_cohort() {
        let segments = SegmentInput::simple_split(0.25, 10.0);
        assert_eq!(
            segments,
            vec![
                SegmentInput::named(SegmentName::Free, 0.75, 0.0),
                SegmentInput::named(SegmentName::Light, 0.25, 10.0),
                SegmentInput::named(SegmentName::Heavy, 0.0, 0.0),
            ]
        );
    }

    #[test]
    fn simple_split_clamps_paying_share() {
        let ratios = |p: f64| -> Vec<Option<f64>> {
            SegmentInput::simple_split(p, 5.0)
                .iter()
                .map(|s| s.ratio)
                .collect()
        };
        assert_eq!(ratios(1.5), vec![Some(0.0), Some(1.0), Some(0.0)]);
        assert_eq!(ratios(-0.2), vec![Some(1.0), Some(0.0), Some(0.0)]);
        assert_eq!(ratios(f64::NAN), vec![Some(1.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn simple_usage_parses_and_expands() {
        let simple: SimpleUsageInput =
            serde_json::from_str(r#"{"payingUserRatio": 0.25, "paidUsesPerPayingUser": 8}"#)
                .unwrap();
        assert_eq!(simple.segments(), SegmentInput::simple_split(0.25, 8.0));
        assert_eq!(
            SimpleUsageInput::default().segments(),
            SegmentInput::simple_split(0.0, 0.0)
        );
    }

    #[test]
    fn quick_start_has_three_segments() {
        let p = SimulationParameters::quick_start();
        let segments = p.usage_segments.unwrap();
        assert_eq!(segments.len(), 3);
        let names: Vec<_> = segments.iter().filter_map(|s| s.name).collect();
        assert_eq!(names, SegmentName::ALL.to_vec());
    }
}

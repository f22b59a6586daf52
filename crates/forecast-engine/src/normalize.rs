//! Input normalization: turns a possibly malformed scenario into
//! [`NormalizedParameters`] plus the flags describing what had to change.

use forecast_core::*;
use tracing::debug;

const FALLBACK_INITIAL_USERS: u64 = 100;
const FALLBACK_PRICE_PER_PAID_USE: f64 = 1.0;

/// Normalizer output.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    pub parameters: NormalizedParameters,
    pub flags: Vec<RiskFlag>,
}

/// Non-finite and negative values become 0; missing values too.
pub(crate) fn non_negative(value: Option<f64>) -> f64 {
    match value {
        Some(v) if v.is_finite() && v > 0.0 => v,
        _ => 0.0,
    }
}

/// Clamp into `[min, max]`; missing or non-finite values become `min`.
fn clamped(value: Option<f64>, min: f64, max: f64) -> f64 {
    match value {
        Some(v) if v.is_finite() => v.clamp(min, max),
        _ => min,
    }
}

/// Nearest whole count, floored at 0 and saturating at `u64::MAX`.
pub(crate) fn round_count(value: f64) -> u64 {
    if value > 0.0 {
        // float-to-int `as` saturates
        value.round() as u64
    } else {
        0
    }
}

/// Normalize every field of `raw`. Never fails.
pub fn normalize(raw: &SimulationParameters) -> Normalized {
    let mut flags = Vec::new();
    let parameters = NormalizedParameters {
        horizon_months: horizon_months(raw.horizon_months),
        growth_model: growth_model(raw.growth_model.as_ref(), &mut flags),
        free_policy: free_policy(raw.free_policy.as_ref()),
        usage_segments: usage_segments(raw.usage_segments.as_deref(), &mut flags),
        monetization_model: monetization_model(raw.monetization_model.as_ref(), &mut flags),
        cost_model: cost_model(raw.cost_model.as_ref()),
    };
    if !flags.is_empty() {
        debug!(count = flags.len(), "normalization substituted defaults");
    }
    Normalized { parameters, flags }
}

fn horizon_months(raw: Option<f64>) -> u32 {
    let months = match raw {
        Some(m) if m.is_finite() && m > 0.0 => m,
        _ => f64::from(DEFAULT_HORIZON_MONTHS),
    };
    months
        .round()
        .clamp(f64::from(MIN_HORIZON_MONTHS), f64::from(MAX_HORIZON_MONTHS)) as u32
}

fn growth_model(raw: Option<&GrowthInput>, flags: &mut Vec<RiskFlag>) -> GrowthModel {
    match raw {
        Some(GrowthInput::Linear {
            initial_users,
            monthly_increase,
        }) => GrowthModel::Linear {
            initial_users: round_count(non_negative(*initial_users)),
            monthly_increase: round_count(non_negative(*monthly_increase)),
        },
        Some(GrowthInput::CompoundRate {
            initial_users,
            monthly_growth_rate,
        }) => GrowthModel::CompoundRate {
            initial_users: round_count(non_negative(*initial_users)),
            monthly_growth_rate: clamped(*monthly_growth_rate, 0.0, MAX_MONTHLY_GROWTH_RATE),
        },
        Some(GrowthInput::Unrecognized) | None => {
            debug!("growth model missing, falling back to flat linear");
            flags.push(RiskFlag::critical(
                RiskCode::InvalidInput,
                format!(
                    "Growth model is missing or invalid. Using linear growth: \
                     initialUsers={FALLBACK_INITIAL_USERS}, monthlyIncrease=0."
                ),
            ));
            GrowthModel::Linear {
                initial_users: FALLBACK_INITIAL_USERS,
                monthly_increase: 0,
            }
        }
    }
}

fn free_policy(raw: Option<&FreePolicyInput>) -> FreePolicy {
    FreePolicy {
        free_uses_per_user_per_month: non_negative(
            raw.and_then(|f| f.free_uses_per_user_per_month),
        ),
        applies_to: raw.and_then(|f| f.applies_to).unwrap_or_default(),
    }
}

fn usage_segments(raw: Option<&[SegmentInput]>, flags: &mut Vec<RiskFlag>) -> [UsageSegment; 3] {
    let mut segments = SegmentName::ALL.map(|name| UsageSegment {
        name,
        ratio: 0.0,
        extra_paid_uses_per_user_per_month: 0.0,
    });
    // Entries past the third are ignored.
    for (segment, input) in segments.iter_mut().zip(raw.unwrap_or_default()) {
        if let Some(name) = input.name {
            segment.name = name;
        }
        segment.ratio = non_negative(input.ratio);
        segment.extra_paid_uses_per_user_per_month =
            non_negative(input.extra_paid_uses_per_user_per_month);
    }

    let sum: f64 = segments.iter().map(|s| s.ratio).sum();
    if !(sum.is_finite() && sum > 0.0) {
        debug!(sum, "segment ratios unusable, substituting default split");
        flags.push(RiskFlag::critical(
            RiskCode::InvalidInput,
            "User segment ratios are invalid (sum <= 0). Using default split 50/30/20.",
        ));
        for (segment, ratio) in segments.iter_mut().zip(DEFAULT_SEGMENT_SPLIT) {
            segment.ratio = ratio;
        }
    } else if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
        debug!(sum, "rescaling segment ratios");
        flags.push(RiskFlag::warning(
            RiskCode::RatioNot100,
            format!(
                "User segment ratios sum to {:.1}%, not 100%. Auto-normalized.",
                sum * 100.0
            ),
        ));
        for segment in &mut segments {
            segment.ratio /= sum;
        }
    }
    segments
}

fn monetization_model(
    raw: Option<&MonetizationInput>,
    flags: &mut Vec<RiskFlag>,
) -> MonetizationModel {
    match raw {
        Some(MonetizationInput::PerUse { price_per_paid_use }) => MonetizationModel::PerUse {
            price_per_paid_use: non_negative(*price_per_paid_use),
        },
        Some(MonetizationInput::Subscription {
            price_per_user_per_month,
            penetration_rate,
            included_uses_per_subscriber_per_month,
        }) => MonetizationModel::Subscription {
            price_per_user_per_month: non_negative(*price_per_user_per_month),
            penetration_rate: clamped(*penetration_rate, 0.0, 1.0),
            included_uses_per_subscriber_per_month: non_negative(
                *included_uses_per_subscriber_per_month,
            ),
        },
        Some(MonetizationInput::Lifetime {
            one_time_price_per_user,
        }) => MonetizationModel::Lifetime {
            one_time_price_per_user: non_negative(*one_time_price_per_user),
        },
        Some(MonetizationInput::Unrecognized) | None => {
            debug!("monetization model missing, falling back to per-use pricing");
            flags.push(RiskFlag::critical(
                RiskCode::InvalidInput,
                format!(
                    "Monetization model is missing or invalid. \
                     Assuming per-use price = {FALLBACK_PRICE_PER_PAID_USE:.1}."
                ),
            ));
            MonetizationModel::PerUse {
                price_per_paid_use: FALLBACK_PRICE_PER_PAID_USE,
            }
        }
    }
}

fn cost_model(raw: Option<&CostInput>) -> CostModel {
    CostModel {
        fixed_cost_per_month: non_negative(raw.and_then(|c| c.fixed_cost_per_month)),
        cost_per_use: non_negative(raw.and_then(|c| c.cost_per_use)),
    }
}

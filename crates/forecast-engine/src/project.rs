//! Month-by-month projection over normalized parameters.

use crate::normalize::round_count;
use forecast_core::*;
use rust_decimal::Decimal;
use tracing::trace;

/// Projected rows plus what the risk pass needs from the scan.
#[derive(Clone, Debug, PartialEq)]
pub struct Projection {
    pub rows: Vec<MonthRow>,
    /// Per-month flags, not yet deduplicated.
    pub flags: Vec<RiskFlag>,
    /// Unrounded variable cost of free-quota uses over the horizon.
    pub free_variable_cost: f64,
    /// Unrounded variable cost of all uses over the horizon.
    pub variable_cost: f64,
}

/// Uses consumed in one month.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Usage {
    pub free: u64,
    pub included: u64,
    pub paid: u64,
}

impl Usage {
    pub fn total(&self) -> u64 {
        self.free.saturating_add(self.included).saturating_add(self.paid)
    }
}

/// Active users in `month` (1-based) under `growth`.
pub fn users_in_month(growth: &GrowthModel, month: u32) -> u64 {
    let elapsed = month.saturating_sub(1);
    match *growth {
        GrowthModel::Linear {
            initial_users,
            monthly_increase,
        } => initial_users.saturating_add(monthly_increase.saturating_mul(u64::from(elapsed))),
        GrowthModel::CompoundRate {
            initial_users,
            monthly_growth_rate,
        } => {
            let factor = (1.0 + monthly_growth_rate).powi(elapsed as i32);
            round_count(initial_users as f64 * factor)
        }
    }
}

fn subscribers(users: u64, penetration_rate: f64) -> u64 {
    round_count(users as f64 * penetration_rate)
}

/// Split a month's usage into free, included and paid uses.
///
/// The free quota goes to every active user. Subscriptions bundle included
/// uses and bill nothing per use; the other models bill the segment-weighted
/// extra uses.
pub fn monthly_usage(params: &NormalizedParameters, users: u64) -> Usage {
    let users_f = users as f64;
    let free = round_count(users_f * params.free_policy.free_uses_per_user_per_month);
    match params.monetization_model {
        MonetizationModel::Subscription {
            penetration_rate,
            included_uses_per_subscriber_per_month,
            ..
        } => Usage {
            free,
            included: round_count(
                subscribers(users, penetration_rate) as f64
                    * included_uses_per_subscriber_per_month,
            ),
            paid: 0,
        },
        MonetizationModel::PerUse { .. } | MonetizationModel::Lifetime { .. } => {
            let paid: f64 = params
                .usage_segments
                .iter()
                .map(|s| users_f * s.ratio * s.extra_paid_uses_per_user_per_month)
                .sum();
            Usage {
                free,
                included: 0,
                paid: round_count(paid),
            }
        }
    }
}

fn monthly_revenue(
    params: &NormalizedParameters,
    month: u32,
    users: u64,
    usage: &Usage,
    flags: &mut Vec<RiskFlag>,
) -> f64 {
    let cost_per_use = params.cost_model.cost_per_use;
    match params.monetization_model {
        MonetizationModel::PerUse { price_per_paid_use } => {
            if cost_per_use > 0.0 && price_per_paid_use <= cost_per_use {
                flags.push(RiskFlag::critical(
                    RiskCode::PriceTooLowVsCost,
                    format!(
                        "Per-use price ({price_per_paid_use}) is <= cost per use ({cost_per_use}). \
                         Paid usage loses money on every use."
                    ),
                ));
            }
            usage.paid as f64 * price_per_paid_use
        }
        MonetizationModel::Subscription {
            price_per_user_per_month,
            penetration_rate,
            ..
        } => {
            if penetration_rate == 0.0 {
                flags.push(RiskFlag::warning(
                    RiskCode::SubPenetrationZero,
                    "Subscription penetration rate is 0%. Subscription revenue will be $0.",
                ));
            }
            subscribers(users, penetration_rate) as f64 * price_per_user_per_month
        }
        MonetizationModel::Lifetime {
            one_time_price_per_user,
        } => {
            if month == 1 {
                users as f64 * one_time_price_per_user
            } else {
                0.0
            }
        }
    }
}

/// One month before rounding and the running totals are applied.
struct MonthFigures {
    month: u32,
    users: u64,
    usage: Usage,
    revenue: f64,
    variable_cost: f64,
    fixed_cost: f64,
}

#[derive(Default)]
struct Running {
    revenue: Decimal,
    cost: Decimal,
    profit: Decimal,
}

impl Running {
    fn close(&mut self, f: MonthFigures) -> MonthRow {
        let revenue = round_money(f.revenue);
        let total_cost_raw = f.fixed_cost + f.variable_cost;
        let total_cost = round_money(total_cost_raw);
        let profit = round_money(f.revenue - total_cost_raw);
        self.revenue = self.revenue.saturating_add(revenue);
        self.cost = self.cost.saturating_add(total_cost);
        self.profit = self.profit.saturating_add(profit);
        MonthRow {
            month: f.month,
            users: f.users,
            free_uses: f.usage.free,
            included_uses: f.usage.included,
            paid_uses: f.usage.paid,
            total_uses: f.usage.total(),
            revenue,
            variable_cost: round_money(f.variable_cost),
            fixed_cost: round_money(f.fixed_cost),
            total_cost,
            profit,
            cumulative_revenue: self.revenue,
            cumulative_cost: self.cost,
            cumulative_profit: self.profit,
        }
    }
}

/// Project every month of the horizon, in order.
///
/// Each monthly amount, total cost and profit is rounded to cents from the
/// unrounded figures. The cumulative columns are exact decimal sums of the
/// rounded monthly amounts, folded strictly left to right.
pub fn project(params: &NormalizedParameters) -> Projection {
    let mut flags = Vec::new();
    let mut free_variable_cost = 0.0;
    let mut variable_cost = 0.0;
    let cost_per_use = params.cost_model.cost_per_use;
    let fixed_cost = params.cost_model.fixed_cost_per_month;

    let rows: Vec<MonthRow> = (1..=params.horizon_months)
        .map(|month| {
            let users = users_in_month(&params.growth_model, month);
            let usage = monthly_usage(params, users);
            let revenue = monthly_revenue(params, month, users, &usage, &mut flags);
            let variable = usage.total() as f64 * cost_per_use;
            free_variable_cost += usage.free as f64 * cost_per_use;
            variable_cost += variable;
            MonthFigures {
                month,
                users,
                usage,
                revenue,
                variable_cost: variable,
                fixed_cost,
            }
        })
        .scan(Running::default(), |running, figures| Some(running.close(figures)))
        .inspect(|row| {
            trace!(
                month = row.month,
                users = row.users,
                revenue = %row.revenue,
                profit = %row.profit,
                "projected month"
            )
        })
        .collect();

    Projection {
        rows,
        flags,
        free_variable_cost,
        variable_cost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use proptest::prelude::*;

    fn params(
        growth: GrowthInput,
        monetization: MonetizationInput,
        free_uses: f64,
        costs: (f64, f64),
    ) -> NormalizedParameters {
        normalize(&SimulationParameters {
            horizon_months: Some(12.0),
            growth_model: Some(growth),
            free_policy: Some(FreePolicyInput::quota(free_uses)),
            usage_segments: Some(vec![
                SegmentInput::new(1.0, 10.0),
                SegmentInput::new(0.0, 0.0),
                SegmentInput::new(0.0, 0.0),
            ]),
            monetization_model: Some(monetization),
            cost_model: Some(CostInput::new(costs.0, costs.1)),
        })
        .parameters
    }

    #[test]
    fn linear_growth_adds_increase_each_month() {
        let g = GrowthModel::Linear {
            initial_users: 100,
            monthly_increase: 25,
        };
        assert_eq!(users_in_month(&g, 1), 100);
        assert_eq!(users_in_month(&g, 2), 125);
        assert_eq!(users_in_month(&g, 12), 375);
    }

    #[test]
    fn compound_growth_rounds_to_whole_users() {
        let g = GrowthModel::CompoundRate {
            initial_users: 100,
            monthly_growth_rate: 0.15,
        };
        assert_eq!(users_in_month(&g, 1), 100);
        assert_eq!(users_in_month(&g, 2), 115);
        // 100 * 1.15^2 = 132.25
        assert_eq!(users_in_month(&g, 3), 132);
    }

    #[test]
    fn runaway_growth_saturates() {
        let g = GrowthModel::CompoundRate {
            initial_users: 1_000_000,
            monthly_growth_rate: MAX_MONTHLY_GROWTH_RATE,
        };
        assert_eq!(users_in_month(&g, 120), u64::MAX);
        let g = GrowthModel::Linear {
            initial_users: u64::MAX - 1,
            monthly_increase: u64::MAX,
        };
        assert_eq!(users_in_month(&g, 3), u64::MAX);
    }

    #[test]
    fn per_use_usage_comes_from_segments() {
        let p = params(
            GrowthInput::linear(100.0, 0.0),
            MonetizationInput::per_use(1.0),
            3.0,
            (0.0, 0.0),
        );
        let usage = monthly_usage(&p, 100);
        assert_eq!(
            usage,
            Usage {
                free: 300,
                included: 0,
                paid: 1000
            }
        );
        assert_eq!(usage.total(), 1300);
    }

    #[test]
    fn subscription_usage_ignores_segments() {
        let p = params(
            GrowthInput::linear(100.0, 0.0),
            MonetizationInput::subscription(20.0, 0.1, 20.0),
            3.0,
            (0.0, 0.0),
        );
        let usage = monthly_usage(&p, 100);
        assert_eq!(
            usage,
            Usage {
                free: 300,
                included: 200,
                paid: 0
            }
        );
        let rows = project(&p).rows;
        // 10 subscribers at 20.00
        assert_eq!(rows[0].revenue, Decimal::new(200, 0));
    }

    #[test]
    fn lifetime_revenue_lands_in_month_one() {
        let p = params(
            GrowthInput::linear(100.0, 10.0),
            MonetizationInput::lifetime(49.0),
            0.0,
            (0.0, 0.0),
        );
        let rows = project(&p).rows;
        assert_eq!(rows[0].revenue, Decimal::new(4900, 0));
        assert!(rows[1..].iter().all(|r| r.revenue.is_zero()));
        // paid uses still follow the segments
        assert_eq!(rows[1].paid_uses, 1100);
    }

    #[test]
    fn steady_scenario_rows() {
        let p = params(
            GrowthInput::linear(100.0, 0.0),
            MonetizationInput::per_use(1.0),
            0.0,
            (300.0, 0.5),
        );
        let projection = project(&p);
        assert_eq!(projection.rows.len(), 12);
        for (i, row) in projection.rows.iter().enumerate() {
            let month = i as i64 + 1;
            assert_eq!(row.revenue, Decimal::new(1000, 0));
            assert_eq!(row.variable_cost, Decimal::new(500, 0));
            assert_eq!(row.fixed_cost, Decimal::new(300, 0));
            assert_eq!(row.total_cost, Decimal::new(800, 0));
            assert_eq!(row.profit, Decimal::new(200, 0));
            assert_eq!(row.cumulative_profit, Decimal::new(200 * month, 0));
        }
        assert!(projection.flags.is_empty());
        assert_eq!(projection.free_variable_cost, 0.0);
        assert_eq!(projection.variable_cost, 6000.0);
    }

    #[test]
    fn underwater_price_flags_every_month() {
        let p = params(
            GrowthInput::linear(100.0, 0.0),
            MonetizationInput::per_use(0.01),
            0.0,
            (0.0, 0.5),
        );
        let flags = project(&p).flags;
        assert_eq!(flags.len(), 12);
        assert!(flags
            .iter()
            .all(|f| f.code == RiskCode::PriceTooLowVsCost && f.severity == Severity::Critical));
        assert!(flags[0].message.contains("(0.01)"));
        assert!(flags[0].message.contains("(0.5)"));
    }

    #[test]
    fn free_price_with_free_usage_is_not_underwater() {
        let p = params(
            GrowthInput::linear(100.0, 0.0),
            MonetizationInput::per_use(0.0),
            0.0,
            (0.0, 0.0),
        );
        assert!(project(&p).flags.is_empty());
    }

    #[test]
    fn zero_penetration_is_flagged() {
        let p = params(
            GrowthInput::linear(100.0, 0.0),
            MonetizationInput::subscription(20.0, 0.0, 5.0),
            1.0,
            (0.0, 0.1),
        );
        let projection = project(&p);
        assert!(projection
            .flags
            .iter()
            .all(|f| f.code == RiskCode::SubPenetrationZero));
        assert_eq!(projection.flags.len(), 12);
        assert!(projection.rows.iter().all(|r| r.revenue.is_zero()));
    }

    #[test]
    fn profit_rounds_the_unrounded_difference() {
        let mut p = params(
            GrowthInput::linear(1.0, 0.0),
            MonetizationInput::per_use(0.004),
            0.0,
            (0.0, 0.006),
        );
        p.usage_segments[0].extra_paid_uses_per_user_per_month = 1.0;
        let rows = project(&p).rows;
        let first = &rows[0];
        assert_eq!(first.paid_uses, 1);
        assert!(first.revenue.is_zero());
        assert_eq!(first.total_cost, Decimal::new(1, 2));
        // 0.004 - 0.006 rounds to 0.00, not 0.00 - 0.01
        assert_eq!(first.profit, round_money(0.004 - 0.006));
        assert!(first.profit.is_zero());
        assert!(rows.iter().all(|r| r.cumulative_profit.is_zero()));
    }

    #[test]
    fn free_cost_is_tracked_separately() {
        let p = params(
            GrowthInput::linear(10.0, 0.0),
            MonetizationInput::per_use(1.0),
            30.0,
            (0.0, 0.1),
        );
        let projection = project(&p);
        // 300 free and 100 paid uses per month at 0.1
        assert!((projection.free_variable_cost - 360.0).abs() < 1e-9);
        assert!((projection.variable_cost - 480.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn cumulative_columns_are_running_sums(
            users in 0.0f64..100_000.0,
            rate in 0.0f64..0.2,
            price in 0.0f64..5.0,
            fixed in 0.0f64..50_000.0,
            per_use in 0.0f64..1.0,
            months in 1u32..=120,
        ) {
            let mut p = params(
                GrowthInput::compound(users, rate),
                MonetizationInput::per_use(price),
                2.0,
                (fixed, per_use),
            );
            p.horizon_months = months;
            let rows = project(&p).rows;
            prop_assert_eq!(rows.len(), months as usize);
            let (mut rev, mut cost, mut profit) = (Decimal::ZERO, Decimal::ZERO, Decimal::ZERO);
            for (i, row) in rows.iter().enumerate() {
                prop_assert_eq!(row.month as usize, i + 1);
                rev += row.revenue;
                cost += row.total_cost;
                profit += row.profit;
                prop_assert_eq!(row.cumulative_revenue, rev);
                prop_assert_eq!(row.cumulative_cost, cost);
                prop_assert_eq!(row.cumulative_profit, profit);
                prop_assert_eq!(row.total_uses, row.free_uses + row.included_uses + row.paid_uses);
            }
        }
    }
}

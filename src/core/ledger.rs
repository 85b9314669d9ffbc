use super::engine::net_gain;
use super::events::EventSchedule;
use super::types::{HouseholdProfile, LifecycleRow};

/// Expected-value ledger from the current age to life expectancy. Each row
/// shows the balance at the start of its year and that year's cash flows;
/// the balance then compounds at `expected_return` with no randomness.
pub fn build_lifecycle(
    profile: &HouseholdProfile,
    expected_return: f64,
    pension_income: f64,
    events: &EventSchedule,
) -> Vec<LifecycleRow> {
    let years = profile.life_expectancy.saturating_sub(profile.current_age);
    let mut rows = Vec::with_capacity(years as usize + 1);
    let mut asset = profile.total_liquid_assets();

    for y in 0..=years {
        let age = profile.current_age + y;
        let retired = age >= profile.retire_age;
        let contribution = if retired {
            0.0
        } else {
            profile.monthly_contribution * 12.0
        };
        let withdrawal = if retired {
            profile.annual_withdrawal * (1.0 + profile.inflation_rate).powi(y as i32)
        } else {
            0.0
        };
        let pension = if age >= profile.pension.start_age {
            pension_income
        } else {
            0.0
        };
        let event_cost = events.cost_at(y);
        let gain = net_gain(asset * expected_return, profile.apply_capital_gains_tax);

        rows.push(LifecycleRow {
            year: profile.current_year + y as i32,
            age,
            retired,
            asset: asset.max(0.0),
            contribution,
            withdrawal,
            pension,
            event_cost,
        });
        asset = (asset + gain + contribution - withdrawal + pension - event_cost).max(0.0);
    }

    rows
}

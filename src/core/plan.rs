use serde::Serialize;
use tracing::{debug, info};

use super::blend::{Blend, FundCatalog, blend_allocation};
use super::diagnostics::{
    FireThreshold, PercentilePlacement, WealthTier, fire_thresholds, percentile_rank, wealth_tier,
};
use super::engine::{SimulationParams, simulate};
use super::error::PlanError;
use super::events::{EventSchedule, build_event_schedule};
use super::ledger::build_lifecycle;
use super::pension::{PartnerEntitlement, PensionEntitlement, calc_partner_pension, calc_pension};
use super::rng::derive_seed;
use super::solver::{SearchResult, find_safe_side_income, find_safe_withdrawal};
use super::tables::{DEFAULT_HEIRS, MAN, TRIALS};
use super::tax::{InheritanceSettlement, gift_tax_saving, inheritance_tax, settle_inheritance};
use super::types::{HouseholdProfile, LifecycleRow, SimulationResults};

const PRE_RETIREMENT_STREAM: u64 = 1;
const POST_RETIREMENT_STREAM: u64 = 2;
const SEARCH_STREAM: u64 = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionSummary {
    pub primary: PensionEntitlement,
    pub partner: PartnerEntitlement,
    pub total_annual: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EstateSummary {
    /// Median final balance of the post-retirement phase.
    pub estate_at_death: f64,
    pub net_real_estate: f64,
    pub heirs: u32,
    pub estate_tax: f64,
    pub inheritance: Option<InheritanceSettlement>,
    pub gift_tax_saving: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub blend: Blend,
    pub pension: PensionSummary,
    pub events: EventSchedule,
    pub pre_retirement: SimulationResults,
    pub post_retirement: SimulationResults,
    pub retirement_median: f64,
    pub final_survival_rate: f64,
    pub lifecycle: Vec<LifecycleRow>,
    pub fire: Vec<FireThreshold>,
    pub liquid_tier: WealthTier,
    pub total_tier: WealthTier,
    pub percentile: PercentilePlacement,
    pub estate: EstateSummary,
    /// Only searched when the 10th-percentile outcome runs out of money.
    pub safe_withdrawal: Option<SearchResult>,
    pub safe_side_income: Option<SearchResult>,
}

pub fn validate_profile(profile: &HouseholdProfile) -> Result<(), PlanError> {
    if profile.life_expectancy < profile.current_age {
        return Err(PlanError::InvalidHorizon {
            current_age: profile.current_age,
            life_expectancy: profile.life_expectancy,
        });
    }

    let money = [
        ("investable assets", profile.investable_assets),
        ("emergency reserve", profile.emergency_reserve),
        ("monthly contribution", profile.monthly_contribution),
        ("annual income", profile.annual_income),
        ("annual expense", profile.annual_expense),
        ("annual withdrawal", profile.annual_withdrawal),
        ("side income", profile.side_income),
        ("inflation rate", profile.inflation_rate),
    ];
    if let Some(&(field, _)) = money.iter().find(|(_, value)| !value.is_finite()) {
        return Err(PlanError::NonFinite { field });
    }

    if profile.allocations.is_empty() {
        return Err(PlanError::EmptyAllocation);
    }
    let total = profile.allocation_total();
    if (total - 100.0).abs() > 1e-9 {
        return Err(PlanError::AllocationTotal { total });
    }
    Ok(())
}

/// Parameters of the decumulation phase, shared by the report run and the
/// bisection searches.
fn post_retirement_params(
    profile: &HouseholdProfile,
    blend: Blend,
    pension_income: f64,
    initial_balance: f64,
    events: EventSchedule,
) -> SimulationParams {
    let pre_years = profile.pre_retirement_years();
    SimulationParams {
        initial_balance,
        annual_contribution: 0.0,
        annual_withdrawal: profile.annual_withdrawal,
        years: profile.horizon_years() - pre_years,
        retire_year: 0,
        expected_return: blend.expected_return(),
        volatility: blend.volatility(),
        events,
        pension_income,
        pension_start_year: Some(profile.pension.start_age.saturating_sub(profile.retire_age)),
        apply_capital_gains_tax: profile.apply_capital_gains_tax,
        emergency_reserve: profile.emergency_reserve,
        use_reserve_on_crash: profile.use_reserve_on_crash,
        trials: TRIALS,
    }
}

pub fn run_plan(profile: &HouseholdProfile, catalog: &FundCatalog) -> Result<PlanReport, PlanError> {
    validate_profile(profile)?;

    let blend = blend_allocation(&profile.allocations, catalog);
    let primary = calc_pension(profile);
    let partner = calc_partner_pension(profile);
    let total_pension = primary.total + partner.total;
    let events = build_event_schedule(profile);
    let pre_years = profile.pre_retirement_years();
    info!(
        rate = blend.rate,
        risk = blend.risk,
        pre_years,
        horizon = profile.horizon_years(),
        pension = total_pension,
        "running plan"
    );

    let pre_params = SimulationParams {
        initial_balance: profile.investable_assets,
        annual_contribution: profile.monthly_contribution * 12.0,
        annual_withdrawal: 0.0,
        years: pre_years,
        retire_year: pre_years,
        expected_return: blend.expected_return(),
        volatility: blend.volatility(),
        events: events.clone(),
        pension_income: 0.0,
        pension_start_year: None,
        apply_capital_gains_tax: profile.apply_capital_gains_tax,
        emergency_reserve: profile.emergency_reserve,
        use_reserve_on_crash: profile.use_reserve_on_crash,
        trials: TRIALS,
    };
    let pre_retirement = simulate(&pre_params, derive_seed(profile.seed, PRE_RETIREMENT_STREAM, 0));
    let retirement_median = pre_retirement.final_median();
    debug!(retirement_median, "accumulation phase finished");

    let post_params = post_retirement_params(
        profile,
        blend,
        total_pension,
        retirement_median,
        events.starting_at(pre_years),
    );
    let post_retirement =
        simulate(&post_params, derive_seed(profile.seed, POST_RETIREMENT_STREAM, 0));
    let final_survival_rate = post_retirement.final_survival_rate();

    let lifecycle = build_lifecycle(profile, blend.expected_return(), total_pension, &events);

    let liquid = profile.total_liquid_assets();
    let fire = fire_thresholds(profile.annual_expense, profile.side_income, liquid);
    let liquid_tier = wealth_tier(liquid);
    let total_tier = wealth_tier(profile.total_net_worth());
    let percentile = percentile_rank(profile.current_age, liquid);

    let estate = estate_summary(profile, post_retirement.final_median());

    let (safe_withdrawal, safe_side_income) = if (post_retirement.final_p10() / MAN).round() <= 0.0 {
        // Searched from today's investable assets without events or reserve.
        let search_params = SimulationParams {
            emergency_reserve: 0.0,
            use_reserve_on_crash: false,
            ..post_retirement_params(
                profile,
                blend,
                total_pension,
                profile.investable_assets,
                EventSchedule::new(post_params.years),
            )
        };
        let seed = derive_seed(profile.seed, SEARCH_STREAM, 0);
        (
            Some(find_safe_withdrawal(&search_params, seed)?),
            Some(find_safe_side_income(&search_params, seed)?),
        )
    } else {
        (None, None)
    };

    info!(
        final_survival_rate,
        retirement_median,
        estate_at_death = estate.estate_at_death,
        searched = safe_withdrawal.is_some(),
        "plan finished"
    );

    Ok(PlanReport {
        blend,
        pension: PensionSummary {
            primary,
            partner,
            total_annual: total_pension,
        },
        events,
        pre_retirement,
        post_retirement,
        retirement_median,
        final_survival_rate,
        lifecycle,
        fire,
        liquid_tier,
        total_tier,
        percentile,
        estate,
        safe_withdrawal,
        safe_side_income,
    })
}

/// Own estate at death: the median final balance plus home equity plus any
/// inheritance received (net of debt), left to the household's children.
pub fn estate_summary(profile: &HouseholdProfile, final_median: f64) -> EstateSummary {
    let estate_at_death = final_median.max(0.0);
    let net_real_estate = profile.net_real_estate();
    let inheritance = profile.inheritance.as_ref().map(settle_inheritance);
    let inherited = inheritance.map(|s| s.net_of_debt).unwrap_or(0.0);
    let heirs = match profile.children.len() {
        0 => DEFAULT_HEIRS,
        n => n as u32,
    };

    EstateSummary {
        estate_at_death,
        net_real_estate,
        heirs,
        estate_tax: inheritance_tax(estate_at_death + net_real_estate + inherited, heirs),
        inheritance,
        gift_tax_saving: profile
            .gifts_given
            .map(|plan| gift_tax_saving(estate_at_death + net_real_estate, &plan)),
    }
}

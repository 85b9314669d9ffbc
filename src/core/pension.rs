use serde::Serialize;

use super::tables::{
    BASIC_PENSION_FULL, EARNINGS_ACCRUAL_PER_MONTH,
    PARTNER_DEFAULT_EARNINGS_YEARS, PENSION_ENTRY_AGE, PENSION_MONTHS_CAP,
    SUPPLEMENTAL_PAYOUT_MULTIPLE, SUPPLEMENTAL_PREMIUM_PER_MONTH, VOLUNTARY_EXTENSION_END_AGE,
};
use super::types::{HouseholdProfile, PartnerProfile, PensionScheme};

/// Annual public-pension entitlement in yen, plus the separately compounded
/// defined-contribution balance at retirement.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionEntitlement {
    pub basic: f64,
    pub supplemental: f64,
    pub earnings_linked: f64,
    pub total: f64,
    pub defined_contribution_balance: f64,
}

impl PensionEntitlement {
    pub fn monthly(&self) -> f64 {
        self.total / 12.0
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerEntitlement {
    pub basic: f64,
    pub earnings_linked: f64,
    pub total: f64,
}

pub fn calc_pension(profile: &HouseholdProfile) -> PensionEntitlement {
    let pension = &profile.pension;
    let earnings_months = match pension.scheme {
        PensionScheme::EarningsLinked => pension
            .earnings_years
            .saturating_mul(12)
            .min(PENSION_MONTHS_CAP),
        PensionScheme::FlatRate => 0,
    };

    // Voluntary contributions run from retirement until 65, never past the cap.
    let extension_window = VOLUNTARY_EXTENSION_END_AGE.saturating_sub(profile.retire_age) * 12;
    let extension_months = extension_window
        .min(pension.extension_years.saturating_mul(12))
        .min(PENSION_MONTHS_CAP - earnings_months);

    let basic_months = match pension.scheme {
        PensionScheme::EarningsLinked => earnings_months + extension_months,
        PensionScheme::FlatRate => flat_rate_months(pension.start_age),
    };
    let basic = basic_pension(basic_months);

    let supplemental_months = match pension.scheme {
        PensionScheme::FlatRate => basic_months,
        PensionScheme::EarningsLinked if pension.supplemental => extension_months,
        PensionScheme::EarningsLinked => 0,
    };
    let supplemental = supplemental_pension(supplemental_months);

    let earnings_linked = match pension.scheme {
        PensionScheme::EarningsLinked => {
            let salary = pension.last_salary.unwrap_or(profile.annual_income);
            earnings_linked_pension(salary, pension.earnings_years)
        }
        PensionScheme::FlatRate => 0.0,
    };

    let defined_contribution_balance = pension
        .defined_contribution
        .map(|dc| {
            let years = profile.retire_age.saturating_sub(profile.current_age);
            annuity_future_value(dc.monthly * 12.0, dc.annual_rate, years).round()
        })
        .unwrap_or(0.0);

    PensionEntitlement {
        basic,
        supplemental,
        earnings_linked,
        total: basic + supplemental + earnings_linked,
        defined_contribution_balance,
    }
}

pub fn calc_partner_pension(profile: &HouseholdProfile) -> PartnerEntitlement {
    let Some(partner) = profile.partner.as_ref() else {
        return PartnerEntitlement::default();
    };
    // The partner is assumed to start drawing at the household's start age.
    let basic = basic_pension(flat_rate_months(profile.pension.start_age));
    if partner.is_dependent {
        return PartnerEntitlement {
            basic,
            earnings_linked: 0.0,
            total: basic,
        };
    }

    let earnings_linked = partner_earnings_linked(partner);
    PartnerEntitlement {
        basic,
        earnings_linked,
        total: basic + earnings_linked,
    }
}

fn partner_earnings_linked(partner: &PartnerProfile) -> f64 {
    match partner.scheme {
        PensionScheme::EarningsLinked => {
            let years = if partner.earnings_years == 0 {
                PARTNER_DEFAULT_EARNINGS_YEARS
            } else {
                partner.earnings_years
            };
            earnings_linked_pension(partner.salary.unwrap_or(partner.income), years)
        }
        PensionScheme::FlatRate => 0.0,
    }
}

fn flat_rate_months(start_age: u32) -> u32 {
    start_age
        .saturating_sub(PENSION_ENTRY_AGE)
        .saturating_mul(12)
        .min(PENSION_MONTHS_CAP)
}

fn basic_pension(months: u32) -> f64 {
    let months = months.min(PENSION_MONTHS_CAP);
    (BASIC_PENSION_FULL * months as f64 / PENSION_MONTHS_CAP as f64).round()
}

fn supplemental_pension(months: u32) -> f64 {
    months as f64 * SUPPLEMENTAL_PREMIUM_PER_MONTH * SUPPLEMENTAL_PAYOUT_MULTIPLE
}

fn earnings_linked_pension(annual_salary: f64, years: u32) -> f64 {
    let monthly_earnings = annual_salary / 12.0;
    (monthly_earnings * EARNINGS_ACCRUAL_PER_MONTH * years as f64 * 12.0).round()
}

/// Future value of a level year-end contribution. Falls back to simple
/// accumulation at a zero rate.
pub fn annuity_future_value(annual_contribution: f64, rate: f64, years: u32) -> f64 {
    if rate == 0.0 {
        return annual_contribution * years as f64;
    }
    annual_contribution * ((1.0 + rate).powi(years as i32) - 1.0) / rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::MAN;
    use crate::core::types::DefinedContribution;

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn employee() -> HouseholdProfile {
        HouseholdProfile::default()
    }

    #[test]
    fn employee_pension_matches_hand_calculation() {
        let pension = calc_pension(&employee());
        // 35 years = 420 months of basic accrual.
        assert_close(pension.basic, (795_000.0_f64 * 420.0 / 480.0).round(), 0.0);
        assert_close(pension.supplemental, 0.0, 0.0);
        // 6,000,000 / 12 * 0.005481 * 420
        assert_close(pension.earnings_linked, 1_151_010.0, 0.0);
        assert_close(pension.total, pension.basic + pension.earnings_linked, 0.0);
        assert_close(pension.monthly(), pension.total / 12.0, 1e-9);
    }

    #[test]
    fn voluntary_extension_is_capped_by_age_65_window() {
        let profile = employee().revise(|p| {
            p.retire_age = 62;
            p.pension.earnings_years = 30;
            p.pension.extension_years = 10;
            p.pension.supplemental = true;
        });
        let pension = calc_pension(&profile);
        // 360 earnings months + 36 extension months (62 -> 65).
        assert_close(pension.basic, (795_000.0_f64 * 396.0 / 480.0).round(), 0.0);
        assert_close(pension.supplemental, 36.0 * 400.0, 0.0);
    }

    #[test]
    fn oversized_contribution_years_cap_at_480_months() {
        let profile = employee().revise(|p| {
            p.pension.earnings_years = u32::MAX;
            p.pension.extension_years = u32::MAX;
            p.pension.start_age = u32::MAX;
        });
        let pension = calc_pension(&profile);
        assert_close(pension.basic, 795_000.0, 0.0);

        let flat = calc_pension(&profile.revise(|p| p.pension.scheme = PensionScheme::FlatRate));
        assert_close(flat.basic, 795_000.0, 0.0);
    }

    #[test]
    fn voluntary_extension_is_capped_by_remaining_months() {
        let profile = employee().revise(|p| {
            p.retire_age = 50;
            p.pension.earnings_years = 38;
            p.pension.extension_years = 10;
            p.pension.supplemental = true;
        });
        let pension = calc_pension(&profile);
        assert_close(pension.basic, 795_000.0, 0.0);
        assert_close(pension.supplemental, 24.0 * 400.0, 0.0);
    }

    #[test]
    fn supplemental_flag_without_extension_pays_nothing() {
        let profile = employee().revise(|p| p.pension.supplemental = true);
        assert_close(calc_pension(&profile).supplemental, 0.0, 0.0);
    }

    #[test]
    fn flat_rate_scheme_uses_start_age_months_and_supplement() {
        let profile = employee().revise(|p| {
            p.pension.scheme = PensionScheme::FlatRate;
            p.pension.start_age = 65;
        });
        let pension = calc_pension(&profile);
        assert_close(pension.basic, 795_000.0, 0.0);
        assert_close(pension.earnings_linked, 0.0, 0.0);
        assert_close(pension.supplemental, 480.0 * 400.0, 0.0);
    }

    #[test]
    fn defined_contribution_compounds_until_retirement() {
        let profile = employee().revise(|p| {
            p.pension.defined_contribution = Some(DefinedContribution {
                monthly: 2.3 * MAN,
                annual_rate: 0.04,
            })
        });
        let pension = calc_pension(&profile);
        let expected = 276_000.0 * (1.04_f64.powi(20) - 1.0) / 0.04;
        assert_close(pension.defined_contribution_balance, expected.round(), 0.0);
    }

    #[test]
    fn annuity_future_value_zero_rate_is_linear() {
        assert_close(annuity_future_value(100.0, 0.0, 7), 700.0, 0.0);
        assert_close(annuity_future_value(100.0, 0.1, 0), 0.0, 1e-12);
    }

    #[test]
    fn partner_pension_variants() {
        let none = calc_partner_pension(&employee());
        assert_eq!(none, PartnerEntitlement::default());

        let partner = PartnerProfile {
            age: 33,
            retire_age: 53,
            is_dependent: true,
            income: 0.0,
            salary: None,
            scheme: PensionScheme::EarningsLinked,
            earnings_years: 30,
        };
        let dependent = calc_partner_pension(&employee().revise(|p| p.partner = Some(partner.clone())));
        assert_close(dependent.total, 795_000.0, 0.0);
        assert_close(dependent.earnings_linked, 0.0, 0.0);

        let working = PartnerProfile {
            is_dependent: false,
            income: 400.0 * MAN,
            ..partner
        };
        let working = calc_partner_pension(&employee().revise(|p| p.partner = Some(working)));
        // 4,000,000 / 12 * 0.005481 * 360
        assert_close(working.earnings_linked, 657_720.0, 0.0);
        assert_close(working.total, 795_000.0 + 657_720.0, 0.0);
    }
}

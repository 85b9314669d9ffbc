//! Static reference data: fund catalog, education costs, tax brackets and
//! wealth-tier thresholds. Money figures are stored in man-yen, the unit the
//! published tables use, and scaled by [`MAN`] where they are read.

use super::types::{SchoolTrack, SchoolingPlan, UniversityTrack};

/// Yen per man-yen.
pub const MAN: f64 = 10_000.0;

pub const TRIALS: u32 = 1_000;

/// Share of a positive gain kept after the 20.315% capital-gains tax.
pub const CAPITAL_GAINS_NET: f64 = 0.79685;

/// Drawn annual return below which the emergency reserve may be tapped.
pub const CRASH_RETURN_THRESHOLD: f64 = -0.15;
/// Largest share of a crash year's net need the reserve covers.
pub const RESERVE_COVER_SHARE: f64 = 0.5;

/// Blend used when an allocation carries no weight at all (percent).
pub const FALLBACK_RATE: f64 = 7.0;
pub const FALLBACK_RISK: f64 = 17.0;
/// Risk assumed for an allocation entry whose fund id is unknown (percent).
pub const UNKNOWN_FUND_RISK: f64 = 15.0;

pub const DEFAULT_TARGET_SURVIVAL: f64 = 0.80;
pub const DEFAULT_HEIRS: u32 = 2;

pub const BASIC_PENSION_FULL: f64 = 795_000.0;
pub const PENSION_MONTHS_CAP: u32 = 480;
pub const PENSION_ENTRY_AGE: u32 = 20;
pub const VOLUNTARY_EXTENSION_END_AGE: u32 = 65;
pub const EARNINGS_ACCRUAL_PER_MONTH: f64 = 0.005481;
/// Supplemental pension premium per contribution month (yen).
pub const SUPPLEMENTAL_PREMIUM_PER_MONTH: f64 = 200.0;
/// Each premium month pays back this multiple of the premium, every year.
pub const SUPPLEMENTAL_PAYOUT_MULTIPLE: f64 = 2.0;
pub const PARTNER_DEFAULT_EARNINGS_YEARS: u32 = 20;
pub const DEFAULT_DC_RATE: f64 = 0.04;

pub const INHERITANCE_BASE_DEDUCTION: f64 = 3_000.0;
pub const INHERITANCE_PER_HEIR_DEDUCTION: f64 = 600.0;

pub struct FundSpec {
    pub id: &'static str,
    pub category: &'static str,
    pub name: &'static str,
    pub rate: f64,
    pub risk: f64,
    pub returns: [f64; 4],
    pub description: &'static str,
}

pub const FUND_CATEGORIES: [&str; 5] = [
    "global-equity",
    "us-equity",
    "japan-equity",
    "balanced",
    "bond-and-other",
];

pub const BUILT_IN_FUNDS: [FundSpec; 12] = [
    FundSpec {
        id: "orcan",
        category: "global-equity",
        name: "eMAXIS Slim All Country",
        rate: 7.0,
        risk: 17.0,
        returns: [27.4, 18.2, 21.3, 6.4],
        description: "About 2,800 stocks across 50 countries.",
    },
    FundSpec {
        id: "em",
        category: "global-equity",
        name: "Emerging Markets Index",
        rate: 6.5,
        risk: 24.0,
        returns: [12.0, 7.5, 9.5, 5.5],
        description: "China, India, Brazil and other emerging markets.",
    },
    FundSpec {
        id: "sp500",
        category: "us-equity",
        name: "eMAXIS Slim S&P 500",
        rate: 7.5,
        risk: 19.0,
        returns: [32.6, 22.5, 24.8, 7.0],
        description: "Tracks 500 large US companies.",
    },
    FundSpec {
        id: "nasdaq",
        category: "us-equity",
        name: "iFreeNEXT NASDAQ100",
        rate: 10.0,
        risk: 28.0,
        returns: [38.2, 24.1, 28.5, 12.0],
        description: "100 US technology-heavy names.",
    },
    FundSpec {
        id: "fang",
        category: "us-equity",
        name: "FANG+ Index",
        rate: 12.0,
        risk: 35.0,
        returns: [55.0, 28.0, 32.0, 14.0],
        description: "Ten concentrated next-generation tech names.",
    },
    FundSpec {
        id: "nikkei",
        category: "japan-equity",
        name: "Nikkei 225 Index",
        rate: 5.5,
        risk: 20.0,
        returns: [18.4, 14.2, 14.8, 4.5],
        description: "225 representative Japanese companies.",
    },
    FundSpec {
        id: "topix",
        category: "japan-equity",
        name: "TOPIX Index",
        rate: 5.0,
        risk: 19.0,
        returns: [16.2, 12.8, 13.5, 4.2],
        description: "Whole Tokyo Stock Exchange, about 2,000 names.",
    },
    FundSpec {
        id: "bal8",
        category: "balanced",
        name: "eMAXIS Slim Balance (8 assets)",
        rate: 5.0,
        risk: 10.0,
        returns: [14.2, 8.4, 10.2, 5.0],
        description: "Equal weight across stocks, bonds and REITs.",
    },
    FundSpec {
        id: "sesson",
        category: "balanced",
        name: "Saison Global Balance",
        rate: 5.5,
        risk: 11.0,
        returns: [15.8, 9.2, 11.5, 5.8],
        description: "Half global equity, half global bonds.",
    },
    FundSpec {
        id: "bond",
        category: "bond-and-other",
        name: "Japan Bond Index",
        rate: 0.5,
        risk: 3.0,
        returns: [1.2, 0.8, 1.0, 0.8],
        description: "Capital preservation first.",
    },
    FundSpec {
        id: "reit",
        category: "bond-and-other",
        name: "J-REIT Index",
        rate: 4.5,
        risk: 22.0,
        returns: [8.5, 5.2, 7.8, 4.5],
        description: "Domestic listed real estate.",
    },
    FundSpec {
        id: "gold",
        category: "bond-and-other",
        name: "Gold Index",
        rate: 6.0,
        risk: 15.0,
        returns: [22.0, 14.5, 16.0, 6.0],
        description: "Physical gold, low equity correlation.",
    },
];

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum SchoolPhase {
    EarlyChildhood,
    Elementary,
    JuniorHigh,
    SeniorHigh,
    University,
}

pub struct PhaseSpan {
    pub phase: SchoolPhase,
    pub start_age: u32,
    pub years: u32,
}

pub const SCHOOL_PHASES: [PhaseSpan; 5] = [
    PhaseSpan {
        phase: SchoolPhase::EarlyChildhood,
        start_age: 3,
        years: 3,
    },
    PhaseSpan {
        phase: SchoolPhase::Elementary,
        start_age: 6,
        years: 6,
    },
    PhaseSpan {
        phase: SchoolPhase::JuniorHigh,
        start_age: 12,
        years: 3,
    },
    PhaseSpan {
        phase: SchoolPhase::SeniorHigh,
        start_age: 15,
        years: 3,
    },
    PhaseSpan {
        phase: SchoolPhase::University,
        start_age: 18,
        years: 4,
    },
];

/// Total cost of a school phase in man-yen under the given plan.
pub fn school_phase_cost(phase: SchoolPhase, plan: &SchoolingPlan) -> f64 {
    match phase {
        SchoolPhase::EarlyChildhood => track_cost(plan.early_childhood, 70.0, 158.0),
        SchoolPhase::Elementary => track_cost(plan.elementary, 211.0, 1_000.0),
        SchoolPhase::JuniorHigh => track_cost(plan.junior_high, 162.0, 430.0),
        SchoolPhase::SeniorHigh => track_cost(plan.senior_high, 154.0, 315.0),
        SchoolPhase::University => university_cost(plan.university),
    }
}

fn track_cost(track: SchoolTrack, public: f64, private: f64) -> f64 {
    match track {
        SchoolTrack::Public => public,
        SchoolTrack::Private => private,
    }
}

pub fn university_cost(track: UniversityTrack) -> f64 {
    match track {
        UniversityTrack::Public => 243.0,
        UniversityTrack::Private => 430.0,
        UniversityTrack::Science => 550.0,
        UniversityTrack::Medical => 3_000.0,
    }
}

/// Progressive inheritance brackets on the taxable base (man-yen):
/// (upper bound, marginal rate, subtraction).
pub const INHERITANCE_BRACKETS: [(f64, f64, f64); 8] = [
    (1_000.0, 0.10, 0.0),
    (3_000.0, 0.15, 50.0),
    (5_000.0, 0.20, 200.0),
    (10_000.0, 0.30, 700.0),
    (20_000.0, 0.40, 1_700.0),
    (30_000.0, 0.45, 2_700.0),
    (60_000.0, 0.50, 4_200.0),
    (f64::INFINITY, 0.55, 7_200.0),
];

/// Effective take-home ratio by annual gross income (man-yen upper bound).
pub const TAKE_HOME_BRACKETS: [(f64, f64); 7] = [
    (200.0, 0.87),
    (400.0, 0.83),
    (600.0, 0.80),
    (800.0, 0.77),
    (1_000.0, 0.745),
    (1_500.0, 0.72),
    (f64::INFINITY, 0.68),
];

/// Household wealth tiers by liquid assets, richest first (man-yen floor).
pub const WEALTH_TIERS: [(&str, f64); 5] = [
    ("ultra-wealthy", 50_000.0),
    ("wealthy", 10_000.0),
    ("semi-wealthy", 5_000.0),
    ("upper-mass", 3_000.0),
    ("mass", 0.0),
];

/// Age-bucketed decile boundaries of household financial assets (man-yen).
/// Entry `i` is the asset level at the `i * 10`th percentile.
pub fn percentile_brackets(age: u32) -> [f64; 10] {
    match age {
        0..=29 => [0.0, 0.0, 10.0, 30.0, 70.0, 100.0, 200.0, 380.0, 600.0, 1_500.0],
        30..=39 => [0.0, 0.0, 20.0, 80.0, 150.0, 250.0, 450.0, 700.0, 1_000.0, 2_000.0],
        40..=49 => [
            0.0, 0.0, 40.0, 100.0, 200.0, 400.0, 700.0, 1_200.0, 1_800.0, 3_000.0,
        ],
        50..=59 => [
            0.0, 10.0, 80.0, 200.0, 400.0, 700.0, 1_100.0, 1_700.0, 2_500.0, 4_000.0,
        ],
        _ => [
            0.0, 30.0, 100.0, 250.0, 500.0, 800.0, 1_300.0, 2_000.0, 3_000.0, 5_000.0,
        ],
    }
}

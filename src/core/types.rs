use serde::{Deserialize, Serialize};

use super::tables::MAN;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PensionScheme {
    /// Employee scheme: flat basic pension plus an earnings-proportional tier.
    EarningsLinked,
    /// Self-employed scheme: flat basic pension only.
    FlatRate,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SchoolTrack {
    #[default]
    Public,
    Private,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UniversityTrack {
    #[default]
    Public,
    Private,
    Science,
    Medical,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SchoolingPlan {
    pub early_childhood: SchoolTrack,
    pub elementary: SchoolTrack,
    pub junior_high: SchoolTrack,
    pub senior_high: SchoolTrack,
    pub university: UniversityTrack,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildProfile {
    pub birth_year: i32,
    #[serde(default)]
    pub schooling: SchoolingPlan,
}

/// One-off outflow in a calendar year, in yen.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifeEvent {
    pub year: i32,
    pub cost: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftPlan {
    pub annual_amount: f64,
    pub recipients: u32,
    pub years: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GiftReceipt {
    pub annual_amount: f64,
    pub years: u32,
}

/// Expected receipt from a parent's estate.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InheritanceReceipt {
    pub estate: f64,
    pub year: i32,
    pub siblings: u32,
    pub debt: Option<f64>,
    /// Fraction of the share intended for investment, 0..=1.
    pub invest_ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerProfile {
    pub age: u32,
    pub retire_age: u32,
    pub is_dependent: bool,
    pub income: f64,
    pub salary: Option<f64>,
    pub scheme: PensionScheme,
    pub earnings_years: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DefinedContribution {
    pub monthly: f64,
    pub annual_rate: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PensionProfile {
    pub scheme: PensionScheme,
    pub start_age: u32,
    pub earnings_years: u32,
    pub last_salary: Option<f64>,
    pub extension_years: u32,
    pub supplemental: bool,
    pub defined_contribution: Option<DefinedContribution>,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealEstate {
    pub value: f64,
    pub loan: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundAllocation {
    pub fund_id: String,
    pub weight: f64,
}

impl FundAllocation {
    pub fn new(fund_id: impl Into<String>, weight: f64) -> Self {
        Self {
            fund_id: fund_id.into(),
            weight,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReturns {
    pub one_year: Option<f64>,
    pub three_year: Option<f64>,
    pub five_year: Option<f64>,
    pub long_run: Option<f64>,
}

/// A fund as seen by the blender. `rate` and `risk` are annual percentages.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fund {
    pub id: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub name: String,
    pub rate: f64,
    pub risk: f64,
    #[serde(default)]
    pub backtest: BacktestReturns,
    #[serde(default)]
    pub description: String,
}

/// Root input aggregate. All money is in yen, all rates are fractions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HouseholdProfile {
    pub current_year: i32,
    pub current_age: u32,
    pub retire_age: u32,
    pub life_expectancy: u32,
    pub partner: Option<PartnerProfile>,
    pub investable_assets: f64,
    pub emergency_reserve: f64,
    pub use_reserve_on_crash: bool,
    pub real_estate: Option<RealEstate>,
    pub monthly_contribution: f64,
    pub annual_income: f64,
    pub annual_expense: f64,
    pub annual_withdrawal: f64,
    pub side_income: f64,
    pub inflation_rate: f64,
    pub apply_capital_gains_tax: bool,
    pub pension: PensionProfile,
    pub allocations: Vec<FundAllocation>,
    pub custom_funds: Vec<Fund>,
    pub children: Vec<ChildProfile>,
    pub gifts_given: Option<GiftPlan>,
    pub gifts_received: Option<GiftReceipt>,
    pub inheritance: Option<InheritanceReceipt>,
    pub life_events: Vec<LifeEvent>,
    pub seed: u64,
}

impl HouseholdProfile {
    /// Produces the next revision of the profile, leaving `self` untouched.
    pub fn revise(&self, edit: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        edit(&mut next);
        next
    }

    pub fn total_liquid_assets(&self) -> f64 {
        self.investable_assets + self.emergency_reserve
    }

    pub fn net_real_estate(&self) -> f64 {
        self.real_estate
            .map(|home| (home.value - home.loan).max(0.0))
            .unwrap_or(0.0)
    }

    pub fn total_net_worth(&self) -> f64 {
        self.total_liquid_assets() + self.net_real_estate()
    }

    pub fn pre_retirement_years(&self) -> u32 {
        self.retire_age.saturating_sub(self.current_age)
    }

    pub fn horizon_years(&self) -> u32 {
        self.pre_retirement_years()
            .max(self.life_expectancy.saturating_sub(self.current_age))
    }

    pub fn allocation_total(&self) -> f64 {
        self.allocations.iter().map(|a| a.weight).sum()
    }
}

impl Default for HouseholdProfile {
    fn default() -> Self {
        Self {
            current_year: 2025,
            current_age: 35,
            retire_age: 55,
            life_expectancy: 90,
            partner: None,
            investable_assets: 1_000.0 * MAN,
            emergency_reserve: 300.0 * MAN,
            use_reserve_on_crash: false,
            real_estate: None,
            monthly_contribution: 10.0 * MAN,
            annual_income: 600.0 * MAN,
            annual_expense: 300.0 * MAN,
            annual_withdrawal: 240.0 * MAN,
            side_income: 0.0,
            inflation_rate: 0.015,
            apply_capital_gains_tax: true,
            pension: PensionProfile {
                scheme: PensionScheme::EarningsLinked,
                start_age: 65,
                earnings_years: 35,
                last_salary: Some(600.0 * MAN),
                extension_years: 0,
                supplemental: false,
                defined_contribution: None,
            },
            allocations: vec![
                FundAllocation::new("orcan", 70.0),
                FundAllocation::new("sp500", 30.0),
            ],
            custom_funds: Vec::new(),
            children: Vec::new(),
            gifts_given: None,
            gifts_received: None,
            inheritance: None,
            life_events: Vec::new(),
            seed: 42,
        }
    }
}

/// Aggregated Monte Carlo output for a horizon of N years; every series
/// has N + 1 entries, index 0 being the starting point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResults {
    pub trials: u32,
    pub survival: Vec<u32>,
    pub median: Vec<f64>,
    pub p10: Vec<f64>,
    pub p25: Vec<f64>,
    pub p75: Vec<f64>,
    pub p90: Vec<f64>,
}

impl SimulationResults {
    pub fn years(&self) -> usize {
        self.survival.len().saturating_sub(1)
    }

    pub fn survival_rate(&self, year: usize) -> f64 {
        if self.trials == 0 {
            return 0.0;
        }
        self.survival
            .get(year)
            .map(|&alive| alive as f64 / self.trials as f64)
            .unwrap_or(0.0)
    }

    pub fn final_survival_rate(&self) -> f64 {
        self.survival_rate(self.years())
    }

    pub fn final_median(&self) -> f64 {
        self.median.last().copied().unwrap_or(0.0)
    }

    pub fn final_p10(&self) -> f64 {
        self.p10.last().copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LifecycleRow {
    pub year: i32,
    pub age: u32,
    pub retired: bool,
    pub asset: f64,
    pub contribution: f64,
    pub withdrawal: f64,
    pub pension: f64,
    pub event_cost: f64,
}

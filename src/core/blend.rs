use serde::Serialize;
use tracing::warn;

use super::tables::{
    BUILT_IN_FUNDS, FALLBACK_RATE, FALLBACK_RISK, FUND_CATEGORIES, FundSpec, UNKNOWN_FUND_RISK,
};
use super::types::{BacktestReturns, Fund, FundAllocation};

pub const CUSTOM_CATEGORY: &str = "custom";

/// Allocation-weighted expected return and risk, in percent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Blend {
    pub rate: f64,
    pub risk: f64,
}

impl Blend {
    pub fn expected_return(self) -> f64 {
        self.rate / 100.0
    }

    pub fn volatility(self) -> f64 {
        self.risk / 100.0
    }
}

/// Built-in funds followed by caller-supplied custom funds.
#[derive(Debug, Clone)]
pub struct FundCatalog {
    funds: Vec<Fund>,
}

impl FundCatalog {
    pub fn built_in() -> Self {
        Self {
            funds: BUILT_IN_FUNDS.iter().map(fund_from_spec).collect(),
        }
    }

    pub fn with_custom(custom: &[Fund]) -> Self {
        let mut catalog = Self::built_in();
        catalog.funds.extend(custom.iter().cloned().map(|mut fund| {
            if fund.category.is_empty() {
                fund.category = CUSTOM_CATEGORY.to_string();
            }
            fund
        }));
        catalog
    }

    pub fn lookup(&self, id: &str) -> Option<&Fund> {
        self.funds.iter().find(|f| f.id == id)
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    /// Known categories in display order; custom funds come last.
    pub fn categories(&self) -> Vec<&str> {
        let mut categories: Vec<&str> = FUND_CATEGORIES.to_vec();
        if self.funds.iter().any(|f| f.category == CUSTOM_CATEGORY) {
            categories.push(CUSTOM_CATEGORY);
        }
        categories
    }
}

impl Default for FundCatalog {
    fn default() -> Self {
        Self::built_in()
    }
}

fn fund_from_spec(spec: &FundSpec) -> Fund {
    let [one, three, five, long] = spec.returns;
    Fund {
        id: spec.id.to_string(),
        category: spec.category.to_string(),
        name: spec.name.to_string(),
        rate: spec.rate,
        risk: spec.risk,
        backtest: BacktestReturns {
            one_year: Some(one),
            three_year: Some(three),
            five_year: Some(five),
            long_run: Some(long),
        },
        description: spec.description.to_string(),
    }
}

/// Weighted by the supplied total, so a partial allocation still averages
/// sensibly. Callers must check the total is 100 before simulating.
pub fn blend_allocation(allocations: &[FundAllocation], catalog: &FundCatalog) -> Blend {
    let total: f64 = allocations.iter().map(|a| a.weight).sum();
    if total == 0.0 {
        return Blend {
            rate: FALLBACK_RATE,
            risk: FALLBACK_RISK,
        };
    }

    let mut rate = 0.0;
    let mut risk = 0.0;
    for allocation in allocations {
        let (fund_rate, fund_risk) = match catalog.lookup(&allocation.fund_id) {
            Some(fund) => (fund.rate, fund.risk),
            None => {
                warn!(fund_id = %allocation.fund_id, "allocation references unknown fund");
                (0.0, UNKNOWN_FUND_RISK)
            }
        };
        rate += fund_rate * allocation.weight;
        risk += fund_risk * allocation.weight;
    }

    Blend {
        rate: round_one_decimal(rate / total),
        risk: round_one_decimal(risk / total),
    }
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}

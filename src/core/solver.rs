use serde::Serialize;
use tracing::debug;

use super::engine::{SimulationParams, simulate};
use super::error::PlanError;
use super::tables::{DEFAULT_TARGET_SURVIVAL, MAN, TRIALS};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SearchGoal {
    /// Largest annual withdrawal that still meets the survival target.
    SafeWithdrawal,
    /// Smallest side income, netted off the configured withdrawal, that
    /// meets the survival target.
    SideIncome,
}

#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub goal: SearchGoal,
    pub target_survival: f64,
    pub search_min: f64,
    pub search_max: f64,
    pub tolerance: f64,
    pub max_iterations: u32,
    pub trials_per_iteration: u32,
    pub final_trials: u32,
    pub seed: u64,
}

impl SearchConfig {
    /// Searches `[0, withdrawal]` to within one man-yen, at most 20 halvings.
    pub fn for_goal(goal: SearchGoal, withdrawal: f64, seed: u64) -> Self {
        Self {
            goal,
            target_survival: DEFAULT_TARGET_SURVIVAL,
            search_min: 0.0,
            search_max: withdrawal.max(0.0),
            tolerance: MAN,
            max_iterations: 20,
            trials_per_iteration: TRIALS,
            final_trials: TRIALS,
            seed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchIteration {
    pub iteration: u32,
    pub lower_bound: f64,
    pub upper_bound: f64,
    pub candidate: f64,
    pub survival_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub goal: SearchGoal,
    pub target_survival: f64,
    /// Whole yen: floored for a withdrawal, ceiled for a side income.
    pub solved_value: f64,
    pub achieved_survival_rate: f64,
    pub iterations: Vec<SearchIteration>,
    pub converged: bool,
    pub feasible: bool,
    pub message: String,
}

/// Bisection over the post-retirement simulator. Every candidate reuses the
/// same seed, so two candidates differ only by the value being searched.
pub fn solve_search(base: &SimulationParams, config: SearchConfig) -> Result<SearchResult, PlanError> {
    validate_config(config)?;

    let configured_withdrawal = base.annual_withdrawal;
    let evaluate = |candidate: f64, trials: u32| -> f64 {
        let mut params = base.clone();
        params.trials = trials;
        params.annual_withdrawal = match config.goal {
            SearchGoal::SafeWithdrawal => candidate.max(0.0),
            SearchGoal::SideIncome => (configured_withdrawal - candidate).max(0.0),
        };
        simulate(&params, config.seed).final_survival_rate()
    };
    let meets = |rate: f64| rate + 1e-12 >= config.target_survival;

    let mut iterations = Vec::with_capacity(config.max_iterations as usize);
    let low_rate = evaluate(config.search_min, config.trials_per_iteration);
    let high_rate = evaluate(config.search_max, config.trials_per_iteration);

    let mut converged = false;
    let feasible;
    let solved;
    let message;

    match config.goal {
        SearchGoal::SafeWithdrawal => {
            if meets(high_rate) {
                solved = config.search_max;
                converged = true;
                feasible = true;
                message = "Configured withdrawal already meets the survival target.".to_string();
            } else if !meets(low_rate) {
                solved = config.search_min;
                feasible = false;
                message = "No withdrawal within the search bounds meets the target.".to_string();
            } else {
                let mut lo = config.search_min;
                let mut hi = config.search_max;
                for it in 1..=config.max_iterations {
                    let mid = (lo + hi) * 0.5;
                    let rate = evaluate(mid, config.trials_per_iteration);
                    iterations.push(SearchIteration {
                        iteration: it,
                        lower_bound: lo,
                        upper_bound: hi,
                        candidate: mid,
                        survival_rate: rate,
                    });
                    if meets(rate) {
                        lo = mid;
                    } else {
                        hi = mid;
                    }
                    if (hi - lo).abs() <= config.tolerance {
                        converged = true;
                        break;
                    }
                }
                solved = lo;
                feasible = true;
                message = if converged {
                    "Solved maximum sustainable withdrawal.".to_string()
                } else {
                    "Reached max iterations before tolerance was met; returning best estimate."
                        .to_string()
                };
            }
        }
        SearchGoal::SideIncome => {
            if meets(low_rate) {
                solved = config.search_min;
                converged = true;
                feasible = true;
                message = "No side income is needed to meet the survival target.".to_string();
            } else if !meets(high_rate) {
                solved = config.search_max;
                feasible = false;
                message = "Even a full side income does not meet the target.".to_string();
            } else {
                let mut lo = config.search_min;
                let mut hi = config.search_max;
                for it in 1..=config.max_iterations {
                    let mid = (lo + hi) * 0.5;
                    let rate = evaluate(mid, config.trials_per_iteration);
                    iterations.push(SearchIteration {
                        iteration: it,
                        lower_bound: lo,
                        upper_bound: hi,
                        candidate: mid,
                        survival_rate: rate,
                    });
                    if meets(rate) {
                        hi = mid;
                    } else {
                        lo = mid;
                    }
                    if (hi - lo).abs() <= config.tolerance {
                        converged = true;
                        break;
                    }
                }
                solved = hi;
                feasible = true;
                message = if converged {
                    "Solved minimum side income.".to_string()
                } else {
                    "Reached max iterations before tolerance was met; returning best estimate."
                        .to_string()
                };
            }
        }
    }

    let solved_value = match config.goal {
        SearchGoal::SafeWithdrawal => solved.floor(),
        SearchGoal::SideIncome => solved.ceil(),
    };
    let achieved_survival_rate = evaluate(solved_value, config.final_trials);
    debug!(
        goal = ?config.goal,
        solved_value,
        achieved_survival_rate,
        iterations = iterations.len(),
        feasible,
        "search finished"
    );

    Ok(SearchResult {
        goal: config.goal,
        target_survival: config.target_survival,
        solved_value,
        achieved_survival_rate,
        iterations,
        converged,
        feasible,
        message,
    })
}

pub fn find_safe_withdrawal(base: &SimulationParams, seed: u64) -> Result<SearchResult, PlanError> {
    solve_search(
        base,
        SearchConfig::for_goal(SearchGoal::SafeWithdrawal, base.annual_withdrawal, seed),
    )
}

pub fn find_safe_side_income(base: &SimulationParams, seed: u64) -> Result<SearchResult, PlanError> {
    solve_search(
        base,
        SearchConfig::for_goal(SearchGoal::SideIncome, base.annual_withdrawal, seed),
    )
}

fn validate_config(config: SearchConfig) -> Result<(), PlanError> {
    if !(0.0..=1.0).contains(&config.target_survival) {
        return Err(PlanError::InvalidSearch(
            "target survival must be between 0 and 1",
        ));
    }
    if !config.search_min.is_finite() || !config.search_max.is_finite() {
        return Err(PlanError::InvalidSearch("search bounds must be finite"));
    }
    if config.search_max < config.search_min {
        return Err(PlanError::InvalidSearch(
            "search max must not be below search min",
        ));
    }
    if !config.tolerance.is_finite() || config.tolerance <= 0.0 {
        return Err(PlanError::InvalidSearch("tolerance must be > 0"));
    }
    if config.max_iterations == 0 {
        return Err(PlanError::InvalidSearch("max iterations must be > 0"));
    }
    if config.trials_per_iteration == 0 || config.final_trials == 0 {
        return Err(PlanError::InvalidSearch("trial counts must be > 0"));
    }
    Ok(())
}

use rayon::prelude::*;
use tracing::debug;

use super::events::EventSchedule;
use super::rng::{RandomSource, SeededSource, derive_seed};
use super::tables::{CAPITAL_GAINS_NET, CRASH_RETURN_THRESHOLD, RESERVE_COVER_SHARE, TRIALS};
use super::types::SimulationResults;

const TRIAL_STREAM: u64 = 0;

/// One simulator invocation. Money in yen, rates as fractions. Years are
/// numbered from 1; year 0 is the starting balance.
#[derive(Debug, Clone)]
pub struct SimulationParams {
    pub initial_balance: f64,
    pub annual_contribution: f64,
    pub annual_withdrawal: f64,
    pub years: u32,
    /// Contributions are paid through this year, withdrawals start after it.
    pub retire_year: u32,
    pub expected_return: f64,
    pub volatility: f64,
    pub events: EventSchedule,
    pub pension_income: f64,
    pub pension_start_year: Option<u32>,
    pub apply_capital_gains_tax: bool,
    pub emergency_reserve: f64,
    pub use_reserve_on_crash: bool,
    pub trials: u32,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            initial_balance: 0.0,
            annual_contribution: 0.0,
            annual_withdrawal: 0.0,
            years: 0,
            retire_year: 0,
            expected_return: 0.0,
            volatility: 0.0,
            events: EventSchedule::default(),
            pension_income: 0.0,
            pension_start_year: None,
            apply_capital_gains_tax: false,
            emergency_reserve: 0.0,
            use_reserve_on_crash: false,
            trials: TRIALS,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TrialPath {
    pub balances: Vec<f64>,
    /// First year the balance hit zero; the trial counts as dead from then on.
    pub depleted_in: Option<usize>,
}

impl TrialPath {
    fn alive_in(&self, year: usize) -> bool {
        self.depleted_in.is_none_or(|depleted| year < depleted)
    }
}

/// Net-of-tax gain: the capital-gains haircut only touches positive gains.
pub fn net_gain(gain: f64, apply_tax: bool) -> f64 {
    if apply_tax && gain > 0.0 {
        gain * CAPITAL_GAINS_NET
    } else {
        gain
    }
}

pub(crate) fn run_trial<R: RandomSource + ?Sized>(
    params: &SimulationParams,
    source: &mut R,
) -> TrialPath {
    let mut balance = params.initial_balance;
    let mut reserve = params.emergency_reserve;
    let mut balances = Vec::with_capacity(params.years as usize + 1);
    balances.push(balance);
    let mut depleted_in = None;

    for year in 1..=params.years {
        let r = params.expected_return + params.volatility * source.standard_normal();
        let gain = net_gain(balance * r, params.apply_capital_gains_tax);

        let retired = year > params.retire_year;
        let contribution = if retired {
            0.0
        } else {
            params.annual_contribution
        };
        let withdrawal = if retired {
            params.annual_withdrawal
        } else {
            0.0
        };
        let pension = match params.pension_start_year {
            Some(start) if year >= start => params.pension_income,
            _ => 0.0,
        };
        let mut need = withdrawal + params.events.cost_at(year) - pension;

        if params.use_reserve_on_crash && r < CRASH_RETURN_THRESHOLD && need > 0.0 && reserve > 0.0
        {
            let from_reserve = reserve.min(need * RESERVE_COVER_SHARE);
            reserve = (reserve - from_reserve).max(0.0);
            need -= from_reserve;
        }

        balance = (balance + gain + contribution - need).max(0.0);
        if balance <= 0.0 && depleted_in.is_none() {
            depleted_in = Some(year as usize);
        }
        balances.push(balance);
    }

    TrialPath {
        balances,
        depleted_in,
    }
}

/// Runs `params.trials` trials in parallel. Each trial owns a generator
/// seeded from `seed` and its index, so the result is reproducible.
pub fn simulate(params: &SimulationParams, seed: u64) -> SimulationResults {
    let paths: Vec<TrialPath> = (0..params.trials)
        .into_par_iter()
        .map(|trial| {
            let mut source = SeededSource::new(derive_seed(seed, TRIAL_STREAM, trial));
            run_trial(params, &mut source)
        })
        .collect();
    aggregate(params, &paths)
}

/// Sequential variant drawing every trial from one injected source.
pub fn simulate_with_source<R: RandomSource + ?Sized>(
    params: &SimulationParams,
    source: &mut R,
) -> SimulationResults {
    let paths: Vec<TrialPath> = (0..params.trials)
        .map(|_| run_trial(params, source))
        .collect();
    aggregate(params, &paths)
}

fn aggregate(params: &SimulationParams, paths: &[TrialPath]) -> SimulationResults {
    let year_count = params.years as usize + 1;
    let mut survival = vec![0_u32; year_count];
    let mut median = Vec::with_capacity(year_count);
    let mut p10 = Vec::with_capacity(year_count);
    let mut p25 = Vec::with_capacity(year_count);
    let mut p75 = Vec::with_capacity(year_count);
    let mut p90 = Vec::with_capacity(year_count);

    let mut column = Vec::with_capacity(paths.len());
    for year in 0..year_count {
        column.clear();
        for path in paths {
            if path.alive_in(year) {
                survival[year] += 1;
            }
            column.push(path.balances[year]);
        }
        column.sort_by(|a, b| a.total_cmp(b));
        p10.push(rank_value(&column, 0.10));
        p25.push(rank_value(&column, 0.25));
        median.push(rank_value(&column, 0.50));
        p75.push(rank_value(&column, 0.75));
        p90.push(rank_value(&column, 0.90));
    }

    let results = SimulationResults {
        trials: paths.len() as u32,
        survival,
        median,
        p10,
        p25,
        p75,
        p90,
    };
    debug!(
        years = params.years,
        trials = results.trials,
        final_survival = results.final_survival_rate(),
        final_median = results.final_median(),
        "simulation finished"
    );
    results
}

/// Value at rank `floor(n * p)` of an ascending slice.
fn rank_value(sorted: &[f64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((sorted.len() as f64 * p).floor() as usize).min(sorted.len() - 1);
    sorted[idx]
}

mod blend;
mod diagnostics;
mod engine;
mod error;
mod events;
mod format;
mod ledger;
mod pension;
mod plan;
mod rng;
mod solver;
pub mod tables;
mod tax;
mod types;

pub use blend::{Blend, CUSTOM_CATEGORY, FundCatalog, blend_allocation};
pub use diagnostics::{
    FireKind, FireThreshold, PercentileLabel, PercentilePlacement, WealthTier, fire_thresholds,
    percentile_rank, wealth_tier,
};
pub use engine::{SimulationParams, net_gain, simulate, simulate_with_source};
pub use error::PlanError;
pub use events::{EventSchedule, add_children, build_event_schedule};
pub use format::{format_man, format_man_bare, format_yen, to_man, to_yen};
pub use ledger::build_lifecycle;
pub use pension::{
    PartnerEntitlement, PensionEntitlement, annuity_future_value, calc_partner_pension,
    calc_pension,
};
pub use plan::{EstateSummary, PensionSummary, PlanReport, estate_summary, run_plan, validate_profile};
pub use rng::{RandomSource, SeededSource, derive_seed};
pub use solver::{
    SearchConfig, SearchGoal, SearchIteration, SearchResult, find_safe_side_income,
    find_safe_withdrawal, solve_search,
};
pub use tax::{
    InheritanceSettlement, gift_tax_saving, gross_to_net, inheritance_deduction, inheritance_tax,
    settle_inheritance,
};
pub use types::{
    BacktestReturns, ChildProfile, DefinedContribution, Fund, FundAllocation, GiftPlan,
    GiftReceipt, HouseholdProfile, InheritanceReceipt, LifeEvent, LifecycleRow, PartnerProfile,
    PensionProfile, PensionScheme, RealEstate, SchoolTrack, SchoolingPlan, SimulationResults,
    UniversityTrack,
};

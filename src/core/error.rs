use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlanError {
    #[error("fund allocation is empty")]
    EmptyAllocation,
    #[error("fund allocation must total 100% (got {total}%)")]
    AllocationTotal { total: f64 },
    #[error("life expectancy {life_expectancy} is below current age {current_age}")]
    InvalidHorizon { current_age: u32, life_expectancy: u32 },
    #[error("{field} must be a finite number")]
    NonFinite { field: &'static str },
    #[error("invalid search configuration: {0}")]
    InvalidSearch(&'static str),
}

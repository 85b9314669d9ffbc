use fire_compass::core::{
    ChildProfile, FundAllocation, FundCatalog, HouseholdProfile, PlanError, SchoolingPlan,
    run_plan, tables::MAN,
};

#[test]
fn default_household_produces_a_complete_report() {
    let profile = HouseholdProfile::default();
    let report = run_plan(&profile, &FundCatalog::built_in()).expect("default plan runs");

    assert_eq!(report.pre_retirement.years(), 20);
    assert_eq!(report.post_retirement.years(), 35);
    assert_eq!(report.lifecycle.len(), 56);
    assert_eq!(report.lifecycle[0].asset, profile.total_liquid_assets());
    assert_eq!(report.fire.len(), 4);
    assert!((0.0..=1.0).contains(&report.final_survival_rate));
    assert!(report.pension.total_annual > 0.0);
    assert_eq!(report.estate.heirs, 2);
}

#[test]
fn newborn_education_flows_into_schedule_ledger_and_heirs() {
    let profile = HouseholdProfile::default().revise(|p| {
        p.children = vec![ChildProfile {
            birth_year: p.current_year,
            schooling: SchoolingPlan::default(),
        }]
    });
    let report = run_plan(&profile, &FundCatalog::built_in()).expect("plan runs");

    assert_eq!(report.events.total(), 840.0 * MAN);
    let ledger_events: f64 = report.lifecycle.iter().map(|row| row.event_cost).sum();
    assert_eq!(ledger_events, 840.0 * MAN);
    assert_eq!(report.lifecycle[3].event_cost, 233_334.0);
    assert_eq!(report.estate.heirs, 1);
}

#[test]
fn plan_rejects_allocation_not_totalling_100() {
    let profile = HouseholdProfile::default()
        .revise(|p| p.allocations = vec![FundAllocation::new("sp500", 90.0)]);
    let err = run_plan(&profile, &FundCatalog::built_in()).expect_err("must reject");
    assert!(matches!(err, PlanError::AllocationTotal { .. }));
}

#[test]
fn wealthy_household_skips_withdrawal_searches() {
    let profile = HouseholdProfile::default().revise(|p| {
        p.investable_assets = 50_000.0 * MAN;
        p.allocations = vec![FundAllocation::new("bond", 100.0)];
    });
    let report = run_plan(&profile, &FundCatalog::built_in()).expect("plan runs");

    assert_eq!(report.final_survival_rate, 1.0);
    assert!(report.post_retirement.final_p10() > 0.0);
    assert!(report.safe_withdrawal.is_none());
    assert!(report.safe_side_income.is_none());
}

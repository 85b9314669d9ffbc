use std::collections::BTreeMap;

use serde::Serialize;

use super::tables::{MAN, SCHOOL_PHASES, school_phase_cost};
use super::tax::settle_inheritance;
use super::types::{ChildProfile, HouseholdProfile};

/// Net cash impact per year offset (0 = current year), in yen. Positive is
/// an outflow, negative an inflow. Offsets outside `0..=horizon` are dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventSchedule {
    horizon: u32,
    costs: BTreeMap<u32, f64>,
}

impl EventSchedule {
    pub fn new(horizon: u32) -> Self {
        Self {
            horizon,
            costs: BTreeMap::new(),
        }
    }

    pub fn horizon(&self) -> u32 {
        self.horizon
    }

    pub fn add(&mut self, offset: i64, amount: f64) {
        if offset < 0 || offset > self.horizon as i64 || amount == 0.0 {
            return;
        }
        *self.costs.entry(offset as u32).or_insert(0.0) += amount;
    }

    pub fn cost_at(&self, offset: u32) -> f64 {
        self.costs.get(&offset).copied().unwrap_or(0.0)
    }

    pub fn total(&self) -> f64 {
        self.costs.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, f64)> + '_ {
        self.costs.iter().map(|(&offset, &cost)| (offset, cost))
    }

    /// Re-bases the schedule so that offset `start` becomes offset 0.
    pub fn starting_at(&self, start: u32) -> Self {
        Self {
            horizon: self.horizon.saturating_sub(start),
            costs: self
                .costs
                .range(start..)
                .map(|(&offset, &cost)| (offset - start, cost))
                .collect(),
        }
    }
}

/// Spreads each school phase's cost evenly over its years, in whole yen,
/// with any remainder falling in the first years of the phase.
pub fn add_children(schedule: &mut EventSchedule, children: &[ChildProfile], current_year: i32) {
    for child in children {
        for span in &SCHOOL_PHASES {
            let total = (school_phase_cost(span.phase, &child.schooling) * MAN).round() as i64;
            let years = span.years as i64;
            let per_year = total / years;
            let remainder = total % years;
            for i in 0..years {
                let offset =
                    child.birth_year as i64 + span.start_age as i64 + i - current_year as i64;
                let extra = if i < remainder { 1 } else { 0 };
                schedule.add(offset, (per_year + extra) as f64);
            }
        }
    }
}

pub fn build_event_schedule(profile: &HouseholdProfile) -> EventSchedule {
    let mut schedule = EventSchedule::new(profile.horizon_years());
    add_children(&mut schedule, &profile.children, profile.current_year);

    for event in &profile.life_events {
        schedule.add(event.year as i64 - profile.current_year as i64, event.cost);
    }

    if let Some(gift) = profile.gifts_given {
        for offset in 0..gift.years.min(schedule.horizon().saturating_add(1)) {
            schedule.add(offset as i64, gift.annual_amount * gift.recipients as f64);
        }
    }

    if let Some(receipt) = profile.gifts_received {
        for offset in 0..receipt.years.min(schedule.horizon().saturating_add(1)) {
            schedule.add(offset as i64, -receipt.annual_amount);
        }
    }

    if let Some(inheritance) = profile.inheritance.as_ref() {
        let settled = settle_inheritance(inheritance);
        schedule.add(
            inheritance.year as i64 - profile.current_year as i64,
            -settled.net_received,
        );
    }

    schedule
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tables::{SchoolPhase, school_phase_cost};
    use crate::core::types::{
        GiftPlan, GiftReceipt, InheritanceReceipt, LifeEvent, SchoolTrack, SchoolingPlan,
        UniversityTrack,
    };

    fn public_total() -> f64 {
        let plan = SchoolingPlan::default();
        [
            SchoolPhase::EarlyChildhood,
            SchoolPhase::Elementary,
            SchoolPhase::JuniorHigh,
            SchoolPhase::SeniorHigh,
            SchoolPhase::University,
        ]
        .iter()
        .map(|&phase| school_phase_cost(phase, &plan) * MAN)
        .sum()
    }

    #[test]
    fn newborn_on_public_track_sums_to_public_phase_costs() {
        let profile = HouseholdProfile::default().revise(|p| {
            p.children = vec![ChildProfile {
                birth_year: p.current_year,
                schooling: SchoolingPlan::default(),
            }]
        });
        let schedule = build_event_schedule(&profile);
        assert_eq!(schedule.total(), public_total());
        assert_eq!(schedule.total(), 840.0 * MAN);
        // Kindergarten starts at three.
        assert_eq!(schedule.cost_at(2), 0.0);
        assert_eq!(schedule.cost_at(3), 233_334.0);
        assert_eq!(schedule.cost_at(5), 233_333.0);
    }

    #[test]
    fn phases_before_current_year_are_skipped() {
        let profile = HouseholdProfile::default().revise(|p| {
            p.children = vec![ChildProfile {
                birth_year: p.current_year - 20,
                schooling: SchoolingPlan {
                    university: UniversityTrack::Medical,
                    ..SchoolingPlan::default()
                },
            }]
        });
        let schedule = build_event_schedule(&profile);
        // Only university years 20 and 21 remain.
        assert_eq!(schedule.iter().count(), 2);
        assert_eq!(schedule.total(), 1_500.0 * MAN);
    }

    #[test]
    fn private_tracks_cost_more() {
        let mut schedule = EventSchedule::new(40);
        add_children(
            &mut schedule,
            &[ChildProfile {
                birth_year: 2025,
                schooling: SchoolingPlan {
                    early_childhood: SchoolTrack::Private,
                    elementary: SchoolTrack::Private,
                    junior_high: SchoolTrack::Private,
                    senior_high: SchoolTrack::Private,
                    university: UniversityTrack::Private,
                },
            }],
            2025,
        );
        assert_eq!(schedule.total(), (158.0 + 1_000.0 + 430.0 + 315.0 + 430.0) * MAN);
    }

    #[test]
    fn events_gifts_and_inheritance_land_in_their_offsets() {
        let profile = HouseholdProfile::default().revise(|p| {
            p.life_events = vec![
                LifeEvent {
                    year: p.current_year + 2,
                    cost: 100.0 * MAN,
                },
                LifeEvent {
                    year: p.current_year - 1,
                    cost: 999.0 * MAN,
                },
                LifeEvent {
                    year: p.current_year + 500,
                    cost: 999.0 * MAN,
                },
            ];
            p.gifts_given = Some(GiftPlan {
                annual_amount: 110.0 * MAN,
                recipients: 2,
                years: 3,
            });
            p.gifts_received = Some(GiftReceipt {
                annual_amount: 50.0 * MAN,
                years: 1,
            });
            p.inheritance = Some(InheritanceReceipt {
                estate: 2_000.0 * MAN,
                year: p.current_year + 10,
                siblings: 0,
                debt: None,
                invest_ratio: 0.5,
            });
        });
        let schedule = build_event_schedule(&profile);

        assert_eq!(schedule.cost_at(0), 170.0 * MAN);
        assert_eq!(schedule.cost_at(1), 220.0 * MAN);
        assert_eq!(schedule.cost_at(2), 320.0 * MAN);
        assert_eq!(schedule.cost_at(3), 0.0);
        assert_eq!(schedule.cost_at(10), -2_000.0 * MAN);
        assert!(schedule.iter().all(|(offset, _)| offset <= schedule.horizon()));
    }

    #[test]
    fn extreme_years_fall_outside_the_horizon() {
        let profile = HouseholdProfile::default().revise(|p| {
            p.children = vec![
                ChildProfile {
                    birth_year: i32::MAX,
                    schooling: SchoolingPlan::default(),
                },
                ChildProfile {
                    birth_year: i32::MIN,
                    schooling: SchoolingPlan::default(),
                },
            ];
            p.life_events = vec![LifeEvent {
                year: i32::MIN,
                cost: 100.0 * MAN,
            }];
            p.gifts_given = Some(GiftPlan {
                annual_amount: 110.0 * MAN,
                recipients: 1,
                years: u32::MAX,
            });
            p.inheritance = Some(InheritanceReceipt {
                estate: 2_000.0 * MAN,
                year: i32::MAX,
                siblings: u32::MAX,
                debt: None,
                invest_ratio: 0.5,
            });
        });
        let schedule = build_event_schedule(&profile);
        // Only the gift survives, once per year of the horizon.
        assert_eq!(schedule.iter().count(), schedule.horizon() as usize + 1);
        assert_eq!(
            schedule.total(),
            110.0 * MAN * (schedule.horizon() + 1) as f64
        );
    }

    #[test]
    fn starting_at_rebases_offsets() {
        let mut schedule = EventSchedule::new(10);
        schedule.add(2, 5.0);
        schedule.add(7, 9.0);
        let tail = schedule.starting_at(5);
        assert_eq!(tail.horizon(), 5);
        assert_eq!(tail.cost_at(2), 9.0);
        assert_eq!(tail.total(), 9.0);
    }
}

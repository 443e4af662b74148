//! Rule-driven shift assignment.
//!
//! The generator walks the period day by day and, for every staff member,
//! narrows the candidate set {MORNING, EVENING, DAY_OFF} with the enabled
//! rules before picking one uniformly at random. It is a constrained random
//! walk, not an optimiser.

use std::collections::{BTreeSet, HashMap};

use chrono::{Days, IsoWeek, NaiveDate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use thiserror::Error;
use tracing::debug;

use super::calendar;
use super::rules::RuleConfig;
use super::shift::{Assignment, ShiftKind};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("period length must be at least one week")]
    EmptyPeriod,

    #[error("date {begin} + {offset} days is outside the supported calendar")]
    DateOutOfRange { begin: NaiveDate, offset: u64 },
}

/// Per-staff bookkeeping while a period is generated.
#[derive(Debug, Default)]
struct StaffLedger {
    /// Positions of this person's assignments in the output, in date order.
    positions: Vec<usize>,
    mornings: u32,
    evenings: u32,
    last: Option<ShiftKind>,
}

impl StaffLedger {
    fn count(&mut self, shift: ShiftKind) {
        match shift {
            ShiftKind::Morning => self.mornings += 1,
            ShiftKind::Evening => self.evenings += 1,
            ShiftKind::DayOff => {}
        }
    }

    fn uncount(&mut self, shift: ShiftKind) {
        match shift {
            ShiftKind::Morning => self.mornings = self.mornings.saturating_sub(1),
            ShiftKind::Evening => self.evenings = self.evenings.saturating_sub(1),
            ShiftKind::DayOff => {}
        }
    }

    fn day_offs_in_week(&self, assignments: &[Assignment], week: IsoWeek) -> u32 {
        let mut taken = 0;
        for &pos in self.positions.iter().rev() {
            let assignment = &assignments[pos];
            if calendar::iso_week(assignment.date) != week {
                break;
            }
            if assignment.shift == ShiftKind::DayOff {
                taken += 1;
            }
        }
        taken
    }
}

/// Produces a full period of assignments for a staff set.
#[derive(Debug, Clone, Copy)]
pub struct AssignmentGenerator {
    rules: RuleConfig,
}

impl AssignmentGenerator {
    pub fn new(rules: RuleConfig) -> Self {
        Self { rules }
    }

    /// Generate with a freshly seeded RNG.
    pub fn generate(
        &self,
        staff_ids: &BTreeSet<String>,
        week_begin: NaiveDate,
    ) -> Result<Vec<Assignment>, GenerationError> {
        let mut rng = StdRng::from_entropy();
        self.generate_with_rng(staff_ids, week_begin, &mut rng)
    }

    /// Generate with a caller-provided RNG; identical seeds give identical output.
    ///
    /// Output is day-major, then staff-major in `staff_ids` order.
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        staff_ids: &BTreeSet<String>,
        week_begin: NaiveDate,
        rng: &mut R,
    ) -> Result<Vec<Assignment>, GenerationError> {
        let total_days = calendar::period_days(self.rules.period_weeks);
        if total_days == 0 {
            return Err(GenerationError::EmptyPeriod);
        }

        let mut assignments: Vec<Assignment> =
            Vec::with_capacity(staff_ids.len() * total_days as usize);
        let mut ledgers: HashMap<&str, StaffLedger> = staff_ids
            .iter()
            .map(|id| (id.as_str(), StaffLedger::default()))
            .collect();

        for offset in 0..total_days {
            let date = week_begin
                .checked_add_days(Days::new(offset))
                .ok_or(GenerationError::DateOutOfRange {
                    begin: week_begin,
                    offset,
                })?;
            let week = calendar::iso_week(date);

            for staff_id in staff_ids {
                let Some(ledger) = ledgers.get_mut(staff_id.as_str()) else {
                    continue;
                };
                let mut candidates = ShiftKind::ALL.to_vec();

                if self.rules.avoid_morning_after_evening && ledger.last == Some(ShiftKind::Evening)
                {
                    candidates.retain(|s| *s != ShiftKind::Morning);
                }

                if self.rules.day_off.enabled {
                    let quota = self.rules.day_off.days_per_week;
                    let taken = ledger.day_offs_in_week(&assignments, week);
                    if taken >= quota {
                        candidates.retain(|s| *s != ShiftKind::DayOff);
                    }
                    if calendar::is_week_end(date) && taken < quota {
                        record(&mut assignments, ledger, staff_id, date, ShiftKind::DayOff);
                        let converted =
                            backfill_day_offs(&mut assignments, ledger, date, quota - taken - 1);
                        debug!(
                            staff_id = %staff_id,
                            %date,
                            taken,
                            quota,
                            converted,
                            "forced day-off backfill at week end"
                        );
                        continue;
                    }
                } else {
                    candidates.retain(|s| *s != ShiftKind::DayOff);
                }

                if self.rules.balance_shifts {
                    if ledger.mornings < ledger.evenings {
                        candidates.retain(|s| *s != ShiftKind::Evening);
                    } else if ledger.evenings < ledger.mornings {
                        candidates.retain(|s| *s != ShiftKind::Morning);
                    }
                }

                let shift = candidates
                    .choose(&mut *rng)
                    .copied()
                    .unwrap_or(ShiftKind::Evening);
                record(&mut assignments, ledger, staff_id, date, shift);
            }
        }

        Ok(assignments)
    }
}

fn record(
    assignments: &mut Vec<Assignment>,
    ledger: &mut StaffLedger,
    staff_id: &str,
    date: NaiveDate,
    shift: ShiftKind,
) {
    ledger.positions.push(assignments.len());
    ledger.count(shift);
    ledger.last = Some(shift);
    assignments.push(Assignment::new(staff_id, date, shift));
}

/// Walk back from the day before `week_end` towards the start of its week,
/// turning working shifts into days off until `missing` is covered. The
/// first day of the week is never touched. Returns how many were converted.
fn backfill_day_offs(
    assignments: &mut [Assignment],
    ledger: &mut StaffLedger,
    week_end: NaiveDate,
    mut missing: u32,
) -> u32 {
    let mut converted = 0;
    let mut cursor = week_end.pred_opt();
    while missing > 0 {
        let Some(day) = cursor else { break };
        if calendar::is_week_start(day) {
            break;
        }
        let found = ledger
            .positions
            .iter()
            .rev()
            .copied()
            .find(|&pos| assignments[pos].date == day);
        if let Some(pos) = found {
            let previous = assignments[pos].shift;
            if previous.is_working() {
                assignments[pos].shift = ShiftKind::DayOff;
                ledger.uncount(previous);
                missing -= 1;
                converted += 1;
            }
        }
        cursor = day.pred_opt();
    }
    converted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::rules::DayOffRule;
    use chrono::Datelike;

    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn staff(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn shifts_of<'a>(assignments: &'a [Assignment], id: &str) -> Vec<&'a Assignment> {
        assignments.iter().filter(|a| a.staff_id == id).collect()
    }

    #[test]
    fn no_rules_yields_one_working_shift_per_person_per_day() {
        let generator = AssignmentGenerator::new(RuleConfig::unconstrained(1));
        let mut rng = StdRng::seed_from_u64(7);
        let out = generator
            .generate_with_rng(&staff(&["a", "b", "c"]), monday(), &mut rng)
            .unwrap();

        assert_eq!(out.len(), 21);
        assert!(out.iter().all(|a| a.shift != ShiftKind::DayOff));
    }

    #[test]
    fn output_is_day_major_then_staff_major() {
        let generator = AssignmentGenerator::new(RuleConfig::unconstrained(1));
        let mut rng = StdRng::seed_from_u64(1);
        let out = generator
            .generate_with_rng(&staff(&["b", "a"]), monday(), &mut rng)
            .unwrap();

        assert_eq!(out[0].staff_id, "a");
        assert_eq!(out[1].staff_id, "b");
        assert_eq!(out[0].date, monday());
        assert_eq!(out[2].date, monday().succ_opt().unwrap());
    }

    #[test]
    fn every_date_is_inside_the_period() {
        let rules = RuleConfig {
            period_weeks: 3,
            ..RuleConfig::default()
        };
        let generator = AssignmentGenerator::new(rules);
        let mut rng = StdRng::seed_from_u64(42);
        let out = generator
            .generate_with_rng(&staff(&["a", "b", "c", "d"]), monday(), &mut rng)
            .unwrap();

        let last = calendar::period_end(monday(), 3).unwrap();
        assert!(out.iter().all(|a| a.date >= monday() && a.date <= last));
        assert_eq!(out.len(), 4 * 21);
    }

    #[test]
    fn at_most_one_assignment_per_person_and_date() {
        let generator = AssignmentGenerator::new(RuleConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        let out = generator
            .generate_with_rng(&staff(&["a", "b", "c"]), monday(), &mut rng)
            .unwrap();

        let mut seen = std::collections::HashSet::new();
        for a in &out {
            assert!(seen.insert((a.staff_id.clone(), a.date)), "duplicate {a:?}");
        }
    }

    #[test]
    fn never_morning_after_evening_when_enabled() {
        let ids = staff(&["a", "b", "c", "d", "e"]);
        for seed in 0..50 {
            let rules = RuleConfig {
                period_weeks: 4,
                ..RuleConfig::default()
            };
            let generator = AssignmentGenerator::new(rules);
            let mut rng = StdRng::seed_from_u64(seed);
            let out = generator.generate_with_rng(&ids, monday(), &mut rng).unwrap();

            for id in &ids {
                let mine = shifts_of(&out, id);
                for pair in mine.windows(2) {
                    assert_eq!(pair[1].date, pair[0].date.succ_opt().unwrap());
                    assert!(
                        !(pair[0].shift == ShiftKind::Evening
                            && pair[1].shift == ShiftKind::Morning),
                        "seed {seed}: {id} works MORNING on {} after EVENING",
                        pair[1].date
                    );
                }
            }
        }
    }

    #[test]
    fn day_off_quota_is_met_exactly_each_week() {
        let ids = staff(&["a", "b", "c"]);
        for seed in 0..30 {
            let rules = RuleConfig {
                period_weeks: 3,
                avoid_morning_after_evening: false,
                balance_shifts: false,
                day_off: DayOffRule {
                    enabled: true,
                    days_per_week: 2,
                },
            };
            let generator = AssignmentGenerator::new(rules);
            let mut rng = StdRng::seed_from_u64(seed);
            let out = generator.generate_with_rng(&ids, monday(), &mut rng).unwrap();

            for id in &ids {
                let mut per_week: HashMap<IsoWeek, u32> = HashMap::new();
                for a in shifts_of(&out, id) {
                    if a.shift == ShiftKind::DayOff {
                        *per_week.entry(a.date.iso_week()).or_default() += 1;
                    }
                }
                assert_eq!(per_week.len(), 3, "seed {seed}: {id} {per_week:?}");
                assert!(per_week.values().all(|&n| n == 2), "seed {seed}: {per_week:?}");
            }
        }
    }

    #[test]
    fn backfill_reaches_back_to_tuesday() {
        // A quota this high can never be satisfied before Sunday, so every
        // week ends with a forced backfill reaching back to Tuesday.
        let rules = RuleConfig {
            period_weeks: 1,
            avoid_morning_after_evening: false,
            balance_shifts: false,
            day_off: DayOffRule {
                enabled: true,
                days_per_week: 7,
            },
        };
        let generator = AssignmentGenerator::new(rules);
        let mut rng = StdRng::seed_from_u64(11);
        let out = generator
            .generate_with_rng(&staff(&["a"]), monday(), &mut rng)
            .unwrap();

        assert_eq!(out.len(), 7);
        for a in &out {
            if a.date.weekday() != chrono::Weekday::Mon {
                assert_eq!(a.shift, ShiftKind::DayOff, "{a:?}");
            }
        }
    }

    #[test]
    fn forced_backfill_still_assigns_every_other_person() {
        let rules = RuleConfig {
            period_weeks: 1,
            avoid_morning_after_evening: false,
            balance_shifts: false,
            day_off: DayOffRule {
                enabled: true,
                days_per_week: 6,
            },
        };
        let generator = AssignmentGenerator::new(rules);
        let mut rng = StdRng::seed_from_u64(5);
        let out = generator
            .generate_with_rng(&staff(&["a", "b", "c"]), monday(), &mut rng)
            .unwrap();

        let sunday = calendar::period_end(monday(), 1).unwrap();
        let on_sunday: Vec<_> = out.iter().filter(|a| a.date == sunday).collect();
        assert_eq!(on_sunday.len(), 3);
        assert_eq!(out.len(), 21);
    }

    #[test]
    fn balance_keeps_counts_within_one() {
        let rules = RuleConfig {
            period_weeks: 4,
            avoid_morning_after_evening: false,
            balance_shifts: true,
            day_off: DayOffRule {
                enabled: false,
                days_per_week: 0,
            },
        };
        let ids = staff(&["a", "b"]);
        let generator = AssignmentGenerator::new(rules);
        let mut rng = StdRng::seed_from_u64(99);
        let out = generator.generate_with_rng(&ids, monday(), &mut rng).unwrap();

        for id in &ids {
            let mine = shifts_of(&out, id);
            let mornings = mine.iter().filter(|a| a.shift == ShiftKind::Morning).count() as i64;
            let evenings = mine.iter().filter(|a| a.shift == ShiftKind::Evening).count() as i64;
            assert!((mornings - evenings).abs() <= 1, "{id}: {mornings} vs {evenings}");
        }
    }

    #[test]
    fn conflicting_rules_fall_back_to_evening() {
        // After an EVENING the morning is banned; if the person is also
        // behind on mornings, balancing bans EVENING and nothing remains.
        let rules = RuleConfig {
            period_weeks: 1,
            avoid_morning_after_evening: true,
            balance_shifts: true,
            day_off: DayOffRule {
                enabled: false,
                days_per_week: 0,
            },
        };
        let generator = AssignmentGenerator::new(rules);
        let mut rng = StdRng::seed_from_u64(0);
        let out = generator
            .generate_with_rng(&staff(&["a"]), monday(), &mut rng)
            .unwrap();

        for pair in out.windows(2) {
            if pair[0].shift == ShiftKind::Evening {
                assert_eq!(pair[1].shift, ShiftKind::Evening);
            }
        }
    }

    #[test]
    fn same_seed_same_schedule() {
        let generator = AssignmentGenerator::new(RuleConfig::default());
        let ids = staff(&["a", "b", "c"]);
        let first = generator
            .generate_with_rng(&ids, monday(), &mut StdRng::seed_from_u64(21))
            .unwrap();
        let second = generator
            .generate_with_rng(&ids, monday(), &mut StdRng::seed_from_u64(21))
            .unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_staff_set_yields_no_assignments() {
        let generator = AssignmentGenerator::new(RuleConfig::default());
        let out = generator.generate(&BTreeSet::new(), monday()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn zero_weeks_is_rejected() {
        let generator = AssignmentGenerator::new(RuleConfig::unconstrained(0));
        let err = generator.generate(&staff(&["a"]), monday()).unwrap_err();
        assert_eq!(err, GenerationError::EmptyPeriod);
    }

    #[test]
    fn date_overflow_is_an_error() {
        let generator = AssignmentGenerator::new(RuleConfig::unconstrained(1));
        let err = generator
            .generate(&staff(&["a"]), NaiveDate::MAX)
            .unwrap_err();
        assert!(matches!(err, GenerationError::DateOutOfRange { offset: 1, .. }));
    }
}

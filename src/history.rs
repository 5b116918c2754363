//! The day-by-day record of a run.
//!
//! A `History` only ever grows by one `DailySnapshot` per simulated day. `push` refuses any
//! snapshot whose day does not follow the previous one or whose counts do not add up to the
//! population, so a history that exists is always gap-free and conserves individuals.
use serde::{Deserialize, Serialize};

use crate::disease::DiseaseState;
use crate::error::EpiError;

/// Population counts by state at the end of one day.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DailySnapshot {
    pub day: u32,
    pub susceptible: usize,
    pub exposed: usize,
    pub infectious: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl DailySnapshot {
    #[must_use]
    pub fn count(&self, state: DiseaseState) -> usize {
        match state {
            DiseaseState::Susceptible => self.susceptible,
            DiseaseState::Exposed => self.exposed,
            DiseaseState::Infectious => self.infectious,
            DiseaseState::Recovered => self.recovered,
            DiseaseState::Dead => self.dead,
        }
    }

    pub(crate) fn count_mut(&mut self, state: DiseaseState) -> &mut usize {
        match state {
            DiseaseState::Susceptible => &mut self.susceptible,
            DiseaseState::Exposed => &mut self.exposed,
            DiseaseState::Infectious => &mut self.infectious,
            DiseaseState::Recovered => &mut self.recovered,
            DiseaseState::Dead => &mut self.dead,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        DiseaseState::ALL.iter().map(|state| self.count(*state)).sum()
    }

    /// No one is exposed or infectious, so no state can change any more.
    #[must_use]
    pub fn is_burned_out(&self) -> bool {
        self.exposed == 0 && self.infectious == 0
    }
}

/// New arrivals in each state on one day, derived from consecutive snapshots.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyIncidence {
    pub day: u32,
    pub new_exposed: usize,
    pub new_infectious: usize,
    pub new_recovered: usize,
    pub new_dead: usize,
}

/// Headline figures for a run.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct RunSummary {
    /// Last simulated day.
    pub days: u32,
    pub peak_infectious: usize,
    /// First day on which `peak_infectious` was reached.
    pub peak_day: u32,
    /// Everyone who was ever exposed or infectious, including the initial infections.
    pub total_cases: usize,
    pub deaths: usize,
    /// `total_cases` as a share of the non-vaccinated population.
    pub attack_rate: f64,
    /// Deaths as a share of resolved cases.
    pub case_fatality_ratio: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct History {
    snapshots: Vec<DailySnapshot>,
}

impl History {
    /// Starts a history from its day-0 snapshot.
    pub(crate) fn starting_with(snapshot: DailySnapshot) -> Result<Self, EpiError> {
        if snapshot.day != 0 {
            return Err(EpiError::InvariantViolation(format!(
                "history must start at day 0, not day {}",
                snapshot.day
            )));
        }
        Ok(History {
            snapshots: vec![snapshot],
        })
    }

    /// Appends the next day's snapshot.
    pub(crate) fn push(&mut self, snapshot: DailySnapshot) -> Result<(), EpiError> {
        let Some(last) = self.snapshots.last() else {
            return Err(EpiError::InvariantViolation(
                "history has no day-0 snapshot".to_string(),
            ));
        };
        if snapshot.day != last.day + 1 {
            return Err(EpiError::InvariantViolation(format!(
                "day {} cannot follow day {}",
                snapshot.day, last.day
            )));
        }
        if snapshot.total() != last.total() {
            return Err(EpiError::InvariantViolation(format!(
                "day {} accounts for {} individuals, expected {}",
                snapshot.day,
                snapshot.total(),
                last.total()
            )));
        }
        self.snapshots.push(snapshot);
        Ok(())
    }

    /// The population size every snapshot accounts for.
    #[must_use]
    pub fn population(&self) -> usize {
        self.snapshots.first().map_or(0, DailySnapshot::total)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    #[must_use]
    pub fn get(&self, day: u32) -> Option<&DailySnapshot> {
        self.snapshots.get(day as usize)
    }

    #[must_use]
    pub fn latest(&self) -> Option<&DailySnapshot> {
        self.snapshots.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DailySnapshot> {
        self.snapshots.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DailySnapshot] {
        &self.snapshots
    }

    /// New exposures, infectious onsets, recoveries and deaths per day. Day 0 reports the
    /// day-0 counts themselves. Later days estimate arrivals from the change in each
    /// compartment plus the change in the compartment it drains into, clamped at zero.
    #[must_use]
    pub fn daily_incidence(&self) -> Vec<DailyIncidence> {
        let mut incidence = Vec::with_capacity(self.snapshots.len());
        let Some(first) = self.snapshots.first() else {
            return incidence;
        };
        incidence.push(DailyIncidence {
            day: first.day,
            new_exposed: first.exposed,
            new_infectious: first.infectious,
            new_recovered: first.recovered,
            new_dead: first.dead,
        });

        let delta = |now: usize, before: usize| now as i64 - before as i64;
        let clamp = |value: i64| usize::try_from(value).unwrap_or(0);
        for pair in self.snapshots.windows(2) {
            let (before, now) = (&pair[0], &pair[1]);
            incidence.push(DailyIncidence {
                day: now.day,
                new_exposed: clamp(
                    delta(now.exposed, before.exposed) + delta(now.infectious, before.infectious),
                ),
                new_infectious: clamp(
                    delta(now.infectious, before.infectious)
                        + delta(now.recovered, before.recovered),
                ),
                new_recovered: clamp(delta(now.recovered, before.recovered)),
                new_dead: clamp(delta(now.dead, before.dead)),
            });
        }
        incidence
    }

    /// Summarizes the run so far. `vaccinated` is the number of individuals made immune
    /// before day 0; they are counted as `recovered` but are not cases.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn summary(&self, vaccinated: usize) -> RunSummary {
        let (Some(first), Some(last)) = (self.snapshots.first(), self.snapshots.last()) else {
            return RunSummary {
                days: 0,
                peak_infectious: 0,
                peak_day: 0,
                total_cases: 0,
                deaths: 0,
                attack_rate: 0.0,
                case_fatality_ratio: 0.0,
            };
        };

        let mut peak = first;
        for snapshot in &self.snapshots {
            if snapshot.infectious > peak.infectious {
                peak = snapshot;
            }
        }

        let population = first.total();
        let at_risk = population.saturating_sub(vaccinated);
        let total_cases = at_risk.saturating_sub(last.susceptible);
        let resolved = (last.recovered + last.dead).saturating_sub(vaccinated);
        let ratio = |numerator: usize, denominator: usize| {
            if denominator == 0 {
                0.0
            } else {
                numerator as f64 / denominator as f64
            }
        };

        RunSummary {
            days: last.day,
            peak_infectious: peak.infectious,
            peak_day: peak.day,
            total_cases,
            deaths: last.dead,
            attack_rate: ratio(total_cases, at_risk),
            case_fatality_ratio: ratio(last.dead, resolved),
        }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a DailySnapshot;
    type IntoIter = std::slice::Iter<'a, DailySnapshot>;

    fn into_iter(self) -> Self::IntoIter {
        self.snapshots.iter()
    }
}

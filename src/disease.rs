//! The per-individual SEIRD state machine.
//!
//! ```text
//! Susceptible -> Exposed -> Infectious -> Recovered
//!      |                        |
//!      |                        +------> Dead
//!      +---- (vaccination) ------------> Recovered
//! ```
//!
//! `Recovered` and `Dead` are absorbing. Every transition method checks the current state and
//! reports an `InvariantViolation` instead of moving an individual backwards.
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::error::EpiError;
use crate::network::IndividualId;

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseState {
    Susceptible,
    Exposed,
    Infectious,
    Recovered,
    Dead,
}

impl DiseaseState {
    pub const ALL: [DiseaseState; 5] = [
        DiseaseState::Susceptible,
        DiseaseState::Exposed,
        DiseaseState::Infectious,
        DiseaseState::Recovered,
        DiseaseState::Dead,
    ];

    /// No transition ever leaves a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, DiseaseState::Recovered | DiseaseState::Dead)
    }

    /// Exposed or infectious: the epidemic is not over while anyone is in one of these.
    #[must_use]
    pub fn is_active(self) -> bool {
        matches!(self, DiseaseState::Exposed | DiseaseState::Infectious)
    }
}

impl Display for DiseaseState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiseaseState::Susceptible => "susceptible",
            DiseaseState::Exposed => "exposed",
            DiseaseState::Infectious => "infectious",
            DiseaseState::Recovered => "recovered",
            DiseaseState::Dead => "dead",
        };
        f.write_str(name)
    }
}

/// One member of the population. Identity is fixed at creation; everything else changes only
/// through the transition methods below, which set each timestamp at most once.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Individual {
    id: IndividualId,
    state: DiseaseState,
    exposure_day: Option<u32>,
    infection_day: Option<u32>,
    recovery_day: Option<u32>,
    infected_by: Option<IndividualId>,
}

impl Individual {
    pub(crate) fn new(id: IndividualId) -> Self {
        Individual {
            id,
            state: DiseaseState::Susceptible,
            exposure_day: None,
            infection_day: None,
            recovery_day: None,
            infected_by: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> IndividualId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> DiseaseState {
        self.state
    }

    /// Day on which the individual became exposed. `None` for seeded infections.
    #[must_use]
    pub fn exposure_day(&self) -> Option<u32> {
        self.exposure_day
    }

    /// Day on which the individual became infectious.
    #[must_use]
    pub fn infection_day(&self) -> Option<u32> {
        self.infection_day
    }

    /// Day on which the individual recovered. Vaccinated individuals have none.
    #[must_use]
    pub fn recovery_day(&self) -> Option<u32> {
        self.recovery_day
    }

    /// The infectious neighbor whose contact caused this individual's exposure.
    #[must_use]
    pub fn infected_by(&self) -> Option<IndividualId> {
        self.infected_by
    }

    fn illegal(&self, to: DiseaseState) -> EpiError {
        EpiError::InvariantViolation(format!(
            "individual {} cannot move from {} to {to}",
            self.id, self.state
        ))
    }

    pub(crate) fn expose(&mut self, day: u32, source: Option<IndividualId>) -> Result<(), EpiError> {
        if self.state != DiseaseState::Susceptible {
            return Err(self.illegal(DiseaseState::Exposed));
        }
        self.state = DiseaseState::Exposed;
        self.exposure_day = Some(day);
        self.infected_by = source;
        Ok(())
    }

    /// Exposed individuals finishing incubation, and susceptible ones seeded directly.
    pub(crate) fn become_infectious(&mut self, day: u32) -> Result<(), EpiError> {
        match self.state {
            DiseaseState::Exposed if self.exposure_day.is_some_and(|e| e <= day) => {}
            DiseaseState::Susceptible => {}
            _ => return Err(self.illegal(DiseaseState::Infectious)),
        }
        self.state = DiseaseState::Infectious;
        self.infection_day = Some(day);
        Ok(())
    }

    pub(crate) fn recover(&mut self, day: u32) -> Result<(), EpiError> {
        if self.state != DiseaseState::Infectious || self.infection_day.is_none_or(|i| i > day) {
            return Err(self.illegal(DiseaseState::Recovered));
        }
        self.state = DiseaseState::Recovered;
        self.recovery_day = Some(day);
        Ok(())
    }

    pub(crate) fn die(&mut self) -> Result<(), EpiError> {
        if self.state != DiseaseState::Infectious {
            return Err(self.illegal(DiseaseState::Dead));
        }
        self.state = DiseaseState::Dead;
        Ok(())
    }

    /// Pre-existing immunity: straight to `Recovered`, with no recovery day.
    pub(crate) fn vaccinate(&mut self) -> Result<(), EpiError> {
        if self.state != DiseaseState::Susceptible {
            return Err(self.illegal(DiseaseState::Recovered));
        }
        self.state = DiseaseState::Recovered;
        Ok(())
    }

    /// Returns the individual to a fresh susceptible state.
    pub(crate) fn reset(&mut self) {
        *self = Individual::new(self.id);
    }
}

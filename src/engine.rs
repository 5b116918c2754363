//! The daily disease process.
//!
//! `initialize` applies vaccination to a freshly generated network and records day 0.
//! `advance_one_day` then maps one `SimulationState` to the next. It never modifies its input:
//! the returned state holds a new network and a history one snapshot longer.
//!
//! A day runs in two passes, both judged against the states at the start of the day:
//!
//! 1. **Duration transitions.** Exposed individuals whose incubation is over become
//!    infectious. Infectious individuals whose infectious period is over recover with
//!    probability `recovery_probability` and die otherwise.
//! 2. **Transmission.** Every individual susceptible at the start of the day is checked
//!    against each neighbor that was infectious at the start of the day and is still
//!    infectious after pass 1. Each such neighbor gets its own contact draw
//!    (`1 - contact_reduction`) and, if they meet, its own transmission draw
//!    (`reproduction_number / infectious_duration`). The first success exposes the
//!    individual and records that neighbor as the source.
//!
//! So an individual who resolves today does not transmit today, someone who turns infectious
//! today does not transmit until tomorrow, and the dead never transmit. Contact edges are
//! never removed.
//!
//! Outcome draws come from `OutcomeRng` and contact/transmission draws from `TransmissionRng`,
//! so the two passes do not disturb each other's random sequence.

use log::{debug, info, trace};

use crate::define_rng;
use crate::disease::DiseaseState;
use crate::error::EpiError;
use crate::history::{DailySnapshot, History};
use crate::network::{IndividualId, Network};
use crate::parameters::{check_probability, Parameters};
use crate::random::RandomSource;

define_rng!(VaccinationRng);
define_rng!(OutcomeRng);
define_rng!(TransmissionRng);

/// The network as of `day` together with every snapshot up to and including `day`.
#[derive(Clone, Debug)]
pub struct SimulationState {
    network: Network,
    day: u32,
    history: History,
    vaccinated: usize,
}

impl SimulationState {
    #[must_use]
    pub fn network(&self) -> &Network {
        &self.network
    }

    #[must_use]
    pub fn day(&self) -> u32 {
        self.day
    }

    #[must_use]
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Number of individuals made immune by vaccination before day 0.
    #[must_use]
    pub fn vaccinated(&self) -> usize {
        self.vaccinated
    }

    /// The counts for `day`.
    #[must_use]
    pub fn snapshot(&self) -> DailySnapshot {
        // A state always carries at least its day-0 snapshot.
        self.history.latest().copied().unwrap_or_default()
    }

    #[must_use]
    pub fn is_burned_out(&self) -> bool {
        self.snapshot().is_burned_out()
    }
}

/// Vaccinates `floor(susceptible * vaccination_fraction)` randomly chosen susceptible
/// individuals (they become `Recovered`) and records the day-0 snapshot.
pub fn initialize(
    mut network: Network,
    vaccination_fraction: f64,
    random: &mut RandomSource,
) -> Result<SimulationState, EpiError> {
    check_probability("vaccination_fraction", vaccination_fraction)?;

    let susceptible = network.ids_in_state(DiseaseState::Susceptible);
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    let to_vaccinate = (susceptible.len() as f64 * vaccination_fraction).floor() as usize;

    let chosen = random.sample_without_replacement(VaccinationRng, &susceptible, to_vaccinate);
    for id in &chosen {
        individual_mut(&mut network, *id)?.vaccinate()?;
    }
    debug!("vaccinated {} of {} susceptible", chosen.len(), susceptible.len());

    let history = History::starting_with(network.snapshot(0))?;
    info!("initialized simulation: {:?}", history.latest());
    Ok(SimulationState {
        network,
        day: 0,
        history,
        vaccinated: chosen.len(),
    })
}

fn individual_mut(
    network: &mut Network,
    id: IndividualId,
) -> Result<&mut crate::disease::Individual, EpiError> {
    network
        .individual_mut(id)
        .ok_or_else(|| EpiError::InvariantViolation(format!("individual {id} does not exist")))
}

/// Produces the state for the day after `state.day()`.
pub fn advance_one_day(
    state: &SimulationState,
    parameters: &Parameters,
    random: &mut RandomSource,
) -> Result<SimulationState, EpiError> {
    parameters.validate()?;
    let before = &state.network;
    if before.len() != state.history.population() {
        return Err(EpiError::InvariantViolation(format!(
            "network has {} individuals but the history accounts for {}",
            before.len(),
            state.history.population()
        )));
    }

    let day = state.day + 1;
    let mut network = before.clone();

    resolve_durations(&mut network, day, parameters, random)?;

    let exposures = find_exposures(before, &network, parameters, random);
    for &(target, source) in &exposures {
        trace!("day {day}: {source} exposed {target}");
        individual_mut(&mut network, target)?.expose(day, Some(source))?;
    }

    let snapshot = network.snapshot(day);
    let mut history = state.history.clone();
    history.push(snapshot)?;
    debug!(
        "day {day}: {} new exposures, S={} E={} I={} R={} D={}",
        exposures.len(),
        snapshot.susceptible,
        snapshot.exposed,
        snapshot.infectious,
        snapshot.recovered,
        snapshot.dead
    );

    Ok(SimulationState {
        network,
        day,
        history,
        vaccinated: state.vaccinated,
    })
}

/// Pass 1. Only exposed and infectious individuals can change, and each depends only on its
/// own timestamps.
fn resolve_durations(
    network: &mut Network,
    day: u32,
    parameters: &Parameters,
    random: &mut RandomSource,
) -> Result<(), EpiError> {
    let missing = |id: IndividualId, what: &str| {
        EpiError::InvariantViolation(format!("{id} has no {what} day"))
    };

    for individual in network.individuals_mut() {
        match individual.state() {
            DiseaseState::Exposed => {
                let exposed_on = individual
                    .exposure_day()
                    .ok_or_else(|| missing(individual.id(), "exposure"))?;
                if day.saturating_sub(exposed_on) >= parameters.incubation_duration {
                    trace!("day {day}: {} becomes infectious", individual.id());
                    individual.become_infectious(day)?;
                }
            }
            DiseaseState::Infectious => {
                let infectious_since = individual
                    .infection_day()
                    .ok_or_else(|| missing(individual.id(), "infection"))?;
                if day.saturating_sub(infectious_since) >= parameters.infectious_duration {
                    if random.sample_bool(OutcomeRng, parameters.recovery_probability) {
                        trace!("day {day}: {} recovers", individual.id());
                        individual.recover(day)?;
                    } else {
                        trace!("day {day}: {} dies", individual.id());
                        individual.die()?;
                    }
                }
            }
            DiseaseState::Susceptible | DiseaseState::Recovered | DiseaseState::Dead => {}
        }
    }
    Ok(())
}

/// Pass 2. Work is partitioned by susceptible individual, in identity order, and within an
/// individual by neighbor list order, which fixes the order of draws for a given seed.
fn find_exposures(
    before: &Network,
    after_transitions: &Network,
    parameters: &Parameters,
    random: &mut RandomSource,
) -> Vec<(IndividualId, IndividualId)> {
    let contact_probability = parameters.contact_probability();
    let transmission_probability = parameters.transmission_probability();
    let is_transmitter = |id: IndividualId| {
        before.state(id) == DiseaseState::Infectious
            && after_transitions.state(id) == DiseaseState::Infectious
    };

    let mut exposures = Vec::new();
    for target in before.individuals() {
        if target.state() != DiseaseState::Susceptible {
            continue;
        }
        for &source in before.neighbors(target.id()) {
            if !is_transmitter(source) {
                continue;
            }
            if random.sample_bool(TransmissionRng, contact_probability)
                && random.sample_bool(TransmissionRng, transmission_probability)
            {
                exposures.push((target.id(), source));
                break;
            }
        }
    }
    exposures
}

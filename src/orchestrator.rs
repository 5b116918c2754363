//! Run control.
//!
//! An `Orchestrator` owns one run at a time: the scenario, the current `SimulationState` and
//! a stored network for every simulated day. A driving loop (the CLI, a test, a UI timer)
//! calls `step` at whatever cadence it likes; the orchestrator never schedules anything itself.
//!
//! ```text
//!                 start               step (bound or burnout)
//! Uninitialized ---------> Running --------------------------> Exhausted
//!       ^                   |   ^                                  |
//!       |             pause |   | resume                           |
//!       |                   v   |                                  |
//!       |                  Paused                                  |
//!       +------------------------ reset ---------------------------+
//! ```
//!
//! `reset` is accepted in every state. Moving the playback cursor back with `step_back` or
//! `seek` only reads stored frames; a later `step` replays the stored days before simulating
//! new ones, so a day is never computed twice.
//!
//! All mutation goes through `&mut self`, so a run cannot be stepped from two places at once.
//! Readers that live elsewhere take an owned `Frame`.

use std::fmt::{self, Display};

use log::{debug, info};

use crate::engine::{advance_one_day, initialize, SimulationState};
use crate::error::EpiError;
use crate::history::{DailySnapshot, History, RunSummary};
use crate::network::{generate, Network};
use crate::parameters::Scenario;
use crate::random::RandomSource;

/// Why a run stopped producing new days.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExhaustionReason {
    /// The configured `max_days` was reached.
    DayLimit,
    /// Nobody is exposed or infectious any more.
    BurnedOut,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    Uninitialized,
    Running,
    Paused,
    Exhausted(ExhaustionReason),
}

impl RunStatus {
    /// Whether `step` will simulate or replay a day.
    #[must_use]
    pub fn is_running(self) -> bool {
        self == RunStatus::Running
    }
}

impl Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Uninitialized => write!(f, "uninitialized"),
            RunStatus::Running => write!(f, "running"),
            RunStatus::Paused => write!(f, "paused"),
            RunStatus::Exhausted(ExhaustionReason::DayLimit) => {
                write!(f, "exhausted (day limit reached)")
            }
            RunStatus::Exhausted(ExhaustionReason::BurnedOut) => {
                write!(f, "exhausted (epidemic burned out)")
            }
        }
    }
}

/// Identifies a started run.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RunHandle {
    /// Counts runs started by this orchestrator, from 1.
    pub run: u64,
    pub base_seed: u64,
    pub population: usize,
}

/// An owned copy of one day of a run.
#[derive(Clone, Debug)]
pub struct Frame {
    pub snapshot: DailySnapshot,
    pub network: Network,
}

struct Run {
    scenario: Scenario,
    state: SimulationState,
    /// `frames[d]` is the network at the end of day `d`.
    frames: Vec<Network>,
    /// The day currently shown to readers.
    cursor: u32,
}

pub struct Orchestrator {
    random: RandomSource,
    base_seed: u64,
    status: RunStatus,
    runs_started: u64,
    run: Option<Run>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        Orchestrator {
            random: RandomSource::new(base_seed),
            base_seed,
            status: RunStatus::Uninitialized,
            runs_started: 0,
            run: None,
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Sets the seed used by the next `start`. The current run, if any, is unaffected.
    pub fn set_base_seed(&mut self, base_seed: u64) {
        self.base_seed = base_seed;
    }

    /// Validates `scenario`, builds and seeds the network, applies vaccination and records
    /// day 0. Nothing is stored unless every step succeeds.
    pub fn start(&mut self, scenario: Scenario) -> Result<RunHandle, EpiError> {
        if self.status != RunStatus::Uninitialized {
            return Err(EpiError::RunStateError(format!(
                "cannot start a run while {}; reset first",
                self.status
            )));
        }
        scenario.validate()?;

        self.random.reseed(self.base_seed);
        let network = generate(&scenario.network_config(), &mut self.random)?;
        let state = initialize(
            network,
            scenario.parameters.vaccination_fraction,
            &mut self.random,
        )?;

        self.runs_started += 1;
        let handle = RunHandle {
            run: self.runs_started,
            base_seed: self.base_seed,
            population: state.network().len(),
        };
        info!(
            "started run {} with seed {}: population {}, max days {:?}",
            handle.run, handle.base_seed, handle.population, scenario.max_days
        );

        let frames = vec![state.network().clone()];
        self.run = Some(Run {
            scenario,
            state,
            frames,
            cursor: 0,
        });
        self.status = RunStatus::Running;
        self.check_exhaustion();
        Ok(handle)
    }

    /// Moves forward one day and returns that day's snapshot. Days already simulated are
    /// replayed from stored frames; otherwise the engine computes the next day.
    pub fn step(&mut self) -> Result<DailySnapshot, EpiError> {
        match self.status {
            RunStatus::Uninitialized => {
                return Err(EpiError::RunStateError(
                    "no run has been started".to_string(),
                ))
            }
            RunStatus::Paused => {
                return Err(EpiError::RunStateError(
                    "run is paused; resume before stepping".to_string(),
                ))
            }
            RunStatus::Running | RunStatus::Exhausted(_) => {}
        }
        let Some(run) = self.run.as_mut() else {
            return Err(EpiError::InvariantViolation(format!(
                "run is {} but has no state",
                self.status
            )));
        };

        if run.cursor < run.state.day() {
            run.cursor += 1;
            debug!("replaying day {}", run.cursor);
            return snapshot_at(&run.state, run.cursor);
        }
        if let RunStatus::Exhausted(_) = self.status {
            return Err(EpiError::RunStateError(format!(
                "cannot step: run is {}",
                self.status
            )));
        }

        let next = advance_one_day(&run.state, &run.scenario.parameters, &mut self.random)?;
        run.frames.push(next.network().clone());
        run.state = next;
        run.cursor = run.state.day();
        let snapshot = run.state.snapshot();

        self.check_exhaustion();
        Ok(snapshot)
    }

    /// Moves the playback cursor back one day and returns that day's snapshot.
    pub fn step_back(&mut self) -> Result<DailySnapshot, EpiError> {
        let run = self.run_mut()?;
        if run.cursor == 0 {
            return Err(EpiError::RunStateError(
                "already at day 0".to_string(),
            ));
        }
        run.cursor -= 1;
        snapshot_at(&run.state, run.cursor)
    }

    /// Moves the playback cursor to any day already simulated.
    pub fn seek(&mut self, day: u32) -> Result<DailySnapshot, EpiError> {
        let run = self.run_mut()?;
        if day > run.state.day() {
            return Err(EpiError::RunStateError(format!(
                "day {day} has not been simulated (latest is day {})",
                run.state.day()
            )));
        }
        run.cursor = day;
        snapshot_at(&run.state, day)
    }

    pub fn pause(&mut self) -> Result<(), EpiError> {
        if self.status != RunStatus::Running {
            return Err(EpiError::RunStateError(format!(
                "cannot pause a run that is {}",
                self.status
            )));
        }
        self.status = RunStatus::Paused;
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), EpiError> {
        if self.status != RunStatus::Paused {
            return Err(EpiError::RunStateError(format!(
                "cannot resume a run that is {}",
                self.status
            )));
        }
        self.status = RunStatus::Running;
        Ok(())
    }

    /// Discards the network and history. The next `start` begins again from the base seed.
    pub fn reset(&mut self) {
        if self.run.take().is_some() {
            debug!("run {} discarded", self.runs_started);
        }
        self.status = RunStatus::Uninitialized;
    }

    /// Steps until the run is exhausted, then returns the full history.
    pub fn run_to_completion(&mut self) -> Result<&History, EpiError> {
        while self.status.is_running() {
            self.step()?;
        }
        self.history().ok_or_else(|| {
            EpiError::RunStateError(format!("cannot run to completion while {}", self.status))
        })
    }

    #[must_use]
    pub fn status(&self) -> RunStatus {
        self.status
    }

    #[must_use]
    pub fn scenario(&self) -> Option<&Scenario> {
        self.run.as_ref().map(|run| &run.scenario)
    }

    /// The latest simulated state, regardless of the playback cursor.
    #[must_use]
    pub fn state(&self) -> Option<&SimulationState> {
        self.run.as_ref().map(|run| &run.state)
    }

    #[must_use]
    pub fn history(&self) -> Option<&History> {
        self.state().map(SimulationState::history)
    }

    /// The day the playback cursor is on.
    #[must_use]
    pub fn current_day(&self) -> Option<u32> {
        self.run.as_ref().map(|run| run.cursor)
    }

    /// The frame under the playback cursor.
    #[must_use]
    pub fn current_frame(&self) -> Option<Frame> {
        self.current_day().and_then(|day| self.frame(day))
    }

    #[must_use]
    pub fn frame(&self, day: u32) -> Option<Frame> {
        let run = self.run.as_ref()?;
        let snapshot = *run.state.history().get(day)?;
        let network = run.frames.get(day as usize)?.clone();
        Some(Frame { snapshot, network })
    }

    #[must_use]
    pub fn summary(&self) -> Option<RunSummary> {
        self.state()
            .map(|state| state.history().summary(state.vaccinated()))
    }

    fn run_mut(&mut self) -> Result<&mut Run, EpiError> {
        self.run
            .as_mut()
            .ok_or_else(|| EpiError::RunStateError("no run has been started".to_string()))
    }

    /// Marks a running run as exhausted once its latest day hits the bound or burns out.
    fn check_exhaustion(&mut self) {
        let Some(run) = self.run.as_ref() else {
            return;
        };
        if self.status != RunStatus::Running {
            return;
        }
        let reason = if run.state.is_burned_out() {
            Some(ExhaustionReason::BurnedOut)
        } else if run
            .scenario
            .max_days
            .is_some_and(|max_days| run.state.day() >= max_days)
        {
            Some(ExhaustionReason::DayLimit)
        } else {
            None
        };
        if let Some(reason) = reason {
            info!("run exhausted on day {}: {reason:?}", run.state.day());
            self.status = RunStatus::Exhausted(reason);
        }
    }
}

fn snapshot_at(state: &SimulationState, day: u32) -> Result<DailySnapshot, EpiError> {
    state.history().get(day).copied().ok_or_else(|| {
        EpiError::InvariantViolation(format!("no snapshot stored for day {day}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameters::Parameters;

    fn scenario() -> Scenario {
        Scenario {
            population_size: 100,
            seed_network_size: 5,
            attachments_per_node: 3,
            initially_infected: 5,
            layout: false,
            max_days: Some(60),
            parameters: Parameters::default(),
        }
    }

    #[test]
    fn start_records_day_zero_only() {
        let mut orchestrator = Orchestrator::new(8);
        let handle = orchestrator.start(scenario()).unwrap();
        assert_eq!(handle.run, 1);
        assert_eq!(handle.population, 100);
        assert_eq!(orchestrator.status(), RunStatus::Running);
        let history = orchestrator.history().unwrap();
        assert_eq!(history.len(), 1);
        let day_zero = history.get(0).unwrap();
        assert_eq!(day_zero.susceptible, 95);
        assert_eq!(day_zero.infectious, 5);
        assert_eq!(day_zero.total(), 100);
    }

    #[test]
    fn step_requires_a_started_run() {
        let mut orchestrator = Orchestrator::new(8);
        assert!(matches!(
            orchestrator.step(),
            Err(EpiError::RunStateError(_))
        ));
        assert!(orchestrator.step_back().is_err());
        assert!(orchestrator.run_to_completion().is_err());
    }

    #[test]
    fn invalid_scenario_leaves_orchestrator_uninitialized() {
        let mut orchestrator = Orchestrator::new(8);
        let bad = Scenario {
            initially_infected: 500,
            ..scenario()
        };
        let error = orchestrator.start(bad).unwrap_err();
        assert_eq!(error.parameter_name(), Some("initially_infected"));
        assert_eq!(orchestrator.status(), RunStatus::Uninitialized);
        assert!(orchestrator.state().is_none());
        orchestrator.start(scenario()).unwrap();
    }

    #[test]
    fn day_limit_exhausts_run() {
        let mut orchestrator = Orchestrator::new(3);
        orchestrator
            .start(Scenario {
                max_days: Some(4),
                ..scenario()
            })
            .unwrap();
        for day in 1..=4 {
            assert_eq!(orchestrator.step().unwrap().day, day);
        }
        assert_eq!(
            orchestrator.status(),
            RunStatus::Exhausted(ExhaustionReason::DayLimit)
        );
        assert!(matches!(
            orchestrator.step(),
            Err(EpiError::RunStateError(_))
        ));
        assert!(orchestrator.start(scenario()).is_err());
    }

    #[test]
    fn zero_reproduction_burns_out() {
        let mut orchestrator = Orchestrator::new(3);
        orchestrator
            .start(Scenario {
                max_days: None,
                parameters: Parameters {
                    reproduction_number: 0.0,
                    infectious_duration: 7,
                    ..Parameters::default()
                },
                ..scenario()
            })
            .unwrap();
        let history = orchestrator.run_to_completion().unwrap();
        let last = history.latest().unwrap();
        assert_eq!(last.day, 7);
        assert_eq!(last.susceptible, 95);
        assert_eq!(last.recovered + last.dead, 5);
        assert_eq!(
            orchestrator.status(),
            RunStatus::Exhausted(ExhaustionReason::BurnedOut)
        );
    }

    #[test]
    fn nobody_infected_is_exhausted_at_start() {
        let mut orchestrator = Orchestrator::new(3);
        orchestrator
            .start(Scenario {
                initially_infected: 0,
                ..scenario()
            })
            .unwrap();
        assert_eq!(
            orchestrator.status(),
            RunStatus::Exhausted(ExhaustionReason::BurnedOut)
        );
        assert_eq!(orchestrator.history().unwrap().len(), 1);
    }

    #[test]
    fn pause_blocks_stepping_until_resumed() {
        let mut orchestrator = Orchestrator::new(3);
        assert!(orchestrator.pause().is_err());
        orchestrator.start(scenario()).unwrap();
        orchestrator.step().unwrap();
        orchestrator.pause().unwrap();
        assert_eq!(orchestrator.status(), RunStatus::Paused);
        assert!(orchestrator.step().is_err());
        assert!(orchestrator.pause().is_err());
        // Playback still works while paused.
        assert_eq!(orchestrator.step_back().unwrap().day, 0);
        orchestrator.resume().unwrap();
        assert!(orchestrator.resume().is_err());
        assert_eq!(orchestrator.step().unwrap().day, 1);
        assert_eq!(orchestrator.step().unwrap().day, 2);
    }

    #[test]
    fn step_back_replays_stored_days() {
        let mut orchestrator = Orchestrator::new(21);
        orchestrator.start(scenario()).unwrap();
        let forward: Vec<DailySnapshot> =
            (0..10).map(|_| orchestrator.step().unwrap()).collect();

        assert_eq!(orchestrator.seek(3).unwrap(), forward[2]);
        assert_eq!(orchestrator.step_back().unwrap().day, 2);
        assert_eq!(orchestrator.current_day(), Some(2));

        // Stepping forward from the past replays without simulating.
        for expected in &forward[2..] {
            assert_eq!(orchestrator.step().unwrap(), *expected);
        }
        assert_eq!(orchestrator.history().unwrap().len(), 11);
        assert_eq!(orchestrator.step().unwrap().day, 11);
        assert!(orchestrator.seek(40).is_err());
    }

    #[test]
    fn frames_are_independent_copies() {
        let mut orchestrator = Orchestrator::new(21);
        orchestrator.start(scenario()).unwrap();
        let day_zero = orchestrator.current_frame().unwrap();
        for _ in 0..10 {
            orchestrator.step().unwrap();
        }
        let again = orchestrator.frame(0).unwrap();
        assert_eq!(day_zero.snapshot, again.snapshot);
        assert_eq!(day_zero.network.snapshot(0), again.network.snapshot(0));
        let latest = orchestrator.frame(10).unwrap();
        assert_eq!(latest.network.snapshot(10), latest.snapshot);
        assert!(orchestrator.frame(11).is_none());
    }

    #[test]
    fn reset_then_start_reproduces_run() {
        let mut orchestrator = Orchestrator::new(99);
        orchestrator.start(scenario()).unwrap();
        let first = orchestrator.run_to_completion().unwrap().clone();

        orchestrator.reset();
        assert_eq!(orchestrator.status(), RunStatus::Uninitialized);
        assert!(orchestrator.history().is_none());

        let handle = orchestrator.start(scenario()).unwrap();
        assert_eq!(handle.run, 2);
        let second = orchestrator.run_to_completion().unwrap();
        assert_eq!(&first, second);
    }

    #[test]
    fn summary_tracks_latest_day() {
        let mut orchestrator = Orchestrator::new(5);
        assert!(orchestrator.summary().is_none());
        orchestrator.start(scenario()).unwrap();
        orchestrator.run_to_completion().unwrap();
        let summary = orchestrator.summary().unwrap();
        assert_eq!(Some(summary.days), orchestrator.state().map(SimulationState::day));
        assert!(summary.total_cases >= 5);
        assert!(summary.peak_infectious >= 5);
    }
}

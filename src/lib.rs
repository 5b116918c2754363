//! An SEIRD epidemic engine over scale-free contact networks.
//!
//! A run starts by growing a contact network by preferential attachment (see
//! [`network::generate`]), so a few individuals end up with far more contacts than the rest.
//! Some individuals are seeded as infectious and, optionally, some of the remainder are
//! vaccinated. The disease then moves through the network one simulated day at a time:
//! * Susceptible individuals are exposed by infectious neighbors, one independent chance per
//!   infectious contact.
//! * Exposed individuals become infectious after an incubation period.
//! * Infectious individuals recover or die at the end of their infectious period.
//!
//! The central object is the [`Orchestrator`], which owns a run and its history. A driving
//! loop (the `epinet` binary, a test, or a presentation layer) calls
//! [`Orchestrator::step`] once per day until the run is exhausted, either because the day
//! bound is reached or because no one is exposed or infectious any more.
//!
//! ```rust
//! use epinet::{Orchestrator, Scenario};
//!
//! let mut orchestrator = Orchestrator::new(42);
//! orchestrator.start(Scenario { max_days: Some(30), ..Scenario::default() }).unwrap();
//! let history = orchestrator.run_to_completion().unwrap();
//! for day in history {
//!     assert_eq!(day.total(), 200);
//! }
//! ```
//!
//! Every random draw comes from a named stream of a [`random::RandomSource`], so a run is
//! fully determined by its base seed and scenario.
pub mod disease;
pub mod engine;
pub mod error;
pub mod hashing;
pub mod history;
pub mod log;
pub mod network;
pub mod orchestrator;
pub mod parameters;
pub mod prelude;
pub mod random;
pub mod runner;

pub use crate::disease::{DiseaseState, Individual};
pub use crate::engine::{advance_one_day, initialize, SimulationState};
pub use crate::error::EpiError;
pub use crate::history::{DailyIncidence, DailySnapshot, History, RunSummary};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::network::{generate, IndividualId, Network, NetworkConfig, Position};
pub use crate::orchestrator::{ExhaustionReason, Frame, Orchestrator, RunHandle, RunStatus};
pub use crate::parameters::{Parameters, Scenario};
pub use crate::random::RandomSource;
pub use crate::runner::{run_with_args, run_with_custom_args, BaseArgs};

// Re-exports for macros
pub use paste;
pub use rand;

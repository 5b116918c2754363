pub use crate::disease::{DiseaseState, Individual};
pub use crate::engine::{advance_one_day, initialize, SimulationState};
pub use crate::error::EpiError;
pub use crate::history::{DailySnapshot, History, RunSummary};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::network::{generate, IndividualId, Network, NetworkConfig};
pub use crate::orchestrator::{Frame, Orchestrator, RunStatus};
pub use crate::parameters::{Parameters, Scenario};
pub use crate::random::RandomSource;
pub use crate::runner::{run_with_args, run_with_custom_args, BaseArgs};

//! Run configuration.
//!
//! `Parameters` holds the disease parameters the engine reads every day. `Scenario` adds the
//! population construction inputs and the day bound used by the orchestrator. Both
//! deserialize from JSON with every field optional; missing fields take the defaults below and
//! unknown fields are an error.
//!
//! ```json
//! {
//!   "population_size": 100,
//!   "initially_infected": 5,
//!   "max_days": 120,
//!   "parameters": { "reproduction_number": 3.0, "infectious_duration": 10 }
//! }
//! ```
use std::fs;
use std::path::Path;

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::EpiError;
use crate::network::NetworkConfig;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Mean number of secondary infections per infectious individual.
    pub reproduction_number: f64,
    /// Probability that an infectious individual recovers rather than dies.
    pub recovery_probability: f64,
    /// Days from exposure to infectiousness.
    pub incubation_duration: u32,
    /// Days infectious before recovery or death.
    pub infectious_duration: u32,
    /// Share of the initially susceptible made immune before day 0.
    pub vaccination_fraction: f64,
    /// Share of contacts prevented by distancing measures.
    pub contact_reduction: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            reproduction_number: 2.5,
            recovery_probability: 0.97,
            incubation_duration: 5,
            infectious_duration: 14,
            vaccination_fraction: 0.0,
            contact_reduction: 0.0,
        }
    }
}

pub(crate) fn check_probability(parameter: &'static str, value: f64) -> Result<(), EpiError> {
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return Err(EpiError::parameter(
            parameter,
            format!("{value} is not within [0, 1]"),
        ));
    }
    Ok(())
}

impl Parameters {
    pub fn validate(&self) -> Result<(), EpiError> {
        if !self.reproduction_number.is_finite() || self.reproduction_number < 0.0 {
            return Err(EpiError::parameter(
                "reproduction_number",
                format!("{} is not a non-negative number", self.reproduction_number),
            ));
        }
        check_probability("recovery_probability", self.recovery_probability)?;
        if self.incubation_duration < 1 {
            return Err(EpiError::parameter(
                "incubation_duration",
                "must be at least 1 day",
            ));
        }
        if self.infectious_duration < 1 {
            return Err(EpiError::parameter(
                "infectious_duration",
                "must be at least 1 day",
            ));
        }
        check_probability("vaccination_fraction", self.vaccination_fraction)?;
        check_probability("contact_reduction", self.contact_reduction)?;
        Ok(())
    }

    /// Per-contact, per-day probability that an infectious individual infects a susceptible
    /// one, given that they meet. Values above 1 mean every contact transmits.
    #[must_use]
    pub fn transmission_probability(&self) -> f64 {
        self.reproduction_number / f64::from(self.infectious_duration)
    }

    /// Probability that a given pair of neighbors actually meets on a given day.
    #[must_use]
    pub fn contact_probability(&self) -> f64 {
        1.0 - self.contact_reduction
    }
}

/// Everything needed to start a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    pub population_size: usize,
    pub seed_network_size: usize,
    pub attachments_per_node: usize,
    pub initially_infected: usize,
    /// Whether individuals get layout coordinates.
    pub layout: bool,
    /// Stop after this many days even if the epidemic is still active. `None` runs until
    /// burnout.
    pub max_days: Option<u32>,
    pub parameters: Parameters,
}

impl Default for Scenario {
    fn default() -> Self {
        let network = NetworkConfig::default();
        Scenario {
            population_size: network.population_size,
            seed_network_size: network.seed_network_size,
            attachments_per_node: network.attachments_per_node,
            initially_infected: network.initially_infected,
            layout: network.layout,
            max_days: Some(365),
            parameters: Parameters::default(),
        }
    }
}

impl Scenario {
    /// Reads and validates a scenario from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Scenario, EpiError> {
        info!("loading scenario from {}", path.display());
        let contents = fs::read_to_string(path)?;
        let scenario: Scenario = serde_json::from_str(&contents)?;
        scenario.validate()?;
        Ok(scenario)
    }

    #[must_use]
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig {
            population_size: self.population_size,
            seed_network_size: self.seed_network_size,
            attachments_per_node: self.attachments_per_node,
            initially_infected: self.initially_infected,
            layout: self.layout,
        }
    }

    /// Runs the network preconditions and then the disease parameter checks.
    pub fn validate(&self) -> Result<(), EpiError> {
        self.network_config().validate()?;
        self.parameters.validate()
    }
}

//! Scale-free contact networks by preferential attachment (the Barabási–Albert construction).
//!
//! Construction starts from a complete graph over `seed_network_size` individuals. Every later
//! individual `i` then attaches to `min(attachments_per_node, i)` distinct existing
//! individuals, each chosen with probability proportional to its current degree. Well-connected individuals
//! keep attracting new contacts, which produces the handful of hubs that drive
//! super-spreading in the disease model.
//!
//! All topology draws come from the `NetworkRng` stream, layout coordinates from `LayoutRng`
//! and the initial infections from `SeedingRng`, so turning the layout on or off does not
//! change the graph or who is infected.

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::define_rng;
use crate::error::EpiError;
use crate::network::{ContactGraph, IndividualId, Network, Position};
use crate::random::{sample_single_from_known_length, RandomSource};

define_rng!(NetworkRng);
define_rng!(LayoutRng);
define_rng!(SeedingRng);

/// Layout coordinates are drawn uniformly from `[-LAYOUT_EXTENT, LAYOUT_EXTENT)` on each axis.
const LAYOUT_EXTENT: f64 = 50.0;

/// Inputs to network construction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub population_size: usize,
    /// Size of the complete graph that seeds the attachment process.
    pub seed_network_size: usize,
    /// Number of edges each non-seed individual brings with it.
    pub attachments_per_node: usize,
    pub initially_infected: usize,
    /// Whether to assign layout coordinates.
    pub layout: bool,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            population_size: 200,
            seed_network_size: 5,
            attachments_per_node: 3,
            initially_infected: 10,
            layout: true,
        }
    }
}

impl NetworkConfig {
    /// Checks every precondition of `generate`, naming the first one violated.
    pub fn validate(&self) -> Result<(), EpiError> {
        if self.seed_network_size < 1 {
            return Err(EpiError::parameter(
                "seed_network_size",
                "must be at least 1",
            ));
        }
        if self.population_size <= self.seed_network_size {
            return Err(EpiError::parameter(
                "population_size",
                format!(
                    "population size ({}) must be greater than the seed network size ({})",
                    self.population_size, self.seed_network_size
                ),
            ));
        }
        if self.attachments_per_node < 1 {
            return Err(EpiError::parameter(
                "attachments_per_node",
                "must be at least 1",
            ));
        }
        if self.initially_infected > self.population_size {
            return Err(EpiError::parameter(
                "initially_infected",
                format!(
                    "initial infected ({}) cannot exceed population size ({})",
                    self.initially_infected, self.population_size
                ),
            ));
        }
        Ok(())
    }
}

/// Builds a scale-free network and seeds it with `initially_infected` infectious individuals
/// (infection day 0). Nothing is constructed if `config` is invalid.
pub fn generate(config: &NetworkConfig, random: &mut RandomSource) -> Result<Network, EpiError> {
    config.validate()?;
    debug!(
        "generating network: population={} seed={} attachments={}",
        config.population_size, config.seed_network_size, config.attachments_per_node
    );

    let mut graph = ContactGraph::with_population(config.population_size);

    // Complete graph over the seed individuals
    for i in 0..config.seed_network_size {
        for j in i + 1..config.seed_network_size {
            graph.add_edge(IndividualId(i), IndividualId(j))?;
        }
    }

    for i in config.seed_network_size..config.population_size {
        let targets = select_attachment_targets(&graph, i, config.attachments_per_node, random);
        for target in targets {
            graph.add_edge(IndividualId(i), target)?;
        }
    }

    if config.layout {
        for i in 0..config.population_size {
            let mut axis =
                || random.sample_range(LayoutRng, -LAYOUT_EXTENT..LAYOUT_EXTENT);
            let position = Position {
                x: axis(),
                y: axis(),
                z: axis(),
            };
            graph.set_position(IndividualId(i), position);
        }
    }

    let mut network = Network::from_graph(graph);

    let everyone: Vec<IndividualId> = network.individuals().map(|i| i.id()).collect();
    let seeds = random.sample_without_replacement(SeedingRng, &everyone, config.initially_infected);
    for id in seeds {
        if let Some(individual) = network.individual_mut(id) {
            individual.become_infectious(0)?;
        }
    }

    debug!(
        "generated network with {} edges, max degree {}",
        network.edge_count(),
        network.max_degree()
    );
    Ok(network)
}

/// Picks `min(attachments, existing)` distinct targets among individuals `0..existing`,
/// weighting each by its current degree. Already-selected individuals are excluded from later
/// draws. If a weighted draw fails to land on a candidate (zero remaining weight, or floating
/// point shortfall at the top of the wheel), a uniform draw among the unselected is used.
fn select_attachment_targets(
    graph: &ContactGraph,
    existing: usize,
    attachments: usize,
    random: &mut RandomSource,
) -> Vec<IndividualId> {
    let wanted = attachments.min(existing);
    let mut selected: Vec<IndividualId> = Vec::with_capacity(wanted);
    let total_degree: usize = (0..existing).map(|j| graph.degree(IndividualId(j))).sum();
    let mut selected_degree = 0;

    while selected.len() < wanted {
        let remaining = total_degree - selected_degree;
        #[allow(clippy::cast_precision_loss)]
        let spin = random.sample_uniform(NetworkRng) * remaining as f64;

        let mut cumulative = 0.0;
        let mut choice = None;
        if remaining > 0 {
            for j in 0..existing {
                let candidate = IndividualId(j);
                if selected.contains(&candidate) {
                    continue;
                }
                #[allow(clippy::cast_precision_loss)]
                {
                    cumulative += graph.degree(candidate) as f64;
                }
                if spin < cumulative {
                    choice = Some(candidate);
                    break;
                }
            }
        }

        let choice = match choice {
            Some(choice) => choice,
            None => {
                let unselected: Vec<IndividualId> = (0..existing)
                    .map(IndividualId)
                    .filter(|candidate| !selected.contains(candidate))
                    .collect();
                trace!("falling back to a uniform attachment target for {existing}");
                let fallback = random.sample(NetworkRng, |rng| {
                    sample_single_from_known_length(rng, unselected.into_iter())
                });
                // `wanted <= existing`, so someone is always left unselected.
                let Some(fallback) = fallback else { break };
                fallback
            }
        };

        selected_degree += graph.degree(choice);
        selected.push(choice);
    }

    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disease::DiseaseState;

    fn config(population_size: usize, initially_infected: usize) -> NetworkConfig {
        NetworkConfig {
            population_size,
            seed_network_size: 5,
            attachments_per_node: 3,
            initially_infected,
            layout: false,
        }
    }

    #[test]
    fn builds_valid_scale_free_graph() {
        let mut random = RandomSource::new(42);
        let network = generate(&config(500, 5), &mut random).unwrap();

        network.validate().unwrap();
        assert_eq!(network.len(), 500);
        // 10 seed edges plus 3 per later individual
        assert_eq!(network.edge_count(), 10 + 3 * 495);
        for individual in network.individuals().skip(5) {
            assert!(network.degree(individual.id()) >= 3);
        }
        // Hubs: the best connected individual is far above the mean degree (~6).
        assert!(network.max_degree() > 20, "max degree {}", network.max_degree());
    }

    #[test]
    fn seed_network_is_complete() {
        let mut random = RandomSource::new(1);
        let network = generate(&config(20, 0), &mut random).unwrap();
        for i in 0..5 {
            for j in 0..5 {
                if i != j {
                    assert!(network
                        .neighbors(IndividualId(i))
                        .contains(&IndividualId(j)));
                }
            }
        }
    }

    #[test]
    fn seeds_exact_number_of_infections() {
        let mut random = RandomSource::new(7);
        let network = generate(&config(100, 5), &mut random).unwrap();
        let infectious = network.ids_in_state(DiseaseState::Infectious);
        assert_eq!(infectious.len(), 5);
        for id in infectious {
            let individual = network.individual(id).unwrap();
            assert_eq!(individual.infection_day(), Some(0));
            assert_eq!(individual.exposure_day(), None);
        }
        assert_eq!(network.ids_in_state(DiseaseState::Susceptible).len(), 95);
    }

    #[test]
    fn everyone_infected() {
        let mut random = RandomSource::new(7);
        let network = generate(&config(10, 10), &mut random).unwrap();
        assert_eq!(network.snapshot(0).infectious, 10);
    }

    #[test]
    fn same_seed_same_network() {
        let a = generate(&config(200, 5), &mut RandomSource::new(11)).unwrap();
        let b = generate(&config(200, 5), &mut RandomSource::new(11)).unwrap();
        let c = generate(&config(200, 5), &mut RandomSource::new(12)).unwrap();

        let edges = |n: &Network| n.edges().collect::<Vec<_>>();
        assert_eq!(edges(&a), edges(&b));
        assert_eq!(
            a.ids_in_state(DiseaseState::Infectious),
            b.ids_in_state(DiseaseState::Infectious)
        );
        assert_ne!(edges(&a), edges(&c));
    }

    #[test]
    fn layout_does_not_change_topology() {
        let plain = generate(&config(150, 5), &mut RandomSource::new(3)).unwrap();
        let with_layout = NetworkConfig {
            layout: true,
            ..config(150, 5)
        };
        let laid_out = generate(&with_layout, &mut RandomSource::new(3)).unwrap();

        assert_eq!(
            plain.edges().collect::<Vec<_>>(),
            laid_out.edges().collect::<Vec<_>>()
        );
        assert_eq!(plain.position(IndividualId(0)), None);
        let position = laid_out.position(IndividualId(0)).unwrap();
        for axis in [position.x, position.y, position.z] {
            assert!((-50.0..50.0).contains(&axis));
        }
    }

    #[test]
    fn single_attachment_builds_a_tree_on_seed() {
        let config = NetworkConfig {
            population_size: 50,
            seed_network_size: 1,
            attachments_per_node: 1,
            initially_infected: 0,
            layout: false,
        };
        let network = generate(&config, &mut RandomSource::new(5)).unwrap();
        network.validate().unwrap();
        assert_eq!(network.edge_count(), 49);
    }

    #[test]
    fn attachments_may_exceed_seed_network() {
        let config = NetworkConfig {
            population_size: 50,
            seed_network_size: 2,
            attachments_per_node: 3,
            initially_infected: 1,
            layout: false,
        };
        let network = generate(&config, &mut RandomSource::new(13)).unwrap();
        network.validate().unwrap();
        // 1 seed edge, individual 2 can only reach the two seeds, everyone after gets 3.
        assert_eq!(network.edge_count(), 1 + 2 + 3 * 47);
        let third = network.neighbors(IndividualId(2));
        assert!(third.contains(&IndividualId(0)) && third.contains(&IndividualId(1)));
        for individual in network.individuals().skip(3) {
            assert!(network.degree(individual.id()) >= 3);
        }
    }

    #[test]
    fn rejects_invalid_configs() {
        let mut random = RandomSource::new(0);
        let cases = [
            (
                NetworkConfig {
                    seed_network_size: 0,
                    ..config(10, 0)
                },
                "seed_network_size",
            ),
            (config(5, 0), "population_size"),
            (
                NetworkConfig {
                    attachments_per_node: 0,
                    ..config(10, 0)
                },
                "attachments_per_node",
            ),
            (config(10, 11), "initially_infected"),
        ];
        for (config, parameter) in cases {
            let error = generate(&config, &mut random).unwrap_err();
            assert_eq!(error.parameter_name(), Some(parameter), "{config:?}");
        }
    }
}

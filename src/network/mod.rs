/*!

The contact network: an arena of `Individual`s addressed by `IndividualId`, together with an
undirected, simple contact graph over them.

The graph (adjacency lists and optional layout coordinates) never changes once a network has
been built, so it lives behind an `Arc` and is shared by every day's `Network` value. Only the
individuals' disease states are copied from one day to the next. A `Network` is therefore cheap
to clone, and a clone is an independent snapshot: advancing the simulation never mutates a
network that has already been handed out.

*/

pub mod generator;

use std::collections::BTreeMap;
use std::fmt::{self, Display};
use std::sync::Arc;

use serde::ser::SerializeSeq;
use serde::{Deserialize, Serialize, Serializer};

use crate::disease::{DiseaseState, Individual};
use crate::error::EpiError;
use crate::hashing::HashSet;
use crate::history::DailySnapshot;

pub use generator::{generate, NetworkConfig};

/// Stable identity of an individual. Identities are assigned densely from zero in creation
/// order and double as the index into the network's arena.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndividualId(usize);

impl IndividualId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        IndividualId(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for IndividualId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A layout coordinate for visualization. The engine never reads it.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Adjacency lists plus layout, indexed by `IndividualId`.
#[derive(Debug, Default)]
pub(crate) struct ContactGraph {
    adjacency_lists: Vec<Vec<IndividualId>>,
    positions: Vec<Option<Position>>,
    edge_count: usize,
}

impl ContactGraph {
    pub(crate) fn with_population(population: usize) -> Self {
        ContactGraph {
            adjacency_lists: vec![Vec::new(); population],
            positions: vec![None; population],
            edge_count: 0,
        }
    }

    fn check_id(&self, id: IndividualId) -> Result<(), EpiError> {
        if id.0 >= self.adjacency_lists.len() {
            return Err(EpiError::InvariantViolation(format!(
                "individual {id} is outside a population of {}",
                self.adjacency_lists.len()
            )));
        }
        Ok(())
    }

    /// Adds the undirected edge `a -- b` to both adjacency lists.
    pub(crate) fn add_edge(&mut self, a: IndividualId, b: IndividualId) -> Result<(), EpiError> {
        self.check_id(a)?;
        self.check_id(b)?;
        if a == b {
            return Err(EpiError::InvariantViolation(format!(
                "cannot make edge from {a} to itself"
            )));
        }
        if self.adjacency_lists[a.0].contains(&b) {
            return Err(EpiError::InvariantViolation(format!(
                "edge {a} -- {b} already exists"
            )));
        }
        self.adjacency_lists[a.0].push(b);
        self.adjacency_lists[b.0].push(a);
        self.edge_count += 1;
        Ok(())
    }

    pub(crate) fn degree(&self, id: IndividualId) -> usize {
        self.adjacency_lists[id.0].len()
    }

    pub(crate) fn set_position(&mut self, id: IndividualId, position: Position) {
        self.positions[id.0] = Some(position);
    }
}

/// One day's view of the population: who is in which state, and who is in contact with whom.
#[derive(Clone, Debug)]
pub struct Network {
    graph: Arc<ContactGraph>,
    individuals: Vec<Individual>,
}

impl Network {
    pub(crate) fn from_graph(graph: ContactGraph) -> Self {
        let individuals = (0..graph.adjacency_lists.len())
            .map(|index| Individual::new(IndividualId(index)))
            .collect();
        Network {
            graph: Arc::new(graph),
            individuals,
        }
    }

    /// Builds an all-susceptible network over `population` individuals from an explicit edge
    /// list. Self-loops, duplicate edges and out-of-range identities are rejected.
    pub fn from_edges(population: usize, edges: &[(usize, usize)]) -> Result<Self, EpiError> {
        let mut graph = ContactGraph::with_population(population);
        for &(a, b) in edges {
            graph
                .add_edge(IndividualId(a), IndividualId(b))
                .map_err(|e| EpiError::parameter("edges", e.to_string()))?;
        }
        Ok(Network::from_graph(graph))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    #[must_use]
    pub fn individual(&self, id: IndividualId) -> Option<&Individual> {
        self.individuals.get(id.0)
    }

    pub(crate) fn individual_mut(&mut self, id: IndividualId) -> Option<&mut Individual> {
        self.individuals.get_mut(id.0)
    }

    /// Individuals in increasing identity order.
    pub fn individuals(&self) -> impl ExactSizeIterator<Item = &Individual> {
        self.individuals.iter()
    }

    pub(crate) fn individuals_mut(&mut self) -> impl Iterator<Item = &mut Individual> {
        self.individuals.iter_mut()
    }

    /// The state of `id`. Panics if `id` is not part of this network.
    #[must_use]
    pub fn state(&self, id: IndividualId) -> DiseaseState {
        self.individuals[id.0].state()
    }

    /// Identities of everyone currently in `state`, in increasing order.
    #[must_use]
    pub fn ids_in_state(&self, state: DiseaseState) -> Vec<IndividualId> {
        self.individuals
            .iter()
            .filter(|individual| individual.state() == state)
            .map(Individual::id)
            .collect()
    }

    /// The contact list of `id`. Empty for identities outside the network.
    #[must_use]
    pub fn neighbors(&self, id: IndividualId) -> &[IndividualId] {
        self.graph
            .adjacency_lists
            .get(id.0)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    #[must_use]
    pub fn degree(&self, id: IndividualId) -> usize {
        self.neighbors(id).len()
    }

    #[must_use]
    pub fn position(&self, id: IndividualId) -> Option<Position> {
        self.graph.positions.get(id.0).copied().flatten()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count
    }

    /// Every undirected edge exactly once, as `(lower, higher)`.
    pub fn edges(&self) -> impl Iterator<Item = (IndividualId, IndividualId)> + '_ {
        self.graph
            .adjacency_lists
            .iter()
            .enumerate()
            .flat_map(|(index, neighbors)| {
                neighbors
                    .iter()
                    .filter(move |neighbor| neighbor.0 > index)
                    .map(move |neighbor| (IndividualId(index), *neighbor))
            })
    }

    /// Maps each degree to the number of individuals having it.
    #[must_use]
    pub fn degree_distribution(&self) -> BTreeMap<usize, usize> {
        let mut distribution = BTreeMap::new();
        for neighbors in &self.graph.adjacency_lists {
            *distribution.entry(neighbors.len()).or_insert(0) += 1;
        }
        distribution
    }

    #[must_use]
    pub fn max_degree(&self) -> usize {
        self.graph
            .adjacency_lists
            .iter()
            .map(Vec::len)
            .max()
            .unwrap_or(0)
    }

    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_degree(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        (2 * self.edge_count()) as f64 / self.len() as f64
    }

    /// Returns the individuals having exactly the given number of neighbors.
    #[must_use]
    pub fn individuals_with_degree(&self, degree: usize) -> Vec<IndividualId> {
        self.graph
            .adjacency_lists
            .iter()
            .enumerate()
            .filter_map(|(pos, edges)| (edges.len() == degree).then_some(IndividualId(pos)))
            .collect()
    }

    /// The number of individuals whose exposure is attributed to `id`.
    #[must_use]
    pub fn secondary_cases(&self, id: IndividualId) -> usize {
        self.individuals
            .iter()
            .filter(|individual| individual.infected_by() == Some(id))
            .count()
    }

    /// Tallies the population by state for the given day.
    #[must_use]
    pub fn snapshot(&self, day: u32) -> DailySnapshot {
        let mut snapshot = DailySnapshot {
            day,
            ..DailySnapshot::default()
        };
        for individual in &self.individuals {
            *snapshot.count_mut(individual.state()) += 1;
        }
        snapshot
    }

    /// A copy of this network with every individual back in `Susceptible` and no timestamps.
    /// The contact graph is shared, not rebuilt.
    #[must_use]
    pub fn reset_states(&self) -> Network {
        let mut network = self.clone();
        network.individuals_mut().for_each(Individual::reset);
        network
    }

    /// Checks the structural invariants: identities match arena positions, and the edge
    /// relation is symmetric, loop-free and without duplicates.
    pub fn validate(&self) -> Result<(), EpiError> {
        let violation = |message: String| Err(EpiError::InvariantViolation(message));
        if self.graph.adjacency_lists.len() != self.individuals.len() {
            return violation(format!(
                "graph has {} adjacency lists for {} individuals",
                self.graph.adjacency_lists.len(),
                self.individuals.len()
            ));
        }
        let mut half_edges = 0;
        for (index, neighbors) in self.graph.adjacency_lists.iter().enumerate() {
            let id = IndividualId(index);
            if self.individuals[index].id() != id {
                return violation(format!(
                    "individual stored at {index} has id {}",
                    self.individuals[index].id()
                ));
            }
            let mut seen = HashSet::default();
            for &neighbor in neighbors {
                if neighbor == id {
                    return violation(format!("{id} lists itself as a neighbor"));
                }
                if !seen.insert(neighbor) {
                    return violation(format!("{id} lists {neighbor} twice"));
                }
                if !self.neighbors(neighbor).contains(&id) {
                    return violation(format!("{id} lists {neighbor} but not the reverse"));
                }
            }
            half_edges += neighbors.len();
        }
        if half_edges != 2 * self.graph.edge_count {
            return violation(format!(
                "edge count {} disagrees with adjacency lists",
                self.graph.edge_count
            ));
        }
        Ok(())
    }
}

/// The serialized form of one individual, for consumers that render the network.
#[derive(Serialize)]
struct IndividualRecord<'a> {
    #[serde(flatten)]
    individual: &'a Individual,
    neighbors: &'a [IndividualId],
    #[serde(skip_serializing_if = "Option::is_none")]
    position: Option<Position>,
}

impl Serialize for Network {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for individual in &self.individuals {
            seq.serialize_element(&IndividualRecord {
                individual,
                neighbors: self.neighbors(individual.id()),
                position: self.position(individual.id()),
            })?;
        }
        seq.end()
    }
}

use crate::{FiducciaMattheyses, Graph, InitialPartitioningMethod, Solution};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub struct BisectionPartitioningConfig {
    /// The seed for the random number generator.
    pub rng_seed: u64,
    /// What initial partitioning method to use.
    pub initial_partitioning: InitialPartitioningMethod,
    /// If this is set to Some(n), refinement stops after n completed passes even if it is still improving.
    pub max_passes: Option<u32>,
}

impl Default for BisectionPartitioningConfig {
    fn default() -> Self {
        Self {
            rng_seed: 1234,
            initial_partitioning: InitialPartitioningMethod::Random,
            max_passes: None,
        }
    }
}

impl Graph {
    /// Splits the graph into two equally sized parts while minimizing the edge cut cost.
    ///
    /// Panics if the graph has an odd number of vertices.
    pub fn partition_bisection(&self, config: &BisectionPartitioningConfig) -> Solution {
        let mut rng = StdRng::seed_from_u64(config.rng_seed);
        let initial = config
            .initial_partitioning
            .generate(self.len(), 2, &mut rng);
        log::trace!("initial edge cut: {}", self.score_solution(&initial));

        self.refine_bisection(config, initial)
    }

    /// Improves a balanced bisection with Fiduccia-Mattheyses passes until no pass improves it.
    pub fn refine_bisection(&self, config: &BisectionPartitioningConfig, initial: Solution) -> Solution {
        let refined = FiducciaMattheyses::new(self)
            .with_max_passes(config.max_passes)
            .refine(initial);
        log::debug!(
            "bisection of {} vertices: edge cut {:?} after {} passes",
            self.len(),
            refined.score(),
            refined.pass_count()
        );
        refined
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two 4-cliques joined by a single bridge between vertices 4 and 5.
    fn barbell() -> Graph {
        Graph::from_adjacency(vec![
            vec![2, 3, 4],
            vec![1, 3, 4],
            vec![1, 2, 4],
            vec![1, 2, 3, 5],
            vec![4, 6, 7, 8],
            vec![5, 7, 8],
            vec![5, 6, 8],
            vec![5, 6, 7],
        ])
        .unwrap()
    }

    #[test]
    fn alternating_barbell_finds_bridge() {
        let graph = barbell();
        let refined = graph.partition_bisection(&BisectionPartitioningConfig {
            initial_partitioning: InitialPartitioningMethod::Modulo,
            ..Default::default()
        });

        assert!(refined.is_valid(2));
        assert_eq!(refined.score(), Some(graph.score_solution(&refined)));
        assert!(refined.score().unwrap() <= 9);
        assert!(refined.pass_count() >= 1);
    }

    #[test]
    fn same_seed_same_result() {
        let graph = barbell();
        let config = BisectionPartitioningConfig::default();
        assert_eq!(
            graph.partition_bisection(&config),
            graph.partition_bisection(&config)
        );
    }

    #[test]
    fn refine_keeps_optimal_input() {
        let graph = barbell();
        let initial = Solution::new(vec![0, 0, 0, 0, 1, 1, 1, 1], 2);
        let refined = graph.refine_bisection(&BisectionPartitioningConfig::default(), initial.clone());
        assert_eq!(refined.partitioning(), initial.partitioning());
        assert_eq!(refined.score(), Some(1));
        assert_eq!(refined.pass_count(), 0);
    }
}

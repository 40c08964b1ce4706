use crate::bucket::{GainBucket, Side, VertexState};
use crate::{Graph, Solution};

/// One entry of the move log written during a sweep.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Move {
    /// 1-based id of the moved vertex.
    pub vertex: u32,
    /// Gain of the vertex at the time it was moved.
    pub gain: i32,
    /// Cut score after this move.
    pub score: i32,
    /// Whether the partitioning was balanced after this move.
    pub valid: bool,
}

/// Fiduccia-Mattheyses refinement of a balanced bisection.
///
/// The engine owns the pass-scoped vertex arena and both gain buckets. They are cleared
/// in place between passes, so repeated refinements over the same graph reuse their allocations.
pub struct FiducciaMattheyses<'g> {
    graph: &'g Graph,
    vertices: Vec<VertexState>,
    buckets: [GainBucket; 2],
    log: Vec<Move>,
    max_passes: Option<u32>,
}

impl<'g> FiducciaMattheyses<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        let max_degree = graph.max_degree();
        Self {
            graph,
            vertices: vec![VertexState::default(); graph.len()],
            buckets: [
                GainBucket::new(Side::A, max_degree),
                GainBucket::new(Side::B, max_degree),
            ],
            log: Vec::with_capacity(graph.len()),
            max_passes: None,
        }
    }

    /// Caps the number of completed passes a single [`refine`](Self::refine) call may run.
    pub fn with_max_passes(mut self, max_passes: Option<u32>) -> Self {
        self.max_passes = max_passes;
        self
    }

    /// Moves of the most recent pass, in the order they were made.
    pub fn move_log(&self) -> &[Move] {
        &self.log
    }

    /// Repeats passes until one fails to strictly improve the cut score.
    ///
    /// The returned solution carries its cut score and the input's pass count plus the
    /// number of passes completed here.
    pub fn refine(&mut self, parent: Solution) -> Solution {
        let mut parent = parent;
        let mut passes = 0u32;

        loop {
            let start_score = self.graph.score_solution(&parent);
            if self.max_passes.map_or(false, |max| passes >= max) {
                log::debug!("pass budget of {passes} exhausted");
                parent.set_score(start_score);
                break;
            }

            let Some(mut best) = self.pass(&parent) else {
                parent.set_score(start_score);
                break;
            };
            passes += 1;
            best.set_pass_count(parent.pass_count() + 1);

            let best_score = self.graph.score_solution(&best);
            if best.score() != Some(best_score) {
                log::warn!(
                    "running cut {:?} disagrees with rescored cut {best_score}",
                    best.score()
                );
                best.set_score(best_score);
            }
            log::debug!("pass {passes}: cut {start_score} -> {best_score}");

            let improved = best_score < start_score;
            parent = best;
            if !improved {
                break;
            }
        }

        parent
    }

    /// Runs a single pass starting from `parent`.
    ///
    /// Returns `None` when the summed initial gains show no improving move, in which case
    /// no moves are made. Otherwise returns the balanced solution at the best point of the
    /// sweep, with its score set.
    pub fn pass(&mut self, parent: &Solution) -> Option<Solution> {
        assert_eq!(
            parent.partition_count(),
            2,
            "Fiduccia-Mattheyses refines bisections only"
        );
        assert_eq!(
            parent.len(),
            self.graph.len(),
            "solution does not cover the graph"
        );

        self.reset();
        self.log.clear();

        let score = self.graph.score_solution(parent);
        let gain_sum = self.init_gains(parent, score);
        if gain_sum <= 0 {
            log::trace!("no improving move (gain sum {gain_sum}), skipping pass");
            self.reset();
            return None;
        }

        if log::log_enabled!(log::Level::Trace) {
            for bucket in self.buckets.iter() {
                log::trace!("initial gains:\n{}", bucket.dump(&self.vertices));
            }
        }

        let mut working = parent.clone();
        self.sweep(&mut working, score);
        let best = self.replay(parent);

        self.reset();
        Some(best)
    }

    fn reset(&mut self) {
        for v in self.vertices.iter_mut() {
            v.reset();
        }
        for bucket in self.buckets.iter_mut() {
            bucket.clear();
        }
    }

    /// Scores each single-vertex flip against `score` and registers every vertex in the
    /// bucket of its current side. Returns the sum of all gains.
    fn init_gains(&mut self, parent: &Solution, score: i32) -> i32 {
        let mut gain_sum = 0;
        for vx in 0..self.graph.len() {
            let mut child = parent.clone();
            child.switch_partitioning(vx);
            let gain = score - self.graph.score_solution(&child);

            // A vertex whose flip lands it in group 1 currently sits on side A.
            let side = if child.partitioning()[vx] == 1 {
                Side::A
            } else {
                Side::B
            };
            self.buckets[side.index()].add(&mut self.vertices, vx, gain);
            gain_sum += gain;
        }
        gain_sum
    }

    /// Locks every vertex once, always taking the best candidate from the fuller side,
    /// and logs each move.
    fn sweep(&mut self, working: &mut Solution, mut score: i32) {
        let graph = self.graph;
        let mut group_sizes = [0usize; 2];
        for &p in working.partitioning() {
            group_sizes[p as usize] += 1;
        }

        loop {
            let [a, b] = &self.buckets;
            let side = if a.population() >= b.population() {
                Side::A
            } else {
                Side::B
            };
            let Some(vx) = self.buckets[side.index()].pop_max(&mut self.vertices) else {
                break;
            };

            let gain = self.vertices[vx].gain;
            self.vertices[vx].free = false;
            let from = working.partitioning()[vx];

            for &c in graph.vertices()[vx].connections.iter() {
                let nx = c as usize - 1;
                if !self.vertices[nx].free {
                    continue;
                }
                let delta = if working.partitioning()[nx] == from {
                    2
                } else {
                    -2
                };
                let neighbour_side = Side::of_group(working.partitioning()[nx]);
                let bucket = &mut self.buckets[neighbour_side.index()];
                let new_gain = self.vertices[nx].gain + delta;
                bucket.remove(&mut self.vertices, nx);
                bucket.add(&mut self.vertices, nx, new_gain);
            }

            debug_assert!(self.vertices.iter().all(|v| v.free == v.owner.is_some()));

            working.switch_partitioning(vx);
            group_sizes[from as usize] -= 1;
            group_sizes[working.partitioning()[vx] as usize] += 1;
            score -= gain;

            let valid = group_sizes[0] == group_sizes[1];
            debug_assert_eq!(valid, working.is_valid(2));
            debug_assert_eq!(score, graph.score_solution(working));

            log::trace!(
                "moved {} from {:?} with gain {}, cut {}, valid {}",
                vx + 1,
                side,
                gain,
                score,
                valid
            );
            self.log.push(Move {
                vertex: vx as u32 + 1,
                gain,
                score,
                valid,
            });
        }
    }

    /// Rebuilds the solution from `parent` by applying the log up to its earliest
    /// lowest-scoring balanced entry.
    fn replay(&self, parent: &Solution) -> Solution {
        let best = self
            .log
            .iter()
            .enumerate()
            .filter(|(_, m)| m.valid)
            .min_by_key(|(i, m)| (m.score, *i))
            .map(|(i, _)| i);
        let Some(best) = best else {
            panic!("no balanced state reached during the sweep");
        };

        let mut solution = parent.clone();
        for m in self.log[..=best].iter() {
            solution.switch_partitioning(m.vertex as usize - 1);
        }
        assert!(
            solution.is_valid(2),
            "reconstructed solution is not balanced: {solution}"
        );

        let score = self.log[best].score;
        debug_assert_eq!(score, self.graph.score_solution(&solution));
        solution.set_score(score);
        log::trace!("kept {} of {} moves, cut {}", best + 1, self.log.len(), score);
        solution
    }

    #[cfg(test)]
    fn state(&self, vx: usize) -> &VertexState {
        &self.vertices[vx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path4() -> Graph {
        Graph::from_adjacency(vec![vec![2], vec![1, 3], vec![2, 4], vec![3]]).unwrap()
    }

    fn cycle(n: u32) -> Graph {
        Graph::from_adjacency(
            (1..=n)
                .map(|i| vec![if i == 1 { n } else { i - 1 }, if i == n { 1 } else { i + 1 }])
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn pass_logs_every_vertex() {
        let graph = path4();
        let mut fm = FiducciaMattheyses::new(&graph);
        let best = fm.pass(&Solution::new(vec![1, 0, 1, 0], 2)).unwrap();

        let log = fm.move_log();
        assert_eq!(log.len(), 4);
        assert_eq!(
            log[0],
            Move {
                vertex: 2,
                gain: 2,
                score: 1,
                valid: false
            }
        );
        assert_eq!(
            log[1],
            Move {
                vertex: 3,
                gain: 0,
                score: 1,
                valid: true
            }
        );
        assert_eq!(best.partitioning(), &[1, 1, 0, 0]);
        assert_eq!(best.score(), Some(1));
    }

    #[test]
    fn moves_alternate_sides() {
        let graph = cycle(8);
        let mut fm = FiducciaMattheyses::new(&graph);
        let parent = Solution::new(vec![0, 1, 0, 1, 0, 1, 0, 1], 2);
        fm.pass(&parent).unwrap();

        for (i, m) in fm.move_log().iter().enumerate() {
            assert_eq!(m.valid, i % 2 == 1, "move {i}");
            let group = parent.partitioning()[m.vertex as usize - 1];
            assert_eq!(group, (i % 2) as u32, "move {i} taken from the wrong side");
        }
    }

    #[test]
    fn full_sweep_ends_on_complement() {
        let graph = cycle(8);
        let mut fm = FiducciaMattheyses::new(&graph);
        let parent = Solution::new(vec![0, 0, 1, 0, 1, 1, 0, 1], 2);
        let start = graph.score_solution(&parent);
        fm.pass(&parent).unwrap();

        let last = fm.move_log().last().copied().unwrap();
        assert!(last.valid);
        assert_eq!(last.score, start);
    }

    #[test]
    fn arena_is_clean_after_pass() {
        let graph = cycle(6);
        let mut fm = FiducciaMattheyses::new(&graph);
        fm.pass(&Solution::new(vec![0, 1, 0, 1, 0, 1], 2));
        for vx in 0..graph.len() {
            assert_eq!(*fm.state(vx), VertexState::default());
        }
        assert_eq!(fm.buckets[0].population(), 0);
        assert_eq!(fm.buckets[1].population(), 0);
    }

    #[test]
    fn early_termination_makes_no_moves() {
        let graph = path4();
        let mut fm = FiducciaMattheyses::new(&graph);
        assert!(fm.pass(&Solution::new(vec![0, 0, 1, 1], 2)).is_none());
        assert!(fm.move_log().is_empty());
    }

    #[test]
    fn pass_budget_stops_refinement() {
        let graph = cycle(16);
        let parent = Solution::new((0..16).map(|i| i % 2).collect(), 2);
        let refined = FiducciaMattheyses::new(&graph)
            .with_max_passes(Some(1))
            .refine(parent);
        assert_eq!(refined.pass_count(), 1);
        assert!(refined.is_valid(2));
    }

    #[test]
    fn isolated_vertices_terminate_immediately() {
        let graph = Graph::from_adjacency(vec![vec![], vec![], vec![], vec![]]).unwrap();
        let refined = FiducciaMattheyses::new(&graph).refine(Solution::new(vec![0, 1, 1, 0], 2));
        assert_eq!(refined.partitioning(), &[0, 1, 1, 0]);
        assert_eq!(refined.score(), Some(0));
        assert_eq!(refined.pass_count(), 0);
    }

    #[test]
    #[should_panic(expected = "no balanced state")]
    fn odd_graph_never_reaches_balance() {
        let graph = Graph::from_adjacency(vec![vec![2], vec![1, 3], vec![2]]).unwrap();
        FiducciaMattheyses::new(&graph).pass(&Solution::new(vec![0, 1, 0], 2));
    }

    #[test]
    fn buckets_are_reused_across_passes() {
        let graph = cycle(8);
        let mut fm = FiducciaMattheyses::new(&graph);
        let widths = [fm.buckets[0].width(), fm.buckets[1].width()];
        fm.pass(&Solution::new(vec![0, 1, 0, 1, 0, 1, 0, 1], 2)).unwrap();
        fm.pass(&Solution::new(vec![0, 0, 1, 0, 1, 1, 0, 1], 2)).unwrap();
        assert_eq!([fm.buckets[0].width(), fm.buckets[1].width()], widths);
        assert!(fm.buckets.iter().all(|b| b.max_active_slot().is_none()));
    }

    #[test]
    #[should_panic(expected = "bisections only")]
    fn rejects_multiway_solutions() {
        let graph = Graph::from_adjacency(vec![vec![], vec![], vec![]]).unwrap();
        FiducciaMattheyses::new(&graph).pass(&Solution::new(vec![0, 1, 2], 3));
    }
}

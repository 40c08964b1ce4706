use rand::Rng;
use std::fmt;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum InitialPartitioningMethod {
    /// Vertices are initialized to partitions based on their index in the graph (idx % partitions).
    Modulo,
    /// Vertices are initialized to random partitions, redrawn until every partition has the same size.
    Random,
}

impl InitialPartitioningMethod {
    pub fn generate<R: Rng>(self, size: usize, partition_count: u32, rng: &mut R) -> Solution {
        match self {
            InitialPartitioningMethod::Modulo => Solution::new(
                (0..size).map(|i| i as u32 % partition_count).collect(),
                partition_count,
            ),
            InitialPartitioningMethod::Random => Solution::random(size, partition_count, rng),
        }
    }
}

/// A group assignment for every vertex, ordered by vertex id, together with its cut score
/// and the number of refinement passes that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    partitioning: Vec<u32>,
    partition_count: u32,
    score: Option<i32>,
    pass_count: u32,
}

impl Solution {
    pub fn new(partitioning: Vec<u32>, partition_count: u32) -> Self {
        assert!(partition_count > 0, "a solution needs at least one partition");
        Self {
            partitioning,
            partition_count,
            score: None,
            pass_count: 0,
        }
    }

    pub fn with_score(partitioning: Vec<u32>, partition_count: u32, score: i32) -> Self {
        Self {
            score: Some(score),
            ..Self::new(partitioning, partition_count)
        }
    }

    /// Draws uniform random assignments until all groups are exactly the same size.
    ///
    /// Panics if `size` is not a multiple of `partition_count`, since no draw could ever be accepted.
    pub fn random<R: Rng>(size: usize, partition_count: u32, rng: &mut R) -> Self {
        assert!(partition_count > 0, "a solution needs at least one partition");
        assert!(
            size % partition_count as usize == 0,
            "{size} vertices cannot be split into {partition_count} equal groups"
        );

        let target = size / partition_count as usize;
        let mut partitioning = vec![0u32; size];
        let mut counts = vec![0usize; partition_count as usize];
        let mut draws = 0u32;
        loop {
            draws += 1;
            counts.fill(0);
            for p in partitioning.iter_mut() {
                *p = rng.gen_range(0..partition_count);
                counts[*p as usize] += 1;
            }
            if counts.iter().all(|&c| c == target) {
                break;
            }
        }
        log::trace!("balanced random partitioning after {draws} draws");

        Self::new(partitioning, partition_count)
    }

    pub fn partitioning(&self) -> &[u32] {
        &self.partitioning
    }

    pub fn partition_count(&self) -> u32 {
        self.partition_count
    }

    pub fn len(&self) -> usize {
        self.partitioning.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitioning.is_empty()
    }

    /// Cut score, if this solution has been scored.
    pub fn score(&self) -> Option<i32> {
        self.score
    }

    pub fn set_score(&mut self, score: i32) {
        self.score = Some(score);
    }

    pub fn pass_count(&self) -> u32 {
        self.pass_count
    }

    pub fn set_pass_count(&mut self, passes: u32) {
        self.pass_count = passes;
    }

    /// Moves the vertex at `index` to the next group, wrapping around.
    /// Any cached score is dropped since it no longer describes the partitioning.
    pub fn switch_partitioning(&mut self, index: usize) {
        let p = &mut self.partitioning[index];
        *p = (*p + 1) % self.partition_count;
        self.score = None;
    }

    /// True if each of the groups `0..groups` holds the same number of vertices.
    pub fn is_valid(&self, groups: u32) -> bool {
        if groups == 0 {
            return self.partitioning.is_empty();
        }
        let mut counts = vec![0usize; groups as usize];
        for &p in self.partitioning.iter() {
            match counts.get_mut(p as usize) {
                Some(c) => *c += 1,
                None => return false,
            }
        }
        counts.iter().all(|&c| c == counts[0])
    }

    /// Number of positions where the two assignments differ.
    pub fn hamming_distance(&self, other: &Solution) -> usize {
        assert_eq!(self.len(), other.len(), "solutions of different sizes");
        self.partitioning
            .iter()
            .zip(other.partitioning.iter())
            .filter(|(a, b)| a != b)
            .count()
    }
}

impl fmt::Display for Solution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, p) in self.partitioning.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{p}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn random_is_balanced() {
        let mut rng = StdRng::seed_from_u64(1234);
        for size in [0, 2, 10, 64] {
            let s = Solution::random(size, 2, &mut rng);
            assert_eq!(s.len(), size);
            assert!(s.is_valid(2));
            assert_eq!(s.score(), None);
            assert_eq!(s.pass_count(), 0);
        }
    }

    #[test]
    fn random_is_reproducible_under_seed() {
        let a = Solution::random(32, 2, &mut StdRng::seed_from_u64(7));
        let b = Solution::random(32, 2, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    #[should_panic(expected = "cannot be split")]
    fn random_rejects_odd_bisection() {
        Solution::random(5, 2, &mut StdRng::seed_from_u64(1));
    }

    #[test]
    fn modulo_alternates() {
        let s = InitialPartitioningMethod::Modulo.generate(6, 2, &mut StdRng::seed_from_u64(0));
        assert_eq!(s.partitioning(), &[0, 1, 0, 1, 0, 1]);
        assert!(s.is_valid(2));
    }

    #[test]
    fn clones_do_not_alias() {
        let mut original = Solution::with_score(vec![0, 1, 0, 1], 2, 3);
        original.set_pass_count(2);
        let mut copy = original.clone();
        copy.switch_partitioning(0);

        assert_eq!(original.partitioning(), &[0, 1, 0, 1]);
        assert_eq!(original.score(), Some(3));
        assert_eq!(copy.partitioning(), &[1, 1, 0, 1]);
        assert_eq!(copy.score(), None);
        assert_eq!(copy.pass_count(), 2);
    }

    #[test]
    fn switch_wraps_around() {
        let mut s = Solution::new(vec![0, 1, 2], 3);
        s.switch_partitioning(2);
        s.switch_partitioning(0);
        assert_eq!(s.partitioning(), &[1, 1, 0]);
    }

    #[test]
    fn validity_requires_equal_groups() {
        assert!(Solution::new(vec![0, 1, 1, 0], 2).is_valid(2));
        assert!(!Solution::new(vec![0, 1, 1, 1], 2).is_valid(2));
        assert!(!Solution::new(vec![0, 2, 1, 1], 3).is_valid(2));
        assert!(Solution::new(vec![0, 2, 1], 3).is_valid(3));
        assert!(Solution::new(vec![], 2).is_valid(2));
    }

    #[test]
    fn hamming_distance_counts_differences() {
        let a = Solution::new(vec![0, 0, 1, 1], 2);
        let b = Solution::new(vec![1, 0, 1, 0], 2);
        assert_eq!(a.hamming_distance(&b), 2);
        assert_eq!(a.to_string(), "0 0 1 1");
    }
}

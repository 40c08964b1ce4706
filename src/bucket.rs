/// The two sides of a bisection. Side `A` holds vertices currently in group 0.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn of_group(group: u32) -> Self {
        if group == 0 {
            Side::A
        } else {
            Side::B
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }
}

/// Per-vertex bookkeeping that only lives for the duration of one refinement pass.
/// `prev`/`next` are indices into the same arena and are only meaningful while `owner` is set.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct VertexState {
    pub gain: i32,
    pub free: bool,
    pub owner: Option<Side>,
    prev: Option<usize>,
    next: Option<usize>,
}

impl Default for VertexState {
    fn default() -> Self {
        Self {
            gain: 0,
            free: true,
            owner: None,
            prev: None,
            next: None,
        }
    }
}

impl VertexState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_linked(&self) -> bool {
        self.owner.is_some() || self.prev.is_some() || self.next.is_some()
    }
}

/// Free vertices of one side, bucketed by gain. Slot `i` holds the vertices with gain
/// `i - max_degree` as a doubly linked list threaded through the vertex arena, newest first.
pub struct GainBucket {
    side: Side,
    max_degree: i32,
    heads: Vec<Option<usize>>,
    tails: Vec<Option<usize>>,
    lengths: Vec<usize>,
    active: Vec<bool>,
    population: usize,
}

impl GainBucket {
    pub fn new(side: Side, max_degree: usize) -> Self {
        let width = 2 * max_degree + 1;
        Self {
            side,
            max_degree: max_degree as i32,
            heads: vec![None; width],
            tails: vec![None; width],
            lengths: vec![0; width],
            active: vec![false; width],
            population: 0,
        }
    }

    /// Empties every slot. Vertex links live in the arena and must be reset by its owner.
    pub fn clear(&mut self) {
        self.heads.fill(None);
        self.tails.fill(None);
        self.lengths.fill(0);
        self.active.fill(false);
        self.population = 0;
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn width(&self) -> usize {
        self.heads.len()
    }

    pub fn slot_of(&self, gain: i32) -> usize {
        let slot = gain + self.max_degree;
        assert!(
            slot >= 0 && (slot as usize) < self.width(),
            "gain {gain} outside of bucket range ±{}",
            self.max_degree
        );
        slot as usize
    }

    pub fn gain_of(&self, slot: usize) -> i32 {
        slot as i32 - self.max_degree
    }

    /// Number of free vertices currently registered.
    pub fn population(&self) -> usize {
        self.population
    }

    pub fn is_active(&self, slot: usize) -> bool {
        self.active[slot]
    }

    /// Inserts `vx` at the head of the slot for `gain` and records the gain on the vertex.
    pub fn add(&mut self, vertices: &mut [VertexState], vx: usize, gain: i32) {
        assert!(
            !vertices[vx].is_linked(),
            "vertex {} is already registered in a bucket",
            vx + 1
        );
        let slot = self.slot_of(gain);

        let old_head = self.heads[slot];
        {
            let v = &mut vertices[vx];
            v.gain = gain;
            v.owner = Some(self.side);
            v.prev = None;
            v.next = old_head;
        }
        match old_head {
            Some(h) => vertices[h].prev = Some(vx),
            None => self.tails[slot] = Some(vx),
        }
        self.heads[slot] = Some(vx);

        self.lengths[slot] += 1;
        self.active[slot] = true;
        self.population += 1;
    }

    /// Detaches `vx` from the slot of its current gain.
    pub fn remove(&mut self, vertices: &mut [VertexState], vx: usize) {
        assert_eq!(
            vertices[vx].owner,
            Some(self.side),
            "vertex {} is not registered in bucket {:?}",
            vx + 1,
            self.side
        );
        let slot = self.slot_of(vertices[vx].gain);
        let VertexState { prev, next, .. } = vertices[vx];

        match prev {
            Some(p) => vertices[p].next = next,
            None => self.heads[slot] = next,
        }
        match next {
            Some(n) => vertices[n].prev = prev,
            None => self.tails[slot] = prev,
        }

        let v = &mut vertices[vx];
        v.prev = None;
        v.next = None;
        v.owner = None;

        self.lengths[slot] -= 1;
        if self.lengths[slot] == 0 {
            self.active[slot] = false;
        }
        self.population -= 1;
    }

    /// Highest slot that still holds a vertex.
    pub fn max_active_slot(&self) -> Option<usize> {
        self.active.iter().rposition(|&a| a)
    }

    pub fn first_vertex(&self, slot: usize) -> usize {
        match self.heads[slot] {
            Some(vx) => vx,
            None => panic!("slot {slot} of bucket {:?} is empty", self.side),
        }
    }

    /// Takes the newest vertex of the highest-gain slot out of the bucket.
    pub fn pop_max(&mut self, vertices: &mut [VertexState]) -> Option<usize> {
        let slot = self.max_active_slot()?;
        let vx = self.first_vertex(slot);
        self.remove(vertices, vx);
        Some(vx)
    }

    /// Vertex indices of one slot in list order.
    pub fn slot_members(&self, vertices: &[VertexState], slot: usize) -> Vec<usize> {
        let mut members = Vec::with_capacity(self.lengths[slot]);
        let mut cursor = self.heads[slot];
        while let Some(vx) = cursor {
            members.push(vx);
            cursor = vertices[vx].next;
        }
        members
    }

    /// One line per gain value listing the 1-based ids it holds.
    pub fn dump(&self, vertices: &[VertexState]) -> String {
        let mut out = String::new();
        for slot in 0..self.width() {
            out.push_str(&format!("bucket {:?} {:>3} :", self.side, self.gain_of(slot)));
            for vx in self.slot_members(vertices, slot) {
                out.push_str(&format!(" {}", vx + 1));
            }
            out.push('\n');
        }
        out
    }
}

// Balanced graph bisection using the Fiduccia-Mattheyses heuristic:
// https://doi.org/10.1145/800263.809204

mod bisection;
mod bucket;
mod fiduccia_mattheyses;
mod solution;

pub use bisection::BisectionPartitioningConfig;
pub use bucket::{GainBucket, Side, VertexState};
pub use fiduccia_mattheyses::{FiducciaMattheyses, Move};
pub use solution::{InitialPartitioningMethod, Solution};

use anyhow::{bail, ensure, Context, Result};
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[derive(Clone, Debug, PartialEq)]
pub struct Vertex {
    /// 1-based identifier, equal to the vertex's position in the graph plus one.
    pub id: u32,
    /// 1-based ids of the neighbours. Duplicates are kept and count as parallel edges.
    pub connections: Vec<u32>,
    /// Optional layout coordinates, carried through from coordinate graph files.
    pub position: Option<(f64, f64)>,
}

impl Vertex {
    pub fn new(id: u32, connections: Vec<u32>) -> Self {
        Self {
            id,
            connections,
            position: None,
        }
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vertex: {} [", self.id)?;
        for (i, c) in self.connections.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{c}")?;
        }
        write!(f, "]")
    }
}

/// Immutable adjacency view. Edges are expected to appear in both endpoints' lists.
#[derive(Clone, Debug)]
pub struct Graph {
    vertices: Vec<Vertex>,
    max_degree: usize,
}

impl Graph {
    /// Builds a graph from vertices listed in id order (1, 2, ...).
    /// Fails if an id is out of place, a connection points outside the graph, or an edge
    /// is not listed the same number of times by both of its endpoints.
    pub fn new(vertices: Vec<Vertex>) -> Result<Self> {
        let n = vertices.len();
        for (i, v) in vertices.iter().enumerate() {
            ensure!(
                v.id as usize == i + 1,
                "vertex at position {} has id {}, expected {}",
                i,
                v.id,
                i + 1
            );
            for &c in v.connections.iter() {
                ensure!(
                    c >= 1 && c as usize <= n,
                    "vertex {} references neighbour {} outside 1..={}",
                    v.id,
                    c,
                    n
                );
            }
        }

        // u -> v counts +1 and v -> u counts -1 under the key (min, max).
        let mut balance: HashMap<(u32, u32), i64> = HashMap::new();
        for v in vertices.iter() {
            for &c in v.connections.iter() {
                if c == v.id {
                    continue;
                }
                let key = (v.id.min(c), v.id.max(c));
                *balance.entry(key).or_insert(0) += if v.id < c { 1 } else { -1 };
            }
        }
        let unmatched = balance
            .iter()
            .filter(|(_, b)| **b != 0)
            .map(|(k, _)| *k)
            .min();
        if let Some((u, v)) = unmatched {
            bail!("edge {u}-{v} is not listed symmetrically by both endpoints");
        }

        let max_degree = vertices
            .iter()
            .map(|v| v.connections.len())
            .max()
            .unwrap_or(0);

        Ok(Self {
            vertices,
            max_degree,
        })
    }

    /// Builds a graph from 1-based adjacency lists, `adjacency[i]` belonging to vertex `i + 1`.
    pub fn from_adjacency(adjacency: Vec<Vec<u32>>) -> Result<Self> {
        Self::new(
            adjacency
                .into_iter()
                .enumerate()
                .map(|(i, connections)| Vertex::new(i as u32 + 1, connections))
                .collect(),
        )
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Highest adjacency-list length. Gains are bounded by it, so gain buckets are sized from it.
    pub fn max_degree(&self) -> usize {
        self.max_degree
    }

    /// Number of edges crossing between groups. Every crossing edge is seen from both
    /// endpoints, hence the final halving.
    pub fn score_bipartition(&self, partitioning: &[u32]) -> i32 {
        assert_eq!(
            partitioning.len(),
            self.vertices.len(),
            "partitioning does not cover the graph"
        );

        let mut crossings = 0;
        for (v, &part) in self.vertices.iter().zip(partitioning.iter()) {
            for &c in v.connections.iter() {
                if partitioning[c as usize - 1] != part {
                    crossings += 1;
                }
            }
        }
        crossings / 2
    }

    pub fn score_solution(&self, solution: &Solution) -> i32 {
        self.score_bipartition(solution.partitioning())
    }

    pub fn read_metis<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
        Self::deserialize_metis(file)
    }

    /// Parses the METIS adjacency format: a header `vertices edges` followed by one line of
    /// 1-based neighbour ids per vertex.
    pub fn deserialize_metis<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);
        let mut lines = reader
            .lines()
            .filter(|l| !matches!(l, Ok(l) if l.starts_with('%') || l.starts_with('#')));

        // Parse the header line
        let header = lines.next().context("could not get header line")??;
        let header_parts = header.split_ascii_whitespace().collect::<Vec<_>>();
        let vertex_count = header_parts
            .first()
            .context("empty header line")?
            .parse::<usize>()
            .context("could not parse vertex count")?;

        let mut adjacency = Vec::with_capacity(vertex_count);
        for line in lines {
            let line = line?;
            let connections = line
                .split_ascii_whitespace()
                .map(|dst| {
                    dst.parse::<u32>()
                        .with_context(|| format!("could not parse neighbour {dst:?}"))
                })
                .collect::<Result<Vec<_>>>()?;
            adjacency.push(connections);
        }

        // Trailing isolated vertices may be written as empty lines or omitted entirely.
        while adjacency.len() > vertex_count && adjacency.last().map_or(false, Vec::is_empty) {
            adjacency.pop();
        }
        ensure!(
            adjacency.len() <= vertex_count,
            "header declares {} vertices but {} adjacency lines follow",
            vertex_count,
            adjacency.len()
        );
        adjacency.resize(vertex_count, Vec::new());

        Self::from_adjacency(adjacency)
    }

    pub fn read_coordinates<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("could not open {}", path.display()))?;
        Self::deserialize_coordinates(file)
    }

    /// Parses one vertex per line: `id (x,y) degree n1 n2 ...`.
    pub fn deserialize_coordinates<R: Read>(reader: R) -> Result<Self> {
        let reader = BufReader::new(reader);

        let mut vertices = Vec::new();
        for (line_no, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let vertex =
                parse_coordinate_line(&line).with_context(|| format!("line {}", line_no + 1))?;
            vertices.push(vertex);
        }

        Self::new(vertices)
    }
}

fn parse_coordinate_line(line: &str) -> Result<Vertex> {
    let mut parts = line.split_ascii_whitespace();

    let id = parts
        .next()
        .context("missing vertex id")?
        .parse::<u32>()
        .context("could not parse vertex id")?;

    let coordinates = parts.next().context("missing coordinates")?;
    let Some((x, y)) = coordinates
        .strip_prefix('(')
        .and_then(|c| c.strip_suffix(')'))
        .and_then(|c| c.split_once(','))
    else {
        bail!("malformed coordinates {coordinates:?}");
    };
    let x = x.trim().parse::<f64>().context("could not parse x coordinate")?;
    let y = y.trim().parse::<f64>().context("could not parse y coordinate")?;

    let degree = parts
        .next()
        .context("missing degree")?
        .parse::<usize>()
        .context("could not parse degree")?;

    let connections = parts
        .map(|c| {
            c.parse::<u32>()
                .with_context(|| format!("could not parse neighbour {c:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    ensure!(
        connections.len() == degree,
        "vertex {} declares degree {} but lists {} neighbours",
        id,
        degree,
        connections.len()
    );

    Ok(Vertex {
        id,
        connections,
        position: Some((x, y)),
    })
}

use anyhow::{Context, Result};
use simple_partition::{BisectionPartitioningConfig, Graph, InitialPartitioningMethod};
use std::time;

fn main() -> Result<()> {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/graphs/grid4x4.txt".to_string());
    let graph = if path.ends_with(".graph") {
        Graph::read_metis(&path)
    } else {
        Graph::read_coordinates(&path)
    }
    .with_context(|| format!("could not load graph {path}"))?;

    let t1 = time::Instant::now();
    let solution = graph.partition_bisection(&BisectionPartitioningConfig {
        initial_partitioning: InitialPartitioningMethod::Random,
        ..Default::default()
    });
    println!("time: {}ms", t1.elapsed().as_millis());
    println!(
        "vertices: {}, max degree: {}, edge cut: {}, fm passes: {}",
        graph.len(),
        graph.max_degree(),
        graph.score_solution(&solution),
        solution.pass_count()
    );
    println!("{solution}");
    Ok(())
}

use std::time::Duration;

use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use hrsw::Stopwatch;
use human_duration::human_duration;
use indoc::indoc;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use astar::algorithms::astar::PathfindingEngine;
use astar::grid::Grid;
use astar::problem::GridProblem;
use astar::visual::NoVisuals;

const NUM_INSTANCES: u64 = 5;
/// Maximum time willing to wait for a single benchmark instance.
/// Experiments are carried out at least 5s and at least 100 times, so running a
/// 1s instance takes 1m40s.
const MAX_INSTANCE_TIME: Duration = Duration::from_secs(1);

fn astar(problem: &mut GridProblem) -> Option<u32> {
    let (start, goal) = (problem.start, problem.goal);
    let mut engine = PathfindingEngine::new(&mut problem.grid, NoVisuals);
    engine.find_path(start, goal).map(|p| p.cost())
}

/// Square grid with roughly `density` of its cells walled off.
fn scattered(side: usize, density: f64, seed: u64) -> Option<GridProblem> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut grid = Grid::new(side, side);
    let ids: Vec<_> = grid.iter().map(|(id, _)| id).collect();
    for id in ids {
        if rng.random_bool(density) {
            grid.set_walkable(id, false);
        }
    }
    let start = grid.random_walkable(&mut rng)?;
    let goal = grid.random_walkable(&mut rng)?;
    Some(GridProblem { grid, start, goal })
}

fn base_problems() -> Vec<(String, GridProblem)> {
    let maze = indoc! {"
        S.....#.........#...........
        .####.#.#######.#.#########.
        ....#...#.....#...#.......#.
        ###.#####.###.#####.#####.#.
        ..........#.......#.#...#...
        .########.#.#####.#.#.#.###.
        ........#...#.......#.#....G
    "};

    let mut problems = vec![];
    if let Ok(p) = GridProblem::try_from(maze) {
        problems.push(("maze".to_string(), p));
    }
    for (side, density) in [(64, 0.0), (256, 0.0), (256, 0.25)] {
        if let Some(p) = scattered(side, density, side as u64) {
            problems.push((format!("scattered{density}"), p));
        }
    }
    problems
}

fn sample_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("Grid Search");

    for (name, base_problem) in base_problems() {
        let (x, y) = base_problem.grid.dimensions();

        for i in 0..NUM_INSTANCES {
            let instance_name = format!("{name}[{x}x{y}]:{i}");
            let mut rng = ChaCha8Rng::seed_from_u64(i);
            let Some(mut problem) = base_problem.randomize(&mut rng) else {
                continue;
            };

            let mut stopwatch = Stopwatch::new_started();
            let cost = astar(&mut problem);
            stopwatch.stop();
            let elapsed = stopwatch.elapsed();
            println!("{instance_name}: cost {cost:?}");
            if elapsed > MAX_INSTANCE_TIME {
                log::warn!(
                    "Skipping {instance_name} as it takes too long with A* ({})",
                    human_duration(&elapsed)
                );
                continue;
            }

            group.bench_with_input(
                BenchmarkId::new("A*", &instance_name),
                &problem,
                |b, p| {
                    let mut p = p.clone();
                    b.iter(|| astar(&mut p))
                },
            );
        }
    }
    group.finish();
}

criterion_group!(benches, sample_search);
criterion_main!(benches);

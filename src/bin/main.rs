use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use anstream::println;
use clap::Parser;
use hrsw::Stopwatch;
use human_duration::human_duration;
use indoc::indoc;
use owo_colors::OwoColorize;
use rand_chacha::ChaCha8Rng;
use rand_chacha::rand_core::SeedableRng;

use astar::algorithms::astar::PathfindingEngine;
use astar::config::DEFAULT_RETRACE_LIMIT;
use astar::config::EngineConfig;
use astar::grid::CoordIntrinsic;
use astar::grid::Grid;
use astar::grid::NodeId;
use astar::path::GridPath;
use astar::problem::GridProblem;
use astar::problem::GridProblemParseError;
use astar::visual::RecordingSink;
use astar::visual::VisualEvent;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

const MAX_RENDERED: CoordIntrinsic = 60;

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(long_version = astar::build::CLAP_LONG_VERSION)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Grids to solve, as text (`S`, `G`, `.`, `#`) or PNG images.
    #[arg()]
    pub problems: Vec<PathBuf>,

    /// Replay each search one expansion at a time.
    #[arg(long)]
    pub step: bool,
    /// Pause between expansions when stepping.
    #[arg(long, env = "ASTAR_DELAY_MS", default_value_t = 0u64)]
    pub delay_ms: u64,

    #[arg(long, env = "ASTAR_RETRACE_LIMIT", default_value_t = DEFAULT_RETRACE_LIMIT)]
    pub retrace_limit: usize,

    /// Random start/goal pairs to solve on each grid.
    #[arg(long, default_value_t = 0u64)]
    pub num_instances: u64,

    #[command(flatten)]
    color: colorchoice_clap::Color,
}

fn load(p: &Path) -> Result<GridProblem, GridProblemParseError> {
    if p.extension().is_some_and(|e| e.eq_ignore_ascii_case("png")) {
        return GridProblem::try_from(p);
    }
    let text = std::fs::read_to_string(p).map_err(|e| GridProblemParseError::IOError {
        p: p.to_path_buf(),
        e,
    })?;
    GridProblem::try_from(text.as_str())
}

fn render(grid: &Grid, start: NodeId, goal: NodeId, path: Option<&GridPath>) {
    let (w, h) = grid.dimensions();
    let on_path = |id: NodeId| path.is_some_and(|p| p.nodes().contains(&id));

    for y in 0..(h as CoordIntrinsic).min(MAX_RENDERED) {
        let mut line = String::new();
        for x in 0..(w as CoordIntrinsic).min(MAX_RENDERED) {
            let Some(id) = grid.node_id(x, y) else {
                continue;
            };
            let ch = if id == start {
                'S'
            } else if id == goal {
                'G'
            } else if on_path(id) {
                '*'
            } else if grid.node(id).walkable() {
                '░'
            } else {
                '█'
            };
            line.push(ch);
        }
        println!("  {line}");
    }
}

/// Drives a stepped search, printing every transition the engine reports.
fn replay(
    engine: &mut PathfindingEngine<'_, RecordingSink>,
    start: NodeId,
    goal: NodeId,
    delay: Duration,
) -> Option<GridPath> {
    let mut stepper = engine.find_path_step(start, goal, delay);
    loop {
        let status = stepper.step();
        for event in stepper.sink_mut().drain() {
            match event {
                VisualEvent::Opened(c, _) => println!("  {} {c}", "+".green()),
                VisualEvent::Closed(c, _) => println!("  {} {c}", "-".blue()),
            }
        }
        if status.is_terminal() {
            println!("  {}", status.bold());
            break;
        }
        if !stepper.delay().is_zero() {
            std::thread::sleep(stepper.delay());
        }
    }
    stepper.path()
}

fn solve(name: &str, problem: &GridProblem, args: &Args) {
    println!("{} {}", "**".bold(), name.bold());
    println!("{problem}");

    let mut grid = problem.grid.clone();
    let config = EngineConfig::default().with_retrace_limit(args.retrace_limit);
    let mut engine = PathfindingEngine::with_config(&mut grid, RecordingSink::new(), config);

    let mut stopwatch = Stopwatch::new_started();
    let path = if args.step {
        replay(
            &mut engine,
            problem.start,
            problem.goal,
            Duration::from_millis(args.delay_ms),
        )
    } else {
        engine.find_path(problem.start, problem.goal)
    };
    stopwatch.stop();

    match &path {
        Some(p) => println!("{} {p}", "Found".green()),
        None => println!("{}", "No path".red()),
    }
    println!(
        "  {} in {}",
        engine.stats(),
        human_duration(&stopwatch.elapsed())
    );
    render(engine.grid(), problem.start, problem.goal, path.as_ref());
}

fn main() -> std::io::Result<()> {
    let args = Args::parse();
    args.color.write_global();

    let mut problems = vec![];
    if args.problems.is_empty() {
        let demo = indoc! {"
            S.....#...
            .####.#.#.
            ....#...#.
            ###.#####.
            ..........
            .#######..
            ........#G
        "};
        match GridProblem::try_from(demo) {
            Ok(p) => problems.push(("demo".to_string(), p)),
            Err(e) => println!("{} {e}", "Invalid demo grid:".red()),
        }
    }
    for p in &args.problems {
        match load(p) {
            Ok(problem) => problems.push((p.display().to_string(), problem)),
            Err(e) => println!("{} {e}", "Skipping".yellow()),
        }
    }

    for (name, problem) in &problems {
        solve(name, problem, &args);

        for instance in 0..args.num_instances {
            let mut rng = ChaCha8Rng::seed_from_u64(instance);
            match problem.randomize(&mut rng) {
                Some(random_problem) => {
                    solve(&format!("{name}:{instance}"), &random_problem, &args);
                }
                None => println!(
                    "{} to generate random problem with seed {instance} on {name}",
                    "Failed".yellow()
                ),
            }
        }
    }

    Ok(())
}

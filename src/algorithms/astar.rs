use std::fmt::Debug;
use std::time::Duration;

use derive_more::Display;

use crate::config::EngineConfig;
use crate::cost::GridCost;
use crate::cost::octile_distance;
use crate::data_structures::indexed_heap::IndexedHeap;
use crate::grid::Grid;
use crate::grid::Node;
use crate::grid::NodeId;
use crate::path::GridPath;
use crate::visual::VisualSink;

/// The ranking tuple for A*
///
/// We prefer better f-values, and tie break for lower h, which prefers nodes
/// closer to the goal.
///
/// ```
/// use astar::algorithms::astar::AStarRank;
///
/// assert!(AStarRank::new(20, 0) < AStarRank::new(0, 20));
/// assert!(AStarRank::new(10, 10) < AStarRank::new(10, 11));
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct AStarRank {
    f: GridCost,
    h: GridCost,
}

impl AStarRank {
    pub fn new(g: GridCost, h: GridCost) -> Self {
        Self {
            f: g.saturating_add(h),
            h,
        }
    }
    pub fn f(&self) -> GridCost {
        self.f
    }
    pub fn h(&self) -> GridCost {
        self.h
    }
}

/// Outcome of a single expansion.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum StepStatus {
    /// A node was expanded and the search can go on.
    #[display("continue")]
    Continue,
    /// The goal was reached. Its path can be retraced.
    #[display("found")]
    Found,
    /// The open set ran out before reaching the goal.
    #[display("exhausted")]
    Exhausted,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        *self != StepStatus::Continue
    }
}

/// Counters of the latest search.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes moved to the closed set.
    pub expanded: usize,
    /// Nodes added to the open set, start included.
    pub opened: usize,
    /// Nodes seen by a successful search (closed, goal and still open).
    pub visited: usize,
}

impl std::fmt::Display for SearchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        use thousands::Separable;

        write!(
            f,
            "{} expanded, {} opened, {} visited",
            self.expanded.separate_with_commas(),
            self.opened.separate_with_commas(),
            self.visited.separate_with_commas()
        )
    }
}

/// What a search in progress needs to carry between expansions.
#[derive(Copy, Clone, Debug)]
struct SearchState {
    start: NodeId,
    end: NodeId,
    /// Generation the grid scratch is stamped with.
    stamp: u32,
}

/// A* over a [`Grid`].
///
/// The engine borrows the grid mutably and writes the search data into its
/// nodes, so only one search can run over a grid at a time.
///
/// ```
/// use astar::algorithms::astar::PathfindingEngine;
/// use astar::grid::Grid;
/// use astar::visual::NoVisuals;
///
/// let mut grid = Grid::new(5, 5);
/// let start = grid.node_id(0, 0).unwrap();
/// let end = grid.node_id(4, 4).unwrap();
///
/// let mut engine = PathfindingEngine::new(&mut grid, NoVisuals);
/// let path = engine.find_path(start, end).unwrap();
/// assert_eq!(path.cost(), 56);
/// assert_eq!(path.goal(), Some(end));
/// assert_eq!(path.start(), Some(start));
/// ```
pub struct PathfindingEngine<'g, V>
where
    V: VisualSink,
{
    grid: &'g mut Grid,
    sink: V,

    /// The open set, ranked by `(f, h)`.
    ///
    /// The closed set lives in the grid's scratch data.
    open: IndexedHeap<AStarRank>,

    config: EngineConfig,
    stats: SearchStats,
}

impl<'g, V> PathfindingEngine<'g, V>
where
    V: VisualSink,
{
    #[must_use]
    pub fn new(grid: &'g mut Grid, sink: V) -> Self {
        Self::with_config(grid, sink, EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(grid: &'g mut Grid, sink: V, config: EngineConfig) -> Self {
        // No search can have more open nodes than cells.
        let open = IndexedHeap::with_capacity(grid.len());
        Self {
            grid,
            sink,
            open,
            config,
            stats: SearchStats::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &*self.grid
    }
    pub fn sink(&self) -> &V {
        &self.sink
    }
    pub fn sink_mut(&mut self) -> &mut V {
        &mut self.sink
    }
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Finds a cheapest path from `start` to `end`.
    ///
    /// Both must be nodes of this engine's grid. The path is listed goal
    /// first. Returns `None` when `end` can't be reached.
    #[must_use]
    pub fn find_path(&mut self, start: NodeId, end: NodeId) -> Option<GridPath> {
        let search = self.begin(start, end);

        loop {
            match self.expand(&search, None) {
                StepStatus::Continue => {}
                StepStatus::Found => return self.retrace(start, end),
                StepStatus::Exhausted => return None,
            }
        }
    }

    /// Starts a search that advances one expansion per
    /// [`AStarStepper::step`], reporting to the sink as it goes.
    ///
    /// `delay` is only handed back to the caller to pace the steps. A non-zero
    /// delay asks the sink to animate.
    pub fn find_path_step(
        &mut self,
        start: NodeId,
        end: NodeId,
        delay: Duration,
    ) -> AStarStepper<'_, 'g, V> {
        let search = self.begin(start, end);
        AStarStepper {
            engine: self,
            search,
            delay,
            status: StepStatus::Continue,
            terminal_reported: false,
        }
    }

    /// Rebuilds the path to `end` from the parent links of the latest search.
    ///
    /// Returns `None`, with a warning, when the links don't lead back to
    /// `start` within [`EngineConfig::retrace_limit`] nodes.
    #[must_use]
    pub fn retrace(&self, start: NodeId, end: NodeId) -> Option<GridPath> {
        let stamp = self.grid.generation();
        let mut path = GridPath::new_from_goal(end, self.grid.coord(end));

        let mut current = end;
        while current != start {
            if path.len() > self.config.retrace_limit {
                log::warn!(
                    "Path was over {} nodes (possible loop), giving up",
                    self.config.retrace_limit
                );
                return None;
            }

            let Some(parent) = self.grid.scratch(current, stamp).parent else {
                log::warn!(
                    "Parent chain from {} broke at {} before reaching {}",
                    self.grid.coord(end),
                    self.grid.coord(current),
                    self.grid.coord(start)
                );
                return None;
            };
            let c = octile_distance(self.grid.coord(current), self.grid.coord(parent));
            path.append(parent, self.grid.coord(parent), c);
            current = parent;
        }

        Some(path)
    }

    /// Resets the open set and seeds it with `start`.
    fn begin(&mut self, start: NodeId, end: NodeId) -> SearchState {
        self.open.clear();
        self.stats = SearchStats::default();

        let stamp = self.grid.begin_search();
        let h = octile_distance(self.grid.coord(start), self.grid.coord(end));
        let s = self.grid.scratch_mut(start, stamp);
        s.g = 0;
        s.h = h;
        s.parent = None;

        self.open.push(start, AStarRank::new(0, h));
        self.stats.opened = 1;

        SearchState { start, end, stamp }
    }

    /// Pops the best open node and relaxes its neighbours.
    ///
    /// With `visual` set, transitions are reported to the sink, animated or
    /// not.
    fn expand(&mut self, search: &SearchState, visual: Option<bool>) -> StepStatus {
        let Some(current) = self.open.pop() else {
            log::debug!(
                "No path from {} to {} ({})",
                self.grid.coord(search.start),
                self.grid.coord(search.end),
                self.stats
            );
            return StepStatus::Exhausted;
        };

        if current == search.end {
            self.stats.visited = self.stats.expanded + 1 + self.open.len();
            log::debug!("{} nodes visited", self.stats.visited);
            self.open.clear();
            return StepStatus::Found;
        }

        let g = {
            let s = self.grid.scratch_mut(current, search.stamp);
            debug_assert!(!s.closed, "{current} was expanded twice");
            s.closed = true;
            s.g
        };
        self.stats.expanded += 1;
        if let Some(animate) = visual {
            if current != search.start {
                self.sink.notify_closed(self.grid.node(current), animate);
            }
        }

        let from = self.grid.coord(current);
        let to_goal = self.grid.coord(search.end);
        for n in self.grid.neighbours(current) {
            let node: &Node = self.grid.node(n);
            if !node.walkable() {
                continue;
            }
            let scratch = self.grid.scratch(n, search.stamp);
            if scratch.closed {
                continue;
            }

            let to = node.coord();
            let new_g = g.saturating_add(octile_distance(from, to));
            let is_open = self.open.contains(n);
            if is_open && new_g >= scratch.g {
                continue;
            }

            // Found a (better) path to `n`.
            let h = octile_distance(to, to_goal);
            let s = self.grid.scratch_mut(n, search.stamp);
            s.g = new_g;
            s.h = h;
            s.parent = Some(current);

            let rank = AStarRank::new(new_g, h);
            if is_open {
                self.open.decrease_key(n, rank);
            } else {
                self.open.push(n, rank);
                self.stats.opened += 1;
            }

            if let Some(animate) = visual {
                if n != search.start && n != search.end {
                    self.sink.notify_opened(self.grid.node(n), animate);
                }
            }
        }

        StepStatus::Continue
    }

    pub fn write_memory_stats<W: std::io::Write>(&self, mut out: W) -> std::io::Result<()> {
        use size::Size;
        use thousands::Separable;

        writeln!(out, "PathfindingEngine Stats:")?;
        let s = size_of::<Node>();
        let l = self.grid.len();
        writeln!(
            out,
            "  - |Grid|:   {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;

        let s = size_of::<(AStarRank, NodeId)>();
        let l = self.open.len();
        let c = self.open.capacity();
        writeln!(
            out,
            "  - |Open|:   {} ({})",
            l.separate_with_commas(),
            Size::from_bytes(l * s)
        )?;
        writeln!(
            out,
            "  - |Open|*:  {} ({})",
            c.separate_with_commas(),
            Size::from_bytes(c * s)
        )?;
        writeln!(out, "  - Last search: {}", self.stats)?;

        Ok(())
    }
}

impl<V> Debug for PathfindingEngine<'_, V>
where
    V: VisualSink,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PathfindingEngine")
            .field("grid", &self.grid)
            .field("open", &self.open.len())
            .field("config", &self.config)
            .field("stats", &self.stats)
            .finish()
    }
}

/// A search paused between expansions.
///
/// The caller drives it, pacing calls to [`AStarStepper::step`] by
/// [`AStarStepper::delay`] however it likes. Dropping it abandons the search.
pub struct AStarStepper<'e, 'g, V>
where
    V: VisualSink,
{
    engine: &'e mut PathfindingEngine<'g, V>,
    search: SearchState,
    delay: Duration,
    status: StepStatus,
    terminal_reported: bool,
}

impl<V> AStarStepper<'_, '_, V>
where
    V: VisualSink,
{
    /// Expands one node.
    ///
    /// Once the search is over this keeps returning the final status without
    /// doing any work.
    pub fn step(&mut self) -> StepStatus {
        if self.status.is_terminal() {
            return self.status;
        }
        let animate = !self.delay.is_zero();
        self.status = self.engine.expand(&self.search, Some(animate));
        self.status
    }

    /// How long the caller should wait between steps.
    pub fn delay(&self) -> Duration {
        self.delay
    }
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
    pub fn stats(&self) -> SearchStats {
        self.engine.stats
    }
    pub fn grid(&self) -> &Grid {
        &*self.engine.grid
    }
    pub fn sink(&self) -> &V {
        &self.engine.sink
    }
    pub fn sink_mut(&mut self) -> &mut V {
        &mut self.engine.sink
    }

    /// Retraces the path once the goal was found.
    #[must_use]
    pub fn path(&self) -> Option<GridPath> {
        if self.status != StepStatus::Found {
            return None;
        }
        self.engine.retrace(self.search.start, self.search.end)
    }
}

impl<V> Iterator for AStarStepper<'_, '_, V>
where
    V: VisualSink,
{
    type Item = StepStatus;

    /// Steps, yielding the final status once before stopping.
    fn next(&mut self) -> Option<Self::Item> {
        if self.terminal_reported {
            return None;
        }
        let status = self.step();
        self.terminal_reported = status.is_terminal();
        Some(status)
    }
}

impl<V> Debug for AStarStepper<'_, '_, V>
where
    V: VisualSink,
{
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("AStarStepper")
            .field("search", &self.search)
            .field("delay", &self.delay)
            .field("status", &self.status)
            .finish()
    }
}

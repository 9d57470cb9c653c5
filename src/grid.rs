use derive_more::Display;
use nonmax::NonMaxU32;
use smallvec::SmallVec;

use crate::cost::GridCost;

const MAX_ELEMENTS_DISPLAYED: usize = 20;
const RANDOM_NODE_MAX_TRIES: usize = 10_000;

pub type CoordIntrinsic = u32;

/// Cell coordinates within a [`Grid`].
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("({x},{y})")]
pub struct Coord {
    pub x: CoordIntrinsic,
    pub y: CoordIntrinsic,
}

impl Coord {
    #[inline(always)]
    pub const fn new(x: CoordIntrinsic, y: CoordIntrinsic) -> Self {
        Self { x, y }
    }
}

/// A non-owning reference to a [`Node`] of a [`Grid`].
///
/// Dense, row-major. `Option<NodeId>` has the same size as `NodeId`.
#[derive(Copy, Clone, Debug, Display, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[display("#{_0}")]
pub struct NodeId(NonMaxU32);

impl NodeId {
    #[inline(always)]
    pub(crate) fn from_usize(i: usize) -> Self {
        debug_assert!(i < CoordIntrinsic::MAX as usize);
        // SAFETY: Grids never hold `u32::MAX` cells, see `Grid::safe_dimensions`.
        Self(unsafe { NonMaxU32::new_unchecked(i as u32) })
    }
    #[inline(always)]
    pub fn as_usize(&self) -> usize {
        self.0.get() as usize
    }
}

/// Per-search data of a [`Node`].
///
/// Only meaningful when `stamp` matches the generation of the running search.
/// Anything else is leftover from an older search and reads as fresh.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) struct Scratch {
    pub(crate) stamp: u32,
    pub(crate) g: GridCost,
    pub(crate) h: GridCost,
    pub(crate) parent: Option<NodeId>,
    pub(crate) closed: bool,
}

impl Scratch {
    #[inline(always)]
    pub(crate) fn fresh(stamp: u32) -> Self {
        Self {
            stamp,
            g: GridCost::MAX,
            h: 0,
            parent: None,
            closed: false,
        }
    }
}

/// One grid cell.
#[derive(Clone, Debug)]
pub struct Node {
    coord: Coord,
    walkable: bool,
    pub(crate) scratch: Scratch,
}

impl Node {
    fn new(coord: Coord) -> Self {
        Self {
            coord,
            walkable: true,
            scratch: Scratch::fresh(0),
        }
    }

    #[inline(always)]
    pub fn coord(&self) -> Coord {
        self.coord
    }
    #[inline(always)]
    pub fn walkable(&self) -> bool {
        self.walkable
    }
}

/// A fixed `width × height` array of [`Node`]s.
///
/// Owns both the static cell data and the scratch data searches write into.
#[derive(Clone)]
pub struct Grid {
    width: CoordIntrinsic,
    height: CoordIntrinsic,
    nodes: Vec<Node>,
    /// Generation of the latest search. Scratch with another stamp is stale.
    generation: u32,
}

impl Grid {
    /// Creates a grid where every cell is walkable.
    ///
    /// # Panics
    ///
    /// If `width * height` doesn't fit the dense node ids.
    pub fn new(width: usize, height: usize) -> Self {
        assert!(
            Self::safe_dimensions(width, height),
            "Grid {width}x{height} is too large"
        );

        let mut nodes = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                nodes.push(Node::new(Coord::new(
                    x as CoordIntrinsic,
                    y as CoordIntrinsic,
                )));
            }
        }

        Self {
            width: width as CoordIntrinsic,
            height: height as CoordIntrinsic,
            nodes,
            generation: 0,
        }
    }

    pub(crate) fn safe_dimensions(width: usize, height: usize) -> bool {
        width
            .checked_mul(height)
            .is_some_and(|cells| cells < CoordIntrinsic::MAX as usize)
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.width as usize, self.height as usize)
    }
    pub fn width(&self) -> usize {
        self.width as usize
    }
    pub fn height(&self) -> usize {
        self.height as usize
    }
    /// Number of cells.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[inline(always)]
    pub fn contains(&self, x: CoordIntrinsic, y: CoordIntrinsic) -> bool {
        x < self.width && y < self.height
    }

    /// Finds the id of the cell at `(x, y)`, if it's within the grid.
    #[inline(always)]
    pub fn node_id(&self, x: CoordIntrinsic, y: CoordIntrinsic) -> Option<NodeId> {
        self.contains(x, y)
            .then(|| NodeId::from_usize(y as usize * self.width as usize + x as usize))
    }

    #[inline(always)]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.as_usize()]
    }

    pub fn node_at(&self, x: CoordIntrinsic, y: CoordIntrinsic) -> Option<&Node> {
        self.node_id(x, y).map(|id| self.node(id))
    }

    #[inline(always)]
    pub fn coord(&self, id: NodeId) -> Coord {
        self.node(id).coord
    }

    pub fn set_walkable(&mut self, id: NodeId, walkable: bool) {
        self.nodes[id.as_usize()].walkable = walkable;
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::from_usize(i), n))
    }

    /// The in-bounds cells around `id`, walkable or not.
    ///
    /// Columns go left to right, and within a column rows go from lower to
    /// higher `y`.
    pub fn neighbours(&self, id: NodeId) -> SmallVec<[NodeId; 8]> {
        let mut v = SmallVec::<[NodeId; 8]>::new();
        let Coord { x, y } = self.coord(id);

        let prev = CoordIntrinsic::MAX;
        let same = 0 as CoordIntrinsic;
        let next = 1 as CoordIntrinsic;

        for dx in [prev, same, next] {
            for dy in [prev, same, next] {
                if dx == same && dy == same {
                    continue;
                }
                // Wrapping below zero lands out of bounds.
                if let Some(n) = self.node_id(x.wrapping_add(dx), y.wrapping_add(dy)) {
                    v.push(n);
                }
            }
        }
        v
    }

    /// Picks a random walkable cell.
    pub fn random_walkable<R: rand::Rng>(&self, r: &mut R) -> Option<NodeId> {
        if self.is_empty() {
            return None;
        }
        for _tries in 0..RANDOM_NODE_MAX_TRIES {
            let x = r.random_range(0..self.width);
            let y = r.random_range(0..self.height);
            let id = self.node_id(x, y)?;
            if self.node(id).walkable {
                return Some(id);
            }
        }
        None
    }

    // Scratch handling
    // ----------------

    /// Starts a new search generation, invalidating every node's scratch.
    pub(crate) fn begin_search(&mut self) -> u32 {
        self.generation = self.generation.wrapping_add(1);
        if self.generation == 0 {
            // Stamps from before the wrap would look current again.
            for n in &mut self.nodes {
                n.scratch = Scratch::fresh(0);
            }
            self.generation = 1;
        }
        self.generation
    }

    #[inline(always)]
    pub(crate) fn generation(&self) -> u32 {
        self.generation
    }

    /// Best known cost from the start in the latest search.
    ///
    /// `GridCost::MAX` for nodes that search never reached.
    pub fn g_cost(&self, id: NodeId) -> GridCost {
        self.scratch(id, self.generation).g
    }
    /// Heuristic estimate to the goal, as computed by the latest search.
    pub fn h_cost(&self, id: NodeId) -> GridCost {
        self.scratch(id, self.generation).h
    }
    /// `g_cost + h_cost`. Always derived, never stored.
    pub fn f_cost(&self, id: NodeId) -> GridCost {
        let s = self.scratch(id, self.generation);
        s.g.saturating_add(s.h)
    }
    /// Predecessor of `id` on the best path the latest search knows of.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.scratch(id, self.generation).parent
    }

    /// Scratch of `id` as seen by the search with `stamp`.
    #[inline(always)]
    pub(crate) fn scratch(&self, id: NodeId, stamp: u32) -> Scratch {
        let s = self.nodes[id.as_usize()].scratch;
        if s.stamp == stamp {
            s
        } else {
            Scratch::fresh(stamp)
        }
    }

    /// Mutable scratch of `id`, reset first if it's stale.
    #[inline(always)]
    pub(crate) fn scratch_mut(&mut self, id: NodeId, stamp: u32) -> &mut Scratch {
        let s = &mut self.nodes[id.as_usize()].scratch;
        if s.stamp != stamp {
            *s = Scratch::fresh(stamp);
        }
        s
    }
}

impl std::fmt::Display for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (w, h) = self.dimensions();
        writeln!(f, "Grid({w}x{h}):")?;
        for row in self.nodes.chunks(w.max(1)).take(MAX_ELEMENTS_DISPLAYED) {
            for node in row.iter().take(MAX_ELEMENTS_DISPLAYED) {
                if node.walkable {
                    write!(f, "░")?;
                } else {
                    write!(f, "█")?;
                }
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for Grid {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Grid{:?}", self.dimensions())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(grid: &Grid, ids: &[NodeId]) -> Vec<(u32, u32)> {
        ids.iter()
            .map(|id| {
                let c = grid.coord(*id);
                (c.x, c.y)
            })
            .collect()
    }

    #[test]
    fn ids_are_row_major() {
        let grid = Grid::new(4, 3);
        assert_eq!(grid.len(), 12);
        assert_eq!(grid.node_id(0, 0).unwrap().as_usize(), 0);
        assert_eq!(grid.node_id(3, 0).unwrap().as_usize(), 3);
        assert_eq!(grid.node_id(1, 2).unwrap().as_usize(), 9);
        assert_eq!(grid.node_id(4, 0), None);
        assert_eq!(grid.node_id(0, 3), None);
        assert_eq!(grid.coord(grid.node_id(2, 1).unwrap()), Coord::new(2, 1));
    }

    #[test]
    fn neighbours_in_the_middle() {
        let grid = Grid::new(3, 3);
        let center = grid.node_id(1, 1).unwrap();
        assert_eq!(
            coords(&grid, &grid.neighbours(center)),
            vec![
                (0, 0),
                (0, 1),
                (0, 2),
                (1, 0),
                (1, 2),
                (2, 0),
                (2, 1),
                (2, 2)
            ]
        );
    }

    #[test]
    fn neighbours_clip_at_the_borders() {
        let grid = Grid::new(3, 2);
        let corner = grid.node_id(0, 0).unwrap();
        assert_eq!(
            coords(&grid, &grid.neighbours(corner)),
            vec![(0, 1), (1, 0), (1, 1)]
        );

        let edge = grid.node_id(2, 1).unwrap();
        assert_eq!(
            coords(&grid, &grid.neighbours(edge)),
            vec![(1, 0), (1, 1), (2, 0)]
        );
    }

    #[test]
    fn neighbours_include_walls() {
        let mut grid = Grid::new(2, 1);
        let wall = grid.node_id(1, 0).unwrap();
        grid.set_walkable(wall, false);
        assert_eq!(grid.neighbours(grid.node_id(0, 0).unwrap()).len(), 1);
        assert!(!grid.node(wall).walkable());
    }

    #[test]
    fn stale_scratch_reads_fresh() {
        let mut grid = Grid::new(2, 2);
        let id = grid.node_id(1, 1).unwrap();

        let first = grid.begin_search();
        {
            let s = grid.scratch_mut(id, first);
            s.g = 3;
            s.closed = true;
        }
        assert_eq!(grid.scratch(id, first).g, 3);

        let second = grid.begin_search();
        assert_ne!(first, second);
        assert_eq!(grid.scratch(id, second), Scratch::fresh(second));
        // Untouched by the new search, so the raw values are still there.
        assert_eq!(grid.node(id).scratch.g, 3);
        assert_eq!(grid.g_cost(id), GridCost::MAX);

        assert!(!grid.scratch_mut(id, second).closed);
        assert_eq!(grid.node(id).scratch.g, GridCost::MAX);
    }

    #[test]
    fn public_costs_ignore_older_searches() {
        let mut grid = Grid::new(3, 1);
        let (a, b) = (grid.node_id(0, 0).unwrap(), grid.node_id(1, 0).unwrap());

        let first = grid.begin_search();
        {
            let s = grid.scratch_mut(b, first);
            s.g = 10;
            s.h = 10;
            s.parent = Some(a);
        }
        assert_eq!(grid.g_cost(b), 10);
        assert_eq!(grid.h_cost(b), 10);
        assert_eq!(grid.f_cost(b), 20);
        assert_eq!(grid.parent(b), Some(a));

        // A new search that never touches `b` doesn't see the old link.
        grid.begin_search();
        assert_eq!(grid.parent(b), None);
        assert_eq!(grid.g_cost(b), GridCost::MAX);
        assert_eq!(grid.h_cost(b), 0);
        assert_eq!(grid.f_cost(b), GridCost::MAX);
    }

    #[test]
    fn generation_wraps_cleanly() {
        let mut grid = Grid::new(1, 1);
        let id = grid.node_id(0, 0).unwrap();
        grid.generation = u32::MAX;
        grid.scratch_mut(id, u32::MAX).closed = true;

        let stamp = grid.begin_search();
        assert_eq!(stamp, 1);
        assert!(!grid.scratch(id, stamp).closed);
    }

    #[test]
    fn random_walkable_avoids_walls() {
        use rand_chacha::ChaCha8Rng;
        use rand_chacha::rand_core::SeedableRng;

        let mut grid = Grid::new(4, 4);
        for (x, y) in [(0, 0), (1, 1), (2, 2), (3, 3), (0, 3)] {
            let id = grid.node_id(x, y).unwrap();
            grid.set_walkable(id, false);
        }
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let id = grid.random_walkable(&mut rng).unwrap();
            assert!(grid.node(id).walkable());
        }
    }

    #[test]
    fn display_draws_walls() {
        let mut grid = Grid::new(3, 1);
        grid.set_walkable(grid.node_id(1, 0).unwrap(), false);
        assert_eq!(grid.to_string(), "Grid(3x1):\n░█░\n");
        assert_eq!(format!("{grid:?}"), "Grid(3, 1)");
    }
}

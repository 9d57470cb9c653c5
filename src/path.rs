use crate::cost::GridCost;
use crate::grid::Coord;
use crate::grid::NodeId;

const MAX_ELEMENTS_DISPLAYED: usize = 20;

/// A path found by a search, as retraced from the goal.
///
/// Nodes go **goal first, start last**. Use [`GridPath::into_start_to_goal`]
/// to walk it forwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GridPath {
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) coords: Vec<Coord>,
    pub(crate) cost: GridCost,
}

impl GridPath {
    #[inline(always)]
    pub(crate) fn new_from_goal(goal: NodeId, coord: Coord) -> Self {
        Self {
            nodes: vec![goal],
            coords: vec![coord],
            cost: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn append(&mut self, id: NodeId, coord: Coord, c: GridCost) {
        self.nodes.push(id);
        self.coords.push(coord);
        self.cost = self.cost.saturating_add(c);
    }

    /// Number of nodes, both ends included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
    /// Sum of the step costs along the path.
    pub fn cost(&self) -> GridCost {
        self.cost
    }

    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }
    pub fn coords(&self) -> &[Coord] {
        &self.coords
    }

    /// The node the path was retraced from.
    pub fn goal(&self) -> Option<NodeId> {
        self.nodes.first().copied()
    }
    pub fn start(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }

    /// Reverses the path so it goes from the start to the goal.
    pub fn into_start_to_goal(mut self) -> Vec<Coord> {
        self.coords.reverse();
        self.coords
    }
}

impl std::fmt::Display for GridPath {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match (self.coords.first(), self.coords.last()) {
            (Some(goal), Some(start)) => {
                write!(f, "Path({}, {goal}", self.cost)?;
                let inner = self.len().saturating_sub(2);
                for c in self.coords[1..].iter().take(inner.min(MAX_ELEMENTS_DISPLAYED)) {
                    write!(f, "<-{c}")?;
                }
                if inner > MAX_ELEMENTS_DISPLAYED {
                    write!(f, "<-...")?;
                }
                if self.len() > 1 {
                    write!(f, "<-{start}")?;
                }
                write!(f, ")")
            }
            _ => write!(f, "Path()"),
        }
    }
}

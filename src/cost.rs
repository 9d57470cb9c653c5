//! Integer step costs for 8-connected grids.
//!
//! Costs are scaled by 10 so diagonals (`10·√2 ≈ 14`) stay integral.

pub type GridCost = u32;

pub const ORTHOGONAL_COST: GridCost = 10u32;
pub const DIAGONAL_COST: GridCost = 14u32; // 14.142135623730951

/// Octile distance between two cells.
///
/// This is both the step cost between adjacent cells and the A* heuristic.
/// It's admissible and consistent under the orthogonal/diagonal step model.
///
/// ```
/// use astar::cost::octile_distance;
/// use astar::grid::Coord;
///
/// let a = Coord::new(0, 0);
/// assert_eq!(octile_distance(a, Coord::new(1, 0)), 10);
/// assert_eq!(octile_distance(a, Coord::new(1, 1)), 14);
/// assert_eq!(octile_distance(a, Coord::new(4, 4)), 56);
/// assert_eq!(octile_distance(a, Coord::new(3, 1)), 34);
/// assert_eq!(octile_distance(Coord::new(3, 1), a), 34);
/// ```
#[inline(always)]
#[must_use]
pub fn octile_distance(a: crate::grid::Coord, b: crate::grid::Coord) -> GridCost {
    let delta_x = a.x.abs_diff(b.x);
    let delta_y = a.y.abs_diff(b.y);

    let (delta_min, delta_max) = if delta_x > delta_y {
        (delta_y, delta_x)
    } else {
        (delta_x, delta_y)
    };

    let diagonal_cost = delta_min.saturating_mul(DIAGONAL_COST);
    let orthogonal_cost = (delta_max - delta_min).saturating_mul(ORTHOGONAL_COST);
    diagonal_cost.saturating_add(orthogonal_cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Coord;

    #[test]
    fn symmetric() {
        for (x, y) in [(0, 0), (1, 5), (7, 2), (3, 3)] {
            let a = Coord::new(2, 4);
            let b = Coord::new(x, y);
            assert_eq!(octile_distance(a, b), octile_distance(b, a));
        }
    }

    #[test]
    fn triangle_inequality_on_steps() {
        // Consistency: h(a) <= c(a, b) + h(b) for every neighbour b of a.
        let goal = Coord::new(9, 4);
        for x in 1..8u32 {
            for y in 1..8u32 {
                let a = Coord::new(x, y);
                for (nx, ny) in [
                    (x - 1, y - 1),
                    (x - 1, y),
                    (x - 1, y + 1),
                    (x, y - 1),
                    (x, y + 1),
                    (x + 1, y - 1),
                    (x + 1, y),
                    (x + 1, y + 1),
                ] {
                    let b = Coord::new(nx, ny);
                    assert!(
                        octile_distance(a, goal)
                            <= octile_distance(a, b) + octile_distance(b, goal)
                    );
                }
            }
        }
    }

    #[test]
    fn zero_on_self() {
        let a = Coord::new(3, 8);
        assert_eq!(octile_distance(a, a), 0);
    }
}

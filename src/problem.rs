//! Loading grids and start/goal pairs from text and images.

use derive_more::Display;
use thiserror::Error;

use crate::grid::CoordIntrinsic;
use crate::grid::Grid;
use crate::grid::NodeId;

const MAX_ELEMENTS_DISPLAYED: usize = 20;
const RANDOM_NODE_MAX_TRIES: usize = 10_000;

// Simple colours
const WHITE: [u8; 3] = [u8::MAX, u8::MAX, u8::MAX];
const BLACK: [u8; 3] = [u8::MIN, u8::MIN, u8::MIN];
const GREEN: [u8; 3] = [u8::MIN, u8::MAX, u8::MIN];
const BLUE: [u8; 3] = [u8::MIN, u8::MIN, u8::MAX];

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum GridCell {
    #[display("░")]
    Empty,
    #[display("█")]
    Wall,
}

#[derive(Debug, Error)]
pub enum GridCellParseError {
    #[error("Invalid character '{0}' found.")]
    InvalidCharacter(char),
}

impl std::convert::TryFrom<char> for GridCell {
    type Error = GridCellParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            ' ' | '.' => Ok(GridCell::Empty),
            '#' | '█' => Ok(GridCell::Wall),
            ch => Err(GridCellParseError::InvalidCharacter(ch)),
        }
    }
}

#[derive(Copy, Clone, Debug, Display, PartialEq, Eq)]
pub enum GridProblemCell {
    Cell(GridCell),
    #[display("S")]
    Start,
    #[display("G")]
    Goal,
}

impl std::convert::TryFrom<char> for GridProblemCell {
    type Error = GridCellParseError;

    fn try_from(ch: char) -> Result<Self, Self::Error> {
        match ch {
            'S' => Ok(GridProblemCell::Start),
            'G' => Ok(GridProblemCell::Goal),
            ch => Ok(GridProblemCell::Cell(GridCell::try_from(ch)?)),
        }
    }
}

#[derive(Debug, Error)]
pub enum GridProblemParseError {
    #[error("Empty input")]
    EmptyInput,
    #[error("Grid {width}x{height} is too large")]
    TooLarge { width: usize, height: usize },
    #[error("Row {y} has {len} cells, expected {width}")]
    RaggedRow { y: usize, len: usize, width: usize },
    #[error("Invalid cell {e} found at ({x},{y})")]
    InvalidCell {
        e: GridCellParseError,
        x: usize,
        y: usize,
    },
    #[error("No start cell")]
    MissingStart,
    #[error("No goal cell")]
    MissingGoal,
    #[error("Second start cell found at ({x},{y})")]
    DuplicateStart { x: usize, y: usize },
    #[error("Second goal cell found at ({x},{y})")]
    DuplicateGoal { x: usize, y: usize },
    #[error("I/O error when loading '{p}': {e}")]
    IOError {
        p: std::path::PathBuf,
        e: std::io::Error,
    },
    #[error("Image error when loading '{p}': {e}")]
    ImageError {
        p: std::path::PathBuf,
        e: image::ImageError,
    },
}

/// A grid plus the start and goal of a search over it.
#[derive(Clone, Debug)]
pub struct GridProblem {
    pub grid: Grid,
    pub start: NodeId,
    pub goal: NodeId,
}

/// Collects the start and goal markers while a grid is being loaded.
#[derive(Default)]
struct Endpoints {
    start: Option<NodeId>,
    goal: Option<NodeId>,
}

impl Endpoints {
    fn mark(
        &mut self,
        cell: GridProblemCell,
        id: NodeId,
        x: usize,
        y: usize,
    ) -> Result<GridCell, GridProblemParseError> {
        match cell {
            GridProblemCell::Start => {
                if self.start.replace(id).is_some() {
                    return Err(GridProblemParseError::DuplicateStart { x, y });
                }
                Ok(GridCell::Empty)
            }
            GridProblemCell::Goal => {
                if self.goal.replace(id).is_some() {
                    return Err(GridProblemParseError::DuplicateGoal { x, y });
                }
                Ok(GridCell::Empty)
            }
            GridProblemCell::Cell(c) => Ok(c),
        }
    }

    fn finish(self, grid: Grid) -> Result<GridProblem, GridProblemParseError> {
        Ok(GridProblem {
            grid,
            start: self.start.ok_or(GridProblemParseError::MissingStart)?,
            goal: self.goal.ok_or(GridProblemParseError::MissingGoal)?,
        })
    }
}

fn checked_grid(width: usize, height: usize) -> Result<Grid, GridProblemParseError> {
    if width == 0 || height == 0 {
        return Err(GridProblemParseError::EmptyInput);
    }
    if !Grid::safe_dimensions(width, height) {
        return Err(GridProblemParseError::TooLarge { width, height });
    }
    Ok(Grid::new(width, height))
}

impl GridProblem {
    /// Keeps the grid and picks a random walkable start and goal.
    pub fn randomize<R: rand::Rng>(&self, r: &mut R) -> Option<GridProblem> {
        for _tries in 0..RANDOM_NODE_MAX_TRIES {
            let start = self.grid.random_walkable(r)?;
            let goal = self.grid.random_walkable(r)?;
            if start != goal {
                return Some(GridProblem {
                    grid: self.grid.clone(),
                    start,
                    goal,
                });
            }
        }

        None
    }
}

impl std::convert::TryFrom<&str> for GridProblem {
    type Error = GridProblemParseError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        let lines: Vec<&str> = s.lines().collect();
        if lines.is_empty() {
            return Err(GridProblemParseError::EmptyInput);
        }

        let width = lines[0].chars().count();
        let height = lines.len();
        let mut grid = checked_grid(width, height)?;
        let mut endpoints = Endpoints::default();

        for (y, line) in lines.iter().enumerate() {
            let len = line.chars().count();
            if len != width {
                return Err(GridProblemParseError::RaggedRow { y, len, width });
            }

            for (x, ch) in line.chars().enumerate() {
                let cell = GridProblemCell::try_from(ch)
                    .map_err(|e| GridProblemParseError::InvalidCell { e, x, y })?;
                let Some(id) = grid.node_id(x as CoordIntrinsic, y as CoordIntrinsic) else {
                    unreachable!("({x},{y}) is within a {width}x{height} grid");
                };

                let cell = endpoints.mark(cell, id, x, y)?;
                grid.set_walkable(id, cell == GridCell::Empty);
            }
        }

        endpoints.finish(grid)
    }
}

impl std::convert::TryFrom<&std::path::Path> for GridProblem {
    type Error = GridProblemParseError;

    fn try_from(p: &std::path::Path) -> Result<Self, Self::Error> {
        use image::ImageReader;
        use image::Rgb;

        let img = ImageReader::open(p)
            .map_err(|e| GridProblemParseError::IOError {
                p: p.to_path_buf(),
                e,
            })?
            .decode()
            .map_err(|e| GridProblemParseError::ImageError {
                p: p.to_path_buf(),
                e,
            })?
            .into_rgb8();

        let mut grid = checked_grid(img.width() as usize, img.height() as usize)?;
        let mut endpoints = Endpoints::default();

        for (x, y, px) in img.enumerate_pixels() {
            let px: &Rgb<u8> = px;
            let cell = match px.0 {
                BLACK => GridProblemCell::Cell(GridCell::Wall),
                WHITE => GridProblemCell::Cell(GridCell::Empty),
                GREEN => GridProblemCell::Goal,
                BLUE => GridProblemCell::Start,
                _ => GridProblemCell::Cell(GridCell::Empty),
            };
            let Some(id) = grid.node_id(x, y) else {
                unreachable!("Pixel ({x},{y}) is within the image");
            };

            let cell = endpoints.mark(cell, id, x as usize, y as usize)?;
            grid.set_walkable(id, cell == GridCell::Empty);
        }

        endpoints.finish(grid)
    }
}

impl std::fmt::Display for GridProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let (w, h) = self.grid.dimensions();
        writeln!(
            f,
            "GridProblem({w}x{h}) (s:{}, g:{}):",
            self.grid.coord(self.start),
            self.grid.coord(self.goal)
        )?;

        for y in 0..h.min(MAX_ELEMENTS_DISPLAYED) {
            for x in 0..w.min(MAX_ELEMENTS_DISPLAYED) {
                let Some(id) = self.grid.node_id(x as CoordIntrinsic, y as CoordIntrinsic) else {
                    continue;
                };
                let cell = if id == self.start {
                    GridProblemCell::Start
                } else if id == self.goal {
                    GridProblemCell::Goal
                } else if self.grid.node(id).walkable() {
                    GridProblemCell::Cell(GridCell::Empty)
                } else {
                    GridProblemCell::Cell(GridCell::Wall)
                };
                write!(f, "{cell}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

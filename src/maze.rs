//! Maze model and flood-fill distances
//!
//! The grid is indexed `(x, y)` with `(0, 0)` the start cell in the south-west
//! corner, `x` growing east and `y` growing north. Every cell stores its four
//! wall flags and its distance to the nearest goal cell. A wall between two
//! in-bounds cells is always recorded on both of them.

use heapless::{Deque, Vec};

use crate::config::{MAZE_HEIGHT, MAZE_WIDTH};

/// Distance of a cell no goal can be reached from
pub const UNREACHABLE: u8 = 255;

const CELL_COUNT: usize = MAZE_WIDTH * MAZE_HEIGHT;

/// Compass heading in the maze frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Scan order used wherever ties are broken
    pub const ALL: [Direction; 4] = [Direction::North, Direction::East, Direction::South, Direction::West];

    fn index(self) -> u8 {
        match self {
            Direction::North => 0,
            Direction::East => 1,
            Direction::South => 2,
            Direction::West => 3,
        }
    }

    fn from_index(index: u8) -> Self {
        Self::ALL[(index % 4) as usize]
    }

    fn bit(self) -> u8 {
        1 << self.index()
    }

    pub fn right(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn left(self) -> Self {
        Self::from_index(self.index() + 3)
    }

    pub fn opposite(self) -> Self {
        Self::from_index(self.index() + 2)
    }

    /// Rotation that turns a robot facing `self` to face `target`
    pub fn rotation_to(self, target: Direction) -> Rotation {
        match (target.index() + 4 - self.index()) % 4 {
            0 => Rotation::None,
            1 => Rotation::Right,
            2 => Rotation::Reverse,
            _ => Rotation::Left,
        }
    }

    /// Grid step `(dx, dy)` of one cell in this direction
    pub fn offset(self) -> (i8, i8) {
        match self {
            Direction::North => (0, 1),
            Direction::East => (1, 0),
            Direction::South => (0, -1),
            Direction::West => (-1, 0),
        }
    }
}

/// Turn needed before moving on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    None,
    Right,
    Reverse,
    Left,
}

/// Robot cell and heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pose {
    pub x: u8,
    pub y: u8,
    pub heading: Direction,
}

impl Pose {
    /// Start cell, facing north
    pub const fn origin() -> Self {
        Self {
            x: 0,
            y: 0,
            heading: Direction::North,
        }
    }

    /// Pose after one cell towards `dir`, `None` when that leaves the grid
    pub fn advanced(self, dir: Direction) -> Option<Self> {
        let (x, y) = neighbor(self.x, self.y, dir)?;
        Some(Self { x, y, heading: dir })
    }
}

fn in_bounds(x: i16, y: i16) -> bool {
    x >= 0 && (x as usize) < MAZE_WIDTH && y >= 0 && (y as usize) < MAZE_HEIGHT
}

/// In-bounds neighbour of `(x, y)` towards `dir`
pub fn neighbor(x: u8, y: u8, dir: Direction) -> Option<(u8, u8)> {
    let (dx, dy) = dir.offset();
    let nx = x as i16 + dx as i16;
    let ny = y as i16 + dy as i16;
    if in_bounds(nx, ny) {
        Some((nx as u8, ny as u8))
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy)]
struct Cell {
    walls: u8,
    dist: u8,
}

impl Cell {
    const EMPTY: Cell = Cell {
        walls: 0,
        dist: UNREACHABLE,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Goal {
    Center,
    Cell(u8, u8),
}

/// Goal cells: at most the four centre cells
pub type GoalCells = Vec<(u8, u8), 4>;

pub struct Maze {
    cells: [[Cell; MAZE_HEIGHT]; MAZE_WIDTH],
    goal: Goal,
}

impl Default for Maze {
    fn default() -> Self {
        Self::new()
    }
}

impl Maze {
    /// No walls, every cell unreachable, centre goal
    pub const fn new() -> Self {
        Self {
            cells: [[Cell::EMPTY; MAZE_HEIGHT]; MAZE_WIDTH],
            goal: Goal::Center,
        }
    }

    /// Forget all walls and distances; the goal is kept
    pub fn reset(&mut self) {
        self.cells = [[Cell::EMPTY; MAZE_HEIGHT]; MAZE_WIDTH];
    }

    /// Target a single cell; coordinates off the grid are ignored
    pub fn set_goal(&mut self, x: i16, y: i16) {
        if in_bounds(x, y) {
            self.goal = Goal::Cell(x as u8, y as u8);
        } else {
            debug!("Ignoring goal ({}, {}) outside the maze", x, y);
        }
    }

    /// Target the centre cells again
    pub fn clear_goal(&mut self) {
        self.goal = Goal::Center;
    }

    pub fn goal_cells(&self) -> GoalCells {
        let mut cells = GoalCells::new();
        match self.goal {
            Goal::Cell(x, y) => {
                let _ = cells.push((x, y));
            }
            Goal::Center => {
                // Even sizes have a 2x2 centre, odd sizes a single cell
                let cx = MAZE_WIDTH / 2 - ((MAZE_WIDTH & 1) ^ 1);
                let cy = MAZE_HEIGHT / 2 - ((MAZE_HEIGHT & 1) ^ 1);
                for x in cx..=MAZE_WIDTH / 2 {
                    for y in cy..=MAZE_HEIGHT / 2 {
                        let _ = cells.push((x as u8, y as u8));
                    }
                }
            }
        }
        cells
    }

    pub fn is_goal(&self, x: u8, y: u8) -> bool {
        self.goal_cells().contains(&(x, y))
    }

    pub fn has_wall(&self, x: u8, y: u8, dir: Direction) -> bool {
        self.cell(x, y).is_some_and(|c| c.walls & dir.bit() != 0)
    }

    /// Distance to the nearest goal, [`UNREACHABLE`] if none is known
    pub fn distance(&self, x: u8, y: u8) -> u8 {
        self.cell(x, y).map_or(UNREACHABLE, |c| c.dist)
    }

    fn cell(&self, x: u8, y: u8) -> Option<&Cell> {
        self.cells.get(x as usize)?.get(y as usize)
    }

    /// Put a wall on one face of `(x, y)` and the facing side of its neighbour
    pub fn set_wall(&mut self, x: u8, y: u8, dir: Direction) {
        if !in_bounds(x as i16, y as i16) {
            return;
        }
        self.cells[x as usize][y as usize].walls |= dir.bit();
        if let Some((nx, ny)) = neighbor(x, y, dir) {
            self.cells[nx as usize][ny as usize].walls |= dir.opposite().bit();
        }
    }

    /// Record what the sensors see from `pose`
    ///
    /// Only walls seen as present are written. An open reading never removes
    /// a wall that is already known.
    pub fn observe_walls(&mut self, pose: &Pose, front: bool, right: bool, left: bool) {
        let sides = [
            (front, pose.heading),
            (right, pose.heading.right()),
            (left, pose.heading.left()),
        ];
        for (present, dir) in sides {
            if present && !self.has_wall(pose.x, pose.y, dir) {
                trace!("Wall {:?} of ({}, {})", dir, pose.x, pose.y);
                self.set_wall(pose.x, pose.y, dir);
            }
        }
    }

    /// Multi-source breadth-first flood from the goal cells
    pub fn recompute_distances(&mut self) {
        let mut queue: Deque<(u8, u8), CELL_COUNT> = Deque::new();

        for column in self.cells.iter_mut() {
            for cell in column.iter_mut() {
                cell.dist = UNREACHABLE;
            }
        }

        for (x, y) in self.goal_cells() {
            self.cells[x as usize][y as usize].dist = 0;
            if queue.push_back((x, y)).is_err() {
                warn!("Flood queue full");
            }
        }

        while let Some((x, y)) = queue.pop_front() {
            let next = self.cells[x as usize][y as usize].dist as u16 + 1;
            if next >= UNREACHABLE as u16 {
                continue;
            }
            for dir in Direction::ALL {
                if self.has_wall(x, y, dir) {
                    continue;
                }
                let Some((nx, ny)) = neighbor(x, y, dir) else {
                    continue;
                };
                let cell = &mut self.cells[nx as usize][ny as usize];
                if cell.dist as u16 > next {
                    cell.dist = next as u8;
                    if queue.push_back((nx, ny)).is_err() {
                        warn!("Flood queue full");
                    }
                }
            }
        }
    }

    /// Open neighbour with the smallest finite distance
    ///
    /// Ties go to the first direction in north, east, south, west order.
    /// `None` when no open neighbour has a finite distance.
    pub fn best_direction(&self, x: u8, y: u8) -> Option<Direction> {
        let mut best: Option<(Direction, u8)> = None;
        for dir in Direction::ALL {
            if self.has_wall(x, y, dir) {
                continue;
            }
            let Some((nx, ny)) = neighbor(x, y, dir) else {
                continue;
            };
            let dist = self.distance(nx, ny);
            if dist < best.map_or(UNREACHABLE, |(_, d)| d) {
                best = Some((dir, dist));
            }
        }
        best.map(|(dir, _)| dir)
    }
}

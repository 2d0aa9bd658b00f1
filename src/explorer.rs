//! Move selection on top of the flood-fill field
//!
//! The explorer owns the maze and the robot pose. It decides which way to go
//! and hands the physical manoeuvre to a [`Locomotion`] implementation, which
//! on the robot is the motion controller. The pose is only updated after a
//! manoeuvre completes.
//!
//! Exploring is one cell per call: the caller observes walls and re-floods
//! between calls. Replaying drives the greedy path over the known maze
//! without looking at the sensors again.

use heapless::Vec;

use crate::config::RunConfig;
use crate::maze::{Direction, Maze, Pose, Rotation};
use crate::motion::{DriveOutcome, TurnOutcome};
use crate::range::WallReadings;
use crate::traits::MotorError;

/// Longest path the maze can hold
pub const MAX_PATH: usize = crate::config::MAZE_WIDTH * crate::config::MAZE_HEIGHT;

pub type Path = Vec<Direction, MAX_PATH>;

/// Physical moves the explorer asks for
pub trait Locomotion {
    /// Turn by `rotation`; `Rotation::None` does nothing
    async fn rotate(&mut self, rotation: Rotation, config: &RunConfig) -> Result<TurnOutcome, MotorError>;

    /// Drive straight ahead for `cells` cells
    async fn advance(&mut self, cells: u8, config: &RunConfig) -> Result<DriveOutcome, MotorError>;

    /// Stop both wheels
    fn halt(&mut self) -> Result<(), MotorError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExplorerState {
    Idle,
    Exploring,
    Replaying,
    AtGoal,
    /// No known route to the goal; motion has been halted
    Blocked,
}

/// Result of one explorer call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// Moved one cell; this is the new pose
    Moved(Pose),
    AtGoal,
    /// No open neighbour has a finite distance
    Blocked,
    /// The turn was aborted by its stall guard; the pose is unchanged
    Stalled,
}

pub struct Explorer {
    maze: Maze,
    pose: Pose,
    state: ExplorerState,
}

impl Default for Explorer {
    fn default() -> Self {
        Self::new()
    }
}

impl Explorer {
    pub const fn new() -> Self {
        Self {
            maze: Maze::new(),
            pose: Pose::origin(),
            state: ExplorerState::Idle,
        }
    }

    /// Start a fresh run: empty maze, goal from `config`, robot at the origin
    pub fn begin_run(&mut self, config: &RunConfig) {
        self.maze.reset();
        self.maze.clear_goal();
        if let Some((x, y)) = config.goal {
            self.maze.set_goal(x, y);
        }
        self.pose = Pose::origin();
        self.state = ExplorerState::Exploring;
        info!("Run started, goal {:?}", config.goal);
    }

    /// Keep the learned maze and put the robot back at the start
    pub fn restart_from_origin(&mut self) {
        self.pose = Pose::origin();
        self.state = ExplorerState::Exploring;
    }

    /// Record the walls seen from the current pose
    pub fn observe_walls(&mut self, walls: WallReadings) {
        self.maze.observe_walls(&self.pose, walls.front, walls.right, walls.left);
    }

    pub fn recompute_distances(&mut self) {
        self.maze.recompute_distances();
    }

    /// Direction of the next cell and the turn needed to face it
    pub fn next_move(&self) -> Option<(Direction, Rotation)> {
        let dir = self.maze.best_direction(self.pose.x, self.pose.y)?;
        Some((dir, self.pose.heading.rotation_to(dir)))
    }

    pub fn at_goal(&self) -> bool {
        self.maze.is_goal(self.pose.x, self.pose.y)
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn state(&self) -> ExplorerState {
        self.state
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn maze_mut(&mut self) -> &mut Maze {
        &mut self.maze
    }

    /// Move one cell towards the goal
    ///
    /// Walls must have been observed and distances recomputed for the
    /// current cell before calling.
    pub async fn step_explore<L: Locomotion>(&mut self, motion: &mut L, config: &RunConfig) -> Result<Step, MotorError> {
        if self.at_goal() {
            self.state = ExplorerState::AtGoal;
            return Ok(Step::AtGoal);
        }

        let Some((dir, rotation)) = self.next_move() else {
            return self.block(motion);
        };
        self.state = ExplorerState::Exploring;

        if let TurnOutcome::Runaway = motion.rotate(rotation, config).await? {
            warn!("Turn {:?} stalled at ({}, {})", rotation, self.pose.x, self.pose.y);
            return Ok(Step::Stalled);
        }
        self.pose.heading = dir;

        let outcome = motion.advance(1, config).await?;
        let Some(next) = self.pose.advanced(dir) else {
            return self.block(motion);
        };
        self.pose = next;
        debug!("Moved to ({}, {}) facing {:?}, {:?}", next.x, next.y, next.heading, outcome);

        if self.at_goal() {
            info!("Goal reached at ({}, {})", next.x, next.y);
            self.state = ExplorerState::AtGoal;
            motion.halt()?;
        }
        Ok(Step::Moved(next))
    }

    /// Greedy walk over the current distances from the pose to a goal cell
    ///
    /// `None` when the walk cannot reach a goal.
    pub fn compute_best_path(&self) -> Option<Path> {
        let mut path = Path::new();
        let mut x = self.pose.x;
        let mut y = self.pose.y;

        while !self.maze.is_goal(x, y) {
            let dir = self.maze.best_direction(x, y)?;
            // A full path means the distances are stale and the walk loops
            path.push(dir).ok()?;
            let next = Pose { x, y, heading: dir }.advanced(dir)?;
            x = next.x;
            y = next.y;
        }
        Some(path)
    }

    /// Drive the best known path back to back, without re-observing walls
    pub async fn run_best_path<L: Locomotion>(&mut self, motion: &mut L, config: &RunConfig) -> Result<Step, MotorError> {
        let Some(path) = self.compute_best_path() else {
            return self.block(motion);
        };
        info!("Replaying {} moves", path.len());
        self.state = ExplorerState::Replaying;

        for dir in path {
            let rotation = self.pose.heading.rotation_to(dir);
            if let TurnOutcome::Runaway = motion.rotate(rotation, config).await? {
                warn!("Replay turn stalled at ({}, {})", self.pose.x, self.pose.y);
                self.state = ExplorerState::Exploring;
                return Ok(Step::Stalled);
            }
            self.pose.heading = dir;
            motion.advance(1, config).await?;
            if let Some(next) = self.pose.advanced(dir) {
                self.pose = next;
            }
        }

        motion.halt()?;
        self.state = ExplorerState::AtGoal;
        info!("Replay finished at ({}, {})", self.pose.x, self.pose.y);
        Ok(Step::AtGoal)
    }

    fn block<L: Locomotion>(&mut self, motion: &mut L) -> Result<Step, MotorError> {
        info!("No route to the goal from ({}, {})", self.pose.x, self.pose.y);
        self.state = ExplorerState::Blocked;
        motion.halt()?;
        Ok(Step::Blocked)
    }
}

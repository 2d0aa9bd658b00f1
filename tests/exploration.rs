//! Whole runs of the explorer against a known maze
//!
//! The robot here is a stand-in that moves on a grid: it crashes (panics) if
//! asked to drive through a real wall, and its sensors report the real walls
//! around it.

use embassy_futures::block_on;
use micromouse::explorer::ExplorerState;
use micromouse::maze::{neighbor, Direction, Maze, Pose, Rotation};
use micromouse::{DriveOutcome, Explorer, Locomotion, RunConfig, Step, TurnOutcome, WallReadings};

struct GridRobot<'a> {
    truth: &'a Maze,
    pose: Pose,
    check_walls: bool,
    moves: usize,
    halts: usize,
}

impl<'a> GridRobot<'a> {
    fn new(truth: &'a Maze) -> Self {
        Self {
            truth,
            pose: Pose::origin(),
            check_walls: true,
            moves: 0,
            halts: 0,
        }
    }

    fn sense(&self) -> WallReadings {
        let Pose { x, y, heading } = self.pose;
        let blocked = |dir| self.truth.has_wall(x, y, dir) || neighbor(x, y, dir).is_none();
        WallReadings {
            front: blocked(heading),
            right: blocked(heading.right()),
            left: blocked(heading.left()),
        }
    }
}

impl Locomotion for GridRobot<'_> {
    async fn rotate(&mut self, rotation: Rotation, _config: &RunConfig) -> Result<TurnOutcome, micromouse::traits::MotorError> {
        let heading = self.pose.heading;
        self.pose.heading = match rotation {
            Rotation::None => return Ok(TurnOutcome::Skipped),
            Rotation::Right => heading.right(),
            Rotation::Left => heading.left(),
            Rotation::Reverse => heading.opposite(),
        };
        Ok(TurnOutcome::Reached)
    }

    async fn advance(&mut self, cells: u8, _config: &RunConfig) -> Result<DriveOutcome, micromouse::traits::MotorError> {
        for _ in 0..cells {
            let Pose { x, y, heading } = self.pose;
            if self.check_walls {
                assert!(!self.truth.has_wall(x, y, heading), "drove into a wall at ({x}, {y}) facing {heading:?}");
            }
            self.pose = self.pose.advanced(heading).expect("drove off the maze");
            self.moves += 1;
        }
        Ok(DriveOutcome::TargetReached)
    }

    fn halt(&mut self) -> Result<(), micromouse::traits::MotorError> {
        self.halts += 1;
        Ok(())
    }
}

/// Explore until the explorer stops; returns the final step
fn explore(explorer: &mut Explorer, robot: &mut GridRobot, config: &RunConfig, limit: usize) -> Step {
    for _ in 0..limit {
        explorer.observe_walls(robot.sense());
        explorer.recompute_distances();
        match block_on(explorer.step_explore(robot, config)).unwrap() {
            Step::Moved(pose) => assert_eq!(pose, robot.pose),
            Step::Stalled => panic!("grid robot never stalls"),
            done => return done,
        }
    }
    panic!("no result after {limit} steps");
}

/// Barrier along the north side of row 3, open only at the east edge
fn barrier_maze() -> Maze {
    let mut truth = Maze::new();
    for x in 0..15 {
        truth.set_wall(x, 3, Direction::North);
    }
    truth
}

#[test]
fn explores_around_a_barrier_to_the_centre() {
    let truth = barrier_maze();
    let config = RunConfig::default();
    let mut explorer = Explorer::new();
    explorer.begin_run(&config);
    let mut robot = GridRobot::new(&truth);

    let step = explore(&mut explorer, &mut robot, &config, 1000);

    assert_eq!(step, Step::AtGoal);
    assert_eq!(explorer.state(), ExplorerState::AtGoal);
    assert!(explorer.at_goal());
    assert_eq!(explorer.pose(), robot.pose);
    assert!(robot.halts >= 1);
    // at least the detour via the east edge
    assert!(robot.moves >= 26, "only {} moves", robot.moves);
}

#[test]
fn speed_run_replays_the_learned_path() {
    let truth = barrier_maze();
    let config = RunConfig::default();
    let mut explorer = Explorer::new();
    explorer.begin_run(&config);
    let mut robot = GridRobot::new(&truth);
    explore(&mut explorer, &mut robot, &config, 1000);
    let explored_moves = robot.moves;

    // robot carried back to the start by hand
    explorer.restart_from_origin();
    explorer.recompute_distances();
    let path = explorer.compute_best_path().expect("goal is known to be reachable");
    assert_eq!(path.len(), explorer.maze().distance(0, 0) as usize);
    assert!(path.len() <= explored_moves);

    let mut runner = GridRobot::new(&truth);
    runner.check_walls = false;
    let step = block_on(explorer.run_best_path(&mut runner, &config)).unwrap();

    assert_eq!(step, Step::AtGoal);
    assert_eq!(runner.moves, path.len());
    assert!(explorer.maze().is_goal(runner.pose.x, runner.pose.y));
    assert_eq!(explorer.pose(), runner.pose);
}

#[test]
fn user_goal_replaces_the_centre() {
    let truth = barrier_maze();
    let config = RunConfig {
        goal: Some((2, 5)),
        ..RunConfig::default()
    };
    let mut explorer = Explorer::new();
    explorer.begin_run(&config);
    let mut robot = GridRobot::new(&truth);

    assert_eq!(explore(&mut explorer, &mut robot, &config, 1000), Step::AtGoal);
    assert_eq!((robot.pose.x, robot.pose.y), (2, 5));
    assert!(!explorer.maze().is_goal(7, 7));
}

#[test]
fn sealed_goal_ends_blocked() {
    let mut truth = Maze::new();
    for dir in Direction::ALL {
        truth.set_wall(3, 3, dir);
    }
    let config = RunConfig {
        goal: Some((3, 3)),
        ..RunConfig::default()
    };
    let mut explorer = Explorer::new();
    explorer.begin_run(&config);
    let mut robot = GridRobot::new(&truth);

    assert_eq!(explore(&mut explorer, &mut robot, &config, 2000), Step::Blocked);
    assert_eq!(explorer.state(), ExplorerState::Blocked);
    assert!(robot.halts >= 1);
}

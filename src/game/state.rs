use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Arc;

/// Fixed board geometry shared by both peers.
///
/// Both processes must simulate exactly the same field, so this is not part of the
/// user configuration. Built once per match and passed to every component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    pub height: i32,
    pub width: i32,
    pub pad_left_x: i32,
    pub pad_right_x: i32,
    /// Rows above and below the paddle centre that still count as paddle.
    pub paddle_reach: i32,
}

impl Board {
    pub const fn standard() -> Self {
        Self {
            height: 21,
            width: 43,
            pad_left_x: 1,
            pad_right_x: 41,
            paddle_reach: 2,
        }
    }

    pub fn center_x(&self) -> i32 {
        self.width / 2
    }

    pub fn center_y(&self) -> i32 {
        self.height / 2
    }

    /// Lowest row a paddle centre may take while the whole paddle stays inside the walls.
    pub fn paddle_min_y(&self) -> i32 {
        1 + self.paddle_reach
    }

    pub fn paddle_max_y(&self) -> i32 {
        self.height - 2 - self.paddle_reach
    }

    pub fn clamp_paddle(&self, y: i32) -> i32 {
        y.clamp(self.paddle_min_y(), self.paddle_max_y())
    }

    pub fn paddle_x(&self, side: Side) -> i32 {
        match side {
            Side::Left => self.pad_left_x,
            Side::Right => self.pad_right_x,
        }
    }

    /// Column the ball must occupy to touch the given paddle (one cell towards the field).
    pub fn collision_x(&self, side: Side) -> i32 {
        match side {
            Side::Left => self.pad_left_x + 1,
            Side::Right => self.pad_right_x - 1,
        }
    }

    /// Which paddle is relevant for a ball in column `x`.
    ///
    /// The split is exact: for the odd width the middle column belongs to the left half.
    pub fn half_for(&self, x: i32) -> Side {
        if 2 * x < self.width {
            Side::Left
        } else {
            Side::Right
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

/// Paddle movement direction, in screen terms (up = towards row 0).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    fn delta(self) -> i32 {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ball {
    pub x: i32,
    pub y: i32,
    pub dx: i32,
    pub dy: i32,
}

/// Paddle rows shared between the tick loop and both input actors.
///
/// Ownership rule: the local input actor moves only the paddle this process owns,
/// the remote input actor moves only the other one, and the tick loop touches them
/// only to re-centre both on reset. Every write is an atomic read-modify-write or
/// store, so concurrent access is well defined even across the reset.
#[derive(Debug)]
pub struct Paddles {
    left: AtomicI32,
    right: AtomicI32,
    board: Board,
}

impl Paddles {
    pub fn new(board: Board) -> Arc<Self> {
        let y = board.center_y();
        Arc::new(Self {
            left: AtomicI32::new(y),
            right: AtomicI32::new(y),
            board,
        })
    }

    fn cell(&self, side: Side) -> &AtomicI32 {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn get(&self, side: Side) -> i32 {
        self.cell(side).load(Ordering::Acquire)
    }

    pub fn set(&self, side: Side, y: i32) {
        self.cell(side)
            .store(self.board.clamp_paddle(y), Ordering::Release);
    }

    /// Move one paddle a single row, clamped to the playfield. Returns the new row.
    pub fn nudge(&self, side: Side, direction: Direction) -> i32 {
        let board = self.board;
        let step = |y: i32| Some(board.clamp_paddle(y + direction.delta()));
        match self
            .cell(side)
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, step)
        {
            Ok(previous) | Err(previous) => board.clamp_paddle(previous + direction.delta()),
        }
    }

    pub fn center(&self) {
        let y = self.board.center_y();
        self.set(Side::Left, y);
        self.set(Side::Right, y);
    }
}

/// Immutable copy of everything the renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub ball_x: i32,
    pub ball_y: i32,
    pub pad_left_y: i32,
    pub pad_right_y: i32,
    pub score_left: u8,
    pub score_right: u8,
}

/// Simulation state. Ball and scores belong to the tick loop alone; paddles are shared.
#[derive(Debug, Clone)]
pub struct GameState {
    pub board: Board,
    pub ball: Ball,
    pub paddles: Arc<Paddles>,
    pub score_left: u8,
    pub score_right: u8,
    pub max_rounds: u32,
}

impl GameState {
    /// Fresh state for a match, already reset to the opening serve.
    pub fn new(board: Board, paddles: Arc<Paddles>, max_rounds: u32) -> Self {
        let mut state = Self {
            board,
            ball: Ball::default(),
            paddles,
            score_left: 0,
            score_right: 0,
            max_rounds,
        };
        state.reset();
        state
    }

    /// Return ball and paddles to their starting positions.
    ///
    /// Horizontal direction is kept (opening serve goes right), vertical is zeroed.
    /// Both peers reset at the same simulation step, so no randomness is involved.
    pub fn reset(&mut self) {
        self.ball.x = self.board.center_x();
        self.ball.y = self.board.center_y();
        if self.ball.dx == 0 {
            self.ball.dx = 1;
        }
        self.ball.dy = 0;
        self.paddles.center();
    }

    pub fn points_played(&self) -> u32 {
        u32::from(self.score_left) + u32::from(self.score_right)
    }

    pub fn is_over(&self) -> bool {
        self.points_played() >= self.max_rounds
    }

    pub fn award_point(&mut self, side: Side) {
        let score = match side {
            Side::Left => &mut self.score_left,
            Side::Right => &mut self.score_right,
        };
        *score = (*score + 1) % 100;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            ball_x: self.ball.x,
            ball_y: self.ball.y,
            pad_left_y: self.paddles.get(Side::Left),
            pad_right_y: self.paddles.get(Side::Right),
            score_left: self.score_left,
            score_right: self.score_right,
        }
    }
}

use super::state::{GameState, Side};

/// What a single live tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Ball is still in play; the caller should render.
    InPlay,
    /// `side` won the point. The state has already been reset for the next serve.
    Scored { side: Side, game_over: bool },
}

/// Advance the simulation by one tick.
///
/// Order matters and both peers rely on it: move, paddle bounce, wall bounce, scoring.
/// A wall bounce on the same tick as a paddle bounce overrides the paddle's `dy`.
pub fn step(state: &mut GameState) -> TickOutcome {
    state.ball.x += state.ball.dx;
    state.ball.y += state.ball.dy;

    check_paddle_collision(state);
    check_wall_collision(state);

    match scoring_side(state) {
        Some(side) => {
            state.award_point(side);
            // Next serve heads away from the side that conceded
            state.ball.dx = match side {
                Side::Right => 1,
                Side::Left => -1,
            };
            state.reset();
            TickOutcome::Scored {
                side,
                game_over: state.is_over(),
            }
        }
        None => TickOutcome::InPlay,
    }
}

fn check_paddle_collision(state: &mut GameState) {
    let board = state.board;
    let side = board.half_for(state.ball.x);
    let pad_y = state.paddles.get(side);

    if state.ball.x != board.collision_x(side) || (state.ball.y - pad_y).abs() > board.paddle_reach {
        return;
    }

    state.ball.dx = -state.ball.dx;
    state.ball.dy = (state.ball.y - pad_y).signum();
}

fn check_wall_collision(state: &mut GameState) {
    if state.ball.y == 1 {
        state.ball.dy = 1;
    } else if state.ball.y == state.board.height - 2 {
        state.ball.dy = -1;
    }
}

fn scoring_side(state: &GameState) -> Option<Side> {
    if state.ball.x == 0 {
        Some(Side::Right)
    } else if state.ball.x == state.board.width - 1 {
        Some(Side::Left)
    } else {
        None
    }
}

pub mod input;
pub mod physics;
pub mod state;
pub mod tick;

pub use input::{InputSource, KeyIntent, KeyMap, KeyboardInput};
pub use state::{Board, Direction, GameState, Paddles, Side, Snapshot};
pub use tick::{MatchEnd, RenderSink, TickLoop};

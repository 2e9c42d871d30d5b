pub mod overlay;
pub mod render;

pub use render::{Palette, TerminalSink};

// Networking module for LanPong
// UDP handshake, wire protocol and the two input actors

pub mod actors;
pub mod handshake;
pub mod protocol;

pub use actors::{LocalInputActor, RemoteInputActor};
pub use handshake::{MatchSettings, RetryPolicy, Role, Session};
pub use protocol::{parse_rounds, Difficulty};

pub mod common;
mod network;

pub use network::run_network_match;

// Session handshake: "Join" from the challenger, "Start <difficulty> <rounds>" from the host

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::net::UdpSocket;
use tokio::time::{timeout, Instant};
use tracing::{debug, info, trace, warn};

use super::protocol::{Difficulty, Message, MAX_DATAGRAM};
use crate::game::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Waits for a challenger and picks the match settings. Owns the right paddle.
    Host,
    /// Joins a host. Owns the left paddle.
    Challenger,
}

impl Role {
    pub fn local_side(self) -> Side {
        match self {
            Role::Host => Side::Right,
            Role::Challenger => Side::Left,
        }
    }
}

/// Settings the host offers in its `Start` message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchSettings {
    pub difficulty: Difficulty,
    pub max_rounds: u32,
}

impl MatchSettings {
    pub fn start_message(&self) -> Message {
        Message::Start {
            difficulty: self.difficulty,
            max_rounds: self.max_rounds,
        }
    }
}

/// Outcome of a completed handshake. Never changes afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub role: Role,
    pub peer: SocketAddr,
    pub settings: MatchSettings,
}

impl Session {
    pub fn tick_interval(&self) -> Duration {
        self.settings.difficulty.tick_interval()
    }
}

/// Retry policy for the challenger side.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub attempts: u32,
}

/// Host side: wait up to `wait` for the first "Join", answer it, and lock onto that peer.
///
/// Any other datagram is ignored. The socket is connected to the peer on success, so
/// from then on only the peer's datagrams are delivered.
pub async fn host(socket: &UdpSocket, settings: MatchSettings, wait: Duration) -> Result<Session> {
    let deadline = Instant::now() + wait;
    let mut buf = [0u8; MAX_DATAGRAM];

    let peer = loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let (len, from) = match timeout(remaining, socket.recv_from(&mut buf)).await {
            Ok(received) => received.context("receive failed while waiting for a challenger")?,
            Err(_) => bail!("no challenger joined within {}s", wait.as_secs()),
        };

        match Message::decode(&buf[..len]) {
            Some(Message::Join) => break from,
            other => trace!(%from, ?other, "ignoring datagram while waiting for Join"),
        }
    };

    info!(%peer, ?settings, "challenger joined");
    socket
        .send_to(&settings.start_message().encode(), peer)
        .await
        .with_context(|| format!("failed to send Start to {}", peer))?;
    socket
        .connect(peer)
        .await
        .with_context(|| format!("failed to lock socket onto {}", peer))?;

    Ok(Session {
        role: Role::Host,
        peer,
        settings,
    })
}

/// Challenger side: send "Join" to `host_addr` until a "Start" comes back.
///
/// Each attempt waits `retry.timeout`; a lost "Join" or "Start" just costs one attempt.
/// The peer is whatever address the "Start" came from.
pub async fn join(socket: &UdpSocket, host_addr: SocketAddr, retry: RetryPolicy) -> Result<Session> {
    let join = Message::Join.encode();
    let mut buf = [0u8; MAX_DATAGRAM];

    for attempt in 1..=retry.attempts {
        debug!(%host_addr, attempt, "sending Join");
        socket
            .send_to(&join, host_addr)
            .await
            .with_context(|| format!("failed to send Join to {}", host_addr))?;

        let deadline = Instant::now() + retry.timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (len, from) = match timeout(remaining, socket.recv_from(&mut buf)).await {
                Ok(received) => received.context("receive failed while waiting for Start")?,
                Err(_) => break,
            };

            match Message::decode(&buf[..len]) {
                Some(Message::Start {
                    difficulty,
                    max_rounds,
                }) => {
                    let settings = MatchSettings {
                        difficulty,
                        max_rounds,
                    };
                    info!(peer = %from, ?settings, attempt, "host accepted");
                    socket
                        .connect(from)
                        .await
                        .with_context(|| format!("failed to lock socket onto {}", from))?;
                    return Ok(Session {
                        role: Role::Challenger,
                        peer: from,
                        settings,
                    });
                }
                other => trace!(%from, ?other, "ignoring datagram while waiting for Start"),
            }
        }

        warn!(%host_addr, attempt, "no Start received before timeout");
    }

    bail!(
        "host {} did not answer after {} attempts",
        host_addr,
        retry.attempts
    )
}

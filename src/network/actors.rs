// Input actors: local keyboard -> own paddle + peer, peer datagrams -> other paddle

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, trace};

use super::protocol::{Message, Opcode, MAX_DATAGRAM};
use crate::game::{Direction, InputSource, KeyIntent, Paddles, Side};

/// A peer that has already exited answers our datagrams with ICMP port-unreachable,
/// which Linux reports on the next call on a connected socket. That is not fatal here.
fn is_peer_gone(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::ConnectionRefused
}

/// Clear the shared running flag if the actor failed, so the tick loop stops too.
fn stop_on_error(running: &AtomicBool, result: Result<()>) -> Result<()> {
    if result.is_err() {
        running.store(false, Ordering::Release);
    }
    result
}

/// Polls the local keyboard, moves the paddle this process owns and tells the peer.
pub struct LocalInputActor<I: InputSource> {
    source: I,
    socket: Arc<UdpSocket>,
    paddles: Arc<Paddles>,
    side: Side,
    poll_delay: Duration,
    running: Arc<AtomicBool>,
}

impl<I: InputSource> LocalInputActor<I> {
    pub fn new(
        source: I,
        socket: Arc<UdpSocket>,
        paddles: Arc<Paddles>,
        side: Side,
        poll_delay: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            source,
            socket,
            paddles,
            side,
            poll_delay,
            running,
        }
    }

    /// Runs until the running flag is cleared. Shutdown latency is one poll delay.
    pub async fn run(mut self) -> Result<()> {
        let running = Arc::clone(&self.running);
        let result = self.poll_loop().await;
        stop_on_error(&running, result)
    }

    async fn poll_loop(&mut self) -> Result<()> {
        while self.running.load(Ordering::Acquire) {
            match self.source.poll().context("failed to poll local input")? {
                Some(KeyIntent::Up) => self.move_paddle(Direction::Up).await?,
                Some(KeyIntent::Down) => self.move_paddle(Direction::Down).await?,
                Some(KeyIntent::Quit) => {
                    info!("quit requested by local player");
                    self.running.store(false, Ordering::Release);
                    break;
                }
                None => {}
            }
            sleep(self.poll_delay).await;
        }
        Ok(())
    }

    async fn move_paddle(&mut self, direction: Direction) -> Result<()> {
        let row = self.paddles.nudge(self.side, direction);
        let op = Opcode::for_move(self.side, direction);
        trace!(?op, row, "local move");

        match self.socket.send(&Message::Move(op).encode()).await {
            Ok(_) => Ok(()),
            Err(e) if is_peer_gone(&e) => {
                debug!("peer unreachable, move not delivered");
                Ok(())
            }
            Err(e) => Err(e).context("failed to send move to peer"),
        }
    }
}

/// Applies the peer's moves to the paddle this process does not own.
pub struct RemoteInputActor {
    socket: Arc<UdpSocket>,
    paddles: Arc<Paddles>,
    side: Side,
    receive_poll: Duration,
    running: Arc<AtomicBool>,
    start_reply: Option<Vec<u8>>,
}

impl RemoteInputActor {
    pub fn new(
        socket: Arc<UdpSocket>,
        paddles: Arc<Paddles>,
        side: Side,
        receive_poll: Duration,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            socket,
            paddles,
            side,
            receive_poll,
            running,
            start_reply: None,
        }
    }

    /// Host only: answer a repeated "Join" with this "Start" again.
    ///
    /// A challenger whose first "Start" was lost keeps re-sending "Join" after the
    /// host has already moved on to the match.
    pub fn with_start_reply(mut self, start: Message) -> Self {
        self.start_reply = Some(start.encode());
        self
    }

    /// Runs until the running flag is cleared.
    ///
    /// Receives are bounded by `receive_poll`, so a silent peer delays shutdown by at
    /// most one poll interval.
    pub async fn run(self) -> Result<()> {
        let running = Arc::clone(&self.running);
        let result = self.receive_loop().await;
        stop_on_error(&running, result)
    }

    async fn receive_loop(&self) -> Result<()> {
        let mut buf = [0u8; MAX_DATAGRAM];

        while self.running.load(Ordering::Acquire) {
            let len = match timeout(self.receive_poll, self.socket.recv(&mut buf)).await {
                Err(_) => continue,
                Ok(Ok(len)) => len,
                Ok(Err(e)) if is_peer_gone(&e) => {
                    debug!("peer unreachable");
                    continue;
                }
                Ok(Err(e)) => return Err(e).context("failed to receive from peer"),
            };
            self.handle(&buf[..len]).await?;
        }
        Ok(())
    }

    async fn handle(&self, datagram: &[u8]) -> Result<()> {
        match Message::decode(datagram) {
            Some(Message::Move(op)) if op.side() == self.side => {
                let row = self.paddles.nudge(self.side, op.direction());
                trace!(?op, row, "remote move");
            }
            Some(Message::Move(op)) => {
                debug!(?op, "peer tried to move our paddle, dropped");
            }
            Some(Message::Join) => {
                if let Some(reply) = &self.start_reply {
                    debug!("peer repeated Join, re-sending Start");
                    match self.socket.send(reply).await {
                        Ok(_) => {}
                        Err(e) if is_peer_gone(&e) => {}
                        Err(e) => return Err(e).context("failed to re-send Start"),
                    }
                }
            }
            other => trace!(?other, len = datagram.len(), "dropping datagram"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Board;
    use crate::network::protocol::Difficulty;
    use std::cell::Cell;
    use std::collections::VecDeque;

    /// Replays a fixed list of intents, then reports nothing.
    struct ScriptedInput(VecDeque<Option<KeyIntent>>);

    impl InputSource for ScriptedInput {
        fn poll(&mut self) -> io::Result<Option<KeyIntent>> {
            Ok(self.0.pop_front().flatten())
        }
    }

    /// Keyboard stand-in that is `Send` but not `Sync`, like most real input handles.
    struct CountingInput {
        polls: Cell<u32>,
    }

    impl InputSource for CountingInput {
        fn poll(&mut self) -> io::Result<Option<KeyIntent>> {
            self.polls.set(self.polls.get() + 1);
            Ok(match self.polls.get() {
                1 => Some(KeyIntent::Down),
                2 => Some(KeyIntent::Quit),
                _ => None,
            })
        }
    }

    async fn connected_pair() -> (Arc<UdpSocket>, UdpSocket) {
        let ours = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let theirs = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        ours.connect(theirs.local_addr().unwrap()).await.unwrap();
        theirs.connect(ours.local_addr().unwrap()).await.unwrap();
        (Arc::new(ours), theirs)
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        timeout(Duration::from_secs(2), async {
            while !condition() {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    #[tokio::test]
    async fn test_local_moves_own_paddle_and_notifies_peer() {
        let (socket, peer) = connected_pair().await;
        let paddles = Paddles::new(Board::standard());
        let running = Arc::new(AtomicBool::new(true));
        let script = ScriptedInput(VecDeque::from(vec![
            Some(KeyIntent::Up),
            None,
            Some(KeyIntent::Up),
            Some(KeyIntent::Down),
            Some(KeyIntent::Quit),
        ]));

        let actor = LocalInputActor::new(
            script,
            socket,
            Arc::clone(&paddles),
            Side::Left,
            Duration::from_millis(1),
            Arc::clone(&running),
        );
        timeout(Duration::from_secs(2), actor.run())
            .await
            .unwrap()
            .unwrap();

        let mut buf = [0u8; MAX_DATAGRAM];
        let mut received = Vec::new();
        for _ in 0..3 {
            let len = peer.recv(&mut buf).await.unwrap();
            received.push(buf[..len].to_vec());
        }
        assert_eq!(received, vec![b"LW".to_vec(), b"LW".to_vec(), b"LS".to_vec()]);
        assert_eq!(paddles.get(Side::Left), 9);
        assert_eq!(paddles.get(Side::Right), 10);
        assert!(!running.load(Ordering::Acquire), "quit clears the flag");
    }

    #[tokio::test]
    async fn test_local_actor_runs_as_spawned_task() {
        let (socket, peer) = connected_pair().await;
        let paddles = Paddles::new(Board::standard());
        let running = Arc::new(AtomicBool::new(true));
        let actor = LocalInputActor::new(
            CountingInput {
                polls: Cell::new(0),
            },
            socket,
            Arc::clone(&paddles),
            Side::Right,
            Duration::from_millis(1),
            Arc::clone(&running),
        );

        timeout(Duration::from_secs(2), tokio::spawn(actor.run()))
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let mut buf = [0u8; MAX_DATAGRAM];
        let len = peer.recv(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], b"RS");
        assert_eq!(paddles.get(Side::Right), 11);
        assert!(!running.load(Ordering::Acquire));
    }

    #[tokio::test]
    async fn test_remote_moves_only_the_other_paddle() {
        let (socket, peer) = connected_pair().await;
        let paddles = Paddles::new(Board::standard());
        let running = Arc::new(AtomicBool::new(true));

        // Host owns the right paddle, so the peer drives the left one
        let actor = RemoteInputActor::new(
            socket,
            Arc::clone(&paddles),
            Side::Left,
            Duration::from_millis(20),
            Arc::clone(&running),
        );
        let handle = tokio::spawn(actor.run());

        for datagram in [&b"LW"[..], b"LW", b"xx", b"RW", b"LW"] {
            peer.send(datagram).await.unwrap();
        }
        wait_until(|| paddles.get(Side::Left) == 7).await;
        assert_eq!(paddles.get(Side::Right), 10);

        running.store(false, Ordering::Release);
        timeout(Duration::from_secs(1), handle)
            .await
            .expect("remote actor did not stop")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_remote_stops_without_traffic() {
        let (socket, _peer) = connected_pair().await;
        let running = Arc::new(AtomicBool::new(true));
        let actor = RemoteInputActor::new(
            socket,
            Paddles::new(Board::standard()),
            Side::Right,
            Duration::from_millis(20),
            Arc::clone(&running),
        );
        let handle = tokio::spawn(actor.run());

        sleep(Duration::from_millis(50)).await;
        running.store(false, Ordering::Release);

        timeout(Duration::from_millis(500), handle)
            .await
            .expect("receive was not bounded")
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_host_answers_repeated_join() {
        let (socket, peer) = connected_pair().await;
        let running = Arc::new(AtomicBool::new(true));
        let start = Message::Start {
            difficulty: Difficulty::Medium,
            max_rounds: 7,
        };
        let actor = RemoteInputActor::new(
            socket,
            Paddles::new(Board::standard()),
            Side::Left,
            Duration::from_millis(20),
            Arc::clone(&running),
        )
        .with_start_reply(start);
        let handle = tokio::spawn(actor.run());

        peer.send(b"Join").await.unwrap();
        let mut buf = [0u8; MAX_DATAGRAM];
        let len = timeout(Duration::from_secs(1), peer.recv(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"Start medium 7");

        running.store(false, Ordering::Release);
        handle.await.unwrap().unwrap();
    }
}

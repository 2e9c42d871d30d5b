use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::game::{Board, GameState, InputSource, MatchEnd, Paddles, RenderSink, TickLoop};
use crate::network::{LocalInputActor, RemoteInputActor, Role, Session};

/// Play one networked match over an already-handshaken, connected socket.
///
/// The tick loop runs on the calling task; both input actors run as spawned tasks
/// sharing the paddle rows and a running flag with it. Returns once both actors have
/// stopped. An actor failure is reported even if the tick loop itself ended cleanly.
pub async fn run_network_match<R, I>(
    session: &Session,
    socket: UdpSocket,
    config: &Config,
    sink: R,
    input: I,
) -> Result<MatchEnd>
where
    R: RenderSink,
    I: InputSource + 'static,
{
    let board = Board::standard();
    let paddles = Paddles::new(board);
    let state = GameState::new(board, Arc::clone(&paddles), session.settings.max_rounds);
    let running = Arc::new(AtomicBool::new(true));
    let socket = Arc::new(socket);

    info!(
        role = ?session.role,
        peer = %session.peer,
        difficulty = %session.settings.difficulty,
        max_rounds = session.settings.max_rounds,
        "match starting"
    );

    let mut tick_loop = TickLoop::new(
        state,
        sink,
        session.tick_interval(),
        Arc::clone(&running),
    );

    // Neither paddle can move until the opening countdown is over
    tick_loop.start().await.context("failed to draw opening countdown")?;

    let local_side = session.role.local_side();
    let local = LocalInputActor::new(
        input,
        Arc::clone(&socket),
        Arc::clone(&paddles),
        local_side,
        config.timing.input_poll(),
        Arc::clone(&running),
    );
    let mut remote = RemoteInputActor::new(
        Arc::clone(&socket),
        Arc::clone(&paddles),
        local_side.opposite(),
        config.network.receive_poll(),
        Arc::clone(&running),
    );
    if session.role == Role::Host {
        remote = remote.with_start_reply(session.settings.start_message());
    }

    let local_task = tokio::spawn(local.run());
    let remote_task = tokio::spawn(remote.run());

    let outcome = tick_loop.run().await;

    if matches!(outcome, Ok(MatchEnd::Completed { .. })) && running.load(Ordering::Acquire) {
        debug!(grace = ?config.timing.grace_period(), "holding final frame");
        sleep(config.timing.grace_period()).await;
    }
    running.store(false, Ordering::Release);

    let local_result = join_actor("local input", local_task).await;
    let remote_result = join_actor("remote input", remote_task).await;

    let end = outcome.context("failed to draw frame")?;
    local_result?;
    remote_result?;

    info!(?end, "match finished");
    Ok(end)
}

async fn join_actor(name: &str, task: JoinHandle<Result<()>>) -> Result<()> {
    let result = task
        .await
        .with_context(|| format!("{} task did not finish", name))?;
    if let Err(e) = &result {
        warn!(actor = name, error = %e, "actor failed");
    }
    result.with_context(|| format!("{} stopped", name))
}

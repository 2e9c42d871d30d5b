mod config;
mod debug;
mod game;
mod game_modes;
mod network;
mod ui;

use std::io::{self, BufRead, Write};
use std::net::SocketAddr;

use anyhow::{anyhow, bail, Context, Result};
use crossterm::{
    cursor, execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::net::UdpSocket;
use tracing::info;

use config::Config;
use game::{Board, KeyMap, KeyboardInput, MatchEnd, Side};
use network::handshake;
use network::{parse_rounds, Difficulty, MatchSettings, RetryPolicy, Session};
use ui::{Palette, TerminalSink};

/// How this process takes part in the match.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Host {
        port: u16,
        difficulty: Option<Difficulty>,
        rounds: Option<u32>,
    },
    Challenger {
        host: String,
        port: u16,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Play { mode: Mode, debug: bool },
    Help,
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("lanpong");

    let (mode, debug_enabled) = match parse_args(&args[1.min(args.len())..]) {
        Ok(Command::Play { mode, debug }) => (mode, debug),
        Ok(Command::Help) => {
            print_usage(program);
            return Ok(());
        }
        Err(msg) => {
            eprintln!("Error: {}", msg);
            print_usage(program);
            std::process::exit(1);
        }
    };

    debug::init(debug_enabled).context("failed to open debug log")?;
    info!(?mode, "LanPong starting");

    let config = config::load_config().unwrap_or_else(|e| {
        eprintln!("Warning: could not load config ({}), using defaults", e);
        Config::default()
    });
    let keys = KeyMap::from_bindings(&config.keybindings).context("invalid key binding in config")?;

    // Settings are settled on the plain terminal, before raw mode
    let settings = match &mode {
        Mode::Host {
            difficulty, rounds, ..
        } => Some(MatchSettings {
            difficulty: match difficulty {
                Some(d) => *d,
                None => prompt("Difficulty (easy, medium, hard): ", |s| {
                    s.parse::<Difficulty>()
                })?,
            },
            max_rounds: match rounds {
                Some(n) => *n,
                None => prompt("Number of rounds: ", parse_rounds)?,
            },
        }),
        Mode::Challenger { .. } => None,
    };

    let runtime = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    runtime.block_on(play(mode, settings, config, keys))
}

async fn play(
    mode: Mode,
    settings: Option<MatchSettings>,
    config: Config,
    keys: KeyMap,
) -> Result<()> {
    let (session, socket) = connect(&mode, settings, &config).await?;

    let local_side = session.role.local_side();
    let end = {
        let _guard = TerminalGuard::enter().context("failed to set up terminal")?;
        let terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
        let sink = TerminalSink::new(terminal, Board::standard(), Palette::from(&config.display));
        game_modes::run_network_match(&session, socket, &config, sink, KeyboardInput::new(keys))
            .await?
    };

    report(end, local_side);
    Ok(())
}

/// Bind the socket and run the handshake for `mode`.
async fn connect(
    mode: &Mode,
    settings: Option<MatchSettings>,
    config: &Config,
) -> Result<(Session, UdpSocket)> {
    match mode {
        Mode::Host { port, .. } => {
            let settings = settings.ok_or_else(|| anyhow!("host has no match settings"))?;
            let socket = UdpSocket::bind(("0.0.0.0", *port))
                .await
                .with_context(|| format!("failed to bind UDP port {}", port))?;

            println!(
                "Hosting {} game, {} rounds. Waiting for a challenger on port {}...",
                settings.difficulty, settings.max_rounds, port
            );
            let session = handshake::host(&socket, settings, config.network.host_wait()).await?;
            println!("Challenger joined from {}", session.peer);
            Ok((session, socket))
        }
        Mode::Challenger { host, port } => {
            let host_addr = resolve(host, *port).await?;
            let bind_addr: SocketAddr = if host_addr.is_ipv6() {
                "[::]:0".parse()?
            } else {
                "0.0.0.0:0".parse()?
            };
            let socket = UdpSocket::bind(bind_addr)
                .await
                .context("failed to bind local UDP socket")?;

            println!("Joining {}...", host_addr);
            let retry = RetryPolicy {
                timeout: config.network.handshake_timeout(),
                attempts: config.network.handshake_attempts,
            };
            let session = handshake::join(&socket, host_addr, retry).await?;
            println!(
                "Joined {} game, {} rounds",
                session.settings.difficulty, session.settings.max_rounds
            );
            Ok((session, socket))
        }
    }
}

async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    let addrs = tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("failed to resolve {}", host))?;
    pick_address(addrs).ok_or_else(|| anyhow!("{} has no addresses", host))
}

/// The host listens on IPv4 only, so an IPv4 address is preferred when the name has both.
fn pick_address(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<SocketAddr> {
    let mut fallback = None;
    for addr in addrs {
        if addr.is_ipv4() {
            return Some(addr);
        }
        fallback.get_or_insert(addr);
    }
    fallback
}

fn report(end: MatchEnd, local_side: Side) {
    match end {
        MatchEnd::Completed { left, right } => {
            let (ours, theirs) = match local_side {
                Side::Left => (left, right),
                Side::Right => (right, left),
            };
            println!("Final score: {} - {}", left, right);
            if ours > theirs {
                println!("You win!");
            } else if ours < theirs {
                println!("You lose.");
            } else {
                println!("It's a draw.");
            }
        }
        MatchEnd::Aborted => println!("Match aborted."),
    }
}

/// Ask on stdin until `parse` accepts the answer.
fn prompt<T, E: std::fmt::Display>(
    question: &str,
    parse: impl Fn(&str) -> Result<T, E>,
) -> Result<T> {
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("{}", question);
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            bail!("stdin closed before an answer was given");
        }
        match parse(line.trim()) {
            Ok(value) => return Ok(value),
            Err(e) => println!("{}", e),
        }
    }
}

/// Raw mode and the alternate screen for as long as the guard lives.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, cursor::Show);
    }
}

/// Parse command line arguments (without the program name)
fn parse_args(args: &[String]) -> Result<Command, String> {
    let mut debug = false;
    let mut host_port = None;
    let mut difficulty = None;
    let mut rounds = None;
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--debug" => debug = true,
            "--host" | "-l" => {
                let port = iter.next().ok_or("--host requires a port")?;
                host_port = Some(parse_port(port)?);
            }
            "--difficulty" | "-d" => {
                let value = iter.next().ok_or("--difficulty requires a value")?;
                difficulty = Some(value.parse::<Difficulty>().map_err(|e| e.to_string())?);
            }
            "--rounds" | "-r" => {
                let value = iter.next().ok_or("--rounds requires a value")?;
                rounds = Some(parse_rounds(value).map_err(|e| e.to_string())?);
            }
            other if other.starts_with('-') => {
                return Err(format!("unknown argument: {}", other));
            }
            other => positional.push(other.to_string()),
        }
    }

    let mode = match (host_port, positional.as_slice()) {
        (Some(port), []) => Mode::Host {
            port,
            difficulty,
            rounds,
        },
        (Some(_), _) => return Err("--host takes no host address".to_string()),
        (None, [host, port]) => {
            if difficulty.is_some() || rounds.is_some() {
                return Err("only the host chooses difficulty and rounds".to_string());
            }
            Mode::Challenger {
                host: host.clone(),
                port: parse_port(port)?,
            }
        }
        (None, []) => return Err("expected --host <port> or <host-address> <port>".to_string()),
        (None, _) => return Err("expected exactly <host-address> <port>".to_string()),
    };

    Ok(Command::Play { mode, debug })
}

fn parse_port(s: &str) -> Result<u16, String> {
    match s.parse::<u16>() {
        Ok(port) if port != 0 => Ok(port),
        _ => Err(format!("invalid port: {}", s)),
    }
}

fn print_usage(program: &str) {
    println!("LanPong - Two-player terminal pong over UDP");
    println!();
    println!("Usage:");
    println!(
        "  {} --host <port> [--difficulty <d>] [--rounds <n>]   # Host a game",
        program
    );
    println!(
        "  {} <host-address> <port>                             # Join a hosted game",
        program
    );
    println!();
    println!("Options:");
    println!("  --difficulty, -d   easy, medium or hard (prompted if omitted)");
    println!("  --rounds, -r       points to play, 1-{} (prompted if omitted)", network::protocol::MAX_ROUNDS);
    println!("  --debug            write a debug log to {}", debug::LOG_FILE_PATH);
    println!("  --help, -h         show this message");
    println!();
    println!("Controls: W/S or Up/Down to move, Q to quit (see the config file to rebind)");
    println!("Config:   {}", config::get_config_path().display());
}

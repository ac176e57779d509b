//! TCP front end and the engine actor.
//!
//! One task owns the [`Engine`] and applies commands and countdown ticks in
//! arrival order. Every connection gets a reader task that turns frames into
//! commands and a writer task that drains the client's outbox onto the
//! socket.

use std::fmt;
use std::net::SocketAddr;

use anyhow::{anyhow, bail};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration};

use crate::common::ClientId;
use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::protocol::{ClientIntent, Message, ServerEvent, PROTOCOL_VERSION};
use crate::registry::Outbox;
use crate::stats::{StatsBroadcaster, StatsSnapshot};
use crate::timer::{TimerEvent, TokioTimers};
use crate::transport::tcp::{is_closed, is_recoverable, read_frame, write_frame};

/// How long a fresh connection may take to send its handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Requests to the engine actor.
#[derive(Debug)]
pub enum Command {
    Connect {
        outbox: Outbox,
        reply: oneshot::Sender<ClientId>,
    },
    Intent {
        client: ClientId,
        intent: ClientIntent,
    },
    Disconnect {
        client: ClientId,
    },
}

/// Cloneable entry point into a running engine actor.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    commands: mpsc::UnboundedSender<Command>,
}

impl EngineHandle {
    pub async fn connect(&self, outbox: Outbox) -> anyhow::Result<ClientId> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(Command::Connect { outbox, reply })
            .map_err(|_| anyhow!("engine stopped"))?;
        rx.await.map_err(|_| anyhow!("engine stopped"))
    }

    pub fn intent(&self, client: ClientId, intent: ClientIntent) -> anyhow::Result<()> {
        self.commands
            .send(Command::Intent { client, intent })
            .map_err(|_| anyhow!("engine stopped"))
    }

    pub fn disconnect(&self, client: ClientId) {
        if self.commands.send(Command::Disconnect { client }).is_err() {
            log::debug!("engine stopped before {} disconnected", client);
        }
    }
}

/// Start the engine actor on the current runtime.
pub fn spawn_engine(
    config: EngineConfig,
) -> (EngineHandle, watch::Receiver<StatsSnapshot>, JoinHandle<()>) {
    let (timers, ticks) = TokioTimers::channel();
    let engine = Engine::new(config, timers);
    let stats = StatsBroadcaster::new();
    let observer = stats.subscribe();
    let (tx, rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_engine(engine, rx, ticks, stats));
    (EngineHandle { commands: tx }, observer, task)
}

/// Apply commands and countdown ticks one at a time until every handle is
/// dropped, publishing a fresh snapshot after each change.
pub async fn run_engine(
    mut engine: Engine<TokioTimers>,
    mut commands: mpsc::UnboundedReceiver<Command>,
    mut ticks: mpsc::UnboundedReceiver<TimerEvent>,
    stats: StatsBroadcaster,
) {
    stats.publish(engine.stats());
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(command) => apply(&mut engine, command),
                None => break,
            },
            Some(tick) = ticks.recv() => engine.on_timer(tick),
        }
        stats.publish(engine.stats());
    }
    log::info!("engine stopped");
}

fn apply(engine: &mut Engine<TokioTimers>, command: Command) {
    match command {
        Command::Connect { outbox, reply } => {
            let id = engine.connect(outbox);
            if reply.send(id).is_err() {
                // connection task is gone already
                engine.disconnect(id);
            }
        }
        Command::Intent { client, intent } => engine.handle(client, intent),
        Command::Disconnect { client } => engine.disconnect(client),
    }
}

/// Accept connections forever.
pub async fn serve(listener: TcpListener, engine: EngineHandle) -> anyhow::Result<()> {
    log::info!("listening on {}", listener.local_addr()?);
    loop {
        let (stream, addr) = listener.accept().await?;
        let engine = engine.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, addr, engine).await {
                log::warn!("{}: {}", addr, e);
            }
        });
    }
}

async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    engine: EngineHandle,
) -> anyhow::Result<()> {
    stream.set_nodelay(true)?;
    let (reader, writer) = stream.into_split();
    serve_client(reader, writer, addr, engine).await
}

/// Run one client over an already established byte stream: handshake, then
/// forward intents until the peer goes away. The client is always
/// disconnected from the engine once it was registered.
pub async fn serve_client<R, W>(
    mut reader: R,
    mut writer: W,
    peer: impl fmt::Display,
    engine: EngineHandle,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let hello = timeout(HANDSHAKE_TIMEOUT, read_frame(&mut reader))
        .await
        .map_err(|_| anyhow!("handshake timeout"))??;
    match hello {
        Message::Handshake { version } if version == PROTOCOL_VERSION => {}
        Message::Handshake { version } => bail!(
            "protocol version mismatch: client {}, server {}",
            version,
            PROTOCOL_VERSION
        ),
        other => bail!("expected handshake, got {:?}", other),
    }

    let (outbox, inbox) = mpsc::unbounded_channel::<ServerEvent>();
    let client = engine.connect(outbox).await?;
    log::debug!("{} is {}", peer, client);
    let result = run_client(client, &mut reader, writer, inbox, &engine).await;
    engine.disconnect(client);
    result
}

async fn run_client<R, W>(
    client: ClientId,
    reader: &mut R,
    mut writer: W,
    mut inbox: mpsc::UnboundedReceiver<ServerEvent>,
    engine: &EngineHandle,
) -> anyhow::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    write_frame(
        &mut writer,
        &Message::HandshakeAck {
            version: PROTOCOL_VERSION,
            client_id: client,
        },
    )
    .await?;

    // Ends once the engine drops the client's outbox.
    tokio::spawn(async move {
        while let Some(event) = inbox.recv().await {
            if let Err(e) = write_frame(&mut writer, &Message::Event(event)).await {
                log::debug!("{}: write failed: {}", client, e);
                break;
            }
        }
    });

    loop {
        match read_frame(reader).await {
            Ok(Message::Intent(intent)) => engine.intent(client, intent)?,
            Ok(other) => log::debug!("{}: ignoring unexpected {:?}", client, other),
            Err(e) if is_closed(&e) => return Ok(()),
            Err(e) if is_recoverable(&e) => log::warn!("{}: {}", client, e),
            Err(e) => return Err(e),
        }
    }
}

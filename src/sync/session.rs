//! Session driver: one task per local player that ticks the engine and
//! serves commands from its handle. Room I/O runs on a separate worker task.

use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::game::{
    EngineConfig, EntityRegistry, GameEvent, GameSnapshot, GameState, PlacementError,
    SimulationEngine, Surface, Tower, TowerKind, TowerStats,
};
use crate::room::{RoomDirectory, RoomError};
use crate::store::{ActivityEntry, ActivityKind, ActivityLog, KvStore};
use crate::util::time::{
    frame_duration, SimClock, DEFAULT_FRAME_RATE, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_STORE_TIMEOUT_MS,
};

use super::coordinator::{MultiplayerView, TurnCoordinator, TurnPhase};
use super::worker::{RoomWorker, SyncEvent, SyncRequest, SyncStatus};

/// Errors returned to `SessionHandle` callers
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Placement(#[from] PlacementError),

    #[error("not your turn")]
    NotYourTurn,

    #[error("room error: {0}")]
    Room(RoomError),

    #[error("session closed")]
    SessionClosed,
}

impl From<RoomError> for CommandError {
    fn from(e: RoomError) -> Self {
        match e {
            RoomError::NotYourTurn => CommandError::NotYourTurn,
            other => CommandError::Room(other),
        }
    }
}

pub(crate) type Reply<T> = oneshot::Sender<Result<T, CommandError>>;

/// Commands accepted by a running session
#[derive(Debug)]
pub enum SessionCommand {
    Start,
    Pause,
    Resume,
    TogglePause,
    Reset,
    Resize(Surface),
    PlaceTower {
        x: f32,
        y: f32,
        kind: TowerKind,
        reply: Reply<Tower>,
    },
    CreateRoom {
        player_name: String,
        reply: Reply<String>,
    },
    JoinRoom {
        room_id: String,
        player_name: String,
        reply: Reply<()>,
    },
    SetReady {
        ready: bool,
        reply: Reply<()>,
    },
    StartMultiplayer {
        reply: Reply<bool>,
    },
    EndTurn {
        reply: Reply<()>,
    },
    LeaveRoom,
    Stop,
}

/// What the renderer needs after each tick
#[derive(Debug, Clone, Default)]
pub struct Frame {
    /// Frame counter, increases by one per published frame
    pub number: u64,
    pub state: GameState,
    pub registry: EntityRegistry,
    pub events: Vec<GameEvent>,
    pub phase: Option<TurnPhase>,
    pub multiplayer: MultiplayerView,
}

/// Timing of the session loops
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    pub frame_interval: Duration,
    pub poll_interval: Duration,
    /// Upper bound on one room operation or poll round-trip
    pub store_timeout: Duration,
}

impl SessionConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            frame_interval: frame_duration(config.frame_rate),
            poll_interval: Duration::from_millis(config.poll_interval_ms),
            store_timeout: Duration::from_millis(config.store_timeout_ms),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            frame_interval: frame_duration(DEFAULT_FRAME_RATE),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            store_timeout: Duration::from_millis(DEFAULT_STORE_TIMEOUT_MS),
        }
    }
}

/// Handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<SessionCommand>,
    frame_tx: broadcast::Sender<Frame>,
    latest: Arc<RwLock<Frame>>,
}

impl SessionHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.frame_tx.subscribe()
    }

    pub fn latest_frame(&self) -> Frame {
        self.latest.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }

    async fn send(&self, command: SessionCommand) -> Result<(), CommandError> {
        self.command_tx
            .send(command)
            .await
            .map_err(|_| CommandError::SessionClosed)
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(Reply<T>) -> SessionCommand,
    ) -> Result<T, CommandError> {
        let (reply, rx) = oneshot::channel();
        self.send(command(reply)).await?;
        rx.await.map_err(|_| CommandError::SessionClosed)?
    }

    pub async fn start(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::Start).await
    }

    pub async fn pause(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::Pause).await
    }

    pub async fn resume(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::Resume).await
    }

    pub async fn toggle_pause(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::TogglePause).await
    }

    pub async fn reset(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::Reset).await
    }

    pub async fn resize(&self, surface: Surface) -> Result<(), CommandError> {
        self.send(SessionCommand::Resize(surface)).await
    }

    pub async fn place_tower(&self, x: f32, y: f32, kind: TowerKind) -> Result<Tower, CommandError> {
        self.request(|reply| SessionCommand::PlaceTower { x, y, kind, reply })
            .await
    }

    /// Create a room and return its id
    pub async fn create_room(&self, player_name: &str) -> Result<String, CommandError> {
        let player_name = player_name.to_string();
        self.request(|reply| SessionCommand::CreateRoom { player_name, reply })
            .await
    }

    pub async fn join_room(&self, room_id: &str, player_name: &str) -> Result<(), CommandError> {
        let room_id = room_id.to_string();
        let player_name = player_name.to_string();
        self.request(|reply| SessionCommand::JoinRoom {
            room_id,
            player_name,
            reply,
        })
        .await
    }

    pub async fn set_ready(&self, ready: bool) -> Result<(), CommandError> {
        self.request(|reply| SessionCommand::SetReady { ready, reply })
            .await
    }

    /// Start the multiplayer game from the lobby. Returns whether it started.
    pub async fn start_multiplayer(&self) -> Result<bool, CommandError> {
        self.request(|reply| SessionCommand::StartMultiplayer { reply })
            .await
    }

    pub async fn end_turn(&self) -> Result<(), CommandError> {
        self.request(|reply| SessionCommand::EndTurn { reply }).await
    }

    pub async fn leave_room(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::LeaveRoom).await
    }

    /// Leave any room and stop the session task
    pub async fn stop(&self) -> Result<(), CommandError> {
        self.send(SessionCommand::Stop).await
    }
}


/// A local game session (owned by its task)
pub struct Session {
    engine: SimulationEngine,
    command_rx: mpsc::Receiver<SessionCommand>,
    room_tx: mpsc::UnboundedSender<SyncRequest>,
    sync_rx: mpsc::UnboundedReceiver<SyncEvent>,
    status: watch::Receiver<SyncStatus>,
    snapshot_tx: watch::Sender<GameSnapshot>,
    activity_tx: mpsc::UnboundedSender<ActivityEntry>,
    frame_tx: broadcast::Sender<Frame>,
    latest: Arc<RwLock<Frame>>,
    config: SessionConfig,
    clock: SimClock,
    frame_number: u64,
    /// Set between `EndTurn` and the worker's answer; the engine stays still
    handing_over: bool,
}

impl Session {
    /// Build a session and start its room worker and activity writer.
    /// Must be called from within a tokio runtime.
    pub fn new<S: KvStore>(
        engine: EngineConfig,
        store: S,
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let (command_tx, command_rx) = mpsc::channel(64);
        let (frame_tx, _) = broadcast::channel(64);
        let latest = Arc::new(RwLock::new(Frame::default()));

        let handle = SessionHandle {
            command_tx,
            frame_tx: frame_tx.clone(),
            latest: latest.clone(),
        };

        let engine = SimulationEngine::new(engine);
        let link = RoomWorker::spawn(
            TurnCoordinator::new(RoomDirectory::new(store.clone())),
            engine.snapshot(),
            config.poll_interval,
            config.store_timeout,
        );

        let mut session = Self {
            engine,
            command_rx,
            room_tx: link.requests,
            sync_rx: link.events,
            status: link.status,
            snapshot_tx: link.snapshot,
            activity_tx: ActivityLog::new(store).spawn_writer(),
            frame_tx,
            latest,
            config,
            clock: SimClock::new(),
            frame_number: 0,
            handing_over: false,
        };
        session.publish_frame(Vec::new());

        (session, handle)
    }

    /// Create a session and run it on its own task
    pub fn spawn<S: KvStore>(engine: EngineConfig, store: S, config: SessionConfig) -> SessionHandle {
        let (session, handle) = Self::new(engine, store, config);
        tokio::spawn(session.run());
        handle
    }

    /// Run until `Stop` or until every handle is dropped. Dropping the session
    /// tells the room worker to leave the room.
    pub async fn run(mut self) {
        info!("Session started");

        let mut frame_interval = interval(self.config.frame_interval);
        frame_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = frame_interval.tick() => self.on_frame(),
                Some(event) = self.sync_rx.recv() => self.on_sync_event(event),
                Ok(()) = self.status.changed() => self.on_status_changed(),
                command = self.command_rx.recv() => {
                    let Some(command) = command else { break };
                    if self.handle_command(command).is_break() {
                        break;
                    }
                }
            }
        }

        info!(score = self.engine.state().score, "Session stopped");
    }

    /// Single-player or our own turn
    fn is_driving(&self) -> bool {
        !self.handing_over
            && matches!(
                self.status.borrow().phase,
                TurnPhase::Idle | TurnPhase::MyTurn
            )
    }

    fn on_frame(&mut self) {
        if !self.is_driving() {
            return;
        }

        let events = self.engine.tick(self.clock.now_ms());
        for event in &events {
            self.record_event(event);
        }
        self.publish_frame(events);
    }

    fn on_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Apply(snapshot) => {
                self.engine.apply_snapshot(&snapshot);
                self.publish_frame(Vec::new());
            }
            SyncEvent::Ended => self.publish_frame(Vec::new()),
            SyncEvent::GameStarted { result, reply } => {
                if let Ok(true) = result {
                    self.engine.reset();
                    if let Some(event) = self.engine.start() {
                        self.record_event(&event);
                    }
                }
                self.publish_frame(Vec::new());
                let _ = reply.send(result);
            }
            SyncEvent::TurnEnded { result, reply } => {
                self.handing_over = false;
                self.publish_frame(Vec::new());
                let _ = reply.send(result);
            }
        }
    }

    fn on_status_changed(&mut self) {
        // Snapshots pulled by the same poll are applied before the phase change
        while let Ok(event) = self.sync_rx.try_recv() {
            self.on_sync_event(event);
        }

        let my_turn = self.status.borrow().phase == TurnPhase::MyTurn;
        if my_turn && !self.engine.state().is_playing {
            if let Some(event) = self.engine.start() {
                debug!("Turn received, resuming simulation");
                self.record_event(&event);
            }
        }
        self.publish_frame(Vec::new());
    }

    fn handle_command(&mut self, command: SessionCommand) -> ControlFlow<()> {
        match command {
            SessionCommand::Start => {
                if self.is_driving() {
                    if let Some(event) = self.engine.start() {
                        self.record_event(&event);
                    }
                }
            }
            SessionCommand::Pause => self.engine.pause(),
            SessionCommand::Resume => self.engine.resume(),
            SessionCommand::TogglePause => self.engine.toggle_pause(),
            SessionCommand::Reset => {
                if self.is_driving() {
                    let event = self.engine.reset();
                    self.record_event(&event);
                }
            }
            SessionCommand::Resize(surface) => self.engine.set_surface(surface),
            SessionCommand::PlaceTower { x, y, kind, reply } => {
                let result = self.place_tower(x, y, kind);
                self.publish_frame(Vec::new());
                let _ = reply.send(result);
                return ControlFlow::Continue(());
            }
            SessionCommand::CreateRoom { player_name, reply } => {
                self.forward(SyncRequest::CreateRoom { player_name, reply });
            }
            SessionCommand::JoinRoom {
                room_id,
                player_name,
                reply,
            } => {
                self.forward(SyncRequest::JoinRoom {
                    room_id,
                    player_name,
                    reply,
                });
            }
            SessionCommand::SetReady { ready, reply } => {
                self.forward(SyncRequest::SetReady { ready, reply });
            }
            SessionCommand::StartMultiplayer { reply } => {
                self.forward(SyncRequest::StartGame { reply });
            }
            SessionCommand::EndTurn { reply } => {
                self.handing_over = true;
                let snapshot = self.engine.snapshot();
                self.forward(SyncRequest::EndTurn { snapshot, reply });
            }
            SessionCommand::LeaveRoom => self.forward(SyncRequest::LeaveRoom),
            SessionCommand::Stop => return ControlFlow::Break(()),
        }

        self.publish_frame(Vec::new());
        ControlFlow::Continue(())
    }

    /// Hand a room operation to the worker. A dropped reply reaches the
    /// caller as `SessionClosed`.
    fn forward(&mut self, request: SyncRequest) {
        if self.room_tx.send(request).is_err() {
            warn!("Room worker is gone");
            self.handing_over = false;
        }
    }

    fn place_tower(&mut self, x: f32, y: f32, kind: TowerKind) -> Result<Tower, CommandError> {
        if !self.is_driving() {
            return Err(CommandError::NotYourTurn);
        }

        let (tower, event) = self.engine.place_tower(x, y, kind)?;
        self.record_event(&event);
        Ok(tower)
    }

    fn publish_frame(&mut self, events: Vec<GameEvent>) {
        let status = self.status.borrow().clone();
        if status.multiplayer {
            self.snapshot_tx.send_replace(self.engine.snapshot());
        }

        self.frame_number += 1;
        let frame = Frame {
            number: self.frame_number,
            state: self.engine.state().clone(),
            registry: self.engine.registry().clone(),
            events,
            phase: status.multiplayer.then_some(status.phase),
            multiplayer: status.view,
        };

        *self.latest.write() = frame.clone();
        // No subscribers is fine
        let _ = self.frame_tx.send(frame);
    }

    /// Queue notable events for the shared activity feed without blocking
    fn record_event(&self, event: &GameEvent) {
        let entry = match event {
            GameEvent::Started => ActivityEntry::now(ActivityKind::System, "Defense system activated"),
            GameEvent::Reset => ActivityEntry::now(
                ActivityKind::System,
                "Defense system reset - New path generated",
            ),
            GameEvent::TowerPlaced { kind, .. } => ActivityEntry::now(
                ActivityKind::Defense,
                format!("{} deployed", TowerStats::for_kind(*kind).name),
            ),
            GameEvent::WaveComplete { wave, .. } => {
                ActivityEntry::now(ActivityKind::Wave, format!("Wave {} completed", wave))
            }
            GameEvent::GameOver { score } => ActivityEntry::now(
                ActivityKind::Alert,
                format!("Nexus compromised - Score: {}", score),
            ),
            GameEvent::ShotFired { .. } | GameEvent::EnemyDestroyed { .. } => return,
        };

        if self.activity_tx.send(entry).is_err() {
            warn!("Activity writer is gone");
        }
    }
}

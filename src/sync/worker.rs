//! Room worker: owns the turn coordinator and performs every store
//! round-trip, so the simulation task never waits on the store.

use std::future::Future;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{interval, timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::game::GameSnapshot;
use crate::room::RoomError;
use crate::store::{KvStore, StoreError};

use super::coordinator::{MultiplayerView, SyncAction, TurnCoordinator, TurnPhase};
use super::session::{CommandError, Reply};

/// Room operations requested by the session
pub(crate) enum SyncRequest {
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
    StartGame {
        reply: Reply<bool>,
    },
    EndTurn {
        snapshot: GameSnapshot,
        reply: Reply<()>,
    },
    LeaveRoom,
}

/// Results the session has to act on before the caller hears back
pub(crate) enum SyncEvent {
    Apply(GameSnapshot),
    Ended,
    GameStarted {
        result: Result<bool, CommandError>,
        reply: Reply<bool>,
    },
    TurnEnded {
        result: Result<(), CommandError>,
        reply: Reply<()>,
    },
}

/// Turn state as last seen by the worker
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SyncStatus {
    pub multiplayer: bool,
    pub phase: TurnPhase,
    pub view: MultiplayerView,
}

impl SyncStatus {
    fn of<S: KvStore>(coordinator: &TurnCoordinator<S>) -> Self {
        Self {
            multiplayer: coordinator.is_multiplayer(),
            phase: coordinator.phase(),
            view: coordinator.view().clone(),
        }
    }
}

/// Channel ends kept by the session
pub(crate) struct WorkerLink {
    pub requests: mpsc::UnboundedSender<SyncRequest>,
    pub events: mpsc::UnboundedReceiver<SyncEvent>,
    pub status: watch::Receiver<SyncStatus>,
    pub snapshot: watch::Sender<GameSnapshot>,
}

pub(crate) struct RoomWorker<S> {
    coordinator: TurnCoordinator<S>,
    requests: mpsc::UnboundedReceiver<SyncRequest>,
    events: mpsc::UnboundedSender<SyncEvent>,
    status: watch::Sender<SyncStatus>,
    snapshot: watch::Receiver<GameSnapshot>,
    poll_interval: Duration,
    store_timeout: Duration,
}

impl<S: KvStore> RoomWorker<S> {
    /// Spawn the worker. It runs until the session drops its request sender.
    pub(crate) fn spawn(
        coordinator: TurnCoordinator<S>,
        initial: GameSnapshot,
        poll_interval: Duration,
        store_timeout: Duration,
    ) -> WorkerLink {
        let (request_tx, requests) = mpsc::unbounded_channel();
        let (events, event_rx) = mpsc::unbounded_channel();
        let (status, status_rx) = watch::channel(SyncStatus::of(&coordinator));
        let (snapshot_tx, snapshot) = watch::channel(initial);

        let worker = Self {
            coordinator,
            requests,
            events,
            status,
            snapshot,
            poll_interval,
            store_timeout,
        };
        tokio::spawn(worker.run());

        WorkerLink {
            requests: request_tx,
            events: event_rx,
            status: status_rx,
            snapshot: snapshot_tx,
        }
    }

    async fn run(mut self) {
        let mut poll_interval = interval(self.poll_interval);
        poll_interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = poll_interval.tick() => self.on_poll().await,
                request = self.requests.recv() => match request {
                    Some(request) => self.handle(request).await,
                    None => break,
                },
            }
        }

        self.leave().await;
        debug!("Room worker stopped");
    }

    async fn on_poll(&mut self) {
        if !self.coordinator.is_multiplayer() {
            return;
        }

        if timeout(self.store_timeout, self.sync_once()).await.is_err() {
            warn!(timeout = ?self.store_timeout, "Room sync timed out");
        }
        self.push_status();
    }

    /// Publish our state if we own the turn, then pull the opponent's
    async fn sync_once(&mut self) {
        if self.coordinator.is_my_turn() {
            let snapshot = self.snapshot.borrow().clone();
            let game_over = snapshot.state.game_over;
            match self.coordinator.publish(snapshot).await {
                Ok(_) if game_over => self.coordinator.enter_game_over(),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Snapshot publish failed"),
            }
        }

        match self.coordinator.poll().await {
            SyncAction::Apply(snapshot) => self.emit(SyncEvent::Apply(snapshot)),
            SyncAction::Ended => {
                info!("Opponent closed the room, back to single-player");
                self.emit(SyncEvent::Ended);
            }
            SyncAction::None => {}
        }
    }

    async fn handle(&mut self, request: SyncRequest) {
        let limit = self.store_timeout;

        match request {
            SyncRequest::CreateRoom { player_name, reply } => {
                let result = bounded(limit, self.coordinator.create_room(&player_name)).await;
                self.push_status();
                let _ = reply.send(result);
            }
            SyncRequest::JoinRoom {
                room_id,
                player_name,
                reply,
            } => {
                let result = bounded(limit, self.coordinator.join_room(&room_id, &player_name)).await;
                self.push_status();
                let _ = reply.send(result);
            }
            SyncRequest::SetReady { ready, reply } => {
                let result = bounded(limit, self.coordinator.set_ready(ready)).await;
                self.push_status();
                let _ = reply.send(result);
            }
            SyncRequest::StartGame { reply } => {
                let result = bounded(limit, self.coordinator.start_game()).await;
                self.push_status();
                self.emit(SyncEvent::GameStarted { result, reply });
            }
            SyncRequest::EndTurn { snapshot, reply } => {
                let result = bounded(limit, self.coordinator.end_turn(snapshot)).await;
                self.push_status();
                self.emit(SyncEvent::TurnEnded { result, reply });
            }
            SyncRequest::LeaveRoom => {
                self.leave().await;
                self.push_status();
            }
        }
    }

    async fn leave(&mut self) {
        if !self.coordinator.is_multiplayer() {
            return;
        }
        if timeout(self.store_timeout, self.coordinator.leave_room()).await.is_err() {
            warn!(timeout = ?self.store_timeout, "Leaving room timed out, dropping it locally");
            self.coordinator.reset();
        }
    }

    fn emit(&self, event: SyncEvent) {
        // The session is gone when this fails; nothing left to notify
        let _ = self.events.send(event);
    }

    fn push_status(&self) {
        let status = SyncStatus::of(&self.coordinator);
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

async fn bounded<T>(
    limit: Duration,
    operation: impl Future<Output = Result<T, RoomError>>,
) -> Result<T, CommandError> {
    match timeout(limit, operation).await {
        Ok(result) => result.map_err(CommandError::from),
        Err(_) => Err(CommandError::from(RoomError::from(StoreError::Timeout(limit)))),
    }
}

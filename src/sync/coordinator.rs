//! Turn & sync coordinator: the local view of a two-player room

use tracing::{debug, info, warn};

use crate::game::GameSnapshot;
use crate::room::{Membership, PlayerId, RoomDirectory, RoomError};
use crate::store::KvStore;

/// Where the local player stands in the multiplayer flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    /// Not in a room (single-player)
    Idle,
    /// In a room, game not started
    Lobby,
    /// Local player drives the simulation
    MyTurn,
    /// Opponent drives; local side only applies their snapshots
    OpponentTurn,
    GameOver,
}

/// What the caller should do after a poll
#[derive(Debug, Clone, PartialEq)]
pub enum SyncAction {
    None,
    /// Replace the local registry with this snapshot
    Apply(GameSnapshot),
    /// The room is gone; the local session is back to single-player
    Ended,
}

/// Local mirror of the room as last seen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiplayerView {
    pub room_id: Option<String>,
    pub player_id: Option<PlayerId>,
    pub player_name: String,
    pub opponent_name: Option<String>,
    pub is_host: bool,
    pub ready: bool,
    pub opponent_ready: bool,
    pub game_started: bool,
    pub current_turn: Option<PlayerId>,
}

/// Drives the turn state machine against the room record.
///
/// Snapshots carry a sequence number; the coordinator only hands out
/// snapshots newer than the last one it published or applied.
pub struct TurnCoordinator<S> {
    directory: RoomDirectory<S>,
    membership: Option<Membership>,
    view: MultiplayerView,
    phase: TurnPhase,
    last_seq: u64,
}

impl<S: KvStore> TurnCoordinator<S> {
    pub fn new(directory: RoomDirectory<S>) -> Self {
        Self {
            directory,
            membership: None,
            view: MultiplayerView::default(),
            phase: TurnPhase::Idle,
            last_seq: 0,
        }
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn view(&self) -> &MultiplayerView {
        &self.view
    }

    pub fn membership(&self) -> Option<&Membership> {
        self.membership.as_ref()
    }

    pub fn directory(&self) -> &RoomDirectory<S> {
        &self.directory
    }

    pub fn is_multiplayer(&self) -> bool {
        self.membership.is_some()
    }

    pub fn is_my_turn(&self) -> bool {
        self.phase == TurnPhase::MyTurn
    }

    /// Forget the room locally without touching the store
    pub(crate) fn reset(&mut self) {
        self.membership = None;
        self.view = MultiplayerView::default();
        self.phase = TurnPhase::Idle;
        self.last_seq = 0;
    }

    fn enter_room(&mut self, member: Membership) {
        self.view = MultiplayerView {
            room_id: Some(member.room_id.clone()),
            player_id: Some(member.player_id),
            player_name: member.player_name.clone(),
            is_host: member.is_host(),
            ..MultiplayerView::default()
        };
        self.membership = Some(member);
        self.phase = TurnPhase::Lobby;
        self.last_seq = 0;
    }

    /// Create a room and wait in its lobby as host. Returns the room id.
    pub async fn create_room(&mut self, player_name: &str) -> Result<String, RoomError> {
        let member = self.directory.create_room(player_name).await?;
        let room_id = member.room_id.clone();
        self.enter_room(member);
        self.view.current_turn = self.view.player_id;
        Ok(room_id)
    }

    /// Join a room as guest and wait in its lobby
    pub async fn join_room(&mut self, room_id: &str, player_name: &str) -> Result<(), RoomError> {
        let member = self.directory.join_room(room_id, player_name).await?;
        self.enter_room(member);

        if let Some(room) = self.directory.fetch(room_id).await? {
            self.view.opponent_name = Some(room.host.name.clone());
            self.view.opponent_ready = room.host.ready;
            self.view.current_turn = Some(room.current_turn);
        }
        Ok(())
    }

    /// Leave the room (if any) and return to single-player
    pub async fn leave_room(&mut self) {
        if let Some(member) = &self.membership {
            if let Err(e) = self.directory.leave_room(member).await {
                warn!(room_id = %member.room_id, error = %e, "Failed to leave room cleanly");
            }
        }
        self.reset();
    }

    pub async fn set_ready(&mut self, ready: bool) -> Result<(), RoomError> {
        let Some(member) = &self.membership else {
            return Ok(());
        };
        self.directory.set_ready(member, ready).await?;
        self.view.ready = ready;
        Ok(())
    }

    /// Start the game from the lobby. Host only, and only with a guest seated
    /// and both players ready. Returns whether the game started.
    pub async fn start_game(&mut self) -> Result<bool, RoomError> {
        let Some(member) = &self.membership else {
            return Ok(false);
        };
        if !member.is_host() || self.phase != TurnPhase::Lobby {
            return Ok(false);
        }

        let Some(room) = self.directory.fetch(&member.room_id).await? else {
            return Ok(false);
        };
        if !room.both_ready() {
            debug!(room_id = %member.room_id, "Start refused, players not ready");
            return Ok(false);
        }

        self.directory.start_game(member).await?;
        self.view.game_started = true;
        self.view.current_turn = Some(room.current_turn);
        self.phase = self.turn_phase(room.current_turn);
        info!(room_id = %member.room_id, phase = ?self.phase, "Multiplayer game started");
        Ok(true)
    }

    fn turn_phase(&self, current_turn: PlayerId) -> TurnPhase {
        if self.view.player_id == Some(current_turn) {
            TurnPhase::MyTurn
        } else {
            TurnPhase::OpponentTurn
        }
    }

    /// Publish a snapshot for the opponent. Only while it is our turn.
    /// Returns the sequence number assigned to it.
    pub async fn publish(&mut self, snapshot: GameSnapshot) -> Result<u64, RoomError> {
        let Some(member) = &self.membership else {
            return Err(RoomError::NotYourTurn);
        };
        if self.phase != TurnPhase::MyTurn {
            return Err(RoomError::NotYourTurn);
        }

        let seq = self.last_seq + 1;
        self.directory
            .publish_snapshot(member, snapshot.with_seq(seq))
            .await?;
        self.last_seq = seq;
        Ok(seq)
    }

    /// Publish the final snapshot of our turn and hand the turn over
    pub async fn end_turn(&mut self, snapshot: GameSnapshot) -> Result<(), RoomError> {
        self.publish(snapshot).await?;

        let Some(member) = &self.membership else {
            return Err(RoomError::NotYourTurn);
        };
        let next = self.directory.end_turn(member).await?;
        self.view.current_turn = Some(next);
        self.phase = self.turn_phase(next);
        Ok(())
    }

    /// The local run ended; stop driving and applying
    pub fn enter_game_over(&mut self) {
        if self.is_multiplayer() {
            self.phase = TurnPhase::GameOver;
        }
    }

    /// Pull the room record and reconcile the local view with it.
    ///
    /// Store failures are logged and skipped; the next poll retries.
    pub async fn poll(&mut self) -> SyncAction {
        let Some(member) = &self.membership else {
            return SyncAction::None;
        };

        let room = match self.directory.fetch(&member.room_id).await {
            Ok(Some(room)) => room,
            Ok(None) => {
                if member.is_host() {
                    return SyncAction::None;
                }
                info!(room_id = %member.room_id, "Room closed by host");
                self.reset();
                return SyncAction::Ended;
            }
            Err(e) => {
                warn!(room_id = %member.room_id, error = %e, "Room poll failed");
                return SyncAction::None;
            }
        };

        let opponent = room.opponent_of(member.player_id);
        self.view.opponent_name = opponent.map(|p| p.name.clone());
        self.view.opponent_ready = opponent.is_some_and(|p| p.ready);
        self.view.game_started = room.game_started;
        self.view.current_turn = Some(room.current_turn);

        let was_my_turn = self.phase == TurnPhase::MyTurn;
        match self.phase {
            TurnPhase::Idle | TurnPhase::GameOver => return SyncAction::None,
            TurnPhase::Lobby if !room.game_started => return SyncAction::None,
            _ => self.phase = self.turn_phase(room.current_turn),
        }

        let turn_came_back = self.phase == TurnPhase::MyTurn && !was_my_turn;
        if self.phase == TurnPhase::MyTurn && !turn_came_back {
            return SyncAction::None;
        }

        let Some(snapshot) = room.game_state else {
            return SyncAction::None;
        };
        if snapshot.seq <= self.last_seq {
            return SyncAction::None;
        }

        self.last_seq = snapshot.seq;
        if snapshot.state.game_over {
            self.phase = TurnPhase::GameOver;
        }
        debug!(room_id = %room.room_id, seq = snapshot.seq, phase = ?self.phase, "Pulled snapshot");
        SyncAction::Apply(snapshot)
    }
}

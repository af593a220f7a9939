//! Room directory: create, join and update room records in the shared store

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info, warn};

use super::{room_key, Membership, PlayerId, PlayerSlot, Role, Room, RoomError};
use crate::game::GameSnapshot;
use crate::store::KvStore;

/// Length of generated room ids
pub const ROOM_ID_LEN: usize = 7;

const MAX_ID_ATTEMPTS: usize = 5;

fn generate_room_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ROOM_ID_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// Room operations over a shared store. Every write is a read-modify-write
/// of the whole record; concurrent writers race with last-write-wins.
#[derive(Clone)]
pub struct RoomDirectory<S> {
    store: S,
}

impl<S: KvStore> RoomDirectory<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Read a room record, `None` if it does not exist
    pub async fn fetch(&self, room_id: &str) -> Result<Option<Room>, RoomError> {
        let Some(raw) = self.store.get(&room_key(room_id)).await? else {
            return Ok(None);
        };
        Ok(Some(serde_json::from_str(&raw)?))
    }

    async fn save(&self, room: &mut Room) -> Result<(), RoomError> {
        room.touch();
        let raw = serde_json::to_string(room)?;
        self.store.set(&room_key(&room.room_id), raw).await?;
        Ok(())
    }

    /// Create a room with the caller as host. The host owns the first turn.
    pub async fn create_room(&self, player_name: &str) -> Result<Membership, RoomError> {
        self.create_room_with(player_name, generate_room_id).await
    }

    async fn create_room_with(
        &self,
        player_name: &str,
        mut next_id: impl FnMut() -> String,
    ) -> Result<Membership, RoomError> {
        let mut free_id = None;
        for _ in 0..MAX_ID_ATTEMPTS {
            let candidate = next_id();
            if self.fetch(&candidate).await?.is_none() {
                free_id = Some(candidate);
                break;
            }
            debug!(room_id = %candidate, "Room id taken, rolling another");
        }
        let room_id = free_id.ok_or(RoomError::NoFreeId(MAX_ID_ATTEMPTS))?;

        let host = PlayerSlot::new(player_name);
        let membership = Membership {
            room_id: room_id.clone(),
            player_id: host.id,
            player_name: player_name.to_string(),
            role: Role::Host,
        };

        let mut room = Room::new(room_id, host);
        self.save(&mut room).await?;

        info!(room_id = %membership.room_id, player = %player_name, "Room created");
        Ok(membership)
    }

    /// Take the guest seat of an existing room
    pub async fn join_room(&self, room_id: &str, player_name: &str) -> Result<Membership, RoomError> {
        let mut room = self
            .fetch(room_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(room_id.to_string()))?;

        if room.is_full() {
            return Err(RoomError::Full(room_id.to_string()));
        }

        let guest = PlayerSlot::new(player_name);
        let membership = Membership {
            room_id: room_id.to_string(),
            player_id: guest.id,
            player_name: player_name.to_string(),
            role: Role::Guest,
        };
        room.guest = Some(guest);
        self.save(&mut room).await?;

        info!(room_id = %room_id, player = %player_name, host = %room.host.name, "Joined room");
        Ok(membership)
    }

    /// Host leaving deletes the room; guest leaving frees the seat
    pub async fn leave_room(&self, member: &Membership) -> Result<(), RoomError> {
        if member.is_host() {
            self.store.delete(&room_key(&member.room_id)).await?;
            info!(room_id = %member.room_id, "Host left, room closed");
            return Ok(());
        }

        let Some(mut room) = self.fetch(&member.room_id).await? else {
            return Ok(());
        };
        if room.guest.as_ref().map(|g| g.id) != Some(member.player_id) {
            return Ok(());
        }

        room.guest = None;
        if room.current_turn == member.player_id {
            room.current_turn = room.host.id;
        }
        self.save(&mut room).await?;

        info!(room_id = %member.room_id, player = %member.player_name, "Guest left room");
        Ok(())
    }

    pub async fn set_ready(&self, member: &Membership, ready: bool) -> Result<(), RoomError> {
        let Some(mut room) = self.fetch(&member.room_id).await? else {
            return Ok(());
        };
        let Some(slot) = room.slot_mut(member.player_id) else {
            warn!(room_id = %member.room_id, player_id = %member.player_id, "Not seated in room");
            return Ok(());
        };

        slot.ready = ready;
        self.save(&mut room).await?;
        debug!(room_id = %member.room_id, player = %member.player_name, ready, "Ready flag set");
        Ok(())
    }

    /// Mark the game as started. Only the host may start; anyone else is ignored.
    pub async fn start_game(&self, member: &Membership) -> Result<(), RoomError> {
        if !member.is_host() {
            return Ok(());
        }
        let Some(mut room) = self.fetch(&member.room_id).await? else {
            return Ok(());
        };

        room.game_started = true;
        self.save(&mut room).await?;
        info!(room_id = %member.room_id, "Game started");
        Ok(())
    }

    /// Write the shared snapshot. Only the turn owner may publish.
    pub async fn publish_snapshot(
        &self,
        member: &Membership,
        snapshot: GameSnapshot,
    ) -> Result<(), RoomError> {
        let mut room = self
            .fetch(&member.room_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(member.room_id.clone()))?;

        if !room.is_turn_of(member.player_id) {
            return Err(RoomError::NotYourTurn);
        }

        let seq = snapshot.seq;
        room.game_state = Some(snapshot);
        self.save(&mut room).await?;
        debug!(room_id = %member.room_id, seq, revision = room.revision, "Snapshot published");
        Ok(())
    }

    /// Hand the turn to the other player. Returns who owns the turn afterwards.
    ///
    /// With no guest seated the turn stays with the host.
    pub async fn end_turn(&self, member: &Membership) -> Result<PlayerId, RoomError> {
        let mut room = self
            .fetch(&member.room_id)
            .await?
            .ok_or_else(|| RoomError::NotFound(member.room_id.clone()))?;

        if !room.is_turn_of(member.player_id) {
            return Err(RoomError::NotYourTurn);
        }
        let Some(next) = room.opponent_of(member.player_id).map(|p| p.id) else {
            return Ok(room.current_turn);
        };

        room.current_turn = next;
        self.save(&mut room).await?;
        info!(room_id = %member.room_id, next = %next, "Turn ended");
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{
        Enemy, EnemyKind, EntityRegistry, GameState, PathPattern, Tower, TowerKind, WaveCounters,
    };
    use crate::store::MemoryStore;

    fn snapshot(seq: u64, wave: u32) -> GameSnapshot {
        GameSnapshot {
            seq,
            state: GameState {
                wave,
                ..GameState::default()
            },
            registry: EntityRegistry::new(),
            waves: WaveCounters::default(),
            path: PathPattern::Spiral.path(),
        }
    }

    async fn room_with_guest() -> (RoomDirectory<MemoryStore>, Membership, Membership) {
        let directory = RoomDirectory::new(MemoryStore::new());
        let host = directory.create_room("Ada").await.unwrap();
        let guest = directory.join_room(&host.room_id, "Grace").await.unwrap();
        (directory, host, guest)
    }

    #[test]
    fn room_ids_are_short_lowercase_alphanumeric() {
        for _ in 0..50 {
            let id = generate_room_id();
            assert_eq!(id.len(), ROOM_ID_LEN);
            assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn create_then_fetch() {
        let directory = RoomDirectory::new(MemoryStore::new());
        let host = directory.create_room("Ada").await.unwrap();

        let room = directory.fetch(&host.room_id).await.unwrap().unwrap();
        assert_eq!(room.host.id, host.player_id);
        assert_eq!(room.current_turn, host.player_id);
        assert!(room.guest.is_none());
        assert!(!room.game_started);
        assert_eq!(room.revision, 1);
        assert!(host.is_host());
    }

    #[tokio::test]
    async fn create_gives_up_when_every_id_is_taken() {
        let store = MemoryStore::new();
        let directory = RoomDirectory::new(store.clone());
        let existing = Room::new("taken00".to_string(), PlayerSlot::new("Ada"));
        store
            .set(&room_key("taken00"), serde_json::to_string(&existing).unwrap())
            .await
            .unwrap();

        let err = directory
            .create_room_with("Grace", || "taken00".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, RoomError::NoFreeId(MAX_ID_ATTEMPTS)));

        let kept = directory.fetch("taken00").await.unwrap().unwrap();
        assert_eq!(kept, existing);
    }

    #[tokio::test]
    async fn create_skips_taken_ids() {
        let directory = RoomDirectory::new(MemoryStore::new());
        let first = directory.create_room_with("Ada", || "abc1234".to_string()).await.unwrap();

        let mut ids = ["abc1234", "abc1234", "xyz7890"].into_iter().map(String::from);
        let second = directory
            .create_room_with("Grace", move || ids.next().unwrap_or_default())
            .await
            .unwrap();

        assert_eq!(first.room_id, "abc1234");
        assert_eq!(second.room_id, "xyz7890");
        let room = directory.fetch("abc1234").await.unwrap().unwrap();
        assert_eq!(room.host.name, "Ada");
    }

    #[tokio::test]
    async fn full_room_record_survives_the_store() {
        let (directory, host, guest) = room_with_guest().await;
        directory.set_ready(&host, true).await.unwrap();
        directory.set_ready(&guest, true).await.unwrap();
        directory.start_game(&host).await.unwrap();

        let mut game = snapshot(4, 3);
        game.state.credits = 215;
        game.state.is_playing = true;
        game.registry.towers.push(Tower {
            x: 75.5,
            y: 312.25,
            kind: TowerKind::Plasma,
            level: 1,
            range: 60.0,
            last_shot: Some(1_700_000_000_123),
        });
        game.registry.enemies.push(Enemy {
            x: 140.75,
            y: 200.0,
            kind: EnemyKind::Trojan,
            health: 170,
            max_health: 220,
            speed: 0.5,
            value: 30,
            path_index: 1,
        });
        game.waves = WaveCounters {
            last_spawn_at: 1_700_000_000_456,
            spawned_this_wave: 7,
        };
        directory.publish_snapshot(&host, game).await.unwrap();

        let mut room = directory.fetch(&host.room_id).await.unwrap().unwrap();
        assert!(room.guest.is_some());
        assert!(room.game_state.is_some());
        assert!(room.game_started);

        room.current_turn = guest.player_id;
        directory.save(&mut room).await.unwrap();

        let stored = directory.fetch(&host.room_id).await.unwrap().unwrap();
        assert_eq!(stored, room);
        assert_eq!(stored.revision, 7);
    }

    #[tokio::test]
    async fn join_unknown_room_fails() {
        let directory = RoomDirectory::new(MemoryStore::new());
        let err = directory.join_room("nope123", "Grace").await.unwrap_err();
        assert!(matches!(err, RoomError::NotFound(_)));
    }

    #[tokio::test]
    async fn third_player_is_rejected() {
        let (directory, host, _guest) = room_with_guest().await;
        let err = directory.join_room(&host.room_id, "Linus").await.unwrap_err();
        assert!(matches!(err, RoomError::Full(_)));
    }

    #[tokio::test]
    async fn every_write_bumps_revision() {
        let (directory, host, guest) = room_with_guest().await;
        directory.set_ready(&guest, true).await.unwrap();
        directory.set_ready(&host, true).await.unwrap();

        let room = directory.fetch(&host.room_id).await.unwrap().unwrap();
        assert_eq!(room.revision, 4);
        assert!(room.both_ready());
    }

    #[tokio::test]
    async fn only_host_starts_game() {
        let (directory, host, guest) = room_with_guest().await;

        directory.start_game(&guest).await.unwrap();
        assert!(!directory.fetch(&host.room_id).await.unwrap().unwrap().game_started);

        directory.start_game(&host).await.unwrap();
        assert!(directory.fetch(&host.room_id).await.unwrap().unwrap().game_started);
    }

    #[tokio::test]
    async fn publish_requires_turn_ownership() {
        let (directory, host, guest) = room_with_guest().await;

        let err = directory.publish_snapshot(&guest, snapshot(1, 1)).await.unwrap_err();
        assert!(matches!(err, RoomError::NotYourTurn));

        directory.publish_snapshot(&host, snapshot(1, 2)).await.unwrap();
        let room = directory.fetch(&host.room_id).await.unwrap().unwrap();
        assert_eq!(room.game_state.unwrap().state.wave, 2);
    }

    #[tokio::test]
    async fn end_turn_alternates() {
        let (directory, host, guest) = room_with_guest().await;

        assert_eq!(directory.end_turn(&host).await.unwrap(), guest.player_id);
        assert!(matches!(directory.end_turn(&host).await, Err(RoomError::NotYourTurn)));
        assert_eq!(directory.end_turn(&guest).await.unwrap(), host.player_id);
    }

    #[tokio::test]
    async fn end_turn_alone_keeps_turn() {
        let directory = RoomDirectory::new(MemoryStore::new());
        let host = directory.create_room("Ada").await.unwrap();

        assert_eq!(directory.end_turn(&host).await.unwrap(), host.player_id);
    }

    #[tokio::test]
    async fn host_leaving_deletes_room() {
        let (directory, host, _guest) = room_with_guest().await;
        directory.leave_room(&host).await.unwrap();

        assert!(directory.fetch(&host.room_id).await.unwrap().is_none());
        assert!(directory.store().is_empty());
    }

    #[tokio::test]
    async fn guest_leaving_frees_seat_and_returns_turn() {
        let (directory, host, guest) = room_with_guest().await;
        directory.end_turn(&host).await.unwrap();

        directory.leave_room(&guest).await.unwrap();

        let room = directory.fetch(&host.room_id).await.unwrap().unwrap();
        assert!(room.guest.is_none());
        assert_eq!(room.current_turn, host.player_id);
        directory.join_room(&host.room_id, "Linus").await.unwrap();
    }

    #[tokio::test]
    async fn malformed_record_is_a_codec_error() {
        let store = MemoryStore::new();
        store.set(&room_key("bad0000"), "{".to_string()).await.unwrap();
        let directory = RoomDirectory::new(store);

        assert!(matches!(directory.fetch("bad0000").await, Err(RoomError::Codec(_))));
    }
}

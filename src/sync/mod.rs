//! Multiplayer turn synchronization and the per-player session driver

pub mod coordinator;
pub mod session;
mod worker;

pub use coordinator::{MultiplayerView, SyncAction, TurnCoordinator, TurnPhase};
pub use session::{CommandError, Frame, Session, SessionCommand, SessionConfig, SessionHandle};

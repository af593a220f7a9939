//! Nexus Defense - tower-defense simulation core with turn-based two-player
//! sync over a shared key-value store.
//!
//! - `game`: the per-tick simulation engine and placement rules
//! - `room` and `sync`: room records, the turn coordinator and the session driver
//! - `store`: the key-value store abstraction both peers share
//! - `http`: the service that hosts that store for remote peers

pub mod app;
pub mod config;
pub mod game;
pub mod http;
pub mod room;
pub mod store;
pub mod sync;
pub mod util;

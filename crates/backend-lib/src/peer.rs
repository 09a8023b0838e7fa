// ============================
// crates/backend-lib/src/peer.rs
// ============================
//! Peer routing for targeted signaling and voice presence.
//!
//! Entries are advisory for routing only; a user may be routed in a room
//! before formal membership is recorded, and entries must go away on
//! disconnect or leave regardless of membership state.

use crate::connection::Connection;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct PeerRouter {
    entries: HashMap<String, HashMap<String, Connection>>,
}

impl PeerRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert; last writer wins, which is what a reconnect needs.
    pub fn set(&mut self, room_id: &str, user_id: &str, conn: &Connection) {
        self.entries
            .entry(room_id.to_string())
            .or_default()
            .insert(user_id.to_string(), conn.clone());
    }

    /// Remove one entry; returns whether it existed. Empty room buckets
    /// are pruned.
    pub fn unset(&mut self, room_id: &str, user_id: &str) -> bool {
        let Some(peers) = self.entries.get_mut(room_id) else {
            return false;
        };
        let existed = peers.remove(user_id).is_some();
        if peers.is_empty() {
            self.entries.remove(room_id);
        }
        existed
    }

    /// Remove the user from every room bucket. Disconnect cleanup only.
    pub fn unset_user(&mut self, user_id: &str) {
        self.entries.retain(|_, peers| {
            peers.remove(user_id);
            !peers.is_empty()
        });
    }

    pub fn drop_room(&mut self, room_id: &str) {
        self.entries.remove(room_id);
    }

    pub fn get(&self, room_id: &str, user_id: &str) -> Option<&Connection> {
        self.entries.get(room_id).and_then(|peers| peers.get(user_id))
    }

    pub fn room_known(&self, room_id: &str) -> bool {
        self.entries.contains_key(room_id)
    }
}

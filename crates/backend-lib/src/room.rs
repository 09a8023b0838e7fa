// ============================
// crates/backend-lib/src/room.rs
// ============================
//! Room entities, membership, and capped message history.

use craftchat_common::{ChatMessage, RoomKind, RoomSummary};
use std::collections::HashMap;
use uuid::Uuid;

/// Stored history cap. Oldest entries are evicted first.
pub const HISTORY_CAP: usize = 100;
/// Number of trailing messages returned to a joiner.
pub const JOIN_HISTORY_LIMIT: usize = 50;

#[derive(Debug, Clone)]
pub struct Room {
    pub kind: RoomKind,
    pub name: String,
    members: Vec<String>,
    messages: Vec<ChatMessage>,
}

impl Room {
    /// Member ids in join order.
    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn is_member(&self, user_id: &str) -> bool {
        self.members.iter().any(|m| m == user_id)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent `limit` messages, oldest first.
    pub fn history_tail(&self, limit: usize) -> &[ChatMessage] {
        let start = self.messages.len().saturating_sub(limit);
        &self.messages[start..]
    }
}

/// Owns room entities plus the user→rooms reverse index; the two are only
/// ever mutated together, through the methods below.
#[derive(Debug, Default)]
pub struct RoomStore {
    rooms: HashMap<String, Room>,
    user_rooms: HashMap<String, Vec<String>>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a room with the founder as its only member; returns the
    /// generated room id.
    pub fn create(&mut self, kind: RoomKind, name: &str, founder_id: &str) -> String {
        let room_id = Uuid::new_v4().to_string();
        self.rooms.insert(
            room_id.clone(),
            Room {
                kind,
                name: name.to_string(),
                members: vec![founder_id.to_string()],
                messages: Vec::new(),
            },
        );
        self.index_room_for(founder_id, &room_id);
        room_id
    }

    pub fn get(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    pub fn contains(&self, room_id: &str) -> bool {
        self.rooms.contains_key(room_id)
    }

    /// Idempotently add a member; returns whether the member was newly
    /// added. A missing room is a no-op returning `false`.
    pub fn add_member(&mut self, room_id: &str, user_id: &str) -> bool {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return false;
        };
        if room.is_member(user_id) {
            self.index_room_for(user_id, room_id);
            return false;
        }
        room.members.push(user_id.to_string());
        self.index_room_for(user_id, room_id);
        true
    }

    pub fn remove_member(&mut self, room_id: &str, user_id: &str) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.members.retain(|m| m != user_id);
        }
        if let Some(rooms) = self.user_rooms.get_mut(user_id) {
            rooms.retain(|r| r != room_id);
            if rooms.is_empty() {
                self.user_rooms.remove(user_id);
            }
        }
    }

    /// Append then truncate to the last `HISTORY_CAP` entries.
    pub fn append_message(&mut self, room_id: &str, message: ChatMessage) {
        if let Some(room) = self.rooms.get_mut(room_id) {
            room.messages.push(message);
            if room.messages.len() > HISTORY_CAP {
                let excess = room.messages.len() - HISTORY_CAP;
                room.messages.drain(..excess);
            }
        }
    }

    /// Remove the room entirely, scrubbing it from every user's reverse
    /// index, and return its snapshot. Deleting an absent room is a no-op.
    pub fn delete(&mut self, room_id: &str) -> Option<Room> {
        let room = self.rooms.remove(room_id)?;
        self.user_rooms.retain(|_, rooms| {
            rooms.retain(|r| r != room_id);
            !rooms.is_empty()
        });
        Some(room)
    }

    /// Room ids the user belongs to, in join order.
    pub fn rooms_of(&self, user_id: &str) -> Vec<String> {
        self.user_rooms.get(user_id).cloned().unwrap_or_default()
    }

    /// Summaries of the user's rooms, filtered to rooms that still exist.
    pub fn list_for_user(&self, user_id: &str) -> Vec<RoomSummary> {
        self.rooms_of(user_id)
            .iter()
            .filter_map(|room_id| {
                self.rooms.get(room_id).map(|room| RoomSummary {
                    room_id: room_id.clone(),
                    name: room.name.clone(),
                    kind: room.kind,
                    member_count: room.member_count(),
                })
            })
            .collect()
    }

    fn index_room_for(&mut self, user_id: &str, room_id: &str) {
        let rooms = self.user_rooms.entry(user_id.to_string()).or_default();
        if !rooms.iter().any(|r| r == room_id) {
            rooms.push(room_id.to_string());
        }
    }
}

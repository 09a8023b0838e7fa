// ================
// crates/common/src/lib.rs
// ================
//! Wire protocol shared between the craftchat client and server.
//!
//! Every frame on the event channel is an internally tagged JSON object;
//! the `event` field carries the snake_case event name and the remaining
//! fields are the payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Room kind: a two-party chat or a named group.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomKind {
    Direct,
    Group,
}

/// Invite kind requested by `create_invite`.
///
/// `Friend` produces a direct room, `Group` a named group room.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InviteKind {
    #[default]
    Friend,
    Group,
}

/// Public view of a room member, as embedded in member lists and
/// presence notifications.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub user_id: String,
    pub nickname: String,
    pub avatar: Option<String>,
}

/// A chat message with the author's nickname and avatar snapshotted at
/// send time. Immutable once appended to a room's history.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub id: String,
    pub user_id: String,
    pub nickname: String,
    pub avatar: Option<String>,
    pub content: String,
    /// Opaque type tag ("text", voice markers, ...); not interpreted here.
    #[serde(rename = "type", default = "default_message_kind")]
    pub kind: String,
    /// RFC 3339 timestamp assigned by the server.
    pub timestamp: String,
}

fn default_message_kind() -> String {
    "text".to_string()
}

/// Room summary returned by `get_rooms`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    pub room_id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: RoomKind,
    pub member_count: usize,
}

/// Events sent from client to server.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Bind the sender's connection to an existing identity. Side effect
    /// only; no reply.
    RegisterUser { user_id: String },
    /// Create an invite code. Without `existing_room_id` this also creates
    /// the room; with it, a fresh (or client-supplied) code is issued for
    /// an existing group room.
    CreateInvite {
        user_id: String,
        #[serde(rename = "type", default)]
        kind: InviteKind,
        room_name: Option<String>,
        existing_room_id: Option<String>,
        invite_code: Option<String>,
    },
    /// Join a room through a short invite code or a raw room identifier.
    JoinInvite { user_id: String, code: String },
    SendMessage {
        user_id: String,
        room_id: String,
        content: String,
        #[serde(rename = "type", default = "default_message_kind")]
        kind: String,
    },
    /// WebRTC negotiation payloads, forwarded verbatim to exactly one peer.
    WebrtcOffer {
        room_id: String,
        target_user_id: String,
        from_user_id: String,
        offer: Value,
    },
    WebrtcAnswer {
        room_id: String,
        target_user_id: String,
        from_user_id: String,
        answer: Value,
    },
    WebrtcIceCandidate {
        room_id: String,
        target_user_id: String,
        from_user_id: String,
        candidate: Value,
    },
    DeleteRoom { user_id: String, room_id: String },
    JoinVoiceRoom { user_id: String, room_id: String },
    LeaveVoiceRoom { user_id: String, room_id: String },
    GetRooms { user_id: String },
    /// Validate and share an already-issued invite code for a group room.
    InviteToRoom {
        user_id: String,
        room_id: String,
        invite_code: String,
    },
    GetRoomMembers { room_id: String },
}

/// Events sent from server to client.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ServerEvent {
    InviteCreated {
        code: String,
        room_id: String,
        #[serde(rename = "type")]
        kind: InviteKind,
        room_name: String,
    },
    InviteError { message: String },
    InviteToRoomSuccess {
        room_id: String,
        room_name: String,
        invite_code: String,
        inviter_nickname: String,
    },
    InviteToRoomError { message: String },
    JoinSuccess {
        room_id: String,
        room_name: String,
        room_type: RoomKind,
        members: Vec<MemberInfo>,
        /// Trailing history, capped to the most recent 50 entries.
        messages: Vec<ChatMessage>,
    },
    JoinError { message: String },
    /// Broadcast to the rest of the room when a new member joins.
    UserJoined {
        user_id: String,
        nickname: String,
        avatar: Option<String>,
    },
    NewMessage {
        #[serde(flatten)]
        message: ChatMessage,
    },
    MessageError { message: String },
    /// Targeted relays; `offer`/`answer`/`candidate` are opaque blobs.
    WebrtcOffer {
        from_user_id: String,
        from_nickname: String,
        offer: Value,
    },
    WebrtcAnswer {
        from_user_id: String,
        answer: Value,
    },
    WebrtcIceCandidate {
        from_user_id: String,
        candidate: Value,
    },
    RoomDeleted {
        room_id: String,
        room_name: String,
        initiator_id: String,
        initiator_nickname: String,
    },
    UserJoinedVoice {
        user_id: String,
        nickname: String,
        avatar: Option<String>,
        existing_users: Vec<MemberInfo>,
    },
    VoiceRoomUsers { users: Vec<MemberInfo> },
    UserLeftVoice { user_id: String, nickname: String },
    VoiceError { message: String },
    RoomsList { rooms: Vec<RoomSummary> },
    RoomMembersList {
        room_id: String,
        members: Vec<MemberInfo>,
        member_count: usize,
    },
    /// Broadcast to a room when a member's connection terminates.
    UserLeft { user_id: String, nickname: String },
    /// Reply to a frame that could not be parsed as a `ClientEvent`.
    MalformedEvent { message: String },
}

// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const WS_CONNECTION: &str = "ws.connection";
pub const WS_DISCONNECTION: &str = "ws.disconnection";
pub const WS_ACTIVE: &str = "ws.active";
pub const EVENT_DISPATCHED: &str = "event.dispatched";
pub const EVENT_MALFORMED: &str = "event.malformed";
pub const USER_CREATED: &str = "user.created";
pub const ROOM_CREATED: &str = "room.created";
pub const ROOM_DELETED: &str = "room.deleted";
pub const MESSAGE_APPENDED: &str = "message.appended";
pub const SIGNAL_FORWARDED: &str = "signal.forwarded";
pub const SIGNAL_DROPPED: &str = "signal.dropped";

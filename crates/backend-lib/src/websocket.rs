// ==================
// crates/backend-lib/src/websocket.rs
// ==================
//! WebSocket event handler.
//!
//! Instantiated per connection; routes each parsed [`ClientEvent`] to the
//! coordinator and renders any [`AppError`] as the operation's named error
//! event, sent only to the originating connection. Dispatch is synchronous:
//! the coordinator never blocks on I/O, so a handler call is one lock scope
//! plus non-blocking sends.

use crate::connection::Connection;
use crate::error::AppError;
use crate::signaling::SignalKind;
use crate::AppState;
use craftchat_common::{ClientEvent, ServerEvent};
use std::sync::Arc;

pub struct EventHandler {
    state: Arc<AppState>,
    conn: Connection,
}

impl EventHandler {
    pub fn new(state: Arc<AppState>, conn: Connection) -> Self {
        Self { state, conn }
    }

    /// Main entry point for processing one inbound event.
    pub fn handle_event(&self, event: ClientEvent) {
        let coordinator = &self.state.coordinator;
        match event {
            ClientEvent::RegisterUser { user_id } => {
                coordinator.register_user(&user_id, &self.conn);
            },
            ClientEvent::CreateInvite {
                user_id,
                kind,
                room_name,
                existing_room_id,
                invite_code,
            } => {
                let result = coordinator.create_invite(
                    &user_id,
                    kind,
                    room_name.as_deref(),
                    existing_room_id.as_deref(),
                    invite_code,
                    &self.conn,
                );
                self.report(result, |message| ServerEvent::InviteError { message });
            },
            ClientEvent::JoinInvite { user_id, code } => {
                let result = coordinator.join_invite(&user_id, &code, &self.conn);
                self.report(result, |message| ServerEvent::JoinError { message });
            },
            ClientEvent::SendMessage {
                user_id,
                room_id,
                content,
                kind,
            } => {
                let result = coordinator.send_message(&user_id, &room_id, &content, &kind);
                self.report(result, |message| ServerEvent::MessageError { message });
            },
            ClientEvent::WebrtcOffer {
                room_id,
                target_user_id,
                from_user_id,
                offer,
            } => {
                coordinator.forward_signal(
                    SignalKind::Offer,
                    &room_id,
                    &from_user_id,
                    &target_user_id,
                    offer,
                );
            },
            ClientEvent::WebrtcAnswer {
                room_id,
                target_user_id,
                from_user_id,
                answer,
            } => {
                coordinator.forward_signal(
                    SignalKind::Answer,
                    &room_id,
                    &from_user_id,
                    &target_user_id,
                    answer,
                );
            },
            ClientEvent::WebrtcIceCandidate {
                room_id,
                target_user_id,
                from_user_id,
                candidate,
            } => {
                coordinator.forward_signal(
                    SignalKind::IceCandidate,
                    &room_id,
                    &from_user_id,
                    &target_user_id,
                    candidate,
                );
            },
            ClientEvent::DeleteRoom { user_id, room_id } => {
                coordinator.delete_room(&user_id, &room_id, &self.conn);
            },
            ClientEvent::JoinVoiceRoom { user_id, room_id } => {
                let result = coordinator.join_voice(&user_id, &room_id, &self.conn);
                self.report(result, |message| ServerEvent::VoiceError { message });
            },
            ClientEvent::LeaveVoiceRoom { user_id, room_id } => {
                coordinator.leave_voice(&user_id, &room_id);
            },
            ClientEvent::GetRooms { user_id } => {
                coordinator.get_rooms(&user_id, &self.conn);
            },
            ClientEvent::InviteToRoom {
                user_id,
                room_id,
                invite_code,
            } => {
                let result =
                    coordinator.invite_to_room(&user_id, &room_id, &invite_code, &self.conn);
                self.report(result, |message| ServerEvent::InviteToRoomError { message });
            },
            ClientEvent::GetRoomMembers { room_id } => {
                coordinator.get_room_members(&room_id, &self.conn);
            },
        }
    }

    /// Render an operation failure as its named error event.
    fn report(
        &self,
        result: Result<(), AppError>,
        to_event: impl FnOnce(String) -> ServerEvent,
    ) {
        if let Err(err) = result {
            tracing::debug!(error = %err, code = err.error_code(), "event rejected");
            self.conn.send(to_event(err.to_string()));
        }
    }
}

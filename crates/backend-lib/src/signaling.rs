// ============================
// crates/backend-lib/src/signaling.rs
// ============================
//! WebRTC signaling relay and voice-room presence.
//!
//! Negotiation payloads are opaque blobs forwarded to exactly one peer.
//! Delivery is fire-and-forget: an unroutable target drops the message
//! silently; the transport-layer negotiation protocol owns retries.

use crate::connection::Connection;
use crate::coordinator::{broadcast_to, collect_member_infos, SessionCoordinator};
use crate::error::AppError;
use crate::metrics as keys;
use craftchat_common::{MemberInfo, ServerEvent};
use ::metrics::counter;
use serde_json::Value;

const UNKNOWN_NICKNAME: &str = "Unknown";

/// The three WebRTC negotiation message kinds this relay forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalKind {
    Offer,
    Answer,
    IceCandidate,
}

impl SessionCoordinator {
    /// Forward a negotiation payload to the target peer's connection, if
    /// it is currently routable. Offers are additionally tagged with the
    /// sender's nickname so the callee can render the caller.
    pub fn forward_signal(
        &self,
        kind: SignalKind,
        room_id: &str,
        from_user_id: &str,
        target_user_id: &str,
        payload: Value,
    ) {
        let reg = self.registry.lock();
        let Some(target) = reg.peers.get(room_id, target_user_id) else {
            counter!(keys::SIGNAL_DROPPED).increment(1);
            tracing::debug!(%room_id, %from_user_id, %target_user_id, ?kind, "signal target not routable, dropped");
            return;
        };

        let event = match kind {
            SignalKind::Offer => ServerEvent::WebrtcOffer {
                from_user_id: from_user_id.to_string(),
                from_nickname: reg
                    .identities
                    .nickname(from_user_id)
                    .unwrap_or(UNKNOWN_NICKNAME)
                    .to_string(),
                offer: payload,
            },
            SignalKind::Answer => ServerEvent::WebrtcAnswer {
                from_user_id: from_user_id.to_string(),
                answer: payload,
            },
            SignalKind::IceCandidate => ServerEvent::WebrtcIceCandidate {
                from_user_id: from_user_id.to_string(),
                candidate: payload,
            },
        };
        target.send(event);
        counter!(keys::SIGNAL_FORWARDED).increment(1);
        tracing::debug!(%room_id, %from_user_id, %target_user_id, ?kind, "signal forwarded");
    }

    /// Register a voice participant: route the peer, reply with the other
    /// occupants, and notify the rest of the room.
    pub fn join_voice(
        &self,
        user_id: &str,
        room_id: &str,
        conn: &Connection,
    ) -> Result<(), AppError> {
        let mut reg = self.registry.lock();
        if !reg.rooms.contains(room_id) {
            return Err(AppError::RoomNotFound);
        }
        let Some(joiner) = reg.identities.member_info(user_id) else {
            return Err(AppError::UserNotFound);
        };

        reg.peers.set(room_id, user_id, conn);
        reg.identities.attach_connection(user_id, conn);
        tracing::info!(%user_id, %room_id, "joined voice");

        let others = self.voice_occupants(&reg, room_id, user_id);
        if let Some(room) = reg.rooms.get(room_id) {
            let event = ServerEvent::UserJoinedVoice {
                user_id: joiner.user_id,
                nickname: joiner.nickname,
                avatar: joiner.avatar,
                existing_users: others.clone(),
            };
            broadcast_to(&reg.identities, room.members(), &event, Some(user_id));
        }
        conn.send(ServerEvent::VoiceRoomUsers { users: others });
        Ok(())
    }

    /// Unregister a voice participant and notify the room. A room the
    /// router has never seen is a no-op.
    pub fn leave_voice(&self, user_id: &str, room_id: &str) {
        let mut reg = self.registry.lock();
        if !reg.peers.room_known(room_id) {
            return;
        }
        reg.peers.unset(room_id, user_id);
        tracing::info!(%user_id, %room_id, "left voice");

        let nickname = reg
            .identities
            .nickname(user_id)
            .unwrap_or(UNKNOWN_NICKNAME)
            .to_string();
        let event = ServerEvent::UserLeftVoice {
            user_id: user_id.to_string(),
            nickname,
        };
        if let Some(room) = reg.rooms.get(room_id) {
            broadcast_to(&reg.identities, room.members(), &event, None);
        }
    }

    fn voice_occupants(
        &self,
        reg: &crate::coordinator::Registry,
        room_id: &str,
        except: &str,
    ) -> Vec<MemberInfo> {
        reg.rooms
            .get(room_id)
            .map(|room| {
                collect_member_infos(&reg.identities, room.members())
                    .into_iter()
                    .filter(|info| info.user_id != except)
                    .collect()
            })
            .unwrap_or_default()
    }
}

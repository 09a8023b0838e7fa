// ============================
// crates/backend-lib/src/coordinator.rs
// ============================
//! Cross-store orchestration.
//!
//! Every operation that touches more than one index (join, delete,
//! disconnect cascade) runs under one coarse registry lock, so concurrent
//! connections observe it as atomic: fully applied or not started. No
//! operation awaits or performs I/O while the lock is held; outbound
//! events go through non-blocking [`Connection`] handles.

use crate::connection::Connection;
use crate::error::AppError;
use crate::identity::IdentityStore;
use crate::invite::InviteCodeResolver;
use crate::metrics as keys;
use crate::peer::PeerRouter;
use crate::room::{RoomStore, JOIN_HISTORY_LIMIT};
use crate::validation;
use chrono::Utc;
use craftchat_common::{ChatMessage, InviteKind, MemberInfo, RoomKind, ServerEvent};
use ::metrics::counter;
use parking_lot::Mutex;
use uuid::Uuid;

const DEFAULT_GROUP_NAME: &str = "Group chat";

/// All shared mutable state, guarded as one unit.
#[derive(Default)]
pub(crate) struct Registry {
    pub identities: IdentityStore,
    pub rooms: RoomStore,
    pub invites: InviteCodeResolver,
    pub peers: PeerRouter,
}

/// Orchestrates multi-index operations over the registry.
#[derive(Default)]
pub struct SessionCoordinator {
    pub(crate) registry: Mutex<Registry>,
}

/// Send an event to every listed member with a live connection, except
/// `skip`. Stale member ids simply have no connection and are passed over.
pub(crate) fn broadcast_to(
    identities: &IdentityStore,
    members: &[String],
    event: &ServerEvent,
    skip: Option<&str>,
) {
    for member in members {
        if skip == Some(member.as_str()) {
            continue;
        }
        if let Some(conn) = identities.connection(member) {
            conn.send(event.clone());
        }
    }
}

/// Member list view, filtering out ids with no surviving identity.
pub(crate) fn collect_member_infos(identities: &IdentityStore, members: &[String]) -> Vec<MemberInfo> {
    members
        .iter()
        .filter_map(|member| identities.member_info(member))
        .collect()
}

impl SessionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Session bootstrap: mint an identity. Called from the login surface,
    /// never from the event channel.
    pub fn create_identity(
        &self,
        nickname: &str,
        avatar: Option<String>,
    ) -> Result<(String, String), AppError> {
        let nickname = validation::validate_nickname(nickname)?.to_string();
        let mut reg = self.registry.lock();
        let user_id = reg.identities.create(&nickname, avatar)?;
        counter!(keys::USER_CREATED).increment(1);
        tracing::info!(%user_id, %nickname, "identity created");
        Ok((user_id, nickname))
    }

    /// Bind a connection to an identity. Side effect only; an unknown user
    /// id is ignored, matching the event's fire-and-forget contract.
    pub fn register_user(&self, user_id: &str, conn: &Connection) {
        let mut reg = self.registry.lock();
        if reg.identities.attach_connection(user_id, conn) {
            tracing::debug!(%user_id, "connection registered");
        } else {
            tracing::debug!(%user_id, "register_user for unknown identity ignored");
        }
    }

    /// Issue an invite code, creating a room when no existing room is
    /// addressed. An `existing_room_id` that matches no room falls through
    /// to the new-room path.
    pub fn create_invite(
        &self,
        user_id: &str,
        kind: InviteKind,
        room_name: Option<&str>,
        existing_room_id: Option<&str>,
        invite_code: Option<String>,
        conn: &Connection,
    ) -> Result<(), AppError> {
        let mut reg = self.registry.lock();
        let nickname = reg
            .identities
            .nickname(user_id)
            .ok_or(AppError::UserNotFound)?
            .to_string();

        if let Some(room_id) = existing_room_id {
            if let Some(room) = reg.rooms.get(room_id) {
                if room.kind != RoomKind::Group {
                    return Err(AppError::NotGroupRoom);
                }
                if !room.is_member(user_id) {
                    return Err(AppError::NotRoomMember);
                }
                let room_name = room.name.clone();
                let code = reg.invites.issue(room_id, invite_code);
                tracing::info!(%user_id, %room_id, %code, "invite issued for existing room");
                conn.send(ServerEvent::InviteToRoomSuccess {
                    room_id: room_id.to_string(),
                    room_name,
                    invite_code: code,
                    inviter_nickname: nickname,
                });
                return Ok(());
            }
        }

        let (room_kind, name) = match kind {
            InviteKind::Friend => (RoomKind::Direct, format!("{nickname}'s chat")),
            InviteKind::Group => (
                RoomKind::Group,
                room_name
                    .map(str::trim)
                    .filter(|n| !n.is_empty())
                    .unwrap_or(DEFAULT_GROUP_NAME)
                    .to_string(),
            ),
        };

        let room_id = reg.rooms.create(room_kind, &name, user_id);
        let code = reg.invites.issue(&room_id, None);
        reg.peers.set(&room_id, user_id, conn);
        counter!(keys::ROOM_CREATED).increment(1);
        tracing::info!(%user_id, %room_id, %code, ?room_kind, "room created");

        conn.send(ServerEvent::InviteCreated {
            code,
            room_id,
            kind,
            room_name: name,
        });
        Ok(())
    }

    /// Join through an invite token; dual resolution (short code first,
    /// then raw room identifier). Idempotent for repeat joins.
    pub fn join_invite(&self, user_id: &str, code: &str, conn: &Connection) -> Result<(), AppError> {
        let mut reg = self.registry.lock();
        if !reg.identities.contains(user_id) {
            return Err(AppError::UserNotFound);
        }

        let token = validation::normalize_invite_token(code)?;
        let room_id = reg.invites.resolve(&token).ok_or(AppError::InvalidInviteCode)?;
        if !reg.rooms.contains(&room_id) {
            return Err(AppError::RoomNotFound);
        }

        let is_new = reg.rooms.add_member(&room_id, user_id);
        reg.peers.set(&room_id, user_id, conn);
        reg.identities.attach_connection(user_id, conn);
        tracing::info!(%user_id, %room_id, is_new, "join via invite");

        if is_new {
            if let (Some(info), Some(room)) =
                (reg.identities.member_info(user_id), reg.rooms.get(&room_id))
            {
                let event = ServerEvent::UserJoined {
                    user_id: info.user_id,
                    nickname: info.nickname,
                    avatar: info.avatar,
                };
                broadcast_to(&reg.identities, room.members(), &event, Some(user_id));
            }
        }

        let room = reg.rooms.get(&room_id).ok_or(AppError::RoomNotFound)?;
        conn.send(ServerEvent::JoinSuccess {
            room_id: room_id.clone(),
            room_name: room.name.clone(),
            room_type: room.kind,
            members: collect_member_infos(&reg.identities, room.members()),
            messages: room.history_tail(JOIN_HISTORY_LIMIT).to_vec(),
        });
        Ok(())
    }

    /// Append a message and broadcast it to every member of the room.
    pub fn send_message(
        &self,
        user_id: &str,
        room_id: &str,
        content: &str,
        kind: &str,
    ) -> Result<(), AppError> {
        let mut reg = self.registry.lock();
        let user = reg.identities.lookup(user_id).ok_or(AppError::UserNotFound)?;
        let (nickname, avatar) = (user.nickname.clone(), user.avatar.clone());
        if !reg.rooms.contains(room_id) {
            return Err(AppError::RoomNotFound);
        }
        let content = validation::validate_content(content)?.to_string();

        let message = ChatMessage {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            nickname,
            avatar,
            content,
            kind: kind.to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        reg.rooms.append_message(room_id, message.clone());
        counter!(keys::MESSAGE_APPENDED).increment(1);

        let event = ServerEvent::NewMessage { message };
        if let Some(room) = reg.rooms.get(room_id) {
            broadcast_to(&reg.identities, room.members(), &event, None);
        }
        Ok(())
    }

    /// Delete a room. Idempotent and directionally asymmetric: an absent
    /// room, an unknown requester, or a non-member requester gets a
    /// targeted acknowledgment only (so the client can clear local state)
    /// and global state is untouched; a genuine member triggers the full
    /// scrub and a broadcast to every member.
    pub fn delete_room(&self, user_id: &str, room_id: &str, conn: &Connection) {
        let mut reg = self.registry.lock();
        let initiator_nickname = reg
            .identities
            .nickname(user_id)
            .unwrap_or_default()
            .to_string();

        let Some(room) = reg.rooms.get(room_id) else {
            conn.send(ServerEvent::RoomDeleted {
                room_id: room_id.to_string(),
                room_name: String::new(),
                initiator_id: user_id.to_string(),
                initiator_nickname,
            });
            return;
        };
        let room_name = room.name.clone();

        if !reg.identities.contains(user_id) {
            conn.send(ServerEvent::RoomDeleted {
                room_id: room_id.to_string(),
                room_name,
                initiator_id: user_id.to_string(),
                initiator_nickname: String::new(),
            });
            return;
        }

        if !room.is_member(user_id) {
            conn.send(ServerEvent::RoomDeleted {
                room_id: room_id.to_string(),
                room_name,
                initiator_id: user_id.to_string(),
                initiator_nickname,
            });
            return;
        }

        let members = room.members().to_vec();
        reg.peers.drop_room(room_id);
        reg.invites.revoke_all_for(room_id);
        reg.rooms.delete(room_id);
        counter!(keys::ROOM_DELETED).increment(1);
        tracing::info!(%user_id, %room_id, members = members.len(), "room deleted");

        let event = ServerEvent::RoomDeleted {
            room_id: room_id.to_string(),
            room_name,
            initiator_id: user_id.to_string(),
            initiator_nickname,
        };
        broadcast_to(&reg.identities, &members, &event, None);
    }

    /// Full cascade for a terminated connection. Resolves the owning user
    /// by channel identity, so a reconnected user's stale socket matches
    /// nothing and cleans nothing.
    pub fn disconnect(&self, conn: &Connection) {
        let mut reg = self.registry.lock();
        let Some(user_id) = reg.identities.user_by_connection(conn) else {
            return;
        };
        let nickname = reg
            .identities
            .nickname(&user_id)
            .unwrap_or_default()
            .to_string();

        let rooms = reg.rooms.rooms_of(&user_id);
        for room_id in &rooms {
            reg.rooms.remove_member(room_id, &user_id);
            reg.peers.unset(room_id, &user_id);
            let event = ServerEvent::UserLeft {
                user_id: user_id.clone(),
                nickname: nickname.clone(),
            };
            if let Some(room) = reg.rooms.get(room_id) {
                broadcast_to(&reg.identities, room.members(), &event, None);
            }
        }
        // Advisory peer entries may outlive membership; purge the rest.
        reg.peers.unset_user(&user_id);
        reg.identities.remove(&user_id);
        tracing::info!(%user_id, rooms = rooms.len(), "disconnect cascade complete");
    }

    /// Room summaries for a user; an unknown user gets an empty list
    /// rather than an error.
    pub fn get_rooms(&self, user_id: &str, conn: &Connection) {
        let reg = self.registry.lock();
        let rooms = if reg.identities.contains(user_id) {
            reg.rooms.list_for_user(user_id)
        } else {
            Vec::new()
        };
        conn.send(ServerEvent::RoomsList { rooms });
    }

    /// Validate and echo back a shareable invite for an existing group
    /// room. Issues nothing; the code must already map to the room.
    pub fn invite_to_room(
        &self,
        user_id: &str,
        room_id: &str,
        invite_code: &str,
        conn: &Connection,
    ) -> Result<(), AppError> {
        let reg = self.registry.lock();
        let nickname = reg
            .identities
            .nickname(user_id)
            .ok_or(AppError::UserNotFound)?
            .to_string();
        let room = reg.rooms.get(room_id).ok_or(AppError::RoomNotFound)?;
        if room.kind != RoomKind::Group {
            return Err(AppError::NotGroupRoom);
        }
        if reg.invites.lookup(invite_code) != Some(room_id) {
            return Err(AppError::InvalidInviteCode);
        }
        conn.send(ServerEvent::InviteToRoomSuccess {
            room_id: room_id.to_string(),
            room_name: room.name.clone(),
            invite_code: invite_code.to_string(),
            inviter_nickname: nickname,
        });
        Ok(())
    }

    /// Member list of a room; an absent room yields an empty list.
    pub fn get_room_members(&self, room_id: &str, conn: &Connection) {
        let reg = self.registry.lock();
        let members = reg
            .rooms
            .get(room_id)
            .map(|room| collect_member_infos(&reg.identities, room.members()))
            .unwrap_or_default();
        conn.send(ServerEvent::RoomMembersList {
            room_id: room_id.to_string(),
            member_count: members.len(),
            members,
        });
    }
}

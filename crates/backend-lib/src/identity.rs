// ============================
// crates/backend-lib/src/identity.rs
// ============================
//! Per-user profile and live-connection tracking.

use crate::connection::Connection;
use crate::error::AppError;
use crate::validation;
use craftchat_common::MemberInfo;
use std::collections::HashMap;
use uuid::Uuid;

/// A session-scoped identity. Nickname and avatar are set at creation;
/// only the connection handle changes afterwards.
#[derive(Debug, Clone)]
pub struct User {
    pub nickname: String,
    pub avatar: Option<String>,
    pub connection: Option<Connection>,
}

/// Owns every live identity. Identities exist from session bootstrap until
/// their connection disconnects; there is no persistence.
#[derive(Debug, Default)]
pub struct IdentityStore {
    users: HashMap<String, User>,
}

impl IdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fresh identity and return its generated id.
    pub fn create(&mut self, nickname: &str, avatar: Option<String>) -> Result<String, AppError> {
        let nickname = validation::validate_nickname(nickname)?;
        let user_id = Uuid::new_v4().to_string();
        self.users.insert(
            user_id.clone(),
            User {
                nickname: nickname.to_string(),
                avatar,
                connection: None,
            },
        );
        Ok(user_id)
    }

    /// Attach (or replace) the live connection for a user. Idempotent;
    /// a reconnect simply overwrites the stale handle.
    pub fn attach_connection(&mut self, user_id: &str, conn: &Connection) -> bool {
        match self.users.get_mut(user_id) {
            Some(user) => {
                user.connection = Some(conn.clone());
                true
            },
            None => false,
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.users.contains_key(user_id)
    }

    pub fn lookup(&self, user_id: &str) -> Option<&User> {
        self.users.get(user_id)
    }

    pub fn nickname(&self, user_id: &str) -> Option<&str> {
        self.users.get(user_id).map(|u| u.nickname.as_str())
    }

    pub fn connection(&self, user_id: &str) -> Option<&Connection> {
        self.users.get(user_id).and_then(|u| u.connection.as_ref())
    }

    /// The user whose live handle IS this connection. A reconnected user's
    /// previous socket matches nothing here, so its disconnect cleans nothing.
    pub fn user_by_connection(&self, conn: &Connection) -> Option<String> {
        self.users
            .iter()
            .find(|(_, user)| {
                user.connection
                    .as_ref()
                    .is_some_and(|c| c.same_channel(conn))
            })
            .map(|(user_id, _)| user_id.clone())
    }

    /// Public view of a member, or `None` for stale ids.
    pub fn member_info(&self, user_id: &str) -> Option<MemberInfo> {
        self.users.get(user_id).map(|user| MemberInfo {
            user_id: user_id.to_string(),
            nickname: user.nickname.clone(),
            avatar: user.avatar.clone(),
        })
    }

    /// Delete the identity entirely. Disconnect cleanup only.
    pub fn remove(&mut self, user_id: &str) {
        self.users.remove(user_id);
    }
}

// ============================
// crates/backend-lib/src/invite.rs
// ============================
//! Invite codes and their dual-path resolution.

use rand::Rng;
use std::collections::HashMap;
use uuid::Uuid;

const CODE_LENGTH: usize = 6;
const CODE_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Maps short shareable tokens to room ids. Many codes may point to the
/// same room; a code maps to exactly one.
#[derive(Debug, Default)]
pub struct InviteCodeResolver {
    codes: HashMap<String, String>,
}

impl InviteCodeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a code for a room. A client-supplied code is reused as-is
    /// (re-sharing an already distributed code); otherwise a fresh token is
    /// generated, regenerating on the off chance of a collision.
    pub fn issue(&mut self, room_id: &str, code: Option<String>) -> String {
        let code = match code {
            Some(code) => code,
            None => loop {
                let candidate = generate_code();
                if !self.codes.contains_key(&candidate) {
                    break candidate;
                }
            },
        };
        self.codes.insert(code.clone(), room_id.to_string());
        code
    }

    /// Resolve a token to a room id.
    ///
    /// Short-code match takes precedence; otherwise a token that parses as
    /// a uuid is returned verbatim, whether or not such a room exists, and
    /// the caller reports room-not-found rather than invalid-code. Clients
    /// have long passed raw room identifiers here, so the fallback stays.
    pub fn resolve(&self, token: &str) -> Option<String> {
        if let Some(room_id) = self.codes.get(token) {
            return Some(room_id.clone());
        }
        Uuid::parse_str(token).ok().map(|_| token.to_string())
    }

    /// Exact short-code match only, no raw-identifier fallback. Used when
    /// a code must be proven to map to a specific room.
    pub fn lookup(&self, code: &str) -> Option<&str> {
        self.codes.get(code).map(String::as_str)
    }

    /// Drop every code pointing at the room. Called from room deletion.
    pub fn revoke_all_for(&mut self, room_id: &str) {
        self.codes.retain(|_, mapped| mapped != room_id);
    }

    pub fn codes_for(&self, room_id: &str) -> Vec<String> {
        self.codes
            .iter()
            .filter(|(_, mapped)| mapped.as_str() == room_id)
            .map(|(code, _)| code.clone())
            .collect()
    }
}

fn generate_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

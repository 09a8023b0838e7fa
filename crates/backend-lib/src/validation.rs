// ============================
// crates/backend-lib/src/validation.rs
// ============================
//! Boundary validation for client-supplied strings.

use crate::error::AppError;
use regex::Regex;
use std::sync::LazyLock;

const MAX_NICKNAME_LENGTH: usize = 64;
const MAX_CONTENT_LENGTH: usize = 4096;
const MAX_INVITE_TOKEN_LENGTH: usize = 64;

// A token is either a short invite code or a raw room identifier, so the
// charset admits both (lowercase alphanumerics plus uuid hyphens).
static INVITE_TOKEN_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("static pattern"));

/// Validate a nickname at identity creation. Returns the trimmed value.
pub fn validate_nickname(nickname: &str) -> Result<&str, AppError> {
    let nickname = nickname.trim();
    if nickname.is_empty() {
        return Err(AppError::InvalidArgument("nickname is required".to_string()));
    }
    if nickname.chars().count() > MAX_NICKNAME_LENGTH {
        return Err(AppError::InvalidArgument("nickname is too long".to_string()));
    }
    Ok(nickname)
}

/// Validate message content. Returns the trimmed value.
pub fn validate_content(content: &str) -> Result<&str, AppError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(AppError::EmptyContent);
    }
    if content.chars().count() > MAX_CONTENT_LENGTH {
        return Err(AppError::InvalidArgument("message is too long".to_string()));
    }
    Ok(content)
}

/// Normalize an invite token (trim + lowercase) and check its shape.
pub fn normalize_invite_token(token: &str) -> Result<String, AppError> {
    let token = token.trim().to_lowercase();
    if token.is_empty()
        || token.len() > MAX_INVITE_TOKEN_LENGTH
        || !INVITE_TOKEN_REGEX.is_match(&token)
    {
        return Err(AppError::InvalidInviteCode);
    }
    Ok(token)
}

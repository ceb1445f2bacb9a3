// ============================
// crates/hub-lib/src/validation.rs
// ============================
//! Input normalization and limit checks shared by hub operations.
//!
//! Every helper trims its input first; "missing" means absent on the wire
//! or empty after trimming, and both report `InvalidArgument`.

use crate::error::HubError;

pub const MAX_ROOM_ID_LENGTH: usize = 50;
pub const MAX_USERNAME_LENGTH: usize = 30;
pub const MIN_SEATS: u32 = 1;
pub const MAX_SEATS: u32 = 100;
pub const MIN_PASSWORD_LENGTH: usize = 4;
pub const MAX_PASSWORD_LENGTH: usize = 50;
pub const MAX_MESSAGE_LENGTH: usize = 500;

/// Alias used when `randomJoin` carries no username.
pub const DEFAULT_ALIAS: &str = "anonymous";

/// Validate and normalize a room identifier.
pub fn room_id(raw: &str) -> Result<String, HubError> {
    let id = raw.trim();
    if id.is_empty() {
        return Err(HubError::InvalidArgument(
            "room id is required".to_string(),
        ));
    }
    if id.len() > MAX_ROOM_ID_LENGTH {
        return Err(HubError::InvalidArgument(format!(
            "room id must be at most {MAX_ROOM_ID_LENGTH} characters"
        )));
    }
    Ok(id.to_string())
}

/// Validate the seat count of a new room.
pub fn seats(raw: Option<u32>) -> Result<u32, HubError> {
    let seats = raw.ok_or_else(|| {
        HubError::InvalidArgument("max seats is required".to_string())
    })?;
    if !(MIN_SEATS..=MAX_SEATS).contains(&seats) {
        return Err(HubError::InvalidArgument(format!(
            "max seats must be between {MIN_SEATS} and {MAX_SEATS}"
        )));
    }
    Ok(seats)
}

/// Validate and normalize a username.
pub fn username(raw: &str) -> Result<String, HubError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(HubError::InvalidArgument(
            "username is required".to_string(),
        ));
    }
    if name.len() > MAX_USERNAME_LENGTH {
        return Err(HubError::InvalidArgument(format!(
            "username must be at most {MAX_USERNAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

/// Normalize the optional random-chat alias, falling back to the default.
pub fn alias(raw: Option<&str>) -> Result<String, HubError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(DEFAULT_ALIAS.to_string()),
        Some(name) if name.len() > MAX_USERNAME_LENGTH => {
            Err(HubError::InvalidArgument(format!(
                "alias must be at most {MAX_USERNAME_LENGTH} characters"
            )))
        },
        Some(name) => Ok(name.to_string()),
    }
}

/// Validate the password of a new room.
///
/// Public rooms carry no password; private rooms require one with a
/// normalized length inside the allowed range.
pub fn room_password(
    is_public: bool,
    raw: Option<&str>,
) -> Result<Option<String>, HubError> {
    if is_public {
        return Ok(None);
    }
    let password = raw.map(str::trim).unwrap_or("");
    if password.len() < MIN_PASSWORD_LENGTH || password.len() > MAX_PASSWORD_LENGTH {
        return Err(HubError::InvalidArgument(format!(
            "private rooms require a password of {MIN_PASSWORD_LENGTH} to \
             {MAX_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(Some(password.to_string()))
}

/// Validate and normalize a chat message.
pub fn chat_message(raw: &str) -> Result<String, HubError> {
    let message = raw.trim();
    if message.is_empty() {
        return Err(HubError::InvalidArgument(
            "message must not be empty".to_string(),
        ));
    }
    if message.len() > MAX_MESSAGE_LENGTH {
        return Err(HubError::InvalidArgument(format!(
            "message must be at most {MAX_MESSAGE_LENGTH} characters"
        )));
    }
    Ok(message.to_string())
}

/// Validate a signaling target connection id.
pub fn signal_target(raw: &str) -> Result<&str, HubError> {
    if raw.trim().is_empty() {
        return Err(HubError::InvalidArgument(
            "target connection id is required".to_string(),
        ));
    }
    Ok(raw)
}

/// Validate a signaling payload. The hub never inspects the contents, it
/// only rejects an absent one.
pub fn signal_payload(payload: &serde_json::Value) -> Result<(), HubError> {
    if payload.is_null() {
        return Err(HubError::InvalidArgument(
            "payload is required".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_trimmed() {
        assert_eq!(room_id("  lobby ").unwrap(), "lobby");
        assert!(room_id("   ").is_err());
        assert!(room_id(&"x".repeat(51)).is_err());
    }

    #[test]
    fn test_seats_range() {
        assert!(seats(None).is_err());
        assert!(seats(Some(0)).is_err());
        assert!(seats(Some(101)).is_err());
        assert_eq!(seats(Some(1)).unwrap(), 1);
        assert_eq!(seats(Some(100)).unwrap(), 100);
    }

    #[test]
    fn test_password_rules() {
        // public rooms ignore any supplied password
        assert_eq!(room_password(true, Some("whatever")).unwrap(), None);

        assert!(room_password(false, None).is_err());
        assert!(room_password(false, Some("abc")).is_err());
        assert!(room_password(false, Some(&"p".repeat(51))).is_err());
        assert_eq!(
            room_password(false, Some(" pass1 ")).unwrap().as_deref(),
            Some("pass1")
        );
    }

    #[test]
    fn test_chat_message_limits() {
        assert!(chat_message("  ").is_err());
        assert!(chat_message(&"m".repeat(501)).is_err());
        assert_eq!(chat_message(" hi ").unwrap(), "hi");
        assert_eq!(chat_message(&"m".repeat(500)).unwrap().len(), 500);
    }

    #[test]
    fn test_alias_fallback() {
        assert_eq!(alias(None).unwrap(), DEFAULT_ALIAS);
        assert_eq!(alias(Some("  ")).unwrap(), DEFAULT_ALIAS);
        assert_eq!(alias(Some(" kat ")).unwrap(), "kat");
        assert!(alias(Some(&"a".repeat(31))).is_err());
    }

    #[test]
    fn test_signal_inputs() {
        assert!(signal_target("").is_err());
        assert!(signal_target("conn-1").is_ok());
        assert!(signal_payload(&serde_json::Value::Null).is_err());
        assert!(signal_payload(&serde_json::json!({"sdp":"..."})).is_ok());
    }
}

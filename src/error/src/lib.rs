//! 成就系统错误处理模块
//!
//! Errors raised by the achievement engine (catalog authoring, manual unlocks)
//! and by the on-disk achievement store.

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

/// Errors returned by engine and catalog operations.
///
/// Every variant leaves the engine unchanged: an operation either succeeds
/// completely or reports one of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AchievementError {
    /// Malformed custom definition, or a key already taken by a custom one
    #[error("invalid achievement `{key}`: {reason}")]
    Validation { key: String, reason: String },

    /// No achievement with this key in the catalog
    #[error("achievement `{0}` not found")]
    NotFound(String),

    /// Attempt to create, overwrite or delete a reserved built-in key
    #[error("achievement `{0}` is built-in and cannot be modified")]
    Conflict(String),
}

impl AchievementError {
    pub fn validation(key: impl Into<String>, reason: impl Into<String>) -> Self {
        AchievementError::Validation {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// The achievement key the error refers to.
    pub fn key(&self) -> &str {
        match self {
            AchievementError::Validation { key, .. } => key,
            AchievementError::NotFound(key) | AchievementError::Conflict(key) => key,
        }
    }

    /// Whether the UI should show this error to the user.
    ///
    /// Not-found errors mean the UI and the engine disagree about the catalog;
    /// they are logged instead.
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, AchievementError::NotFound(_))
    }
}

/// 存档系统错误
#[derive(Debug, Error)]
pub enum StoreError {
    /// 存档系统错误（带上下文）
    #[error("Store error: {0}")]
    Context(#[from] anyhow::Error),

    /// IO操作错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// 反序列化错误
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// 存档数据损坏
    #[error("Corrupted achievement save")]
    CorruptedSave,

    /// 存档版本不兼容
    #[error("Incompatible save version: {0}")]
    VersionMismatch(u32),
}

impl From<DecodeError> for StoreError {
    fn from(err: DecodeError) -> Self {
        // 非法 UTF-8 通常意味着文件被截断或覆盖
        if err.to_string().contains("invalid utf-8 sequence") {
            StoreError::CorruptedSave
        } else {
            StoreError::Deserialization(err.to_string())
        }
    }
}

impl From<EncodeError> for StoreError {
    fn from(err: EncodeError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        if err.is_io() {
            StoreError::Io(err.into())
        } else if err.is_data() || err.is_syntax() || err.is_eof() {
            StoreError::Deserialization(err.to_string())
        } else {
            StoreError::Serialization(err.to_string())
        }
    }
}

/// 将成就错误转换为用户友好的消息
pub fn user_message(error: &AchievementError) -> String {
    match error {
        AchievementError::Validation { key, reason } if reason.contains("already exists") => {
            format!("An achievement with key \"{}\" already exists", key)
        }
        AchievementError::Validation { reason, .. } => {
            let mut chars = reason.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => "Invalid achievement".to_string(),
            }
        }
        AchievementError::Conflict(key) => {
            format!("\"{}\" is a built-in achievement and cannot be changed", key)
        }
        AchievementError::NotFound(key) => format!("Achievement \"{}\" no longer exists", key),
    }
}

/// 将存档错误转换为用户友好的消息
pub fn store_message(error: &StoreError) -> String {
    match error {
        StoreError::CorruptedSave => "Achievement data is corrupted and cannot be loaded".to_string(),
        StoreError::VersionMismatch(v) => format!("Achievement data version {} is not supported", v),
        StoreError::Io(e) => match e.kind() {
            std::io::ErrorKind::NotFound => "Achievement file does not exist".to_string(),
            std::io::ErrorKind::PermissionDenied => {
                "No permission to access the achievement file".to_string()
            }
            _ => format!("IO error: {}", e),
        },
        _ => error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_is_not_user_facing() {
        assert!(!AchievementError::NotFound("x".into()).is_user_facing());
        assert!(AchievementError::Conflict("x".into()).is_user_facing());
        assert!(AchievementError::validation("x", "points must not be negative").is_user_facing());
    }

    #[test]
    fn key_collision_message_is_actionable() {
        let err = AchievementError::validation("speedrun", "key already exists");
        assert_eq!(
            user_message(&err),
            "An achievement with key \"speedrun\" already exists"
        );
        assert_eq!(err.key(), "speedrun");
    }

    #[test]
    fn validation_reason_is_capitalised() {
        let err = AchievementError::validation("k", "name is required");
        assert_eq!(user_message(&err), "Name is required");
    }

    #[test]
    fn io_not_found_maps_to_friendly_message() {
        let err = StoreError::Io(std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(store_message(&err), "Achievement file does not exist");
    }

    #[test]
    fn json_syntax_error_is_deserialization() {
        let err: StoreError = serde_json::from_str::<Vec<u32>>("[1,").unwrap_err().into();
        assert!(matches!(err, StoreError::Deserialization(_)));
    }
}

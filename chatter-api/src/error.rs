use anyhow::{anyhow, Context};
use serde_json::json;

#[derive(Debug, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("Unknown error: {0}")]
    Unknown(String),

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Name already used {0}")]
    NameAlreadyUsed(String),

    #[error("Null byte in string is not allowed {0:?}")]
    NullByteInString(String),

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Unknown reaction {0:?}")]
    UnknownReaction(String),

    #[error("Patch failed: {0}")]
    PatchFailed(String),
}

impl Error {
    pub fn status_code(&self) -> http::StatusCode {
        use http::StatusCode;
        match self {
            Error::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PermissionDenied => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::NameAlreadyUsed(_) => StatusCode::CONFLICT,
            Error::NullByteInString(_) => StatusCode::BAD_REQUEST,
            Error::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Error::UnknownReaction(_) => StatusCode::BAD_REQUEST,
            Error::PatchFailed(_) => StatusCode::BAD_REQUEST,
        }
    }

    pub fn contents(&self) -> Vec<u8> {
        serde_json::to_vec(&match self {
            Error::Unknown(msg) => json!({
                "message": msg,
                "type": "unknown",
            }),
            Error::PermissionDenied => json!({
                "message": "permission denied",
                "type": "permission-denied",
            }),
            Error::NotFound(what) => json!({
                "message": "not found",
                "type": "not-found",
                "path": what,
            }),
            Error::NameAlreadyUsed(n) => json!({
                "message": "name already used",
                "type": "conflict-name",
                "name": n,
            }),
            Error::NullByteInString(s) => json!({
                "message": "there was a null byte in argument string",
                "type": "null-byte",
                "string": s,
            }),
            Error::InvalidPayload(details) => json!({
                "message": details,
                "type": "invalid-payload",
            }),
            Error::UnknownReaction(r) => json!({
                "message": "unknown reaction kind",
                "type": "unknown-reaction",
                "reaction": r,
            }),
            Error::PatchFailed(details) => json!({
                "message": details,
                "type": "patch-failed",
            }),
        })
        .expect("serializing error contents")
    }

    pub fn parse(body: &[u8]) -> anyhow::Result<Error> {
        let data: serde_json::Value =
            serde_json::from_slice(body).context("parsing error contents")?;
        macro_rules! field {
            ($name:expr) => {
                String::from(
                    data.get($name)
                        .and_then(|s| s.as_str())
                        .ok_or_else(|| anyhow!("error contents has no {:?} field", $name))?,
                )
            };
        }
        Ok(
            match data
                .get("type")
                .and_then(|t| t.as_str())
                .ok_or_else(|| anyhow!("error type is not a string"))?
            {
                "unknown" => Error::Unknown(String::from(
                    data.get("message")
                        .and_then(|msg| msg.as_str())
                        .unwrap_or(""),
                )),
                "permission-denied" => Error::PermissionDenied,
                "not-found" => Error::NotFound(field!("path")),
                "conflict-name" => Error::NameAlreadyUsed(field!("name")),
                "null-byte" => Error::NullByteInString(field!("string")),
                "invalid-payload" => Error::InvalidPayload(field!("message")),
                "unknown-reaction" => Error::UnknownReaction(field!("reaction")),
                "patch-failed" => Error::PatchFailed(field!("message")),
                _ => return Err(anyhow!("error contents has unknown type")),
            },
        )
    }
}

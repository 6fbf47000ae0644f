use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server frame is not a JSON object")]
    NotAnObject,

    #[error("server frame has neither `type` nor `message_type`")]
    MissingTag,

    #[error("malformed `{kind}` message: {source}")]
    Payload {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid server URL: {0}")]
    InvalidUrl(String),

    #[error("unsupported URL scheme `{0}` (expected ws, wss, http or https)")]
    UnsupportedScheme(String),
}

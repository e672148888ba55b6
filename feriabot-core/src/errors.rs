use thiserror::Error;

/// Failure of the text/vision/transcription oracle.
///
/// "The model saw nothing financial" is not an error; classifiers return
/// `Ok(None)` for that. These variants are infrastructure failures.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("classifier API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("classifier request failed: {0}")]
    Http(String),
    #[error("classifier returned malformed output: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("messaging API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("messaging request failed: {0}")]
    Http(String),
}

/// Union of collaborator failures, matched on at the message-processing
/// boundary to pick the user-facing fallback reply.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error(transparent)]
    Classify(#[from] ClassifyError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

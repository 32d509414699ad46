use thiserror::Error;

/// Errors that abort normalisation of an inbound request.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The request body is not a JSON envelope.
    #[error("malformed task envelope: {source}")]
    MalformedEnvelope {
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// A query string carried in the envelope could not be parsed.
    #[error("malformed query '{query}': {message}")]
    MalformedQuery {
        /// Query as received.
        query: String,
        /// What was wrong with it.
        message: String,
    },
    /// The request body exceeded the transport limit.
    #[error("request body exceeds {limit} bytes")]
    BodyTooLarge {
        /// Limit in bytes.
        limit: usize,
    },
}

impl PipelineError {
    /// Creates a malformed query error.
    pub fn malformed_query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MalformedQuery {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Returns the name of the step family that failed, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MalformedEnvelope { .. } => "envelope",
            Self::MalformedQuery { .. } => "query",
            Self::BodyTooLarge { .. } => "body",
        }
    }

    /// HTTP status reported for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::BodyTooLarge { .. } => 413,
            Self::MalformedEnvelope { .. } | Self::MalformedQuery { .. } => 400,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The booking snapshot could not be fetched.
    QueryFailure(String),
    /// The booking snapshot did not arrive within the configured timeout.
    QueryTimeout,
    MalformedBookingRecord {
        index: usize,
        reason: &'static str,
    },
    InvalidWindow(&'static str),
    LimitExceeded(&'static str),
}

impl EngineError {
    /// Query failures are recovered by failing open; nothing else is.
    pub fn is_query_failure(&self) -> bool {
        matches!(self, EngineError::QueryFailure(_) | EngineError::QueryTimeout)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::QueryFailure(e) => write!(f, "booking query failed: {e}"),
            EngineError::QueryTimeout => write!(f, "booking query timed out"),
            EngineError::MalformedBookingRecord { index, reason } => {
                write!(f, "malformed booking record #{index}: {reason}")
            }
            EngineError::InvalidWindow(msg) => write!(f, "invalid availability window: {msg}"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}

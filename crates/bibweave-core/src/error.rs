//! Error taxonomy for the request gate

/// Terminal outcome of a gated request.
///
/// `NotFound` means the source confirmed the record is absent (HTTP 404).
/// `Exhausted` means the gate gave up after running out of retries; the
/// record may or may not exist. Callers must never conflate the two.
#[derive(Debug)]
pub enum GateError {
    /// Source confirmed absence. Never retried, never cached.
    NotFound,
    /// All attempts failed; `last` describes the final attempt's failure.
    Exhausted { attempts: u32, last: String },
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found (404)"),
            Self::Exhausted { attempts, last } => {
                write!(f, "failed after {attempts} attempts: {last}")
            }
        }
    }
}

impl std::error::Error for GateError {}

impl GateError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }
}

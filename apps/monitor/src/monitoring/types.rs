use chrono::{DateTime, Local};

/// The recorded result of one probe attempt against a single endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    /// Name of the endpoint that was probed.
    pub name: String,

    /// URL that was probed.
    pub url: String,

    /// Instant the probe was issued, captured before the exchange began.
    pub timestamp: DateTime<Local>,

    /// How the probe concluded.
    pub verdict: Verdict,
}

/// How a probe concluded.
///
/// A completed exchange always carries a status code and latency; a
/// failed exchange only carries an error description.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The HTTP exchange completed; the endpoint may still be considered
    /// unavailable if the final status falls outside [200, 400).
    Completed { status_code: u16, latency_ms: f64, available: bool },

    /// The exchange did not complete (DNS, connect, TLS, timeout).
    Failed { error: String },
}

impl ProbeOutcome {
    /// Outcome for an exchange that completed with a response.
    pub fn completed(
        name: &str,
        url: &str,
        timestamp: DateTime<Local>,
        status_code: u16,
        latency_ms: f64,
    ) -> Self {
        Self {
            name: name.to_owned(),
            url: url.to_owned(),
            timestamp,
            verdict: Verdict::Completed {
                status_code,
                latency_ms,
                available: (200..400).contains(&status_code),
            },
        }
    }

    /// Outcome for an exchange that did not complete.
    pub fn failed(name: &str, url: &str, timestamp: DateTime<Local>, error: String) -> Self {
        Self {
            name: name.to_owned(),
            url: url.to_owned(),
            timestamp,
            verdict: Verdict::Failed { error },
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.verdict, Verdict::Completed { available: true, .. })
    }

    pub fn status_code(&self) -> Option<u16> {
        match self.verdict {
            Verdict::Completed { status_code, .. } => Some(status_code),
            Verdict::Failed { .. } => None,
        }
    }

    pub fn latency_ms(&self) -> Option<f64> {
        match self.verdict {
            Verdict::Completed { latency_ms, .. } => Some(latency_ms),
            Verdict::Failed { .. } => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.verdict {
            Verdict::Failed { error } => Some(error),
            Verdict::Completed { .. } => None,
        }
    }
}

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingCredential,
    MissingLocation,
    MissingGenerationParameters,
    UpstreamUnavailable,
    MalformedResponse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upstream {
    Weather,
    Completion,
}

/// Failure of one generation run.
///
/// `raw_output` holds the completion text when the failure is about what the
/// model answered, so callers can log it verbatim.
#[derive(Debug, Clone)]
pub struct GenerationError {
    pub kind: ErrorKind,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
}

impl GenerationError {
    pub fn missing_credential() -> Self {
        Self {
            kind: ErrorKind::MissingCredential,
            stage: "preflight",
            detail: "completion API key is missing".to_string(),
            raw_output: None,
        }
    }

    pub fn missing_location() -> Self {
        Self {
            kind: ErrorKind::MissingLocation,
            stage: "preflight",
            detail: "latitude and longitude must be provided".to_string(),
            raw_output: None,
        }
    }

    pub fn missing_parameters(missing: &[&str]) -> Self {
        Self {
            kind: ErrorKind::MissingGenerationParameters,
            stage: "preflight",
            detail: format!("missing required parameters: {}", missing.join(", ")),
            raw_output: None,
        }
    }

    pub fn upstream(upstream: Upstream, stage: &'static str, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        Self {
            kind: ErrorKind::UpstreamUnavailable,
            stage,
            detail: format!("{upstream:?}: {detail}"),
            raw_output: None,
        }
    }

    pub fn malformed(detail: impl Into<String>, raw_output: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::MalformedResponse,
            stage: "parse",
            detail: detail.into(),
            raw_output: Some(raw_output.into()),
        }
    }

    pub fn is_preflight(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::MissingCredential
                | ErrorKind::MissingLocation
                | ErrorKind::MissingGenerationParameters
        )
    }
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation error (kind={:?}, stage={}): {}",
            self.kind, self.stage, self.detail
        )
    }
}

impl std::error::Error for GenerationError {}

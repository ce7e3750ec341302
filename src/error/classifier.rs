//! Maps failures onto user-facing messages with a retry verdict.
//!
//! Classification is a pure function of the error value: typed variants are
//! matched first, then the message is compared against known network failure
//! signatures. Anything unrecognized passes through unchanged and is marked
//! as not retryable.

use serde::Serialize;

use super::ConversionError;
use crate::http_client::TransportError;

/// Broad category of a classified failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NetworkUnreachable,
    NetworkTimeout,
    Blocked,
    Offline,
    RequestFailed,
    RateLimited,
    Unauthorized,
    ServerError,
    ClientError,
    Processing,
    PollTimeout,
    Cancelled,
    InvalidResponse,
    Io,
    Unknown,
}

/// A failure translated for presentation and retry decisions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedError {
    pub kind: ErrorKind,
    pub user_message: String,
    pub technical_detail: String,
    pub is_retryable: bool,
    pub suggested_action: String,
}

struct NetworkSignature {
    patterns: &'static [&'static str],
    kind: ErrorKind,
    user_message: &'static str,
    suggested_action: &'static str,
    retryable: bool,
}

/// Checked in order; the first signature with a matching pattern wins.
const NETWORK_SIGNATURES: &[NetworkSignature] = &[
    NetworkSignature {
        patterns: &[
            "offline",
            "network is unreachable",
            "no route to host",
            "internet_disconnected",
        ],
        kind: ErrorKind::Offline,
        user_message: "You appear to be offline.",
        suggested_action: "Reconnect to the network and try again.",
        retryable: true,
    },
    NetworkSignature {
        patterns: &["timed out", "timeout", "deadline has elapsed"],
        kind: ErrorKind::NetworkTimeout,
        user_message: "The conversion service took too long to respond.",
        suggested_action: "Try again in a moment; for large documents consider a smaller page range.",
        retryable: true,
    },
    NetworkSignature {
        patterns: &[
            "cors",
            "access-control-allow-origin",
            "blocked by",
            "request blocked",
        ],
        kind: ErrorKind::Blocked,
        user_message: "The request was blocked before it reached the conversion service.",
        suggested_action: "Check proxy, firewall or origin settings for the API endpoint.",
        retryable: false,
    },
    NetworkSignature {
        patterns: &[
            "failed to fetch",
            "fetch failed",
            "error sending request",
            "connection refused",
            "connection failed",
            "connection reset",
            "connection closed",
            "dns error",
        ],
        kind: ErrorKind::NetworkUnreachable,
        user_message: "Could not reach the conversion service.",
        suggested_action: "Check your internet connection and the API URL, then try again.",
        retryable: true,
    },
    NetworkSignature {
        patterns: &["typeerror", "type error", "builder error"],
        kind: ErrorKind::RequestFailed,
        user_message: "The network request could not be completed.",
        suggested_action: "Verify the API configuration and try again.",
        retryable: true,
    },
];

impl NetworkSignature {
    fn classify(&self, message: &str) -> ClassifiedError {
        ClassifiedError {
            kind: self.kind,
            user_message: self.user_message.to_string(),
            technical_detail: message.to_string(),
            is_retryable: self.retryable,
            suggested_action: self.suggested_action.to_string(),
        }
    }
}

const FALLBACK_ACTION: &str = "Try again later, or report the problem if it persists.";

/// Stateless classifier for conversion failures.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorClassifier;

impl ErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify any error, using the typed taxonomy when the error (or one of
    /// its sources) is a [`ConversionError`].
    pub fn classify_error(&self, error: &(dyn std::error::Error + 'static)) -> ClassifiedError {
        let mut current: Option<&(dyn std::error::Error + 'static)> = Some(error);
        while let Some(err) = current {
            if let Some(conversion) = err.downcast_ref::<ConversionError>() {
                return self.classify(conversion);
            }
            if let Some(transport) = err.downcast_ref::<TransportError>() {
                return self.classify_transport(transport);
            }
            current = err.source();
        }
        self.classify_message(&error_chain_message(error))
    }

    /// Classify a typed conversion error.
    pub fn classify(&self, error: &ConversionError) -> ClassifiedError {
        let detail = error.to_string();
        match error {
            ConversionError::Validation(message) => ClassifiedError {
                kind: ErrorKind::Validation,
                user_message: message.clone(),
                technical_detail: detail,
                is_retryable: false,
                suggested_action: "Check the file type, size or input structure and try again."
                    .to_string(),
            },
            ConversionError::Processing { message, .. } => ClassifiedError {
                kind: ErrorKind::Processing,
                user_message: format!("The service could not process this document: {}", message),
                technical_detail: detail,
                is_retryable: false,
                suggested_action:
                    "Make sure the document is readable and not password protected, then resubmit."
                        .to_string(),
            },
            ConversionError::Timeout { .. } => ClassifiedError {
                kind: ErrorKind::PollTimeout,
                user_message: "The document is taking longer than expected to process.".to_string(),
                technical_detail: detail,
                is_retryable: true,
                suggested_action: "Reduce the input size or page range, then resubmit.".to_string(),
            },
            ConversionError::Cancelled { .. } => ClassifiedError {
                kind: ErrorKind::Cancelled,
                user_message: "Processing was cancelled.".to_string(),
                technical_detail: detail,
                is_retryable: false,
                suggested_action: "Resubmit the document to start again.".to_string(),
            },
            ConversionError::InvalidResponse(_) => ClassifiedError {
                kind: ErrorKind::InvalidResponse,
                user_message: "The conversion service returned an unexpected response.".to_string(),
                technical_detail: detail,
                is_retryable: false,
                suggested_action: FALLBACK_ACTION.to_string(),
            },
            ConversionError::Io(_) => ClassifiedError {
                kind: ErrorKind::Io,
                user_message: "A local file could not be read or written.".to_string(),
                technical_detail: detail,
                is_retryable: false,
                suggested_action: "Check the file path and permissions.".to_string(),
            },
            ConversionError::Upload { status, message }
            | ConversionError::StatusCheck {
                status, message, ..
            }
            | ConversionError::Download {
                status, message, ..
            } => match status {
                Some(code) => classify_status(*code, detail),
                None => {
                    let mut classified = self.classify_message(message);
                    classified.technical_detail = detail;
                    classified
                }
            },
        }
    }

    /// Classify a failure that happened before any response arrived.
    ///
    /// The timeout and connect flags take precedence over the message text.
    pub fn classify_transport(&self, error: &TransportError) -> ClassifiedError {
        let kind = if error.is_timeout {
            Some(ErrorKind::NetworkTimeout)
        } else if error.is_connect {
            Some(ErrorKind::NetworkUnreachable)
        } else {
            None
        };
        kind.and_then(|kind| NETWORK_SIGNATURES.iter().find(|s| s.kind == kind))
            .map(|signature| signature.classify(&error.message))
            .unwrap_or_else(|| self.classify_message(&error.message))
    }

    /// Classify a bare error message against the known network signatures.
    pub fn classify_message(&self, message: &str) -> ClassifiedError {
        let lower = message.to_lowercase();
        if let Some(signature) = NETWORK_SIGNATURES
            .iter()
            .find(|s| s.patterns.iter().any(|p| lower.contains(p)))
        {
            return signature.classify(message);
        }

        ClassifiedError {
            kind: ErrorKind::Unknown,
            user_message: message.to_string(),
            technical_detail: message.to_string(),
            is_retryable: false,
            suggested_action: FALLBACK_ACTION.to_string(),
        }
    }
}

fn classify_status(code: u16, detail: String) -> ClassifiedError {
    let (kind, user_message, retryable, action) = match code {
        429 => (
            ErrorKind::RateLimited,
            "The conversion service is rate limiting requests.",
            true,
            "Wait a minute before trying again.",
        ),
        401 | 403 => (
            ErrorKind::Unauthorized,
            "The conversion service rejected the API credentials.",
            false,
            "Check the configured app id and app key.",
        ),
        500..=599 => (
            ErrorKind::ServerError,
            "The conversion service is having problems.",
            true,
            "Try again in a few minutes.",
        ),
        _ => (
            ErrorKind::ClientError,
            "The conversion service refused the request.",
            false,
            "Check the request options and try again.",
        ),
    };

    ClassifiedError {
        kind,
        user_message: user_message.to_string(),
        technical_detail: detail,
        is_retryable: retryable,
        suggested_action: action.to_string(),
    }
}

fn error_chain_message(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}

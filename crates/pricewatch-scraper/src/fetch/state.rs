//! The fetch state machine.
//!
//! ```text
//!  Direct ──challenge, attempts left──▶ ChallengeRetry
//!    │  ▲                                  │
//!    │  └──────failure, attempts left──────┤
//!    │                                     │
//!    ├──usable──▶ Succeeded ◀──usable──────┤
//!    │                                     │
//!    └──out of attempts──▶ ProxyFallback ──┴──▶ Failed
//! ```
//!
//! [`FetchPhase::next`] is pure so every transition can be tested without a
//! network.

use super::challenge::looks_like_challenge;

/// Bodies shorter than this (after trimming) are treated as a failed attempt.
pub(crate) const MIN_BODY_CHARS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchPhase {
    /// Plain direct attempts.
    Direct,
    /// Direct attempts continuing after a challenge page.
    ChallengeRetry,
    /// The single proxy hop after the direct attempts ended on a challenge.
    ProxyFallback,
    Succeeded,
    Failed,
}

impl FetchPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Transition after an attempt.
    ///
    /// `attempts_made` counts direct attempts so far, including the one that
    /// produced `outcome`.
    #[must_use]
    pub fn next(
        self,
        outcome: &AttemptOutcome,
        attempts_made: u32,
        max_attempts: u32,
        proxy_available: bool,
    ) -> Self {
        match self {
            Self::Succeeded | Self::Failed => self,
            Self::ProxyFallback => {
                if outcome.is_usable() {
                    Self::Succeeded
                } else {
                    Self::Failed
                }
            }
            Self::Direct | Self::ChallengeRetry => {
                let attempts_left = attempts_made < max_attempts;
                match outcome {
                    AttemptOutcome::Usable(_) => Self::Succeeded,
                    AttemptOutcome::Challenge { .. } if attempts_left => Self::ChallengeRetry,
                    AttemptOutcome::Challenge { .. } if proxy_available => Self::ProxyFallback,
                    AttemptOutcome::Failed(_) if attempts_left => Self::Direct,
                    AttemptOutcome::Challenge { .. } | AttemptOutcome::Failed(_) => Self::Failed,
                }
            }
        }
    }
}

impl std::fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Direct => write!(f, "direct"),
            Self::ChallengeRetry => write!(f, "challenge_retry"),
            Self::ProxyFallback => write!(f, "proxy_fallback"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Why an attempt did not produce usable HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    Transport { timeout: bool, message: String },
    Status(u16),
    ShortBody(usize),
    Oversized { limit: usize },
}

impl std::fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport {
                timeout: true,
                message,
            } => write!(f, "timeout: {message}"),
            Self::Transport { message, .. } => write!(f, "transport error: {message}"),
            Self::Status(status) => write!(f, "HTTP {status}"),
            Self::ShortBody(len) => write!(f, "body too short ({len} chars)"),
            Self::Oversized { limit } => write!(f, "body exceeds {limit} bytes"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    Usable(String),
    Challenge { status: u16 },
    Failed(AttemptFailure),
}

impl AttemptOutcome {
    #[must_use]
    pub fn is_usable(&self) -> bool {
        matches!(self, Self::Usable(_))
    }
}

/// Classify a received response. Challenge markers win over the status code,
/// so a 403 challenge page is still a challenge.
pub(crate) fn classify_response(status: u16, body: String) -> AttemptOutcome {
    if looks_like_challenge(&body) {
        return AttemptOutcome::Challenge { status };
    }
    if !(200..300).contains(&status) {
        return AttemptOutcome::Failed(AttemptFailure::Status(status));
    }
    let len = body.trim().chars().count();
    if len < MIN_BODY_CHARS {
        return AttemptOutcome::Failed(AttemptFailure::ShortBody(len));
    }
    AttemptOutcome::Usable(body)
}

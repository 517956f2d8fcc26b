//! Request sequencing.
//!
//! Every reload, scale switch, navigation and committed mutation takes a
//! token from a monotonic counter. A response is applied only if it carries
//! the most recently issued token, and at most once. Older responses are
//! dropped on arrival even when the newest request has not answered yet,
//! so the view always converges on the last requested configuration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Generation token of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RequestToken(u64);

impl RequestToken {
    #[inline]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What a request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Reload,
    ScaleChange,
    Navigation,
    Mutation,
}

/// Issues tokens and gates responses.
#[derive(Debug, Clone, Default)]
pub struct RequestSequencer {
    issued: u64,
    applied: Option<u64>,
    latest_kind: Option<RequestKind>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues the next token, superseding every earlier one.
    pub fn issue(&mut self, kind: RequestKind) -> RequestToken {
        self.issued += 1;
        self.latest_kind = Some(kind);
        log::debug!("issued request #{} ({:?})", self.issued, kind);
        RequestToken(self.issued)
    }

    /// Whether `token` is the most recently issued one.
    #[inline]
    pub fn is_current(&self, token: RequestToken) -> bool {
        token.0 == self.issued
    }

    /// Admits the response for `token`.
    ///
    /// Returns `false` (drop the response) when a newer request exists or
    /// this response was already applied.
    pub fn accept(&mut self, token: RequestToken) -> bool {
        if !self.is_current(token) {
            log::debug!("dropping stale response {} (latest #{})", token, self.issued);
            return false;
        }
        if self.applied == Some(token.0) {
            log::debug!("response {} already applied", token);
            return false;
        }
        self.applied = Some(token.0);
        true
    }

    /// Whether the latest request still awaits its response.
    pub fn has_pending(&self) -> bool {
        self.issued > 0 && self.applied != Some(self.issued)
    }

    pub fn latest(&self) -> Option<RequestToken> {
        (self.issued > 0).then_some(RequestToken(self.issued))
    }

    pub fn latest_kind(&self) -> Option<RequestKind> {
        self.latest_kind
    }

    /// Last applied token.
    pub fn applied(&self) -> Option<RequestToken> {
        self.applied.map(RequestToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increase() {
        let mut seq = RequestSequencer::new();
        let a = seq.issue(RequestKind::Reload);
        let b = seq.issue(RequestKind::ScaleChange);
        assert!(b > a);
        assert_eq!(seq.latest(), Some(b));
        assert_eq!(seq.latest_kind(), Some(RequestKind::ScaleChange));
    }

    #[test]
    fn test_stale_dropped_before_newest_arrives() {
        let mut seq = RequestSequencer::new();
        let week = seq.issue(RequestKind::ScaleChange);
        let year = seq.issue(RequestKind::ScaleChange);
        assert!(!seq.accept(week));
        assert!(seq.has_pending());
        assert!(seq.accept(year));
        assert!(!seq.has_pending());
        assert!(!seq.accept(week));
    }

    #[test]
    fn test_applied_at_most_once() {
        let mut seq = RequestSequencer::new();
        let t = seq.issue(RequestKind::Mutation);
        assert!(seq.accept(t));
        assert!(!seq.accept(t));
        assert_eq!(seq.applied(), Some(t));
    }

    #[test]
    fn test_no_pending_initially() {
        let seq = RequestSequencer::new();
        assert!(!seq.has_pending());
        assert_eq!(seq.latest(), None);
    }
}

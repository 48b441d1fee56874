use crate::Hand;

/// Errors from pattern validation and layout
///
/// Two classes share this enum. User errors mean the supplied pattern is
/// structurally invalid and carry enough context (juggler, hand, path,
/// time) to fix the source. `Internal` means an invariant the engine
/// itself guarantees was violated; it aborts the layout pass and is a bug
/// report, not something a pattern author can repair.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LayoutError {
    #[error("symmetries are inconsistent at juggler {juggler}, {hand} hand, entry slot {entry}")]
    InconsistentSymmetries {
        juggler: usize,
        hand: Hand,
        entry: usize,
    },

    #[error("no event ever touches juggler {juggler}'s {hand} hand")]
    HandNeverUsed { juggler: usize, hand: Hand },

    #[error("no event ever touches path {path}")]
    PathNeverUsed { path: usize },

    #[error("path {path} at t={time:.3}: {detail}")]
    BadTransitionOrder {
        path: usize,
        time: f64,
        detail: String,
    },

    #[error(
        "path {path} at t={time:.3}: held prop moved from juggler {from_juggler}'s {from_hand} \
         hand to juggler {to_juggler}'s {to_hand} hand without a throw"
    )]
    HoldBrokenAcrossHands {
        path: usize,
        time: f64,
        from_juggler: usize,
        from_hand: Hand,
        to_juggler: usize,
        to_hand: Hand,
    },

    #[error("invalid permutation '{text}': {reason}")]
    BadPermutation { text: String, reason: String },

    #[error("unknown throw type '{throw_type}' on path {path} at t={time:.3}")]
    BadThrowType {
        throw_type: String,
        path: usize,
        time: f64,
    },

    #[error("invalid pattern: {0}")]
    BadPattern(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl LayoutError {
    /// True for errors a pattern author can fix in the source pattern
    pub fn is_user_error(&self) -> bool {
        !matches!(self, LayoutError::Internal(_))
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        LayoutError::Internal(msg.into())
    }

    pub fn bad_pattern(msg: impl Into<String>) -> Self {
        LayoutError::BadPattern(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(LayoutError::HandNeverUsed {
            juggler: 1,
            hand: Hand::Left
        }
        .is_user_error());
        assert!(!LayoutError::internal("lookup failed").is_user_error());
    }

    #[test]
    fn test_messages_carry_context() {
        let e = LayoutError::BadTransitionOrder {
            path: 3,
            time: 1.25,
            detail: "two throws in a row".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("path 3"));
        assert!(msg.contains("1.250"));
        assert!(msg.contains("two throws"));
    }
}

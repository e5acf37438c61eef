use serde_json::Value;

use super::pattern::PayloadShape;

/// Lifecycle of one capture attempt.
///
/// `Idle -> Armed -> (Resolved | ClosedUnresolved)`. Both terminal states
/// are sticky: once reached, every further transition is a no-op.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum CaptureState {
    #[default]
    Idle,
    /// Subscribed to responses, waiting for a match.
    Armed,
    /// A matching response arrived. `payload` is `None` when its body could
    /// not be read or was not JSON.
    Resolved {
        shape: PayloadShape,
        payload: Option<Value>,
    },
    /// The page went away without any response matching.
    ClosedUnresolved,
}

impl CaptureState {
    /// `Idle -> Armed`. Returns whether the state changed.
    pub fn arm(&mut self) -> bool {
        if matches!(self, Self::Idle) {
            *self = Self::Armed;
            true
        } else {
            false
        }
    }

    /// Record the first match. Returns whether the state changed; a second
    /// call never overwrites the first capture.
    pub fn resolve(&mut self, shape: PayloadShape, payload: Option<Value>) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = Self::Resolved { shape, payload };
        true
    }

    /// Give up waiting. Returns whether the state changed.
    pub fn close(&mut self) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = Self::ClosedUnresolved;
        true
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved { .. } | Self::ClosedUnresolved)
    }

    /// The captured document, if a match was read successfully.
    #[must_use]
    pub fn captured(&self) -> Option<(PayloadShape, &Value)> {
        match self {
            Self::Resolved {
                shape,
                payload: Some(payload),
            } => Some((*shape, payload)),
            _ => None,
        }
    }
}

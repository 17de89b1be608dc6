//! Process-wide provider handle.

use std::sync::Arc;

/// Holder of the loaded model, set once at startup and never reassigned.
pub enum ProviderSlot<P: ?Sized> {
    /// Provider loaded and shared read-only across requests.
    Ready(Arc<P>),
    /// No provider; every request fails with "model is not loaded".
    Unavailable {
        /// Why the slot is empty, for logs and `/health`.
        reason: String,
    },
}

impl<P: ?Sized> ProviderSlot<P> {
    /// Slot holding a loaded provider.
    pub fn ready(provider: Arc<P>) -> Self {
        Self::Ready(provider)
    }

    /// Empty slot.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// The provider, if bound.
    pub fn get(&self) -> Option<&Arc<P>> {
        match self {
            Self::Ready(provider) => Some(provider),
            Self::Unavailable { .. } => None,
        }
    }

    /// Whether a provider is bound.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    /// Reason the slot is empty.
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ready(_) => None,
            Self::Unavailable { reason } => Some(reason),
        }
    }
}

impl<P: ?Sized> Clone for ProviderSlot<P> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(provider) => Self::Ready(Arc::clone(provider)),
            Self::Unavailable { reason } => Self::Unavailable {
                reason: reason.clone(),
            },
        }
    }
}

impl<P: ?Sized> std::fmt::Debug for ProviderSlot<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("ProviderSlot::Ready"),
            Self::Unavailable { reason } => f
                .debug_struct("ProviderSlot::Unavailable")
                .field("reason", reason)
                .finish(),
        }
    }
}

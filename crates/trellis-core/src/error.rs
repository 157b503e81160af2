use std::fmt;

/// Error produced by a logical handler during dispatch. Routed to the owning
/// view's error handler instead of propagating out of the native listener.
pub type HandlerError = Box<dyn std::error::Error>;

/// Bind-time failures. The validation-only variants are raised when
/// [`HostEnv::validate`](crate::env::HostEnv::validate) is set; production
/// mode skips those checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    EmptyEvent,
    UnknownOutput { unit: &'static str, event: String },
    NotSubscribable { property: String, slot: usize },
    MissingSlot { slot: usize, expected: &'static str },
    LedgerMismatch { index: usize },
    ViewDestroyed,
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::EmptyEvent => write!(f, "event name must be non-empty"),
            BindError::UnknownOutput { unit, event } => {
                write!(f, "behavior unit {unit} declares no output named {event:?}")
            }
            BindError::NotSubscribable { property, slot } => {
                write!(
                    f,
                    "output property {property:?} on unit slot {slot} is not subscribable"
                )
            }
            BindError::MissingSlot { slot, expected } => {
                write!(f, "view slot {slot} missing; expected {expected}")
            }
            BindError::LedgerMismatch { index } => {
                write!(
                    f,
                    "cleanup ledger entry {index} does not match the per-instance cleanup list"
                )
            }
            BindError::ViewDestroyed => write!(f, "view has already been destroyed"),
        }
    }
}

impl std::error::Error for BindError {}

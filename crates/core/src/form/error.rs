/// Errors reported by [`Form`](super::Form) operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormError {
    /// No field, option or submit control matches.
    #[error("{0}")]
    ElementNotFound(String),

    /// A control with this name exists but is not of the requested kind.
    #[error("No {expected} named {name}")]
    WrongElementType { name: String, expected: &'static str },

    /// Several submit controls match the identifier.
    #[error("{0}")]
    AmbiguousSelection(String),

    /// The value's shape is not accepted by the control.
    #[error("Invalid value for {name}: {reason}")]
    InvalidValue { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, FormError>;

use thiserror::Error;

/// Errors raised while building the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{kind} `{name}` is already defined")]
    DuplicateName { kind: &'static str, name: String },
    #[error("{kind} name cannot be empty")]
    EmptyName { kind: &'static str },
    #[error("{kind} name `{name}` is not a valid identifier")]
    InvalidName { kind: &'static str, name: String },
    #[error("{kind} `{name}` is not defined")]
    Undefined { kind: &'static str, name: String },
    #[error("array `{name}` has a dimension of size zero")]
    ZeroExtent { name: String },
}

use snafu::Snafu;

pub type Result<T, E = TreeError> = std::result::Result<T, E>;

/// Contract failures of the tree itself.
///
/// These never describe bad user input: an [`TreeError::InvariantViolation`]
/// means the core produced or was handed a malformed tree.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TreeError {
    #[snafu(display("Invariant violation: {message}"))]
    InvariantViolation { message: String },

    #[snafu(display("Tree builder was built without any pushed node"))]
    EmptyBuilder,
}

/// Abort the current operation on a broken tree invariant.
#[cold]
#[track_caller]
pub(crate) fn violation(message: impl Into<String>) -> ! {
    let err = TreeError::InvariantViolation {
        message: message.into(),
    };
    panic!("{err}")
}

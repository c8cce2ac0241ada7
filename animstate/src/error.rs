use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("unknown animation: {name}")]
    UnknownAnimation { name: String },

    #[error("duplicate animation name: {name}")]
    DuplicateAnimation { name: String },

    #[error("invalid value: {message}")]
    InvalidValue { message: String },

    #[error("track entry is no longer alive")]
    StaleEntry,
}

impl Error {
    pub(crate) fn invalid_value(message: impl Into<String>) -> Self {
        Self::InvalidValue {
            message: message.into(),
        }
    }
}

use thiserror::Error;

/// Request validation failures, raised before any store access.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid User id")]
    InvalidOwner,

    #[error("Invalid Category id")]
    InvalidCategory,

    #[error("Invalid {resource} id")]
    InvalidResource { resource: &'static str },

    #[error("Invalid date for {field}: {value}")]
    InvalidDate { field: &'static str, value: String },

    #[error("startDate must not be later than endDate")]
    InvalidDateRange,

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },
}

impl ValidationError {
    /// Name of the request field the error refers to, as the client sent it
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::InvalidOwner => "userId",
            ValidationError::InvalidCategory => "categoryId",
            ValidationError::InvalidResource { resource } => resource,
            ValidationError::InvalidDate { field, .. } => field,
            ValidationError::InvalidDateRange => "startDate",
            ValidationError::MissingField { field } => field,
        }
    }
}

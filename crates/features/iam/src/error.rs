use std::borrow::Cow;

/// A specialized [`IamError`] enum of this crate.
#[velaux_derive::velaux_error]
pub enum IamError {
    /// Malformed RBAC rules or identity headers.
    #[error("IAM validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// The permission backend could not reach a decision.
    #[error("Permission check failed{}: {message}", format_context(.context))]
    Backend { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    /// Internal fallback for unexpected issues or logic errors.
    #[error("Internal feature error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

use serde::{Deserialize, Serialize};
use std::{borrow::Cow, fmt};

type Text = Cow<'static, str>;

/// A failure description carried by a failed [`crate::Outcome`].
///
/// The well-known errors are associated constants; `Error::NONE` is the
/// "no error" sentinel and never appears inside a failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Error {
    code: Text,
    message: Text,
    #[serde(default)]
    details: Text,
}

impl Error {
    pub const NONE: Error = Error::fixed("", "");
    pub const NOT_FOUND: Error =
        Error::fixed("General.NotFound", "The specified resource was not found.");
    pub const VALIDATION_FAILED: Error = Error::fixed(
        "General.ValidationFailed",
        "One or more validation errors occurred.",
    );
    pub const UNAUTHORIZED: Error = Error::fixed(
        "General.Unauthorized",
        "The current user is not authorized to perform this operation.",
    );
    pub const CONFLICT: Error = Error::fixed(
        "General.Conflict",
        "A conflict occurred while processing the request.",
    );
    pub const OPERATION_FAILED: Error = Error::fixed(
        "General.OperationFailed",
        "The operation failed to complete.",
    );

    pub const GENERAL_CODE: &'static str = "General.Error";

    const fn fixed(code: &'static str, message: &'static str) -> Self {
        Self {
            code: Cow::Borrowed(code),
            message: Cow::Borrowed(message),
            details: Cow::Borrowed(""),
        }
    }

    pub fn new(code: impl Into<Text>, message: impl Into<Text>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Cow::Borrowed(""),
        }
    }

    /// An ad-hoc error with the `General.Error` code.
    pub fn general(message: impl Into<Text>) -> Self {
        Self::new(Self::GENERAL_CODE, message)
    }

    /// Same code and message, with `details` attached.
    pub fn with_details(&self, details: impl Into<Text>) -> Self {
        Self {
            code: self.code.clone(),
            message: self.message.clone(),
            details: details.into(),
        }
    }

    /// Same code, different message.
    pub fn with_message(&self, message: impl Into<Text>) -> Self {
        Self {
            code: self.code.clone(),
            message: message.into(),
            details: self.details.clone(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn details(&self) -> &str {
        &self.details
    }

    pub fn is_none(&self) -> bool {
        self.code.is_empty() && self.message.is_empty()
    }
}

impl Default for Error {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)?;
        if !self.details.is_empty() {
            write!(f, " ({})", self.details)?;
        }
        Ok(())
    }
}

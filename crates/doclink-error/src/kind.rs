//! Error kinds for doclink operations

use strum_macros::{Display, IntoStaticStr};

/// The kind of error that occurred.
///
/// This enum categorizes errors to help users write clear error handling logic.
/// Users can match on ErrorKind to decide how to handle specific error cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoStaticStr, Display)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// The requested feature or operation is not supported
    Unsupported,

    /// Invalid configuration or parameters
    ConfigInvalid,

    // =========================================================================
    // Input errors
    // =========================================================================
    /// A symbol graph failed structural validation
    GraphInvalid,

    /// Decoding a symbol graph, entity list, or hierarchy file failed
    DecodeFailed,

    /// Encoding a hierarchy file failed
    EncodeFailed,

    // =========================================================================
    // Resolution errors
    // =========================================================================
    /// Link resolution failed and no fallback produced a result
    ResolutionFailed,

    /// A reference names a bundle that is neither local nor registered
    BundleUnknown,

    /// An external resolver returned no result for a reference it owns
    ExternalResolutionFailed,

    // =========================================================================
    // Registration errors
    // =========================================================================
    /// A bundle id was registered twice
    BundleAlreadyRegistered,

    /// Mutation was attempted after the resolver was frozen
    ResolverFrozen,

    // =========================================================================
    // File/IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,

    // =========================================================================
    // Validation errors
    // =========================================================================
    /// Invalid argument passed to function
    InvalidArgument,

    /// Hierarchy invariant violation
    InvariantViolation,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::IoFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::GraphInvalid.to_string(), "GraphInvalid");
        assert_eq!(ErrorKind::BundleUnknown.to_string(), "BundleUnknown");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::IoFailed.is_retryable());
        assert!(!ErrorKind::DecodeFailed.is_retryable());
        assert!(!ErrorKind::ResolutionFailed.is_retryable());
    }
}

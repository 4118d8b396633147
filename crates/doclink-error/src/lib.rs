//! # doclink-error
//!
//! Unified error handling for doclink.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what error occurred (e.g., GraphInvalid, BundleUnknown)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Assist in locating the cause with rich context
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use doclink_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::GraphInvalid, "relationship names unknown symbol")
//!         .with_operation("builder::add_symbol_graph")
//!         .with_context("module", "MyKit")
//!         .with_context("source", "s:4MyKit3FooV"))
//! }
//! ```
//!
//! ## Principles
//!
//! - Fallible public operations outside the structured resolution taxonomy
//!   return `Result<T, doclink_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Don't abuse `From<OtherError>` to prevent raw error leakage
//!
//! Resolution failures that carry candidate lists for diagnostics are a
//! separate structured type in `doclink-core`; this crate covers everything
//! else (decoding, archives, registration, programmer-facing failures).

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using doclink Error
pub type Result<T> = std::result::Result<T, Error>;

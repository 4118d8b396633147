//! Consumed fallback-resolver interface.
//!
//! When the path hierarchy has no match for a link, the resolver asks each
//! registered fallback resolver about a fixed sequence of candidate URLs
//! derived from the link and its context. Fallback resolution is a policy
//! layer over external content; it is not a retry of the core search.
//! Successful answers are cached by absolute URL in a concurrent map so
//! parallel resolution never asks the same question twice.

use dashmap::DashMap;

use doclink_error::Result;

use crate::reference::{ResolvedReference, UnresolvedReference};

/// An out-of-band resolver consulted when the hierarchy has no match.
pub trait FallbackResolver: Send + Sync {
    /// Try to resolve `reference`. `parent` is the reference the link was
    /// written in, when known; `is_symbol_link` mirrors the original
    /// request.
    fn resolve(
        &self,
        reference: &UnresolvedReference,
        parent: Option<&ResolvedReference>,
        is_symbol_link: bool,
    ) -> Result<ResolvedReference>;
}

/// Concurrent cache of successful fallback resolutions, keyed by the
/// absolute candidate URL.
pub type FallbackCache = DashMap<String, ResolvedReference>;

impl<F> FallbackResolver for F
where
    F: Fn(&UnresolvedReference, Option<&ResolvedReference>, bool) -> Result<ResolvedReference>
        + Send
        + Sync,
{
    fn resolve(
        &self,
        reference: &UnresolvedReference,
        parent: Option<&ResolvedReference>,
        is_symbol_link: bool,
    ) -> Result<ResolvedReference> {
        self(reference, parent, is_symbol_link)
    }
}

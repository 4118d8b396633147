//! Structured resolution failures.
//!
//! Every variant carries enough context for the diagnostics layer to format
//! a precise message with fix-it replacements: the node where descent
//! stopped, the components that were left to resolve, and (for
//! disambiguation failures) the colliding candidates with the suffix that
//! would select each of them. `Display` gives the terse single-line form.

use std::fmt;

use crate::component::PathComponent;
use crate::disambiguation::Candidate;
use crate::node::NodeId;

/// Why a link failed to resolve against the hierarchy.
#[derive(Debug, Clone)]
pub enum ResolveError {
    /// The first component matched no root.
    NotFound {
        /// The components that were never consumed.
        remaining: Vec<PathComponent>,
        /// Every top-level name the first component could have matched.
        available: Vec<String>,
    },
    /// Descent found a node whose identifier was cleared (an unfindable
    /// placeholder or an unregistered page).
    UnfindableMatch { node: NodeId },
    /// A symbol link matched a page that is not a symbol.
    NonSymbolMatchForSymbolLink,
    /// A mid-descent component named no child of the partial match.
    UnknownName {
        /// The node the link resolved to so far.
        partial: NodeId,
        /// The components from the failing one onward.
        remaining: Vec<PathComponent>,
    },
    /// The child name exists, but nothing matches the written `(kind, hash)`.
    UnknownDisambiguation {
        partial: NodeId,
        remaining: Vec<PathComponent>,
        /// Every same-named sibling with its correct suffix.
        candidates: Vec<Candidate>,
    },
    /// Two or more children tie for the written component.
    LookupCollision {
        partial: NodeId,
        remaining: Vec<PathComponent>,
        /// The tied candidates with their discriminating suffixes.
        candidates: Vec<Candidate>,
    },
}

impl ResolveError {
    /// The component that caused the failure, when one exists.
    pub fn failing_component(&self) -> Option<&PathComponent> {
        match self {
            ResolveError::NotFound { remaining, .. }
            | ResolveError::UnknownName { remaining, .. }
            | ResolveError::UnknownDisambiguation { remaining, .. }
            | ResolveError::LookupCollision { remaining, .. } => remaining.first(),
            ResolveError::UnfindableMatch { .. } | ResolveError::NonSymbolMatchForSymbolLink => {
                None
            }
        }
    }
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound { remaining, .. } => match remaining.first() {
                Some(component) => {
                    write!(f, "'{}' doesn't match any top-level page", component.full)
                }
                None => write!(f, "the link is empty"),
            },
            ResolveError::UnfindableMatch { .. } => {
                write!(f, "the matched page can't be linked to in this build")
            }
            ResolveError::NonSymbolMatchForSymbolLink => {
                write!(f, "symbol links can only resolve symbols")
            }
            ResolveError::UnknownName { remaining, .. } => match remaining.first() {
                Some(component) => write!(f, "'{}' doesn't exist here", component.full),
                None => write!(f, "a path component doesn't exist here"),
            },
            ResolveError::UnknownDisambiguation {
                remaining,
                candidates,
                ..
            } => {
                let written = remaining.first().map(|c| c.full.as_str()).unwrap_or("");
                write!(
                    f,
                    "'{}' doesn't match any of {} possible disambiguations",
                    written,
                    candidates.len()
                )
            }
            ResolveError::LookupCollision {
                remaining,
                candidates,
                ..
            } => {
                let written = remaining.first().map(|c| c.full.as_str()).unwrap_or("");
                write!(
                    f,
                    "'{}' is ambiguous between {} pages",
                    written,
                    candidates.len()
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}

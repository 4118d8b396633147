//! Resolution failures formatted for authors.
//!
//! Converts a structured [`ResolveError`] into a human-readable message plus
//! fix-it solutions. Every replacement range is expressed in bytes relative
//! to the body of the original link, so callers can translate ranges into
//! source coordinates regardless of where the link appeared.

use std::ops::Range;

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Config, Matcher, Utf32Str};

use doclink_core::error::ResolveError;
use doclink_core::{Candidate, Hierarchy, NodeId};

/// How many near-miss suggestions a single diagnostic offers.
const MAX_SUGGESTIONS: usize = 3;

/// A human-readable resolution failure with fix-it solutions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorInfo {
    pub message: String,
    pub solutions: Vec<Solution>,
}

impl ErrorInfo {
    /// A message-only diagnostic with no replacements to offer.
    pub fn message_only(message: impl Into<String>) -> Self {
        ErrorInfo {
            message: message.into(),
            solutions: Vec::new(),
        }
    }
}

impl From<&doclink_error::Error> for ErrorInfo {
    fn from(error: &doclink_error::Error) -> Self {
        ErrorInfo::message_only(error.to_string())
    }
}

/// One way to fix the link, as a summary plus text replacements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    pub summary: String,
    pub replacements: Vec<Replacement>,
}

/// A text edit within the link body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub range: Range<usize>,
    pub text: String,
}

/// Format a resolution failure against the hierarchy it came from. `link` is
/// the body the failing components were parsed from; replacement ranges
/// index into it.
pub fn error_info(hierarchy: &Hierarchy, link: &str, error: &ResolveError) -> ErrorInfo {
    match error {
        ResolveError::NotFound {
            remaining,
            available,
        } => {
            let Some(first) = remaining.first() else {
                return ErrorInfo::message_only("The link doesn't contain a path.");
            };
            let solutions = near_misses(&first.name, available.iter().cloned())
                .into_iter()
                .map(|suggestion| Solution {
                    summary: format!("Replace '{}' with '{}'.", first.full, suggestion),
                    replacements: vec![Replacement {
                        range: first.range(),
                        text: suggestion,
                    }],
                })
                .collect();
            ErrorInfo {
                message: format!("No top-level page or module named '{}'.", first.full),
                solutions,
            }
        }

        ResolveError::UnfindableMatch { node } => ErrorInfo::message_only(format!(
            "'{}' can't be linked to in a partial documentation build.",
            hierarchy.node(*node).name()
        )),

        ResolveError::NonSymbolMatchForSymbolLink => ErrorInfo {
            message: "Symbol links can only resolve symbols.".to_string(),
            solutions: vec![Solution {
                summary: "Use a '<doc:>' style reference.".to_string(),
                replacements: vec![
                    Replacement {
                        range: 0..0,
                        text: "<doc:".to_string(),
                    },
                    Replacement {
                        range: link.len()..link.len(),
                        text: ">".to_string(),
                    },
                ],
            }],
        },

        ResolveError::UnknownName { partial, remaining } => {
            let Some(first) = remaining.first() else {
                return ErrorInfo::message_only("A path component doesn't exist.".to_string());
            };
            let siblings = hierarchy.child_names_matching(*partial, first);
            let solutions = near_misses(&first.name, siblings.into_iter())
                .into_iter()
                .map(|suggestion| Solution {
                    summary: format!("Replace '{}' with '{}'.", first.full, suggestion),
                    replacements: vec![Replacement {
                        range: first.range(),
                        text: suggestion,
                    }],
                })
                .collect();
            ErrorInfo {
                message: format!(
                    "'{}' doesn't exist at '/{}'.",
                    first.full,
                    hierarchy.display_path(*partial)
                ),
                solutions,
            }
        }

        ResolveError::UnknownDisambiguation {
            partial,
            remaining,
            candidates,
        } => {
            let Some(first) = remaining.first() else {
                return ErrorInfo::message_only("A disambiguation doesn't match.".to_string());
            };
            let written = &first.full[first.name.len()..];
            let solutions = candidates
                .iter()
                .map(|candidate| {
                    let suffix = candidate.disambiguation.suffix();
                    let summary = if suffix.is_empty() {
                        format!(
                            "Remove '{}' to refer to '{}'.",
                            written,
                            candidate_label(hierarchy, candidate)
                        )
                    } else {
                        format!(
                            "Replace '{}' with '{}' to refer to '{}'.",
                            written,
                            suffix,
                            candidate_label(hierarchy, candidate)
                        )
                    };
                    Solution {
                        summary,
                        replacements: vec![Replacement {
                            range: first.disambiguation_range(),
                            text: suffix,
                        }],
                    }
                })
                .collect();
            ErrorInfo {
                message: format!(
                    "'{}' doesn't match any known disambiguation for '{}' at '/{}'.",
                    written,
                    first.name,
                    hierarchy.display_path(*partial)
                ),
                solutions,
            }
        }

        ResolveError::LookupCollision {
            partial,
            remaining,
            candidates,
        } => {
            let Some(first) = remaining.first() else {
                return ErrorInfo::message_only("A path component is ambiguous.".to_string());
            };
            let solutions = candidates
                .iter()
                .map(|candidate| {
                    let suffix = candidate.disambiguation.suffix();
                    let label = candidate_label(hierarchy, candidate);
                    let summary = if suffix.is_empty() {
                        format!("Leave '{}' as is to refer to '{}'.", first.name, label)
                    } else {
                        format!("Insert '{suffix}' to refer to '{label}'.")
                    };
                    Solution {
                        summary,
                        replacements: vec![Replacement {
                            range: first.disambiguation_range(),
                            text: suffix,
                        }],
                    }
                })
                .collect();
            ErrorInfo {
                message: format!(
                    "'{}' is ambiguous at '/{}'.",
                    first.full,
                    hierarchy.display_path(*partial)
                ),
                solutions,
            }
        }
    }
}

/// The candidate's declaration text when the symbol graph carried one, its
/// display name otherwise.
fn candidate_label(hierarchy: &Hierarchy, candidate: &Candidate) -> String {
    node_label(hierarchy, candidate.node)
}

fn node_label(hierarchy: &Hierarchy, node: NodeId) -> String {
    let node = hierarchy.node(node);
    match node.symbol().and_then(|symbol| symbol.declaration.clone()) {
        Some(declaration) => declaration,
        None => node.name().to_string(),
    }
}

/// Rank `candidates` by similarity to `query`, best first.
///
/// A candidate qualifies when it is within a small edit-distance budget
/// (typos) or fuzzy-matches the query as a subsequence (partial names).
/// Ordering is edit distance, then fuzzy score, then name, so the output is
/// deterministic.
fn near_misses(query: &str, candidates: impl Iterator<Item = String>) -> Vec<String> {
    let mut matcher = Matcher::new(Config::DEFAULT);
    let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
    let budget = (query.chars().count() / 3).max(1);

    let mut scored: Vec<(usize, std::cmp::Reverse<u32>, String)> = candidates
        .filter_map(|candidate| {
            let distance = edit_distance(query, &candidate);
            let mut buf = Vec::new();
            // Subsequence matches on one or two characters are noise.
            let fuzzy = if query.chars().count() >= 3 {
                pattern.score(Utf32Str::new(&candidate, &mut buf), &mut matcher)
            } else {
                None
            };
            if distance > budget && fuzzy.is_none() {
                return None;
            }
            Some((distance, std::cmp::Reverse(fuzzy.unwrap_or(0)), candidate))
        })
        .collect();
    scored.sort();
    scored.truncate(MAX_SUGGESTIONS);
    scored.into_iter().map(|(_, _, name)| name).collect()
}

/// Levenshtein distance over characters, single-row DP.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut current = Vec::with_capacity(b.len() + 1);
        current.push(i + 1);
        for (j, cb) in b.iter().enumerate() {
            let substitute = previous[j] + usize::from(ca != cb);
            let delete = previous[j + 1] + 1;
            let insert = current[j] + 1;
            current.push(substitute.min(delete).min(insert));
        }
        previous = current;
    }
    previous[b.len()]
}

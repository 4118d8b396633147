//! Link-text parsing.
//!
//! A documentation link is a `/`-separated sequence of path components, each
//! optionally carrying trailing disambiguation (`name-kind`, `name-hash`, or
//! `name-kind-hash`), plus an optional `#fragment` on the last component.
//!
//! Parsing never fails: a suffix that is neither a recognized kind nor a
//! valid hash is part of the name, because names may legitimately contain
//! hyphens. Each component remembers its byte range inside the original link
//! so diagnostics can point replacements at the exact spot the author wrote.

use std::ops::Range;

use smallvec::SmallVec;

use crate::kind::{is_recognized_kind, is_valid_hash, split_language_prefix};

/// Well-known leading segment for symbol documentation links.
pub const DOCUMENTATION_PREFIX: &str = "documentation";
/// Well-known leading segment for tutorial links.
pub const TUTORIALS_PREFIX: &str = "tutorials";

/// Parsed path components; links rarely exceed a handful of segments.
pub type Components = SmallVec<[PathComponent; 8]>;

/// One segment of a documentation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathComponent {
    /// The segment exactly as written, including any disambiguation.
    pub full: String,
    /// The name with recognized disambiguation suffixes stripped.
    pub name: String,
    /// Kind disambiguation, kept verbatim (may be language-qualified).
    pub kind: Option<String>,
    /// Stable-hash disambiguation.
    pub hash: Option<String>,
    /// Byte offset of `full` within the link text this was parsed from.
    pub offset: usize,
    /// True for the component produced from a `#fragment`.
    pub fragment: bool,
}

impl PathComponent {
    /// Parse a single segment without positional information.
    pub fn parse(segment: &str) -> Self {
        Self::parse_at(segment, 0)
    }

    /// Parse a single segment located at `offset` in the original link.
    pub fn parse_at(segment: &str, offset: usize) -> Self {
        let (name, kind, hash) = split_disambiguation(segment);
        PathComponent {
            full: segment.to_string(),
            name: name.to_string(),
            kind: kind.map(str::to_string),
            hash: hash.map(str::to_string),
            offset,
            fragment: false,
        }
    }

    fn anchor(text: &str, offset: usize) -> Self {
        PathComponent {
            full: text.to_string(),
            name: text.to_string(),
            kind: None,
            hash: None,
            offset,
            fragment: true,
        }
    }

    /// The byte range of this component within the original link text.
    #[inline]
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.full.len()
    }

    /// The byte range of the disambiguation suffix, empty when there is none.
    pub fn disambiguation_range(&self) -> Range<usize> {
        self.offset + self.name.len()..self.offset + self.full.len()
    }

    /// The language qualifier of the kind disambiguation, if one was written.
    pub fn language(&self) -> Option<&str> {
        split_language_prefix(self.kind.as_deref()?).0
    }

    /// True when the component carries neither kind nor hash disambiguation.
    #[inline]
    pub fn is_plain(&self) -> bool {
        self.kind.is_none() && self.hash.is_none()
    }
}

impl std::fmt::Display for PathComponent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.full)
    }
}

/// A fully parsed link: its components and whether it was written absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLink {
    pub components: Components,
    pub is_absolute: bool,
}

impl ParsedLink {
    /// True when the link carried no components at all.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// Parse a link, collapsing empty components.
pub fn parse_link(raw: &str) -> ParsedLink {
    parse_link_with(raw, true)
}

/// Parse a link. When `omit_empty` is false, empty segments between slashes
/// are kept as empty components.
///
/// A link is absolute when it starts with `/`, or when its first component is
/// one of the well-known `documentation` / `tutorials` segments; those
/// bookkeeping segments are stripped.
pub fn parse_link_with(raw: &str, omit_empty: bool) -> ParsedLink {
    let mut is_absolute = raw.starts_with('/');

    let mut segments: SmallVec<[(usize, &str); 8]> = SmallVec::new();
    let mut offset = 0;
    for segment in raw.split('/') {
        if !(segment.is_empty() && omit_empty) {
            segments.push((offset, segment));
        }
        offset += segment.len() + 1;
    }

    if let Some((_, first)) = segments.first() {
        if *first == DOCUMENTATION_PREFIX || *first == TUTORIALS_PREFIX {
            is_absolute = true;
            segments.remove(0);
        }
    }

    let mut components: Components = SmallVec::new();
    let last = segments.len().checked_sub(1);
    for (index, (offset, segment)) in segments.into_iter().enumerate() {
        let is_last = Some(index) == last;
        if is_last && segment.contains('#') {
            let (page, anchor) = segment.split_once('#').expect("checked for '#'");
            if !page.is_empty() {
                components.push(PathComponent::parse_at(page, offset));
            }
            if !anchor.is_empty() {
                components.push(PathComponent::anchor(anchor, offset + page.len() + 1));
            }
            continue;
        }
        components.push(PathComponent::parse_at(segment, offset));
    }

    ParsedLink {
        components,
        is_absolute,
    }
}

/// Split trailing disambiguation off a segment.
///
/// Returns `(name, kind, hash)`. The suffix rules, applied at the last `-`:
/// a recognized kind wins first (the remaining prefix may still carry a
/// hash), then a valid hash (the remaining prefix may still carry a kind),
/// otherwise the whole segment is the name.
fn split_disambiguation(segment: &str) -> (&str, Option<&str>, Option<&str>) {
    let Some((prefix, suffix)) = segment.rsplit_once('-') else {
        return (segment, None, None);
    };
    if prefix.is_empty() {
        return (segment, None, None);
    }

    if is_recognized_kind(suffix) {
        if let Some((inner, maybe_hash)) = prefix.rsplit_once('-') {
            if !inner.is_empty() && is_valid_hash(maybe_hash) {
                return (inner, Some(suffix), Some(maybe_hash));
            }
        }
        return (prefix, Some(suffix), None);
    }

    if is_valid_hash(suffix) {
        if let Some((inner, maybe_kind)) = prefix.rsplit_once('-') {
            if !inner.is_empty() && is_recognized_kind(maybe_kind) {
                return (inner, Some(maybe_kind), Some(suffix));
            }
        }
        return (prefix, None, Some(suffix));
    }

    (segment, None, None)
}

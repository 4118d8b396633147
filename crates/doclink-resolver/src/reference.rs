//! Resolved and unresolved references.
//!
//! A resolved reference is the currency the resolver hands back: which
//! bundle a page lives in, its pooled topic identifier, its absolute path,
//! the source languages it is available in, and an optional fragment for
//! on-page anchors. An unresolved reference is the parsed form of link text
//! before resolution: an optional bundle id (from `doc://bundle/...`
//! links), the path, and the fragment.

use std::collections::BTreeSet;

use doclink_core::symbol_graph::Symbol;
use doclink_core::{kind, url_readable};

use crate::pool::{TopicCategory, TopicId, TopicPool};

/// A fully resolved documentation reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    /// The bundle the page belongs to.
    pub bundle: String,
    /// Pooled identifier; equality shortcut for "is this the same page".
    pub topic: TopicId,
    /// Absolute path, e.g. `/documentation/MyKit/Foo-struct/bar()`.
    pub path: String,
    /// Source languages the page is available in.
    pub languages: BTreeSet<String>,
    /// On-page fragment for anchors, task groups, and landmarks.
    pub fragment: Option<String>,
}

impl ResolvedReference {
    /// A reference for a symbol given its module and bundle, addressed by
    /// its declared path components. Contexts that have a built hierarchy
    /// use the emitted disambiguated paths instead.
    pub fn for_symbol(symbol: &Symbol, module: &str, bundle: &str) -> Self {
        let mut path = format!("/documentation/{}", url_readable(module));
        for component in &symbol.path_components {
            path.push('/');
            path.push_str(&url_readable(component));
        }
        let category = if symbol.kind.identifier == kind::MODULE_KIND {
            TopicCategory::Module
        } else {
            TopicCategory::Symbol
        };
        let topic = TopicPool::global().intern(
            category,
            &symbol.identifier.precise,
            None,
            Some(bundle),
            Some(symbol.name()),
        );
        ResolvedReference {
            bundle: bundle.to_string(),
            topic,
            path,
            languages: BTreeSet::from([symbol.identifier.interface_language.clone()]),
            fragment: None,
        }
    }

    /// A reference for a non-symbol page at a known absolute path.
    pub fn for_page(
        category: TopicCategory,
        bundle: &str,
        path: impl Into<String>,
        display_name: &str,
    ) -> Self {
        let path = path.into();
        let topic =
            TopicPool::global().intern(category, &path, None, Some(bundle), Some(display_name));
        ResolvedReference {
            bundle: bundle.to_string(),
            topic,
            path,
            languages: BTreeSet::new(),
            fragment: None,
        }
    }

    /// This reference with an on-page fragment attached, re-interned under
    /// the given category.
    pub fn with_fragment(&self, category: TopicCategory, fragment: &str) -> Self {
        let pool = TopicPool::global();
        let id = pool.id_string(self.topic);
        let topic = pool.intern(
            category,
            &id,
            Some(fragment),
            Some(&self.bundle),
            pool.display_name(self.topic).as_deref(),
        );
        ResolvedReference {
            bundle: self.bundle.clone(),
            topic,
            path: self.path.clone(),
            languages: self.languages.clone(),
            fragment: Some(fragment.to_string()),
        }
    }

    /// The absolute URL form, `doc://bundle/path#fragment`.
    pub fn url(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("doc://{}{}#{}", self.bundle, self.path, fragment),
            None => format!("doc://{}{}", self.bundle, self.path),
        }
    }
}

/// Link text parsed into its addressing parts, before resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedReference {
    /// Bundle id from a `doc://bundle/...` link, absent for bare links.
    pub bundle: Option<String>,
    /// The path portion, without the fragment.
    pub path: String,
    /// The fragment, without the `#`.
    pub fragment: Option<String>,
}

impl UnresolvedReference {
    /// Parse link text. Accepts bare paths, `doc:path`, and
    /// `doc://bundle/path` forms; the fragment is split off the end.
    pub fn parse(link: &str) -> Self {
        let rest = link.strip_prefix("doc:").unwrap_or(link);
        let (bundle, rest) = match rest.strip_prefix("//") {
            Some(authority_and_path) => match authority_and_path.split_once('/') {
                Some((bundle, path)) => (Some(bundle.to_string()), format!("/{path}")),
                None => (Some(authority_and_path.to_string()), String::new()),
            },
            None => (None, rest.to_string()),
        };
        let (path, fragment) = match rest.split_once('#') {
            Some((path, fragment)) => (path.to_string(), Some(fragment.to_string())),
            None => (rest, None),
        };
        UnresolvedReference {
            bundle,
            path,
            fragment,
        }
    }

    /// The link body to resolve: path plus fragment, exactly as written.
    pub fn link_text(&self) -> String {
        match &self.fragment {
            Some(fragment) => format!("{}#{}", self.path, fragment),
            None => self.path.clone(),
        }
    }

    /// The placeholder topic identifier for this unresolved reference.
    pub fn topic(&self) -> TopicId {
        TopicPool::global().unresolved(&self.link_text())
    }
}

impl std::fmt::Display for UnresolvedReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.bundle {
            Some(bundle) => write!(f, "doc://{}{}", bundle, self.link_text()),
            None => write!(f, "{}", self.link_text()),
        }
    }
}

//! The link resolution service.
//!
//! A [`LinkResolver`] owns a built [`Hierarchy`] for one local bundle and
//! the bidirectional mapping between findable pages and their resolved
//! references. Links naming another bundle are dispatched to that bundle's
//! registered external resolver; links the hierarchy cannot match are
//! offered to the fallback-resolver chain before the failure is formatted
//! into a diagnostic.
//!
//! The reference map is immutable after construction, so resolution is safe
//! to run from many threads once [`LinkResolver::freeze`] marked the end of
//! the registration phase. The only mutation during resolution is the
//! fallback cache, which is a concurrent map.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rayon::prelude::*;

use doclink_core::kind::MODULE_KIND;
use doclink_core::{Hierarchy, LinkId, NodeId, PageKind, parse_link, url_readable};

use crate::diagnostics::{self, ErrorInfo};
use crate::external::ExternalResolver;
use crate::fallback::{FallbackCache, FallbackResolver};
use crate::pool::{TopicCategory, TopicPool};
use crate::reference::{ResolvedReference, UnresolvedReference};

/// Resolves documentation links for a local bundle, with external-bundle
/// dispatch and fallback resolution.
pub struct LinkResolver {
    bundle: String,
    hierarchy: Hierarchy,
    references: HashMap<LinkId, ResolvedReference>,
    ids_by_url: HashMap<String, LinkId>,
    external: BTreeMap<String, Arc<dyn ExternalResolver>>,
    fallbacks: Vec<Arc<dyn FallbackResolver>>,
    fallback_cache: FallbackCache,
    frozen: bool,
}

impl LinkResolver {
    /// Build the resolver for a bundle over its finished hierarchy.
    ///
    /// The reference map fans out per findable page; each page's reference
    /// is computed independently (map-only, no cross-page reductions).
    pub fn new(bundle: impl Into<String>, hierarchy: Hierarchy) -> Self {
        let bundle = bundle.into();
        let paths = hierarchy.disambiguated_paths();
        let entries = hierarchy.lookup_entries();

        let phase_one: Vec<(LinkId, Option<ResolvedReference>)> = entries
            .par_iter()
            .map(|&(id, node)| (id, direct_reference(&hierarchy, &paths, &bundle, node)))
            .collect();
        let mut references: HashMap<LinkId, ResolvedReference> = phase_one
            .into_iter()
            .filter_map(|(id, reference)| Some((id, reference?)))
            .collect();

        // On-page children (anchors, task groups, landmarks) address their
        // owning page plus a fragment, so they need the owner's reference.
        for &(id, node) in &entries {
            if references.contains_key(&id) {
                continue;
            }
            let Some(kind) = hierarchy.node(node).page_kind() else {
                continue;
            };
            if !matches!(
                kind,
                PageKind::Anchor | PageKind::TaskGroup | PageKind::Landmark
            ) {
                continue;
            }
            let Some(owner) = hierarchy.parent_link_of(id) else {
                continue;
            };
            let Some(base) = references.get(&owner) else {
                continue;
            };
            let name = hierarchy.node(node).name().to_string();
            references.insert(
                id,
                base.with_fragment(TopicCategory::AnchorViaFragment, &name),
            );
        }

        let mut ids_by_url = HashMap::new();
        for &(id, _) in &entries {
            if let Some(reference) = references.get(&id) {
                ids_by_url.entry(reference.url()).or_insert(id);
            }
        }
        tracing::debug!(bundle = %bundle, pages = references.len(), "built reference map");

        LinkResolver {
            bundle,
            hierarchy,
            references,
            ids_by_url,
            external: BTreeMap::new(),
            fallbacks: Vec::new(),
            fallback_cache: FallbackCache::default(),
            frozen: false,
        }
    }

    /// The local bundle id.
    #[inline]
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// The hierarchy this resolver answers from.
    #[inline]
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    /// Register the resolver for an external bundle.
    pub fn register_external(&mut self, bundle: impl Into<String>, resolver: Arc<dyn ExternalResolver>) {
        assert!(!self.frozen, "the resolver is frozen");
        self.external.insert(bundle.into(), resolver);
    }

    /// Append a fallback resolver to the chain.
    pub fn add_fallback(&mut self, fallback: Arc<dyn FallbackResolver>) {
        assert!(!self.frozen, "the resolver is frozen");
        self.fallbacks.push(fallback);
    }

    /// End the registration phase. After this, the resolver is read-only
    /// and resolution may run from many threads.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// True once [`Self::freeze`] was called.
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Resolve a link relative to an optional parent page.
    pub fn resolve(
        &self,
        link: &str,
        parent: Option<LinkId>,
        is_symbol_link: bool,
    ) -> Result<ResolvedReference, ErrorInfo> {
        let unresolved = UnresolvedReference::parse(link);

        if let Some(bundle) = &unresolved.bundle {
            if *bundle != self.bundle {
                return match self.external.get(bundle) {
                    Some(resolver) => resolver
                        .resolve(&unresolved, is_symbol_link)
                        .map_err(|err| ErrorInfo::from(&err)),
                    None => Err(ErrorInfo::from(&doclink_error::Error::bundle_unknown(
                        bundle.clone(),
                    ))),
                };
            }
        }

        let body = unresolved.link_text();
        let parsed = parse_link(&body);
        match self.hierarchy.find(&parsed, parent, is_symbol_link) {
            Ok(id) => self.references.get(&id).cloned().ok_or_else(|| {
                ErrorInfo::message_only(format!("'{body}' has no registered reference"))
            }),
            Err(error) => {
                if let Some(reference) =
                    self.resolve_with_fallbacks(&unresolved, parent, is_symbol_link)
                {
                    return Ok(reference);
                }
                Err(diagnostics::error_info(&self.hierarchy, &body, &error))
            }
        }
    }

    /// The canonical disambiguated URL path for every symbol.
    pub fn paths(&self) -> HashMap<String, String> {
        self.hierarchy.disambiguated_paths()
    }

    /// The reference of a findable page.
    pub fn reference_for(&self, id: LinkId) -> Option<&ResolvedReference> {
        self.references.get(&id)
    }

    /// The findable page of a reference.
    pub fn link_for(&self, reference: &ResolvedReference) -> Option<LinkId> {
        self.ids_by_url.get(&reference.url()).copied()
    }

    /// The nearest findable ancestor's reference.
    pub fn parent_of(&self, reference: &ResolvedReference) -> Option<ResolvedReference> {
        let id = self.link_for(reference)?;
        let parent = self.hierarchy.parent_link_of(id)?;
        self.references.get(&parent).cloned()
    }

    /// References of the module roots.
    pub fn modules(&self) -> Vec<ResolvedReference> {
        self.hierarchy
            .module_links()
            .into_iter()
            .filter_map(|id| self.references.get(&id).cloned())
            .collect()
    }

    /// References of the modules and their direct symbol children.
    pub fn top_level_symbols(&self) -> Vec<ResolvedReference> {
        self.hierarchy
            .top_level_symbols()
            .into_iter()
            .filter_map(|id| self.references.get(&id).cloned())
            .collect()
    }

    /// Invoke `visit` for every symbol reference and its parent reference.
    pub fn traverse_symbol_and_parent_pairs<F>(&self, mut visit: F)
    where
        F: FnMut(&ResolvedReference, Option<&ResolvedReference>),
    {
        self.hierarchy.traverse_symbol_and_parent_pairs(|id, parent| {
            if let Some(reference) = self.references.get(&id) {
                visit(reference, parent.and_then(|p| self.references.get(&p)));
            }
        });
    }

    /// Unregister a bundle.
    ///
    /// For the local bundle every findable page loses its identifier (the
    /// nodes stay in place so subtrees remain traversable during
    /// re-registration) and the bundle's roots stop anchoring resolution.
    /// For an external bundle the resolver table entry is dropped and its
    /// cached fallbacks are purged.
    pub fn remove_bundle(&mut self, bundle: &str) -> bool {
        assert!(!self.frozen, "the resolver is frozen");
        if bundle == self.bundle {
            let mut ids: Vec<LinkId> = self.references.keys().copied().collect();
            ids.sort();
            for id in ids {
                self.hierarchy.unregister(id);
            }
            for name in self.hierarchy.root_names() {
                self.hierarchy.remove_root(&name);
            }
            let removed = !self.references.is_empty();
            self.references.clear();
            self.ids_by_url.clear();
            self.fallback_cache.clear();
            tracing::debug!(bundle = %bundle, "unregistered local bundle");
            removed
        } else {
            let removed = self.external.remove(bundle).is_some();
            let prefix = format!("doc://{bundle}/");
            self.fallback_cache.retain(|url, _| !url.starts_with(&prefix));
            removed
        }
    }

    fn resolve_with_fallbacks(
        &self,
        unresolved: &UnresolvedReference,
        parent: Option<LinkId>,
        is_symbol_link: bool,
    ) -> Option<ResolvedReference> {
        if self.fallbacks.is_empty() {
            return None;
        }
        let parent_reference = parent.and_then(|id| self.references.get(&id));
        let candidates = self.candidate_urls(unresolved, parent_reference);

        for url in &candidates {
            if let Some(hit) = self.fallback_cache.get(url) {
                return Some(hit.clone());
            }
        }
        for fallback in &self.fallbacks {
            for url in &candidates {
                let candidate = UnresolvedReference::parse(url);
                if let Ok(resolved) = fallback.resolve(&candidate, parent_reference, is_symbol_link)
                {
                    tracing::trace!(url = %url, "fallback resolution hit");
                    self.fallback_cache.insert(url.clone(), resolved.clone());
                    return Some(resolved);
                }
            }
        }
        None
    }

    /// The fixed sequence of absolute URLs a miss is retried under.
    fn candidate_urls(
        &self,
        unresolved: &UnresolvedReference,
        parent: Option<&ResolvedReference>,
    ) -> Vec<String> {
        fn push(urls: &mut Vec<String>, url: String) {
            if !urls.contains(&url) {
                urls.push(url);
            }
        }

        let body = unresolved.link_text();
        let trimmed = body.trim_start_matches('/');
        let bundle = &self.bundle;
        let mut urls = Vec::new();

        push(
            &mut urls,
            format!("doc://{bundle}/documentation/{bundle}/{trimmed}"),
        );
        for technology in self.technology_names() {
            push(
                &mut urls,
                format!("doc://{bundle}/tutorials/{technology}/{trimmed}"),
            );
        }
        push(&mut urls, format!("doc://{bundle}/tutorials/{trimmed}"));
        if let Some(parent) = parent {
            push(&mut urls, format!("doc://{bundle}{}/{trimmed}", parent.path));
            if let Some(grandparent) = self.parent_of(parent) {
                push(
                    &mut urls,
                    format!("doc://{bundle}{}/{trimmed}", grandparent.path),
                );
            }
        }
        for module in self.hierarchy.module_names() {
            push(
                &mut urls,
                format!("doc://{bundle}/documentation/{module}/{trimmed}"),
            );
        }
        push(&mut urls, format!("doc://{bundle}/{trimmed}"));
        urls
    }

    fn technology_names(&self) -> Vec<String> {
        let modules = self.hierarchy.module_names();
        self.hierarchy
            .root_names()
            .into_iter()
            .filter(|name| !modules.contains(name))
            .collect()
    }
}

impl std::fmt::Debug for LinkResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkResolver")
            .field("bundle", &self.bundle)
            .field("pages", &self.references.len())
            .field("external", &self.external.len())
            .field("frozen", &self.frozen)
            .finish()
    }
}

/// The reference of a page whose path doesn't depend on another page's
/// reference. On-page children return `None` here and are filled in by the
/// second pass.
fn direct_reference(
    hierarchy: &Hierarchy,
    paths: &HashMap<String, String>,
    bundle: &str,
    node: NodeId,
) -> Option<ResolvedReference> {
    let n = hierarchy.node(node);

    if let Some(symbol) = n.symbol() {
        let path = match paths.get(&symbol.precise) {
            Some(path) => format!("/documentation{path}"),
            None => format!("/documentation/{}", url_path(hierarchy, node)),
        };
        let category = if symbol.kind_id == MODULE_KIND {
            TopicCategory::Module
        } else {
            TopicCategory::Symbol
        };
        let topic = TopicPool::global().intern(
            category,
            &symbol.precise,
            None,
            Some(bundle),
            Some(n.name()),
        );
        let mut reference = ResolvedReference {
            bundle: bundle.to_string(),
            topic,
            path,
            languages: Default::default(),
            fragment: None,
        };
        reference.languages.insert(symbol.language.clone());
        return Some(reference);
    }

    let (category, path) = match n.page_kind()? {
        PageKind::Article => (
            TopicCategory::Article,
            format!("/documentation/{}", url_path(hierarchy, node)),
        ),
        PageKind::Tutorial => (
            TopicCategory::Tutorial,
            format!("/tutorials/{}", url_path(hierarchy, node)),
        ),
        PageKind::TutorialOverview => (
            TopicCategory::TutorialTechnology,
            format!("/tutorials/{}", url_readable(n.name())),
        ),
        PageKind::Technology => (
            TopicCategory::Technology,
            format!("/tutorials/{}", url_path(hierarchy, node)),
        ),
        PageKind::Volume => (
            TopicCategory::Volume,
            format!("/tutorials/{}", url_path(hierarchy, node)),
        ),
        PageKind::Chapter => (
            TopicCategory::Chapter,
            format!("/tutorials/{}", url_path(hierarchy, node)),
        ),
        PageKind::Container => {
            let path = if node == hierarchy.articles_container() {
                format!("/documentation/{}", url_readable(hierarchy.bundle_name()))
            } else if node == hierarchy.tutorials_container() {
                format!("/tutorials/{}", url_readable(hierarchy.bundle_name()))
            } else {
                "/tutorials".to_string()
            };
            (TopicCategory::Container, path)
        }
        PageKind::Anchor | PageKind::TaskGroup | PageKind::Landmark => return None,
    };
    Some(ResolvedReference::for_page(
        category,
        bundle,
        path,
        n.name(),
    ))
}

fn url_path(hierarchy: &Hierarchy, node: NodeId) -> String {
    hierarchy
        .display_path(node)
        .split('/')
        .map(url_readable)
        .collect::<Vec<_>>()
        .join("/")
}

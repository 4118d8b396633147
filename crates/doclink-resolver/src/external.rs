//! Consumed external-archive interface.
//!
//! A documentation archive built elsewhere ships two artifacts this module
//! reads: the hierarchy serialization (same shape as the in-memory
//! structure) and a `linkable-entities.json` list of page summaries. From
//! those an [`ExternalArchive`] reconstructs an identical hierarchy and
//! answers link queries for its bundle.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use doclink_core::{Hierarchy, parse_link};
use doclink_error::{Error, ErrorKind, Result};

use crate::pool::TopicCategory;
use crate::reference::{ResolvedReference, UnresolvedReference};

/// A resolver for references into a bundle that was built elsewhere.
pub trait ExternalResolver: Send + Sync {
    /// Resolve a reference that names this resolver's bundle.
    fn resolve(
        &self,
        reference: &UnresolvedReference,
        is_symbol_link: bool,
    ) -> Result<ResolvedReference>;
}

/// One entry of `linkable-entities.json`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkableEntity {
    /// Absolute URL of the page, `doc://bundle/path`.
    #[serde(rename = "referenceURL")]
    pub reference_url: String,
    pub title: String,
    /// Page kind, e.g. `symbol`, `article`, `tutorial`.
    pub kind: String,
    #[serde(default)]
    pub available_languages: Vec<String>,
    /// Precise symbol id, for symbol pages.
    #[serde(default)]
    pub usr: Option<String>,
}

impl LinkableEntity {
    /// The path portion of the entity's reference URL.
    fn path(&self) -> &str {
        let rest = self
            .reference_url
            .strip_prefix("doc://")
            .unwrap_or(&self.reference_url);
        match rest.find('/') {
            Some(index) => &rest[index..],
            None => "/",
        }
    }
}

/// An external documentation archive: a reconstructed hierarchy plus the
/// entity summaries that describe its pages.
pub struct ExternalArchive {
    bundle: String,
    hierarchy: Hierarchy,
    entities_by_path: HashMap<String, LinkableEntity>,
    paths_by_precise: HashMap<String, String>,
}

impl ExternalArchive {
    /// Load an archive from the JSON texts of its two artifacts.
    pub fn load(bundle: impl Into<String>, hierarchy_json: &str, entities_json: &str) -> Result<Self> {
        let bundle = bundle.into();
        let hierarchy = Hierarchy::from_json(hierarchy_json)?;
        let entities: Vec<LinkableEntity> = serde_json::from_str(entities_json).map_err(|err| {
            Error::new(ErrorKind::DecodeFailed, "invalid linkable-entities list")
                .with_operation("external_archive::load")
                .with_context("bundle", bundle.clone())
                .set_source(err)
        })?;
        let entities_by_path = entities
            .into_iter()
            .map(|entity| (entity.path().to_string(), entity))
            .collect();
        tracing::debug!(bundle = %bundle, "loaded external archive");
        let paths_by_precise = hierarchy.disambiguated_paths();
        Ok(ExternalArchive {
            bundle,
            hierarchy,
            entities_by_path,
            paths_by_precise,
        })
    }

    /// Load an archive from its files on disk.
    pub fn from_files(
        bundle: impl Into<String>,
        hierarchy_path: &Path,
        entities_path: &Path,
    ) -> Result<Self> {
        let hierarchy_json = std::fs::read_to_string(hierarchy_path)?;
        let entities_json = std::fs::read_to_string(entities_path)?;
        Self::load(bundle, &hierarchy_json, &entities_json)
    }

    /// The bundle this archive answers for.
    pub fn bundle(&self) -> &str {
        &self.bundle
    }

    /// The reconstructed hierarchy.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    fn category_for(&self, kind: &str, is_symbol: bool) -> TopicCategory {
        kind.parse::<TopicCategory>().unwrap_or(if is_symbol {
            TopicCategory::Symbol
        } else {
            TopicCategory::Article
        })
    }
}

impl ExternalResolver for ExternalArchive {
    fn resolve(
        &self,
        reference: &UnresolvedReference,
        is_symbol_link: bool,
    ) -> Result<ResolvedReference> {
        let body = reference.link_text();
        let link = parse_link(&body);
        let id = self
            .hierarchy
            .find(&link, None, is_symbol_link)
            .map_err(|err| {
                Error::new(
                    ErrorKind::ExternalResolutionFailed,
                    format!("'{body}': {err}"),
                )
                .with_operation("external_archive::resolve")
                .with_context("bundle", self.bundle.clone())
            })?;

        let node_id = self.hierarchy.node_for(id).ok_or_else(|| {
            Error::new(ErrorKind::Unexpected, "found page vanished from lookup")
                .with_operation("external_archive::resolve")
        })?;
        let node = self.hierarchy.node(node_id);

        // Prefer the archive's own summary; synthesize from the node when
        // the entity list is sparse.
        let (path, languages, category, title) = match node.symbol() {
            Some(symbol) => {
                let path = self
                    .paths_by_precise
                    .get(&symbol.precise)
                    .cloned()
                    .map(|p| format!("/documentation{p}"))
                    .unwrap_or_else(|| body.clone());
                (
                    path,
                    vec![symbol.language.clone()],
                    TopicCategory::Symbol,
                    node.name().to_string(),
                )
            }
            None => (
                format!("/documentation/{}", self.hierarchy.display_path(node_id)),
                Vec::new(),
                TopicCategory::Article,
                node.name().to_string(),
            ),
        };

        let (category, languages, title) = match self.entities_by_path.get(&path) {
            Some(entity) => (
                self.category_for(&entity.kind, node.symbol().is_some()),
                if entity.available_languages.is_empty() {
                    languages
                } else {
                    entity.available_languages.clone()
                },
                entity.title.clone(),
            ),
            None => (category, languages, title),
        };

        let mut resolved = ResolvedReference::for_page(category, &self.bundle, path, &title);
        resolved.languages = languages.into_iter().collect();
        resolved.fragment = reference.fragment.clone();
        Ok(resolved)
    }
}

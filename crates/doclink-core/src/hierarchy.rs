//! The path hierarchy.
//!
//! A hierarchy owns an arena of nodes, a set of named roots (module symbols
//! and technology pages), the three distinguished containers for articles,
//! tutorials, and tutorial overviews, and the lookup table from findable
//! `LinkId`s to nodes.
//!
//! Structurally this is a tree: every node has a single owning parent slot.
//! Cross-module extensions can insert the same node into several parents'
//! bags; the first attachment wins the parent back-reference and later ones
//! only add shared entries. Two distinct nodes that land on the same
//! `(name, kind, hash)` slot are merged, subtrees and all.

use std::collections::{BTreeSet, HashMap};

use crate::component::PathComponent;
use crate::disambiguation::{Disambiguation, DisambiguationContainer, Insertion};
use crate::kind::{MISSING_HASH, NON_SYMBOL_KIND, split_language_prefix};
use crate::node::{Arena, LinkId, Node, NodeId, PageKind};

/// In-memory tree of documentation pages with disambiguation-aware lookup.
#[derive(Debug, Clone)]
pub struct Hierarchy {
    pub(crate) arena: Arena,
    /// Module and technology roots by name.
    pub(crate) roots: std::collections::BTreeMap<String, NodeId>,
    pub(crate) articles_container: NodeId,
    pub(crate) tutorials_container: NodeId,
    pub(crate) tutorial_overview_container: NodeId,
    /// Findable pages by identifier.
    pub(crate) lookup: HashMap<LinkId, NodeId>,
    pub(crate) bundle_name: String,
}

impl Hierarchy {
    /// Create an empty hierarchy for the named bundle. The three non-symbol
    /// containers are created up front and carry the bundle's name, which is
    /// how container-qualified links address them.
    pub fn new(bundle_name: impl Into<String>) -> Self {
        let bundle_name = bundle_name.into();
        let mut arena = Arena::default();
        let articles_container =
            arena.alloc(Node::page_node(bundle_name.clone(), PageKind::Container));
        let tutorials_container =
            arena.alloc(Node::page_node(bundle_name.clone(), PageKind::Container));
        let tutorial_overview_container =
            arena.alloc(Node::page_node(bundle_name.clone(), PageKind::Container));

        let mut hierarchy = Hierarchy {
            arena,
            roots: std::collections::BTreeMap::new(),
            articles_container,
            tutorials_container,
            tutorial_overview_container,
            lookup: HashMap::new(),
            bundle_name,
        };
        hierarchy.register(articles_container);
        hierarchy.register(tutorials_container);
        hierarchy.register(tutorial_overview_container);
        hierarchy
    }

    /// The bundle display name the containers were created with.
    #[inline]
    pub fn bundle_name(&self) -> &str {
        &self.bundle_name
    }

    /// Access a node by arena id.
    #[inline]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.arena[id]
    }

    /// Number of nodes in the arena, placeholders included.
    #[inline]
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    /// Resolve a findable identifier to its node.
    #[inline]
    pub fn node_for(&self, id: LinkId) -> Option<NodeId> {
        self.lookup.get(&id).copied()
    }

    /// The container that articles are grafted under.
    #[inline]
    pub fn articles_container(&self) -> NodeId {
        self.articles_container
    }

    /// The container that tutorials are grafted under.
    #[inline]
    pub fn tutorials_container(&self) -> NodeId {
        self.tutorials_container
    }

    /// The container that tutorial overview pages are grafted under.
    #[inline]
    pub fn tutorial_overview_container(&self) -> NodeId {
        self.tutorial_overview_container
    }

    /// Root names in deterministic order.
    pub fn root_names(&self) -> Vec<String> {
        self.roots.keys().cloned().collect()
    }

    /// Root node for a name.
    pub fn root(&self, name: &str) -> Option<NodeId> {
        self.roots.get(name).copied()
    }

    /// Identifiers of the module roots, in root-name order.
    pub fn module_links(&self) -> Vec<LinkId> {
        self.module_roots()
            .into_iter()
            .filter_map(|node| self.arena[node].identifier)
            .collect()
    }

    /// Names of the module roots, in deterministic order.
    pub fn module_names(&self) -> Vec<String> {
        self.roots
            .iter()
            .filter(|(_, node)| self.is_module(**node))
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub(crate) fn module_roots(&self) -> Vec<NodeId> {
        self.roots
            .values()
            .copied()
            .filter(|node| self.is_module(*node))
            .collect()
    }

    fn is_module(&self, node: NodeId) -> bool {
        self.arena[node]
            .symbol()
            .is_some_and(|symbol| symbol.kind_id == crate::kind::MODULE_KIND)
    }

    /// Every name a link's first component may match at the top level.
    pub fn top_level_names(&self) -> Vec<String> {
        let mut names: BTreeSet<String> = self.roots.keys().cloned().collect();
        names.insert(self.bundle_name.clone());
        names.into_iter().collect()
    }

    /// Identifiers of module roots and their direct symbol children.
    pub fn top_level_symbols(&self) -> Vec<LinkId> {
        let mut result = Vec::new();
        for module in self.module_roots() {
            if let Some(id) = self.arena[module].identifier {
                result.push(id);
            }
            for container in self.arena[module].children.values() {
                for child in container.nodes() {
                    let node = &self.arena[child];
                    if node.symbol().is_some() {
                        if let Some(id) = node.identifier() {
                            result.push(id);
                        }
                    }
                }
            }
        }
        result
    }

    /// Invoke `visit` for every findable symbol node and its nearest findable
    /// ancestor, in deterministic arena order.
    pub fn traverse_symbol_and_parent_pairs<F>(&self, mut visit: F)
    where
        F: FnMut(LinkId, Option<LinkId>),
    {
        for (id, node) in self.arena.iter() {
            if node.symbol().is_none() {
                continue;
            }
            let Some(link) = node.identifier() else {
                continue;
            };
            visit(link, self.parent_link_of_node(id));
        }
    }

    /// The nearest findable ancestor of a findable page.
    pub fn parent_link_of(&self, id: LinkId) -> Option<LinkId> {
        self.parent_link_of_node(self.node_for(id)?)
    }

    fn parent_link_of_node(&self, node: NodeId) -> Option<LinkId> {
        let mut cursor = self.arena[node].parent();
        while let Some(current) = cursor {
            if let Some(link) = self.arena[current].identifier() {
                return Some(link);
            }
            cursor = self.arena[current].parent();
        }
        None
    }

    /// Findable entries in ascending `LinkId` order.
    pub fn lookup_entries(&self) -> Vec<(LinkId, NodeId)> {
        let mut entries: Vec<(LinkId, NodeId)> =
            self.lookup.iter().map(|(id, node)| (*id, *node)).collect();
        entries.sort_by_key(|(id, _)| *id);
        entries
    }

    /// The slash-joined display names from the root to `node`.
    pub fn display_path(&self, node: NodeId) -> String {
        let mut names = Vec::new();
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            names.push(self.arena[current].name().to_string());
            cursor = self.arena[current].parent();
        }
        names.reverse();
        names.join("/")
    }

    /// Child names of a node, in deterministic order.
    pub fn child_names(&self, node: NodeId) -> Vec<String> {
        self.arena[node].children.keys().cloned().collect()
    }

    /// Child names of a node that have an entry matching the component's
    /// written disambiguation.
    pub fn child_names_matching(&self, node: NodeId, component: &PathComponent) -> Vec<String> {
        use crate::disambiguation::FindResult;
        self.arena[node]
            .children
            .iter()
            .filter(|(_, container)| {
                if component.is_plain() {
                    return true;
                }
                !matches!(
                    container.find(
                        component.kind.as_deref(),
                        component.hash.as_deref(),
                        &self.arena,
                    ),
                    FindResult::Missing
                )
            })
            .map(|(name, _)| name.clone())
            .collect()
    }

    /// The disambiguation bag a component's name refers to, if any, plus
    /// whether the full segment text was the key (in which case the parsed
    /// disambiguation is part of the name and must be ignored).
    pub(crate) fn container_for<'a>(
        &'a self,
        node: NodeId,
        component: &PathComponent,
    ) -> Option<(&'a DisambiguationContainer, bool)> {
        let children = &self.arena[node].children;
        if let Some(container) = children.get(&component.name) {
            return Some((container, false));
        }
        children.get(&component.full).map(|c| (c, true))
    }

    /// Register a node, making it findable. Idempotent.
    pub(crate) fn register(&mut self, node: NodeId) -> LinkId {
        if let Some(existing) = self.arena[node].identifier {
            return existing;
        }
        let id = LinkId::next();
        self.arena[node].identifier = Some(id);
        self.lookup.insert(id, node);
        id
    }

    /// Remove a findable identifier. The node stays in the tree so its
    /// subtree remains traversable; only the id is cleared.
    pub fn unregister(&mut self, id: LinkId) -> bool {
        match self.lookup.remove(&id) {
            Some(node) => {
                self.arena[node].identifier = None;
                true
            }
            None => false,
        }
    }

    /// Add a named root. Used for module nodes and technology pages.
    pub(crate) fn add_root(&mut self, name: impl Into<String>, node: NodeId) {
        self.roots.insert(name.into(), node);
    }

    /// Remove a named root so it no longer anchors resolution.
    pub fn remove_root(&mut self, name: &str) -> bool {
        self.roots.remove(name).is_some()
    }

    /// Attach `child` into `parent`'s bag for the child's name, keyed by
    /// `(kind, hash)`.
    ///
    /// Returns the surviving node: `child` itself in the common case, or the
    /// previous occupant of the slot when the two nodes had to be merged.
    /// A bag holding a lone placeholder is replaced outright when a real
    /// symbol arrives, adopting the placeholder's children. A symbol landing
    /// on a slot held by its counterpart in another language is re-keyed
    /// under its language-qualified kind instead of being merged away.
    pub(crate) fn attach(
        &mut self,
        parent: NodeId,
        child: NodeId,
        kind: &str,
        hash: &str,
    ) -> NodeId {
        debug_assert_ne!(parent, child, "a node cannot own itself");
        let name = self.arena[child].name.clone();

        let stale_placeholder = self.arena[parent].children.get(&name).and_then(|container| {
            let (entry_kind, entry_hash, occupant) = container.sole_entry()?;
            (entry_kind == NON_SYMBOL_KIND
                && entry_hash == MISSING_HASH
                && occupant != child
                && self.arena[occupant].is_placeholder()
                && self.arena[child].symbol.is_some())
            .then_some(occupant)
        });
        if let Some(stale) = stale_placeholder {
            let container = self.arena[parent]
                .children
                .get_mut(&name)
                .expect("container existed above");
            container.remove(NON_SYMBOL_KIND, MISSING_HASH);
            let _ = container.insert(kind, hash, child);
            if self.arena[child].parent.is_none() {
                self.arena[child].parent = Some(parent);
            }
            self.adopt_children(stale, child);
            self.arena[stale].parent = None;
            return child;
        }

        let outcome = self.arena[parent]
            .children
            .entry(name)
            .or_default()
            .insert(kind, hash, child);
        match outcome {
            Insertion::Inserted => {
                if self.arena[child].parent.is_none() {
                    self.arena[child].parent = Some(parent);
                }
                child
            }
            Insertion::Existing(existing) => {
                let counterpart_language = match (
                    self.arena[existing].symbol(),
                    self.arena[child].symbol(),
                ) {
                    (Some(occupant), Some(incoming))
                        if occupant.precise == incoming.precise
                            && occupant.language != incoming.language
                            && split_language_prefix(kind).0.is_none() =>
                    {
                        Some(incoming.language.clone())
                    }
                    _ => None,
                };
                if let Some(language) = counterpart_language {
                    let qualified = format!("{language}.{kind}");
                    self.attach(parent, child, &qualified, hash)
                } else {
                    self.merge_nodes(existing, child);
                    existing
                }
            }
        }
    }

    /// Merge `absorb` into `keep`: children move over (recursively merging
    /// further conflicts), symbol data fills in if missing, and `absorb`
    /// becomes unfindable.
    fn merge_nodes(&mut self, keep: NodeId, absorb: NodeId) {
        debug_assert_ne!(keep, absorb);
        if self.arena[keep].symbol.is_none() && self.arena[absorb].symbol.is_some() {
            let symbol = self.arena[absorb].symbol.take();
            let disfavored = self.arena[absorb].disfavored_in_collision;
            let kept = &mut self.arena[keep];
            kept.symbol = symbol;
            kept.disfavored_in_collision = disfavored;
        }
        self.adopt_children(absorb, keep);
        if let Some(id) = self.arena[absorb].identifier.take() {
            self.lookup.remove(&id);
        }
        self.arena[absorb].parent = None;
    }

    fn adopt_children(&mut self, from: NodeId, to: NodeId) {
        let children = std::mem::take(&mut self.arena[from].children);
        for (_, container) in children {
            for (kind, hash, node) in container.into_entries() {
                if node == to {
                    continue;
                }
                if self.arena[node].parent == Some(from) {
                    self.arena[node].parent = None;
                }
                self.attach(to, node, &kind, &hash);
            }
        }
    }

    /// Render the whole hierarchy as an indented tree. Debug aid; the output
    /// is fully deterministic for identical hierarchies.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        let mut tops: Vec<NodeId> = self.roots.values().copied().collect();
        tops.push(self.articles_container);
        tops.push(self.tutorials_container);
        tops.push(self.tutorial_overview_container);
        for top in tops {
            self.dump_node(top, "", "", &Disambiguation::None, &mut out);
        }
        out
    }

    fn dump_node(
        &self,
        node: NodeId,
        line_prefix: &str,
        child_prefix: &str,
        disambiguation: &Disambiguation,
        out: &mut String,
    ) {
        let current = &self.arena[node];
        out.push_str(line_prefix);
        out.push_str(current.name());
        out.push_str(&disambiguation.suffix());
        if current.identifier().is_none() {
            out.push_str(" (unfindable)");
        }
        out.push('\n');

        let mut entries: Vec<(NodeId, Disambiguation)> = Vec::new();
        for container in current.children.values() {
            let spans = container.spans_multiple_languages(&self.arena);
            for candidate in container.disambiguated_values(&self.arena, spans) {
                entries.push((candidate.node, candidate.disambiguation));
            }
        }
        let count = entries.len();
        for (index, (child, label)) in entries.into_iter().enumerate() {
            let last = index + 1 == count;
            let line = format!("{child_prefix}{} ", if last { '╰' } else { '├' });
            let below = format!("{child_prefix}{} ", if last { ' ' } else { '│' });
            self.dump_node(child, &line, &below, &label, out);
        }
    }
}

//! Per-name bags of same-named siblings.
//!
//! Every child name of a node maps to one `DisambiguationContainer`, a
//! two-level `kind → hash → node` table. Non-symbol pages use `_` sentinels
//! for both levels. A second symbol with the same `(kind, hash)` but a
//! different interface language is stored under its language-qualified kind
//! (`objc.func`), so cross-language counterparts stay individually
//! addressable.
//!
//! Lookup implements partial disambiguation: any subset of `(kind, hash)`
//! may be written in a link, and the container reports a unique match, a
//! miss, or the colliding candidates together with the minimal suffix that
//! would disambiguate each of them.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use crate::kind::{MISSING_HASH, NON_SYMBOL_KIND, PRIMARY_LANGUAGE, split_language_prefix};
use crate::node::{Arena, NodeId};

/// The minimal trailing suffix that names one entry of a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disambiguation {
    /// The entry is unique; no suffix is needed.
    None,
    /// The entry is the only one of its kind.
    Kind(String),
    /// Only the stable hash tells the entry apart.
    Hash(String),
}

impl Disambiguation {
    /// Render the suffix as it appears in a link (`-struct`, `-6kk2c`, or
    /// nothing).
    pub fn suffix(&self) -> String {
        match self {
            Disambiguation::None => String::new(),
            Disambiguation::Kind(kind) => format!("-{kind}"),
            Disambiguation::Hash(hash) => format!("-{hash}"),
        }
    }

    /// True when no suffix is needed.
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, Disambiguation::None)
    }
}

/// A container entry together with its minimal disambiguation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub node: NodeId,
    pub disambiguation: Disambiguation,
}

/// Outcome of a partial-disambiguation lookup.
#[derive(Debug, Clone)]
pub(crate) enum FindResult {
    Found(NodeId),
    /// The name exists but nothing matches the written disambiguation.
    Missing,
    /// More than one entry matches what was written.
    Collision(Vec<Candidate>),
}

/// Outcome of inserting an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insertion {
    Inserted,
    /// The slot is taken by a different node; the caller merges.
    Existing(NodeId),
}

/// Two-level `kind → hash → node` bag of same-named siblings.
#[derive(Debug, Clone, Default)]
pub struct DisambiguationContainer {
    storage: BTreeMap<String, BTreeMap<String, NodeId>>,
}

impl DisambiguationContainer {
    /// Number of entries across all kinds.
    pub fn len(&self) -> usize {
        self.storage.values().map(BTreeMap::len).sum()
    }

    /// True when the container holds no entries.
    pub fn is_empty(&self) -> bool {
        self.storage.is_empty()
    }

    /// Iterate entries in deterministic `(kind, hash)` order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str, NodeId)> {
        self.storage.iter().flat_map(|(kind, by_hash)| {
            by_hash
                .iter()
                .map(move |(hash, node)| (kind.as_str(), hash.as_str(), *node))
        })
    }

    /// Iterate the stored nodes in deterministic order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.entries().map(|(_, _, node)| node)
    }

    /// True when `node` is stored under any `(kind, hash)` slot.
    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes().any(|candidate| candidate == node)
    }

    /// Consume the container into its entries, in deterministic order.
    pub(crate) fn into_entries(self) -> Vec<(String, String, NodeId)> {
        self.storage
            .into_iter()
            .flat_map(|(kind, by_hash)| {
                by_hash
                    .into_iter()
                    .map(move |(hash, node)| (kind.clone(), hash, node))
            })
            .collect()
    }

    pub(crate) fn insert(
        &mut self,
        kind: impl Into<String>,
        hash: impl Into<String>,
        node: NodeId,
    ) -> Insertion {
        let by_hash = self.storage.entry(kind.into()).or_default();
        match by_hash.entry(hash.into()) {
            Entry::Vacant(slot) => {
                slot.insert(node);
                Insertion::Inserted
            }
            Entry::Occupied(slot) if *slot.get() == node => Insertion::Inserted,
            Entry::Occupied(slot) => Insertion::Existing(*slot.get()),
        }
    }

    pub(crate) fn remove(&mut self, kind: &str, hash: &str) -> Option<NodeId> {
        let by_hash = self.storage.get_mut(kind)?;
        let removed = by_hash.remove(hash);
        if by_hash.is_empty() {
            self.storage.remove(kind);
        }
        removed
    }

    /// The container's single entry, if it has exactly one.
    pub(crate) fn sole_entry(&self) -> Option<(&str, &str, NodeId)> {
        let mut entries = self.entries();
        let first = entries.next()?;
        entries.next().is_none().then_some(first)
    }

    /// Set-union with another container. Slots already present win; the
    /// caller is responsible for merging the nodes of conflicting slots.
    pub(crate) fn merge(&mut self, other: &DisambiguationContainer) {
        for (kind, hash, node) in other.entries() {
            let _ = self.insert(kind, hash, node);
        }
    }

    /// A copy of this container unioned with `other`.
    pub(crate) fn merged_with(&self, other: &DisambiguationContainer) -> DisambiguationContainer {
        let mut merged = self.clone();
        merged.merge(other);
        merged
    }

    /// True when the stored symbols span more than one interface language.
    pub(crate) fn spans_multiple_languages(&self, arena: &Arena) -> bool {
        let mut seen: Option<&str> = None;
        for node in self.nodes() {
            if let Some(symbol) = arena[node].symbol() {
                match seen {
                    None => seen = Some(&symbol.language),
                    Some(language) if language != symbol.language => return true,
                    Some(_) => {}
                }
            }
        }
        false
    }

    /// Look up an entry by whatever subset of `(kind, hash)` was written.
    pub(crate) fn find(
        &self,
        kind: Option<&str>,
        hash: Option<&str>,
        arena: &Arena,
    ) -> FindResult {
        match (kind, hash) {
            (Some(kind), Some(hash)) => self.find_exact(kind, hash, arena),
            (Some(kind), None) => self.find_by_kind(kind, arena),
            (None, Some(hash)) => self.find_by_hash(hash),
            (None, None) => {
                if let Some((_, _, node)) = self.sole_entry() {
                    return FindResult::Found(node);
                }
                FindResult::Collision(self.disambiguated_values(
                    arena,
                    self.spans_multiple_languages(arena),
                ))
            }
        }
    }

    fn find_exact(&self, kind: &str, hash: &str, arena: &Arena) -> FindResult {
        // A language-qualified kind may be stored verbatim (secondary
        // language counterpart) or as the bare kind of a symbol in that
        // language.
        if let Some(node) = self.storage.get(kind).and_then(|by_hash| by_hash.get(hash)) {
            return FindResult::Found(*node);
        }
        let (language, plain) = split_language_prefix(kind);
        if let Some(node) = self
            .storage
            .get(plain)
            .and_then(|by_hash| by_hash.get(hash))
        {
            let language_matches = match (language, arena[*node].symbol()) {
                (Some(lang), Some(symbol)) => symbol.language == lang,
                (Some(_), None) => false,
                (None, _) => true,
            };
            if language_matches {
                return FindResult::Found(*node);
            }
        }
        FindResult::Missing
    }

    fn find_by_kind(&self, kind: &str, arena: &Arena) -> FindResult {
        if let Some(by_hash) = self.storage.get(kind) {
            return Self::unique_or_hash_collision(by_hash.iter().map(|(h, n)| (h.clone(), *n)));
        }
        let (language, plain) = split_language_prefix(kind);
        let Some(by_hash) = self.storage.get(plain) else {
            return FindResult::Missing;
        };
        let matching = by_hash.iter().filter(|(_, node)| match language {
            Some(lang) => arena[**node]
                .symbol()
                .is_some_and(|symbol| symbol.language == lang),
            None => true,
        });
        Self::unique_or_hash_collision(matching.map(|(h, n)| (h.clone(), *n)))
    }

    fn unique_or_hash_collision(matching: impl Iterator<Item = (String, NodeId)>) -> FindResult {
        let matching: Vec<_> = matching.collect();
        match matching.as_slice() {
            [] => FindResult::Missing,
            [(_, node)] => FindResult::Found(*node),
            _ => FindResult::Collision(
                matching
                    .into_iter()
                    .map(|(hash, node)| Candidate {
                        node,
                        disambiguation: Disambiguation::Hash(hash),
                    })
                    .collect(),
            ),
        }
    }

    fn find_by_hash(&self, hash: &str) -> FindResult {
        let matching: Vec<_> = self
            .storage
            .iter()
            .filter_map(|(kind, by_hash)| by_hash.get(hash).map(|node| (kind.clone(), *node)))
            .collect();
        match matching.as_slice() {
            [] => FindResult::Missing,
            [(_, node)] => FindResult::Found(*node),
            _ => FindResult::Collision(
                matching
                    .into_iter()
                    .map(|(kind, node)| Candidate {
                        node,
                        disambiguation: Disambiguation::Kind(kind),
                    })
                    .collect(),
            ),
        }
    }

    /// The minimal disambiguation for every entry.
    ///
    /// A unique entry needs nothing; an entry that is alone in its kind group
    /// gets the kind (language-qualified when `include_language`); everything
    /// else falls back to the stable hash. When exactly one entry is favored
    /// in collisions it also needs nothing, because lookup prefers it over
    /// its disfavored siblings.
    pub(crate) fn disambiguated_values(
        &self,
        arena: &Arena,
        include_language: bool,
    ) -> Vec<Candidate> {
        let entries: Vec<(String, String, NodeId)> = self
            .entries()
            .map(|(kind, hash, node)| (kind.to_string(), hash.to_string(), node))
            .collect();
        minimal_labels(&entries, arena, include_language)
    }

    /// Like [`Self::disambiguated_values`], but entries that share the same
    /// precise symbol id across languages appear once, labeled for the
    /// primary language's entry.
    pub(crate) fn disambiguated_values_with_collapsed_unique_symbols(
        &self,
        arena: &Arena,
    ) -> Vec<Candidate> {
        let mut groups: BTreeMap<(u8, String), Vec<(String, String, NodeId)>> = BTreeMap::new();
        for (kind, hash, node) in self.entries() {
            let key = match arena[node].symbol() {
                Some(symbol) => (0u8, symbol.precise.clone()),
                None => (1u8, format!("{:010}", node.0)),
            };
            groups
                .entry(key)
                .or_default()
                .push((kind.to_string(), hash.to_string(), node));
        }

        let mut representatives: Vec<(String, String, NodeId)> = Vec::with_capacity(groups.len());
        for mut members in groups.into_values() {
            members.sort_by(|a, b| {
                let a_lang = arena[a.2].symbol().map(|s| s.language.as_str()).unwrap_or("");
                let b_lang = arena[b.2].symbol().map(|s| s.language.as_str()).unwrap_or("");
                (a_lang != PRIMARY_LANGUAGE, a_lang, &a.0, &a.1).cmp(&(
                    b_lang != PRIMARY_LANGUAGE,
                    b_lang,
                    &b.0,
                    &b.1,
                ))
            });
            representatives.push(members.swap_remove(0));
        }
        representatives.sort();

        let include_language = {
            let mut languages = representatives.iter().filter_map(|(_, _, node)| {
                arena[*node].symbol().map(|symbol| symbol.language.as_str())
            });
            let first = languages.next();
            languages.any(|language| Some(language) != first)
        };
        minimal_labels(&representatives, arena, include_language)
    }
}

/// Compute the minimal label per entry over an explicit entry list.
fn minimal_labels(
    entries: &[(String, String, NodeId)],
    arena: &Arena,
    include_language: bool,
) -> Vec<Candidate> {
    if let [(_, _, node)] = entries {
        return vec![Candidate {
            node: *node,
            disambiguation: Disambiguation::None,
        }];
    }

    let mut kind_counts: BTreeMap<&str, usize> = BTreeMap::new();
    for (kind, _, _) in entries {
        *kind_counts.entry(kind.as_str()).or_default() += 1;
    }

    let favored: Vec<NodeId> = entries
        .iter()
        .filter(|(_, _, node)| !arena[*node].is_disfavored_in_collision())
        .map(|(_, _, node)| *node)
        .collect();
    let sole_favored = (favored.len() == 1).then(|| favored[0]);

    entries
        .iter()
        .map(|(kind, hash, node)| {
            let disambiguation = if Some(*node) == sole_favored {
                Disambiguation::None
            } else if kind == NON_SYMBOL_KIND && hash == MISSING_HASH {
                // A plain page has no suffix to write.
                Disambiguation::None
            } else if kind_counts[kind.as_str()] == 1 {
                Disambiguation::Kind(qualified_kind(kind, *node, arena, include_language))
            } else if hash == MISSING_HASH {
                Disambiguation::None
            } else {
                Disambiguation::Hash(hash.clone())
            };
            Candidate {
                node: *node,
                disambiguation,
            }
        })
        .collect()
}

fn qualified_kind(kind: &str, node: NodeId, arena: &Arena, include_language: bool) -> String {
    if !include_language {
        return kind.to_string();
    }
    if split_language_prefix(kind).0.is_some() {
        return kind.to_string();
    }
    match arena[node].symbol() {
        Some(symbol) => format!("{}.{}", symbol.language, kind),
        None => kind.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::stable_hash;
    use crate::node::{Node, PageKind, SymbolRecord};

    fn symbol(arena: &mut Arena, precise: &str, language: &str, kind_id: &str) -> NodeId {
        let record = SymbolRecord {
            precise: precise.to_string(),
            language: language.to_string(),
            kind_id: kind_id.to_string(),
            stable_hash: stable_hash(precise),
            path_components: vec!["Foo".to_string()],
            declaration: None,
        };
        arena.alloc(Node::symbol_node("Foo", record))
    }

    fn add_symbol(
        container: &mut DisambiguationContainer,
        arena: &Arena,
        node: NodeId,
        kind: &str,
    ) {
        let hash = arena[node].symbol().unwrap().stable_hash.clone();
        assert_eq!(container.insert(kind, hash, node), Insertion::Inserted);
    }

    #[test]
    fn sole_entry_is_found_without_disambiguation() {
        let mut arena = Arena::default();
        let node = symbol(&mut arena, "s:Foo", "swift", "struct");
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, node, "struct");

        assert!(matches!(
            container.find(None, None, &arena),
            FindResult::Found(found) if found == node
        ));
    }

    #[test]
    fn kind_lookup_narrows_a_collision() {
        let mut arena = Arena::default();
        let a = symbol(&mut arena, "s:FooV", "swift", "struct");
        let b = symbol(&mut arena, "s:FooC", "swift", "class");
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, a, "struct");
        add_symbol(&mut container, &arena, b, "class");

        assert!(matches!(
            container.find(None, None, &arena),
            FindResult::Collision(candidates) if candidates.len() == 2
        ));
        assert!(matches!(
            container.find(Some("struct"), None, &arena),
            FindResult::Found(found) if found == a
        ));
        assert!(matches!(
            container.find(Some("enum"), None, &arena),
            FindResult::Missing
        ));
    }

    #[test]
    fn hash_lookup_searches_all_kinds() {
        let mut arena = Arena::default();
        let a = symbol(&mut arena, "s:FooV", "swift", "struct");
        let b = symbol(&mut arena, "s:FooC", "swift", "class");
        let hash_a = arena[a].symbol().unwrap().stable_hash.clone();
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, a, "struct");
        add_symbol(&mut container, &arena, b, "class");

        assert!(matches!(
            container.find(None, Some(&hash_a), &arena),
            FindResult::Found(found) if found == a
        ));
        assert!(matches!(
            container.find(None, Some("zzzzz"), &arena),
            FindResult::Missing
        ));
    }

    #[test]
    fn language_qualified_kind_picks_the_counterpart() {
        let mut arena = Arena::default();
        let swift = symbol(&mut arena, "c:objc(cs)Foo", "swift", "class");
        let objc = symbol(&mut arena, "c:objc(cs)Foo", "occ", "class");
        let hash = arena[swift].symbol().unwrap().stable_hash.clone();
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, swift, "class");
        // Counterpart stored under its language-qualified kind.
        assert_eq!(
            container.insert("occ.class", hash, objc),
            Insertion::Inserted
        );

        assert!(matches!(
            container.find(Some("occ.class"), None, &arena),
            FindResult::Found(found) if found == objc
        ));
        assert!(matches!(
            container.find(Some("swift.class"), None, &arena),
            FindResult::Found(found) if found == swift
        ));
    }

    #[test]
    fn duplicate_slot_reports_the_existing_node() {
        let mut arena = Arena::default();
        let a = symbol(&mut arena, "s:FooV", "swift", "struct");
        let b = symbol(&mut arena, "s:OtherFooV", "swift", "struct");
        let mut container = DisambiguationContainer::default();
        assert_eq!(container.insert("struct", "aaaaa", a), Insertion::Inserted);
        assert_eq!(container.insert("struct", "aaaaa", a), Insertion::Inserted);
        assert_eq!(
            container.insert("struct", "aaaaa", b),
            Insertion::Existing(a)
        );
    }

    #[test]
    fn minimal_labels_prefer_kind_over_hash() {
        let mut arena = Arena::default();
        let a = symbol(&mut arena, "s:FooV", "swift", "struct");
        let b = symbol(&mut arena, "s:FooC", "swift", "class");
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, a, "struct");
        add_symbol(&mut container, &arena, b, "class");

        let values = container.disambiguated_values(&arena, false);
        let by_node: BTreeMap<NodeId, Disambiguation> = values
            .into_iter()
            .map(|c| (c.node, c.disambiguation))
            .collect();
        assert_eq!(by_node[&a], Disambiguation::Kind("struct".to_string()));
        assert_eq!(by_node[&b], Disambiguation::Kind("class".to_string()));
    }

    #[test]
    fn same_kind_entries_fall_back_to_hashes() {
        let mut arena = Arena::default();
        let a = symbol(&mut arena, "s:foo1", "swift", "func");
        let b = symbol(&mut arena, "s:foo2", "swift", "func");
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, a, "func");
        add_symbol(&mut container, &arena, b, "func");

        for candidate in container.disambiguated_values(&arena, false) {
            assert!(matches!(candidate.disambiguation, Disambiguation::Hash(_)));
        }
    }

    #[test]
    fn sole_favored_entry_needs_no_suffix() {
        let mut arena = Arena::default();
        let requirement = symbol(&mut arena, "s:req", "swift", "func");
        let implementation = symbol(&mut arena, "s:impl", "swift", "func");
        arena[implementation].disfavored_in_collision = true;
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, requirement, "func");
        add_symbol(&mut container, &arena, implementation, "func");

        let by_node: BTreeMap<NodeId, Disambiguation> = container
            .disambiguated_values(&arena, false)
            .into_iter()
            .map(|c| (c.node, c.disambiguation))
            .collect();
        assert_eq!(by_node[&requirement], Disambiguation::None);
        assert!(matches!(by_node[&implementation], Disambiguation::Hash(_)));
    }

    #[test]
    fn collapsed_values_show_a_cross_language_symbol_once() {
        let mut arena = Arena::default();
        let swift = symbol(&mut arena, "c:objc(cs)Foo", "swift", "class");
        let objc = symbol(&mut arena, "c:objc(cs)Foo", "occ", "class");
        let hash = arena[swift].symbol().unwrap().stable_hash.clone();
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, swift, "class");
        let _ = container.insert("occ.class", hash, objc);

        let values = container.disambiguated_values_with_collapsed_unique_symbols(&arena);
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].node, swift);
        assert_eq!(values[0].disambiguation, Disambiguation::None);
    }

    #[test]
    fn collapsed_values_keep_distinct_symbols_apart() {
        let mut arena = Arena::default();
        let a = symbol(&mut arena, "s:FooV", "swift", "struct");
        let b = symbol(&mut arena, "s:FooC", "swift", "class");
        let page = arena.alloc(Node::page_node("Foo", PageKind::Article));
        let mut container = DisambiguationContainer::default();
        add_symbol(&mut container, &arena, a, "struct");
        add_symbol(&mut container, &arena, b, "class");
        let _ = container.insert(NON_SYMBOL_KIND, MISSING_HASH, page);

        let values = container.disambiguated_values_with_collapsed_unique_symbols(&arena);
        assert_eq!(values.len(), 3);
        let by_node: BTreeMap<NodeId, Disambiguation> = values
            .into_iter()
            .map(|c| (c.node, c.disambiguation))
            .collect();
        assert_eq!(by_node[&a], Disambiguation::Kind("struct".to_string()));
        assert_eq!(by_node[&b], Disambiguation::Kind("class".to_string()));
        assert_eq!(by_node[&page], Disambiguation::None);
    }
}

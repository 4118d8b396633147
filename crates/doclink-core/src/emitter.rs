//! Canonical path emission.
//!
//! Walks the hierarchy top-down and assigns every symbol the shortest
//! URL-ready path that resolves back to it. Children are grouped
//! case-insensitively on URL-normalized names so paths stay unambiguous on
//! case-insensitive file systems, and a symbol that exists in several
//! languages is emitted once, addressed through its primary-language entry.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};

use crate::disambiguation::{Disambiguation, DisambiguationContainer};
use crate::hierarchy::Hierarchy;
use crate::kind::url_readable;
use crate::node::NodeId;

/// Options for path emission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathEmitOptions {
    /// Force a disambiguation suffix onto otherwise-unambiguous children
    /// whose container needed one itself. Keeps child URLs stable when a
    /// sibling of the container is added or removed later.
    pub include_disambiguation_for_unambiguous_children: bool,
}

impl Hierarchy {
    /// The canonical disambiguated path for every symbol, keyed by precise
    /// id.
    pub fn disambiguated_paths(&self) -> HashMap<String, String> {
        self.disambiguated_paths_with(PathEmitOptions::default())
    }

    /// Like [`Self::disambiguated_paths`] with explicit options.
    ///
    /// # Panics
    /// Panics if two symbols would be assigned the same path; that means the
    /// disambiguation logic is broken and the produced addresses would be
    /// unusable.
    pub fn disambiguated_paths_with(&self, options: PathEmitOptions) -> HashMap<String, String> {
        let mut result = HashMap::new();
        let mut taken: HashMap<String, String> = HashMap::new();

        for (name, &root) in &self.roots {
            let path = format!("/{}", url_readable(name));
            if let Some(symbol) = self.arena[root].symbol() {
                claim(&mut taken, &path, &symbol.precise);
                result.insert(symbol.precise.clone(), path.clone());
            }
            self.emit_level(root, &path, false, options, &mut result, &mut taken);
        }
        result
    }

    fn emit_level(
        &self,
        node: NodeId,
        prefix: &str,
        parent_disambiguated: bool,
        options: PathEmitOptions,
        result: &mut HashMap<String, String>,
        taken: &mut HashMap<String, String>,
    ) {
        // Group children case-insensitively on their URL-normalized names;
        // differently-cased siblings must disambiguate against each other.
        let mut groups: BTreeMap<String, DisambiguationContainer> = BTreeMap::new();
        for (name, container) in self.arena[node].children() {
            let key = url_readable(name).to_lowercase();
            match groups.entry(key) {
                Entry::Occupied(mut slot) => {
                    let merged = slot.get().merged_with(container);
                    *slot.get_mut() = merged;
                }
                Entry::Vacant(slot) => {
                    slot.insert(container.clone());
                }
            }
        }

        for container in groups.values() {
            for candidate in container.disambiguated_values_with_collapsed_unique_symbols(&self.arena)
            {
                let child = candidate.node;
                // Shared attachments (cross-module extensions) are addressed
                // through their owning parent only.
                if self.arena[child].parent() != Some(node) {
                    continue;
                }

                let mut label = candidate.disambiguation;
                if options.include_disambiguation_for_unambiguous_children
                    && parent_disambiguated
                    && label.is_none()
                {
                    if let Some(symbol) = self.arena[child].symbol() {
                        label = Disambiguation::Kind(symbol.kind_id.clone());
                    }
                }

                let segment = format!(
                    "{}{}",
                    url_readable(self.arena[child].name()),
                    label.suffix()
                );
                let path = format!("{prefix}/{segment}");

                if let Some(symbol) = self.arena[child].symbol() {
                    claim(taken, &path, &symbol.precise);
                    result.insert(symbol.precise.clone(), path.clone());
                }

                // Language counterparts share the primary entry's path.
                for member in self.same_symbol_members(container, child) {
                    if self.arena[member].parent() == Some(node) {
                        self.emit_level(member, &path, !label.is_none(), options, result, taken);
                    }
                }
            }
        }
    }

    /// The candidate node plus every same-precise counterpart in the
    /// container.
    fn same_symbol_members(
        &self,
        container: &DisambiguationContainer,
        node: NodeId,
    ) -> Vec<NodeId> {
        let mut members = vec![node];
        if let Some(symbol) = self.arena[node].symbol() {
            for other in container.nodes() {
                if other != node
                    && self.arena[other]
                        .symbol()
                        .is_some_and(|s| s.precise == symbol.precise)
                {
                    members.push(other);
                }
            }
        }
        members
    }
}

fn claim(taken: &mut HashMap<String, String>, path: &str, precise: &str) {
    if let Some(previous) = taken.insert(path.to_string(), precise.to_string()) {
        assert_eq!(
            previous, precise,
            "two symbols were assigned the same documentation path '{path}'"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyBuilder;
    use crate::error::ResolveError;
    use crate::kind::stable_hash;
    use crate::symbol_graph::{Relationship, RelationshipKind, Symbol, SymbolGraph};
    use pretty_assertions::assert_eq;

    fn build(graph: SymbolGraph) -> Hierarchy {
        let mut builder = HierarchyBuilder::new("TestBundle");
        builder.add_symbol_graph("M.symbols.json", &graph);
        builder.finish()
    }

    fn colliding_foo_graph() -> SymbolGraph {
        let mut graph = SymbolGraph::new("M");
        graph
            .symbols
            .push(Symbol::new("s:1M3FooV", "swift", "struct", vec!["Foo".into()]));
        graph
            .symbols
            .push(Symbol::new("s:1M3FooC", "swift", "class", vec!["Foo".into()]));
        graph.symbols.push(Symbol::new(
            "s:1M3FooV3baryyF",
            "swift",
            "func",
            vec!["Foo".into(), "bar()".into()],
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::MemberOf,
            "s:1M3FooV3baryyF",
            "s:1M3FooV",
        ));
        graph
    }

    #[test]
    fn colliding_names_get_kind_suffixes() {
        let hierarchy = build(colliding_foo_graph());
        let paths = hierarchy.disambiguated_paths();

        assert_eq!(paths["s:1M3FooV"], "/M/Foo-struct");
        assert_eq!(paths["s:1M3FooC"], "/M/Foo-class");
        assert_eq!(paths["s:1M3FooV3baryyF"], "/M/Foo-struct/bar()");
        assert_eq!(paths["M"], "/M");
    }

    #[test]
    fn unique_symbols_get_plain_paths() {
        let mut graph = SymbolGraph::new("M");
        graph
            .symbols
            .push(Symbol::new("s:1M5ColorO", "swift", "enum", vec!["Color".into()]));
        graph.symbols.push(Symbol::new(
            "s:1M5ColorO3redyA2CmF",
            "swift",
            "enum.case",
            vec!["Color".into(), "red".into()],
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::MemberOf,
            "s:1M5ColorO3redyA2CmF",
            "s:1M5ColorO",
        ));
        let hierarchy = build(graph);
        let paths = hierarchy.disambiguated_paths();

        assert_eq!(paths["s:1M5ColorO3redyA2CmF"], "/M/Color/red");
    }

    #[test]
    fn every_emitted_path_round_trips() {
        let hierarchy = build(colliding_foo_graph());
        let paths = hierarchy.disambiguated_paths();

        for (precise, path) in &paths {
            let id = hierarchy
                .find_str(path, None, true)
                .unwrap_or_else(|err| panic!("'{path}' should resolve, got {err:?}"));
            let node = hierarchy.node_for(id).unwrap();
            assert_eq!(&hierarchy.node(node).symbol().unwrap().precise, precise);
        }
    }

    #[test]
    fn paths_are_injective() {
        let hierarchy = build(colliding_foo_graph());
        let paths = hierarchy.disambiguated_paths();
        let mut seen = std::collections::HashSet::new();
        for path in paths.values() {
            assert!(seen.insert(path.clone()), "duplicate path '{path}'");
        }
    }

    #[test]
    fn stripping_the_suffix_stops_resolving_uniquely() {
        let hierarchy = build(colliding_foo_graph());
        let paths = hierarchy.disambiguated_paths();

        let struct_path = &paths["s:1M3FooV"];
        let stripped = struct_path.trim_end_matches("-struct");
        assert_ne!(struct_path, stripped);
        let error = hierarchy
            .find_str(stripped, None, true)
            .expect_err("stripped path must be ambiguous");
        assert!(matches!(
            error,
            ResolveError::LookupCollision { .. } | ResolveError::UnknownName { .. }
        ));
    }

    #[test]
    fn hash_disambiguation_when_kinds_collide() {
        let mut graph = SymbolGraph::new("M");
        graph.symbols.push(Symbol::new(
            "s:1M3foo1",
            "swift",
            "func",
            vec!["foo(_:)".into()],
        ));
        graph.symbols.push(Symbol::new(
            "s:1M3foo2",
            "swift",
            "func",
            vec!["foo(_:)".into()],
        ));
        let hierarchy = build(graph);
        let paths = hierarchy.disambiguated_paths();

        let h1 = stable_hash("s:1M3foo1");
        let h2 = stable_hash("s:1M3foo2");
        assert_eq!(paths["s:1M3foo1"], format!("/M/foo(_:)-{h1}"));
        assert_eq!(paths["s:1M3foo2"], format!("/M/foo(_:)-{h2}"));
    }

    #[test]
    fn cross_language_symbol_is_emitted_once_for_the_primary_language() {
        let mut builder = HierarchyBuilder::new("TestBundle");
        let mut swift_graph = SymbolGraph::new("M");
        swift_graph.symbols.push(Symbol::new(
            "c:objc(cs)Foo",
            "swift",
            "class",
            vec!["Foo".into()],
        ));
        let mut objc_graph = SymbolGraph::new("M");
        objc_graph.symbols.push(Symbol::new(
            "c:objc(cs)Foo",
            "occ",
            "class",
            vec!["Foo".into()],
        ));
        builder.add_symbol_graph("M.symbols.json", &swift_graph);
        builder.add_symbol_graph("M@occ.symbols.json", &objc_graph);
        let hierarchy = builder.finish();

        let paths = hierarchy.disambiguated_paths();
        assert_eq!(paths["c:objc(cs)Foo"], "/M/Foo");
    }

    #[test]
    fn forced_disambiguation_for_children_of_disambiguated_containers() {
        let hierarchy = build(colliding_foo_graph());
        let paths = hierarchy.disambiguated_paths_with(PathEmitOptions {
            include_disambiguation_for_unambiguous_children: true,
        });

        // bar() is unambiguous, but its container needed "-struct", so the
        // child keeps a stable suffix of its own.
        assert_eq!(paths["s:1M3FooV3baryyF"], "/M/Foo-struct/bar()-func");
    }

    #[test]
    fn case_insensitive_siblings_disambiguate_against_each_other() {
        let mut graph = SymbolGraph::new("M");
        graph
            .symbols
            .push(Symbol::new("s:1M3fooV", "swift", "struct", vec!["foo".into()]));
        graph
            .symbols
            .push(Symbol::new("s:1M3FOOC", "swift", "class", vec!["FOO".into()]));
        let hierarchy = build(graph);
        let paths = hierarchy.disambiguated_paths();

        assert_eq!(paths["s:1M3fooV"], "/M/foo-struct");
        assert_eq!(paths["s:1M3FOOC"], "/M/FOO-class");
    }
}

//! Link resolution against the hierarchy.
//!
//! Resolution picks an entry point (the non-symbol containers, a named root,
//! or the single module when the link omits its prefix), then descends one
//! component at a time. A collision mid-descent gets one step of look-ahead
//! before it is reported; a collision on the final component is settled by
//! the preference rules (favored over disfavored, the primary language when
//! every candidate is the same symbol, symbol over page for symbol links and
//! page over symbol otherwise).

use crate::component::{ParsedLink, PathComponent, parse_link};
use crate::disambiguation::{Candidate, FindResult};
use crate::error::ResolveError;
use crate::hierarchy::Hierarchy;
use crate::kind::{ANCHOR_KIND, PRIMARY_LANGUAGE};
use crate::node::{LinkId, NodeId};

impl Hierarchy {
    /// Resolve a raw link string. See [`Hierarchy::find`].
    pub fn find_str(
        &self,
        raw: &str,
        parent: Option<LinkId>,
        only_find_symbols: bool,
    ) -> Result<LinkId, ResolveError> {
        self.find(&parse_link(raw), parent, only_find_symbols)
    }

    /// Resolve a parsed link relative to an optional parent page.
    ///
    /// `only_find_symbols` makes the search skip the non-symbol containers
    /// and reject matches that are not symbols.
    pub fn find(
        &self,
        link: &ParsedLink,
        parent: Option<LinkId>,
        only_find_symbols: bool,
    ) -> Result<LinkId, ResolveError> {
        if link.components.is_empty() {
            return Err(ResolveError::NotFound {
                remaining: Vec::new(),
                available: self.top_level_names(),
            });
        }

        let node = self.find_node(link, parent, only_find_symbols)?;

        let Some(id) = self.arena[node].identifier() else {
            return Err(ResolveError::UnfindableMatch { node });
        };
        if only_find_symbols && self.arena[node].symbol().is_none() {
            return Err(ResolveError::NonSymbolMatchForSymbolLink);
        }
        Ok(id)
    }

    fn find_node(
        &self,
        link: &ParsedLink,
        parent: Option<LinkId>,
        only_find_symbols: bool,
    ) -> Result<NodeId, ResolveError> {
        let components = &link.components[..];

        // A pure fragment names an anchor of the parent page itself.
        if components[0].fragment {
            if let Some(parent_node) = parent.and_then(|id| self.node_for(id)) {
                return self.descend(parent_node, components, only_find_symbols);
            }
            return Err(ResolveError::NotFound {
                remaining: components.to_vec(),
                available: self.top_level_names(),
            });
        }

        if !link.is_absolute {
            if let Some(parent_node) = parent.and_then(|id| self.node_for(id)) {
                return self.resolve_relative(parent_node, components, only_find_symbols);
            }
        }

        self.find_from_entry_points(components, only_find_symbols)
    }

    /// Search from the top: the non-symbol containers first (unless this is
    /// a symbol link), then the named roots.
    fn find_from_entry_points(
        &self,
        components: &[PathComponent],
        only_find_symbols: bool,
    ) -> Result<NodeId, ResolveError> {
        let mut engaged_error: Option<ResolveError> = None;

        if !only_find_symbols {
            let first = &components[0];
            for container in [self.articles_container, self.tutorials_container] {
                if self.arena[container].matches(first) {
                    match self.descend(container, &components[1..], only_find_symbols) {
                        Ok(node) => return Ok(node),
                        Err(error) => engaged_error.get_or_insert(error),
                    };
                } else if self.arena[container].any_child_matches(first) {
                    match self.descend(container, components, only_find_symbols) {
                        Ok(node) => return Ok(node),
                        Err(error) => engaged_error.get_or_insert(error),
                    };
                }
            }
            let overview = self.tutorial_overview_container;
            if self.arena[overview].any_child_matches(first) {
                match self.descend(overview, components, only_find_symbols) {
                    Ok(node) => return Ok(node),
                    Err(error) => engaged_error.get_or_insert(error),
                };
            }
        }

        match self.find_from_roots(components, only_find_symbols) {
            Ok(node) => Ok(node),
            // A container that matched part of the way produced the more
            // precise error.
            Err(root_error) => Err(engaged_error.unwrap_or(root_error)),
        }
    }

    fn find_from_roots(
        &self,
        components: &[PathComponent],
        only_find_symbols: bool,
    ) -> Result<NodeId, ResolveError> {
        let first = &components[0];
        let root = self
            .roots
            .get(&first.name)
            .or_else(|| self.roots.get(&first.full))
            .copied()
            .filter(|&root| self.arena[root].matches(first));
        if let Some(root) = root {
            return self.descend(root, &components[1..], only_find_symbols);
        }

        let missing = ResolveError::NotFound {
            remaining: components.to_vec(),
            available: self.top_level_names(),
        };

        // With a single module the module prefix may be omitted. Try the
        // whole path under it and swallow that attempt's error; the missing
        // top-level match is what the author needs to hear about.
        let modules = self.module_roots();
        if let [module] = modules[..] {
            if let Ok(node) = self.descend(module, components, only_find_symbols) {
                return Ok(node);
            }
        }
        Err(missing)
    }

    /// Walk upward from `parent`, trying to descend at each level where the
    /// first component matches a child (or the ancestor itself). The first
    /// error from the deepest level that engaged is the one reported if the
    /// whole ascent fails.
    fn resolve_relative(
        &self,
        parent: NodeId,
        components: &[PathComponent],
        only_find_symbols: bool,
    ) -> Result<NodeId, ResolveError> {
        let mut components = components;
        let mut cursor = parent;

        // Leading "." and ".." segments adjust the starting level.
        while let Some(first) = components.first() {
            match first.full.as_str() {
                "." => components = &components[1..],
                ".." => {
                    components = &components[1..];
                    match self.arena[cursor].parent() {
                        Some(up) => cursor = up,
                        None => {
                            return self.find_from_entry_points(components, only_find_symbols);
                        }
                    }
                }
                _ => break,
            }
        }
        if components.is_empty() {
            return Ok(cursor);
        }

        let mut innermost_error: Option<ResolveError> = None;
        loop {
            if self.arena[cursor].any_child_matches(&components[0]) {
                match self.descend(cursor, components, only_find_symbols) {
                    Ok(node) => return Ok(node),
                    Err(error) => {
                        innermost_error.get_or_insert(error);
                    }
                }
            } else if self.arena[cursor].matches(&components[0]) {
                match self.descend(cursor, &components[1..], only_find_symbols) {
                    Ok(node) => return Ok(node),
                    Err(error) => {
                        innermost_error.get_or_insert(error);
                    }
                }
            }
            match self.arena[cursor].parent() {
                Some(up) => cursor = up,
                None => break,
            }
        }

        match self.find_from_entry_points(components, only_find_symbols) {
            Ok(node) => Ok(node),
            Err(top_error) => Err(innermost_error.unwrap_or(top_error)),
        }
    }

    /// Consume components one at a time starting at `start`.
    fn descend(
        &self,
        start: NodeId,
        components: &[PathComponent],
        only_find_symbols: bool,
    ) -> Result<NodeId, ResolveError> {
        let mut node = start;
        for (index, component) in components.iter().enumerate() {
            let remaining = || components[index..].to_vec();

            let Some((container, used_full)) = self.container_for(node, component) else {
                return Err(ResolveError::UnknownName {
                    partial: node,
                    remaining: remaining(),
                });
            };

            if component.fragment {
                match container.find(Some(ANCHOR_KIND), None, &self.arena) {
                    FindResult::Found(anchor) => {
                        node = anchor;
                        continue;
                    }
                    _ => {
                        return Err(ResolveError::UnknownName {
                            partial: node,
                            remaining: remaining(),
                        });
                    }
                }
            }

            let (kind, hash) = if used_full {
                (None, None)
            } else {
                (component.kind.as_deref(), component.hash.as_deref())
            };
            match container.find(kind, hash, &self.arena) {
                FindResult::Found(next) => node = next,
                FindResult::Missing => {
                    let spans = container.spans_multiple_languages(&self.arena);
                    return Err(ResolveError::UnknownDisambiguation {
                        partial: node,
                        remaining: remaining(),
                        candidates: container.disambiguated_values(&self.arena, spans),
                    });
                }
                FindResult::Collision(candidates) => {
                    node = self.settle_collision(
                        node,
                        candidates,
                        components.get(index + 1),
                        only_find_symbols,
                        remaining,
                    )?;
                }
            }
        }
        Ok(node)
    }

    fn settle_collision(
        &self,
        partial: NodeId,
        candidates: Vec<Candidate>,
        next: Option<&PathComponent>,
        only_find_symbols: bool,
        remaining: impl Fn() -> Vec<PathComponent>,
    ) -> Result<NodeId, ResolveError> {
        if let Some(next_component) = next {
            // One step of look-ahead: a collision is harmless if only one
            // candidate can resolve the rest of the path.
            let further: Vec<&Candidate> = candidates
                .iter()
                .filter(|candidate| self.component_resolves_under(candidate.node, next_component))
                .collect();
            if let [only] = further[..] {
                return Ok(only.node);
            }
            if let Some(primary) = self.shared_symbol_primary(&candidates) {
                return Ok(primary);
            }
            return Err(ResolveError::LookupCollision {
                partial,
                remaining: remaining(),
                candidates,
            });
        }

        let favored: Vec<&Candidate> = candidates
            .iter()
            .filter(|candidate| !self.arena[candidate.node].is_disfavored_in_collision())
            .collect();
        if let [only] = favored[..] {
            return Ok(only.node);
        }
        if let Some(primary) = self.shared_symbol_primary(&candidates) {
            return Ok(primary);
        }
        let preferred: Vec<&Candidate> = candidates
            .iter()
            .filter(|candidate| {
                self.arena[candidate.node].symbol().is_some() == only_find_symbols
            })
            .collect();
        if let [only] = preferred[..] {
            return Ok(only.node);
        }
        Err(ResolveError::LookupCollision {
            partial,
            remaining: remaining(),
            candidates,
        })
    }

    /// When every candidate is the same symbol in a different language, pick
    /// the primary language's node (ties broken deterministically).
    fn shared_symbol_primary(&self, candidates: &[Candidate]) -> Option<NodeId> {
        let mut shared: Option<&str> = None;
        for candidate in candidates {
            let symbol = self.arena[candidate.node].symbol()?;
            match shared {
                None => shared = Some(&symbol.precise),
                Some(precise) if precise != symbol.precise => return None,
                Some(_) => {}
            }
        }

        candidates
            .iter()
            .map(|candidate| {
                let language = self.arena[candidate.node]
                    .symbol()
                    .map(|symbol| symbol.language.as_str())
                    .unwrap_or("");
                (language != PRIMARY_LANGUAGE, language, candidate.node)
            })
            .min()
            .map(|(_, _, node)| node)
    }

    /// Whether a component could resolve one level below `node`.
    fn component_resolves_under(&self, node: NodeId, component: &PathComponent) -> bool {
        let Some((container, used_full)) = self.container_for(node, component) else {
            return false;
        };
        if component.fragment {
            return matches!(
                container.find(Some(ANCHOR_KIND), None, &self.arena),
                FindResult::Found(_)
            );
        }
        let (kind, hash) = if used_full {
            (None, None)
        } else {
            (component.kind.as_deref(), component.hash.as_deref())
        };
        !matches!(container.find(kind, hash, &self.arena), FindResult::Missing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyBuilder;
    use crate::kind::stable_hash;
    use crate::symbol_graph::{Relationship, RelationshipKind, Symbol, SymbolGraph};

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
        graph.symbols.push(Symbol::new(
            "s:1M3FooC3baryyF",
            "swift",
            "func",
            vec!["Foo".into(), "bar()".into()],
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::MemberOf,
            "s:1M3FooV3baryyF",
            "s:1M3FooV",
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::MemberOf,
            "s:1M3FooC3baryyF",
            "s:1M3FooC",
        ));
        graph
    }

    fn build(graph: SymbolGraph) -> Hierarchy {
        let mut builder = HierarchyBuilder::new("TestBundle");
        builder.add_symbol_graph("M.symbols.json", &graph);
        builder.finish()
    }

    #[test]
    fn ambiguous_mid_path_component_collides() {
        let hierarchy = build(colliding_foo_graph());
        let error = hierarchy
            .find_str("/M/Foo/bar()", None, true)
            .expect_err("Foo is ambiguous");
        match error {
            ResolveError::LookupCollision { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
            }
            other => panic!("expected a collision, got {other:?}"),
        }
    }

    #[test]
    fn kind_disambiguation_resolves_the_collision() {
        let hierarchy = build(colliding_foo_graph());
        let id = hierarchy
            .find_str("/M/Foo-struct/bar()", None, true)
            .expect("disambiguated link resolves");
        let node = hierarchy.node_for(id).unwrap();
        assert_eq!(
            hierarchy.node(node).symbol().unwrap().precise,
            "s:1M3FooV3baryyF"
        );
    }

    #[test]
    fn hash_disambiguation_resolves_the_collision() {
        let hierarchy = build(colliding_foo_graph());
        let hash = stable_hash("s:1M3FooC");
        let id = hierarchy
            .find_str(&format!("/M/Foo-{hash}/bar()"), None, true)
            .expect("hash-disambiguated link resolves");
        let node = hierarchy.node_for(id).unwrap();
        assert_eq!(
            hierarchy.node(node).symbol().unwrap().precise,
            "s:1M3FooC3baryyF"
        );
    }

    #[test]
    fn module_prefix_may_be_omitted_with_a_single_module() {
        let hierarchy = build(colliding_foo_graph());
        assert!(hierarchy.find_str("Foo-struct/bar()", None, true).is_ok());

        // The original missing-root error is reported when the optimistic
        // descent fails too.
        let error = hierarchy
            .find_str("Missing", None, true)
            .expect_err("nothing named Missing");
        assert!(matches!(error, ResolveError::NotFound { .. }));
    }

    #[test]
    fn unknown_child_reports_unknown_name() {
        let hierarchy = build(colliding_foo_graph());
        let error = hierarchy
            .find_str("/M/Foo-struct/missing()", None, true)
            .expect_err("no such child");
        match error {
            ResolveError::UnknownName { partial, remaining } => {
                assert_eq!(hierarchy.node(partial).name(), "Foo");
                assert_eq!(remaining[0].full, "missing()");
            }
            other => panic!("expected UnknownName, got {other:?}"),
        }
    }

    #[test]
    fn wrong_disambiguation_reports_candidates() {
        let hierarchy = build(colliding_foo_graph());
        let error = hierarchy
            .find_str("/M/Foo-enum/bar()", None, true)
            .expect_err("no enum named Foo");
        match error {
            ResolveError::UnknownDisambiguation { candidates, .. } => {
                assert_eq!(candidates.len(), 2);
                let suffixes: Vec<String> = candidates
                    .iter()
                    .map(|c| c.disambiguation.suffix())
                    .collect();
                assert!(suffixes.contains(&"-struct".to_string()));
                assert!(suffixes.contains(&"-class".to_string()));
            }
            other => panic!("expected UnknownDisambiguation, got {other:?}"),
        }
    }

    #[test]
    fn default_implementation_loses_unqualified_lookup() {
        let mut graph = SymbolGraph::new("M");
        graph
            .symbols
            .push(Symbol::new("s:1M1PP", "swift", "protocol", vec!["P".into()]));
        graph.symbols.push(Symbol::new(
            "s:1M1PP3fooyyF",
            "swift",
            "func",
            vec!["P".into(), "foo()".into()],
        ));
        graph.symbols.push(Symbol::new(
            "s:1M1PPAAE3fooyyF",
            "swift",
            "func",
            vec!["P".into(), "foo()".into()],
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::RequirementOf,
            "s:1M1PP3fooyyF",
            "s:1M1PP",
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::MemberOf,
            "s:1M1PP",
            "M",
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::DefaultImplementationOf,
            "s:1M1PPAAE3fooyyF",
            "s:1M1PP3fooyyF",
        ));
        let hierarchy = build(graph);

        let requirement = hierarchy.find_str("/M/P/foo()", None, true).unwrap();
        let node = hierarchy.node_for(requirement).unwrap();
        assert_eq!(hierarchy.node(node).symbol().unwrap().precise, "s:1M1PP3fooyyF");

        let hash = stable_hash("s:1M1PPAAE3fooyyF");
        let implementation = hierarchy
            .find_str(&format!("/M/P/foo()-{hash}"), None, true)
            .unwrap();
        let node = hierarchy.node_for(implementation).unwrap();
        assert_eq!(
            hierarchy.node(node).symbol().unwrap().precise,
            "s:1M1PPAAE3fooyyF"
        );
    }

    #[test]
    fn placeholder_match_is_unfindable_but_its_children_resolve() {
        let mut graph = SymbolGraph::new("M");
        graph.symbols.push(Symbol::new(
            "s:1M1AC1BV",
            "swift",
            "struct",
            vec!["A".into(), "B".into()],
        ));
        let hierarchy = build(graph);

        let error = hierarchy
            .find_str("/M/A", None, true)
            .expect_err("placeholder is unfindable");
        assert!(matches!(error, ResolveError::UnfindableMatch { .. }));

        assert!(hierarchy.find_str("/M/A/B", None, true).is_ok());
    }

    #[test]
    fn relative_link_ascends_to_a_sibling() {
        let mut graph = SymbolGraph::new("M");
        graph
            .symbols
            .push(Symbol::new("s:1M3FooV", "swift", "struct", vec!["Foo".into()]));
        graph
            .symbols
            .push(Symbol::new("s:1M3BarV", "swift", "struct", vec!["Bar".into()]));
        graph.symbols.push(Symbol::new(
            "s:1M3BarV3BazV",
            "swift",
            "struct",
            vec!["Bar".into(), "Baz".into()],
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::MemberOf,
            "s:1M3BarV3BazV",
            "s:1M3BarV",
        ));
        let hierarchy = build(graph);

        let baz = hierarchy.find_str("/M/Bar/Baz", None, true).unwrap();
        let foo = hierarchy
            .find_str("Foo", Some(baz), true)
            .expect("sibling search finds Foo beside Bar");
        let node = hierarchy.node_for(foo).unwrap();
        assert_eq!(hierarchy.node(node).symbol().unwrap().precise, "s:1M3FooV");

        // Explicit parent traversal works too.
        let foo_again = hierarchy.find_str("../Foo", Some(baz), true).unwrap();
        assert_eq!(foo, foo_again);
    }

    #[test]
    fn relative_failure_reports_the_innermost_error() {
        let hierarchy = build(colliding_foo_graph());
        let foo = hierarchy.find_str("/M/Foo-struct", None, true).unwrap();
        let error = hierarchy
            .find_str("bar()/missing", Some(foo), true)
            .expect_err("bar() has no children");
        match error {
            ResolveError::UnknownName { partial, remaining } => {
                assert_eq!(hierarchy.node(partial).name(), "bar()");
                assert_eq!(remaining[0].full, "missing");
            }
            other => panic!("expected the inner UnknownName, got {other:?}"),
        }
    }

    #[test]
    fn empty_link_is_not_found_with_no_remaining_components() {
        let hierarchy = build(colliding_foo_graph());
        let error = hierarchy.find_str("", None, true).expect_err("empty link");
        match error {
            ResolveError::NotFound { remaining, .. } => assert!(remaining.is_empty()),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn articles_resolve_only_for_non_symbol_links() {
        let mut builder = HierarchyBuilder::new("TestBundle");
        builder.add_symbol_graph("M.symbols.json", &colliding_foo_graph());
        let article = builder.add_article("Getting-Started");
        let hierarchy = builder.finish();

        let found = hierarchy
            .find_str("/TestBundle/Getting-Started", None, false)
            .expect("article resolves by container name");
        assert_eq!(found, article);

        let found = hierarchy
            .find_str("Getting-Started", None, false)
            .expect("article resolves as a container child");
        assert_eq!(found, article);

        let error = hierarchy
            .find_str("/TestBundle/Getting-Started", None, true)
            .expect_err("symbol links skip articles");
        assert!(matches!(error, ResolveError::NotFound { .. }));
    }

    #[test]
    fn anchors_resolve_via_fragments() {
        let mut builder = HierarchyBuilder::new("TestBundle");
        builder.add_symbol_graph("M.symbols.json", &colliding_foo_graph());
        let article = builder.add_article("Guide");
        let anchor = builder.add_anchor(article, "Overview");
        let hierarchy = builder.finish();

        let found = hierarchy
            .find_str("/TestBundle/Guide#Overview", None, false)
            .expect("anchor resolves");
        assert_eq!(found, anchor);

        let found = hierarchy
            .find_str("#Overview", Some(article), false)
            .expect("pure fragment resolves against the parent");
        assert_eq!(found, anchor);
    }

    #[test]
    fn swift_wins_unqualified_cross_language_lookup() {
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

        let unqualified = hierarchy.find_str("/M/Foo", None, true).unwrap();
        let node = hierarchy.node_for(unqualified).unwrap();
        assert_eq!(hierarchy.node(node).symbol().unwrap().language, "swift");

        let qualified = hierarchy.find_str("/M/Foo-occ.class", None, true).unwrap();
        let node = hierarchy.node_for(qualified).unwrap();
        assert_eq!(hierarchy.node(node).symbol().unwrap().language, "occ");
    }

    #[test]
    fn unknown_kind_suffix_is_part_of_the_name() {
        let mut graph = SymbolGraph::new("M");
        graph.symbols.push(Symbol::new(
            "s:1M11JSONDecoder",
            "swift",
            "class",
            vec!["JSON-Decoder".into()],
        ));
        let hierarchy = build(graph);
        assert!(hierarchy.find_str("/M/JSON-Decoder", None, true).is_ok());
    }

    #[test]
    fn hyphenated_name_that_parses_like_a_hash_still_resolves() {
        let mut graph = SymbolGraph::new("M");
        graph.symbols.push(Symbol::new(
            "s:1M2is4even",
            "swift",
            "var",
            vec!["is-even".into()],
        ));
        let hierarchy = build(graph);
        // "even" parses as a candidate hash; lookup falls back to the full
        // segment text as the name.
        assert!(hierarchy.find_str("/M/is-even", None, true).is_ok());
    }
}

//! End-to-end resolution scenarios over the full service: build a hierarchy
//! from symbol graphs, wrap it in a resolver, and drive the public API.

use std::sync::Arc;

use doclink_core::HierarchyBuilder;
use doclink_core::symbol_graph::{Relationship, RelationshipKind, Symbol, SymbolGraph};
use doclink_core::{kind, parse_link};
use doclink_resolver::{
    ExternalArchive, LinkResolver, ResolvedReference, TopicCategory, UnresolvedReference,
};

fn colliding_module_graph() -> SymbolGraph {
    let mut graph = SymbolGraph::new("M");
    graph
        .symbols
        .push(Symbol::new("s:1M3FooV", "swift", "struct", vec!["Foo".into()]));
    graph
        .symbols
        .push(Symbol::new("s:1M3FooC", "swift", "class", vec!["Foo".into()]));
    graph.symbols.push(Symbol::new(
        "s:M3FooV3baryyF",
        "swift",
        "func",
        vec!["Foo".into(), "bar()".into()],
    ));
    graph.symbols.push(Symbol::new(
        "s:M3FooC3baryyF",
        "swift",
        "func",
        vec!["Foo".into(), "bar()".into()],
    ));
    graph.relationships.push(Relationship::new(
        RelationshipKind::MemberOf,
        "s:M3FooV3baryyF",
        "s:1M3FooV",
    ));
    graph.relationships.push(Relationship::new(
        RelationshipKind::MemberOf,
        "s:M3FooC3baryyF",
        "s:1M3FooC",
    ));
    graph
}

fn resolver_for(graph: SymbolGraph) -> LinkResolver {
    let mut builder = HierarchyBuilder::new("com.example.m");
    builder.add_symbol_graph("M.symbols.json", &graph);
    LinkResolver::new("com.example.m", builder.finish())
}

#[test]
fn colliding_symbols_need_disambiguation() {
    let resolver = resolver_for(colliding_module_graph());

    let error = resolver
        .resolve("/M/Foo/bar()", None, true)
        .expect_err("Foo is ambiguous");
    assert!(error.message.contains("ambiguous"));
    let suffixes: Vec<&str> = error
        .solutions
        .iter()
        .map(|s| s.replacements[0].text.as_str())
        .collect();
    assert!(suffixes.contains(&"-struct"));
    assert!(suffixes.contains(&"-class"));

    let reference = resolver
        .resolve("/M/Foo-struct/bar()", None, true)
        .expect("disambiguated link resolves");
    assert_eq!(reference.path, "/documentation/M/Foo-struct/bar()");

    let paths = resolver.paths();
    assert_eq!(paths["s:M3FooV3baryyF"], "/M/Foo-struct/bar()");
}

#[test]
fn enum_cases_get_plain_paths() {
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
    let resolver = resolver_for(graph);

    assert_eq!(resolver.paths()["s:1M5ColorO3redyA2CmF"], "/M/Color/red");
    assert!(resolver.resolve("/M/Color/red", None, true).is_ok());
}

#[test]
fn default_implementations_yield_to_requirements() {
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
    let resolver = resolver_for(graph);

    let paths = resolver.paths();
    assert_eq!(paths["s:1M1PP3fooyyF"], "/M/P/foo()");

    let requirement = resolver.resolve("/M/P/foo()", None, true).unwrap();
    assert_eq!(requirement.path, "/documentation/M/P/foo()");

    let implementation_path = &paths["s:1M1PPAAE3fooyyF"];
    let hash = kind::stable_hash("s:1M1PPAAE3fooyyF");
    assert_eq!(implementation_path, &format!("/M/P/foo()-{hash}"));
    let implementation = resolver
        .resolve(implementation_path, None, true)
        .expect("hash-qualified link picks the implementation");
    assert_eq!(
        implementation.path,
        format!("/documentation/M/P/foo()-{hash}")
    );
}

#[test]
fn sparse_graphs_bridge_missing_parents() {
    let mut graph = SymbolGraph::new("M");
    graph.symbols.push(Symbol::new(
        "s:1M1AC1BV",
        "swift",
        "struct",
        vec!["A".into(), "B".into()],
    ));
    let resolver = resolver_for(graph);

    let error = resolver
        .resolve("/M/A", None, true)
        .expect_err("the placeholder is unfindable");
    assert!(error.message.contains("can't be linked to"));

    assert!(resolver.resolve("/M/A/B", None, true).is_ok());
}

#[test]
fn relative_links_search_up_the_tree() {
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
    let resolver = resolver_for(graph);

    let baz = resolver.resolve("/M/Bar/Baz", None, true).unwrap();
    let baz_id = resolver.link_for(&baz).unwrap();

    let foo = resolver
        .resolve("../Foo", Some(baz_id), true)
        .expect("ascends beside Bar and finds Foo");
    assert_eq!(foo.path, "/documentation/M/Foo");
}

#[test]
fn removing_the_local_bundle_unregisters_everything() {
    let mut builder = HierarchyBuilder::new("com.example.m");
    builder.add_symbol_graph("M.symbols.json", &colliding_module_graph());
    let mut resolver = LinkResolver::new("com.example.m", builder.finish());

    // Another bundle's archive stays registered and resolvable.
    let other_archive = {
        let mut other = SymbolGraph::new("Net");
        other.symbols.push(Symbol::new(
            "s:3Net7RequestV",
            "swift",
            "struct",
            vec!["Request".into()],
        ));
        let mut builder = HierarchyBuilder::new("com.example.net");
        builder.add_symbol_graph("Net.symbols.json", &other);
        builder.add_article("Networking-Guide");
        let hierarchy = builder.finish();
        ExternalArchive::load("com.example.net", &hierarchy.to_json().unwrap(), "[]").unwrap()
    };
    resolver.register_external("com.example.net", Arc::new(other_archive));

    assert!(resolver.resolve("/M/Foo-struct", None, true).is_ok());
    assert!(resolver.remove_bundle("com.example.m"));

    let error = resolver
        .resolve("/M/Foo-struct", None, true)
        .expect_err("local symbols are gone");
    assert!(error.message.contains("No top-level page or module"));

    // The other bundle still resolves through its external resolver.
    assert!(
        resolver
            .resolve("doc://com.example.net/documentation/Net/Request", None, true)
            .is_ok()
    );
    assert!(
        resolver
            .resolve(
                "doc://com.example.net/documentation/com.example.net/Networking-Guide",
                None,
                false
            )
            .is_ok()
    );
}

#[test]
fn fallback_resolvers_answer_hierarchy_misses_and_are_cached() {
    use std::sync::atomic::{AtomicUsize, Ordering};

    let mut builder = HierarchyBuilder::new("com.example.m");
    builder.add_symbol_graph("M.symbols.json", &colliding_module_graph());
    let mut resolver = LinkResolver::new("com.example.m", builder.finish());

    static CALLS: AtomicUsize = AtomicUsize::new(0);
    let fallback = |reference: &UnresolvedReference,
                    _parent: Option<&ResolvedReference>,
                    _is_symbol_link: bool|
     -> doclink_error::Result<ResolvedReference> {
        CALLS.fetch_add(1, Ordering::SeqCst);
        if reference.path.ends_with("/Legacy-Page") {
            Ok(ResolvedReference::for_page(
                TopicCategory::Article,
                "com.example.m",
                reference.path.clone(),
                "Legacy Page",
            ))
        } else {
            Err(doclink_error::Error::resolution_failed(reference.link_text()))
        }
    };
    resolver.add_fallback(Arc::new(fallback));
    resolver.freeze();

    let first = resolver
        .resolve("Legacy-Page", None, false)
        .expect("fallback resolves the miss");
    let calls_after_first = CALLS.load(Ordering::SeqCst);
    assert!(calls_after_first >= 1);

    let second = resolver
        .resolve("Legacy-Page", None, false)
        .expect("cached result");
    assert_eq!(first, second);
    // The cache answered; no further fallback calls for the same URL.
    assert_eq!(CALLS.load(Ordering::SeqCst), calls_after_first);
}

#[test]
fn builds_are_deterministic() {
    let build = || {
        let mut builder = HierarchyBuilder::new("com.example.m");
        builder.add_symbol_graph("M.symbols.json", &colliding_module_graph());
        builder.add_article("Guide");
        builder.finish()
    };
    let first = build();
    let second = build();

    assert_eq!(first.dump(), second.dump());
    assert_eq!(first.disambiguated_paths(), second.disambiguated_paths());
}

#[test]
fn every_symbol_round_trips_through_its_path() {
    let resolver = resolver_for(colliding_module_graph());
    for (precise, path) in resolver.paths() {
        let reference = resolver
            .resolve(&path, None, true)
            .unwrap_or_else(|err| panic!("'{path}' should resolve: {}", err.message));
        assert_eq!(reference.path, format!("/documentation{path}"));
        let _ = precise;
    }
}

#[test]
fn emitted_paths_are_injective_and_minimal() {
    // A corpus dense with collisions: same names across kinds and nested
    // same-kind overloads. Case-insensitive conflicts are excluded here
    // because their forced suffixes strip back to links that still resolve
    // case-sensitively.
    let mut graph = SymbolGraph::new("M");
    for (precise, kind_id, name) in [
        ("s:0", "struct", "Thing"),
        ("s:1", "class", "Thing"),
        ("s:2", "enum", "Thing"),
        ("s:4", "func", "run(_:)"),
        ("s:5", "func", "run(_:)"),
    ] {
        graph
            .symbols
            .push(Symbol::new(precise, "swift", kind_id, vec![name.into()]));
    }
    for (precise, name) in [("s:0m1", "go()"), ("s:0m2", "go()")] {
        graph.symbols.push(Symbol::new(
            precise,
            "swift",
            "func",
            vec!["Thing".into(), name.into()],
        ));
        graph.relationships.push(Relationship::new(
            RelationshipKind::MemberOf,
            precise,
            "s:0",
        ));
    }
    let resolver = resolver_for(graph);
    let paths = resolver.paths();

    // Injective.
    let mut seen = std::collections::HashSet::new();
    for path in paths.values() {
        assert!(seen.insert(path.clone()), "duplicate path '{path}'");
    }

    // Minimal: stripping the final disambiguation must break resolution.
    let hierarchy = resolver.hierarchy();
    for path in paths.values() {
        let parsed = parse_link(path);
        let last = parsed.components.last().unwrap();
        if last.is_plain() {
            continue;
        }
        let stripped = &path[..path.len() - (last.full.len() - last.name.len())];
        assert!(
            hierarchy.find(&parse_link(stripped), None, true).is_err(),
            "'{stripped}' still resolves after stripping the suffix of '{path}'"
        );
    }
}

#[test]
fn frozen_resolvers_answer_from_many_threads() {
    let mut resolver = resolver_for(colliding_module_graph());
    resolver.freeze();
    let paths: Vec<String> = resolver.paths().into_values().collect();

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for path in &paths {
                    assert!(resolver.resolve(path, None, true).is_ok());
                }
            });
        }
    });
}

#[test]
fn parent_invariant_holds_for_every_symbol() {
    let resolver = resolver_for(colliding_module_graph());
    let hierarchy = resolver.hierarchy();
    hierarchy.traverse_symbol_and_parent_pairs(|id, parent| {
        let node = hierarchy.node_for(id).expect("symbol is findable");
        if let Some(parent_id) = parent {
            let parent_node = hierarchy.node_for(parent_id).expect("parent is findable");
            let name = hierarchy.node(node).name().to_string();
            let container = hierarchy
                .node(parent_node)
                .children()
                .get(&name)
                .expect("parent's bag contains the child's name");
            assert!(container.contains_node(node));
        }
    });
}

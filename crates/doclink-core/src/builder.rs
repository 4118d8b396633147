//! Hierarchy construction.
//!
//! The builder consumes module symbol graphs in a deterministic order and
//! grafts non-symbol pages on afterwards. Relationships are the preferred
//! source of parentage because they carry exact disambiguation; symbols the
//! relationships never place are walked in by their declared path
//! components, inserting unfindable placeholders where a partial graph is
//! missing a parent.

use std::collections::HashMap;

use crate::component::PathComponent;
use crate::disambiguation::FindResult;
use crate::hierarchy::Hierarchy;
use crate::kind::{MISSING_HASH, MODULE_KIND, NON_SYMBOL_KIND, PRIMARY_LANGUAGE, stable_hash};
use crate::node::{LinkId, Node, NodeId, PageKind, SymbolRecord};
use crate::symbol_graph::{NamedSymbolGraph, RelationshipKind, Symbol, SymbolGraph};

/// Builds a [`Hierarchy`] from symbol graphs and non-symbol pages.
pub struct HierarchyBuilder {
    hierarchy: Hierarchy,
    /// Every symbol node by precise id, across modules and languages.
    nodes_by_precise: HashMap<String, Vec<NodeId>>,
    /// Node reuse table: one node per `(precise, interface language)`.
    nodes_by_precise_lang: HashMap<(String, String), NodeId>,
    /// Caller-supplied disambiguated path components for partial graphs.
    known_disambiguated: HashMap<String, Vec<String>>,
}

impl HierarchyBuilder {
    pub fn new(bundle_name: impl Into<String>) -> Self {
        HierarchyBuilder {
            hierarchy: Hierarchy::new(bundle_name),
            nodes_by_precise: HashMap::new(),
            nodes_by_precise_lang: HashMap::new(),
            known_disambiguated: HashMap::new(),
        }
    }

    /// Supply pre-disambiguated path components for a symbol. Used when a
    /// partial graph's raw components would be ambiguous; they take effect
    /// only when their count matches the symbol's own component count.
    pub fn set_known_disambiguated_path_components(
        &mut self,
        precise: impl Into<String>,
        components: Vec<String>,
    ) {
        self.known_disambiguated.insert(precise.into(), components);
    }

    /// Add a batch of symbol graphs, primary files before `@`-suffixed
    /// extension files, ties broken by file name. This is the ordering that
    /// makes repeated builds byte-identical.
    pub fn add_symbol_graphs(&mut self, graphs: &[NamedSymbolGraph]) {
        let mut order: Vec<usize> = (0..graphs.len()).collect();
        order.sort_by_key(|&index| {
            let named = &graphs[index];
            (named.is_extension(), named.file_name.clone())
        });
        for index in order {
            self.add_symbol_graph(&graphs[index].file_name, &graphs[index].graph);
        }
    }

    /// Add one module symbol graph.
    pub fn add_symbol_graph(&mut self, file_name: &str, graph: &SymbolGraph) {
        tracing::debug!(
            module = %graph.module.name,
            file = file_name,
            symbols = graph.symbols.len(),
            relationships = graph.relationships.len(),
            "adding symbol graph"
        );

        let module_node = self.ensure_module(graph);

        // Create or reuse one node per symbol.
        let mut local: HashMap<&str, NodeId> = HashMap::new();
        for symbol in &graph.symbols {
            let precise = symbol.identifier.precise.as_str();
            if symbol.kind.identifier == MODULE_KIND && symbol.name() == graph.module.name {
                local.insert(precise, module_node);
                continue;
            }
            let node = self.ensure_symbol_node(symbol);
            local.insert(precise, node);
        }

        // Relationships carry disambiguation, so they place symbols first.
        for relationship in &graph.relationships {
            match relationship.kind {
                RelationshipKind::MemberOf
                | RelationshipKind::RequirementOf
                | RelationshipKind::OptionalRequirementOf => {
                    let Some(&source) = local.get(relationship.source.as_str()) else {
                        continue;
                    };
                    for target in self.relationship_targets(&local, &relationship.target) {
                        if target != source {
                            self.attach_symbol(target, source);
                        }
                    }
                }
                RelationshipKind::DefaultImplementationOf => {
                    let Some(&source) = local.get(relationship.source.as_str()) else {
                        continue;
                    };
                    for target in self.relationship_targets(&local, &relationship.target) {
                        let Some(parent) = self.hierarchy.node(target).parent() else {
                            continue;
                        };
                        // The implementation sits beside the requirement it
                        // implements and loses unqualified collisions to it.
                        self.hierarchy.arena[source].disfavored_in_collision = true;
                        self.attach_symbol(parent, source);
                    }
                }
                _ => {}
            }
        }

        // Whatever relationships didn't place: top-level symbols go straight
        // under the module, the rest walk their declared path components.
        for symbol in &graph.symbols {
            let Some(&node) = local.get(symbol.identifier.precise.as_str()) else {
                continue;
            };
            if node == module_node || self.hierarchy.node(node).parent().is_some() {
                continue;
            }
            if symbol.path_components.len() <= 1 {
                self.attach_symbol(module_node, node);
                continue;
            }
            self.graft_by_path_components(module_node, symbol, node);
        }
    }

    /// Add an article under the articles container.
    pub fn add_article(&mut self, name: &str) -> LinkId {
        let parent = self.hierarchy.articles_container();
        self.add_page_under(parent, name, PageKind::Article)
    }

    /// Add a tutorial under the tutorials container.
    pub fn add_tutorial(&mut self, name: &str) -> LinkId {
        let parent = self.hierarchy.tutorials_container();
        self.add_page_under(parent, name, PageKind::Tutorial)
    }

    /// Add a tutorial overview page under the overview container.
    pub fn add_tutorial_overview(&mut self, name: &str) -> LinkId {
        let parent = self.hierarchy.tutorial_overview_container();
        self.add_page_under(parent, name, PageKind::TutorialOverview)
    }

    /// Add a technology root. Technologies resolve like modules do.
    pub fn add_technology(&mut self, name: &str) -> LinkId {
        let node = self
            .hierarchy
            .arena
            .alloc(Node::page_node(name, PageKind::Technology));
        let id = self.hierarchy.register(node);
        self.hierarchy.add_root(name, node);
        id
    }

    /// Add a volume page under a technology root.
    pub fn add_volume(&mut self, technology: LinkId, name: &str) -> LinkId {
        let parent = self.owner_node(technology);
        self.add_page_under(parent, name, PageKind::Volume)
    }

    /// Add a chapter page under a volume.
    pub fn add_chapter(&mut self, volume: LinkId, name: &str) -> LinkId {
        let parent = self.owner_node(volume);
        self.add_page_under(parent, name, PageKind::Chapter)
    }

    /// Add an on-page anchor under its owning page.
    pub fn add_anchor(&mut self, owner: LinkId, name: &str) -> LinkId {
        let parent = self.owner_node(owner);
        self.add_page_under(parent, name, PageKind::Anchor)
    }

    /// Add a task group under its containing page.
    pub fn add_task_group(&mut self, owner: LinkId, name: &str) -> LinkId {
        let parent = self.owner_node(owner);
        self.add_page_under(parent, name, PageKind::TaskGroup)
    }

    /// Add a tutorial landmark under its tutorial.
    pub fn add_landmark(&mut self, tutorial: LinkId, name: &str) -> LinkId {
        let parent = self.owner_node(tutorial);
        self.add_page_under(parent, name, PageKind::Landmark)
    }

    /// Finish the build, verifying the hierarchy invariants.
    ///
    /// # Panics
    /// Panics when a builder bug left a findable node unparented and
    /// unrooted, or desynchronized the lookup table. These are programmer
    /// errors, not input errors.
    pub fn finish(self) -> Hierarchy {
        let hierarchy = self.hierarchy;

        for (id, node) in &hierarchy.lookup {
            assert_eq!(
                hierarchy.arena[*node].identifier(),
                Some(*id),
                "lookup table entry {id} does not match its node"
            );
        }
        let rooted: std::collections::HashSet<NodeId> = hierarchy
            .roots
            .values()
            .copied()
            .chain([
                hierarchy.articles_container(),
                hierarchy.tutorials_container(),
                hierarchy.tutorial_overview_container(),
            ])
            .collect();
        for (id, node) in hierarchy.arena.iter() {
            if node.identifier().is_some() {
                assert!(
                    node.parent().is_some() || rooted.contains(&id),
                    "findable node '{}' is neither parented nor a root",
                    node.name()
                );
            }
        }

        hierarchy
    }

    /// Borrow the hierarchy being built. Mostly useful for tests.
    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    fn ensure_module(&mut self, graph: &SymbolGraph) -> NodeId {
        let name = &graph.module.name;
        if let Some(existing) = self.hierarchy.root(name) {
            return existing;
        }
        let language = graph
            .symbols
            .first()
            .map(|symbol| symbol.identifier.interface_language.clone())
            .unwrap_or_else(|| PRIMARY_LANGUAGE.to_string());
        let record = SymbolRecord {
            precise: name.clone(),
            language,
            kind_id: MODULE_KIND.to_string(),
            stable_hash: stable_hash(name),
            path_components: vec![name.clone()],
            declaration: None,
        };
        let node = self.hierarchy.arena.alloc(Node::symbol_node(name, record));
        self.hierarchy.register(node);
        self.hierarchy.add_root(name.clone(), node);
        self.index_symbol_node(name.clone(), node);
        node
    }

    fn ensure_symbol_node(&mut self, symbol: &Symbol) -> NodeId {
        let key = (
            symbol.identifier.precise.clone(),
            symbol.identifier.interface_language.clone(),
        );
        if let Some(&existing) = self.nodes_by_precise_lang.get(&key) {
            return existing;
        }
        let record = SymbolRecord {
            precise: symbol.identifier.precise.clone(),
            language: symbol.identifier.interface_language.clone(),
            kind_id: symbol.kind.identifier.clone(),
            stable_hash: stable_hash(&symbol.identifier.precise),
            path_components: symbol.path_components.clone(),
            declaration: symbol.declaration(),
        };
        let node = self
            .hierarchy
            .arena
            .alloc(Node::symbol_node(symbol.name(), record));
        self.hierarchy.register(node);
        self.nodes_by_precise_lang.insert(key, node);
        self.index_symbol_node(symbol.identifier.precise.clone(), node);
        node
    }

    fn index_symbol_node(&mut self, precise: String, node: NodeId) {
        self.nodes_by_precise.entry(precise).or_default().push(node);
    }

    /// Targets of a relationship: the graph's own symbol when present,
    /// otherwise every known node with the target's precise id (cross-module
    /// extensions attach under each one).
    fn relationship_targets(
        &self,
        local: &HashMap<&str, NodeId>,
        target: &str,
    ) -> Vec<NodeId> {
        if let Some(&node) = local.get(target) {
            return vec![node];
        }
        self.nodes_by_precise
            .get(target)
            .cloned()
            .unwrap_or_default()
    }

    fn attach_symbol(&mut self, parent: NodeId, child: NodeId) -> NodeId {
        let (kind, hash) = {
            let node = self.hierarchy.node(child);
            match node.symbol() {
                Some(symbol) => (symbol.kind_id.clone(), symbol.stable_hash.clone()),
                None => (NON_SYMBOL_KIND.to_string(), MISSING_HASH.to_string()),
            }
        };
        self.hierarchy.attach(parent, child, &kind, &hash)
    }

    /// Walk a symbol's path components from its module, creating unfindable
    /// placeholders for the levels a partial graph is missing.
    fn graft_by_path_components(&mut self, module_node: NodeId, symbol: &Symbol, node: NodeId) {
        let components = match self.known_disambiguated.get(&symbol.identifier.precise) {
            Some(known) if known.len() == symbol.path_components.len() => known.clone(),
            _ => symbol.path_components.clone(),
        };

        let mut cursor = module_node;
        for text in &components[..components.len() - 1] {
            let component = PathComponent::parse(text);
            let found = match self.hierarchy.container_for(cursor, &component) {
                Some((container, used_full)) => {
                    let (kind, hash) = if used_full {
                        (None, None)
                    } else {
                        (component.kind.as_deref(), component.hash.as_deref())
                    };
                    match container.find(kind, hash, &self.hierarchy.arena) {
                        FindResult::Found(next) => Some(next),
                        _ => None,
                    }
                }
                None => None,
            };
            cursor = match found {
                Some(next) => next,
                None => {
                    let placeholder = self
                        .hierarchy
                        .arena
                        .alloc(Node::placeholder(component.name.clone()));
                    self.hierarchy
                        .attach(cursor, placeholder, NON_SYMBOL_KIND, MISSING_HASH)
                }
            };
        }
        self.attach_symbol(cursor, node);
    }

    fn add_page_under(&mut self, parent: NodeId, name: &str, kind: PageKind) -> LinkId {
        let node = self.hierarchy.arena.alloc(Node::page_node(name, kind));
        let survivor = self.hierarchy.attach(parent, node, kind.tree_kind(), MISSING_HASH);
        self.hierarchy.register(survivor)
    }

    /// Resolve a caller-supplied page identifier to its node.
    ///
    /// # Panics
    /// Panics on an identifier that is not findable; passing one is a
    /// programmer error.
    fn owner_node(&self, id: LinkId) -> NodeId {
        self.hierarchy
            .node_for(id)
            .unwrap_or_else(|| panic!("page identifier {id} is not findable in this hierarchy"))
    }
}

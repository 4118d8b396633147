//! File representation of a hierarchy.
//!
//! External archives ship their link hierarchy in the same shape as the
//! in-memory structure: a flat node table indexed by position, the named
//! roots, and the three container indices. Reconstructing from this
//! representation yields a hierarchy whose `dump()` output is identical to
//! the one that was serialized; findable identifiers are reassigned because
//! they are process-local.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use doclink_error::{Error, ErrorKind, Result};

use crate::hierarchy::Hierarchy;
use crate::node::{Arena, Node, NodeId, PageKind, SymbolRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyFile {
    pub bundle_name: String,
    pub nodes: Vec<FileNode>,
    pub roots: BTreeMap<String, u32>,
    pub articles_container: u32,
    pub tutorials_container: u32,
    pub tutorial_overview_container: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<SymbolRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_kind: Option<String>,
    #[serde(default)]
    pub disfavored: bool,
    #[serde(default)]
    pub findable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FileChildren>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileChildren {
    pub name: String,
    pub entries: Vec<FileEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub kind: String,
    pub hash: String,
    pub node: u32,
}

impl Hierarchy {
    /// Produce the file representation of this hierarchy.
    pub fn to_file(&self) -> HierarchyFile {
        let nodes = self
            .arena
            .iter()
            .map(|(_, node)| FileNode {
                name: node.name().to_string(),
                symbol: node.symbol().cloned(),
                page_kind: node.page_kind().map(|kind| kind.to_string()),
                disfavored: node.is_disfavored_in_collision(),
                findable: node.identifier().is_some(),
                parent: node.parent().map(|id| id.0),
                children: node
                    .children()
                    .iter()
                    .map(|(name, container)| FileChildren {
                        name: name.clone(),
                        entries: container
                            .entries()
                            .map(|(kind, hash, child)| FileEntry {
                                kind: kind.to_string(),
                                hash: hash.to_string(),
                                node: child.0,
                            })
                            .collect(),
                    })
                    .collect(),
            })
            .collect();

        HierarchyFile {
            bundle_name: self.bundle_name.clone(),
            nodes,
            roots: self
                .roots
                .iter()
                .map(|(name, id)| (name.clone(), id.0))
                .collect(),
            articles_container: self.articles_container.0,
            tutorials_container: self.tutorials_container.0,
            tutorial_overview_container: self.tutorial_overview_container.0,
        }
    }

    /// Serialize this hierarchy to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(&self.to_file()).map_err(|err| {
            Error::new(ErrorKind::EncodeFailed, "hierarchy could not be encoded")
                .with_operation("hierarchy::to_json")
                .set_source(err)
        })
    }

    /// Reconstruct a hierarchy from its file representation.
    ///
    /// Findable nodes receive fresh identifiers; everything else round-trips
    /// exactly.
    pub fn from_file(file: &HierarchyFile) -> Result<Hierarchy> {
        let count = file.nodes.len();
        let check = |index: u32, what: &'static str| -> Result<NodeId> {
            if (index as usize) < count {
                Ok(NodeId(index))
            } else {
                Err(Error::new(
                    ErrorKind::DecodeFailed,
                    format!("node index {index} out of bounds"),
                )
                .with_operation("hierarchy::from_file")
                .with_context("field", what))
            }
        };

        let mut arena = Arena::default();
        for file_node in &file.nodes {
            let mut node = match (&file_node.symbol, &file_node.page_kind) {
                (Some(symbol), _) => Node::symbol_node(file_node.name.clone(), symbol.clone()),
                (None, Some(kind)) => {
                    let kind = PageKind::from_str(kind).map_err(|_| {
                        Error::new(
                            ErrorKind::DecodeFailed,
                            format!("unknown page kind '{kind}'"),
                        )
                        .with_operation("hierarchy::from_file")
                    })?;
                    Node::page_node(file_node.name.clone(), kind)
                }
                (None, None) => Node::placeholder(file_node.name.clone()),
            };
            node.disfavored_in_collision = file_node.disfavored;
            if let Some(parent) = file_node.parent {
                node.parent = Some(check(parent, "parent")?);
            }
            for children in &file_node.children {
                let container = node.children.entry(children.name.clone()).or_default();
                for entry in &children.entries {
                    let _ = container.insert(
                        entry.kind.clone(),
                        entry.hash.clone(),
                        check(entry.node, "child")?,
                    );
                }
            }
            arena.alloc(node);
        }

        let mut roots = BTreeMap::new();
        for (name, index) in &file.roots {
            roots.insert(name.clone(), check(*index, "root")?);
        }

        let mut hierarchy = Hierarchy {
            arena,
            roots,
            articles_container: check(file.articles_container, "articlesContainer")?,
            tutorials_container: check(file.tutorials_container, "tutorialsContainer")?,
            tutorial_overview_container: check(
                file.tutorial_overview_container,
                "tutorialOverviewContainer",
            )?,
            lookup: std::collections::HashMap::new(),
            bundle_name: file.bundle_name.clone(),
        };
        for index in 0..count {
            if file.nodes[index].findable {
                hierarchy.register(NodeId(index as u32));
            }
        }
        Ok(hierarchy)
    }

    /// Reconstruct a hierarchy from its JSON text.
    pub fn from_json(json: &str) -> Result<Hierarchy> {
        let file: HierarchyFile = serde_json::from_str(json).map_err(|err| {
            Error::new(ErrorKind::DecodeFailed, "invalid hierarchy file")
                .with_operation("hierarchy::from_json")
                .set_source(err)
        })?;
        Self::from_file(&file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::HierarchyBuilder;
    use crate::symbol_graph::{Relationship, RelationshipKind, Symbol, SymbolGraph};
    use pretty_assertions::assert_eq;

    fn sample_hierarchy() -> Hierarchy {
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
        // A sparse symbol, to exercise placeholder round-tripping.
        graph.symbols.push(Symbol::new(
            "s:1M1AC1BV",
            "swift",
            "struct",
            vec!["A".into(), "B".into()],
        ));

        let mut builder = HierarchyBuilder::new("TestBundle");
        builder.add_symbol_graph("M.symbols.json", &graph);
        builder.add_article("Guide");
        builder.finish()
    }

    #[test]
    fn json_round_trip_preserves_structure() {
        let original = sample_hierarchy();
        let json = original.to_json().expect("encodes");
        let restored = Hierarchy::from_json(&json).expect("decodes");

        assert_eq!(original.dump(), restored.dump());
        assert_eq!(original.root_names(), restored.root_names());
        assert_eq!(
            original.disambiguated_paths(),
            restored.disambiguated_paths()
        );
    }

    #[test]
    fn restored_hierarchy_resolves_like_the_original() {
        let original = sample_hierarchy();
        let restored = Hierarchy::from_json(&original.to_json().unwrap()).unwrap();

        for (_, path) in original.disambiguated_paths() {
            assert!(
                restored.find_str(&path, None, true).is_ok(),
                "'{path}' should resolve in the restored hierarchy"
            );
        }
        assert!(restored.find_str("/TestBundle/Guide", None, false).is_ok());
        // Placeholders stay unfindable after a round trip.
        assert!(matches!(
            restored.find_str("/M/A", None, true),
            Err(crate::error::ResolveError::UnfindableMatch { .. })
        ));
    }

    #[test]
    fn out_of_bounds_indices_fail_decoding() {
        let mut file = sample_hierarchy().to_file();
        file.roots.insert("Broken".to_string(), 10_000);
        let err = Hierarchy::from_file(&file).expect_err("must fail");
        assert_eq!(err.kind(), ErrorKind::DecodeFailed);
    }
}

//! Consumed symbol-graph input model.
//!
//! The loader that produces these values is an external collaborator; this
//! module only defines the shape the builder consumes, mirroring the JSON
//! emitted by symbol-graph extractors (camelCase keys, relationship kinds as
//! lowerCamel strings). Unknown relationship kinds decode as
//! [`RelationshipKind::Unknown`] and are skipped by the builder rather than
//! failing the whole graph.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

use doclink_error::{Error, ErrorKind, Result};

/// One module's symbol graph: symbols plus the relationships between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolGraph {
    pub module: Module,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl SymbolGraph {
    pub fn new(module_name: impl Into<String>) -> Self {
        SymbolGraph {
            module: Module {
                name: module_name.into(),
            },
            symbols: Vec::new(),
            relationships: Vec::new(),
        }
    }

    /// Decode a symbol graph from its JSON text.
    pub fn decode(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| {
            Error::new(ErrorKind::DecodeFailed, "invalid symbol graph")
                .with_operation("symbol_graph::decode")
                .set_source(err)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
}

/// A symbol as the graph declares it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Symbol {
    pub identifier: Identifier,
    pub kind: KindInfo,
    pub names: Names,
    pub path_components: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub declaration_fragments: Vec<DeclarationFragment>,
}

impl Symbol {
    /// Construct a symbol with the fields the builder needs. Test and tooling
    /// convenience; real graphs are decoded.
    pub fn new(
        precise: impl Into<String>,
        interface_language: impl Into<String>,
        kind_identifier: impl Into<String>,
        path_components: Vec<String>,
    ) -> Self {
        let title = path_components.last().cloned().unwrap_or_default();
        Symbol {
            identifier: Identifier {
                precise: precise.into(),
                interface_language: interface_language.into(),
            },
            kind: KindInfo {
                identifier: kind_identifier.into(),
                display_name: String::new(),
            },
            names: Names {
                title,
                navigator: None,
            },
            path_components,
            declaration_fragments: Vec::new(),
        }
    }

    /// The name this symbol goes by in the hierarchy: its last path
    /// component, falling back to the title for pathless symbols.
    pub fn name(&self) -> &str {
        self.path_components
            .last()
            .map(String::as_str)
            .unwrap_or(&self.names.title)
    }

    /// Declaration text joined from the fragments, if any were provided.
    pub fn declaration(&self) -> Option<String> {
        if self.declaration_fragments.is_empty() {
            return None;
        }
        Some(
            self.declaration_fragments
                .iter()
                .map(|fragment| fragment.spelling.as_str())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub precise: String,
    pub interface_language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KindInfo {
    pub identifier: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Names {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub navigator: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclarationFragment {
    pub spelling: String,
    #[serde(default)]
    pub kind: String,
}

/// The relationship kinds the builder understands. Everything else decodes
/// as `Unknown` and is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum RelationshipKind {
    MemberOf,
    RequirementOf,
    OptionalRequirementOf,
    DefaultImplementationOf,
    ConformsTo,
    InheritsFrom,
    Overrides,
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub source: String,
    pub target: String,
    pub kind: RelationshipKind,
}

impl Relationship {
    pub fn new(
        kind: RelationshipKind,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Relationship {
            source: source.into(),
            target: target.into(),
            kind,
        }
    }
}

/// A symbol graph paired with the file name it was loaded from. The file
/// name drives graph ordering: `Module.symbols.json` is a primary graph,
/// `Module@Other.symbols.json` extends symbols that live elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSymbolGraph {
    pub file_name: String,
    pub graph: SymbolGraph,
}

impl NamedSymbolGraph {
    pub fn new(file_name: impl Into<String>, graph: SymbolGraph) -> Self {
        NamedSymbolGraph {
            file_name: file_name.into(),
            graph,
        }
    }

    /// True for extension graphs (`Module@Other.symbols.json`), which sort
    /// after primary graphs so the primary file owns root creation.
    pub fn is_extension(&self) -> bool {
        self.file_name.contains('@')
    }
}

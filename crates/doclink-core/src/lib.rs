//! doclink-core builds the path hierarchy for a documentation bundle and
//! answers two questions about it: which page does a link refer to, and what
//! is the shortest unambiguous URL path for every symbol.

pub mod builder;
pub mod component;
pub mod disambiguation;
pub mod emitter;
pub mod error;
mod find;
pub mod hierarchy;
pub mod kind;
pub mod node;
pub mod serialization;
pub mod symbol_graph;

pub use builder::HierarchyBuilder;
pub use component::{Components, ParsedLink, PathComponent, parse_link, parse_link_with};
pub use disambiguation::{Candidate, Disambiguation, DisambiguationContainer};
pub use emitter::PathEmitOptions;
pub use error::ResolveError;
pub use hierarchy::Hierarchy;
pub use kind::{PRIMARY_LANGUAGE, stable_hash, url_readable};
pub use node::{LinkId, Node, NodeId, PageKind, SymbolRecord, reset_link_id_counter};
pub use serialization::HierarchyFile;
pub use symbol_graph::{NamedSymbolGraph, Relationship, RelationshipKind, Symbol, SymbolGraph};

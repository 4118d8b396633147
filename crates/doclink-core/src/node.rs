//! Nodes of the path hierarchy.
//!
//! Every documentation page is one `Node`: a symbol, a non-symbol page
//! (article, tutorial, technology, anchor, ...), or a placeholder bridging a
//! missing parent in a partial symbol graph. Nodes live in an arena and refer
//! to each other by `NodeId` index; ownership of a child is its entry in the
//! parent's per-name `DisambiguationContainer`, the parent link is a plain
//! back-reference.
//!
//! Findable nodes additionally carry a `LinkId`, a process-unique identifier
//! handed to callers by resolution. Clearing the `LinkId` makes a node
//! unfindable without detaching its subtree.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString, IntoStaticStr};

use crate::component::PathComponent;
use crate::disambiguation::DisambiguationContainer;
use crate::kind::{ANCHOR_KIND, LANDMARK_KIND, NON_SYMBOL_KIND, TASK_GROUP_KIND, split_language_prefix};

/// Global atomic counter for assigning unique link IDs.
/// Incremented on each registration to ensure uniqueness.
static NEXT_LINK_ID: AtomicU32 = AtomicU32::new(1);

/// Resets the global link ID counter to 1.
/// Use this only during testing when comparing freshly built hierarchies.
#[inline]
pub fn reset_link_id_counter() {
    NEXT_LINK_ID.store(1, Ordering::SeqCst);
}

/// Index of a node within its hierarchy's arena.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Process-unique identifier of a findable documentation page.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct LinkId(pub u32);

impl LinkId {
    pub(crate) fn next() -> Self {
        LinkId(NEXT_LINK_ID.fetch_add(1, Ordering::SeqCst))
    }
}

impl std::fmt::Display for LinkId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of non-symbol page a node represents.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Display, EnumString, IntoStaticStr)]
pub enum PageKind {
    Article,
    Tutorial,
    TutorialOverview,
    Technology,
    Volume,
    Chapter,
    Anchor,
    TaskGroup,
    Landmark,
    Container,
}

impl PageKind {
    /// The kind string this page uses in its parent's disambiguation
    /// container. Most pages use the non-symbol sentinel; on-page children
    /// carry a dedicated kind so they never collide with a page of the same
    /// name.
    pub fn tree_kind(self) -> &'static str {
        match self {
            PageKind::Anchor => ANCHOR_KIND,
            PageKind::TaskGroup => TASK_GROUP_KIND,
            PageKind::Landmark => LANDMARK_KIND,
            _ => NON_SYMBOL_KIND,
        }
    }
}

/// Symbol data attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolRecord {
    /// Globally unique symbol identifier (e.g. a mangled name).
    pub precise: String,
    /// Interface language identifier (`swift`, `objc`, ...).
    pub language: String,
    /// Symbol-kind identifier (`struct`, `func`, ...).
    pub kind_id: String,
    /// 5-character disambiguation hash derived from `precise`.
    pub stable_hash: String,
    /// The symbol's path components as declared in its graph.
    pub path_components: Vec<String>,
    /// Declaration text, when the graph carried declaration fragments.
    pub declaration: Option<String>,
}

impl SymbolRecord {
    /// Whether a written kind disambiguation matches this symbol. Accepts the
    /// bare kind id and a language-qualified form whose language matches the
    /// symbol's interface language.
    pub fn kind_matches(&self, written: &str) -> bool {
        if written == self.kind_id {
            return true;
        }
        match split_language_prefix(written) {
            (Some(lang), kind) => lang == self.language && kind == self.kind_id,
            (None, _) => false,
        }
    }
}

/// One documentation page in the hierarchy.
#[derive(Debug, Clone)]
pub struct Node {
    /// Display name; for symbols this is the last path component.
    pub(crate) name: String,
    /// Symbol data, absent for non-symbol pages and placeholders.
    pub(crate) symbol: Option<SymbolRecord>,
    /// Non-symbol page kind; absent for symbols and placeholders.
    pub(crate) page_kind: Option<PageKind>,
    /// Back-reference to the owning parent.
    pub(crate) parent: Option<NodeId>,
    /// Children, bagged per name by disambiguation.
    pub(crate) children: BTreeMap<String, DisambiguationContainer>,
    /// Identifier handed out by resolution; cleared to make the node
    /// unfindable while keeping its subtree traversable.
    pub(crate) identifier: Option<LinkId>,
    /// Loses collisions against favored siblings when set.
    pub(crate) disfavored_in_collision: bool,
}

impl Node {
    pub(crate) fn symbol_node(name: impl Into<String>, symbol: SymbolRecord) -> Self {
        let disfavored = symbol.precise.contains("::SYNTHESIZED::");
        Node {
            name: name.into(),
            symbol: Some(symbol),
            page_kind: None,
            parent: None,
            children: BTreeMap::new(),
            identifier: None,
            disfavored_in_collision: disfavored,
        }
    }

    pub(crate) fn page_node(name: impl Into<String>, kind: PageKind) -> Self {
        Node {
            name: name.into(),
            symbol: None,
            page_kind: Some(kind),
            parent: None,
            children: BTreeMap::new(),
            identifier: None,
            disfavored_in_collision: false,
        }
    }

    pub(crate) fn placeholder(name: impl Into<String>) -> Self {
        Node {
            name: name.into(),
            symbol: None,
            page_kind: None,
            parent: None,
            children: BTreeMap::new(),
            identifier: None,
            disfavored_in_collision: true,
        }
    }

    /// The page's display name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Symbol data, if this node is a symbol.
    #[inline]
    pub fn symbol(&self) -> Option<&SymbolRecord> {
        self.symbol.as_ref()
    }

    /// Non-symbol page kind, if this node is a registered page.
    #[inline]
    pub fn page_kind(&self) -> Option<PageKind> {
        self.page_kind
    }

    /// The owning parent, if any.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The findable identifier, if the node has not been unregistered.
    #[inline]
    pub fn identifier(&self) -> Option<LinkId> {
        self.identifier
    }

    /// Children bags keyed by child name, in deterministic name order.
    #[inline]
    pub fn children(&self) -> &BTreeMap<String, DisambiguationContainer> {
        &self.children
    }

    /// True for sparse placeholders bridging a missing parent.
    #[inline]
    pub fn is_placeholder(&self) -> bool {
        self.symbol.is_none() && self.page_kind.is_none()
    }

    /// True when this node loses collisions against favored siblings.
    #[inline]
    pub fn is_disfavored_in_collision(&self) -> bool {
        self.disfavored_in_collision
    }

    /// The kind string this node uses in disambiguation containers.
    pub fn tree_kind(&self) -> &str {
        match (&self.symbol, self.page_kind) {
            (Some(symbol), _) => &symbol.kind_id,
            (None, Some(kind)) => kind.tree_kind(),
            (None, None) => NON_SYMBOL_KIND,
        }
    }

    /// Whether a parsed component refers to this node.
    ///
    /// Symbols match on name plus any written kind/hash disambiguation;
    /// non-symbol pages match on the full segment text, since their names may
    /// contain hyphens that parse like disambiguation.
    pub fn matches(&self, component: &PathComponent) -> bool {
        if let Some(symbol) = &self.symbol {
            if component.name != self.name {
                return false;
            }
            if let Some(kind) = &component.kind {
                if !symbol.kind_matches(kind) {
                    return false;
                }
            }
            if let Some(hash) = &component.hash {
                if *hash != symbol.stable_hash {
                    return false;
                }
            }
            true
        } else {
            component.full == self.name
        }
    }

    /// Whether any child could match the component's name.
    pub fn any_child_matches(&self, component: &PathComponent) -> bool {
        self.children.contains_key(&component.name) || self.children.contains_key(&component.full)
    }
}

/// Arena of nodes; `NodeId` is an index into it.
#[derive(Debug, Default, Clone)]
pub(crate) struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub(crate) fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(u32::try_from(self.nodes.len()).expect("node arena overflow"));
        self.nodes.push(node);
        id
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(index, node)| (NodeId(index as u32), node))
    }
}

impl std::ops::Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }
}

impl std::ops::IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }
}

//! Process-wide topic identifier pool.
//!
//! A topic identifier names one documentation page: a category, a stable id
//! string (a precise symbol id or a page path), and an optional fragment.
//! Equality is on those three; the bundle and display name are carried
//! alongside for convenience but do not participate. The pool guarantees
//! that equal identifiers share one `TopicId`, so identifier comparison is a
//! single integer compare and insertion is idempotent under concurrency.

use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use parking_lot::RwLock;
use string_interner::StringInterner;
use string_interner::backend::DefaultBackend;
use string_interner::symbol::DefaultSymbol;
use strum_macros::{Display, EnumString, IntoStaticStr};

/// What category of page a topic identifier names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
pub enum TopicCategory {
    #[strum(serialize = "symbol")]
    Symbol,
    #[strum(serialize = "sparseSymbol")]
    SparseSymbol,
    #[strum(serialize = "article")]
    Article,
    #[strum(serialize = "tutorial")]
    Tutorial,
    #[strum(serialize = "tutorialTechnology")]
    TutorialTechnology,
    #[strum(serialize = "technology")]
    Technology,
    #[strum(serialize = "container")]
    Container,
    #[strum(serialize = "volume")]
    Volume,
    #[strum(serialize = "chapter")]
    Chapter,
    #[strum(serialize = "module")]
    Module,
    #[strum(serialize = "placeholder")]
    Placeholder,
    #[strum(serialize = "unresolved")]
    Unresolved,
    #[strum(serialize = "anchor-via-fragment")]
    AnchorViaFragment,
}

/// Pooled topic identifier. Equal values are pointer-equal in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TopicId(u32);

impl std::fmt::Display for TopicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct PoolKey {
    category: TopicCategory,
    id: DefaultSymbol,
    fragment: Option<DefaultSymbol>,
}

#[derive(Debug, Clone)]
struct TopicEntry {
    category: TopicCategory,
    id: String,
    fragment: Option<String>,
    bundle: Option<String>,
    display_name: Option<String>,
}

/// Interning pool for topic identifiers.
///
/// Cloning shares the same storage; the process-wide instance is reachable
/// through [`TopicPool::global`].
#[derive(Clone)]
pub struct TopicPool {
    inner: Arc<TopicPoolInner>,
}

struct TopicPoolInner {
    strings: RwLock<StringInterner<DefaultBackend>>,
    ids: DashMap<PoolKey, TopicId>,
    entries: RwLock<Vec<TopicEntry>>,
}

impl Default for TopicPool {
    fn default() -> Self {
        Self::new()
    }
}

impl TopicPool {
    pub fn new() -> Self {
        TopicPool {
            inner: Arc::new(TopicPoolInner {
                strings: RwLock::new(StringInterner::new()),
                ids: DashMap::new(),
                entries: RwLock::new(Vec::new()),
            }),
        }
    }

    /// The process-wide pool.
    pub fn global() -> &'static TopicPool {
        static POOL: OnceLock<TopicPool> = OnceLock::new();
        POOL.get_or_init(TopicPool::new)
    }

    /// Intern an identifier. The first insertion's bundle and display name
    /// stick; later calls with the same `(category, id, fragment)` return
    /// the existing `TopicId` untouched.
    pub fn intern(
        &self,
        category: TopicCategory,
        id: &str,
        fragment: Option<&str>,
        bundle: Option<&str>,
        display_name: Option<&str>,
    ) -> TopicId {
        let key = {
            let mut strings = self.inner.strings.write();
            PoolKey {
                category,
                id: strings.get_or_intern(id),
                fragment: fragment.map(|f| strings.get_or_intern(f)),
            }
        };
        if let Some(existing) = self.inner.ids.get(&key) {
            return *existing;
        }

        // The entries lock makes id assignment and entry storage atomic;
        // the dashmap entry call keeps racing inserts idempotent.
        let mut entries = self.inner.entries.write();
        *self.inner.ids.entry(key).or_insert_with(|| {
            let topic = TopicId(u32::try_from(entries.len()).expect("topic pool overflow"));
            entries.push(TopicEntry {
                category,
                id: id.to_string(),
                fragment: fragment.map(str::to_string),
                bundle: bundle.map(str::to_string),
                display_name: display_name.map(str::to_string),
            });
            topic
        })
    }

    /// Intern the placeholder identifier for a reference that failed to
    /// resolve.
    pub fn unresolved(&self, path: &str) -> TopicId {
        self.intern(TopicCategory::Unresolved, path, None, None, None)
    }

    /// The category of a pooled identifier.
    pub fn category(&self, topic: TopicId) -> TopicCategory {
        self.inner.entries.read()[topic.0 as usize].category
    }

    /// The id string of a pooled identifier, cloned out of the pool.
    pub fn id_string(&self, topic: TopicId) -> String {
        self.inner.entries.read()[topic.0 as usize].id.clone()
    }

    /// The fragment of a pooled identifier, if any.
    pub fn fragment(&self, topic: TopicId) -> Option<String> {
        self.inner.entries.read()[topic.0 as usize].fragment.clone()
    }

    /// The bundle recorded at first interning, if any.
    pub fn bundle(&self, topic: TopicId) -> Option<String> {
        self.inner.entries.read()[topic.0 as usize].bundle.clone()
    }

    /// The display name recorded at first interning, if any.
    pub fn display_name(&self, topic: TopicId) -> Option<String> {
        self.inner.entries.read()[topic.0 as usize]
            .display_name
            .clone()
    }

    /// Number of distinct identifiers in the pool.
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    /// True when nothing has been interned yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for TopicPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopicPool").field("len", &self.len()).finish()
    }
}

//! doclink-resolver answers documentation-link queries over a built path
//! hierarchy: local resolution with diagnostics and fix-its, dispatch to
//! external bundles, and fallback resolution for content that lives outside
//! the hierarchy.

pub mod diagnostics;
pub mod external;
pub mod fallback;
pub mod pool;
pub mod reference;
pub mod resolver;

pub use diagnostics::{ErrorInfo, Replacement, Solution, error_info};
pub use external::{ExternalArchive, ExternalResolver, LinkableEntity};
pub use fallback::{FallbackCache, FallbackResolver};
pub use pool::{TopicCategory, TopicId, TopicPool};
pub use reference::{ResolvedReference, UnresolvedReference};
pub use resolver::LinkResolver;

//! Identifier tables shared by the parser, the builder, and the emitter:
//! recognized symbol-kind ids, known source-language ids, hash validation,
//! and the stable per-symbol hash.

/// The interface language that wins ties when the same symbol exists in
/// several languages.
pub const PRIMARY_LANGUAGE: &str = "swift";

/// Language identifiers that may prefix a kind disambiguation (`swift.func`).
pub const KNOWN_LANGUAGES: &[&str] = &["c", "data", "objc", "occ", "swift"];

/// Sentinel kind for pages that are not symbols.
pub const NON_SYMBOL_KIND: &str = "_";

/// Sentinel hash for entries that have no stable hash.
pub const MISSING_HASH: &str = "_";

/// Kind for on-page anchor children.
pub const ANCHOR_KIND: &str = "anchor";

/// Kind for task-group children of a page.
pub const TASK_GROUP_KIND: &str = "taskGroup";

/// Kind for landmark children of a tutorial.
pub const LANDMARK_KIND: &str = "landmark";

/// Kind identifier of synthesized and real module symbols.
pub const MODULE_KIND: &str = "module";

/// Symbol-kind identifiers that are recognized as a `-kind` disambiguation
/// suffix. Sorted so membership checks can binary search.
pub const KNOWN_SYMBOL_KINDS: &[&str] = &[
    "associatedtype",
    "case",
    "class",
    "deinit",
    "dictionary",
    "enum",
    "enum.case",
    "func",
    "func.op",
    "init",
    "ivar",
    "macro",
    "method",
    "module",
    "namespace",
    "property",
    "protocol",
    "struct",
    "subscript",
    "type.method",
    "type.property",
    "type.subscript",
    "typealias",
    "union",
    "var",
];

/// Check whether `id` is a known source-language identifier.
#[inline]
pub fn is_known_language(id: &str) -> bool {
    KNOWN_LANGUAGES.binary_search(&id).is_ok()
}

/// Check whether `id` is a bare recognized symbol-kind identifier.
#[inline]
pub fn is_known_symbol_kind(id: &str) -> bool {
    KNOWN_SYMBOL_KINDS.binary_search(&id).is_ok()
}

/// Split a possibly language-qualified kind (`swift.func`) into its language
/// prefix and the bare kind. Dotted kinds like `type.method` are left intact
/// because `type` is not a language.
pub fn split_language_prefix(kind: &str) -> (Option<&str>, &str) {
    if let Some((head, rest)) = kind.split_once('.') {
        if is_known_language(head) {
            return (Some(head), rest);
        }
    }
    (None, kind)
}

/// Check whether `text` is a recognized kind suffix, with or without a
/// language qualifier.
pub fn is_recognized_kind(text: &str) -> bool {
    let (_, kind) = split_language_prefix(text);
    is_known_symbol_kind(kind)
}

/// Check whether `text` is a valid stable-hash disambiguation: one to five
/// characters from `[0-9a-z]`.
pub fn is_valid_hash(text: &str) -> bool {
    (1..=5).contains(&text.len())
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || b.is_ascii_lowercase())
}

const HASH_SPACE: u32 = 36u32.pow(5);
const BASE36_DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Derive the stable 5-character disambiguation hash for a precise symbol id.
///
/// FNV-1a over the id bytes, reduced modulo 36^5 and rendered in lowercase
/// base 36 so the result always satisfies the hash grammar. The hash only
/// depends on the id, so it is identical across runs and machines.
pub fn stable_hash(precise: &str) -> String {
    let mut state: u32 = 0x811c_9dc5;
    for byte in precise.bytes() {
        state ^= u32::from(byte);
        state = state.wrapping_mul(0x0100_0193);
    }

    let mut value = state % HASH_SPACE;
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(5);
    while value > 0 {
        digits.push(BASE36_DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).expect("base36 digits are ascii")
}

/// Replace characters that are not URL path characters with `_`.
///
/// The allowed set is the RFC 3986 `pchar` repertoire minus the path
/// separator, so names like `bar(_:)` survive unchanged.
pub fn url_readable(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || "-._~()!$&'*+,;=:@".contains(c) {
                c
            } else {
                '_'
            }
        })
        .collect()
}

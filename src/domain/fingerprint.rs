//! Stable item identity derived from the item link.
//!
//! Links are canonicalized by dropping the query string and fragment, which
//! vary between republications of the same item (tracking parameters, anchors).
//! The canonical string is hashed with 64-bit FNV-1a, so fingerprints stay
//! stable across builds and platforms.

use std::hash::Hasher;

use fnv::FnvHasher;
use url::Url;

/// Fixed-width identity of an already-delivered item.
pub type Fingerprint = u64;

/// Strip query and fragment from `link`.
///
/// A link that does not parse as an absolute URL (a relative path, or plain
/// garbage) is cut at its first `?` or `#` instead, so a single malformed
/// entry never aborts ingestion.
pub fn canonicalize(link: &str) -> String {
    match Url::parse(link) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => match link.find(['?', '#']) {
            Some(end) => link[..end].to_string(),
            None => link.to_string(),
        },
    }
}

/// FNV-1a over the UTF-8 bytes of the canonical link.
pub fn fingerprint(link: &str) -> Fingerprint {
    let mut hasher = FnvHasher::default();
    hasher.write(canonicalize(link).as_bytes());
    hasher.finish()
}

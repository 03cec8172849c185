use sha2::{Digest, Sha256};

/// Hex characters kept from the digest (96 bits).
pub const ID_LEN: usize = 24;

/// Derives the identifier a product keeps across runs.
///
/// Title case, surrounding whitespace and the URL query string never take
/// part in the identity.
pub fn stable_id(site: &str, title: &str, url: &str) -> String {
    let path = url.split('?').next().unwrap_or(url);
    let canonical = format!("{}|{}|{}", site, title.trim().to_lowercase(), path);

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(ID_LEN);
    id
}

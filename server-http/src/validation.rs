// Keys become filenames under the backing directory; the longest key must
// still fit in a filename once the ".meta" suffix is appended.
const MAX_KEY_BYTES: usize = 250;

/// Reject keys that cannot map to a single file inside the backing
/// directory. Axum decodes percent-escapes before handlers run, so a path
/// separator can arrive inside one routed segment.
pub fn validate_key(key: &str) -> Result<(), &'static str> {
    if key.is_empty() {
        return Err("key is empty");
    }
    if key.len() > MAX_KEY_BYTES {
        return Err("key is too long");
    }
    if key.contains(['/', '\\', '\0']) {
        return Err("key contains a path separator");
    }
    // Dotfiles are reserved for in-flight temp artifacts and would be
    // invisible to listing and the retention sweep.
    if key.starts_with('.') {
        return Err("key starts with a dot");
    }
    Ok(())
}

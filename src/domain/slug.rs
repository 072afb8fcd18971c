//! Title to slug derivation.
//!
//! The rule lower-cases the trimmed title and turns everything outside
//! `[a-z0-9]` into hyphens. A run of such characters becomes one hyphen, so
//! the output never contains `--` and feeding a slug back through the rule
//! returns it unchanged. Edge hyphens are kept: `"!Hello!"` becomes
//! `"-hello-"`.

/// Derive a slug from a human-readable title.
///
/// Returns an empty string for empty or whitespace-only input.
pub fn slug_transform(value: &str) -> String {
    let trimmed = value.trim();
    let mut slug = String::with_capacity(trimmed.len());

    for ch in trimmed.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug
}

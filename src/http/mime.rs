//! Content types for the image allow-list.

use std::path::Path;

/// Suffixes that may be served from the base directory, with their types.
pub const IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
];

/// Content type for `path` if its extension is on the allow-list.
///
/// Extensions are compared ignoring ASCII case.
pub fn image_content_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    IMAGE_TYPES
        .iter()
        .find(|(suffix, _)| suffix.eq_ignore_ascii_case(ext))
        .map(|(_, content_type)| *content_type)
}

//! Collection name sanitization for MongoDB compatibility.
//!
//! MongoDB restricts namespace names from containing certain characters
//! that are meaningful in its query syntax. Caller-supplied collection
//! names pass through here before reaching the driver.

/// Sanitizes collection names to satisfy MongoDB namespace restrictions.
///
/// MongoDB does not allow names to contain:
/// - Dollar signs (`$`) - used for operators in queries
/// - Null bytes (`\0`) - name terminators
///
/// Dots are also replaced: they separate database and collection in the
/// namespace, so a dotted collection name would address the wrong one.
pub(crate) struct NameSanitizer;

impl NameSanitizer {
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Replaces problematic characters with safe escaped versions.
    pub(crate) fn sanitize(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }
}

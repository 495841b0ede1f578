//! Destination naming

/// Prefix every mirrored repository receives at the destination
pub const DEST_PREFIX: &str = "export_";

/// Map a source repository name to its destination name
pub fn dest_name(source_name: &str) -> String {
    format!("{}{}", DEST_PREFIX, source_name)
}

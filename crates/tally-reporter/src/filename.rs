//! Output artifact file naming.
//!
//! Artifact names carry a microsecond epoch timestamp, the program and
//! auxiliary names, and a random token, so concurrent jobs writing into a
//! shared stats directory cannot collide.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rand::Rng;

/// Maps every character outside `[A-Za-z0-9.]` to `_`.
///
/// Composite names end up inside JSON keys, CSV fields and shell/path
/// contexts; hyphens and slashes in particular would make the composite
/// name ambiguous to split back apart.
pub fn clean_name(n: &str) -> String {
    n.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

/// Builds the sanitized composite auxiliary name from the compilation's
/// identifying parts.
pub fn aux_name(
    module_name: &str,
    input_name: &str,
    triple_name: &str,
    output_type: &str,
    opt_type: &str,
) -> String {
    let input_name = if input_name.is_empty() { "all" } else { input_name };
    // Dispose of path prefix, which might make the composite name too long.
    let input_name = Path::new(input_name)
        .file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_default();
    let opt_type = if opt_type.is_empty() { "Onone" } else { opt_type };
    let output_type = output_type.strip_prefix('.').unwrap_or(output_type);
    let opt_type = opt_type.strip_prefix('-').unwrap_or(opt_type);
    format!(
        "{}-{}-{}-{}-{}",
        clean_name(module_name),
        clean_name(&input_name),
        clean_name(triple_name),
        clean_name(output_type),
        clean_name(opt_type)
    )
}

fn make_file_name(prefix: &str, program_name: &str, aux_name: &str, suffix: &str) -> String {
    let usec = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let token: u32 = rand::rng().random();
    format!("{prefix}-{usec}-{program_name}-{aux_name}-{token}.{suffix}")
}

pub fn make_stats_file_name(program_name: &str, aux_name: &str) -> String {
    make_file_name("stats", program_name, aux_name, "json")
}

pub fn make_trace_file_name(program_name: &str, aux_name: &str) -> String {
    make_file_name("trace", program_name, aux_name, "csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_name() {
        assert_eq!(clean_name("My Module"), "My_Module");
        assert_eq!(clean_name("x86_64-ios"), "x86_64_ios");
        assert_eq!(clean_name("lib.swift"), "lib.swift");
        assert_eq!(clean_name("a/b\\c"), "a_b_c");
    }

    #[test]
    fn test_aux_name_fixture() {
        assert_eq!(
            aux_name("My Module", "/a/b/in put.swift", "x86_64-ios", ".o", "-Onone"),
            "My_Module-in_put.swift-x86_64_ios-o-Onone"
        );
    }

    #[test]
    fn test_aux_name_defaults() {
        // Empty input becomes "all"; empty optimization flag becomes Onone.
        assert_eq!(
            aux_name("m", "", "t", "o", ""),
            "m-all-t-o-Onone"
        );
    }

    #[test]
    fn test_file_name_shape() {
        let name = make_stats_file_name("prog", "aux");
        assert!(name.starts_with("stats-"));
        assert!(name.ends_with(".json"));
        let stem = name.strip_suffix(".json").unwrap();
        let parts: Vec<&str> = stem.split('-').collect();
        assert_eq!(parts.len(), 5);
        assert_eq!(parts[0], "stats");
        assert!(parts[1].parse::<u128>().is_ok(), "epoch micros: {}", parts[1]);
        assert_eq!(parts[2], "prog");
        assert_eq!(parts[3], "aux");
        assert!(parts[4].parse::<u32>().is_ok(), "random token: {}", parts[4]);
    }
}

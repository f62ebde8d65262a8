//! Tests for CLI output formatting helpers
//!
//! - Duration formatting (ms, s, m)
//! - Truncation on character boundaries
//! - Location formatting
//! - Print helpers (print_success, print_warning, print_error)

use nodex::cli::output::{
    format_duration, format_location, print_error, print_header, print_success, print_warning,
    truncate,
};
use nodex::core::graph::{Location, Path};

// =============================================================================
// format_duration tests
// =============================================================================

#[test]
fn test_format_duration_various_times() {
    assert_eq!(format_duration(0.001), "1ms");
    assert_eq!(format_duration(0.999), "999ms");
    assert_eq!(format_duration(1.0), "1.00s");
    assert_eq!(format_duration(59.5), "59.50s");
    assert_eq!(format_duration(60.0), "1m 0.0s");
    assert_eq!(format_duration(125.0), "2m 5.0s");
}

// =============================================================================
// truncate tests
// =============================================================================

#[test]
fn test_truncate_multibyte() {
    assert_eq!(truncate("exactly ten", 11), "exactly ten");
    assert_eq!(truncate("日本語のテキストです", 6), "日本語...");
    assert_eq!(truncate("abc", 2), "...");
}

// =============================================================================
// format_location tests
// =============================================================================

#[test]
fn test_format_location_with_same_name_siblings() {
    colored::control::set_override(false);
    let location = Location::with_id(Path::parse("/docs/item[2]").unwrap(), "abc");
    assert_eq!(format_location(&location), "/docs[1]/item[2] (abc)");
    colored::control::unset_override();
}

// =============================================================================
// print helper tests
// =============================================================================

#[test]
fn test_print_helpers_do_not_panic() {
    print_success("done");
    print_warning("careful");
    print_error("failed");
    print_header("Header");
}

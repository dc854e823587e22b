//! Scratch directories for tests that write data files.

/// Creates a temporary directory, removed when the returned `TempDir` is
/// dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::tempdir().expect("Failed to create temporary test directory")
}

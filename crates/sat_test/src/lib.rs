//! Golden-file tests for tsat live in `tests/harness.rs` at the workspace root.

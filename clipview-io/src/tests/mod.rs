//! Test modules for clipview-io
//!
//! Round-trip and validation tests for viewer-state persistence across the
//! element form and the slot form.

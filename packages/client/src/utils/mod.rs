//! Utility functions for the WorkFlowy client
//!
//! This module provides common text helpers used across the codebase.

mod text;

pub use text::{decode_entities, escape_xml, strip_tags};

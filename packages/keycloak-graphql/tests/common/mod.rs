// Common test utilities
#![allow(dead_code)]

pub mod fixtures;
pub mod graphql;

pub use fixtures::*;
pub use graphql::*;

/// Strings from string literals
pub fn strings(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

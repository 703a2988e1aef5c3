// Authorization domains
pub mod directives;

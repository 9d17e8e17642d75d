//! Subcommand implementations.
//!
//! Each command is a thin orchestration over `stash-client`: gather input,
//! run the crypto/token/api pipeline, print the result to stdout. Everything
//! user-visible besides the result itself goes to stderr via tracing.

pub mod destash;
pub mod enstash;
pub mod unstash;

//! Template instantiation engine.
//!
//! Turns a pristine service template into a named project: a clean copy is
//! made into the target directory, placeholder tokens are substituted, the
//! package directory is renamed, references to it are rewritten, and
//! template-only artifacts are removed.
//!
//! The pieces can be used on their own ([`discover_files`], [`substitute`],
//! [`rename_directories`], [`rewrite_references`], [`materialize`]) or driven
//! together by [`TemplateManager`].

pub mod dir;
pub mod discovery;
pub mod files;
pub mod manager;
pub mod manifest;
pub mod materialize;
pub mod placeholders;
pub mod rename;
pub mod rewrite;
pub mod substitute;
pub mod types;
pub mod validate;

pub use dir::*;
pub use discovery::*;
pub use manager::*;
pub use manifest::*;
pub use materialize::*;
pub use placeholders::*;
pub use rename::*;
pub use rewrite::*;
pub use substitute::*;
pub use types::*;
pub use validate::*;

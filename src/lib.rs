//! svcgen: compile annotated service interfaces into one transport model.
//!
//! The pipeline is `parser` → [`decl`] records → [`model::builder::build`]
//! → [`model::Transport`] → [`render`]. The build resolves `@tg` tags
//! ([`tags`]), canonicalizes types ([`types`]) and assigns wire bindings
//! ([`binding`]) in one pass; renderers only read the result.

pub mod binding;
pub mod decl;
pub mod error;
pub mod model;
pub mod parser;
pub mod render;
pub mod tags;
pub mod types;

pub use error::{BindingError, BuildError, ConfigError, ParseError};
pub use model::builder::{build, BuildOptions};
pub use model::Transport;

//! Configuration loading, relay list parsing and validation.
//!
//! Configuration can be read from JSON (with comments), TOML or YAML. The
//! relay fallback list keeps its compact comma-separated form in the file and
//! is parsed with [`parse_relay_list`] when the server state is built.

mod defaults;
mod loader;
mod relay;
mod types;
mod validate;

pub use loader::{ConfigError, load_config};
pub use relay::{RelayEntryError, RelayTarget, parse_relay_list};
pub use types::*;
pub use validate::validate_config;

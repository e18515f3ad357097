//! Configuration file loading for plenum
//!
//! File I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./plenum.toml`
//! 3. User config: `<config dir>/plenum/config.toml`
//! 4. Default values

mod file_config;
mod loader;

pub use file_config::FileConfig;
pub use loader::ConfigLoader;

//! Report renderers for extracted dependencies.
//!
//! - [`terminal`] — colored summary box and one table per changed file;
//!   respects `--quiet`.
//!
//! JSON output is a plain `serde_json` dump and lives in the binary.

pub mod terminal;

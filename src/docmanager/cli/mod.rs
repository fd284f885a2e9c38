//! # CLI Behavior
//!
//! This is **one possible UI client** for docmanager, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and output formatting.
//!
//! For the overall architecture, see the library documentation.
//!
//! ## Files and exit codes
//!
//! Every command takes one or more XML files. Files that fail to load or to
//! change are reported one per line and do not stop the others, unless
//! `--stop-on-error` is given. The process exits with the code of the first
//! failed file, or 0 when all of them went through.
//!
//! ## Output
//!
//! `--format text` (default) prints human readable lines, `json` prints the
//! structured result on stdout and moves messages to stderr, `table` prints
//! aligned columns.
//!
//! ## Module Structure
//!
//! - `commands`: Per-command handlers that call the API and format output
//! - `print`: Output formatting (reports, tables, colors, messages)
//! - `setup`: Argument parsing via clap

mod commands;
mod print;
pub mod setup;

pub use commands::run;

//! # Docmanager Architecture
//!
//! Docmanager stores small key/value properties (maintainer, status, deadline, ...)
//! inside DocBook 5 documents, in a `dm:docmanager` element under `<info>`, and
//! leaves the rest of each file exactly as the author wrote it.
//!
//! It is a library with a thin CLI on top, not the other way around.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, handles terminal I/O   │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade, one `match` over `Action`                   │
//! │  - Normalizes the file list                                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - One module per action, returns `CmdResult`               │
//! │  - Parallel batch loading (batch.rs)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Core                                                       │
//! │  - envelope.rs: header / root start tag boundary            │
//! │  - entities.rs: reversible entity encoding                  │
//! │  - document.rs + properties.rs: the property tree           │
//! │  - writer.rs: byte-faithful serialization                   │
//! │  - analyzer.rs: the query-format engine                     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Round trip
//!
//! A document is split into the raw header (XML declaration, DOCTYPE, comments)
//! and the root element. Only the root element goes through the XML parser,
//! with undeclared entities turned into inert `[[[name]]]` tokens first. On
//! write, the header is emitted verbatim, the original root start tag replaces
//! the regenerated one, and the tokens are turned back into entity references.
//! Only the property container is re-indented.
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code:
//! - Returns regular Rust types (`Result<CmdResult>`)
//! - **Never** writes to stdout/stderr
//! - **Never** calls `std::process::exit`
//! - **Never** installs a tracing subscriber
//!
//! ## Testing Strategy
//!
//! 1. **Commands** (`commands/*.rs`): the bulk of the tests, against documents
//!    written into temp dirs.
//! 2. **Core** modules: unit tests on in-memory strings.
//! 3. **API** (`api.rs`): dispatch and input normalization.
//! 4. **CLI** (`tests/`): the compiled binary driven with `assert_cmd`.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`batch`]: Loading many documents on a bounded thread pool
//! - [`document`]: A parsed document and its property container
//! - [`analyzer`]: Query-format templates, filters and sorting
//! - [`config`]: Configuration management
//! - [`error`]: Error types and exit codes
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod analyzer;
pub mod api;
pub mod batch;
pub mod commands;
pub mod config;
pub mod document;
pub mod entities;
pub mod envelope;
pub mod error;
pub mod model;
mod properties;
mod writer;

//! # compfile - Transparent Access to Compressed Files
//!
//! Open gzip, bzip2, xz/lzma and zstd files as if they were plain files. The
//! compression format is inferred from the file name, and the returned handle
//! exposes the same read, write, seek and line operations for every format.
//!
//! ## Features
//!
//! - **Name-based detection**: an ordered, extensible registry of predicates maps
//!   paths to engines (`*.gz`, `*.bz2`, `*.xz`, `*.lzma`, `*.zst`)
//! - **Plain-file conventions**: `"r"` opens in text mode, `"rb"` in binary mode
//! - **Transparent fallback**: files no predicate recognises are opened uncompressed
//! - **Async reads**: tokio-based readers for the same engines
//!
//! ## Architecture
//!
//! - [`error`] - Centralized error types and handling
//! - [`mode`] - Mode string parsing and normalization
//! - [`engine`] - Compression engines and the [`Codec`] extension trait
//! - [`registry`] - Priority-ordered engine detection
//! - [`handle`] - The [`CompFile`] façade and its openers
//! - [`config`] - Engine options and configuration files
//! - [`nonblocking`] - Async read access
//!
//! ```no_run
//! let mut out = compfile::open("report.txt.bz2", "w")?;
//! out.write("abc\ndef\n")?;
//! out.close()?;
//!
//! let mut input = compfile::open("report.txt.bz2", "r")?;
//! assert_eq!(input.readline(None)?, "abc\n");
//! # Ok::<(), compfile::CompFileError>(())
//! ```

// Core modules
pub mod error;
pub mod mode;

// Engines and detection
pub mod engine;
pub mod registry;

// Caller-facing handles
pub mod config;
pub mod handle;
pub mod nonblocking;

// Re-export commonly used types for convenience
pub use error::{CompFileError, Result};

// Public API surface for external usage
pub use config::EngineOptions;
pub use engine::{Codec, Engine, FinishWrite, HAS_LZMA, HAS_ZSTD};
pub use handle::{open, with_open, CompFile, Content, Opener};
pub use mode::{Access, OpenMode};
pub use nonblocking::{open_async, open_async_with, AsyncCompReader};
pub use registry::{
    default_registry, glob_predicate, is_compressed, register, resolve, Predicate, Registry,
    DEFAULT_PRIORITY,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Factory functions for [`CompFile`] handles.
//!
//! [`open`] covers the common case. [`Opener`] adds an explicit engine override, a
//! custom registry and engine options. When neither an explicit engine nor any
//! registered predicate matches the path, the file is opened as a plain,
//! uncompressed file.

use crate::config::EngineOptions;
use crate::engine::Engine;
use crate::error::Result;
use crate::handle::CompFile;
use crate::mode::OpenMode;
use crate::registry::{default_registry, Registry};
use std::path::Path;

/// Builder for opening handles with non-default settings
#[derive(Clone)]
pub struct Opener<'r> {
    registry: &'r Registry,
    engine: Option<Engine>,
    options: EngineOptions,
}

impl Opener<'static> {
    /// Opener backed by the process-wide registry
    pub fn new() -> Self {
        Self::with_registry(default_registry())
    }
}

impl Default for Opener<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'r> Opener<'r> {
    /// Opener resolving engines through `registry`
    pub fn with_registry(registry: &'r Registry) -> Self {
        Self {
            registry,
            engine: None,
            options: EngineOptions::default(),
        }
    }

    /// Skip resolution and always use `engine`
    pub fn engine(mut self, engine: Engine) -> Self {
        self.engine = Some(engine);
        self
    }

    /// Engine-specific options (compression levels, buffer size)
    pub fn options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// The engine a call to [`open`](Self::open) would use for `path`
    pub fn engine_for(&self, path: &Path) -> Engine {
        if let Some(engine) = &self.engine {
            return engine.clone();
        }
        self.registry.resolve(path).unwrap_or_else(|| {
            log::debug!("falling back to plain file for {}", path.display());
            Engine::plain()
        })
    }

    /// Open `path` under `mode` (text unless `b` is given)
    pub fn open(&self, path: impl AsRef<Path>, mode: &str) -> Result<CompFile> {
        let path = path.as_ref();
        let mode = OpenMode::parse(mode)?;
        self.options.validate()?;
        let engine = self.engine_for(path);
        CompFile::new(path, engine, mode, &self.options)
    }

    /// Open `path`, run `f` with the handle, then close it.
    ///
    /// The handle is closed exactly once whether `f` succeeds or fails. An error
    /// from `f` takes precedence over an error from closing.
    pub fn scoped<T, F>(&self, path: impl AsRef<Path>, mode: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut CompFile) -> Result<T>,
    {
        let mut file = self.open(path, mode)?;
        let outcome = f(&mut file);
        let closed = file.close();
        let value = outcome?;
        closed?;
        Ok(value)
    }
}

/// Open a possibly compressed file, inferring the engine from its name.
///
/// ```no_run
/// let mut file = compfile::open("access.log.gz", "r")?;
/// for line in file.iter_lines() {
///     print!("{}", line?.to_string_lossy());
/// }
/// # Ok::<(), compfile::CompFileError>(())
/// ```
pub fn open(path: impl AsRef<Path>, mode: &str) -> Result<CompFile> {
    Opener::new().open(path, mode)
}

/// Scoped form of [`open`]: the handle is closed when `f` returns
pub fn with_open<T, F>(path: impl AsRef<Path>, mode: &str, f: F) -> Result<T>
where
    F: FnOnce(&mut CompFile) -> Result<T>,
{
    Opener::new().scoped(path, mode, f)
}

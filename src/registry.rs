//! Engine auto-detection registry.
//!
//! A [`Registry`] holds an ordered chain of `(priority, predicate)` entries. A
//! predicate looks at a path (never at file contents) and either names an
//! [`Engine`] or declines. Resolution walks the chain in ascending priority and
//! returns the first engine named.
//!
//! Ties are resolved by insertion policy: by default a new entry goes after the
//! existing entries of the same priority, with `prepend` it goes before them.
//!
//! The process-wide [`default_registry`] carries the built-in predicates:
//!
//! | Pattern             | Engine | Notes                          |
//! |---------------------|--------|--------------------------------|
//! | `*.bz2`             | bzip2  | prepended                      |
//! | `*.lzma`, `*.xz`    | lzma   | only with the `lzma` feature   |
//! | `*.gz`              | gzip   |                                |
//! | `*.zst`, `*.zstd`   | zstd   | only with the `zstd` feature   |

use crate::engine::Engine;
use crate::error::{CompFileError, Result};
use globset::{Glob, GlobSetBuilder};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Priority used when the caller has no preference
pub const DEFAULT_PRIORITY: i32 = 50;

/// Function from a path to the engine that should open it, if any
pub type Predicate = Arc<dyn Fn(&Path) -> Option<Engine> + Send + Sync>;

#[derive(Clone)]
struct Entry {
    priority: i32,
    predicate: Predicate,
}

/// Ordered, append-only chain of engine predicates.
///
/// Registration and resolution may happen from different threads; the chain is
/// guarded by a read-write lock and predicates run on a snapshot, outside the lock.
#[derive(Default)]
pub struct Registry {
    entries: RwLock<Vec<Entry>>,
}

impl Registry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in predicates
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_predicate(builtin(&["*.bz2"], Engine::bzip2()), DEFAULT_PRIORITY, true);
        #[cfg(feature = "lzma")]
        registry.register_predicate(
            builtin(&["*.lzma", "*.xz"], Engine::lzma()),
            DEFAULT_PRIORITY,
            false,
        );
        registry.register_predicate(builtin(&["*.gz"], Engine::gzip()), DEFAULT_PRIORITY, false);
        #[cfg(feature = "zstd")]
        registry.register_predicate(
            builtin(&["*.zst", "*.zstd"], Engine::zstd()),
            DEFAULT_PRIORITY,
            false,
        );
        registry
    }

    /// Insert a predicate and return it.
    ///
    /// The insertion point is found by binary search over the priorities: the
    /// leftmost slot for `priority` when `prepend` is set, the rightmost otherwise.
    pub fn register_predicate(&self, predicate: Predicate, priority: i32, prepend: bool) -> Predicate {
        let mut entries = self.entries.write();
        let index = if prepend {
            entries.partition_point(|entry| entry.priority < priority)
        } else {
            entries.partition_point(|entry| entry.priority <= priority)
        };
        entries.insert(
            index,
            Entry {
                priority,
                predicate: Arc::clone(&predicate),
            },
        );
        log::debug!("registered engine predicate at priority {} (slot {})", priority, index);
        predicate
    }

    /// Register a closure as a predicate; returns the stored predicate
    pub fn register<F>(&self, predicate: F, priority: i32, prepend: bool) -> Predicate
    where
        F: Fn(&Path) -> Option<Engine> + Send + Sync + 'static,
    {
        self.register_predicate(Arc::new(predicate), priority, prepend)
    }

    /// Build a registration closure with the priority and placement fixed up front
    ///
    /// ```
    /// use compfile::{Engine, Registry};
    /// use std::sync::Arc;
    ///
    /// let registry = Registry::new();
    /// let register_early = registry.registrar(10, true);
    /// register_early(Arc::new(|_path: &std::path::Path| Some(Engine::gzip())));
    /// assert_eq!(registry.resolve("anything"), Some(Engine::gzip()));
    /// ```
    pub fn registrar(&self, priority: i32, prepend: bool) -> impl Fn(Predicate) -> Predicate + '_ {
        move |predicate| self.register_predicate(predicate, priority, prepend)
    }

    /// Register an engine for every path matching one of the glob patterns
    pub fn register_globs(
        &self,
        patterns: &[&str],
        engine: Engine,
        priority: i32,
        prepend: bool,
    ) -> Result<Predicate> {
        let predicate = glob_predicate(patterns, engine)?;
        Ok(self.register_predicate(predicate, priority, prepend))
    }

    /// Find the engine for `path`; `None` when no predicate matches
    pub fn resolve(&self, path: impl AsRef<Path>) -> Option<Engine> {
        let path = path.as_ref();
        let engine = self
            .snapshot()
            .iter()
            .find_map(|predicate| predicate(path));
        match &engine {
            Some(engine) => log::debug!("resolved {} to engine {}", path.display(), engine),
            None => log::debug!("no engine matches {}", path.display()),
        }
        engine
    }

    /// Like [`resolve`](Self::resolve), but a missing match is an error
    pub fn require(&self, path: impl AsRef<Path>) -> Result<Engine> {
        let path = path.as_ref();
        self.resolve(path).ok_or_else(|| CompFileError::EngineNotFound {
            path: path.to_path_buf(),
        })
    }

    /// Whether some predicate recognises `path` as a compressed file
    pub fn is_compressed(&self, path: impl AsRef<Path>) -> bool {
        self.resolve(path).is_some()
    }

    /// Number of registered predicates
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Priorities in evaluation order
    pub fn priorities(&self) -> Vec<i32> {
        self.entries.read().iter().map(|entry| entry.priority).collect()
    }

    fn snapshot(&self) -> Vec<Predicate> {
        self.entries
            .read()
            .iter()
            .map(|entry| Arc::clone(&entry.predicate))
            .collect()
    }
}

/// Predicate that names `engine` for paths matching any of the glob patterns.
///
/// Patterns match the whole path and `*` crosses directory separators, so
/// `*.gz` matches `logs/app.log.gz`.
pub fn glob_predicate(patterns: &[&str], engine: Engine) -> Result<Predicate> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    let set = builder.build()?;
    let predicate: Predicate = Arc::new(move |path: &Path| {
        if set.is_match(path) {
            Some(engine.clone())
        } else {
            None
        }
    });
    Ok(predicate)
}

fn builtin(patterns: &[&str], engine: Engine) -> Predicate {
    glob_predicate(patterns, engine).expect("built-in engine patterns are valid globs")
}

static DEFAULT_REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry, populated with the built-in predicates on first use
pub fn default_registry() -> &'static Registry {
    DEFAULT_REGISTRY.get_or_init(Registry::with_builtins)
}

/// Register a closure on the default registry
pub fn register<F>(predicate: F, priority: i32, prepend: bool) -> Predicate
where
    F: Fn(&Path) -> Option<Engine> + Send + Sync + 'static,
{
    default_registry().register(predicate, priority, prepend)
}

/// Resolve a path against the default registry
pub fn resolve(path: impl AsRef<Path>) -> Option<Engine> {
    default_registry().resolve(path)
}

/// Infer from the file name whether `path` is a compressed file.
///
/// ```
/// assert!(compfile::is_compressed("a.txt.bz2"));
/// assert!(compfile::is_compressed("a.txt.gz"));
/// assert!(!compfile::is_compressed("a.txt"));
/// ```
pub fn is_compressed(path: impl AsRef<Path>) -> bool {
    default_registry().is_compressed(path)
}

//! Compiled modules, one per build file name.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::compile::{CompileService, LibraryResolver, build_module};
use crate::error::KakeResult;
use crate::parser;
use crate::processor::{self, SynthesisOptions};

/// Cache of built modules keyed by file name.
///
/// A single lock guards build-if-absent, so concurrent requests for the
/// same file compile it once.
pub struct ModuleStore<M> {
    cache: Mutex<HashMap<String, Arc<M>>>,
}

impl<M> Default for ModuleStore<M> {
    fn default() -> Self {
        Self {
            cache: Mutex::new(HashMap::new()),
        }
    }
}

fn cache_key(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

impl<M> ModuleStore<M> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<Arc<M>> {
        self.cache.lock().get(&cache_key(path)).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    /// Returns the module for `path`, building it from `content` on first
    /// request. Parsing happens before the lock is taken.
    pub fn get_or_build<C, L>(
        &self,
        path: &Path,
        content: &str,
        compiler: &C,
        resolver: &L,
        options: &SynthesisOptions,
    ) -> KakeResult<Arc<M>>
    where
        C: CompileService<Module = M> + ?Sized,
        L: LibraryResolver + ?Sized,
    {
        let unit = parser::parse_str(content)?;
        let key = cache_key(path);

        let mut cache = self.cache.lock();
        if let Some(module) = cache.get(&key) {
            return Ok(Arc::clone(module));
        }

        let program = processor::synthesize(&unit, &key, options);
        let module = Arc::new(build_module(&program, compiler, resolver)?);
        cache.insert(key, Arc::clone(&module));
        Ok(module)
    }
}

//! Foreign-key style checks against the values of another sheet's column.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use tabulon_spec::Reference;

use crate::error::ErrorKind;

pub type ValueSpace = FxHashSet<String>;

/// Supplies the set of values found in a referenced column.
pub trait ValueSpaceSource: Send + Sync {
    fn load(&self, reference: &Reference) -> Result<ValueSpace, String>;
}

impl<F> ValueSpaceSource for F
where
    F: Fn(&Reference) -> Result<ValueSpace, String> + Send + Sync,
{
    fn load(&self, reference: &Reference) -> Result<ValueSpace, String> {
        self(reference)
    }
}

/// Memoized value spaces keyed by the raw reference text. Each reference is
/// loaded at most once; readers only take the read lock once it is cached.
pub struct ReferCache {
    source: Arc<dyn ValueSpaceSource>,
    spaces: RwLock<FxHashMap<String, Arc<ValueSpace>>>,
}

impl std::fmt::Debug for ReferCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReferCache")
            .field("cached", &self.spaces.read().len())
            .finish()
    }
}

impl ReferCache {
    pub fn new(source: Arc<dyn ValueSpaceSource>) -> Self {
        Self {
            source,
            spaces: RwLock::new(FxHashMap::default()),
        }
    }

    /// Values of the referenced column, loading them on first use.
    pub fn space(&self, raw: &str) -> Result<Arc<ValueSpace>, ErrorKind> {
        if let Some(space) = self.spaces.read().get(raw) {
            return Ok(space.clone());
        }

        // The write lock covers check, load and store so concurrent callers
        // never load the same reference twice.
        let mut spaces = self.spaces.write();
        if let Some(space) = spaces.get(raw) {
            return Ok(space.clone());
        }
        let reference: Reference = raw.parse().map_err(|message| ErrorKind::ReferLoad {
            reference: raw.to_string(),
            message,
        })?;
        let space = Arc::new(self.source.load(&reference).map_err(|message| {
            ErrorKind::ReferLoad {
                reference: raw.to_string(),
                message,
            }
        })?);
        #[cfg(feature = "tracing")]
        tracing::debug!(reference = raw, values = space.len(), "loaded value space");
        spaces.insert(raw.to_string(), space.clone());
        Ok(space)
    }

    pub fn contains(&self, raw: &str, value: &str) -> Result<bool, ErrorKind> {
        Ok(self.space(raw)?.contains(value))
    }

    /// Fail with `ReferNotFound` unless `value` is in the referenced column.
    pub fn check(&self, raw: &str, value: &str) -> Result<(), ErrorKind> {
        if self.contains(raw, value)? {
            Ok(())
        } else {
            Err(ErrorKind::ReferNotFound {
                reference: raw.to_string(),
                value: value.to_string(),
            })
        }
    }

    pub fn len(&self) -> usize {
        self.spaces.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

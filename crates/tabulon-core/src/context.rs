use std::sync::Arc;

use crate::codec::Locale;
use crate::error::ErrorKind;
use crate::refer::ReferCache;

/// Shared inputs of a build, passed explicitly instead of living in globals.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    pub locale: Locale,
    /// Value-space cache for `refer` props. Without one, refer checks are
    /// skipped.
    pub refer: Option<Arc<ReferCache>>,
}

impl BuildContext {
    pub fn new(locale: Locale) -> Self {
        Self {
            locale,
            refer: None,
        }
    }

    pub fn with_refer(mut self, cache: Arc<ReferCache>) -> Self {
        self.refer = Some(cache);
        self
    }

    pub(crate) fn check_refer(&self, reference: &str, value: &str) -> Result<(), ErrorKind> {
        match &self.refer {
            Some(cache) => cache.check(reference, value),
            None => Ok(()),
        }
    }
}

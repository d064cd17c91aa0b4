//! Validation limits for incoming page requests.
//!
//! Callers accepting page requests from untrusted input (query strings,
//! RPC payloads) validate them against these caps before handing them to a
//! repository.

use crate::{Error, PageRequest};

/// Caps applied to externally supplied [`PageRequest`] values.
#[derive(Debug, Clone)]
pub struct PageLimits {
    /// Maximum page size (default: 1000).
    pub max_size: u64,
    /// Maximum number of sort keys (default: 5).
    pub max_sort_keys: usize,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            max_size: 1000,
            max_sort_keys: 5,
        }
    }
}

impl PageLimits {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_max_sort_keys(mut self, max: usize) -> Self {
        self.max_sort_keys = max;
        self
    }

    /// Validate a page request against the caps.
    ///
    /// # Errors
    /// Returns `Error::PageSizeExceeded` or `Error::TooManySortKeys` when the
    /// request exceeds the corresponding cap.
    pub fn validate(&self, request: &PageRequest) -> Result<(), Error> {
        if request.size() > self.max_size {
            return Err(Error::PageSizeExceeded {
                size: request.size(),
                max: self.max_size,
            });
        }
        let count = request.sort().keys().len();
        if count > self.max_sort_keys {
            return Err(Error::TooManySortKeys {
                count,
                max: self.max_sort_keys,
            });
        }
        Ok(())
    }
}

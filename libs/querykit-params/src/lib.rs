#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Query-parameter vocabulary: sorting and paging primitives plus the
//! per-invocation [`ParameterAccessor`] that splits a positional argument
//! list into paging, sorting, and bindable values.
//!
//! The crate is pure data — no I/O, no async, no global state. Argument
//! classification is driven entirely by a [`Parameters`] shape computed
//! upstream (from method signatures, route metadata, etc.); the accessor
//! never inspects value types beyond the roles the shape declares.

pub mod accessor;
pub mod limits;
pub mod page;
pub mod params;

pub use accessor::{any_value, AnyValue, BindableValues, ParameterAccessor};
pub use limits::PageLimits;
pub use page::{Page, PageInfo, PageRequest};
pub use params::{Parameter, ParameterRole, Parameters};

/// Sort direction for a single key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    /// Reverse the sort direction (Asc <-> Desc).
    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            SortDir::Asc => SortDir::Desc,
            SortDir::Desc => SortDir::Asc,
        }
    }
}

/// One field of a sort order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SortKey {
    pub field: String,
    pub dir: SortDir,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            dir: SortDir::Desc,
        }
    }
}

/// Ordered list of sort keys. Empty means "unsorted".
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[must_use]
pub struct Sort(pub Vec<SortKey>);

impl Sort {
    pub fn empty() -> Self {
        Self(vec![])
    }

    /// Single ascending key.
    pub fn asc(field: impl Into<String>) -> Self {
        Self(vec![SortKey::asc(field)])
    }

    /// Single descending key.
    pub fn desc(field: impl Into<String>) -> Self {
        Self(vec![SortKey::desc(field)])
    }

    /// Append a key.
    pub fn and(mut self, key: SortKey) -> Self {
        self.0.push(key);
        self
    }

    #[must_use]
    pub fn keys(&self) -> &[SortKey] {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Render as "+f1,-f2".
    #[must_use]
    pub fn to_signed_tokens(&self) -> String {
        self.0
            .iter()
            .map(|k| {
                if matches!(k.dir, SortDir::Asc) {
                    format!("+{}", k.field)
                } else {
                    format!("-{}", k.field)
                }
            })
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Parse signed tokens (e.g. "+name,-age") back into a `Sort`. A missing
    /// sign defaults to '+'.
    ///
    /// # Errors
    /// Returns `Error::InvalidSortField` if the input is empty or a token has
    /// no field name.
    pub fn from_signed_tokens(signed: &str) -> Result<Self, Error> {
        let mut out = Vec::new();
        for seg in signed.split(',') {
            let seg = seg.trim();
            if seg.is_empty() {
                continue;
            }
            let (dir, name) = match seg.as_bytes()[0] {
                b'+' => (SortDir::Asc, &seg[1..]),
                b'-' => (SortDir::Desc, &seg[1..]),
                _ => (SortDir::Asc, seg),
            };
            if name.is_empty() {
                return Err(Error::InvalidSortField(seg.to_owned()));
            }
            out.push(SortKey {
                field: name.to_owned(),
                dir,
            });
        }
        if out.is_empty() {
            return Err(Error::InvalidSortField("empty sort".into()));
        }
        Ok(Sort(out))
    }

    /// Append a tiebreaker key if no key references the field yet.
    pub fn ensure_tiebreaker(mut self, field: &str, dir: SortDir) -> Self {
        if !self.0.iter().any(|k| k.field == field) {
            self.0.push(SortKey {
                field: field.to_owned(),
                dir,
            });
        }
        self
    }

    /// Reverse every key's direction (for backward traversal).
    pub fn reverse_directions(mut self) -> Self {
        for key in &mut self.0 {
            key.dir = key.dir.reverse();
        }
        self
    }
}

impl std::fmt::Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return write!(f, "(unsorted)");
        }

        let formatted: Vec<String> = self
            .0
            .iter()
            .map(|key| {
                let dir_str = match key.dir {
                    SortDir::Asc => "asc",
                    SortDir::Desc => "desc",
                };
                format!("{} {}", key.field, dir_str)
            })
            .collect();

        write!(f, "{}", formatted.join(", "))
    }
}

/// Unified error type for parameter-shape and paging operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unsupported sort field: {0}")]
    InvalidSortField(String),

    #[error("page size {size} exceeds maximum {max}")]
    PageSizeExceeded { size: u64, max: u64 },

    #[error("{count} sort keys exceed maximum {max}")]
    TooManySortKeys { count: usize, max: usize },

    #[error("shape declares {expected} parameters but {actual} values were given")]
    ParameterCountMismatch { expected: usize, actual: usize },

    #[error("parameter at position {position} is not a {expected}")]
    TypeMismatch {
        position: usize,
        expected: &'static str,
    },

    #[error("shape declares more than one pageable parameter")]
    DuplicatePageable,

    #[error("shape declares more than one sort parameter")]
    DuplicateSort,

    #[error("bindable index {0} is out of bounds")]
    BindableIndexOutOfBounds(usize),
}

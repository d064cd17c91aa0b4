//! Repository contracts and type-erased registration handles.
//!
//! Repositories are implemented by the storage layer; this crate only
//! consumes the find-by-id capability. [`RepositoryRegistration`] erases a
//! typed repository behind a handle the resolver can invoke with converted
//! identifiers, and [`RepositorySource`] is the discovery seam: a snapshot
//! enumeration of everything the host environment has to offer.

use std::marker::PhantomData;
use std::sync::Arc;

use querykit_params::{any_value, AnyValue, Page, PageRequest};

use crate::entity::{DomainEntity, EntityDescriptor};
use crate::value::TypeKey;

/// Find-by-id capability over one entity type.
pub trait Repository<E: DomainEntity>: Send + Sync {
    /// Look up an entity by identifier. A missing entity is `Ok(None)`,
    /// never an error.
    ///
    /// # Errors
    /// Storage failures only; they propagate to the caller unchanged.
    fn find_by_id(&self, id: &E::Id) -> anyhow::Result<Option<E>>;
}

/// Windowed listing on top of [`Repository`].
pub trait PagingRepository<E: DomainEntity>: Repository<E> {
    /// Fetch one page of entities honoring the request's sort order.
    ///
    /// # Errors
    /// Storage failures only.
    fn find_page(&self, request: &PageRequest) -> anyhow::Result<Page<E>>;
}

/// Object-safe view of a repository operating on erased values.
pub(crate) trait ErasedRepository: Send + Sync {
    fn find_by_id(&self, id: &AnyValue) -> anyhow::Result<Option<AnyValue>>;
}

struct ErasedFindById<E, R> {
    repository: Arc<R>,
    _entity: PhantomData<fn() -> E>,
}

impl<E, R> ErasedRepository for ErasedFindById<E, R>
where
    E: DomainEntity,
    R: Repository<E> + 'static,
{
    fn find_by_id(&self, id: &AnyValue) -> anyhow::Result<Option<AnyValue>> {
        let typed = id.downcast_ref::<E::Id>().ok_or_else(|| {
            anyhow::anyhow!(
                "identifier for {} is not a {}",
                TypeKey::of::<E>(),
                TypeKey::of::<E::Id>()
            )
        })?;
        Ok(self.repository.find_by_id(typed)?.map(any_value))
    }
}

/// An entity descriptor paired with an erased repository handle.
#[derive(Clone)]
pub struct RepositoryRegistration {
    descriptor: EntityDescriptor,
    handle: Arc<dyn ErasedRepository>,
}

impl RepositoryRegistration {
    /// Erase a typed repository for registration.
    pub fn new<E, R>(repository: Arc<R>) -> Self
    where
        E: DomainEntity,
        R: Repository<E> + 'static,
    {
        Self {
            descriptor: EntityDescriptor::of::<E>(),
            handle: Arc::new(ErasedFindById {
                repository,
                _entity: PhantomData,
            }),
        }
    }

    #[must_use]
    pub fn descriptor(&self) -> EntityDescriptor {
        self.descriptor
    }

    pub(crate) fn handle(&self) -> &Arc<dyn ErasedRepository> {
        &self.handle
    }
}

/// Discovery seam: everything the host environment has registered, as a
/// snapshot (not a live feed).
pub trait RepositorySource: Send + Sync {
    fn repositories(&self) -> Vec<RepositoryRegistration>;
}

/// Explicit, caller-assembled [`RepositorySource`].
#[derive(Clone, Default)]
pub struct RepositorySet {
    entries: Vec<RepositoryRegistration>,
}

impl RepositorySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed repository, builder style.
    #[must_use]
    pub fn with<E, R>(mut self, repository: Arc<R>) -> Self
    where
        E: DomainEntity,
        R: Repository<E> + 'static,
    {
        self.entries.push(RepositoryRegistration::new::<E, R>(repository));
        self
    }

    pub fn add(&mut self, registration: RepositoryRegistration) {
        self.entries.push(registration);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RepositorySource for RepositorySet {
    fn repositories(&self) -> Vec<RepositoryRegistration> {
        self.entries.clone()
    }
}

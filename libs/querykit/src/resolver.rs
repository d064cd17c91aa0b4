//! Domain resolver: registry-backed conditional conversion into domain
//! entities.
//!
//! The resolver owns a map from domain type to repository registration,
//! populated once during [`DomainResolver::initialize`] and read-only
//! afterwards. Resolution converts an arbitrary source value into the
//! registered identifier type via the [`ConversionService`], then asks the
//! repository for the entity. The resolver also registers itself as a
//! conversion rule, so plain `source -> domain type` requests against the
//! service route through it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use querykit_params::{any_value, AnyValue};

use crate::convert::{ConversionService, ConvertError, Converter};
use crate::entity::{DomainEntity, EntityDescriptor};
use crate::repository::{RepositoryRegistration, RepositorySource};
use crate::value::TypeKey;

/// Resolution failure.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No repository manages the requested domain type. Callers are expected
    /// to gate with [`DomainResolver::can_convert`] first, so hitting this is
    /// a caller precondition bug rather than a recoverable condition.
    #[error("no repository registered for domain type {0}")]
    UnresolvedDomainType(TypeKey),

    /// The conversion service could not produce the identifier.
    #[error(transparent)]
    Conversion(#[from] ConvertError),

    /// The repository lookup itself failed.
    #[error("repository lookup for {domain} failed")]
    Repository {
        domain: TypeKey,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A resolved entity did not have the statically requested type.
    #[error("resolved entity for {domain} is not of the requested type")]
    EntityTypeMismatch { domain: TypeKey },
}

/// Registry-backed entity resolver.
pub struct DomainResolver {
    registry: RwLock<HashMap<TypeKey, RepositoryRegistration>>,
    conversion: Arc<ConversionService>,
    initialized: AtomicBool,
}

impl DomainResolver {
    #[must_use]
    pub fn new(conversion: Arc<ConversionService>) -> Self {
        Self {
            registry: RwLock::new(HashMap::new()),
            conversion,
            initialized: AtomicBool::new(false),
        }
    }

    /// One-time wiring: drain the discovery snapshot into the registry, then
    /// register the resolver as a conversion rule with the service.
    ///
    /// Subsequent calls log a warning and do nothing.
    pub fn initialize(self: &Arc<Self>, source: &dyn RepositorySource) {
        if self.initialized.swap(true, Ordering::SeqCst) {
            tracing::warn!("domain resolver already initialized, ignoring");
            return;
        }

        let registrations = source.repositories();
        tracing::debug!(count = registrations.len(), "initializing domain resolver");
        for registration in registrations {
            self.register_repository(registration);
        }
        self.conversion.add_converter(self.clone());
    }

    /// Register one repository, keyed by its domain type. Re-registering a
    /// domain type replaces the handle; `Arc`s held by callers stay valid.
    pub fn register_repository(&self, registration: RepositoryRegistration) {
        let descriptor = registration.descriptor();
        tracing::debug!(
            domain = %descriptor.domain_type(),
            id = %descriptor.id_type(),
            "registering repository"
        );
        self.registry
            .write()
            .insert(descriptor.domain_type(), registration);
    }

    /// Descriptor of the registration managing exactly this domain type, if
    /// any. Not subtype-aware.
    #[must_use]
    pub fn registration_for(&self, domain_type: &TypeKey) -> Option<EntityDescriptor> {
        self.registry
            .read()
            .get(domain_type)
            .map(RepositoryRegistration::descriptor)
    }

    /// Whether a `source -> domain_type` resolution can work right now:
    /// the domain type must be registered and the service must be able to
    /// convert the source into the registered identifier type.
    #[must_use]
    pub fn can_convert(&self, source: &TypeKey, domain_type: &TypeKey) -> bool {
        match self.registration_for(domain_type) {
            None => false,
            Some(descriptor) => self.conversion.can_convert(source, &descriptor.id_type()),
        }
    }

    /// Resolve a domain entity from an erased source value.
    ///
    /// `Ok(None)` means the identifier converted cleanly but no entity
    /// exists for it.
    ///
    /// # Errors
    /// [`ResolveError::UnresolvedDomainType`] for unregistered domain types,
    /// [`ResolveError::Conversion`] when the identifier conversion fails,
    /// [`ResolveError::Repository`] when the lookup fails.
    pub fn convert(
        &self,
        value: &AnyValue,
        source: &TypeKey,
        domain_type: &TypeKey,
    ) -> Result<Option<AnyValue>, ResolveError> {
        let registration = self
            .registry
            .read()
            .get(domain_type)
            .cloned()
            .ok_or(ResolveError::UnresolvedDomainType(*domain_type))?;

        let id = self
            .conversion
            .convert(value, source, &registration.descriptor().id_type())?;

        tracing::trace!(domain = %domain_type, "looking up entity by converted identifier");
        registration
            .handle()
            .find_by_id(&id)
            .map_err(|e| ResolveError::Repository {
                domain: *domain_type,
                source: e.into(),
            })
    }

    /// Typed resolution sugar over [`DomainResolver::convert`].
    ///
    /// # Errors
    /// As [`DomainResolver::convert`], plus
    /// [`ResolveError::EntityTypeMismatch`] when the resolved entity is not
    /// an `E`.
    pub fn resolve<S, E>(&self, source: S) -> Result<Option<Arc<E>>, ResolveError>
    where
        S: Send + Sync + 'static,
        E: DomainEntity,
    {
        let value = any_value(source);
        match self.convert(&value, &TypeKey::of::<S>(), &TypeKey::of::<E>())? {
            None => Ok(None),
            Some(entity) => entity
                .downcast::<E>()
                .map(Some)
                .map_err(|_| ResolveError::EntityTypeMismatch {
                    domain: TypeKey::of::<E>(),
                }),
        }
    }

    /// Number of registered repositories.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registry.read().is_empty()
    }
}

impl Converter for DomainResolver {
    fn can_convert(&self, source: &TypeKey, target: &TypeKey) -> bool {
        DomainResolver::can_convert(self, source, target)
    }

    fn convert(
        &self,
        value: &AnyValue,
        source: &TypeKey,
        target: &TypeKey,
    ) -> Result<AnyValue, ConvertError> {
        match DomainResolver::convert(self, value, source, target) {
            Ok(Some(entity)) => Ok(entity),
            // A generic conversion has no absent channel; callers that need
            // the found/not-found distinction use the resolver directly.
            Ok(None) => Err(ConvertError::failed(
                *target,
                "no entity exists for the converted identifier",
            )),
            Err(ResolveError::Conversion(err)) => Err(err),
            Err(other) => Err(ConvertError::failed(*target, other.to_string())),
        }
    }
}

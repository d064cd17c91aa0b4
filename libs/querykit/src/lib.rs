#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Entity resolution over runtime-discovered repositories.
//!
//! The crate wires three pieces together:
//!
//! - a [`ConversionService`]: an explicit, ordered table of conversion
//!   rules, each with a per-call applicability predicate;
//! - repository contracts ([`Repository`], [`PagingRepository`]) plus the
//!   type-erased registration/discovery seam ([`RepositoryRegistration`],
//!   [`RepositorySource`]);
//! - the [`DomainResolver`]: a registry from domain type to repository that
//!   resolves entities from arbitrary source values by converting them into
//!   the registered identifier type first.
//!
//! Typical wiring, once at startup:
//!
//! ```
//! use std::sync::Arc;
//! use querykit::{ConversionService, DomainResolver, DomainEntity, Repository, RepositorySet};
//!
//! #[derive(Clone)]
//! struct User { id: u64 }
//! impl DomainEntity for User { type Id = u64; }
//!
//! struct Users;
//! impl Repository<User> for Users {
//!     fn find_by_id(&self, id: &u64) -> anyhow::Result<Option<User>> {
//!         Ok(Some(User { id: *id }))
//!     }
//! }
//!
//! let service = Arc::new(ConversionService::with_defaults());
//! let resolver = Arc::new(DomainResolver::new(service.clone()));
//! resolver.initialize(&RepositorySet::new().with::<User, _>(Arc::new(Users)));
//!
//! let user = resolver.resolve::<u64, User>(7).unwrap().unwrap();
//! assert_eq!(user.id, 7);
//! ```
//!
//! Everything is synchronous and non-blocking; after initialization the
//! registry and rule table are read-only, so resolution may run freely from
//! multiple threads.

pub mod convert;
pub mod entity;
pub mod repository;
pub mod resolver;
pub mod value;

pub use convert::{ConversionService, ConvertError, Converter};
pub use entity::{DomainEntity, EntityDescriptor};
pub use repository::{
    PagingRepository, Repository, RepositoryRegistration, RepositorySet, RepositorySource,
};
pub use resolver::{DomainResolver, ResolveError};
pub use value::TypeKey;

// Re-export the parameter vocabulary so consumers need a single dependency.
pub use querykit_params as params;
pub use querykit_params::{any_value, AnyValue};

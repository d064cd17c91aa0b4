//! Explicit conversion-rule registry.
//!
//! A [`ConversionService`] holds an ordered table of [`Converter`] rules.
//! Each rule declares its applicability per call through a predicate, so
//! rules whose applicability depends on runtime state (such as the domain
//! resolver's repository registry) fit the same table as fixed-pair rules.
//!
//! Rules are consulted in registration order; the first applicable rule
//! performs the conversion. Failures propagate unchanged.

use std::sync::Arc;

use parking_lot::RwLock;
use querykit_params::AnyValue;

use crate::value::TypeKey;

/// Conversion failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConvertError {
    #[error("no converter registered for {src} -> {target}")]
    NoConverter { src: TypeKey, target: TypeKey },

    #[error("value for {src} -> {target} conversion is not a {src}")]
    ValueTypeMismatch { src: TypeKey, target: TypeKey },

    #[error("conversion to {target} failed: {message}")]
    Failed { target: TypeKey, message: String },
}

impl ConvertError {
    /// Rule-level failure with a caller-supplied message.
    pub fn failed(target: TypeKey, message: impl Into<String>) -> Self {
        Self::Failed {
            target,
            message: message.into(),
        }
    }
}

/// One conversion rule.
///
/// `can_convert` is evaluated per call; a rule may answer differently as
/// the state backing it changes.
pub trait Converter: Send + Sync {
    fn can_convert(&self, source: &TypeKey, target: &TypeKey) -> bool;

    /// Convert `value` (of runtime type `source`) into a `target` value.
    ///
    /// # Errors
    /// Implementations return [`ConvertError::ValueTypeMismatch`] when the
    /// value is not of the declared source type and [`ConvertError::Failed`]
    /// when the conversion itself fails.
    fn convert(
        &self,
        value: &AnyValue,
        source: &TypeKey,
        target: &TypeKey,
    ) -> Result<AnyValue, ConvertError>;
}

/// Fixed-pair rule wrapping a typed closure.
struct FnConverter {
    source: TypeKey,
    target: TypeKey,
    apply: Box<dyn Fn(&AnyValue) -> Result<AnyValue, ConvertError> + Send + Sync>,
}

impl Converter for FnConverter {
    fn can_convert(&self, source: &TypeKey, target: &TypeKey) -> bool {
        *source == self.source && *target == self.target
    }

    fn convert(
        &self,
        value: &AnyValue,
        _source: &TypeKey,
        _target: &TypeKey,
    ) -> Result<AnyValue, ConvertError> {
        (self.apply)(value)
    }
}

/// Same-type rule: clones the shared value.
struct Identity;

impl Converter for Identity {
    fn can_convert(&self, source: &TypeKey, target: &TypeKey) -> bool {
        source == target
    }

    fn convert(
        &self,
        value: &AnyValue,
        _source: &TypeKey,
        _target: &TypeKey,
    ) -> Result<AnyValue, ConvertError> {
        Ok(value.clone())
    }
}

/// Ordered registry of conversion rules.
///
/// Registration happens during wiring; afterwards the table is read-only
/// and lookups may run concurrently. Rule bodies run outside the table
/// lock, so a rule may itself consult the service.
pub struct ConversionService {
    converters: RwLock<Vec<Arc<dyn Converter>>>,
}

impl ConversionService {
    /// Empty registry: every conversion request fails until rules are added.
    #[must_use]
    pub fn new() -> Self {
        Self {
            converters: RwLock::new(Vec::new()),
        }
    }

    /// Registry seeded with the identity rule (same type -> same type).
    #[must_use]
    pub fn with_defaults() -> Self {
        let service = Self::new();
        service.add_converter(Arc::new(Identity));
        service
    }

    /// Append a rule. Later lookups consult it after all earlier rules.
    pub fn add_converter(&self, converter: Arc<dyn Converter>) {
        self.converters.write().push(converter);
    }

    /// Register a typed `S -> T` rule from a closure.
    pub fn register<S, T, F>(&self, convert: F)
    where
        S: Send + Sync + 'static,
        T: Send + Sync + 'static,
        F: Fn(&S) -> Result<T, ConvertError> + Send + Sync + 'static,
    {
        let source = TypeKey::of::<S>();
        let target = TypeKey::of::<T>();
        tracing::debug!(%source, %target, "registering typed converter");
        let apply = Box::new(move |value: &AnyValue| {
            let typed = value
                .downcast_ref::<S>()
                .ok_or(ConvertError::ValueTypeMismatch { src: source, target })?;
            convert(typed).map(|out| Arc::new(out) as AnyValue)
        });
        self.add_converter(Arc::new(FnConverter {
            source,
            target,
            apply,
        }));
    }

    /// Whether any registered rule currently applies to the pair.
    #[must_use]
    pub fn can_convert(&self, source: &TypeKey, target: &TypeKey) -> bool {
        self.rules()
            .iter()
            .any(|rule| rule.can_convert(source, target))
    }

    /// Convert with the first applicable rule, in registration order.
    ///
    /// # Errors
    /// Returns [`ConvertError::NoConverter`] when no rule applies; rule
    /// failures propagate unchanged.
    pub fn convert(
        &self,
        value: &AnyValue,
        source: &TypeKey,
        target: &TypeKey,
    ) -> Result<AnyValue, ConvertError> {
        for rule in self.rules() {
            if rule.can_convert(source, target) {
                return rule.convert(value, source, target);
            }
        }
        Err(ConvertError::NoConverter {
            src: *source,
            target: *target,
        })
    }

    /// Snapshot of the table; rule bodies never run under the lock.
    fn rules(&self) -> Vec<Arc<dyn Converter>> {
        self.converters.read().clone()
    }
}

impl Default for ConversionService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use querykit_params::any_value;

    fn parse_u64(service: &ConversionService) {
        service.register(|raw: &String| {
            raw.parse::<u64>()
                .map_err(|e| ConvertError::failed(TypeKey::of::<u64>(), e.to_string()))
        });
    }

    #[test]
    fn empty_service_converts_nothing() {
        let service = ConversionService::new();
        assert!(!service.can_convert(&TypeKey::of::<String>(), &TypeKey::of::<String>()));
        let result = service.convert(
            &any_value("x".to_owned()),
            &TypeKey::of::<String>(),
            &TypeKey::of::<String>(),
        );
        assert!(matches!(result, Err(ConvertError::NoConverter { .. })));
    }

    #[test]
    fn identity_round_trips_by_arc_identity() {
        let service = ConversionService::with_defaults();
        let value = any_value("hello".to_owned());
        let out = service
            .convert(&value, &TypeKey::of::<String>(), &TypeKey::of::<String>())
            .unwrap();
        assert!(Arc::ptr_eq(&value, &out));
    }

    #[test]
    fn typed_rule_converts_and_reports_failures() {
        let service = ConversionService::new();
        parse_u64(&service);

        assert!(service.can_convert(&TypeKey::of::<String>(), &TypeKey::of::<u64>()));
        assert!(!service.can_convert(&TypeKey::of::<u64>(), &TypeKey::of::<String>()));

        let out = service
            .convert(
                &any_value("42".to_owned()),
                &TypeKey::of::<String>(),
                &TypeKey::of::<u64>(),
            )
            .unwrap();
        assert_eq!(out.downcast_ref::<u64>(), Some(&42));

        let err = service
            .convert(
                &any_value("not a number".to_owned()),
                &TypeKey::of::<String>(),
                &TypeKey::of::<u64>(),
            )
            .unwrap_err();
        assert!(matches!(err, ConvertError::Failed { .. }));
    }

    #[test]
    fn mismatched_value_type_is_reported() {
        let service = ConversionService::new();
        parse_u64(&service);

        // Declared source String, actual value u64.
        let err = service
            .convert(
                &any_value(7u64),
                &TypeKey::of::<String>(),
                &TypeKey::of::<u64>(),
            )
            .unwrap_err();
        assert!(matches!(err, ConvertError::ValueTypeMismatch { .. }));
    }

    #[test]
    fn first_registered_rule_wins() {
        let service = ConversionService::new();
        service.register(|_: &String| Ok(1u64));
        service.register(|_: &String| Ok(2u64));

        let out = service
            .convert(
                &any_value("anything".to_owned()),
                &TypeKey::of::<String>(),
                &TypeKey::of::<u64>(),
            )
            .unwrap();
        assert_eq!(out.downcast_ref::<u64>(), Some(&1));
    }

    #[test]
    fn rules_may_reenter_the_service() {
        struct Chained(Arc<ConversionService>);

        impl Converter for Chained {
            fn can_convert(&self, source: &TypeKey, target: &TypeKey) -> bool {
                *source == TypeKey::of::<String>() && *target == TypeKey::of::<i64>()
            }

            fn convert(
                &self,
                value: &AnyValue,
                source: &TypeKey,
                _target: &TypeKey,
            ) -> Result<AnyValue, ConvertError> {
                // String -> u64 via the service, then u64 -> i64 locally.
                let intermediate = self.0.convert(value, source, &TypeKey::of::<u64>())?;
                let narrow = intermediate
                    .downcast_ref::<u64>()
                    .copied()
                    .ok_or(ConvertError::ValueTypeMismatch {
                        src: *source,
                        target: TypeKey::of::<u64>(),
                    })?;
                Ok(Arc::new(narrow as i64) as AnyValue)
            }
        }

        let service = Arc::new(ConversionService::new());
        parse_u64(&service);
        service.add_converter(Arc::new(Chained(service.clone())));

        let out = service
            .convert(
                &any_value("9".to_owned()),
                &TypeKey::of::<String>(),
                &TypeKey::of::<i64>(),
            )
            .unwrap();
        assert_eq!(out.downcast_ref::<i64>(), Some(&9));
    }
}

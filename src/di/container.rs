use crate::error::{RestErrorHandleError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Type-keyed service registry shared by the modules of an application.
///
/// Every entry is stored as an `Arc<T>` under `TypeId::of::<T>()`, so trait
/// objects register exactly like concrete types:
///
/// ```
/// use rest_error_handle::di::Container;
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// let mut container = Container::new();
/// container.provide::<dyn Clock>(Arc::new(SystemClock));
/// assert!(container.resolve::<dyn Clock>().is_ok());
/// ```
#[derive(Clone, Default)]
pub struct Container {
    services: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a concrete instance.
    pub fn register<T: Send + Sync + 'static>(&mut self, instance: T) -> &mut Self {
        self.provide(Arc::new(instance))
    }

    /// Register a shared instance, replacing any previous one of the same type.
    pub fn provide<T: ?Sized + Send + Sync + 'static>(&mut self, instance: Arc<T>) -> &mut Self {
        self.services.insert(TypeId::of::<T>(), Arc::new(instance));
        self
    }

    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<T>> {
        let entry = self
            .services
            .get(&TypeId::of::<T>())
            .ok_or_else(RestErrorHandleError::dependency_not_found::<T>)?;

        entry
            .value()
            .downcast_ref::<Arc<T>>()
            .cloned()
            .ok_or_else(RestErrorHandleError::dependency_not_found::<T>)
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestService {
        value: i32,
    }

    trait MyTrait: Send + Sync {
        fn get_value(&self) -> i32;
    }

    struct MyTraitImpl {
        value: i32,
    }

    impl MyTrait for MyTraitImpl {
        fn get_value(&self) -> i32 {
            self.value
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut container = Container::new();
        container.register(TestService { value: 42 });
        let service = container.resolve::<TestService>().unwrap();
        assert_eq!(service.value, 42);
    }

    #[test]
    fn test_provide_and_resolve_trait() {
        let mut container = Container::new();
        container.provide::<dyn MyTrait>(Arc::new(MyTraitImpl { value: 99 }));
        let trait_instance = container.resolve::<dyn MyTrait>().unwrap();
        assert_eq!(trait_instance.get_value(), 99);
        assert!(container.contains::<dyn MyTrait>());
        assert!(!container.contains::<MyTraitImpl>());
    }

    #[test]
    fn test_missing_dependency() {
        let container = Container::new();
        let err = container.resolve::<dyn MyTrait>().err().unwrap();
        assert!(
            matches!(err, RestErrorHandleError::DependencyNotFound { ref type_name } if type_name.contains("MyTrait"))
        );
        assert!(container.is_empty());
    }
}

//! Component-storage collaborator interface.
//!
//! The reflection core never implements entity or component storage. It only
//! needs to ask a live object for its attached components and to create or
//! clear components by type name; [`ComponentHost`] is that contract. The
//! engine-side arena (generational-index pool, scene graph, whatever) lives
//! behind it.
//!
//! [`MemoryHost`] is a minimal factory-backed host for tests and examples.

use std::any::Any;
use std::collections::HashMap;

use crate::error::ArchetypeError;

/// A live object whose components can be enumerated and edited by type name.
pub trait ComponentHost {
    /// Type names of all attached components, in attachment order.
    fn component_type_names(&self) -> Vec<String>;

    /// All attached components as (type name, erased value) pairs, in
    /// attachment order.
    fn components(&self) -> Vec<(String, &dyn Any)>;

    /// Mutable access to the component with the given type name.
    fn component_mut(&mut self, type_name: &str) -> Option<&mut dyn Any>;

    /// Attach a default-constructed component of the given type.
    fn add_component(&mut self, type_name: &str) -> Result<(), ArchetypeError>;

    /// Detach every component.
    fn remove_all_components(&mut self);
}

/// Constructor for a default-valued component, erased by type name.
pub type ComponentFactory = fn() -> Box<dyn Any>;

fn make_default<T: Any + Default>() -> Box<dyn Any> {
    Box::new(T::default())
}

/// In-memory [`ComponentHost`] backed by a name → constructor map.
#[derive(Default)]
pub struct MemoryHost {
    factories: HashMap<String, ComponentFactory>,
    components: Vec<(String, Box<dyn Any>)>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a constructor so [`add_component`](ComponentHost::add_component)
    /// can build this type by name.
    pub fn with_factory<T: Any + Default>(mut self, type_name: impl Into<String>) -> Self {
        self.factories.insert(type_name.into(), make_default::<T>);
        self
    }

    /// Attach an already-built component value.
    pub fn attach<T: Any>(&mut self, type_name: impl Into<String>, value: T) {
        self.components.push((type_name.into(), Box::new(value)));
    }

    /// Typed view of an attached component.
    pub fn get<T: Any>(&self, type_name: &str) -> Option<&T> {
        self.components
            .iter()
            .find(|(name, _)| name == type_name)
            .and_then(|(_, value)| value.downcast_ref::<T>())
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl ComponentHost for MemoryHost {
    fn component_type_names(&self) -> Vec<String> {
        self.components.iter().map(|(name, _)| name.clone()).collect()
    }

    fn components(&self) -> Vec<(String, &dyn Any)> {
        self.components
            .iter()
            .map(|(name, value)| (name.clone(), value.as_ref()))
            .collect()
    }

    fn component_mut(&mut self, type_name: &str) -> Option<&mut dyn Any> {
        self.components
            .iter_mut()
            .find(|(name, _)| name == type_name)
            .map(|(_, value)| value.as_mut())
    }

    fn add_component(&mut self, type_name: &str) -> Result<(), ArchetypeError> {
        let Some(factory) = self.factories.get(type_name) else {
            return Err(ArchetypeError::UnknownComponentType {
                name: type_name.to_string(),
            });
        };
        self.components.push((type_name.to_string(), factory()));
        Ok(())
    }

    fn remove_all_components(&mut self) {
        self.components.clear();
    }
}

//! Runtime type descriptors.
//!
//! A [`TypeDescriptor`] is the registry's canonical record of one type's
//! shape: identity (name + hash), size, optional base-type binding, the
//! flattened field list, and a pair of generic codec slots. Descriptors are
//! created once while the registry is built and never mutated afterwards.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::document::Document;
use crate::error::ReflectError;
use crate::field::{Access, FieldAccessor, FieldDescriptor};

/// Custom serialize slot: erased value → document.
pub type SerializeFn =
    Arc<dyn Fn(&dyn Any) -> Result<Document, ReflectError> + Send + Sync>;

/// Custom deserialize slot: document → in-place overwrite of the erased value.
pub type DeserializeFn =
    Arc<dyn Fn(&mut dyn Any, &Document) -> Result<(), ReflectError> + Send + Sync>;

/// Resolved link to a type's single base type.
#[derive(Clone)]
pub struct BaseBinding {
    pub(crate) descriptor: Arc<TypeDescriptor>,
    pub(crate) inherit: Access,
    pub(crate) upcast: FieldAccessor,
}

impl BaseBinding {
    /// Descriptor of the base type.
    #[inline]
    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    /// Inheritance-visibility rule applied to the base's field access levels.
    #[inline]
    pub fn inherit(&self) -> Access {
        self.inherit
    }

    /// Projection from a derived instance to its embedded base value.
    #[inline]
    pub fn upcast(&self) -> &FieldAccessor {
        &self.upcast
    }
}

impl fmt::Debug for BaseBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaseBinding")
            .field("base", &self.descriptor.name)
            .field("inherit", &self.inherit)
            .finish()
    }
}

/// Full runtime description of one registered type.
///
/// At most one base type (single inheritance). The field list is already
/// flattened: inherited fields first (access remapped, private base fields
/// dropped, accessors routed through the upcast), then the type's own
/// declared fields in declaration order.
///
/// A type with a custom codec terminates generic traversal: the slot is
/// called instead of the field walk. A derived type's custom slot must
/// invoke the base's serialization itself — custom slots are never chained
/// across inheritance automatically.
pub struct TypeDescriptor {
    pub(crate) name: String,
    pub(crate) hash: u64,
    pub(crate) size: usize,
    pub(crate) rust_type: TypeId,
    pub(crate) serializable: bool,
    pub(crate) base: Option<BaseBinding>,
    pub(crate) fields: Vec<FieldDescriptor>,
    pub(crate) serialize_with: Option<SerializeFn>,
    pub(crate) deserialize_with: Option<DeserializeFn>,
}

impl TypeDescriptor {
    /// Registered type name, globally unique within the registry.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stable identity hash of the name (see [`crate::hash::type_hash`]).
    #[inline]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Byte size of the type's in-memory representation.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Concrete Rust type backing this descriptor, used to validate
    /// typed references.
    #[inline]
    pub fn rust_type(&self) -> TypeId {
        self.rust_type
    }

    /// Type-level serialization opt-in. When false the type never appears
    /// in default-serialized documents, regardless of per-field flags.
    #[inline]
    pub fn serializable(&self) -> bool {
        self.serializable
    }

    /// The single base-type binding, if any.
    #[inline]
    pub fn base(&self) -> Option<&BaseBinding> {
        self.base.as_ref()
    }

    /// Flattened field list: inherited fields, then own fields.
    #[inline]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    /// Look up a field by name. When inheritance shadows a name, the
    /// derived-most field wins.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().rev().find(|f| f.name == name)
    }

    /// Whether this type serializes through a custom codec instead of the
    /// generic field walk.
    #[inline]
    pub fn has_custom_codec(&self) -> bool {
        self.serialize_with.is_some() || self.deserialize_with.is_some()
    }

    #[inline]
    pub(crate) fn serialize_slot(&self) -> Option<&SerializeFn> {
        self.serialize_with.as_ref()
    }

    #[inline]
    pub(crate) fn deserialize_slot(&self) -> Option<&DeserializeFn> {
        self.deserialize_with.as_ref()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("hash", &format_args!("{:#018x}", self.hash))
            .field("size", &self.size)
            .field("serializable", &self.serializable)
            .field("base", &self.base.as_ref().map(|b| b.descriptor.name.as_str()))
            .field("fields", &self.fields.iter().map(|x| x.name.as_str()).collect::<Vec<_>>())
            .field("custom_codec", &self.has_custom_codec())
            .finish()
    }
}

/// Serde-backed codec slots for leaf types.
///
/// Leaves (integers, floats, strings, string sets) terminate the generic
/// recursion: they have no reflected fields and convert directly between the
/// concrete value and a document node.
pub(crate) fn serde_codec<T>(type_name: &str) -> (SerializeFn, DeserializeFn)
where
    T: Any + Serialize + DeserializeOwned,
{
    let name_ser = type_name.to_string();
    let ser: SerializeFn = Arc::new(move |value: &dyn Any| {
        let concrete = value
            .downcast_ref::<T>()
            .ok_or_else(|| ReflectError::TypeMismatch {
                expected: name_ser.clone(),
            })?;
        serde_json::to_value(concrete).map_err(|e| ReflectError::DocumentShape {
            name: name_ser.clone(),
            detail: e.to_string(),
        })
    });

    let name_de = type_name.to_string();
    let de: DeserializeFn = Arc::new(move |value: &mut dyn Any, doc: &Document| {
        let concrete = value
            .downcast_mut::<T>()
            .ok_or_else(|| ReflectError::TypeMismatch {
                expected: name_de.clone(),
            })?;
        *concrete = serde_json::from_value(doc.clone()).map_err(|e| {
            ReflectError::DocumentShape {
                name: name_de.clone(),
                detail: e.to_string(),
            }
        })?;
        Ok(())
    });

    (ser, de)
}

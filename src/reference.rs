//! Typed references — the traversal unit of generic serialization.
//!
//! A [`TypedRef`] pairs a [`TypeDescriptor`] with a type-erased borrow of a
//! live value. It owns nothing and is only valid while the underlying value
//! is; references are built transiently for a single serialize or
//! deserialize call tree and never persisted.

use std::any::Any;

use crate::descriptor::TypeDescriptor;
use crate::document::Document;
use crate::error::ReflectError;
use crate::serializer;

/// Non-owning (descriptor, value) pair for reading.
#[derive(Clone, Copy)]
pub struct TypedRef<'a> {
    descriptor: &'a TypeDescriptor,
    value: &'a dyn Any,
}

impl std::fmt::Debug for TypedRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypedRef")
            .field("descriptor", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

impl<'a> TypedRef<'a> {
    /// Wrap a value, verifying it is an instance of the described type.
    pub fn new(descriptor: &'a TypeDescriptor, value: &'a dyn Any) -> Result<Self, ReflectError> {
        if (*value).type_id() != descriptor.rust_type() {
            return Err(ReflectError::TypeMismatch {
                expected: descriptor.name().to_string(),
            });
        }
        Ok(Self { descriptor, value })
    }

    #[inline]
    pub fn descriptor(&self) -> &'a TypeDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn value(&self) -> &'a dyn Any {
        self.value
    }

    /// Encode the referenced value to a document through the type's codec
    /// slot or the generic field walk.
    pub fn serialize(&self) -> Result<Document, ReflectError> {
        serializer::serialize_value(self)
    }
}

/// Non-owning (descriptor, value) pair for in-place writing.
pub struct TypedRefMut<'a> {
    descriptor: &'a TypeDescriptor,
    value: &'a mut dyn Any,
}

impl<'a> TypedRefMut<'a> {
    /// Wrap a mutable value, verifying it is an instance of the described
    /// type.
    pub fn new(
        descriptor: &'a TypeDescriptor,
        value: &'a mut dyn Any,
    ) -> Result<Self, ReflectError> {
        if (*value).type_id() != descriptor.rust_type() {
            return Err(ReflectError::TypeMismatch {
                expected: descriptor.name().to_string(),
            });
        }
        Ok(Self { descriptor, value })
    }

    #[inline]
    pub fn descriptor(&self) -> &'a TypeDescriptor {
        self.descriptor
    }

    #[inline]
    pub fn value_mut(&mut self) -> &mut dyn Any {
        &mut *self.value
    }

    /// Decode a document into the referenced value. Only overwrites fields
    /// present in the document; everything else keeps its prior value.
    pub fn deserialize(&mut self, doc: &Document) -> Result<(), ReflectError> {
        serializer::deserialize_value(self, doc)
    }
}

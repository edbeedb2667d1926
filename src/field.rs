//! Field descriptions and type-erased field access.
//!
//! A field is reachable through a [`FieldAccessor`]: a pair of getter/setter
//! closures erased behind `dyn Any`, built from concrete typed projections.
//! Accessors replace raw `base + offset` pointer arithmetic — the traversal
//! contract is identical, without the undefined behavior.
//!
//! Declarations ([`FieldDef`]) reference the field's type by *name*; the
//! registry resolves them into immutable [`FieldDescriptor`]s during its
//! build phase.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::TypeDescriptor;

// =============================================================================
// Access levels
// =============================================================================

/// Member access level, also used as the inheritance-visibility rule on a
/// base-type link.
///
/// Ordering is by restrictiveness: `Public < Protected < Private`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Access {
    Public,
    Protected,
    Private,
}

impl Access {
    /// Remap a base field's access level through an inheritance rule.
    ///
    /// Private base fields are dropped from the derived type's reflected
    /// list (`None`); everything else is capped at the inheritance rule's
    /// restrictiveness:
    ///
    /// ```text
    /// Public.inherited_as(Public)     → Some(Public)
    /// Public.inherited_as(Protected)  → Some(Protected)
    /// Protected.inherited_as(Private) → Some(Private)
    /// Private.inherited_as(Public)    → None
    /// ```
    #[inline]
    pub fn inherited_as(self, rule: Access) -> Option<Access> {
        if self == Access::Private {
            return None;
        }
        Some(self.max(rule))
    }
}

// =============================================================================
// FieldAccessor
// =============================================================================

type GetFn = Arc<dyn for<'a> Fn(&'a dyn Any) -> Option<&'a dyn Any> + Send + Sync>;
type GetMutFn = Arc<dyn for<'a> Fn(&'a mut dyn Any) -> Option<&'a mut dyn Any> + Send + Sync>;

/// Type-erased getter/setter pair projecting an owner value to one of its
/// fields.
///
/// Projection returns `None` when the owner value is not the concrete type
/// the accessor was built for; callers translate that into a
/// [`TypeMismatch`](crate::error::ReflectError::TypeMismatch) error.
#[derive(Clone)]
pub struct FieldAccessor {
    get: GetFn,
    get_mut: GetMutFn,
}

impl FieldAccessor {
    /// Build an accessor from a concrete projection pair.
    ///
    /// ```
    /// use type_reflect::field::FieldAccessor;
    ///
    /// struct Point { x: i32, y: i32 }
    ///
    /// let x = FieldAccessor::of(|p: &Point| &p.x, |p: &mut Point| &mut p.x);
    /// let p = Point { x: 4, y: 9 };
    /// let got = x.project(&p).unwrap().downcast_ref::<i32>().unwrap();
    /// assert_eq!(*got, 4);
    /// ```
    pub fn of<O: Any, F: Any>(get: fn(&O) -> &F, get_mut: fn(&mut O) -> &mut F) -> Self {
        Self {
            get: Arc::new(move |owner: &dyn Any| {
                owner.downcast_ref::<O>().map(|o| get(o) as &dyn Any)
            }),
            get_mut: Arc::new(move |owner: &mut dyn Any| {
                owner.downcast_mut::<O>().map(|o| get_mut(o) as &mut dyn Any)
            }),
        }
    }

    /// Chain two accessors: `self` projects owner → intermediate, `next`
    /// projects intermediate → field. Used to route an inherited field's
    /// access through the derived type's upcast projection.
    pub fn then(&self, next: &FieldAccessor) -> FieldAccessor {
        let g1 = Arc::clone(&self.get);
        let g2 = Arc::clone(&next.get);
        let m1 = Arc::clone(&self.get_mut);
        let m2 = Arc::clone(&next.get_mut);
        FieldAccessor {
            get: Arc::new(move |owner: &dyn Any| g1(owner).and_then(|mid| g2(mid))),
            get_mut: Arc::new(move |owner: &mut dyn Any| m1(owner).and_then(|mid| m2(mid))),
        }
    }

    /// Shared projection of `owner` to the field value.
    #[inline]
    pub fn project<'a>(&self, owner: &'a dyn Any) -> Option<&'a dyn Any> {
        (self.get)(owner)
    }

    /// Mutable projection of `owner` to the field value.
    #[inline]
    pub fn project_mut<'a>(&self, owner: &'a mut dyn Any) -> Option<&'a mut dyn Any> {
        (self.get_mut)(owner)
    }
}

impl fmt::Debug for FieldAccessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FieldAccessor")
    }
}

// =============================================================================
// Declaration vs resolved descriptor
// =============================================================================

/// Declaration of one field, collected during the registry's declare phase.
///
/// The field's type is referenced by name and resolved when the registry is
/// built, so declaration order across types does not matter.
#[derive(Clone, Debug)]
pub struct FieldDef {
    pub(crate) name: String,
    pub(crate) type_name: String,
    pub(crate) access: Access,
    pub(crate) serializable: bool,
    pub(crate) optional: bool,
    pub(crate) accessor: FieldAccessor,
}

impl FieldDef {
    /// Declare a field with public access, participating in serialization,
    /// and required on deserialize.
    pub fn new<O: Any, F: Any>(
        name: impl Into<String>,
        type_name: impl Into<String>,
        get: fn(&O) -> &F,
        get_mut: fn(&mut O) -> &mut F,
    ) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            access: Access::Public,
            serializable: true,
            optional: false,
            accessor: FieldAccessor::of(get, get_mut),
        }
    }

    /// Set the field's access level.
    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Exclude this field from default serialization, independent of the
    /// field type's own serializable flag.
    pub fn transient(mut self) -> Self {
        self.serializable = false;
        self
    }

    /// Mark the field optional on deserialize: a missing document key keeps
    /// the prior value and logs a warning instead of failing.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Structural equivalence, used for idempotent re-declaration. Accessor
    /// closures cannot be compared and are ignored.
    pub(crate) fn same_shape(&self, other: &FieldDef) -> bool {
        self.name == other.name
            && self.type_name == other.type_name
            && self.access == other.access
            && self.serializable == other.serializable
            && self.optional == other.optional
    }
}

/// Resolved, immutable description of one field of a registered type.
///
/// Inherited fields appear in the owner's list ahead of its own declared
/// fields, with access remapped through the inheritance rule and the
/// accessor composed with the upcast projection. Duplicate names across
/// inheritance levels are both kept.
#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    pub(crate) name: String,
    pub(crate) ty: Arc<TypeDescriptor>,
    pub(crate) access: Access,
    pub(crate) serializable: bool,
    pub(crate) optional: bool,
    pub(crate) accessor: FieldAccessor,
}

impl FieldDescriptor {
    /// Field name (unique among the owner's own declared fields).
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Descriptor of the field's type.
    #[inline]
    pub fn ty(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    #[inline]
    pub fn access(&self) -> Access {
        self.access
    }

    /// Per-field serialization opt-in. Both this and the field type's flag
    /// must be true for the field to participate in default serialization.
    #[inline]
    pub fn serializable(&self) -> bool {
        self.serializable
    }

    #[inline]
    pub fn optional(&self) -> bool {
        self.optional
    }

    #[inline]
    pub fn accessor(&self) -> &FieldAccessor {
        &self.accessor
    }
}

//! Type registry — two-phase registration and runtime lookup.
//!
//! Registration is split into a declare phase and a build phase so that
//! cross-type registration order never matters:
//!
//! 1. **Declare** ([`RegistryBuilder::declare`]): each type is described by a
//!    [`TypeDef`] that references its base type and field types by *name*.
//!    Nothing is resolved yet; a derived type may be declared before its base.
//! 2. **Build** ([`RegistryBuilder::build`]): once every declaration is
//!    collected, descriptors are resolved in dependency order (topological
//!    sort over base and field-type links, failing loudly on a cycle),
//!    inherited field lists are flattened, and the result is an immutable
//!    [`TypeRegistry`].
//!
//! After build the registry is read-only; lookups are freely shareable
//! across threads.

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::mem;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::descriptor::{
    BaseBinding, DeserializeFn, SerializeFn, TypeDescriptor, serde_codec,
};
use crate::error::ReflectError;
use crate::field::{Access, FieldAccessor, FieldDef, FieldDescriptor};
use crate::hash::type_hash;

// =============================================================================
// Declarations
// =============================================================================

/// Declared (unresolved) base-type link.
#[derive(Clone, Debug)]
struct BaseDef {
    type_name: String,
    inherit: Access,
    upcast: FieldAccessor,
}

/// Declaration of one type, collected during the declare phase.
///
/// ```
/// use type_reflect::registry::TypeDef;
/// use type_reflect::field::Access;
///
/// struct Point { x: i32, y: i32 }
/// struct Circle { center: Point, r: i32 }
///
/// let point = TypeDef::new::<Point>("Point")
///     .field("x", "i32", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
///     .field("y", "i32", |p: &Point| &p.y, |p: &mut Point| &mut p.y);
///
/// let circle = TypeDef::new::<Circle>("Circle")
///     .with_base("Point", Access::Public,
///         |c: &Circle| &c.center, |c: &mut Circle| &mut c.center)
///     .field("r", "i32", |c: &Circle| &c.r, |c: &mut Circle| &mut c.r);
/// ```
#[derive(Clone)]
pub struct TypeDef {
    name: String,
    size: usize,
    rust_type: TypeId,
    serializable: bool,
    base: Option<BaseDef>,
    fields: Vec<FieldDef>,
    serialize_with: Option<SerializeFn>,
    deserialize_with: Option<DeserializeFn>,
}

impl TypeDef {
    /// Declare a composite type serialized through the generic field walk.
    pub fn new<T: Any>(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size: mem::size_of::<T>(),
            rust_type: TypeId::of::<T>(),
            serializable: true,
            base: None,
            fields: Vec::new(),
            serialize_with: None,
            deserialize_with: None,
        }
    }

    /// Declare a leaf type with a serde-backed codec. Leaves have no
    /// reflected fields and terminate the generic recursion.
    pub fn leaf<T>(name: impl Into<String>) -> Self
    where
        T: Any + Serialize + DeserializeOwned,
    {
        let name = name.into();
        let (ser, de) = serde_codec::<T>(&name);
        let mut def = Self::new::<T>(name);
        def.serialize_with = Some(ser);
        def.deserialize_with = Some(de);
        def
    }

    /// Link the single base type by name, with the inheritance-visibility
    /// rule and the projection from a derived instance to its embedded base
    /// value. The base may be declared later; it is resolved at build.
    pub fn with_base<O: Any, B: Any>(
        mut self,
        base_name: impl Into<String>,
        inherit: Access,
        get: fn(&O) -> &B,
        get_mut: fn(&mut O) -> &mut B,
    ) -> Self {
        self.base = Some(BaseDef {
            type_name: base_name.into(),
            inherit,
            upcast: FieldAccessor::of(get, get_mut),
        });
        self
    }

    /// Append a declared field.
    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Convenience for the common case: append a public, serializable,
    /// required field from a projection pair.
    pub fn field<O: Any, F: Any>(
        self,
        name: impl Into<String>,
        type_name: impl Into<String>,
        get: fn(&O) -> &F,
        get_mut: fn(&mut O) -> &mut F,
    ) -> Self {
        self.with_field(FieldDef::new(name, type_name, get, get_mut))
    }

    /// Exclude the whole type from default serialization.
    pub fn transient(mut self) -> Self {
        self.serializable = false;
        self
    }

    /// Install custom codec slots, bypassing the generic field walk.
    ///
    /// A derived type's custom codec must handle the base's data itself;
    /// custom slots are never chained across inheritance.
    pub fn with_codec(mut self, ser: SerializeFn, de: DeserializeFn) -> Self {
        self.serialize_with = Some(ser);
        self.deserialize_with = Some(de);
        self
    }

    /// Structural equivalence for idempotent re-declaration. Codec slots are
    /// compared by presence only; closures have no identity.
    fn same_shape(&self, other: &TypeDef) -> bool {
        self.name == other.name
            && self.size == other.size
            && self.rust_type == other.rust_type
            && self.serializable == other.serializable
            && match (&self.base, &other.base) {
                (None, None) => true,
                (Some(a), Some(b)) => a.type_name == b.type_name && a.inherit == b.inherit,
                _ => false,
            }
            && self.fields.len() == other.fields.len()
            && self
                .fields
                .iter()
                .zip(&other.fields)
                .all(|(a, b)| a.same_shape(b))
            && self.serialize_with.is_some() == other.serialize_with.is_some()
            && self.deserialize_with.is_some() == other.deserialize_with.is_some()
    }
}

impl fmt::Debug for TypeDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDef")
            .field("name", &self.name)
            .field("base", &self.base.as_ref().map(|b| b.type_name.as_str()))
            .field("fields", &self.fields.iter().map(|x| x.name.as_str()).collect::<Vec<_>>())
            .finish()
    }
}

// =============================================================================
// Builder (declare phase)
// =============================================================================

/// Collects [`TypeDef`]s and resolves them into a [`TypeRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
    defs: Vec<TypeDef>,
    by_name: HashMap<String, usize>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a type.
    ///
    /// Re-declaring a structurally identical shape is an idempotent no-op.
    /// Re-declaring with a different shape is a
    /// [`DoubleRegistration`](ReflectError::DoubleRegistration) error, and a
    /// duplicate name among the type's own declared fields is a
    /// [`DuplicateField`](ReflectError::DuplicateField) error.
    pub fn declare(&mut self, def: TypeDef) -> Result<(), ReflectError> {
        for (i, f) in def.fields.iter().enumerate() {
            if def.fields[..i].iter().any(|g| g.name == f.name) {
                return Err(ReflectError::DuplicateField {
                    owner: def.name.clone(),
                    field: f.name.clone(),
                });
            }
        }

        if let Some(&existing) = self.by_name.get(&def.name) {
            if self.defs[existing].same_shape(&def) {
                return Ok(());
            }
            return Err(ReflectError::DoubleRegistration { name: def.name });
        }

        self.by_name.insert(def.name.clone(), self.defs.len());
        self.defs.push(def);
        Ok(())
    }

    /// Append a field to an already-declared type.
    pub fn add_field(&mut self, owner: &str, field: FieldDef) -> Result<(), ReflectError> {
        let Some(&idx) = self.by_name.get(owner) else {
            return Err(ReflectError::UnregisteredType {
                name: owner.to_string(),
            });
        };
        let def = &mut self.defs[idx];
        if def.fields.iter().any(|f| f.name == field.name) {
            return Err(ReflectError::DuplicateField {
                owner: owner.to_string(),
                field: field.name,
            });
        }
        def.fields.push(field);
        Ok(())
    }

    /// Number of declared types.
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Resolve every declaration into an immutable registry.
    ///
    /// Descriptors are constructed in dependency order (base and field types
    /// before their dependents). Unknown names fail with
    /// [`UnregisteredType`](ReflectError::UnregisteredType); a cycle in the
    /// dependency graph fails with
    /// [`DependencyCycle`](ReflectError::DependencyCycle).
    pub fn build(self) -> Result<TypeRegistry, ReflectError> {
        let defs = self.defs;
        let by_name = self.by_name;

        // 1. Dependency edges (base link + field types), deduplicated
        let mut deps: Vec<Vec<usize>> = Vec::with_capacity(defs.len());
        for def in &defs {
            let mut d: Vec<usize> = Vec::new();
            if let Some(base) = &def.base {
                let Some(&bi) = by_name.get(&base.type_name) else {
                    return Err(ReflectError::UnregisteredType {
                        name: base.type_name.clone(),
                    });
                };
                d.push(bi);
            }
            for f in &def.fields {
                let Some(&fi) = by_name.get(&f.type_name) else {
                    return Err(ReflectError::UnregisteredType {
                        name: f.type_name.clone(),
                    });
                };
                if !d.contains(&fi) {
                    d.push(fi);
                }
            }
            deps.push(d);
        }

        // 2. Topological order over the dependency graph
        let mut remaining: Vec<usize> = deps.iter().map(|d| d.len()).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); defs.len()];
        for (i, ds) in deps.iter().enumerate() {
            for &d in ds {
                dependents[d].push(i);
            }
        }
        let mut queue: VecDeque<usize> = (0..defs.len()).filter(|&i| remaining[i] == 0).collect();
        let mut order: Vec<usize> = Vec::with_capacity(defs.len());
        while let Some(i) = queue.pop_front() {
            order.push(i);
            for &j in &dependents[i] {
                remaining[j] -= 1;
                if remaining[j] == 0 {
                    queue.push_back(j);
                }
            }
        }
        if order.len() != defs.len() {
            let name = defs
                .iter()
                .enumerate()
                .find(|&(i, _)| remaining[i] > 0)
                .map(|(_, d)| d.name.clone())
                .unwrap_or_default();
            return Err(ReflectError::DependencyCycle { name });
        }

        // 3. Construct descriptors in dependency order, flattening fields
        let mut built: Vec<Option<Arc<TypeDescriptor>>> = vec![None; defs.len()];
        for &i in &order {
            let def = &defs[i];

            let resolve = |idx: usize, name: &str| -> Result<Arc<TypeDescriptor>, ReflectError> {
                built[idx]
                    .clone()
                    .ok_or_else(|| ReflectError::UnregisteredType {
                        name: name.to_string(),
                    })
            };

            let base = match &def.base {
                Some(b) => Some(BaseBinding {
                    descriptor: resolve(by_name[&b.type_name], &b.type_name)?,
                    inherit: b.inherit,
                    upcast: b.upcast.clone(),
                }),
                None => None,
            };

            // Inherited fields first: access remapped, private base fields
            // dropped, accessors routed through the upcast.
            let mut fields: Vec<FieldDescriptor> = Vec::new();
            if let Some(binding) = &base {
                for f in binding.descriptor.fields() {
                    let Some(access) = f.access().inherited_as(binding.inherit) else {
                        continue;
                    };
                    fields.push(FieldDescriptor {
                        name: f.name().to_string(),
                        ty: Arc::clone(f.ty()),
                        access,
                        serializable: f.serializable(),
                        optional: f.optional(),
                        accessor: binding.upcast.then(f.accessor()),
                    });
                }
            }
            for fd in &def.fields {
                fields.push(FieldDescriptor {
                    name: fd.name.clone(),
                    ty: resolve(by_name[&fd.type_name], &fd.type_name)?,
                    access: fd.access,
                    serializable: fd.serializable,
                    optional: fd.optional,
                    accessor: fd.accessor.clone(),
                });
            }

            built[i] = Some(Arc::new(TypeDescriptor {
                name: def.name.clone(),
                hash: type_hash(&def.name),
                size: def.size,
                rust_type: def.rust_type,
                serializable: def.serializable,
                base,
                fields,
                serialize_with: def.serialize_with.clone(),
                deserialize_with: def.deserialize_with.clone(),
            }));
        }

        // 4. Index maps, in declaration order
        let mut types: Vec<Arc<TypeDescriptor>> = Vec::with_capacity(defs.len());
        let mut name_index: HashMap<String, usize> = HashMap::with_capacity(defs.len());
        let mut hash_index: HashMap<u64, usize> = HashMap::with_capacity(defs.len());
        for (i, slot) in built.into_iter().enumerate() {
            let desc = slot.ok_or_else(|| ReflectError::UnregisteredType {
                name: defs[i].name.clone(),
            })?;
            if let Some(&other) = hash_index.get(&desc.hash()) {
                return Err(ReflectError::HashCollision {
                    first: types[other].name().to_string(),
                    second: desc.name().to_string(),
                });
            }
            name_index.insert(desc.name().to_string(), i);
            hash_index.insert(desc.hash(), i);
            types.push(desc);
        }

        Ok(TypeRegistry {
            types,
            name_index,
            hash_index,
        })
    }
}

// =============================================================================
// Registry (read-only phase)
// =============================================================================

/// Immutable map from type name to its canonical [`TypeDescriptor`].
///
/// One descriptor per distinct registered type, alive for the registry's
/// lifetime. Built once, read-only afterwards; shared references are safe to
/// use from any thread.
#[derive(Debug)]
pub struct TypeRegistry {
    /// Descriptors in declaration order.
    types: Vec<Arc<TypeDescriptor>>,
    name_index: HashMap<String, usize>,
    hash_index: HashMap<u64, usize>,
}

static GLOBAL_REGISTRY: OnceCell<TypeRegistry> = OnceCell::new();

impl TypeRegistry {
    /// Look up a descriptor by type name.
    ///
    /// An unregistered name is a registration-order bug or a typo, surfaced
    /// as a recoverable [`UnregisteredType`](ReflectError::UnregisteredType).
    pub fn lookup(&self, name: &str) -> Result<&Arc<TypeDescriptor>, ReflectError> {
        self.name_index
            .get(name)
            .map(|&i| &self.types[i])
            .ok_or_else(|| ReflectError::UnregisteredType {
                name: name.to_string(),
            })
    }

    /// Look up a descriptor by its identity hash.
    pub fn lookup_hash(&self, hash: u64) -> Result<&Arc<TypeDescriptor>, ReflectError> {
        self.hash_index
            .get(&hash)
            .map(|&i| &self.types[i])
            .ok_or_else(|| ReflectError::UnregisteredType {
                name: format!("{:#018x}", hash),
            })
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Iterate descriptors in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.types.iter()
    }

    /// Install this registry as the process-wide instance and return it.
    ///
    /// # Panics
    ///
    /// Panics if a registry is already installed. Install once, during
    /// single-threaded startup, before any lookup.
    pub fn install(self) -> &'static TypeRegistry {
        if GLOBAL_REGISTRY.set(self).is_err() {
            panic!("process-wide type registry is already installed");
        }
        TypeRegistry::global()
    }

    /// The process-wide registry.
    ///
    /// # Panics
    ///
    /// Panics when called before [`install`](TypeRegistry::install) — a
    /// registration-order bug, not a runtime data condition.
    pub fn global() -> &'static TypeRegistry {
        match GLOBAL_REGISTRY.get() {
            Some(registry) => registry,
            None => panic!("process-wide type registry accessed before install()"),
        }
    }

    /// Non-panicking variant of [`global`](TypeRegistry::global).
    pub fn try_global() -> Option<&'static TypeRegistry> {
        GLOBAL_REGISTRY.get()
    }
}

// =============================================================================
// Primitive leaves
// =============================================================================

/// Declare the standard leaf set: booleans, integers, floats, `String`.
///
/// Idempotent — safe to call from multiple subsystem init paths.
pub fn register_primitives(builder: &mut RegistryBuilder) -> Result<(), ReflectError> {
    builder.declare(TypeDef::leaf::<bool>("bool"))?;
    builder.declare(TypeDef::leaf::<i8>("i8"))?;
    builder.declare(TypeDef::leaf::<i16>("i16"))?;
    builder.declare(TypeDef::leaf::<i32>("i32"))?;
    builder.declare(TypeDef::leaf::<i64>("i64"))?;
    builder.declare(TypeDef::leaf::<u8>("u8"))?;
    builder.declare(TypeDef::leaf::<u16>("u16"))?;
    builder.declare(TypeDef::leaf::<u32>("u32"))?;
    builder.declare(TypeDef::leaf::<u64>("u64"))?;
    builder.declare(TypeDef::leaf::<f32>("f32"))?;
    builder.declare(TypeDef::leaf::<f64>("f64"))?;
    builder.declare(TypeDef::leaf::<String>("String"))?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

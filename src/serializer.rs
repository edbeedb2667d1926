//! Generic document serialization — the default, reflection-driven codec.
//!
//! Both directions are recursive walks over a type's flattened field list.
//! A type carrying a custom codec slot short-circuits the walk; that is how
//! leaf types (integers, floats, strings) terminate the recursion.
//!
//! Deserialization only overwrites: fields absent from the document keep
//! whatever value the target already holds, so defaults must be in place
//! before decoding starts. Unknown document keys are logged and ignored —
//! removing a field from a type does not break previously saved documents.

use crate::document::{Document, DocumentMap};
use crate::error::ReflectError;
use crate::field::FieldDescriptor;
use crate::reference::{TypedRef, TypedRefMut};

/// When inheritance shadows a field name, only the derived-most field (the
/// last one in the flattened list) owns the document key.
fn shadowed(fields: &[FieldDescriptor], index: usize) -> bool {
    let name = fields[index].name();
    fields[index + 1..].iter().any(|f| f.name() == name)
}

/// A field participates in default serialization only when both its own
/// flag and its type's flag allow it.
#[inline]
fn eligible(field: &FieldDescriptor) -> bool {
    field.serializable() && field.ty().serializable()
}

/// Encode a referenced value to a document.
///
/// Custom codec slot if the type has one; otherwise walk the field list in
/// declaration order (inherited fields first) and build an object document
/// whose key order matches the field order. A field-less type without a
/// codec is a contract violation — almost always a missing leaf
/// registration — and fails with
/// [`NoReflectedFields`](ReflectError::NoReflectedFields).
pub fn serialize_value(reference: &TypedRef<'_>) -> Result<Document, ReflectError> {
    let desc = reference.descriptor();

    if let Some(ser) = desc.serialize_slot() {
        return ser(reference.value());
    }

    let fields = desc.fields();
    if fields.is_empty() {
        return Err(ReflectError::NoReflectedFields {
            name: desc.name().to_string(),
        });
    }

    let mut out = DocumentMap::new();
    for (i, field) in fields.iter().enumerate() {
        if !eligible(field) || shadowed(fields, i) {
            continue;
        }

        let sub = field
            .accessor()
            .project(reference.value())
            .ok_or_else(|| ReflectError::TypeMismatch {
                expected: desc.name().to_string(),
            })?;
        let sub_ref = TypedRef::new(field.ty().as_ref(), sub)?;
        out.insert(field.name().to_string(), serialize_value(&sub_ref)?);
    }
    Ok(Document::Object(out))
}

/// Decode a document into a referenced value, in place.
///
/// Custom codec slot if the type has one; otherwise the document must be an
/// object. Per eligible field: key present → recurse through the mutable
/// accessor; key absent → [`MissingField`](ReflectError::MissingField) for
/// required fields, a logged warning (prior value retained) for optional
/// ones. Document keys with no matching field are logged and ignored.
pub fn deserialize_value(
    reference: &mut TypedRefMut<'_>,
    doc: &Document,
) -> Result<(), ReflectError> {
    let desc = reference.descriptor();

    if let Some(de) = desc.deserialize_slot() {
        return de(reference.value_mut(), doc);
    }

    let fields = desc.fields();
    if fields.is_empty() {
        return Err(ReflectError::NoReflectedFields {
            name: desc.name().to_string(),
        });
    }

    let Document::Object(map) = doc else {
        return Err(ReflectError::DocumentShape {
            name: desc.name().to_string(),
            detail: "expected an object".to_string(),
        });
    };

    for (i, field) in fields.iter().enumerate() {
        if !eligible(field) || shadowed(fields, i) {
            continue;
        }

        match map.get(field.name()) {
            Some(sub_doc) => {
                let sub = field
                    .accessor()
                    .project_mut(reference.value_mut())
                    .ok_or_else(|| ReflectError::TypeMismatch {
                        expected: desc.name().to_string(),
                    })?;
                let mut sub_ref = TypedRefMut::new(field.ty().as_ref(), sub)?;
                deserialize_value(&mut sub_ref, sub_doc)?;
            }
            None if field.optional() => {
                log::warn!(
                    "optional field '{}.{}' missing from document; keeping prior value",
                    desc.name(),
                    field.name()
                );
            }
            None => {
                return Err(ReflectError::MissingField {
                    owner: desc.name().to_string(),
                    field: field.name().to_string(),
                });
            }
        }
    }

    for key in map.keys() {
        if !fields.iter().any(|f| f.name() == key) {
            log::warn!(
                "document for '{}' has unknown key '{}'; ignored",
                desc.name(),
                key
            );
        }
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{Access, FieldDef};
    use crate::registry::{RegistryBuilder, TypeDef, TypeRegistry, register_primitives};

    #[derive(Default)]
    struct Point {
        x: i32,
        y: i32,
    }

    #[derive(Default)]
    struct Circle {
        center: Point,
        r: i32,
    }

    /// Runtime-only state next to persisted fields.
    #[derive(Default)]
    struct Sprite {
        path: String,
        gpu_handle: u64,
    }

    fn build_registry() -> TypeRegistry {
        let mut builder = RegistryBuilder::new();
        register_primitives(&mut builder).unwrap();

        builder
            .declare(
                TypeDef::new::<Point>("Point")
                    .field("x", "i32", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
                    .field("y", "i32", |p: &Point| &p.y, |p: &mut Point| &mut p.y),
            )
            .unwrap();

        builder
            .declare(
                TypeDef::new::<Circle>("Circle")
                    .with_base("Point", Access::Public, |c: &Circle| &c.center, |c: &mut Circle| {
                        &mut c.center
                    })
                    .field("r", "i32", |c: &Circle| &c.r, |c: &mut Circle| &mut c.r),
            )
            .unwrap();

        builder
            .declare(
                TypeDef::new::<Sprite>("Sprite")
                    .field("path", "String", |s: &Sprite| &s.path, |s: &mut Sprite| {
                        &mut s.path
                    })
                    .with_field(
                        FieldDef::new(
                            "gpu_handle",
                            "u64",
                            |s: &Sprite| &s.gpu_handle,
                            |s: &mut Sprite| &mut s.gpu_handle,
                        )
                        .transient(),
                    ),
            )
            .unwrap();

        builder.build().unwrap()
    }

    fn doc(registry: &TypeRegistry, name: &str, value: &dyn std::any::Any) -> Document {
        let desc = registry.lookup(name).unwrap();
        TypedRef::new(desc, value).unwrap().serialize().unwrap()
    }

    #[test]
    fn leaf_serializes_through_codec_slot() {
        let registry = build_registry();
        let value: i32 = 19;
        assert_eq!(doc(&registry, "i32", &value), Document::from(19));
    }

    #[test]
    fn composite_serializes_fields_in_declaration_order() {
        let registry = build_registry();
        let point = Point { x: 1, y: 2 };
        let d = doc(&registry, "Point", &point);

        let Document::Object(map) = &d else { panic!("expected object") };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, ["x", "y"]);
        assert_eq!(d["x"], Document::from(1));
        assert_eq!(d["y"], Document::from(2));
    }

    #[test]
    fn inherited_fields_flatten_into_document() {
        let registry = build_registry();
        let circle = Circle {
            center: Point { x: 1, y: 2 },
            r: 5,
        };
        let d = doc(&registry, "Circle", &circle);

        let Document::Object(map) = &d else { panic!("expected object") };
        let keys: Vec<_> = map.keys().cloned().collect();
        assert_eq!(keys, ["x", "y", "r"]);
        assert_eq!(d["r"], Document::from(5));
    }

    #[test]
    fn transient_field_stays_out_of_document_and_untouched() {
        let registry = build_registry();
        let sprite = Sprite {
            path: "slime.png".into(),
            gpu_handle: 77,
        };
        let d = doc(&registry, "Sprite", &sprite);

        let Document::Object(map) = &d else { panic!("expected object") };
        assert!(map.contains_key("path"));
        assert!(!map.contains_key("gpu_handle"));

        // Even a document that smuggles the key in cannot touch the field.
        let mut patched = map.clone();
        patched.insert("gpu_handle".into(), Document::from(5u64));
        let desc = registry.lookup("Sprite").unwrap();
        let mut target = Sprite {
            path: String::new(),
            gpu_handle: 123,
        };
        TypedRefMut::new(desc, &mut target)
            .unwrap()
            .deserialize(&Document::Object(patched))
            .unwrap();
        assert_eq!(target.path, "slime.png");
        assert_eq!(target.gpu_handle, 123);
    }

    #[test]
    fn round_trip_restores_every_serializable_field() {
        let registry = build_registry();
        let circle = Circle {
            center: Point { x: 3, y: -4 },
            r: 11,
        };
        let d = doc(&registry, "Circle", &circle);

        let desc = registry.lookup("Circle").unwrap();
        let mut fresh = Circle::default();
        TypedRefMut::new(desc, &mut fresh)
            .unwrap()
            .deserialize(&d)
            .unwrap();
        assert_eq!(fresh.center.x, 3);
        assert_eq!(fresh.center.y, -4);
        assert_eq!(fresh.r, 11);
    }

    #[test]
    fn missing_required_key_fails() {
        let registry = build_registry();
        let desc = registry.lookup("Point").unwrap();

        let mut map = DocumentMap::new();
        map.insert("x".into(), Document::from(1));
        let mut target = Point::default();
        let err = TypedRefMut::new(desc, &mut target)
            .unwrap()
            .deserialize(&Document::Object(map))
            .unwrap_err();
        assert!(
            matches!(err, ReflectError::MissingField { owner, field } if owner == "Point" && field == "y")
        );
    }

    #[test]
    fn missing_optional_key_keeps_prior_value() {
        #[derive(Default)]
        struct Health {
            current: i32,
            regen: i32,
        }

        let mut builder = RegistryBuilder::new();
        register_primitives(&mut builder).unwrap();
        builder
            .declare(
                TypeDef::new::<Health>("Health")
                    .field("current", "i32", |h: &Health| &h.current, |h: &mut Health| {
                        &mut h.current
                    })
                    .with_field(
                        FieldDef::new(
                            "regen",
                            "i32",
                            |h: &Health| &h.regen,
                            |h: &mut Health| &mut h.regen,
                        )
                        .optional(),
                    ),
            )
            .unwrap();
        let registry = builder.build().unwrap();
        let desc = registry.lookup("Health").unwrap();

        let mut map = DocumentMap::new();
        map.insert("current".into(), Document::from(40));
        let mut target = Health {
            current: 0,
            regen: 9,
        };
        TypedRefMut::new(desc, &mut target)
            .unwrap()
            .deserialize(&Document::Object(map))
            .unwrap();
        assert_eq!(target.current, 40);
        assert_eq!(target.regen, 9);
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let registry = build_registry();
        let desc = registry.lookup("Point").unwrap();

        let mut map = DocumentMap::new();
        map.insert("x".into(), Document::from(1));
        map.insert("y".into(), Document::from(2));
        map.insert("removed_long_ago".into(), Document::from("junk"));

        let mut target = Point::default();
        TypedRefMut::new(desc, &mut target)
            .unwrap()
            .deserialize(&Document::Object(map))
            .unwrap();
        assert_eq!(target.x, 1);
        assert_eq!(target.y, 2);
    }

    #[test]
    fn fieldless_type_without_codec_fails() {
        struct Marker;

        let mut builder = RegistryBuilder::new();
        builder.declare(TypeDef::new::<Marker>("Marker")).unwrap();
        let registry = builder.build().unwrap();
        let desc = registry.lookup("Marker").unwrap();

        let marker = Marker;
        let err = TypedRef::new(desc, &marker).unwrap().serialize().unwrap_err();
        assert!(matches!(err, ReflectError::NoReflectedFields { name } if name == "Marker"));
    }

    #[test]
    fn wrong_document_shape_fails() {
        let registry = build_registry();
        let desc = registry.lookup("Point").unwrap();
        let mut target = Point::default();
        let err = TypedRefMut::new(desc, &mut target)
            .unwrap()
            .deserialize(&Document::from(3))
            .unwrap_err();
        assert!(matches!(err, ReflectError::DocumentShape { .. }));
    }

    #[test]
    fn shadowed_field_name_derived_wins() {
        #[derive(Default)]
        struct Tagged {
            tag: i32,
        }
        #[derive(Default)]
        struct Retagged {
            base: Tagged,
            tag: i32,
        }

        let mut builder = RegistryBuilder::new();
        register_primitives(&mut builder).unwrap();
        builder
            .declare(TypeDef::new::<Tagged>("Tagged").field(
                "tag",
                "i32",
                |t: &Tagged| &t.tag,
                |t: &mut Tagged| &mut t.tag,
            ))
            .unwrap();
        builder
            .declare(
                TypeDef::new::<Retagged>("Retagged")
                    .with_base("Tagged", Access::Public, |r: &Retagged| &r.base, |r: &mut Retagged| {
                        &mut r.base
                    })
                    .field("tag", "i32", |r: &Retagged| &r.tag, |r: &mut Retagged| &mut r.tag),
            )
            .unwrap();
        let registry = builder.build().unwrap();
        let desc = registry.lookup("Retagged").unwrap();

        // Both descriptors are kept in the flattened list...
        assert_eq!(desc.fields().len(), 2);

        // ...but the document carries one key, owned by the derived field.
        let value = Retagged {
            base: Tagged { tag: 1 },
            tag: 2,
        };
        let d = TypedRef::new(desc, &value).unwrap().serialize().unwrap();
        let Document::Object(map) = &d else { panic!("expected object") };
        assert_eq!(map.len(), 1);
        assert_eq!(d["tag"], Document::from(2));

        // On decode the derived field receives the value; the shadowed base
        // copy is untouched.
        let mut target = Retagged {
            base: Tagged { tag: 100 },
            tag: 200,
        };
        TypedRefMut::new(desc, &mut target)
            .unwrap()
            .deserialize(&d)
            .unwrap();
        assert_eq!(target.tag, 2);
        assert_eq!(target.base.tag, 100);
    }
}

//! Inheritance flattening through the generic serializer.
//!
//! The classic scenario: `Circle` derives `Point` publicly, so a circle
//! serializes every serializable field of `Point` plus its own, in one flat
//! document — and deserializing honors the per-field required/optional
//! policy.

use type_reflect::prelude::*;
use type_reflect::{Document, ReflectError};

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

/// Registry with `Circle.r` optional, plus a `StrictCircle` view of the same
/// struct where `r` is required.
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
                .with_field(
                    FieldDef::new("r", "i32", |c: &Circle| &c.r, |c: &mut Circle| &mut c.r)
                        .optional(),
                ),
        )
        .unwrap();

    builder
        .declare(
            TypeDef::new::<Circle>("StrictCircle")
                .with_base("Point", Access::Public, |c: &Circle| &c.center, |c: &mut Circle| {
                    &mut c.center
                })
                .field("r", "i32", |c: &Circle| &c.r, |c: &mut Circle| &mut c.r),
        )
        .unwrap();

    builder.build().unwrap()
}

fn circle(x: i32, y: i32, r: i32) -> Circle {
    Circle {
        center: Point { x, y },
        r,
    }
}

#[test]
fn test_circle_serializes_flattened_document() {
    let registry = build_registry();
    let desc = registry.lookup("Circle").unwrap();

    let doc = TypedRef::new(desc, &circle(1, 2, 5))
        .unwrap()
        .serialize()
        .unwrap();

    let Document::Object(map) = &doc else {
        panic!("expected object")
    };
    let keys: Vec<_> = map.keys().cloned().collect();
    assert_eq!(keys, ["x", "y", "r"]);
    assert_eq!(doc["x"], 1);
    assert_eq!(doc["y"], 2);
    assert_eq!(doc["r"], 5);
}

#[test]
fn test_fresh_circle_round_trips() {
    let registry = build_registry();
    let desc = registry.lookup("Circle").unwrap();

    let doc = TypedRef::new(desc, &circle(1, 2, 5))
        .unwrap()
        .serialize()
        .unwrap();

    let mut fresh = Circle::default();
    TypedRefMut::new(desc, &mut fresh)
        .unwrap()
        .deserialize(&doc)
        .unwrap();
    assert_eq!(fresh.center.x, 1);
    assert_eq!(fresh.center.y, 2);
    assert_eq!(fresh.r, 5);
}

#[test]
fn test_missing_optional_field_keeps_prior_value() {
    let registry = build_registry();
    let desc = registry.lookup("Circle").unwrap();

    // Serialize, then drop "r" from the document.
    let doc = TypedRef::new(desc, &circle(1, 2, 5))
        .unwrap()
        .serialize()
        .unwrap();
    let Document::Object(mut map) = doc else {
        panic!("expected object")
    };
    map.remove("r");
    let trimmed = Document::Object(map);

    let mut target = circle(0, 0, 9);
    TypedRefMut::new(desc, &mut target)
        .unwrap()
        .deserialize(&trimmed)
        .unwrap();
    assert_eq!(target.center.x, 1);
    assert_eq!(target.center.y, 2);
    assert_eq!(target.r, 9);
}

#[test]
fn test_missing_required_field_fails() {
    let registry = build_registry();
    let desc = registry.lookup("StrictCircle").unwrap();

    let doc = TypedRef::new(desc, &circle(1, 2, 5))
        .unwrap()
        .serialize()
        .unwrap();
    let Document::Object(mut map) = doc else {
        panic!("expected object")
    };
    map.remove("r");

    let mut target = circle(0, 0, 9);
    let err = TypedRefMut::new(desc, &mut target)
        .unwrap()
        .deserialize(&Document::Object(map))
        .unwrap_err();
    assert!(
        matches!(err, ReflectError::MissingField { owner, field } if owner == "StrictCircle" && field == "r")
    );
}

#[test]
fn test_inherited_fields_write_through_to_the_base() {
    let registry = build_registry();
    let desc = registry.lookup("Circle").unwrap();

    let mut target = circle(0, 0, 0);
    let doc = TypedRef::new(desc, &circle(7, -3, 2))
        .unwrap()
        .serialize()
        .unwrap();
    TypedRefMut::new(desc, &mut target)
        .unwrap()
        .deserialize(&doc)
        .unwrap();

    // The x/y keys landed in the embedded Point, not anywhere else.
    assert_eq!(target.center.x, 7);
    assert_eq!(target.center.y, -3);
    assert_eq!(target.r, 2);
}

#[test]
fn test_declaration_order_is_irrelevant() {
    // Derived first, base later, leaves last.
    let mut builder = RegistryBuilder::new();
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
            TypeDef::new::<Point>("Point")
                .field("x", "i32", |p: &Point| &p.x, |p: &mut Point| &mut p.x)
                .field("y", "i32", |p: &Point| &p.y, |p: &mut Point| &mut p.y),
        )
        .unwrap();
    register_primitives(&mut builder).unwrap();

    let registry = builder.build().unwrap();
    let desc = registry.lookup("Circle").unwrap();
    let names: Vec<_> = desc.fields().iter().map(|f| f.name().to_string()).collect();
    assert_eq!(names, ["x", "y", "r"]);
}

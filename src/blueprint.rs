//! Blueprint persistence — whole objects through the generic serializer.
//!
//! A blueprint document is one ordered object keyed by component type name,
//! each value the component's generically serialized document. Loading adds
//! missing components through the host's factory and decodes each component
//! in place, so fields absent from the document keep their defaults.

use crate::document::{self, Document, DocumentMap};
use crate::error::{ArchetypeError, ReflectError};
use crate::host::ComponentHost;
use crate::reference::{TypedRef, TypedRefMut};
use crate::registry::TypeRegistry;
use crate::store::FileStore;

/// Serialize every attached component of a live object.
pub fn save_object(
    registry: &TypeRegistry,
    host: &dyn ComponentHost,
) -> Result<Document, ReflectError> {
    let mut out = DocumentMap::new();
    for (type_name, value) in host.components() {
        let desc = registry.lookup(&type_name)?;
        let doc = TypedRef::new(desc, value)?.serialize()?;
        out.insert(type_name, doc);
    }
    Ok(Document::Object(out))
}

/// Decode a blueprint document into a live object.
///
/// Components named in the document but not attached are added through the
/// host first. Component types unknown to the registry are logged and
/// skipped — an old blueprint keeps loading after a component type is
/// retired.
pub fn load_object(
    registry: &TypeRegistry,
    doc: &Document,
    host: &mut dyn ComponentHost,
) -> Result<(), ArchetypeError> {
    let Document::Object(map) = doc else {
        return Err(ArchetypeError::Reflect(ReflectError::DocumentShape {
            name: "Blueprint".to_string(),
            detail: "expected an object keyed by component type".to_string(),
        }));
    };

    for (type_name, sub) in map {
        if !registry.contains(type_name) {
            log::warn!(
                "blueprint references unknown component type '{}'; skipped",
                type_name
            );
            continue;
        }

        if host.component_mut(type_name).is_none() {
            host.add_component(type_name)?;
        }

        let desc = registry.lookup(type_name)?;
        let Some(value) = host.component_mut(type_name) else {
            return Err(ArchetypeError::UnknownComponentType {
                name: type_name.clone(),
            });
        };
        TypedRefMut::new(desc, value)?.deserialize(sub)?;
    }
    Ok(())
}

/// Serialize a live object and write it through the file store.
pub fn write_object(
    registry: &TypeRegistry,
    host: &dyn ComponentHost,
    store: &mut dyn FileStore,
    name: &str,
    category: &str,
) -> Result<(), ArchetypeError> {
    let doc = save_object(registry, host)?;
    let bytes = document::to_bytes(&doc)?;
    store.write(name, category, &bytes)?;
    Ok(())
}

/// Read a blueprint file and decode it into a live object.
pub fn read_object(
    registry: &TypeRegistry,
    host: &mut dyn ComponentHost,
    store: &dyn FileStore,
    name: &str,
    category: &str,
) -> Result<(), ArchetypeError> {
    let bytes = store.read(name, category)?;
    let doc = document::from_bytes(&bytes)?;
    load_object(registry, &doc, host)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::MemoryHost;
    use crate::registry::{RegistryBuilder, TypeDef, register_primitives};
    use crate::store::MemStore;

    #[derive(Default)]
    struct Transform {
        x: f32,
        y: f32,
    }

    #[derive(Default)]
    struct Label {
        text: String,
    }

    fn registry() -> TypeRegistry {
        let mut builder = RegistryBuilder::new();
        register_primitives(&mut builder).unwrap();
        builder
            .declare(
                TypeDef::new::<Transform>("Transform")
                    .field("x", "f32", |t: &Transform| &t.x, |t: &mut Transform| &mut t.x)
                    .field("y", "f32", |t: &Transform| &t.y, |t: &mut Transform| &mut t.y),
            )
            .unwrap();
        builder
            .declare(TypeDef::new::<Label>("Label").field(
                "text",
                "String",
                |l: &Label| &l.text,
                |l: &mut Label| &mut l.text,
            ))
            .unwrap();
        builder.build().unwrap()
    }

    fn empty_host() -> MemoryHost {
        MemoryHost::new()
            .with_factory::<Transform>("Transform")
            .with_factory::<Label>("Label")
    }

    #[test]
    fn object_round_trip_through_store() {
        let registry = registry();
        let mut store = MemStore::new();

        let mut host = empty_host();
        host.attach("Transform", Transform { x: 1.5, y: -2.0 });
        host.attach("Label", Label { text: "spawn".into() });

        write_object(&registry, &host, &mut store, "spawn.bp", "blueprints").unwrap();

        let mut fresh = empty_host();
        read_object(&registry, &mut fresh, &store, "spawn.bp", "blueprints").unwrap();

        assert_eq!(fresh.component_type_names(), ["Transform", "Label"]);
        assert_eq!(fresh.get::<Transform>("Transform").unwrap().x, 1.5);
        assert_eq!(fresh.get::<Transform>("Transform").unwrap().y, -2.0);
        assert_eq!(fresh.get::<Label>("Label").unwrap().text, "spawn");
    }

    #[test]
    fn load_overwrites_existing_components_in_place() {
        let registry = registry();
        let mut host = empty_host();
        host.attach("Transform", Transform { x: 9.0, y: 9.0 });

        let mut donor = empty_host();
        donor.attach("Transform", Transform { x: 1.0, y: 2.0 });
        let doc = save_object(&registry, &donor).unwrap();

        load_object(&registry, &doc, &mut host).unwrap();
        assert_eq!(host.len(), 1);
        assert_eq!(host.get::<Transform>("Transform").unwrap().x, 1.0);
    }

    #[test]
    fn unknown_component_types_are_skipped() {
        let registry = registry();
        let mut host = empty_host();

        let mut map = DocumentMap::new();
        map.insert("Retired".into(), document::empty_object());
        load_object(&registry, &Document::Object(map), &mut host).unwrap();
        assert!(host.is_empty());
    }

    #[test]
    fn non_object_blueprint_fails() {
        let registry = registry();
        let mut host = empty_host();
        let err = load_object(&registry, &Document::from(1), &mut host).unwrap_err();
        assert!(matches!(
            err,
            ArchetypeError::Reflect(ReflectError::DocumentShape { .. })
        ));
    }
}

//! Archetype manager — the named collection and its single backing file.
//!
//! The manager owns the canonical copy of every saved archetype. The whole
//! map lives in one file (`.archetypelist`); it is read once at
//! construction and rewritten in full after every mutation — there is no
//! incremental persistence. When the rewrite fails the in-memory map is
//! restored, so memory and file never diverge.
//!
//! The manager is shared mutable state. It assumes single-threaded access;
//! callers running multi-threaded must serialize mutation themselves (one
//! mutex around the manager).

use std::collections::BTreeMap;

use crate::archetype::Archetype;
use crate::document::{self, Document, DocumentMap};
use crate::error::ArchetypeError;
use crate::host::ComponentHost;
use crate::reference::{TypedRef, TypedRefMut};
use crate::registry::TypeRegistry;
use crate::store::FileStore;

/// Default backing file name.
pub const DEFAULT_FILE: &str = "default.archetypelist";

/// Default directory category in the file store.
pub const DEFAULT_CATEGORY: &str = "archetypes";

/// Named collection of [`Archetype`]s persisted as one file.
pub struct ArchetypeManager<'r> {
    registry: &'r TypeRegistry,
    store: Box<dyn FileStore>,
    file_name: String,
    category: String,
    archetypes: BTreeMap<String, Archetype>,
}

impl<'r> ArchetypeManager<'r> {
    /// Load the manager from the default backing file. An absent file is an
    /// empty collection, not an error.
    ///
    /// The registry must contain the archetype reflection types (see
    /// [`crate::archetype::register_types`]).
    pub fn load(
        registry: &'r TypeRegistry,
        store: Box<dyn FileStore>,
    ) -> Result<Self, ArchetypeError> {
        Self::load_from(registry, store, DEFAULT_FILE, DEFAULT_CATEGORY)
    }

    /// Load the manager from an explicit file name and category.
    pub fn load_from(
        registry: &'r TypeRegistry,
        store: Box<dyn FileStore>,
        file_name: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self, ArchetypeError> {
        let mut manager = Self {
            registry,
            store,
            file_name: file_name.into(),
            category: category.into(),
            archetypes: BTreeMap::new(),
        };

        if manager.store.exists(&manager.file_name, &manager.category) {
            let bytes = manager.store.read(&manager.file_name, &manager.category)?;
            let doc = document::from_bytes(&bytes)?;
            let Document::Object(map) = doc else {
                return Err(ArchetypeError::Reflect(
                    crate::error::ReflectError::DocumentShape {
                        name: "ArchetypeList".to_string(),
                        detail: "expected an object keyed by archetype name".to_string(),
                    },
                ));
            };

            let desc = registry.lookup("Archetype")?;
            for (key, sub) in &map {
                let mut archetype = Archetype::default();
                TypedRefMut::new(desc, &mut archetype)?.deserialize(sub)?;
                if archetype.name() != key {
                    log::warn!(
                        "archetype entry '{}' carries name '{}'; using the entry key",
                        key,
                        archetype.name()
                    );
                    archetype.set_name(key.clone());
                }
                manager.archetypes.insert(key.clone(), archetype);
            }
        }

        Ok(manager)
    }

    /// Serialize the entire map and rewrite the backing file.
    fn persist(&mut self) -> Result<(), ArchetypeError> {
        let desc = self.registry.lookup("Archetype")?;
        let mut map = DocumentMap::new();
        for (name, archetype) in &self.archetypes {
            let doc = TypedRef::new(desc, archetype)?.serialize()?;
            map.insert(name.clone(), doc);
        }
        let bytes = document::to_bytes(&Document::Object(map))?;
        self.store
            .write(&self.file_name, &self.category, &bytes)?;
        Ok(())
    }

    /// Persist, restoring `backup` as the in-memory map when the file
    /// rewrite fails.
    fn persist_or_restore(
        &mut self,
        backup: BTreeMap<String, Archetype>,
    ) -> Result<(), ArchetypeError> {
        match self.persist() {
            Ok(()) => Ok(()),
            Err(err) => {
                self.archetypes = backup;
                Err(err)
            }
        }
    }

    /// Insert or overwrite a named archetype and rewrite the file. The
    /// stored copy takes the given name.
    pub fn save_as(
        &mut self,
        name: impl Into<String>,
        archetype: Archetype,
    ) -> Result<(), ArchetypeError> {
        let name = name.into();
        let mut archetype = archetype;
        archetype.set_name(name.clone());

        let backup = self.archetypes.clone();
        self.archetypes.insert(name, archetype);
        self.persist_or_restore(backup)
    }

    /// Snapshot a live object's component set and save it under `name`.
    pub fn snapshot(
        &mut self,
        name: impl Into<String>,
        host: &dyn ComponentHost,
    ) -> Result<(), ArchetypeError> {
        self.save_as(name, Archetype::from_host(host))
    }

    /// Reshape a live object to the named archetype.
    ///
    /// Idempotent: when the object's component set already equals the
    /// archetype's set this is a logged no-op with no component add/remove
    /// side effects. Otherwise every component is removed and one component
    /// per type name is added, in set iteration order (side-effect order is
    /// not contractual).
    pub fn apply(&self, name: &str, host: &mut dyn ComponentHost) -> Result<(), ArchetypeError> {
        let Some(archetype) = self.archetypes.get(name) else {
            return Err(ArchetypeError::NotFound {
                name: name.to_string(),
            });
        };

        if archetype.matches(host) {
            log::debug!("archetype '{}' already applied; nothing to do", name);
            return Ok(());
        }

        host.remove_all_components();
        for type_name in archetype.iter() {
            host.add_component(type_name)?;
        }
        Ok(())
    }

    /// Erase a named archetype and rewrite the file.
    pub fn remove(&mut self, name: &str) -> Result<(), ArchetypeError> {
        if !self.archetypes.contains_key(name) {
            return Err(ArchetypeError::NotFound {
                name: name.to_string(),
            });
        }
        let backup = self.archetypes.clone();
        self.archetypes.remove(name);
        self.persist_or_restore(backup)
    }

    /// Rename an archetype: one atomic map mutation, then one file rewrite.
    ///
    /// There is no intermediate state with both names present — a failed
    /// rewrite restores the old name in memory and leaves the old file.
    pub fn rename(&mut self, old: &str, new: impl Into<String>) -> Result<(), ArchetypeError> {
        let new = new.into();
        if !self.archetypes.contains_key(old) {
            return Err(ArchetypeError::NotFound {
                name: old.to_string(),
            });
        }

        let backup = self.archetypes.clone();
        if let Some(mut archetype) = self.archetypes.remove(old) {
            archetype.set_name(new.clone());
            self.archetypes.insert(new, archetype);
        }
        self.persist_or_restore(backup)
    }

    /// Does the live object's component set equal the named archetype's set?
    pub fn is_archetype(
        &self,
        name: &str,
        host: &dyn ComponentHost,
    ) -> Result<bool, ArchetypeError> {
        let Some(archetype) = self.archetypes.get(name) else {
            return Err(ArchetypeError::NotFound {
                name: name.to_string(),
            });
        };
        Ok(archetype.matches(host))
    }

    /// The saved archetype with this name, if any.
    pub fn get(&self, name: &str) -> Option<&Archetype> {
        self.archetypes.get(name)
    }

    /// Saved names, sorted.
    pub fn names(&self) -> Vec<&str> {
        self.archetypes.keys().map(|s| s.as_str()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Archetype)> {
        self.archetypes.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.archetypes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.archetypes.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================

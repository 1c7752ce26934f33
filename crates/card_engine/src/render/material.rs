//! Material system for card fragments
//!
//! Materials here are surface descriptions only: color, finish and
//! visibility. Fragments share them through `Rc`, and the scene keeps one
//! reference-counted library entry per distinct material so a material
//! shared by several fragments (the frame segments) is released exactly
//! once, when its last user goes away.

use std::collections::HashMap;
use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

/// Base color of the card body
pub const BASE_COLOR: u32 = 0xffffff;

/// Color shared by all frame segments
pub const FRAME_COLOR: u32 = 0xcccccc;

new_key_type! {
    /// Handle to a material entry in a [`MaterialLibrary`]
    pub struct MaterialId;
}

/// Surface properties of a fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Display name
    pub name: String,

    /// Base color as 0xRRGGBB
    pub color: u32,
    
    /// Roughness factor (0.0 = mirror, 1.0 = completely rough)
    pub roughness: f32,

    /// Metallic factor (0.0 = dielectric, 1.0 = metallic)
    pub metalness: f32,

    /// Invisible materials are hit-testable but never drawn or exported
    pub visible: bool,
}

impl Material {
    /// Create a new opaque material with a matte finish
    pub fn new(name: impl Into<String>, color: u32) -> Self {
        Self {
            name: name.into(),
            color: color & 0x00ff_ffff,
            roughness: 0.5,
            metalness: 0.1,
            visible: true,
        }
    }

    /// Material for hit-test proxies
    pub fn invisible(name: impl Into<String>) -> Self {
        Self {
            visible: false,
            ..Self::new(name, 0x000000)
        }
    }
    
    /// Set the roughness factor
    pub fn with_roughness(mut self, roughness: f32) -> Self {
        self.roughness = roughness.clamp(0.0, 1.0);
        self
    }

    /// Set the metallic factor
    pub fn with_metalness(mut self, metalness: f32) -> Self {
        self.metalness = metalness.clamp(0.0, 1.0);
        self
    }
}

struct MaterialEntry {
    material: Rc<Material>,
    refs: usize,
}

/// Reference-counted material storage
///
/// Materials are interned by `Rc` identity: inserting the same `Rc` twice
/// yields the same [`MaterialId`] and bumps its count.
#[derive(Default)]
pub struct MaterialLibrary {
    entries: SlotMap<MaterialId, MaterialEntry>,
    by_pointer: HashMap<*const Material, MaterialId>,
}

impl MaterialLibrary {
    /// Create an empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a reference on `material`, registering it on first use
    pub fn acquire(&mut self, material: &Rc<Material>) -> MaterialId {
        let pointer = Rc::as_ptr(material);
        if let Some(&id) = self.by_pointer.get(&pointer) {
            if let Some(entry) = self.entries.get_mut(id) {
                entry.refs += 1;
                return id;
            }
        }

        let id = self.entries.insert(MaterialEntry {
            material: Rc::clone(material),
            refs: 1,
        });
        self.by_pointer.insert(pointer, id);
        id
    }

    /// Drop one reference; returns the remaining count, `None` if unknown
    ///
    /// The entry is removed when the count reaches zero.
    pub fn release(&mut self, id: MaterialId) -> Option<usize> {
        let entry = self.entries.get_mut(id)?;
        entry.refs -= 1;
        let remaining = entry.refs;
        if remaining == 0 {
            if let Some(entry) = self.entries.remove(id) {
                self.by_pointer.remove(&Rc::as_ptr(&entry.material));
                log::trace!("Released material '{}'", entry.material.name);
            }
        }
        Some(remaining)
    }

    /// Look up a live material
    pub fn get(&self, id: MaterialId) -> Option<&Rc<Material>> {
        self.entries.get(id).map(|entry| &entry.material)
    }

    /// Current reference count of a material
    pub fn ref_count(&self, id: MaterialId) -> usize {
        self.entries.get(id).map_or(0, |entry| entry.refs)
    }

    /// Number of distinct live materials
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no material is live
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for MaterialLibrary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaterialLibrary")
            .field("live", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shared_material_interned_once() {
        let mut library = MaterialLibrary::new();
        let frame = Rc::new(Material::new("frame", FRAME_COLOR));

        let ids: Vec<_> = (0..4).map(|_| library.acquire(&frame)).collect();
        assert!(ids.iter().all(|&id| id == ids[0]));
        assert_eq!(library.len(), 1);
        assert_eq!(library.ref_count(ids[0]), 4);
    }

    #[test]
    fn test_release_removes_on_last_reference() {
        let mut library = MaterialLibrary::new();
        let frame = Rc::new(Material::new("frame", FRAME_COLOR));
        let id = library.acquire(&frame);
        library.acquire(&frame);

        assert_eq!(library.release(id), Some(1));
        assert!(library.get(id).is_some());
        assert_eq!(library.release(id), Some(0));
        assert!(library.get(id).is_none());
        assert!(library.is_empty());
        assert_eq!(library.release(id), None);
    }

    #[test]
    fn test_equal_but_distinct_materials_are_separate() {
        let mut library = MaterialLibrary::new();
        let a = library.acquire(&Rc::new(Material::new("base", BASE_COLOR)));
        let b = library.acquire(&Rc::new(Material::new("base", BASE_COLOR)));
        assert_ne!(a, b);
        assert_eq!(library.len(), 2);
    }
}

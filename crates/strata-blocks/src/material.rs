use std::collections::HashMap;

use crate::types::MaterialId;

#[derive(Clone, Debug)]
pub struct Material {
    pub id: MaterialId,
    pub key: String,
    pub render_tag: Option<String>,
}

/// Materials referenced by block types. Id 0 is reserved as the fallback
/// material for blocks that don't name one.
#[derive(Clone, Debug)]
pub struct MaterialCatalog {
    pub materials: Vec<Material>,
    pub by_key: HashMap<String, MaterialId>,
}

impl Default for MaterialCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialCatalog {
    pub fn new() -> Self {
        Self {
            materials: vec![Material {
                id: MaterialId(0),
                key: String::new(),
                render_tag: None,
            }],
            by_key: HashMap::new(),
        }
    }

    pub fn get_id(&self, key: &str) -> Option<MaterialId> {
        self.by_key.get(key).copied()
    }

    pub fn get(&self, id: MaterialId) -> Option<&Material> {
        self.materials.get(id.0 as usize)
    }

    /// Returns the id for `key`, registering it on first sight.
    pub fn intern(&mut self, key: &str, render_tag: Option<String>) -> MaterialId {
        if let Some(id) = self.by_key.get(key) {
            return *id;
        }
        let id = MaterialId(self.materials.len() as u16);
        self.by_key.insert(key.to_string(), id);
        self.materials.push(Material {
            id,
            key: key.to_string(),
            render_tag,
        });
        id
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.len() <= 1
    }
}

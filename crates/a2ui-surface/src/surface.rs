use a2ui_protocol::Component;
use a2ui_protocol::SurfaceOp;
use a2ui_validate::ReferenceMap;
use rustc_hash::FxHashMap;
use serde_json::Map;
use serde_json::Value;

use crate::ComponentNode;
use crate::DataModel;
use crate::DataModelError;
use crate::TreeBuilder;

/// One independently updated UI document: raw components, a data model and
/// the tree resolved from them.
#[derive(Clone, Debug, PartialEq)]
pub struct Surface {
    surface_id: String,
    root_id: Option<String>,
    components: FxHashMap<String, Component>,
    data_model: DataModel,
    styles: Value,
    catalog_id: Option<String>,
    component_tree: Option<ComponentNode>,
}

impl Surface {
    #[must_use]
    pub fn new(surface_id: impl Into<String>) -> Self {
        Self {
            surface_id: surface_id.into(),
            root_id: None,
            components: FxHashMap::default(),
            data_model: DataModel::new(),
            styles: Value::Object(Map::new()),
            catalog_id: None,
            component_tree: None,
        }
    }

    #[must_use]
    pub fn surface_id(&self) -> &str {
        &self.surface_id
    }

    #[must_use]
    pub fn root_id(&self) -> Option<&str> {
        self.root_id.as_deref()
    }

    #[must_use]
    pub fn components(&self) -> &FxHashMap<String, Component> {
        &self.components
    }

    #[must_use]
    pub fn component(&self, id: &str) -> Option<&Component> {
        self.components.get(id)
    }

    #[must_use]
    pub fn data_model(&self) -> &DataModel {
        &self.data_model
    }

    #[must_use]
    pub fn styles(&self) -> &Value {
        &self.styles
    }

    #[must_use]
    pub fn catalog_id(&self) -> Option<&str> {
        self.catalog_id.as_deref()
    }

    #[must_use]
    pub fn component_tree(&self) -> Option<&ComponentNode> {
        self.component_tree.as_ref()
    }

    /// Apply `op` to the raw state. `Delete` is the store's business and is
    /// ignored here.
    pub fn apply(&mut self, op: SurfaceOp) -> Result<(), DataModelError> {
        match op {
            SurfaceOp::Begin {
                root,
                styles,
                catalog_id,
                ..
            } => {
                self.root_id = Some(root);
                self.styles = styles;
                if catalog_id.is_some() {
                    self.catalog_id = catalog_id;
                }
            }
            SurfaceOp::Upsert { components, .. } => {
                for component in components {
                    self.components.insert(component.id.clone(), component);
                }
            }
            SurfaceOp::SetData { path, value, .. } => self.data_model.set(&path, value)?,
            SurfaceOp::RemoveData { path, .. } => {
                self.data_model.remove(&path)?;
            }
            SurfaceOp::Delete { .. } => {}
        }
        Ok(())
    }

    fn without_tree(&self) -> Self {
        Self {
            surface_id: self.surface_id.clone(),
            root_id: self.root_id.clone(),
            components: self.components.clone(),
            data_model: self.data_model.clone(),
            styles: self.styles.clone(),
            catalog_id: self.catalog_id.clone(),
            component_tree: None,
        }
    }

    pub(crate) fn data_model_mut(&mut self) -> &mut DataModel {
        &mut self.data_model
    }

    /// Recompute the resolved tree from scratch. Without a root, or with a
    /// root that names no known component, the surface has no tree.
    pub fn rebuild(&mut self, references: &ReferenceMap) {
        self.component_tree = self.root_id.as_deref().and_then(|root| {
            TreeBuilder::new(&self.components, &self.data_model, references).build(root)
        });
        tracing::debug!(
            surface = %self.surface_id,
            built = self.component_tree.is_some(),
            "Rebuilt component tree"
        );
    }
}

/// All live surfaces, keyed by surface id.
#[derive(Clone, Debug, Default)]
pub struct SurfaceStore {
    surfaces: FxHashMap<String, Surface>,
}

impl SurfaceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, surface_id: &str) -> Option<&Surface> {
        self.surfaces.get(surface_id)
    }

    /// A copy of the named surface to apply changes to, or a fresh surface
    /// when it does not exist yet.
    ///
    /// The copy has no resolved tree; rebuild it before committing.
    #[must_use]
    pub fn working_copy(&self, surface_id: &str) -> Surface {
        self.surfaces
            .get(surface_id)
            .map_or_else(|| Surface::new(surface_id), Surface::without_tree)
    }

    /// Insert or replace a surface, returning the previous one.
    pub fn commit(&mut self, surface: Surface) -> Option<Surface> {
        self.surfaces.insert(surface.surface_id.clone(), surface)
    }

    pub fn remove(&mut self, surface_id: &str) -> Option<Surface> {
        self.surfaces.remove(surface_id)
    }

    pub fn clear(&mut self) {
        self.surfaces.clear();
    }

    #[must_use]
    pub fn contains(&self, surface_id: &str) -> bool {
        self.surfaces.contains_key(surface_id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Surface)> {
        self.surfaces.iter().map(|(id, surface)| (id.as_str(), surface))
    }
}

#[cfg(test)]
mod tests {
    use a2ui_validate::standard_catalog;
    use serde_json::json;

    use super::*;

    fn upsert(components: Vec<Component>) -> SurfaceOp {
        SurfaceOp::Upsert {
            surface_id: "s".to_string(),
            components,
        }
    }

    fn begin(root: &str) -> SurfaceOp {
        SurfaceOp::Begin {
            surface_id: "s".to_string(),
            root: root.to_string(),
            styles: json!({"primaryColor": "#00f"}),
            catalog_id: None,
        }
    }

    #[test]
    fn upsert_replaces_by_id() {
        let mut surface = Surface::new("s");
        surface
            .apply(upsert(vec![Component::new("a", "Text")]))
            .unwrap();
        surface
            .apply(upsert(vec![Component::new("a", "Image")]))
            .unwrap();

        assert_eq!(surface.components().len(), 1);
        assert_eq!(surface.component("a").unwrap().component_type, "Image");
    }

    #[test]
    fn begin_keeps_existing_components() {
        let mut surface = Surface::new("s");
        surface
            .apply(upsert(vec![Component::new("root", "Column")]))
            .unwrap();
        surface.apply(begin("root")).unwrap();

        assert_eq!(surface.root_id(), Some("root"));
        assert_eq!(surface.styles(), &json!({"primaryColor": "#00f"}));
        assert!(surface.component("root").is_some());
    }

    #[test]
    fn no_tree_without_root_or_root_component() {
        let references = standard_catalog();
        let mut surface = Surface::new("s");
        surface
            .apply(upsert(vec![Component::new("root", "Column")]))
            .unwrap();
        surface.rebuild(&references);
        assert!(surface.component_tree().is_none());

        surface.apply(begin("main")).unwrap();
        surface.rebuild(&references);
        assert!(surface.component_tree().is_none());

        surface.apply(begin("root")).unwrap();
        surface.rebuild(&references);
        assert_eq!(surface.component_tree().unwrap().id, "root");
    }

    #[test]
    fn store_working_copy_is_detached() {
        let mut store = SurfaceStore::new();
        store.commit(Surface::new("s"));

        let mut copy = store.working_copy("s");
        copy.apply(upsert(vec![Component::new("a", "Text")])).unwrap();

        assert!(store.get("s").unwrap().components().is_empty());
        assert_eq!(store.working_copy("other").surface_id(), "other");
        assert!(!store.contains("other"));
    }

    #[test]
    fn working_copy_leaves_the_tree_behind() {
        let references = standard_catalog();
        let mut surface = Surface::new("s");
        surface
            .apply(upsert(vec![Component::new("root", "Column")]))
            .unwrap();
        surface.apply(begin("root")).unwrap();
        surface.rebuild(&references);

        let mut store = SurfaceStore::new();
        store.commit(surface.clone());

        let mut copy = store.working_copy("s");
        assert!(copy.component_tree().is_none());
        assert_eq!(copy.root_id(), Some("root"));
        assert!(copy.component("root").is_some());
        assert!(store.get("s").unwrap().component_tree().is_some());

        copy.rebuild(&references);
        assert_eq!(copy, surface);
    }
}

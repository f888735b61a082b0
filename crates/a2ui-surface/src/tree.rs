use std::collections::BTreeMap;

use a2ui_protocol::component::CHILD;
use a2ui_protocol::component::CHILDREN;
use a2ui_protocol::pointer;
use a2ui_protocol::BoundValue;
use a2ui_protocol::ChildList;
use a2ui_protocol::Component;
use a2ui_validate::ReferenceMap;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value;

use crate::DataModel;

/// Nodes one rebuild may produce before the rest of the tree is dropped.
pub const DEFAULT_NODE_LIMIT: usize = 50_000;

/// A component after data binding and template expansion.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentNode {
    pub id: String,
    #[serde(rename = "type")]
    pub component_type: String,
    pub properties: BTreeMap<String, ResolvedValue>,
    pub children: Vec<ComponentNode>,
    pub data_context_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
}

impl ComponentNode {
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&ResolvedValue> {
        self.properties.get(name)
    }

    /// Depth-first search for a node by its (suffixed) id.
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ComponentNode> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id == id {
                return Some(node);
            }
            stack.extend(node.children.iter().rev());
            for value in node.properties.values() {
                match value {
                    ResolvedValue::Component(child) => stack.push(child),
                    ResolvedValue::Components(children) => stack.extend(children.iter().rev()),
                    ResolvedValue::Value(_) => {}
                }
            }
        }
        None
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    Value(Value),
    /// A property naming a single component, other than `child`.
    Component(Box<ComponentNode>),
    /// A property naming a list of components, other than `children`.
    Components(Vec<ComponentNode>),
}

impl ResolvedValue {
    #[must_use]
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NodeId(u32);

impl NodeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Where a finished node is attached once its children are complete.
#[derive(Clone, Copy, Debug)]
enum Target {
    Root,
    Child {
        parent: NodeId,
        slot: usize,
    },
    Property {
        parent: NodeId,
        property: usize,
        slot: usize,
    },
}

/// A component reference property waiting for its nodes.
#[derive(Debug)]
struct PendingProperty {
    name: String,
    single: bool,
    slots: Vec<Option<ComponentNode>>,
}

#[derive(Debug)]
struct Draft {
    node: ComponentNode,
    /// Un-suffixed component id, for cycle detection.
    component_id: String,
    parent: Option<NodeId>,
    target: Target,
    child_slots: Vec<Option<ComponentNode>>,
    pending: Vec<PendingProperty>,
}

impl Draft {
    fn finish(mut self) -> ComponentNode {
        self.node.children = self.child_slots.into_iter().flatten().collect();
        for property in self.pending {
            let mut nodes = property.slots.into_iter().flatten();
            let resolved = if property.single {
                nodes.next().map(|node| ResolvedValue::Component(Box::new(node)))
            } else {
                Some(ResolvedValue::Components(nodes.collect()))
            };
            if let Some(resolved) = resolved {
                self.node.properties.insert(property.name, resolved);
            }
        }
        self.node
    }
}

#[derive(Debug)]
struct Task {
    component_id: String,
    suffix: String,
    context: String,
    parent: Option<NodeId>,
    target: Target,
}

impl Task {
    /// A task for a component referenced by the node `parent` is building.
    fn referenced(component_id: &str, parent: &Task, context: String, key: Option<&str>) -> Self {
        let suffix = match key {
            Some(key) => format!("{}:{key}", parent.suffix),
            None => parent.suffix.clone(),
        };
        Self {
            component_id: component_id.to_string(),
            suffix,
            context,
            parent: None,
            target: Target::Root,
        }
    }
}

#[derive(Debug, Default)]
struct Drafts(Vec<Option<Draft>>);

impl Drafts {
    fn next_id(&self) -> NodeId {
        NodeId(u32::try_from(self.0.len()).unwrap_or(u32::MAX))
    }

    fn len(&self) -> usize {
        self.0.len()
    }

    fn push(&mut self, draft: Draft) {
        self.0.push(Some(draft));
    }

    fn get(&self, id: NodeId) -> Option<&Draft> {
        self.0.get(id.index()).and_then(Option::as_ref)
    }

    fn get_mut(&mut self, id: NodeId) -> Option<&mut Draft> {
        self.0.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Whether `(component_id, context)` is already being built on the path
    /// from the root to `parent`.
    fn on_path(&self, mut parent: Option<NodeId>, component_id: &str, context: &str) -> bool {
        while let Some(draft) = parent.and_then(|id| self.get(id)) {
            if draft.component_id == component_id && draft.node.data_context_path == context {
                return true;
            }
            parent = draft.parent;
        }
        false
    }
}

/// Resolves a surface's raw components into a [`ComponentNode`] tree.
///
/// Nodes are expanded with an explicit work stack into an arena and then
/// assembled bottom-up, so deep or wide template expansions never grow the
/// call stack. A component reached again through its own ancestors under the
/// same data context is a cycle and is dropped; the same component under a
/// different context (one per template item) is not.
///
/// Shared references can still multiply a small payload into a huge tree, so
/// at most `node_limit` nodes are built; the rest are dropped with a warning.
pub struct TreeBuilder<'a> {
    components: &'a FxHashMap<String, Component>,
    data: &'a DataModel,
    references: &'a ReferenceMap,
    node_limit: usize,
}

impl<'a> TreeBuilder<'a> {
    #[must_use]
    pub fn new(
        components: &'a FxHashMap<String, Component>,
        data: &'a DataModel,
        references: &'a ReferenceMap,
    ) -> Self {
        Self {
            components,
            data,
            references,
            node_limit: DEFAULT_NODE_LIMIT,
        }
    }

    #[must_use]
    pub fn with_node_limit(mut self, node_limit: usize) -> Self {
        self.node_limit = node_limit;
        self
    }

    /// Build the tree rooted at `root_id`, or `None` when the root is not a
    /// known component.
    #[must_use]
    pub fn build(&self, root_id: &str) -> Option<ComponentNode> {
        let mut drafts = Drafts::default();
        let mut stack = vec![Task {
            component_id: root_id.to_string(),
            suffix: String::new(),
            context: pointer::ROOT.to_string(),
            parent: None,
            target: Target::Root,
        }];

        while let Some(task) = stack.pop() {
            let Some(component) = self.components.get(&task.component_id) else {
                tracing::trace!(id = %task.component_id, "Dropping reference to missing component");
                continue;
            };
            if drafts.on_path(task.parent, &task.component_id, &task.context) {
                tracing::warn!(
                    id = %task.component_id,
                    context = %task.context,
                    "Circular component reference; dropping node"
                );
                continue;
            }

            if drafts.len() >= self.node_limit {
                tracing::warn!(
                    limit = self.node_limit,
                    pending = stack.len() + 1,
                    "Component tree exceeds node limit; truncating"
                );
                break;
            }

            let id = drafts.next_id();
            let (draft, children) = self.expand(component, &task, id);
            drafts.push(draft);
            stack.extend(children.into_iter().rev());
        }

        assemble(drafts)
    }

    /// Resolve one component's plain properties and list the tasks for the
    /// components it references, attached to the draft `id`.
    fn expand(&self, component: &Component, task: &Task, id: NodeId) -> (Draft, Vec<Task>) {
        let mut node = ComponentNode {
            id: format!("{}{}", component.id, task.suffix),
            component_type: component.component_type.clone(),
            properties: BTreeMap::new(),
            children: Vec::new(),
            data_context_path: task.context.clone(),
            weight: component.weight,
        };
        let mut children = Vec::new();
        let mut child_slots = 0;
        let mut pending = Vec::new();

        for (name, value) in &component.properties {
            let is_child_field = name == CHILD || name == CHILDREN;
            let is_single =
                name == CHILD || self.references.is_single(&component.component_type, name);
            let is_list =
                name == CHILDREN || self.references.is_list(&component.component_type, name);

            let referenced = if is_single {
                value
                    .as_str()
                    .map(|child| vec![Task::referenced(child, task, task.context.clone(), None)])
            } else if is_list {
                ChildList::from_value(value).map(|list| self.list_tasks(&list, task))
            } else {
                None
            };

            let Some(mut tasks) = referenced else {
                node.properties.insert(
                    name.clone(),
                    ResolvedValue::Value(self.resolve(value, &task.context)),
                );
                continue;
            };

            if is_child_field {
                for child in &mut tasks {
                    child.target = Target::Child {
                        parent: id,
                        slot: child_slots,
                    };
                    child_slots += 1;
                }
            } else {
                let property = pending.len();
                for (slot, child) in tasks.iter_mut().enumerate() {
                    child.target = Target::Property {
                        parent: id,
                        property,
                        slot,
                    };
                }
                pending.push(PendingProperty {
                    name: name.clone(),
                    single: is_single,
                    slots: std::iter::repeat_with(|| None).take(tasks.len()).collect(),
                });
            }
            for child in &mut tasks {
                child.parent = Some(id);
            }
            children.extend(tasks);
        }

        let draft = Draft {
            node,
            component_id: component.id.clone(),
            parent: task.parent,
            target: task.target,
            child_slots: std::iter::repeat_with(|| None).take(child_slots).collect(),
            pending,
        };
        (draft, children)
    }

    fn list_tasks(&self, list: &ChildList<'_>, parent: &Task) -> Vec<Task> {
        match list {
            ChildList::Explicit(ids) => ids
                .iter()
                .map(|id| Task::referenced(id, parent, parent.context.clone(), None))
                .collect(),
            ChildList::Template {
                component_id,
                data_binding,
            } => {
                let path = pointer::resolve(data_binding, &parent.context);
                let keys: Vec<String> = match self.data.get(&path) {
                    Some(Value::Object(map)) => map.keys().cloned().collect(),
                    Some(Value::Array(items)) => (0..items.len()).map(|i| i.to_string()).collect(),
                    _ => Vec::new(),
                };
                keys.iter()
                    .map(|key| {
                        let context = pointer::child(&path, key);
                        Task::referenced(component_id, parent, context, Some(key))
                    })
                    .collect()
            }
        }
    }

    /// Resolve a plain property value against the data context.
    fn resolve(&self, value: &Value, context: &str) -> Value {
        match BoundValue::classify(value) {
            BoundValue::Literal(literal) => literal.clone(),
            BoundValue::Path { path, fallback } => {
                let absolute = pointer::resolve(path, context);
                self.data
                    .get(&absolute)
                    .or(fallback)
                    .cloned()
                    .unwrap_or_else(|| Value::String(String::new()))
            }
            BoundValue::Plain(plain) => plain.clone(),
        }
    }
}

/// Attach every draft to its parent, newest first. Children are always
/// allocated after their parent, so each draft is complete when it is taken.
fn assemble(mut drafts: Drafts) -> Option<ComponentNode> {
    let mut root = None;
    for index in (0..drafts.0.len()).rev() {
        let Some(draft) = drafts.0[index].take() else {
            continue;
        };
        let target = draft.target;
        let node = draft.finish();
        match target {
            Target::Root => root = Some(node),
            Target::Child { parent, slot } => {
                if let Some(slot) = drafts
                    .get_mut(parent)
                    .and_then(|parent| parent.child_slots.get_mut(slot))
                {
                    *slot = Some(node);
                }
            }
            Target::Property {
                parent,
                property,
                slot,
            } => {
                if let Some(slot) = drafts
                    .get_mut(parent)
                    .and_then(|parent| parent.pending.get_mut(property))
                    .and_then(|property| property.slots.get_mut(slot))
                {
                    *slot = Some(node);
                }
            }
        }
    }
    root
}

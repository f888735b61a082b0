use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;

use a2ui_conf::Settings;
use a2ui_conf::TrustMode;
use a2ui_protocol::pointer;
use a2ui_protocol::Message;
use a2ui_protocol::SurfaceOp;
use a2ui_validate::standard_catalog;
use a2ui_validate::RecursionLimits;
use a2ui_validate::ReferenceMap;
use a2ui_validate::Validator;
use serde_json::Value;

use crate::ComponentNode;
use crate::ProcessError;
use crate::Surface;
use crate::SurfaceStore;

/// Applies protocol messages to a [`SurfaceStore`].
///
/// In [`TrustMode::Validate`] every message goes through the structural
/// validator first and is rejected on the first violation. In
/// [`TrustMode::Permissive`] messages are applied as they come and the tree
/// builder drops whatever does not resolve.
///
/// Each message is applied to a working copy of its surface, which replaces
/// the live surface only once the whole message has succeeded.
#[derive(Debug)]
pub struct MessageProcessor {
    store: SurfaceStore,
    references: ReferenceMap,
    validator: Option<Validator>,
}

impl Default for MessageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageProcessor {
    /// A permissive processor using the standard component catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::with_references(standard_catalog())
    }

    #[must_use]
    pub fn with_references(references: ReferenceMap) -> Self {
        Self {
            store: SurfaceStore::new(),
            references,
            validator: None,
        }
    }

    /// A validating processor. The validator's reference table, layered
    /// over the standard catalog, also drives tree building.
    #[must_use]
    pub fn with_validator(validator: Validator) -> Self {
        let mut references = standard_catalog();
        references.merge(validator.references().clone());
        Self {
            store: SurfaceStore::new(),
            references,
            validator: Some(validator),
        }
    }

    /// Build a processor from loaded settings, compiling `schema` when one is
    /// given.
    pub fn from_settings(settings: &Settings, schema: Option<&Value>) -> Result<Self, ProcessError> {
        let validation = settings.validation();
        let limits = RecursionLimits {
            max_global_depth: validation.max_global_depth(),
            max_function_call_depth: validation.max_function_call_depth(),
        };

        let processor = match settings.trust() {
            TrustMode::Validate => {
                let validator = match schema {
                    Some(schema) => Validator::new(schema)?,
                    None => Validator::structural(standard_catalog()),
                };
                Self::with_validator(validator.with_limits(limits))
            }
            TrustMode::Permissive => {
                let mut references = standard_catalog();
                if let Some(schema) = schema {
                    references.merge(ReferenceMap::from_schema(schema));
                }
                Self::with_references(references)
            }
        };
        tracing::debug!(trust = ?processor.trust(), "Created message processor");
        Ok(processor)
    }

    #[must_use]
    pub fn trust(&self) -> TrustMode {
        if self.validator.is_some() {
            TrustMode::Validate
        } else {
            TrustMode::Permissive
        }
    }

    #[must_use]
    pub fn references(&self) -> &ReferenceMap {
        &self.references
    }

    /// Validate (when configured), decode and apply one raw message.
    pub fn process_value(&mut self, value: Value) -> Result<(), ProcessError> {
        if let Some(validator) = &self.validator {
            validator.validate(&value)?;
        }
        let message = Message::from_value(value)?;
        self.apply(message)
    }

    pub fn process_str(&mut self, text: &str) -> Result<(), ProcessError> {
        let value: Value =
            serde_json::from_str(text).map_err(a2ui_protocol::ProtocolError::from)?;
        self.process_value(value)
    }

    /// Process messages in order, stopping at the first failure. Messages
    /// before the failing one stay applied.
    pub fn process_messages<I>(&mut self, messages: I) -> Result<usize, ProcessError>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut applied = 0;
        for (index, message) in messages.into_iter().enumerate() {
            self.process_value(message)
                .map_err(|source| ProcessError::Batch {
                    index,
                    source: Box::new(source),
                })?;
            applied += 1;
        }
        Ok(applied)
    }

    /// Apply an already decoded message without validating it.
    pub fn apply(&mut self, message: Message) -> Result<(), ProcessError> {
        tracing::debug!(
            kind = message.kind(),
            surface = message.surface_id(),
            "Applying message"
        );
        self.apply_op(message.into_op())
    }

    fn apply_op(&mut self, op: SurfaceOp) -> Result<(), ProcessError> {
        if let SurfaceOp::Delete { surface_id } = &op {
            if self.store.remove(surface_id).is_none() {
                tracing::debug!(surface = %surface_id, "Delete for unknown surface");
            }
            return Ok(());
        }

        let mut surface = self.store.working_copy(op.surface_id());
        if let Err(err) = surface.apply(op) {
            tracing::warn!(surface = %surface.surface_id(), error = %err, "Data model update rejected");
            return Err(err.into());
        }
        surface.rebuild(&self.references);
        self.store.commit(surface);
        Ok(())
    }

    #[must_use]
    pub fn surfaces(&self) -> &SurfaceStore {
        &self.store
    }

    #[must_use]
    pub fn surface(&self, surface_id: &str) -> Option<&Surface> {
        self.store.get(surface_id)
    }

    #[must_use]
    pub fn tree(&self, surface_id: &str) -> Option<&ComponentNode> {
        self.surface(surface_id)?.component_tree()
    }

    pub fn clear_surfaces(&mut self) {
        self.store.clear();
    }

    /// Read data relative to `node`'s data context; `"."` and `""` address
    /// the context itself.
    #[must_use]
    pub fn get_data(&self, surface_id: &str, node: &ComponentNode, path: &str) -> Option<&Value> {
        let absolute = pointer::resolve(path, &node.data_context_path);
        self.surface(surface_id)?.data_model().get(&absolute)
    }

    /// Write data relative to `node`'s data context and rebuild the surface.
    pub fn set_data(
        &mut self,
        surface_id: &str,
        node: &ComponentNode,
        path: &str,
        value: Value,
    ) -> Result<(), ProcessError> {
        if !self.store.contains(surface_id) {
            return Err(ProcessError::UnknownSurface {
                surface_id: surface_id.to_string(),
            });
        }
        let absolute = pointer::resolve(path, &node.data_context_path);

        let mut surface = self.store.working_copy(surface_id);
        surface.data_model_mut().set(&absolute, value)?;
        surface.rebuild(&self.references);
        self.store.commit(surface);
        Ok(())
    }
}

/// A [`MessageProcessor`] behind one coarse lock, for callers that feed it
/// from several threads.
#[derive(Clone, Debug, Default)]
pub struct SharedProcessor {
    inner: Arc<Mutex<MessageProcessor>>,
}

impl SharedProcessor {
    #[must_use]
    pub fn new(processor: MessageProcessor) -> Self {
        Self {
            inner: Arc::new(Mutex::new(processor)),
        }
    }

    /// A panic while holding the lock cannot leave a surface half applied,
    /// so a poisoned lock is recovered rather than propagated.
    fn lock(&self) -> MutexGuard<'_, MessageProcessor> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn process_value(&self, value: Value) -> Result<(), ProcessError> {
        self.lock().process_value(value)
    }

    pub fn process_str(&self, text: &str) -> Result<(), ProcessError> {
        self.lock().process_str(text)
    }

    pub fn process_messages<I>(&self, messages: I) -> Result<usize, ProcessError>
    where
        I: IntoIterator<Item = Value>,
    {
        self.lock().process_messages(messages)
    }

    /// A snapshot of the surface's resolved tree.
    #[must_use]
    pub fn tree(&self, surface_id: &str) -> Option<ComponentNode> {
        self.lock().tree(surface_id).cloned()
    }

    /// A snapshot of the value at an absolute data path.
    #[must_use]
    pub fn data(&self, surface_id: &str, path: &str) -> Option<Value> {
        self.lock()
            .surface(surface_id)?
            .data_model()
            .get(path)
            .cloned()
    }

    /// Run `f` with exclusive access to the processor.
    pub fn with<R>(&self, f: impl FnOnce(&mut MessageProcessor) -> R) -> R {
        f(&mut self.lock())
    }
}

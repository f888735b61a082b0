//! Server-to-client message envelopes.
//!
//! Both protocol generations are decoded here and normalised into a single
//! [`SurfaceOp`], so nothing downstream needs to know which generation a
//! message came from.

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde_json::Value;

use crate::component::ROOT_ID;
use crate::contents::decode_contents;
use crate::pointer;
use crate::Component;
use crate::ProtocolError;

/// Surface addressed by messages that omit `surfaceId`.
pub const DEFAULT_SURFACE_ID: &str = "@default";

fn default_surface_id() -> String {
    DEFAULT_SURFACE_ID.to_string()
}

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// A single inbound message. Exactly one top-level key selects the variant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Message {
    BeginRendering(BeginRendering),
    SurfaceUpdate(SurfaceUpdate),
    DataModelUpdate(DataModelUpdate),
    CreateSurface(CreateSurface),
    UpdateComponents(UpdateComponents),
    UpdateDataModel(UpdateDataModel),
    DeleteSurface(DeleteSurface),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeginRendering {
    #[serde(default = "default_surface_id")]
    pub surface_id: String,
    pub root: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub styles: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurfaceUpdate {
    #[serde(default = "default_surface_id")]
    pub surface_id: String,
    pub components: Vec<Component>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataModelUpdate {
    #[serde(default = "default_surface_id")]
    pub surface_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub contents: Value,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSurface {
    #[serde(default = "default_surface_id")]
    pub surface_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateComponents {
    #[serde(default = "default_surface_id")]
    pub surface_id: String,
    pub components: Vec<Component>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDataModel {
    #[serde(default = "default_surface_id")]
    pub surface_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Absent means "remove the key at `path`"; an explicit `null` is stored.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub value: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteSurface {
    #[serde(default = "default_surface_id")]
    pub surface_id: String,
}

/// Generation-independent effect of a message on one surface.
#[derive(Clone, Debug, PartialEq)]
pub enum SurfaceOp {
    /// Set the root pointer and presentation hints.
    Begin {
        surface_id: String,
        root: String,
        styles: Value,
        catalog_id: Option<String>,
    },
    /// Insert or replace components by id.
    Upsert {
        surface_id: String,
        components: Vec<Component>,
    },
    /// Store `value` at `path`; the root path replaces the whole model.
    SetData {
        surface_id: String,
        path: String,
        value: Value,
    },
    /// Remove the key at `path`.
    RemoveData { surface_id: String, path: String },
    /// Drop the surface.
    Delete { surface_id: String },
}

impl SurfaceOp {
    #[must_use]
    pub fn surface_id(&self) -> &str {
        match self {
            Self::Begin { surface_id, .. }
            | Self::Upsert { surface_id, .. }
            | Self::SetData { surface_id, .. }
            | Self::RemoveData { surface_id, .. }
            | Self::Delete { surface_id } => surface_id,
        }
    }
}

impl Message {
    /// Decode a message, reporting envelope problems before serde does.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        if let Value::Object(map) = &value {
            if map.len() != 1 {
                return Err(ProtocolError::Envelope { found: map.len() });
            }
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json(text: &str) -> Result<Self, ProtocolError> {
        Self::from_value(serde_json::from_str(text)?)
    }

    #[must_use]
    pub fn surface_id(&self) -> &str {
        match self {
            Self::BeginRendering(BeginRendering { surface_id, .. })
            | Self::SurfaceUpdate(SurfaceUpdate { surface_id, .. })
            | Self::DataModelUpdate(DataModelUpdate { surface_id, .. })
            | Self::CreateSurface(CreateSurface { surface_id, .. })
            | Self::UpdateComponents(UpdateComponents { surface_id, .. })
            | Self::UpdateDataModel(UpdateDataModel { surface_id, .. })
            | Self::DeleteSurface(DeleteSurface { surface_id }) => surface_id,
        }
    }

    /// Wire name of the envelope key.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BeginRendering(_) => "beginRendering",
            Self::SurfaceUpdate(_) => "surfaceUpdate",
            Self::DataModelUpdate(_) => "dataModelUpdate",
            Self::CreateSurface(_) => "createSurface",
            Self::UpdateComponents(_) => "updateComponents",
            Self::UpdateDataModel(_) => "updateDataModel",
            Self::DeleteSurface(_) => "deleteSurface",
        }
    }

    #[must_use]
    pub fn into_op(self) -> SurfaceOp {
        match self {
            Self::BeginRendering(BeginRendering {
                surface_id,
                root,
                styles,
            }) => SurfaceOp::Begin {
                surface_id,
                root,
                styles: styles.unwrap_or_else(empty_object),
                catalog_id: None,
            },
            Self::CreateSurface(CreateSurface {
                surface_id,
                catalog_id,
                theme,
            }) => SurfaceOp::Begin {
                surface_id,
                root: ROOT_ID.to_string(),
                styles: theme.unwrap_or_else(empty_object),
                catalog_id,
            },
            Self::SurfaceUpdate(SurfaceUpdate {
                surface_id,
                components,
            })
            | Self::UpdateComponents(UpdateComponents {
                surface_id,
                components,
            }) => SurfaceOp::Upsert {
                surface_id,
                components,
            },
            Self::DataModelUpdate(DataModelUpdate {
                surface_id,
                path,
                contents,
            }) => SurfaceOp::SetData {
                surface_id,
                path: path.unwrap_or_else(root_path),
                value: decode_contents(contents),
            },
            Self::UpdateDataModel(UpdateDataModel {
                surface_id,
                path,
                value,
            }) => {
                let path = path.unwrap_or_else(root_path);
                match value {
                    Some(value) => SurfaceOp::SetData {
                        surface_id,
                        path,
                        value,
                    },
                    None => SurfaceOp::RemoveData { surface_id, path },
                }
            }
            Self::DeleteSurface(DeleteSurface { surface_id }) => SurfaceOp::Delete { surface_id },
        }
    }
}

impl From<Message> for SurfaceOp {
    fn from(message: Message) -> Self {
        message.into_op()
    }
}

fn empty_object() -> Value {
    Value::Object(serde_json::Map::new())
}

fn root_path() -> String {
    pointer::ROOT.to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    mod decoding {
        use super::*;

        #[test]
        fn begin_rendering() {
            let message = Message::from_value(json!({
                "beginRendering": {"surfaceId": "main", "root": "root", "styles": {"font": "Inter"}}
            }))
            .unwrap();

            assert_eq!(message.kind(), "beginRendering");
            assert_eq!(message.surface_id(), "main");
        }

        #[test]
        fn missing_surface_id_uses_default() {
            let message = Message::from_value(json!({"deleteSurface": {}})).unwrap();
            assert_eq!(message.surface_id(), DEFAULT_SURFACE_ID);
        }

        #[test]
        fn two_envelope_keys_are_rejected() {
            let err = Message::from_value(json!({
                "deleteSurface": {"surfaceId": "a"},
                "beginRendering": {"surfaceId": "a", "root": "root"}
            }))
            .unwrap_err();
            assert!(matches!(err, ProtocolError::Envelope { found: 2 }));
        }

        #[test]
        fn unknown_envelope_key_is_rejected() {
            let err = Message::from_json(r#"{"blockInput": {}}"#).unwrap_err();
            assert!(matches!(err, ProtocolError::Decode(_)));
        }

        #[test]
        fn components_in_both_generations() {
            let older = Message::from_value(json!({
                "surfaceUpdate": {"surfaceId": "s", "components": [
                    {"id": "root", "component": {"Text": {"text": {"literalString": "x"}}}}
                ]}
            }))
            .unwrap();
            let newer = Message::from_value(json!({
                "updateComponents": {"surfaceId": "s", "components": [
                    {"id": "root", "component": "Text", "text": {"literalString": "x"}}
                ]}
            }))
            .unwrap();

            assert_eq!(older.into_op(), newer.into_op());
        }
    }

    mod operations {
        use super::*;

        #[test]
        fn create_surface_roots_at_root() {
            let op = Message::from_value(json!({
                "createSurface": {"surfaceId": "s", "catalogId": "standard", "theme": {"primary": "#fff"}}
            }))
            .unwrap()
            .into_op();

            assert_eq!(
                op,
                SurfaceOp::Begin {
                    surface_id: "s".to_string(),
                    root: "root".to_string(),
                    styles: json!({"primary": "#fff"}),
                    catalog_id: Some("standard".to_string()),
                }
            );
        }

        #[test]
        fn data_model_update_defaults_to_root_and_decodes_contents() {
            let op = Message::from_value(json!({
                "dataModelUpdate": {"surfaceId": "s", "contents": [{"key": "a", "valueNumber": 1}]}
            }))
            .unwrap()
            .into_op();

            assert_eq!(
                op,
                SurfaceOp::SetData {
                    surface_id: "s".to_string(),
                    path: "/".to_string(),
                    value: json!({"a": 1}),
                }
            );
        }

        #[test]
        fn update_data_model_without_value_removes() {
            let op = Message::from_value(json!({
                "updateDataModel": {"surfaceId": "s", "path": "/user/name"}
            }))
            .unwrap()
            .into_op();

            assert_eq!(
                op,
                SurfaceOp::RemoveData {
                    surface_id: "s".to_string(),
                    path: "/user/name".to_string(),
                }
            );
        }

        #[test]
        fn update_data_model_keeps_explicit_null() {
            let op = Message::from_value(json!({
                "updateDataModel": {"surfaceId": "s", "path": "/flag", "value": null}
            }))
            .unwrap()
            .into_op();

            assert!(matches!(op, SurfaceOp::SetData { value: Value::Null, .. }));
        }

        #[test]
        fn delete_addresses_its_surface() {
            let op = SurfaceOp::Delete {
                surface_id: "s".to_string(),
            };
            assert_eq!(op.surface_id(), "s");
        }
    }
}

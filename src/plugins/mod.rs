//! Plugin types, their registry and the base → concrete upgrade.
//!
//! A stored plugin is a `PluginRecord` (common columns, a type tag and a JSON
//! payload). `PluginRecord::resolve` turns it into a `ResolvedPlugin` holding the
//! matching `PluginContent` variant. The `PluginRegistry`, populated at startup,
//! then decides how that plugin is serialized, who may submit data to it, how the
//! data is validated and what happens to it.

pub mod builtin;
pub mod data;

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::{
    auth::Requester,
    error::AppResult,
    models::{PluginBase, PluginRecord},
    repository::Repository,
};

pub use builtin::{
    ContactFormPlugin, LinkPlugin, PicturePlugin, PollPlugin, TextPlugin, builtin_registry,
};
pub use data::{DataField, DataSerializer, FieldKind};

/// PluginContent
///
/// The closed set of concrete plugin variants. `Generic` carries payloads whose tag
/// is unknown or whose data does not decode; such plugins only ever get the base
/// representation.
#[derive(Debug, Clone, PartialEq)]
pub enum PluginContent {
    Text(TextPlugin),
    Link(LinkPlugin),
    Picture(PicturePlugin),
    ContactForm(ContactFormPlugin),
    Poll(PollPlugin),
    Generic(Value),
}

impl PluginContent {
    /// Decodes `data` into the variant named by `plugin_type`.
    pub fn decode(plugin_type: &str, data: &Value) -> Self {
        let decoded = match plugin_type {
            TextPlugin::TYPE => serde_json::from_value(data.clone()).map(PluginContent::Text),
            LinkPlugin::TYPE => serde_json::from_value(data.clone()).map(PluginContent::Link),
            PicturePlugin::TYPE => {
                serde_json::from_value(data.clone()).map(PluginContent::Picture)
            }
            ContactFormPlugin::TYPE => {
                serde_json::from_value(data.clone()).map(PluginContent::ContactForm)
            }
            PollPlugin::TYPE => serde_json::from_value(data.clone()).map(PluginContent::Poll),
            _ => {
                tracing::warn!(plugin_type, "unregistered plugin type");
                return PluginContent::Generic(data.clone());
            }
        };

        decoded.unwrap_or_else(|e| {
            tracing::warn!(plugin_type, error = %e, "plugin data does not match its type");
            PluginContent::Generic(data.clone())
        })
    }

    /// Tag of the concrete variant, `None` for `Generic`.
    pub fn concrete_type(&self) -> Option<&'static str> {
        match self {
            PluginContent::Text(_) => Some(TextPlugin::TYPE),
            PluginContent::Link(_) => Some(LinkPlugin::TYPE),
            PluginContent::Picture(_) => Some(PicturePlugin::TYPE),
            PluginContent::ContactForm(_) => Some(ContactFormPlugin::TYPE),
            PluginContent::Poll(_) => Some(PollPlugin::TYPE),
            PluginContent::Generic(_) => None,
        }
    }
}

/// ResolvedPlugin
///
/// A base record together with its concrete variant.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedPlugin {
    pub record: PluginRecord,
    pub content: PluginContent,
}

impl ResolvedPlugin {
    pub fn id(&self) -> i64 {
        self.record.id
    }

    pub fn plugin_type(&self) -> &str {
        &self.record.plugin_type
    }
}

impl PluginRecord {
    /// Upgrades the base record into its concrete variant.
    pub fn resolve(self) -> ResolvedPlugin {
        let content = PluginContent::decode(&self.plugin_type, &self.data);
        ResolvedPlugin {
            record: self,
            content,
        }
    }
}

/// Extracts a variant's own fields for a dedicated serializer. Returns `None` when
/// handed a variant the serializer was not written for.
pub type OwnFields = fn(&PluginContent) -> Option<Map<String, Value>>;

/// SerializerDescriptor
///
/// How a plugin is rendered: the common fields, plus the variant's own fields when
/// the descriptor is dedicated.
#[derive(Debug, Clone, Copy)]
pub struct SerializerDescriptor {
    pub name: &'static str,
    own_fields: Option<OwnFields>,
}

impl SerializerDescriptor {
    pub const BASE: SerializerDescriptor = SerializerDescriptor {
        name: "BasePluginSerializer",
        own_fields: None,
    };

    pub const fn dedicated(name: &'static str, own_fields: OwnFields) -> Self {
        Self {
            name,
            own_fields: Some(own_fields),
        }
    }

    pub fn is_base(&self) -> bool {
        self.own_fields.is_none()
    }

    pub fn serialize(&self, plugin: &ResolvedPlugin) -> Value {
        let mut body = match serde_json::to_value(PluginBase::from(&plugin.record)) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };

        if let Some(own) = self.own_fields.and_then(|f| f(&plugin.content)) {
            body.extend(own);
        }

        Value::Object(body)
    }
}

/// PermissionCheck
///
/// Object-level permission evaluated before `submit_data` touches a plugin.
#[derive(Debug, Clone, Copy)]
pub struct PermissionCheck {
    pub name: &'static str,
    pub check: fn(&Requester, &ResolvedPlugin) -> bool,
}

impl PermissionCheck {
    pub const IS_AUTHENTICATED: PermissionCheck = PermissionCheck {
        name: "is_authenticated",
        check: requester_is_authenticated,
    };
}

fn requester_is_authenticated(requester: &Requester, _plugin: &ResolvedPlugin) -> bool {
    requester.is_authenticated()
}

/// SubmissionHook
///
/// Custom processing of validated `submit_data` payloads. When a registration has a
/// hook, the default save path is not used.
#[async_trait]
pub trait SubmissionHook: Send + Sync {
    async fn process(
        &self,
        repo: &dyn Repository,
        requester: &Requester,
        plugin: &ResolvedPlugin,
        data: Value,
    ) -> AppResult<Value>;
}

/// PluginRegistration
///
/// Everything the API knows about one plugin type.
#[derive(Clone)]
pub struct PluginRegistration {
    pub plugin_type: &'static str,
    pub serializer: Option<SerializerDescriptor>,
    pub data_serializer: Option<DataSerializer>,
    pub permission_checks: Vec<PermissionCheck>,
    pub hook: Option<Arc<dyn SubmissionHook>>,
}

impl PluginRegistration {
    pub fn new(plugin_type: &'static str) -> Self {
        Self {
            plugin_type,
            serializer: None,
            data_serializer: None,
            permission_checks: Vec::new(),
            hook: None,
        }
    }

    pub fn with_serializer(mut self, serializer: SerializerDescriptor) -> Self {
        self.serializer = Some(serializer);
        self
    }

    pub fn with_data_serializer(mut self, data_serializer: DataSerializer) -> Self {
        self.data_serializer = Some(data_serializer);
        self
    }

    pub fn with_permission(mut self, check: PermissionCheck) -> Self {
        self.permission_checks.push(check);
        self
    }

    pub fn with_hook(mut self, hook: Arc<dyn SubmissionHook>) -> Self {
        self.hook = Some(hook);
        self
    }

    /// First failing check, if any. Checks run in registration order.
    pub fn failed_permission(
        &self,
        requester: &Requester,
        plugin: &ResolvedPlugin,
    ) -> Option<&'static str> {
        self.permission_checks
            .iter()
            .find(|p| !(p.check)(requester, plugin))
            .map(|p| p.name)
    }
}

/// PluginRegistry
///
/// Plugin type tag -> registration. Built once at startup and shared read-only.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    types: HashMap<&'static str, PluginRegistration>,
}

/// PluginRegistryState
///
/// The shared handle stored in `AppState`.
pub type PluginRegistryState = Arc<PluginRegistry>;

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a plugin type, replacing any earlier registration for the same tag.
    pub fn register(&mut self, registration: PluginRegistration) -> &mut Self {
        let tag = registration.plugin_type;
        if self.types.insert(tag, registration).is_some() {
            tracing::warn!(plugin_type = tag, "plugin type registered twice, keeping the last one");
        }
        self
    }

    pub fn get(&self, plugin_type: &str) -> Option<&PluginRegistration> {
        self.types.get(plugin_type)
    }

    pub fn plugin_types(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    /// resolve_serializer
    ///
    /// Dedicated serializer registered for `plugin_type`, or the base serializer.
    pub fn resolve_serializer(&self, plugin_type: &str) -> SerializerDescriptor {
        self.get(plugin_type)
            .and_then(|r| r.serializer)
            .unwrap_or(SerializerDescriptor::BASE)
    }

    /// Serializer for an already resolved plugin. Payloads that did not decode into
    /// their variant fall back to the base serializer.
    pub fn serializer_for(&self, plugin: &ResolvedPlugin) -> SerializerDescriptor {
        match plugin.content.concrete_type() {
            Some(plugin_type) => self.resolve_serializer(plugin_type),
            None => SerializerDescriptor::BASE,
        }
    }
}

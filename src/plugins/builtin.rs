//! Plugin types shipped with the API.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::{
    auth::Requester,
    error::AppResult,
    repository::Repository,
};

use super::{
    DataField, DataSerializer, FieldKind, PermissionCheck, PluginContent, PluginRegistration,
    PluginRegistry, ResolvedPlugin, SerializerDescriptor, SubmissionHook,
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPlugin {
    pub body: String,
}

impl TextPlugin {
    pub const TYPE: &'static str = "TextPlugin";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkPlugin {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub target: String,
}

impl LinkPlugin {
    pub const TYPE: &'static str = "LinkPlugin";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PicturePlugin {
    pub image: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub caption: Option<String>,
}

impl PicturePlugin {
    pub const TYPE: &'static str = "PicturePlugin";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactFormPlugin {
    pub title: String,
    // Delivery address for submissions, never rendered.
    #[serde(default, skip_serializing)]
    pub recipient: String,
}

impl ContactFormPlugin {
    pub const TYPE: &'static str = "ContactFormPlugin";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollPlugin {
    pub question: String,
    pub choices: Vec<String>,
}

impl PollPlugin {
    pub const TYPE: &'static str = "PollPlugin";
}

fn fields_of<T: Serialize>(value: &T) -> Option<Map<String, Value>> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

fn text_fields(content: &PluginContent) -> Option<Map<String, Value>> {
    match content {
        PluginContent::Text(text) => fields_of(text),
        _ => None,
    }
}

fn link_fields(content: &PluginContent) -> Option<Map<String, Value>> {
    match content {
        PluginContent::Link(link) => fields_of(link),
        _ => None,
    }
}

fn picture_fields(content: &PluginContent) -> Option<Map<String, Value>> {
    match content {
        PluginContent::Picture(picture) => fields_of(picture),
        _ => None,
    }
}

fn contact_form_fields(content: &PluginContent) -> Option<Map<String, Value>> {
    match content {
        PluginContent::ContactForm(form) => fields_of(form),
        _ => None,
    }
}

fn poll_fields(content: &PluginContent) -> Option<Map<String, Value>> {
    match content {
        PluginContent::Poll(poll) => fields_of(poll),
        _ => None,
    }
}

/// PollVoteHook
///
/// Counts a vote instead of storing a raw submission, and answers with the tallies.
pub struct PollVoteHook;

#[async_trait]
impl SubmissionHook for PollVoteHook {
    async fn process(
        &self,
        repo: &dyn Repository,
        requester: &Requester,
        plugin: &ResolvedPlugin,
        data: Value,
    ) -> AppResult<Value> {
        // The data serializer has already bounded `choice` to the poll's choices.
        let choice = data.get("choice").and_then(Value::as_i64).unwrap_or_default() as i32;

        let tallies = repo
            .record_poll_vote(plugin.id(), choice, requester.user_id())
            .await?;

        tracing::info!(plugin_id = plugin.id(), choice, "poll vote recorded");

        let choices = match &plugin.content {
            PluginContent::Poll(poll) => poll.choices.clone(),
            _ => Vec::new(),
        };
        let results: Vec<Value> = choices
            .iter()
            .enumerate()
            .map(|(index, label)| {
                let votes = tallies
                    .iter()
                    .find(|t| t.choice as usize == index)
                    .map_or(0, |t| t.votes);
                json!({ "choice": index, "label": label, "votes": votes })
            })
            .collect();

        Ok(json!({ "choice": choice, "results": results }))
    }
}

/// builtin_registry
///
/// Registry with every plugin type shipped with the API.
pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();

    registry
        .register(
            PluginRegistration::new(TextPlugin::TYPE)
                .with_serializer(SerializerDescriptor::dedicated("TextPluginSerializer", text_fields)),
        )
        .register(
            PluginRegistration::new(LinkPlugin::TYPE)
                .with_serializer(SerializerDescriptor::dedicated("LinkPluginSerializer", link_fields)),
        )
        .register(
            PluginRegistration::new(PicturePlugin::TYPE).with_serializer(
                SerializerDescriptor::dedicated("PicturePluginSerializer", picture_fields),
            ),
        )
        .register(
            PluginRegistration::new(ContactFormPlugin::TYPE)
                .with_serializer(SerializerDescriptor::dedicated(
                    "ContactFormPluginSerializer",
                    contact_form_fields,
                ))
                .with_data_serializer(DataSerializer::new(
                    "ContactMessageSerializer",
                    vec![
                        DataField::required("name", FieldKind::Text { max_length: 100 }),
                        DataField::required("email", FieldKind::Email),
                        DataField::optional("subject", FieldKind::Text { max_length: 200 }),
                        DataField::required("message", FieldKind::Text { max_length: 2000 }),
                    ],
                )),
        )
        .register(
            PluginRegistration::new(PollPlugin::TYPE)
                .with_serializer(SerializerDescriptor::dedicated("PollPluginSerializer", poll_fields))
                .with_data_serializer(DataSerializer::new(
                    "PollVoteSerializer",
                    vec![DataField::required("choice", FieldKind::PluginChoice)],
                ))
                .with_permission(PermissionCheck::IS_AUTHENTICATED)
                .with_hook(Arc::new(PollVoteHook)),
        );

    registry
}

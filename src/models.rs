use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Content Store Rows ---

/// User
///
/// Profile row resolved during authentication. `is_staff` switches the visibility
/// gate from the public policy to the staff policy.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub is_staff: bool,
}

/// Site
///
/// A site served by this installation. The current site is resolved from the
/// request's Host header.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct Site {
    pub id: i64,
    pub domain: String,
    pub name: String,
}

/// Page
///
/// A node of the content tree. `is_published = false` marks a draft.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Page {
    pub id: i64,
    pub site_id: i64,
    pub parent_id: Option<i64>,
    pub title: String,
    pub slug: String,
    // Materialized tree path, also the list ordering key.
    pub path: String,
    pub template: String,
    pub is_published: bool,
    pub login_required: bool,
    pub publication_date: Option<DateTime<Utc>>,
    pub publication_end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

impl Default for Page {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            site_id: 1,
            parent_id: None,
            title: String::new(),
            slug: String::new(),
            path: String::new(),
            template: "INHERIT".to_string(),
            is_published: false,
            login_required: false,
            publication_date: None,
            publication_end_date: None,
            created_at: now,
            changed_at: now,
        }
    }
}

/// Placeholder
///
/// A named content slot. Static placeholders are not attached to a page, so
/// `page_id` is nullable.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, Default, PartialEq)]
pub struct Placeholder {
    pub id: i64,
    pub slot: String,
    pub page_id: Option<i64>,
}

/// PluginRecord
///
/// Base plugin row: common columns plus the type tag and the concrete payload,
/// which is decoded into a `PluginContent` variant by `PluginRecord::resolve`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PluginRecord {
    pub id: i64,
    pub placeholder_id: i64,
    pub parent_id: Option<i64>,
    pub position: i32,
    pub language: String,
    pub plugin_type: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub changed_at: DateTime<Utc>,
}

impl Default for PluginRecord {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            placeholder_id: 0,
            parent_id: None,
            position: 0,
            language: "en".to_string(),
            plugin_type: String::new(),
            data: Value::Object(Default::default()),
            created_at: now,
            changed_at: now,
        }
    }
}

/// PluginSubmission
///
/// Row written by the default save path of `submit_data`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PluginSubmission {
    pub id: i64,
    pub plugin_id: i64,
    pub data: Value,
    pub submitted_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

// --- Response Schemas ---

/// PageLight
///
/// Reduced page representation used by the list endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageLight {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub path: String,
    pub parent: Option<i64>,
    pub is_published: bool,
}

impl From<&Page> for PageLight {
    fn from(page: &Page) -> Self {
        Self {
            id: page.id,
            title: page.title.clone(),
            slug: page.slug.clone(),
            path: page.path.clone(),
            parent: page.parent_id,
            is_published: page.is_published,
        }
    }
}

/// PlaceholderSummary
///
/// Placeholder reference embedded in the full page representation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PlaceholderSummary {
    pub id: i64,
    pub slot: String,
}

/// PageDetail
///
/// Full page representation returned by the retrieve endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PageDetail {
    pub id: i64,
    pub site: i64,
    pub title: String,
    pub slug: String,
    pub path: String,
    pub parent: Option<i64>,
    pub template: String,
    pub is_published: bool,
    pub login_required: bool,
    #[ts(type = "string | null")]
    pub publication_date: Option<DateTime<Utc>>,
    #[ts(type = "string | null")]
    pub publication_end_date: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub changed_at: DateTime<Utc>,
    pub placeholders: Vec<PlaceholderSummary>,
}

impl PageDetail {
    pub fn new(page: &Page, placeholders: &[Placeholder]) -> Self {
        Self {
            id: page.id,
            site: page.site_id,
            title: page.title.clone(),
            slug: page.slug.clone(),
            path: page.path.clone(),
            parent: page.parent_id,
            template: page.template.clone(),
            is_published: page.is_published,
            login_required: page.login_required,
            publication_date: page.publication_date,
            publication_end_date: page.publication_end_date,
            created_at: page.created_at,
            changed_at: page.changed_at,
            placeholders: placeholders
                .iter()
                .map(|p| PlaceholderSummary {
                    id: p.id,
                    slot: p.slot.clone(),
                })
                .collect(),
        }
    }
}

/// PaginatedPages
///
/// Page-number pagination envelope for the page list.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PaginatedPages {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<PageLight>,
}

/// PluginBase
///
/// Common plugin fields. This is the whole body of the base serializer and the
/// prefix of every dedicated one.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct PluginBase {
    pub id: i64,
    pub plugin_type: String,
    pub placeholder: i64,
    pub parent: Option<i64>,
    pub position: i32,
    pub language: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub changed_at: DateTime<Utc>,
}

impl From<&PluginRecord> for PluginBase {
    fn from(record: &PluginRecord) -> Self {
        Self {
            id: record.id,
            plugin_type: record.plugin_type.clone(),
            placeholder: record.placeholder_id,
            parent: record.parent_id,
            position: record.position,
            language: record.language.clone(),
            created_at: record.created_at,
            changed_at: record.changed_at,
        }
    }
}

/// PlaceholderDetail
///
/// Placeholder with its plugins in display order, each in the base representation.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct PlaceholderDetail {
    pub id: i64,
    pub slot: String,
    pub page: Option<i64>,
    pub plugins: Vec<PluginBase>,
}

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use cms_rest_api::{
    AppConfig, AppState,
    auth::{AuthUser, Requester},
    models::{Page, Placeholder, PluginRecord, PluginSubmission, Site, User},
    plugins::{PluginRegistry, builtin_registry},
    repository::{PollTally, Repository},
    visibility::PageScope,
};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const SITE_ID: i64 = 1;
pub const OTHER_SITE_ID: i64 = 2;
pub const STAFF_ID: Uuid = Uuid::from_u128(100);
pub const MEMBER_ID: Uuid = Uuid::from_u128(200);

// --- In-memory content store ---

/// Repository over plain vectors. Page filtering goes through `PageScope::admits`,
/// the predicate the Postgres query mirrors.
#[derive(Default)]
pub struct InMemoryRepository {
    pub users: Vec<User>,
    pub sites: Vec<Site>,
    pub pages: Vec<Page>,
    pub placeholders: Vec<Placeholder>,
    pub plugins: Vec<PluginRecord>,
    pub submissions: Mutex<Vec<PluginSubmission>>,
    pub votes: Mutex<Vec<(i64, i32)>>,
}

impl InMemoryRepository {
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().unwrap().len()
    }

    pub fn vote_count(&self) -> usize {
        self.votes.lock().unwrap().len()
    }

    fn visible_pages(&self, scope: &PageScope) -> Vec<Page> {
        let mut pages: Vec<Page> = self
            .pages
            .iter()
            .filter(|p| scope.admits(p))
            .cloned()
            .collect();
        pages.sort_by(|a, b| a.path.cmp(&b.path).then(a.id.cmp(&b.id)));
        pages
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        Ok(self.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_site_by_domain(&self, domain: &str) -> Result<Option<Site>, sqlx::Error> {
        Ok(self.sites.iter().find(|s| s.domain == domain).cloned())
    }

    async fn count_pages(&self, scope: &PageScope) -> Result<i64, sqlx::Error> {
        Ok(self.visible_pages(scope).len() as i64)
    }

    async fn list_pages(
        &self,
        scope: &PageScope,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Page>, sqlx::Error> {
        Ok(self
            .visible_pages(scope)
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn get_page(&self, id: i64) -> Result<Option<Page>, sqlx::Error> {
        Ok(self.pages.iter().find(|p| p.id == id).cloned())
    }

    async fn get_placeholder(&self, id: i64) -> Result<Option<Placeholder>, sqlx::Error> {
        Ok(self.placeholders.iter().find(|p| p.id == id).cloned())
    }

    async fn get_placeholders_for_page(
        &self,
        page_id: i64,
    ) -> Result<Vec<Placeholder>, sqlx::Error> {
        Ok(self
            .placeholders
            .iter()
            .filter(|p| p.page_id == Some(page_id))
            .cloned()
            .collect())
    }

    async fn get_plugins_for_placeholder(
        &self,
        placeholder_id: i64,
    ) -> Result<Vec<PluginRecord>, sqlx::Error> {
        let mut plugins: Vec<PluginRecord> = self
            .plugins
            .iter()
            .filter(|p| p.placeholder_id == placeholder_id)
            .cloned()
            .collect();
        plugins.sort_by_key(|p| (p.position, p.id));
        Ok(plugins)
    }

    async fn get_plugin(&self, id: i64) -> Result<Option<PluginRecord>, sqlx::Error> {
        Ok(self.plugins.iter().find(|p| p.id == id).cloned())
    }

    async fn save_submission(
        &self,
        plugin_id: i64,
        data: Value,
        submitted_by: Option<Uuid>,
    ) -> Result<PluginSubmission, sqlx::Error> {
        let mut submissions = self.submissions.lock().unwrap();
        let submission = PluginSubmission {
            id: submissions.len() as i64 + 1,
            plugin_id,
            data,
            submitted_by,
            created_at: Utc::now(),
        };
        submissions.push(submission.clone());
        Ok(submission)
    }

    async fn record_poll_vote(
        &self,
        plugin_id: i64,
        choice: i32,
        _voter: Option<Uuid>,
    ) -> Result<Vec<PollTally>, sqlx::Error> {
        let mut votes = self.votes.lock().unwrap();
        votes.push((plugin_id, choice));

        let mut tallies: Vec<PollTally> = Vec::new();
        for (_, c) in votes.iter().filter(|(p, _)| *p == plugin_id) {
            match tallies.iter_mut().find(|t| t.choice == *c) {
                Some(t) => t.votes += 1,
                None => tallies.push(PollTally { choice: *c, votes: 1 }),
            }
        }
        tallies.sort_by_key(|t| t.choice);
        Ok(tallies)
    }
}

// --- Fixtures ---

pub fn page(id: i64, published: bool) -> Page {
    Page {
        id,
        site_id: SITE_ID,
        title: format!("Page {id}"),
        slug: format!("page-{id}"),
        path: format!("{id:04}"),
        is_published: published,
        ..Page::default()
    }
}

pub fn placeholder(id: i64, page_id: Option<i64>) -> Placeholder {
    Placeholder {
        id,
        slot: format!("slot-{id}"),
        page_id,
    }
}

pub fn plugin(id: i64, placeholder_id: i64, plugin_type: &str, data: Value) -> PluginRecord {
    PluginRecord {
        id,
        placeholder_id,
        position: id as i32,
        plugin_type: plugin_type.to_string(),
        data,
        ..PluginRecord::default()
    }
}

pub fn users() -> Vec<User> {
    vec![
        User {
            id: STAFF_ID,
            email: "editor@example.com".to_string(),
            is_staff: true,
        },
        User {
            id: MEMBER_ID,
            email: "member@example.com".to_string(),
            is_staff: false,
        },
    ]
}

/// A small tree:
/// - page 1 published, placeholder 10 with a text (100), link (101), contact form
///   (102), poll (103), picture (104) and an unknown plugin type (105)
/// - page 2 draft, placeholder 20 with a text plugin (200)
/// - page 3 published on another site, placeholder 30 with a text plugin (300)
/// - static placeholder 40 (no page) with a text plugin (400)
pub fn content_tree() -> InMemoryRepository {
    let mut foreign = page(3, true);
    foreign.site_id = OTHER_SITE_ID;

    InMemoryRepository {
        users: users(),
        sites: vec![
            Site {
                id: SITE_ID,
                domain: "example.com".to_string(),
                name: "Example".to_string(),
            },
            Site {
                id: OTHER_SITE_ID,
                domain: "other.example.com".to_string(),
                name: "Other".to_string(),
            },
        ],
        pages: vec![page(1, true), page(2, false), foreign],
        placeholders: vec![
            placeholder(10, Some(1)),
            placeholder(20, Some(2)),
            placeholder(30, Some(3)),
            placeholder(40, None),
        ],
        plugins: vec![
            plugin(100, 10, "TextPlugin", serde_json::json!({ "body": "<p>Hello</p>" })),
            plugin(
                101,
                10,
                "LinkPlugin",
                serde_json::json!({ "name": "Docs", "url": "/docs/", "target": "_blank" }),
            ),
            plugin(
                102,
                10,
                "ContactFormPlugin",
                serde_json::json!({ "title": "Write us", "recipient": "inbox@example.com" }),
            ),
            plugin(
                103,
                10,
                "PollPlugin",
                serde_json::json!({ "question": "Tabs or spaces?", "choices": ["tabs", "spaces"] }),
            ),
            plugin(104, 10, "PicturePlugin", serde_json::json!({ "image": "/media/a.png" })),
            plugin(105, 10, "MapPlugin", serde_json::json!({ "lat": 1.5 })),
            plugin(200, 20, "TextPlugin", serde_json::json!({ "body": "draft" })),
            plugin(300, 30, "TextPlugin", serde_json::json!({ "body": "elsewhere" })),
            plugin(400, 40, "TextPlugin", serde_json::json!({ "body": "static" })),
        ],
        ..InMemoryRepository::default()
    }
}

/// Repository holding `count` published pages on the current site.
pub fn many_pages(count: i64) -> InMemoryRepository {
    InMemoryRepository {
        pages: (1..=count).map(|id| page(id, true)).collect(),
        ..InMemoryRepository::default()
    }
}

// --- State & requesters ---

pub fn state_with(repo: Arc<InMemoryRepository>, registry: PluginRegistry) -> AppState {
    AppState {
        repo,
        plugins: Arc::new(registry),
        config: AppConfig::default(),
    }
}

pub fn state(repo: Arc<InMemoryRepository>) -> AppState {
    state_with(repo, builtin_registry())
}

pub fn anonymous() -> Requester {
    Requester::anonymous(SITE_ID)
}

pub fn member() -> Requester {
    Requester::authenticated(
        AuthUser {
            id: MEMBER_ID,
            is_staff: false,
        },
        SITE_ID,
    )
}

pub fn staff() -> Requester {
    Requester::authenticated(
        AuthUser {
            id: STAFF_ID,
            is_staff: true,
        },
        SITE_ID,
    )
}

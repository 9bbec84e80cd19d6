use crate::{
    models::{Page, Placeholder, PluginRecord, PluginSubmission, Site, User},
    visibility::PageScope,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::{FromRow, PgPool, Postgres, query_builder::QueryBuilder};
use std::sync::Arc;
use uuid::Uuid;

/// PollTally
///
/// Vote count for one choice of a poll plugin.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct PollTally {
    pub choice: i32,
    pub votes: i64,
}

/// Repository Trait
///
/// Read access to the content store plus the two writes `submit_data` can make.
/// Handlers only see `Arc<dyn Repository>`, so tests swap in an in-memory store.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Identity & Sites ---
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error>;
    async fn get_site_by_domain(&self, domain: &str) -> Result<Option<Site>, sqlx::Error>;

    // --- Pages ---
    // Both methods must apply exactly the rules of `PageScope::admits`.
    async fn count_pages(&self, scope: &PageScope) -> Result<i64, sqlx::Error>;
    async fn list_pages(
        &self,
        scope: &PageScope,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Page>, sqlx::Error>;
    // Unfiltered lookup; callers apply the visibility gate.
    async fn get_page(&self, id: i64) -> Result<Option<Page>, sqlx::Error>;

    // --- Placeholders & Plugins ---
    async fn get_placeholder(&self, id: i64) -> Result<Option<Placeholder>, sqlx::Error>;
    async fn get_placeholders_for_page(&self, page_id: i64)
    -> Result<Vec<Placeholder>, sqlx::Error>;
    // Ordered by position, then id.
    async fn get_plugins_for_placeholder(
        &self,
        placeholder_id: i64,
    ) -> Result<Vec<PluginRecord>, sqlx::Error>;
    async fn get_plugin(&self, id: i64) -> Result<Option<PluginRecord>, sqlx::Error>;

    // --- Submissions ---
    // Default save path for validated plugin data.
    async fn save_submission(
        &self,
        plugin_id: i64,
        data: Value,
        submitted_by: Option<Uuid>,
    ) -> Result<PluginSubmission, sqlx::Error>;
    // Records one vote and returns the updated tallies of the poll.
    async fn record_poll_vote(
        &self,
        plugin_id: i64,
        choice: i32,
        voter: Option<Uuid>,
    ) -> Result<Vec<PollTally>, sqlx::Error>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;

const PAGE_COLUMNS: &str = "id, site_id, parent_id, title, slug, path, template, is_published, \
     login_required, publication_date, publication_end_date, created_at, changed_at";

/// Appends the `WHERE` clause for `scope`. Mirrors `PageScope::admits`.
fn push_page_scope(builder: &mut QueryBuilder<'_, Postgres>, scope: &PageScope) {
    builder.push(" WHERE site_id = ").push_bind(scope.site_id);

    // Staff see the whole site, drafts and expired pages included.
    if scope.staff {
        return;
    }

    builder
        .push(" AND is_published")
        .push(" AND (publication_date IS NULL OR publication_date <= ")
        .push_bind(scope.now)
        .push(") AND (publication_end_date IS NULL OR publication_end_date > ")
        .push_bind(scope.now)
        .push(")");

    if !scope.authenticated {
        builder.push(" AND NOT login_required");
    }
}

const PLUGIN_COLUMNS: &str =
    "id, placeholder_id, parent_id, position, language, plugin_type, data, created_at, changed_at";

/// PostgresRepository
///
/// The concrete implementation of the `Repository` trait, backed by PostgreSQL.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    async fn get_user(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT id, email, is_staff FROM profiles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_site_by_domain(&self, domain: &str) -> Result<Option<Site>, sqlx::Error> {
        sqlx::query_as::<_, Site>("SELECT id, domain, name FROM sites WHERE domain = $1")
            .bind(domain)
            .fetch_optional(&self.pool)
            .await
    }

    /// count_pages
    ///
    /// Total for the pagination envelope, computed with the same filter as `list_pages`.
    async fn count_pages(&self, scope: &PageScope) -> Result<i64, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT COUNT(DISTINCT id) FROM pages");
        push_page_scope(&mut builder, scope);

        builder
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await
    }

    async fn list_pages(
        &self,
        scope: &PageScope,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Page>, sqlx::Error> {
        let mut builder: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT DISTINCT {PAGE_COLUMNS} FROM pages"));
        push_page_scope(&mut builder, scope);

        builder.push(" ORDER BY path ASC, id ASC LIMIT ");
        builder.push_bind(limit);
        builder.push(" OFFSET ");
        builder.push_bind(offset);

        builder.build_query_as::<Page>().fetch_all(&self.pool).await
    }

    async fn get_page(&self, id: i64) -> Result<Option<Page>, sqlx::Error> {
        let query = format!("SELECT {PAGE_COLUMNS} FROM pages WHERE id = $1");
        sqlx::query_as::<_, Page>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_placeholder(&self, id: i64) -> Result<Option<Placeholder>, sqlx::Error> {
        sqlx::query_as::<_, Placeholder>("SELECT id, slot, page_id FROM placeholders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn get_placeholders_for_page(
        &self,
        page_id: i64,
    ) -> Result<Vec<Placeholder>, sqlx::Error> {
        sqlx::query_as::<_, Placeholder>(
            "SELECT id, slot, page_id FROM placeholders WHERE page_id = $1 ORDER BY slot ASC, id ASC",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_plugins_for_placeholder(
        &self,
        placeholder_id: i64,
    ) -> Result<Vec<PluginRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {PLUGIN_COLUMNS} FROM plugin_instances WHERE placeholder_id = $1 \
             ORDER BY position ASC, id ASC"
        );
        sqlx::query_as::<_, PluginRecord>(&query)
            .bind(placeholder_id)
            .fetch_all(&self.pool)
            .await
    }

    async fn get_plugin(&self, id: i64) -> Result<Option<PluginRecord>, sqlx::Error> {
        let query = format!("SELECT {PLUGIN_COLUMNS} FROM plugin_instances WHERE id = $1");
        sqlx::query_as::<_, PluginRecord>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    async fn save_submission(
        &self,
        plugin_id: i64,
        data: Value,
        submitted_by: Option<Uuid>,
    ) -> Result<PluginSubmission, sqlx::Error> {
        sqlx::query_as::<_, PluginSubmission>(
            r#"INSERT INTO plugin_submissions (plugin_id, data, submitted_by, created_at)
               VALUES ($1, $2, $3, NOW())
               RETURNING id, plugin_id, data, submitted_by, created_at"#,
        )
        .bind(plugin_id)
        .bind(data)
        .bind(submitted_by)
        .fetch_one(&self.pool)
        .await
    }

    /// record_poll_vote
    ///
    /// Insert and tally run in one transaction so the returned counts include the vote.
    async fn record_poll_vote(
        &self,
        plugin_id: i64,
        choice: i32,
        voter: Option<Uuid>,
    ) -> Result<Vec<PollTally>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO poll_votes (plugin_id, choice, voter, created_at) VALUES ($1, $2, $3, NOW())",
        )
        .bind(plugin_id)
        .bind(choice)
        .bind(voter)
        .execute(&mut *tx)
        .await?;

        let tallies = sqlx::query_as::<_, PollTally>(
            r#"SELECT choice, COUNT(*) AS votes FROM poll_votes
               WHERE plugin_id = $1 GROUP BY choice ORDER BY choice ASC"#,
        )
        .bind(plugin_id)
        .fetch_all(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(tallies)
    }
}

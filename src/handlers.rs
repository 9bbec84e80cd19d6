use crate::{
    AppState,
    auth::Requester,
    error::{AppError, AppResult},
    models::{PageDetail, PageLight, PaginatedPages, PlaceholderDetail, PluginBase},
    pagination::PageWindow,
    plugins::ResolvedPlugin,
    submission,
    visibility::{check_owning_page, is_visible},
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::Method,
};
use serde::Deserialize;
use serde_json::Value;

const PAGES_PATH: &str = "/pages/";

// --- Query Structs ---

/// PageListQuery
///
/// Query parameters accepted by the page list (GET /pages/).
#[derive(Deserialize, utoipa::IntoParams)]
pub struct PageListQuery {
    /// 1-based page number; 50 pages per page.
    pub page: Option<String>,
}

// --- Retrieval Chain ---

/// fetch_visible_plugin
///
/// Plugin → placeholder → page lookup shared by retrieve and `submit_data`. The owning
/// page is re-checked against the visibility gate before the record is upgraded to
/// its concrete variant.
pub async fn fetch_visible_plugin(
    state: &AppState,
    requester: &Requester,
    plugin_id: i64,
) -> AppResult<ResolvedPlugin> {
    let record = state
        .repo
        .get_plugin(plugin_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let placeholder = state.repo.get_placeholder(record.placeholder_id).await?;
    let page = match placeholder.and_then(|p| p.page_id) {
        Some(page_id) => state.repo.get_page(page_id).await?,
        None => None,
    };
    check_owning_page(requester, page.as_ref())?;

    Ok(record.resolve())
}

// --- Handlers ---

/// list_pages
///
/// Paginated, site-scoped list of the pages visible to the requester, in the light
/// representation. The repository filters with the requester's `PageScope`, the same
/// rules `is_visible` applies to single objects.
#[utoipa::path(
    get,
    path = "/pages/",
    params(PageListQuery),
    responses(
        (status = 200, description = "Visible pages", body = PaginatedPages),
        (status = 404, description = "Invalid page")
    )
)]
pub async fn list_pages(
    requester: Requester,
    State(state): State<AppState>,
    Query(query): Query<PageListQuery>,
) -> AppResult<Json<PaginatedPages>> {
    let scope = requester.page_scope();

    let count = state.repo.count_pages(&scope).await?;
    let window = PageWindow::new(query.page.as_deref(), count)?;
    let pages = state
        .repo
        .list_pages(&scope, window.limit, window.offset)
        .await?;

    Ok(Json(PaginatedPages {
        count,
        next: window.next_link(PAGES_PATH),
        previous: window.previous_link(PAGES_PATH),
        results: pages.iter().map(PageLight::from).collect(),
    }))
}

/// retrieve_page
///
/// Full page representation. Pages outside the requester's scope are reported as
/// missing, exactly as if the list had been filtered.
#[utoipa::path(
    get,
    path = "/pages/{id}/",
    params(("id" = i64, Path, description = "Page ID")),
    responses(
        (status = 200, description = "Found", body = PageDetail),
        (status = 404, description = "Not found or not visible")
    )
)]
pub async fn retrieve_page(
    requester: Requester,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PageDetail>> {
    let page = state
        .repo
        .get_page(id)
        .await?
        .filter(|page| is_visible(&requester, page))
        .ok_or(AppError::NotFound)?;

    let placeholders = state.repo.get_placeholders_for_page(page.id).await?;

    Ok(Json(PageDetail::new(&page, &placeholders)))
}

/// retrieve_placeholder
///
/// A placeholder with its plugins. Forbidden when the placeholder has no page or the
/// page is not visible to the requester.
#[utoipa::path(
    get,
    path = "/placeholders/{id}/",
    params(("id" = i64, Path, description = "Placeholder ID")),
    responses(
        (status = 200, description = "Found", body = PlaceholderDetail),
        (status = 403, description = "Owning page missing or not visible"),
        (status = 404, description = "Not found")
    )
)]
pub async fn retrieve_placeholder(
    requester: Requester,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PlaceholderDetail>> {
    let placeholder = state
        .repo
        .get_placeholder(id)
        .await?
        .ok_or(AppError::NotFound)?;

    let page = match placeholder.page_id {
        Some(page_id) => state.repo.get_page(page_id).await?,
        None => None,
    };
    check_owning_page(&requester, page.as_ref())?;

    let plugins = state.repo.get_plugins_for_placeholder(placeholder.id).await?;

    Ok(Json(PlaceholderDetail {
        id: placeholder.id,
        slot: placeholder.slot,
        page: placeholder.page_id,
        plugins: plugins.iter().map(PluginBase::from).collect(),
    }))
}

/// retrieve_plugin
///
/// A single plugin, rendered by the serializer registered for its concrete type.
#[utoipa::path(
    get,
    path = "/plugins/{id}/",
    params(("id" = i64, Path, description = "Plugin ID")),
    responses(
        (status = 200, description = "Plugin body; fields depend on the plugin type", body = serde_json::Value),
        (status = 403, description = "Owning page not visible"),
        (status = 404, description = "Not found")
    )
)]
pub async fn retrieve_plugin(
    requester: Requester,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Value>> {
    let plugin = fetch_visible_plugin(&state, &requester, id).await?;
    let serializer = state.plugins.serializer_for(&plugin);

    tracing::debug!(plugin_id = id, serializer = serializer.name, "serializing plugin");

    Ok(Json(serializer.serialize(&plugin)))
}

/// submit_data
///
/// Plugin-specific data submission. Routed for POST, PUT and PATCH so that updates are
/// rejected explicitly rather than by the router.
#[utoipa::path(
    post,
    path = "/plugins/{id}/submit_data/",
    params(("id" = i64, Path, description = "Plugin ID")),
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Processed or stored", body = serde_json::Value),
        (status = 400, description = "Field errors"),
        (status = 403, description = "Page not visible or plugin permission denied"),
        (status = 405, description = "PUT and PATCH are not allowed for now")
    )
)]
pub async fn submit_data(
    requester: Requester,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    method: Method,
    body: Bytes,
) -> AppResult<Json<Value>> {
    submission::submit_data(&state, &requester, id, &body, &method)
        .await
        .map(Json)
}

//! API route definitions

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use issuetracker::domain::{Issue, ISSUE_ENTITY};
use issuetracker::query::{IssueCriteria, IssueQueryService, PageRequest, Sort};
use issuetracker::{IssueService, IssueStore, TrackerError};

use crate::error::ApiError;
use crate::headers::AlertHeaders;

/// Services and header names shared by all handlers
#[derive(Debug)]
pub struct AppContext<S: IssueStore> {
    pub issues: IssueService<S>,
    pub queries: IssueQueryService<S>,
    pub alerts: AlertHeaders,
}

impl<S: IssueStore> AppContext<S> {
    pub fn new(storage: S, alerts: AlertHeaders) -> Self {
        Self {
            issues: IssueService::new(storage.clone()),
            queries: IssueQueryService::new(storage),
            alerts,
        }
    }

    fn fail(&self, error: TrackerError) -> ApiError {
        ApiError::new(error, &self.alerts)
    }
}

/// Shared application state
pub type AppState<S> = Arc<AppContext<S>>;

type QueryPairs = Vec<(String, String)>;

/// Create API routes
pub fn create_routes<S: IssueStore + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route(
            "/issues",
            get(get_all_issues::<S>)
                .post(create_issue::<S>)
                .put(update_issue::<S>),
        )
        .route("/issues/count", get(count_issues::<S>))
        .route(
            "/issues/:id",
            get(get_issue::<S>).delete(delete_issue::<S>),
        )
        .route("/openissues", get(get_all_open_issues::<S>))
        .route("/reviewedissues", get(get_all_reviewed_issues::<S>))
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "issuetracker-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// POST /issues: create a new issue
async fn create_issue<S: IssueStore>(
    State(ctx): State<AppState<S>>,
    body: Result<Json<Issue>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(issue) = body.map_err(|r| ApiError::from_json_rejection(r, &ctx.alerts))?;
    tracing::debug!("REST request to save Issue : {:?}", issue);

    if issue.id.is_some() {
        return Err(ctx.fail(TrackerError::id_exists()));
    }

    let saved = ctx.issues.save(issue).map_err(|e| ctx.fail(e))?;
    let id = saved
        .id
        .ok_or_else(|| ctx.fail(TrackerError::Storage(anyhow::anyhow!("Saved issue has no id"))))?;

    let mut headers = ctx.alerts.entity_creation(ISSUE_ENTITY, id);
    if let Ok(location) = HeaderValue::try_from(format!("/api/issues/{}", id)) {
        headers.insert(header::LOCATION, location);
    }
    Ok((StatusCode::CREATED, headers, Json(saved)))
}

/// PUT /issues: update an existing issue
async fn update_issue<S: IssueStore>(
    State(ctx): State<AppState<S>>,
    body: Result<Json<Issue>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(issue) = body.map_err(|r| ApiError::from_json_rejection(r, &ctx.alerts))?;
    tracing::debug!("REST request to update Issue : {:?}", issue);

    let Some(id) = issue.id else {
        return Err(ctx.fail(TrackerError::id_null()));
    };

    let saved = ctx.issues.save(issue).map_err(|e| ctx.fail(e))?;
    Ok((ctx.alerts.entity_update(ISSUE_ENTITY, id), Json(saved)))
}

/// GET /issues: search by criteria, optionally paged and sorted
async fn get_all_issues<S: IssueStore>(
    State(ctx): State<AppState<S>>,
    params: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Query(pairs) = params.map_err(|r| ApiError::from_query_rejection(r, &ctx.alerts))?;
    let criteria = IssueCriteria::from_query_pairs(&pairs).map_err(|e| ctx.fail(e))?;
    tracing::debug!("REST request to get Issues by criteria: {}", criteria);

    let mut headers = HeaderMap::new();
    let issues = match PageRequest::from_query_pairs(&pairs).map_err(|e| ctx.fail(e))? {
        Some(page) => {
            let page = ctx
                .queries
                .find_by_criteria_paged(Some(&criteria), &page)
                .map_err(|e| ctx.fail(e))?;
            headers.insert("x-total-count", HeaderValue::from(page.total_elements));
            page.content
        }
        None => {
            let sort = Sort::from_query_pairs(&pairs).map_err(|e| ctx.fail(e))?;
            ctx.queries
                .find_by_criteria_sorted(Some(&criteria), &sort)
                .map_err(|e| ctx.fail(e))?
        }
    };

    Ok((headers, Json(issues)))
}

/// GET /issues/count: count issues matching the criteria
async fn count_issues<S: IssueStore>(
    State(ctx): State<AppState<S>>,
    params: Result<Query<QueryPairs>, QueryRejection>,
) -> Result<Json<u64>, ApiError> {
    let Query(pairs) = params.map_err(|r| ApiError::from_query_rejection(r, &ctx.alerts))?;
    let criteria = IssueCriteria::from_query_pairs(&pairs).map_err(|e| ctx.fail(e))?;
    tracing::debug!("REST request to count Issues by criteria: {}", criteria);

    ctx.queries
        .count_by_criteria(Some(&criteria))
        .map(Json)
        .map_err(|e| ctx.fail(e))
}

/// GET /issues/:id
async fn get_issue<S: IssueStore>(
    State(ctx): State<AppState<S>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<Json<Issue>, ApiError> {
    let Path(id) = id.map_err(|r| ApiError::from_path_rejection(r, &ctx.alerts))?;
    tracing::debug!("REST request to get Issue : {}", id);
    match ctx.issues.find_one(id).map_err(|e| ctx.fail(e))? {
        Some(issue) => Ok(Json(issue)),
        None => Err(ctx.fail(TrackerError::not_found(id))),
    }
}

/// DELETE /issues/:id
async fn delete_issue<S: IssueStore>(
    State(ctx): State<AppState<S>>,
    id: Result<Path<i64>, PathRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Path(id) = id.map_err(|r| ApiError::from_path_rejection(r, &ctx.alerts))?;
    tracing::debug!("REST request to delete Issue : {}", id);
    ctx.issues.delete(id).map_err(|e| ctx.fail(e))?;
    Ok((
        StatusCode::NO_CONTENT,
        ctx.alerts.entity_deletion(ISSUE_ENTITY, id),
    ))
}

/// GET /openissues: issues with resolution NEW
async fn get_all_open_issues<S: IssueStore>(
    State(ctx): State<AppState<S>>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    tracing::debug!("REST request to get all open Issues");
    ctx.issues
        .find_all_open_issues()
        .map(Json)
        .map_err(|e| ctx.fail(e))
}

/// GET /reviewedissues: issues with resolution REVIEWED
async fn get_all_reviewed_issues<S: IssueStore>(
    State(ctx): State<AppState<S>>,
) -> Result<Json<Vec<Issue>>, ApiError> {
    tracing::debug!("REST request to get all reviewed Issues");
    ctx.issues
        .find_all_reviewed_issues()
        .map(Json)
        .map_err(|e| ctx.fail(e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum_test::TestServer;
    use issuetracker::domain::{Priority, Resolution};
    use issuetracker::storage::InMemoryStorage;

    fn create_test_app() -> (TestServer, InMemoryStorage) {
        crate::logging::init_test_logging();
        let storage = InMemoryStorage::new();
        let alerts = AlertHeaders::new("issuetrackerApp").unwrap();
        let state = Arc::new(AppContext::new(storage.clone(), alerts));
        let app = create_routes(state);
        (TestServer::new(app).unwrap(), storage)
    }

    #[tokio::test]
    async fn test_health_check() {
        let (server, _) = create_test_app();
        let response = server.get("/health").await;
        response.assert_status_ok();
        response.assert_json(&serde_json::json!({
            "status": "ok",
            "service": "issuetracker-api",
            "version": env!("CARGO_PKG_VERSION")
        }));
    }

    #[tokio::test]
    async fn test_list_issues_empty() {
        let (server, _) = create_test_app();
        let response = server.get("/issues").await;
        response.assert_status_ok();
        let issues: Vec<Issue> = response.json();
        assert_eq!(issues.len(), 0);
    }

    #[tokio::test]
    async fn test_get_issue_not_found() {
        let (server, _) = create_test_app();
        let response = server.get("/issues/42").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: serde_json::Value = response.json();
        assert_eq!(body["errorKey"], "notfound");
    }

    #[tokio::test]
    async fn test_create_sets_location_and_alert() {
        let (server, storage) = create_test_app();
        let response = server
            .post("/issues")
            .json(&serde_json::json!({"number": 1, "priority": "HIGH"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let created: Issue = response.json();
        assert_eq!(created.id, Some(1));
        assert_eq!(created.priority, Some(Priority::High));

        let headers = response.headers();
        assert_eq!(headers.get(header::LOCATION).unwrap(), "/api/issues/1");
        assert_eq!(
            headers.get("x-issuetrackerapp-alert").unwrap(),
            "A new issue is created with identifier 1"
        );
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_enum_value_is_bad_request() {
        let (server, storage) = create_test_app();
        let response = server
            .post("/issues")
            .json(&serde_json::json!({"number": 1, "resolution": "OPEN"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(storage.count().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_issues_with_data() {
        let (server, storage) = create_test_app();
        storage
            .save(Issue::new(1).with_resolution(Resolution::New))
            .unwrap();
        storage
            .save(Issue::new(2).with_resolution(Resolution::Reviewed))
            .unwrap();

        let response = server.get("/issues").await;
        response.assert_status_ok();
        let issues: Vec<Issue> = response.json();
        assert_eq!(issues.len(), 2);

        let open: Vec<Issue> = server.get("/openissues").await.json();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].number, Some(1));

        let reviewed: Vec<Issue> = server.get("/reviewedissues").await.json();
        assert_eq!(reviewed.len(), 1);
        assert_eq!(reviewed[0].number, Some(2));
    }

    #[tokio::test]
    async fn test_paged_list_sets_total_count() {
        let (server, storage) = create_test_app();
        for number in 1..=3 {
            storage.save(Issue::new(number)).unwrap();
        }

        let response = server
            .get("/issues")
            .add_query_param("page", 0)
            .add_query_param("size", 2)
            .add_query_param("sort", "id,desc")
            .await;
        response.assert_status_ok();
        assert_eq!(response.headers().get("x-total-count").unwrap(), "3");
        let issues: Vec<Issue> = response.json();
        let ids: Vec<_> = issues.iter().filter_map(|i| i.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_count_endpoint() {
        let (server, storage) = create_test_app();
        storage.save(Issue::new(1)).unwrap();
        storage.save(Issue::new(2)).unwrap();

        let response = server
            .get("/issues/count")
            .add_query_param("number.greaterThan", 1)
            .await;
        response.assert_status_ok();
        let count: u64 = response.json();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_bad_request() {
        let (server, storage) = create_test_app();
        storage.save(Issue::new(1)).unwrap();

        for response in [
            server.get("/issues/first").await,
            server.delete("/issues/first").await,
        ] {
            response.assert_status(StatusCode::BAD_REQUEST);
            let body: serde_json::Value = response.json();
            assert_eq!(body["errorKey"], "badrequest");
            assert_eq!(
                response.headers().get("x-issuetrackerapp-error").unwrap(),
                "error.badrequest"
            );
        }
        assert_eq!(storage.count().unwrap(), 1);
    }

    #[tokio::test]
    async fn test_client_comment_id_is_rejected() {
        let (server, storage) = create_test_app();

        let response = server
            .post("/issues")
            .json(&serde_json::json!({"number": 1, "comments": [{"id": i64::MAX}]}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["errorKey"], "badrequest");
        assert_eq!(storage.count().unwrap(), 0);

        let response = server
            .post("/issues")
            .json(&serde_json::json!({"number": 2, "comments": [{"description": "ok"}]}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let created: Issue = response.json();
        assert_eq!(created.comments[0].id, Some(1));
    }
}

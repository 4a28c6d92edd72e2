// src/handlers/projects.rs
//! Project endpoints: create (schedules the detached pipeline run), list,
//! and fetch-with-assets. All routes require a verified identity.

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Json,
    routing::{get, post, Router},
};
use std::sync::Arc;

use crate::models::auth::{Claims, ErrorResponse};
use crate::models::project::{
    CreateProjectRequest, ProjectDetailResponse, ProjectResponse,
};
use crate::store::StoreError;
use crate::AppState;

pub fn project_routes() -> Router {
    Router::new()
        .route("/api/projects", post(create_project).get(list_projects))
        .route("/api/projects/:project_id", get(get_project))
        .layer(axum::middleware::from_fn(
            crate::middleware::auth::auth_middleware,
        ))
}

/// POST /api/projects - create a project and schedule its pipeline run.
/// The response always carries status `pending`; the run executes
/// detached from this request.
async fn create_project(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>), (StatusCode, Json<ErrorResponse>)> {
    let video_url = payload.video_url.trim().to_string();
    if !video_url.starts_with("http://") && !video_url.starts_with("https://") {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: "video_url must be an http(s) URL".to_string(),
            }),
        ));
    }

    let project = match state.store.create_project(&claims.sub, &video_url).await {
        Ok(project) => project,
        Err(e) => {
            tracing::error!("Failed to create project: {}", e);
            return Err(store_error_response(e));
        }
    };

    tracing::info!(
        "📋 Created project {} for user {}, scheduling pipeline run",
        project.id,
        claims.sub
    );
    state
        .pipeline
        .clone()
        .spawn_run(project.id.clone(), project.source_url.clone());

    Ok((StatusCode::CREATED, Json(ProjectResponse::from(project))))
}

/// GET /api/projects - the caller's projects, newest first.
async fn list_projects(
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<Vec<ProjectResponse>>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.list_projects(&claims.sub).await {
        Ok(projects) => Ok(Json(
            projects.into_iter().map(ProjectResponse::from).collect(),
        )),
        Err(e) => {
            tracing::error!("Failed to list projects for {}: {}", claims.sub, e);
            Err(store_error_response(e))
        }
    }
}

/// GET /api/projects/:id - one project with its assets. A project owned
/// by a different identity yields the same 404 as a missing one, so
/// existence never leaks across owners.
async fn get_project(
    Path(project_id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<ProjectDetailResponse>, (StatusCode, Json<ErrorResponse>)> {
    let project = match state.store.get_project(&project_id).await {
        Ok(project) => project,
        Err(StoreError::ProjectNotFound(_)) => return Err(not_found()),
        Err(e) => {
            tracing::error!("Failed to fetch project {}: {}", project_id, e);
            return Err(store_error_response(e));
        }
    };

    if project.user_id != claims.sub {
        return Err(not_found());
    }

    let assets = match state.store.list_assets(&project_id).await {
        Ok(assets) => assets,
        Err(e) => {
            tracing::error!("Failed to fetch assets for project {}: {}", project_id, e);
            return Err(store_error_response(e));
        }
    };

    Ok(Json(ProjectDetailResponse {
        project: ProjectResponse::from(project),
        assets,
    }))
}

fn not_found() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            success: false,
            message: "Project not found".to_string(),
        }),
    )
}

fn store_error_response(error: StoreError) -> (StatusCode, Json<ErrorResponse>) {
    match error {
        StoreError::ProjectNotFound(_) => not_found(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                success: false,
                message: "Internal server error".to_string(),
            }),
        ),
    }
}

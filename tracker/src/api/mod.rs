use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
    routing::{get, patch, post, put},
};
use sea_orm::{ConnectionTrait, DatabaseConnection};
use tower::Layer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::set_header::response::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Settings;
use crate::entity::stage;

pub mod dto;
pub mod employee_handlers;
pub mod import_handlers;
pub mod order_handlers;
pub mod stage_handlers;
pub mod task_handlers;

// ---------- shared state ----------

/// Handlers borrow `db` per request; the connection pool hands out a
/// connection per statement and takes it back on every exit path.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub settings: Settings,
}

impl AppState {
    pub fn new(db: DatabaseConnection, settings: Settings) -> Self {
        Self { db, settings }
    }
}

// ---------- error type ----------

/// A JSON error response: `{"error": "..."}` with an HTTP status.
#[derive(Debug)]
pub struct ApiErr(StatusCode, String);

impl ApiErr {
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self(status, msg.into())
    }

    pub fn internal(e: impl std::fmt::Display) -> Self {
        tracing::error!(error = %e, "request failed");
        Self(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(StatusCode::BAD_REQUEST, msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self(StatusCode::NOT_FOUND, msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self(StatusCode::CONFLICT, msg.into())
    }

    pub fn status(&self) -> StatusCode {
        self.0
    }

    pub fn message(&self) -> &str {
        &self.1
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

// ---------- shared lookups ----------

/// Resolves the stage name given in a request body. An absent or blank name
/// is rejected like an unknown one.
pub(crate) async fn resolve_stage_name<C: ConnectionTrait>(
    db: &C,
    name: Option<&str>,
) -> Result<stage::Model, ApiErr> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() {
        return Err(ApiErr::bad_request("Stage not found"));
    }
    stage::find_by_name(db, name)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::bad_request(format!("Stage '{name}' not found")))
}

/// Confirms a stage id referenced from a request body exists.
pub(crate) async fn require_stage<C: ConnectionTrait>(
    db: &C,
    stage_id: i32,
) -> Result<stage::Model, ApiErr> {
    use sea_orm::EntityTrait;

    stage::Entity::find_by_id(stage_id)
        .one(db)
        .await
        .map_err(ApiErr::internal)?
        .ok_or_else(|| ApiErr::bad_request(format!("Stage {stage_id} not found")))
}

// ---------- router ----------

/// The API service, with trailing slashes trimmed before routing.
pub type App = NormalizePath<Router>;

pub fn router(state: AppState) -> App {
    let methods = [Method::GET, Method::POST, Method::PUT, Method::PATCH];
    let origins = &state.settings.cors_allowed_origins;

    let cors = if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(AllowOrigin::any())
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE])
    } else {
        let allowed_origins: Vec<HeaderValue> =
            origins.iter().filter_map(|s| s.parse().ok()).collect();
        if allowed_origins.is_empty() {
            CorsLayer::new() // no origins allowed = same-origin only
        } else {
            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods(methods)
                .allow_headers([header::CONTENT_TYPE])
        }
    };

    let uploads = Router::new()
        .route(
            "/import/employees",
            post(import_handlers::import_employees),
        )
        .route("/import/orders", post(import_handlers::import_orders))
        .layer(DefaultBodyLimit::max(state.settings.max_upload_bytes));

    let routes = Router::new()
        .route("/health", get(|| async { StatusCode::OK }))
        .merge(resources())
        .merge(uploads)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state);

    NormalizePathLayer::trim_trailing_slash().layer(routes)
}

fn resources() -> Router<AppState> {
    Router::new()
        // orders
        .route(
            "/orders",
            get(order_handlers::list_orders).post(order_handlers::create_order),
        )
        .route("/orders/{id}", patch(order_handlers::update_order_stage))
        .route(
            "/orders/{id}/tasks",
            get(task_handlers::list_order_tasks).post(task_handlers::create_order_tasks),
        )
        // employees
        .route(
            "/employees",
            get(employee_handlers::list_employees).post(employee_handlers::create_employee),
        )
        // stages
        .route("/stages", get(stage_handlers::list_stages))
        .route("/stages/{id}", get(stage_handlers::get_stage))
        .route("/stages/{id}/tasks", get(task_handlers::list_stage_tasks))
        // tasks
        .route("/tasks", get(task_handlers::list_tasks))
        .route("/tasks/{id}", put(task_handlers::update_task))
        // templates
        .route(
            "/template/employees",
            get(import_handlers::employee_template),
        )
        .route("/template/orders", get(import_handlers::order_template))
}

#[cfg(test)]
pub(crate) mod testing {
    use axum::{
        body::Body,
        http::{Method, Request, header},
        response::Response,
    };
    use migration::MigratorTrait as _;
    use sea_orm::{Database, DatabaseConnection};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    use super::{AppState, router};
    use crate::config::Settings;

    pub async fn setup_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    pub fn json_body(value: serde_json::Value) -> Body {
        Body::from(serde_json::to_string(&value).unwrap())
    }

    pub async fn send_request(db: &DatabaseConnection, req: Request<Body>) -> Response {
        router(AppState::new(db.clone(), Settings::default()))
            .oneshot(req)
            .await
            .unwrap()
    }

    pub async fn send(db: &DatabaseConnection, method: Method, uri: &str, body: Body) -> Response {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        send_request(db, req).await
    }

    pub async fn read_json<T: DeserializeOwned>(res: Response) -> T {
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use taskdesk_api::{app::AppState, config::Config};
/// use taskdesk_shared::db::{pool::create_pool, PgStore};
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let state = AppState::new(PgStore::new(pool), config)?;
/// let app = taskdesk_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{delete, get, patch, post, put},
    Router,
};
use std::sync::Arc;
use taskdesk_shared::{
    auth::{
        jwt::TokenIssuer,
        middleware::{jwt_auth_middleware, AuthError},
        password::{CredentialHasher, HashingCost},
        service::AuthService,
        session::SessionStore,
    },
    db::PgStore,
    employees::EmployeeService,
    store::{EmployeeStore, SessionRepository, TaskStore, TimeEntryStore},
    tasks::{MessageService, TaskService, TimeEntryService},
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// This is cloned for each request handler via Axum's `State` extractor.
/// Every service holds its storage behind an `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<Config>,

    /// Access/refresh token issuer, shared with the bearer layer
    pub tokens: Arc<TokenIssuer>,

    pub auth: AuthService,

    pub employees: EmployeeService,

    pub tasks: TaskService,

    pub messages: MessageService,

    pub time_entries: TimeEntryService,
}

impl AppState {
    /// Creates application state backed by PostgreSQL
    ///
    /// # Errors
    ///
    /// Returns an error if the token issuer or the credential hasher
    /// rejects its configuration.
    pub fn new(store: PgStore, config: Config) -> anyhow::Result<Self> {
        Self::with_backend(Arc::new(store), config, HashingCost::default())
    }

    /// Creates application state over any storage backend
    ///
    /// Tests use this with the in-memory store and a cheap hashing cost.
    pub fn with_backend<B>(backend: Arc<B>, config: Config, cost: HashingCost) -> anyhow::Result<Self>
    where
        B: EmployeeStore + SessionRepository + TaskStore + TimeEntryStore + 'static,
    {
        let tokens = Arc::new(TokenIssuer::new(config.token_config())?);
        let hasher = CredentialHasher::new(cost)?;
        let sessions = SessionStore::new(backend.clone());

        Ok(Self {
            auth: AuthService::new(backend.clone(), sessions, tokens.clone(), hasher),
            employees: EmployeeService::new(backend.clone()),
            tasks: TaskService::new(backend.clone(), backend.clone()),
            messages: MessageService::new(backend.clone()),
            time_entries: TimeEntryService::new(backend.clone(), backend),
            config: Arc::new(config),
            tokens,
        })
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// └── /v1/
///     ├── /auth/                       # register, login, refresh, logout (public)
///     │   └── POST /logout-all         # bearer
///     ├── /employees[/:id[/tasks|/time-entries]]  # bearer
///     ├── /tasks[/:id]                 # bearer
///     │   ├── PATCH /status, /archive
///     │   ├── /participants[/:employee_id/:role]
///     │   ├── /messages
///     │   ├── /time-entries
///     │   └── GET /time-summary
///     ├── /messages/:id                # bearer
///     └── /time-entries/:id            # bearer (get, update, delete)
/// ```
///
/// # Middleware Stack
///
/// Applied in order (bottom to top):
/// 1. Logging (tower-http TraceLayer)
/// 2. CORS (tower-http CorsLayer)
/// 3. Authentication (per-route basis)
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let bearer = axum::middleware::from_fn_with_state(state.tokens.clone(), bearer_auth);

    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh))
        .route("/logout", post(routes::auth::logout));

    let protected_auth_routes = Router::new()
        .route("/logout-all", post(routes::auth::logout_all))
        .layer(bearer.clone());

    let employee_routes = Router::new()
        .route(
            "/",
            get(routes::employees::list_employees).post(routes::employees::create_employee),
        )
        .route(
            "/:id",
            get(routes::employees::get_employee)
                .put(routes::employees::update_employee)
                .delete(routes::employees::delete_employee),
        )
        .route("/:id/tasks", get(routes::tasks::list_employee_tasks))
        .route(
            "/:id/time-entries",
            get(routes::time_entries::list_employee_time_entries),
        )
        .layer(bearer.clone());

    let task_routes = Router::new()
        .route(
            "/",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route("/:id/status", patch(routes::tasks::transition_status))
        .route("/:id/archive", patch(routes::tasks::archive_task))
        .route(
            "/:id/participants",
            get(routes::tasks::list_participants).post(routes::tasks::add_participant),
        )
        .route(
            "/:id/participants/:employee_id/:role",
            delete(routes::tasks::remove_participant),
        )
        .route(
            "/:id/messages",
            get(routes::messages::list_messages).post(routes::messages::post_message),
        )
        .route(
            "/:id/time-entries",
            get(routes::time_entries::list_time_entries).post(routes::time_entries::log_time),
        )
        .route("/:id/time-summary", get(routes::time_entries::time_summary))
        .layer(bearer.clone());

    let message_routes = Router::new()
        .route(
            "/:id",
            put(routes::messages::edit_message).delete(routes::messages::delete_message),
        )
        .layer(bearer.clone());

    let time_entry_routes = Router::new()
        .route(
            "/:id",
            get(routes::time_entries::get_time_entry)
                .put(routes::time_entries::update_time_entry)
                .delete(routes::time_entries::delete_time_entry),
        )
        .layer(bearer);

    // Build complete v1 API
    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(protected_auth_routes))
        .nest("/employees", employee_routes)
        .nest("/tasks", task_routes)
        .nest("/messages", message_routes)
        .nest("/time-entries", time_entry_routes);

    let cors = cors_layer(&state.config.api.cors_origins);

    // Combine all routes with middleware stack
    Router::new()
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|origin| origin == "*") {
        // Development mode: permissive CORS
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Bearer authentication layer
///
/// Verifies the access token and injects `AuthContext` into request
/// extensions.
async fn bearer_auth(
    State(tokens): State<Arc<TokenIssuer>>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    jwt_auth_middleware(tokens, req, next).await
}

/// Application state and router builder
///
/// Defines the shared application state and builds the Axum router with all
/// routes and middleware. Authentication is an explicit ordered pipeline:
/// the [`jwt_auth_layer`] runs first and injects an
/// [`AuthContext`](taskcamp_shared::auth::middleware::AuthContext); the
/// project-role gate then runs inside every project handler before any
/// project state is touched; only then does handler logic execute. An
/// unauthenticated or unauthorized caller never reaches a handler body.
use crate::{config::Config, email::Mailer, error::ApiError};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use taskcamp_shared::auth::{jwt, middleware as auth};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; the pool and config are
/// cheap to clone (pool is internally shared, config is behind an Arc).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Outbound mail sender
    pub mailer: Arc<Mailer>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        let mailer = Mailer::new(config.mail.clone());

        Self {
            db,
            config: Arc::new(config),
            mailer: Arc::new(mailer),
        }
    }

    /// JWT signing secret
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router
///
/// # Route layout
///
/// ```text
/// /
/// ├── /health                                   # public
/// └── /api/v1/
///     ├── /auth/
///     │   ├── POST /register                    # public
///     │   ├── POST /login                       # public
///     │   ├── GET  /verify-email/:token         # public
///     │   ├── POST /refresh-token               # public (refresh cookie)
///     │   ├── POST /forgot-password             # public
///     │   ├── POST /reset-password/:token       # public
///     │   ├── POST /logout                      # authenticated
///     │   ├── GET  /current-user                # authenticated
///     │   ├── POST /change-password             # authenticated
///     │   └── POST /resend-verification         # authenticated
///     └── /projects/                            # all authenticated,
///         │                                     # role-gated per handler
///         ├── GET/POST /
///         ├── GET/PUT/DELETE /:project_id
///         ├── GET/POST /:project_id/members
///         ├── PUT/DELETE /:project_id/members/:user_id
///         ├── GET/POST /:project_id/tasks
///         ├── GET/PUT/DELETE /:project_id/tasks/:task_id
///         ├── POST /:project_id/tasks/:task_id/subtasks
///         └── PUT/DELETE /:project_id/tasks/:task_id/subtasks/:subtask_id
/// ```
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes reachable without a session
    let public_auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/verify-email/:token", get(routes::auth::verify_email))
        .route("/refresh-token", post(routes::auth::refresh_token))
        .route("/forgot-password", post(routes::auth::forgot_password))
        .route(
            "/reset-password/:token",
            post(routes::auth::reset_password),
        );

    // Auth routes that require a valid access token
    let protected_auth_routes = Router::new()
        .route("/logout", post(routes::auth::logout))
        .route("/current-user", get(routes::auth::current_user))
        .route("/change-password", post(routes::auth::change_password))
        .route(
            "/resend-verification",
            post(routes::auth::resend_verification),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    // Project routes: authentication first, then the per-handler role gate
    let project_routes = Router::new()
        .route(
            "/",
            get(routes::projects::list_projects).post(routes::projects::create_project),
        )
        .route(
            "/:project_id",
            get(routes::projects::get_project)
                .put(routes::projects::update_project)
                .delete(routes::projects::delete_project),
        )
        .route(
            "/:project_id/members",
            get(routes::projects::list_members).post(routes::projects::add_member),
        )
        .route(
            "/:project_id/members/:user_id",
            put(routes::projects::update_member_role).delete(routes::projects::remove_member),
        )
        .route(
            "/:project_id/tasks",
            get(routes::tasks::list_tasks).post(routes::tasks::create_task),
        )
        .route(
            "/:project_id/tasks/:task_id",
            get(routes::tasks::get_task)
                .put(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route(
            "/:project_id/tasks/:task_id/subtasks",
            post(routes::tasks::create_subtask),
        )
        .route(
            "/:project_id/tasks/:task_id/subtasks/:subtask_id",
            put(routes::tasks::update_subtask).delete(routes::tasks::delete_subtask),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", public_auth_routes.merge(protected_auth_routes))
        .nest("/projects", project_routes);

    let cors = build_cors_layer(&state.config);

    Router::new()
        .merge(health_routes)
        .nest("/api/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Configures CORS from the allowed-origins list
///
/// A lone "*" selects the permissive development mode; anything else is an
/// explicit origin allowlist with credentials enabled (cookies must flow).
fn build_cors_layer(config: &Config) -> CorsLayer {
    if config.api.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .api
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600))
}

/// Access-token authentication middleware
///
/// Reads the token from the `accessToken` cookie (or `Authorization:
/// Bearer` header), validates it, and injects [`auth::AuthContext`] into
/// request extensions. Handlers behind this layer can rely on the context
/// being present.
pub async fn jwt_auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = auth::extract_access_token(req.headers())
        .ok_or_else(|| ApiError::Unauthorized("Authentication token is missing".to_string()))?;

    let claims = jwt::validate_access_token(&token, state.jwt_secret())
        .map_err(|_| ApiError::Unauthorized("Invalid access token".to_string()))?;

    req.extensions_mut()
        .insert(auth::AuthContext::from_claims(&claims));

    Ok(next.run(req).await)
}

mod auth;
mod config;
mod dashboard;
mod db;
mod error;
mod mailer;
mod models;
mod properties;
mod query;
mod roles;
mod users;
mod validation;

use std::sync::Arc;

use axum::{
    extract::FromRef,
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use auth::token::TokenService;
use config::AppConfig;
use mailer::Mailer;

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::signup_handler,
        auth::handlers::signin_handler,
        auth::handlers::refresh_handler,
        properties::handlers::search_properties_handler,
        properties::handlers::show_property_handler,
    ),
    components(schemas(
        auth::models::SignupRequest,
        auth::models::SigninRequest,
        auth::models::EmailRequest,
        auth::models::ResetPasswordRequest,
        auth::models::SessionResponse,
        auth::models::TokenResponse,
        roles::models::Role,
        roles::models::RoleRequest,
        users::models::UserResponse,
        users::models::CreateUserRequest,
        users::models::UpdateUserRequest,
        users::models::UpdateProfileRequest,
        properties::models::PropertyResponse,
        properties::models::CreatePropertyRequest,
        properties::models::UpdatePropertyRequest,
        properties::models::AttachImagesRequest,
        properties::models::DetachImageRequest,
        dashboard::DashboardStats,
    )),
    tags(
        (name = "auth", description = "Registration, sign-in and session management"),
        (name = "properties", description = "Property listing endpoints")
    ),
    info(
        title = "Estate API",
        version = "1.0.0",
        description = "RESTful API for a real-estate listing platform"
    )
)]
struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub mailer: Arc<Mailer>,
    pub tokens: TokenService,
}

// Lets the auth extractors pull the token service straight out of state
impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Creates and configures the application router
pub fn create_router(state: AppState) -> Router {
    use tower_http::cors::{Any, CorsLayer};

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Auth
        .route("/api/auth/signup", post(auth::handlers::signup_handler))
        .route(
            "/api/auth/verify-email/:token",
            post(auth::handlers::verify_email_handler),
        )
        .route(
            "/api/auth/resend-verification",
            post(auth::handlers::resend_verification_handler),
        )
        .route("/api/auth/signin", post(auth::handlers::signin_handler))
        .route("/api/auth/signout", post(auth::handlers::signout_handler))
        .route(
            "/api/auth/refresh-token",
            post(auth::handlers::refresh_handler),
        )
        .route(
            "/api/auth/request-reset-password",
            post(auth::handlers::forgot_password_handler),
        )
        .route(
            "/api/auth/reset-password/:token",
            post(auth::handlers::reset_password_handler),
        )
        // Dashboard
        .route("/api/dashboard", get(dashboard::stats_handler))
        // Roles (admin)
        .route(
            "/api/roles",
            get(roles::handlers::list_roles_handler).post(roles::handlers::create_role_handler),
        )
        .route(
            "/api/roles/search",
            get(roles::handlers::search_roles_handler),
        )
        .route(
            "/api/roles/:role_id",
            get(roles::handlers::show_role_handler),
        )
        .route(
            "/api/roles/:role_id",
            put(roles::handlers::update_role_handler),
        )
        .route(
            "/api/roles/:role_id",
            delete(roles::handlers::delete_role_handler),
        )
        // Users
        .route(
            "/api/users/search",
            get(users::handlers::search_users_handler),
        )
        .route("/api/users", post(users::handlers::create_user_handler))
        .route(
            "/api/users/:user_id",
            get(users::handlers::show_user_handler),
        )
        .route(
            "/api/users/:user_id",
            patch(users::handlers::update_user_handler),
        )
        .route(
            "/api/users/:user_id",
            delete(users::handlers::delete_user_handler),
        )
        .route(
            "/api/users/:user_id/profile",
            patch(users::handlers::update_profile_handler),
        )
        // Properties
        .route(
            "/api/properties/search",
            get(properties::handlers::search_properties_handler),
        )
        .route(
            "/api/properties/:property_id",
            get(properties::handlers::show_property_handler),
        )
        .route(
            "/api/properties",
            post(properties::handlers::create_property_handler),
        )
        .route(
            "/api/properties/:property_id",
            patch(properties::handlers::update_property_handler),
        )
        .route(
            "/api/properties/:property_id",
            delete(properties::handlers::delete_property_handler),
        )
        .route(
            "/api/properties/:property_id/images",
            post(properties::handlers::attach_images_handler),
        )
        .route(
            "/api/properties/:property_id/images",
            delete(properties::handlers::detach_image_handler),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    tracing::info!("Estate API - Starting...");

    let config = AppConfig::from_env();

    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&config.database_url)
        .await
        .expect("Failed to create database pool");

    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // `estate-api seed` resets the data and loads the fixtures, then exits
    if std::env::args().nth(1).as_deref() == Some("seed") {
        db::clear_database(&db_pool)
            .await
            .expect("Failed to clear database");
        db::seed_database(&db_pool, &config.default_avatar_url)
            .await
            .expect("Failed to seed database");
        tracing::info!("Database seeded");
        return;
    }

    let purged = auth::repository::TokenRepository::new(db_pool.clone())
        .delete_expired()
        .await
        .expect("Failed to purge expired refresh tokens");
    if purged > 0 {
        tracing::info!("Purged {} expired refresh tokens", purged);
    }

    let mailer = Mailer::new(&config.mail, &config.client_url).expect("Failed to build mailer");
    let state = AppState {
        db: db_pool,
        tokens: TokenService::new(&config.jwt),
        mailer: Arc::new(mailer),
        config: Arc::new(config),
    };

    let addr = format!("{}:{}", state.config.host, state.config.port);
    let app = create_router(state);

    tracing::info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Estate API is running on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await.expect("Server error");
}

#[cfg(test)]
mod tests;

// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, quiz, result, submission},
    state::AppState,
    utils::jwt::{auth_middleware, teacher_middleware},
};

/// Assembles the main application router.
///
/// * Public auth routes; everything else requires a bearer token.
/// * Authoring and analytics routes additionally require the teacher role.
/// * Applies global middleware (Trace, CORS) and injects `AppState`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let teacher_only = || middleware::from_fn(teacher_middleware);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let quiz_routes = Router::new()
        .route(
            "/",
            get(quiz::list_quizzes).merge(post(quiz::create_quiz).route_layer(teacher_only())),
        )
        .route("/available", get(quiz::list_available))
        .route(
            "/{quiz_id}",
            get(quiz::get_quiz).merge(delete(quiz::delete_quiz).route_layer(teacher_only())),
        )
        .route(
            "/{quiz_id}/publish",
            put(quiz::set_published).route_layer(teacher_only()),
        )
        .route("/{quiz_id}/submit", post(submission::submit_quiz))
        .route(
            "/{quiz_id}/results",
            get(result::quiz_results).route_layer(teacher_only()),
        );

    // Auth runs first, then the per-route teacher check.
    let protected = Router::new()
        .nest("/api/quizzes", quiz_routes)
        .route("/api/responses/{response_id}", get(result::get_response))
        .route("/api/students/{user_id}/attempts", get(result::list_attempts))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/api/auth", auth_routes)
        .merge(protected)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

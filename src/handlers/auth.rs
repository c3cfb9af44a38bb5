// src/handlers/auth.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    config::Config,
    error::{AppError, is_unique_violation},
    extract::Json,
    models::user::{LoginRequest, RegisterRequest, User},
    utils::{
        hash::{hash_password, verify_password},
        id::new_user_id,
        jwt::{ROLE_STUDENT, sign_jwt},
    },
};

pub(crate) const USER_COLUMNS: &str = r#"
    u.id, u.email, u.institution_email, u.password, u.first_name, u.last_name,
    u.role, u.department, s.prn_number AS prn, t.teacher_id, t.designation, u.created_at
"#;

/// Registers a student or teacher account.
///
/// The `users` row and its role-specific row are written in one transaction.
/// Returns 201 Created with a signed token and the user (excluding password).
pub async fn register(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    payload.check_role_fields().map_err(AppError::BadRequest)?;

    let taken = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM users WHERE email = $1 OR institution_email = $2",
    )
    .bind(&payload.email)
    .bind(&payload.institution_email)
    .fetch_one(&pool)
    .await?;

    if taken > 0 {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let hashed_password = hash_password(&payload.password)?;
    let user_id = new_user_id();

    let mut tx = pool.begin().await?;

    let created_at = sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>(
        r#"
        INSERT INTO users (id, email, password, first_name, last_name, role, department, institution_email)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING created_at
        "#,
    )
    .bind(&user_id)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(&payload.first_name)
    .bind(&payload.last_name)
    .bind(&payload.role)
    .bind(&payload.department)
    .bind(&payload.institution_email)
    .fetch_one(&mut *tx)
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            AppError::Conflict("Email already registered".to_string())
        } else {
            AppError::internal(e, "Registration failed")
        }
    })?;

    if payload.role == ROLE_STUDENT {
        sqlx::query("INSERT INTO students (user_id, prn_number) VALUES ($1, $2)")
            .bind(&user_id)
            .bind(&payload.prn)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::internal(e, "Registration failed"))?;
    } else {
        sqlx::query("INSERT INTO teachers (user_id, teacher_id, designation) VALUES ($1, $2, $3)")
            .bind(&user_id)
            .bind(&payload.teacher_id)
            .bind(&payload.designation)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::internal(e, "Registration failed"))?;
    }

    tx.commit()
        .await
        .map_err(|e| AppError::internal(e, "Registration failed"))?;

    tracing::info!(user_id = %user_id, role = %payload.role, "User registered");

    let token = sign_jwt(&user_id, &payload.role, &config.jwt_secret, config.jwt_expiration)?;

    let is_student = payload.role == ROLE_STUDENT;
    let user = User {
        id: user_id,
        email: payload.email,
        institution_email: payload.institution_email,
        password: hashed_password,
        first_name: payload.first_name,
        last_name: payload.last_name,
        role: payload.role,
        department: payload.department,
        prn: if is_student { payload.prn } else { None },
        teacher_id: if is_student { None } else { payload.teacher_id },
        designation: if is_student { None } else { payload.designation },
        created_at,
    };

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User registered successfully",
            "token": token,
            "user": user,
        })),
    ))
}

/// Authenticates a user by email and returns a JWT token.
pub async fn login(
    State(pool): State<PgPool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = sqlx::query_as::<_, User>(&format!(
        r#"
        SELECT {USER_COLUMNS}
        FROM users u
        LEFT JOIN students s ON s.user_id = u.id
        LEFT JOIN teachers t ON t.user_id = u.id
        WHERE u.email = $1
        "#
    ))
    .bind(&payload.email)
    .fetch_optional(&pool)
    .await?;

    // Same message for unknown email and wrong password.
    let user = user.ok_or(AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(&user.id, &user.role, &config.jwt_secret, config.jwt_expiration)?;

    tracing::info!(user_id = %user.id, "User logged in");

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "token": token,
        "user": user,
    })))
}

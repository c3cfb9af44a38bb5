// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::jwt::{ROLE_STUDENT, ROLE_TEACHER};

/// A `users` row joined with its student/teacher extension.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub institution_email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    pub first_name: String,
    pub last_name: String,

    /// Account role: 'student' or 'teacher'.
    pub role: String,
    pub department: String,

    /// Set for students only.
    pub prn: Option<String>,
    /// Set for teachers only.
    pub teacher_id: Option<String>,
    pub designation: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for account registration.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(alias = "firstName")]
    #[validate(length(min = 1, max = 100, message = "First name is required."))]
    pub first_name: String,
    #[serde(alias = "lastName")]
    #[validate(length(min = 1, max = 100, message = "Last name is required."))]
    pub last_name: String,
    #[validate(email(message = "Email is invalid."))]
    pub email: String,
    #[serde(alias = "institutionEmail")]
    #[validate(email(message = "Institution email is invalid."))]
    pub institution_email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[validate(length(min = 1, max = 100, message = "Department is required."))]
    pub department: String,
    pub role: String,
    #[validate(length(min = 1, max = 50))]
    pub prn: Option<String>,
    #[serde(alias = "teacherId")]
    #[validate(length(min = 1, max = 50))]
    pub teacher_id: Option<String>,
    #[validate(length(max = 100))]
    pub designation: Option<String>,
}

impl RegisterRequest {
    /// Role-specific checks that field validators cannot express.
    pub fn check_role_fields(&self) -> Result<(), String> {
        match self.role.as_str() {
            ROLE_STUDENT if self.prn.is_none() => {
                Err("PRN number is required for students".to_string())
            }
            ROLE_TEACHER if self.teacher_id.is_none() => {
                Err("Teacher ID is required for teachers".to_string())
            }
            ROLE_STUDENT | ROLE_TEACHER => Ok(()),
            _ => Err("Role must be 'student' or 'teacher'".to_string()),
        }
    }
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn register(extra: serde_json::Value) -> RegisterRequest {
        let mut body = json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "institutionEmail": "ada@college.edu",
            "password": "analytical",
            "department": "Mathematics",
        });
        body.as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn students_need_a_prn() {
        let req = register(json!({ "role": "student" }));
        assert!(req.validate().is_ok());
        assert!(req.check_role_fields().is_err());

        let req = register(json!({ "role": "student", "prn": "PRN-001" }));
        assert!(req.check_role_fields().is_ok());
    }

    #[test]
    fn teachers_need_a_teacher_id() {
        let req = register(json!({ "role": "teacher", "teacherId": "T-9" }));
        assert!(req.check_role_fields().is_ok());
        assert!(register(json!({ "role": "teacher" })).check_role_fields().is_err());
    }

    #[test]
    fn unknown_roles_and_bad_emails_are_rejected() {
        assert!(register(json!({ "role": "admin" })).check_role_fields().is_err());
        let req = register(json!({ "role": "student", "prn": "1", "email": "nope" }));
        assert!(req.validate().is_err());
    }
}

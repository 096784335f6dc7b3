use wayfarer_db::users::{self, UserRow};
use wayfarer_db::{DbError, DbPool};

use crate::auth;
use crate::error::CoreError;
use crate::{AppConfig, Role};

const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
    pub requested_role: Option<String>,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: UserRow,
}

fn validate_email(email: &str) -> Result<(), CoreError> {
    let email = email.trim();
    let Some((local, domain)) = email.split_once('@') else {
        return Err(CoreError::Validation("Invalid email address".into()));
    };
    if local.is_empty() || domain.is_empty() || !domain.contains('.') || domain.contains('@') {
        return Err(CoreError::Validation("Invalid email address".into()));
    }
    Ok(())
}

/// Resolve the role a registration may actually receive. Unknown strings are
/// a validation error; ADMIN is never granted through this path and clamps
/// down to VISITOR.
fn registration_role(requested: Option<&str>) -> Result<Role, CoreError> {
    let Some(requested) = requested.filter(|r| !r.trim().is_empty()) else {
        return Ok(Role::Visitor);
    };
    match Role::parse(requested) {
        Some(Role::Admin) => Ok(Role::Visitor),
        Some(role) => Ok(role),
        None => Err(CoreError::Validation(format!("Unknown role: {requested}"))),
    }
}

pub async fn register(
    pool: &DbPool,
    config: &AppConfig,
    input: RegisterInput,
) -> Result<UserRow, CoreError> {
    if input.name.trim().is_empty() {
        return Err(CoreError::Validation("Name is required".into()));
    }
    validate_email(&input.email)?;
    if input.password.len() < MIN_PASSWORD_LEN {
        return Err(CoreError::Validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    let role = registration_role(input.requested_role.as_deref())?;

    if users::email_exists(pool, &input.email).await? {
        return Err(CoreError::EmailExists);
    }

    // Hashing is CPU-bound; keep it off the async workers.
    let hash = {
        let config = config.clone();
        let password = input.password.clone();
        tokio::task::spawn_blocking(move || auth::hash_password(&config, &password))
            .await
            .map_err(|e| CoreError::Internal(format!("hashing task failed: {e}")))??
    };

    let created = users::create_user(
        pool,
        input.name.trim(),
        &input.email,
        input.phone.as_deref().filter(|p| !p.trim().is_empty()),
        role.as_str(),
        &hash,
    )
    .await;

    match created {
        Ok(user) => {
            tracing::info!(user_id = user.id, role = %user.role, "registered new user");
            Ok(user)
        }
        // The existence check above races with concurrent registrations; the
        // unique index is the authority.
        Err(DbError::Sqlx(e))
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation()) =>
        {
            Err(CoreError::EmailExists)
        }
        Err(e) => Err(e.into()),
    }
}

/// Exchange credentials for a bearer token. Unknown email and wrong password
/// are indistinguishable: both burn an Argon2 verification and both surface
/// as `BadCredentials`.
pub async fn login(
    pool: &DbPool,
    config: &AppConfig,
    email: &str,
    password: &str,
) -> Result<LoginOutcome, CoreError> {
    let account = users::get_user_auth_by_email(pool, email).await?;

    let password = password.to_string();
    let verified = match &account {
        Some(row) => {
            let hash = row.password_hash.clone();
            tokio::task::spawn_blocking(move || auth::verify_password(&password, &hash))
                .await
                .map_err(|e| CoreError::Internal(format!("verify task failed: {e}")))?
        }
        None => {
            tokio::task::spawn_blocking(move || auth::verify_against_dummy(&password))
                .await
                .map_err(|e| CoreError::Internal(format!("verify task failed: {e}")))?;
            false
        }
    };

    let Some(row) = account.filter(|_| verified) else {
        return Err(CoreError::BadCredentials);
    };

    let token = auth::issue_token(config, &row.email, &row.role)?;
    Ok(LoginOutcome {
        token,
        user: UserRow {
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            role: row.role,
            created_at: row.created_at,
        },
    })
}

/// Resolve the user behind a bearer token. Token failures are
/// `Unauthenticated`; a valid token whose subject no longer exists is
/// `NotFound`.
pub async fn current_user(
    pool: &DbPool,
    config: &AppConfig,
    token: &str,
) -> Result<UserRow, CoreError> {
    let claims = auth::validate_token(config, token)?;
    users::get_user_by_email(pool, &claims.sub)
        .await?
        .ok_or(CoreError::NotFound)
}

/// Role gate. ADMIN passes every check.
pub fn require_role(user: &UserRow, required: Role) -> Result<(), CoreError> {
    match Role::parse(&user.role) {
        Some(role) if role == required || role == Role::Admin => Ok(()),
        _ => Err(CoreError::Forbidden),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_db::{create_pool, run_migrations};

    async fn test_pool() -> DbPool {
        let pool = create_pool("sqlite::memory:", 1).await.unwrap();
        run_migrations(&pool).await.unwrap();
        pool
    }

    fn test_config() -> AppConfig {
        AppConfig {
            argon2_memory_kib: 1024,
            argon2_iterations: 1,
            ..AppConfig::dev_defaults("test-secret")
        }
    }

    fn input(email: &str) -> RegisterInput {
        RegisterInput {
            name: "Awa Diop".into(),
            email: email.into(),
            password: "s3cret-pass".into(),
            phone: None,
            requested_role: None,
        }
    }

    #[tokio::test]
    async fn register_then_login_binds_token_to_email() {
        let pool = test_pool().await;
        let config = test_config();
        let user = register(&pool, &config, input("awa@example.com")).await.unwrap();
        assert_eq!(user.role, "VISITOR");

        let outcome = login(&pool, &config, "AWA@example.com", "s3cret-pass")
            .await
            .unwrap();
        let claims = auth::validate_token(&config, &outcome.token).unwrap();
        assert_eq!(claims.sub, "awa@example.com");
        assert_eq!(claims.role, "VISITOR");
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let pool = test_pool().await;
        let config = test_config();
        register(&pool, &config, input("dup@example.com")).await.unwrap();
        let result = register(&pool, &config, input("DUP@example.com")).await;
        assert!(matches!(result, Err(CoreError::EmailExists)));
    }

    #[tokio::test]
    async fn organizer_role_is_granted_admin_is_clamped() {
        let pool = test_pool().await;
        let config = test_config();

        let organizer = register(
            &pool,
            &config,
            RegisterInput {
                requested_role: Some("organizer".into()),
                ..input("org@example.com")
            },
        )
        .await
        .unwrap();
        assert_eq!(organizer.role, "ORGANIZER");

        let sneaky = register(
            &pool,
            &config,
            RegisterInput {
                requested_role: Some("ADMIN".into()),
                ..input("admin@example.com")
            },
        )
        .await
        .unwrap();
        assert_eq!(sneaky.role, "VISITOR");
    }

    #[tokio::test]
    async fn unknown_role_is_a_validation_error() {
        let pool = test_pool().await;
        let config = test_config();
        let result = register(
            &pool,
            &config,
            RegisterInput {
                requested_role: Some("SUPERUSER".into()),
                ..input("x@example.com")
            },
        )
        .await;
        assert!(matches!(result, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn malformed_inputs_are_rejected() {
        let pool = test_pool().await;
        let config = test_config();

        let bad_email = register(
            &pool,
            &config,
            RegisterInput {
                email: "not-an-email".into(),
                ..input("ignored@example.com")
            },
        )
        .await;
        assert!(matches!(bad_email, Err(CoreError::Validation(_))));

        let short_password = register(
            &pool,
            &config,
            RegisterInput {
                password: "short".into(),
                ..input("y@example.com")
            },
        )
        .await;
        assert!(matches!(short_password, Err(CoreError::Validation(_))));

        let blank_name = register(
            &pool,
            &config,
            RegisterInput {
                name: "   ".into(),
                ..input("z@example.com")
            },
        )
        .await;
        assert!(matches!(blank_name, Err(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn login_failures_are_uniform() {
        let pool = test_pool().await;
        let config = test_config();
        register(&pool, &config, input("real@example.com")).await.unwrap();

        let unknown = login(&pool, &config, "nobody@example.com", "whatever")
            .await
            .unwrap_err();
        let wrong = login(&pool, &config, "real@example.com", "wrong-password")
            .await
            .unwrap_err();
        assert_eq!(unknown.to_string(), "Invalid credentials");
        assert_eq!(wrong.to_string(), "Invalid credentials");
    }

    #[tokio::test]
    async fn current_user_resolves_token_subject() {
        let pool = test_pool().await;
        let config = test_config();
        register(&pool, &config, input("me@example.com")).await.unwrap();
        let outcome = login(&pool, &config, "me@example.com", "s3cret-pass")
            .await
            .unwrap();

        let me = current_user(&pool, &config, &outcome.token).await.unwrap();
        assert_eq!(me.email, "me@example.com");

        let bad = current_user(&pool, &config, "garbage-token").await;
        assert!(matches!(bad, Err(CoreError::Unauthenticated)));
    }

    #[tokio::test]
    async fn require_role_admits_admin_everywhere() {
        let pool = test_pool().await;
        let config = test_config();
        let user = register(&pool, &config, input("vis@example.com")).await.unwrap();

        assert!(require_role(&user, Role::Visitor).is_ok());
        assert!(matches!(
            require_role(&user, Role::Organizer),
            Err(CoreError::Forbidden)
        ));

        let admin = wayfarer_db::users::update_user_role(&pool, user.id, "ADMIN")
            .await
            .unwrap();
        assert!(require_role(&admin, Role::Organizer).is_ok());
    }
}

use uuid::Uuid;

use crate::core::security;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::types::{AccountStatus, UserRole};
use crate::repositories;

/// Creates or repairs the default admin account from FIRST_SUPERUSER_* settings.
pub(crate) async fn ensure_superuser(state: &AppState) -> anyhow::Result<()> {
    let admin = state.settings().admin();
    if admin.first_superuser_password.is_empty() {
        tracing::warn!("FIRST_SUPERUSER_PASSWORD not configured; skipping superuser creation");
        return Ok(());
    }

    let email = &admin.first_superuser_email;
    let user = repositories::users::find_by_email(state.db(), email).await?;
    let now = primitive_now_utc();

    if let Some(user) = user {
        let mut needs_update = false;
        let verified =
            security::verify_password(&admin.first_superuser_password, &user.hashed_password)
                .unwrap_or(false);

        let hashed_password = if verified {
            user.hashed_password.clone()
        } else {
            needs_update = true;
            security::hash_password(&admin.first_superuser_password)?
        };

        let role = if user.role != UserRole::Admin {
            needs_update = true;
            UserRole::Admin
        } else {
            user.role
        };

        let account_status = if user.account_status != AccountStatus::Active {
            needs_update = true;
            AccountStatus::Active
        } else {
            user.account_status
        };

        if needs_update {
            sqlx::query(
                "UPDATE users
                 SET hashed_password = $1,
                     role = $2,
                     account_status = $3,
                     updated_at = $4
                 WHERE id = $5",
            )
            .bind(hashed_password)
            .bind(role)
            .bind(account_status)
            .bind(now)
            .bind(user.id)
            .execute(state.db())
            .await?;

            tracing::info!("Updated default superuser {email}");
        } else {
            tracing::info!("Default superuser already up to date");
        }

        return Ok(());
    }

    let hashed_password = security::hash_password(&admin.first_superuser_password)?;

    sqlx::query(
        "INSERT INTO users (
            id, email, hashed_password, full_name, role, account_status,
            profile_completed, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)",
    )
    .bind(Uuid::new_v4().to_string())
    .bind(email)
    .bind(hashed_password)
    .bind("Super Admin")
    .bind(UserRole::Admin)
    .bind(AccountStatus::Active)
    .bind(true)
    .bind(now)
    .bind(now)
    .execute(state.db())
    .await?;

    tracing::info!("Created default superuser {email}");
    Ok(())
}

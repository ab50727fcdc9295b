use chrono::Utc;
use sqlx::SqlitePool;

use crate::auth::{hash_password, verify_password, Principal, RegisterRequest};
use crate::config::AdminSeed;
use crate::db::users::{self, NewUser};
use crate::error::AppError;
use crate::models::{Role, User};

/// Stored user accounts: registration, login checks and principal lookup.
#[derive(Clone)]
pub struct CredentialStore {
    pool: SqlitePool,
    hash_cost: u32,
}

impl CredentialStore {
    pub fn new(pool: SqlitePool, hash_cost: u32) -> Self {
        Self { pool, hash_cost }
    }

    /// Creates an active user with the `USER` role.
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, AppError> {
        let username = request.username.trim();
        let email = request.email.trim();
        let password_hash = hash_password(&request.password, self.hash_cost)?;

        let mut tx = self.pool.begin().await?;
        if users::exists_by_username(&mut *tx, username).await? {
            return Err(AppError::Duplicate("Username already taken".into()));
        }
        if users::exists_by_email(&mut *tx, email).await? {
            return Err(AppError::Duplicate("Email already registered".into()));
        }

        let user = users::insert(
            &mut *tx,
            NewUser {
                username,
                email,
                name: request.name.trim(),
                password_hash: &password_hash,
                role: Role::User,
                created_at: Utc::now(),
            },
        )
        .await?;
        tx.commit().await?;

        log::info!("registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Checks a login attempt. Unknown users, inactive users and wrong passwords
    /// all produce the same error.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;
        let user = users::find_by_username(&mut *tx, username.trim()).await?;
        tx.commit().await?;

        match user {
            Some(user) if user.active && verify_password(password, &user.password_hash)? => Ok(user),
            _ => Err(AppError::Unauthorized("Invalid credentials".into())),
        }
    }

    /// The principal for an active user, if there is one.
    pub async fn find_principal(&self, username: &str) -> Result<Option<Principal>, AppError> {
        let mut tx = self.pool.begin().await?;
        let user = users::find_by_username(&mut *tx, username).await?;
        tx.commit().await?;

        Ok(user.filter(|user| user.active).map(|user| Principal {
            user_id: user.id,
            username: user.username,
            role: user.role,
        }))
    }

    /// Makes sure the configured administrator exists and can log in, promoting and
    /// reactivating an existing account with the same username instead of creating a
    /// second one.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<User, AppError> {
        let mut tx = self.pool.begin().await?;

        let admin = match users::find_by_username(&mut *tx, &seed.username).await? {
            Some(existing) if existing.role == Role::Admin && existing.active => existing,
            Some(existing) => {
                if existing.role != Role::Admin {
                    users::set_role(&mut *tx, existing.id, Role::Admin).await?;
                    log::info!("promoted {} to administrator", existing.username);
                }
                if !existing.active {
                    users::set_active(&mut *tx, existing.id, true).await?;
                    log::info!("reactivated administrator {}", existing.username);
                }
                User {
                    role: Role::Admin,
                    active: true,
                    ..existing
                }
            }
            None => {
                let password_hash = hash_password(&seed.password, self.hash_cost)?;
                let user = users::insert(
                    &mut *tx,
                    NewUser {
                        username: &seed.username,
                        email: &seed.email,
                        name: &seed.name,
                        password_hash: &password_hash,
                        role: Role::Admin,
                        created_at: Utc::now(),
                    },
                )
                .await?;
                log::info!("created administrator {}", user.username);
                user
            }
        };

        tx.commit().await?;
        Ok(admin)
    }
}

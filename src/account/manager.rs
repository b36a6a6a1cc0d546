/// Account manager implementation using runtime queries
use crate::{
    account::{
        blank_to_none, password, AccountSummary, CreateAccountRequest, LoginRequest,
        LoginResponse, RegisterRequest, UpdateAccountRequest,
    },
    auth::{Claims, TokenCodec},
    config::BootstrapAdmin,
    db::{self, models::Account},
    error::{HelpdeskError, HelpdeskResult},
    policy::{self, Action, Role},
};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

const INVALID_CREDENTIALS: &str = "Invalid phone or password";

/// Fields of a new account after validation and hashing
struct NewAccount {
    name: String,
    phone: String,
    email: Option<String>,
    password_hash: String,
    role: Role,
    subscription_plan: Option<String>,
}

/// Account manager service
pub struct AccountManager {
    db: SqlitePool,
    tokens: Arc<TokenCodec>,
    timeout: Duration,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, tokens: Arc<TokenCodec>, timeout: Duration) -> Self {
        Self { db, tokens, timeout }
    }

    /// Self-service registration; always creates a `user` account
    pub async fn register(&self, req: RegisterRequest) -> HelpdeskResult<Account> {
        let req = req.normalized();
        req.validate()?;

        tracing::info!("Registering account for phone {}", req.phone);

        let password_hash = password::hash_password_blocking(req.password).await?;
        self.insert_account(NewAccount {
            name: req.name,
            phone: req.phone,
            email: req.email,
            password_hash,
            role: Role::User,
            subscription_plan: None,
        })
        .await
    }

    /// Admin-provisioned account creation with an explicit role
    pub async fn create_account(
        &self,
        claims: &Claims,
        req: CreateAccountRequest,
    ) -> HelpdeskResult<Account> {
        policy::authorize(claims, Action::CreateAccount)?;

        let req = req.normalized();
        req.validate()?;

        tracing::info!(
            "Admin {} creating {} account for phone {}",
            claims.user_id,
            req.role,
            req.phone
        );

        let password_hash = password::hash_password_blocking(req.password).await?;
        self.insert_account(NewAccount {
            name: req.name,
            phone: req.phone,
            email: req.email,
            password_hash,
            role: req.role,
            subscription_plan: req.subscription_plan,
        })
        .await
    }

    /// Uniqueness checks and insert run in one transaction; the UNIQUE
    /// constraints catch anything that races past the checks.
    async fn insert_account(&self, new: NewAccount) -> HelpdeskResult<Account> {
        db::bounded(self.timeout, async {
            let mut tx = db::begin_write(&self.db).await?;

            if Self::phone_exists(&mut tx, &new.phone).await? {
                tracing::warn!("Phone {} already registered", new.phone);
                return Err(HelpdeskError::Conflict(
                    "Phone number already registered".to_string(),
                ));
            }

            if let Some(ref email) = new.email {
                if Self::email_exists(&mut tx, email).await? {
                    tracing::warn!("Email already registered for phone {}", new.phone);
                    return Err(HelpdeskError::Conflict("Email already registered".to_string()));
                }
            }

            let now = Utc::now();
            let result = sqlx::query(
                "INSERT INTO users (name, phone, email, password_hash, role, subscription_plan, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )
            .bind(&new.name)
            .bind(&new.phone)
            .bind(&new.email)
            .bind(&new.password_hash)
            .bind(new.role.as_str())
            .bind(&new.subscription_plan)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(|e| HelpdeskError::from_store(e, "Phone or email already registered"))?;

            tx.commit().await?;

            let id = result.last_insert_rowid();
            tracing::info!("Account {} created with role {}", id, new.role);

            Ok(Account {
                id,
                name: new.name,
                phone: new.phone,
                email: new.email,
                password_hash: new.password_hash,
                role: new.role,
                subscription_plan: new.subscription_plan,
                subscription_start: None,
                subscription_end: None,
                created_at: now,
            })
        })
        .await
    }

    /// Authenticate by phone and password and issue an identity token
    ///
    /// A missing account and a wrong password produce the same error.
    pub async fn login(&self, req: LoginRequest) -> HelpdeskResult<LoginResponse> {
        let phone = req.phone.trim().to_string();
        if phone.is_empty() || req.password.is_empty() {
            return Err(HelpdeskError::Validation(
                "Phone and password are required".to_string(),
            ));
        }

        let account = db::bounded(self.timeout, self.find_by_phone(&phone)).await?;
        let stored_hash = account.as_ref().map(|a| a.password_hash.clone());

        let valid = password::verify_password_blocking(req.password, stored_hash).await?;

        let account = match account {
            Some(account) if valid => account,
            _ => {
                tracing::warn!("Failed login attempt for phone {}", phone);
                return Err(HelpdeskError::Authentication(INVALID_CREDENTIALS.to_string()));
            }
        };

        let token = self.tokens.issue(account.id, account.role)?;
        tracing::info!("Account {} logged in", account.id);

        Ok(LoginResponse {
            token,
            user: AccountSummary::from(&account),
        })
    }

    /// List all accounts (admin only)
    pub async fn list_accounts(&self, claims: &Claims) -> HelpdeskResult<Vec<Account>> {
        policy::authorize(claims, Action::ListAccounts)?;

        db::bounded(self.timeout, async {
            let rows = sqlx::query(&format!(
                "SELECT {} FROM users ORDER BY id ASC",
                Account::COLUMNS
            ))
            .fetch_all(&self.db)
            .await?;

            rows.iter().map(Account::from_row).collect()
        })
        .await
    }

    /// Get one account (admin or the account itself)
    pub async fn get_account(&self, claims: &Claims, account_id: i64) -> HelpdeskResult<Account> {
        policy::authorize(claims, Action::ReadAccount { account_id })?;

        db::bounded(self.timeout, self.fetch_account(account_id)).await
    }

    /// Update name and/or subscription plan (admin or the account itself)
    pub async fn update_account(
        &self,
        claims: &Claims,
        account_id: i64,
        req: UpdateAccountRequest,
    ) -> HelpdeskResult<Account> {
        policy::authorize(claims, Action::UpdateAccount { account_id })?;

        if req.name.is_none() && req.subscription_plan.is_none() {
            return Err(HelpdeskError::Validation(
                "Nothing to update: provide name or subscription_plan".to_string(),
            ));
        }

        let name = match req.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(HelpdeskError::Validation("Name cannot be empty".to_string()));
                }
                Some(name)
            }
            None => None,
        };
        // Some(None) clears the plan, None leaves it unchanged
        let plan = req.subscription_plan.map(|p| blank_to_none(Some(p)));

        db::bounded(self.timeout, async {
            let result = sqlx::query(
                "UPDATE users
                 SET name = COALESCE(?1, name),
                     subscription_plan = CASE WHEN ?2 THEN ?3 ELSE subscription_plan END
                 WHERE id = ?4",
            )
            .bind(&name)
            .bind(plan.is_some())
            .bind(plan.clone().flatten())
            .bind(account_id)
            .execute(&self.db)
            .await?;

            if result.rows_affected() == 0 {
                return Err(HelpdeskError::NotFound("User not found".to_string()));
            }

            tracing::info!("Account {} updated by {}", account_id, claims.user_id);
            self.fetch_account(account_id).await
        })
        .await
    }

    /// Delete an account (admin only)
    pub async fn delete_account(&self, claims: &Claims, account_id: i64) -> HelpdeskResult<()> {
        policy::authorize(claims, Action::DeleteAccount)?;

        db::bounded(self.timeout, async {
            let result = sqlx::query("DELETE FROM users WHERE id = ?1")
                .bind(account_id)
                .execute(&self.db)
                .await?;

            if result.rows_affected() == 0 {
                return Err(HelpdeskError::NotFound("User not found".to_string()));
            }

            tracing::info!("Account {} deleted by admin {}", account_id, claims.user_id);
            Ok(())
        })
        .await
    }

    /// Create the configured admin account unless its phone is already registered
    pub async fn ensure_bootstrap_admin(
        &self,
        admin: &BootstrapAdmin,
    ) -> HelpdeskResult<Option<Account>> {
        let phone = admin.phone.trim().to_string();

        if db::bounded(self.timeout, self.find_by_phone(&phone))
            .await?
            .is_some()
        {
            tracing::debug!("Bootstrap admin phone already registered, skipping");
            return Ok(None);
        }

        let password_hash = password::hash_password_blocking(admin.password.clone()).await?;
        let account = self
            .insert_account(NewAccount {
                name: admin.name.clone(),
                phone,
                email: None,
                password_hash,
                role: Role::Admin,
                subscription_plan: None,
            })
            .await?;

        tracing::info!("Bootstrap admin account {} created", account.id);
        Ok(Some(account))
    }

    async fn fetch_account(&self, account_id: i64) -> HelpdeskResult<Account> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE id = ?1",
            Account::COLUMNS
        ))
        .bind(account_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| HelpdeskError::NotFound("User not found".to_string()))?;

        Account::from_row(&row)
    }

    async fn find_by_phone(&self, phone: &str) -> HelpdeskResult<Option<Account>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM users WHERE phone = ?1",
            Account::COLUMNS
        ))
        .bind(phone)
        .fetch_optional(&self.db)
        .await?;

        row.as_ref().map(Account::from_row).transpose()
    }

    async fn phone_exists(tx: &mut Transaction<'_, Sqlite>, phone: &str) -> HelpdeskResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE phone = ?1)")
            .bind(phone)
            .fetch_one(&mut **tx)
            .await?;

        Ok(exists)
    }

    async fn email_exists(tx: &mut Transaction<'_, Sqlite>, email: &str) -> HelpdeskResult<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)")
            .bind(email)
            .fetch_one(&mut **tx)
            .await?;

        Ok(exists)
    }
}

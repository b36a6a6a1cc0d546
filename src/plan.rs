/// Subscription plans
use crate::{
    auth::Claims,
    db::{self, models::Plan},
    error::{HelpdeskError, HelpdeskResult},
    policy::{self, Action},
};
use serde::Deserialize;
use sqlx::SqlitePool;
use std::time::Duration;
use validator::Validate;

/// Plan create/replace request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PlanRequest {
    #[serde(default)]
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub remote_calls: i64,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub onsite_calls: i64,
}

impl PlanRequest {
    fn checked(mut self) -> HelpdeskResult<Self> {
        self.name = self.name.trim().to_string();
        if !self.price.is_finite() {
            return Err(HelpdeskError::Validation("Price must be a number".to_string()));
        }
        self.validate()?;
        Ok(self)
    }
}

/// Plan manager; mutations are admin-only, listing is open
#[derive(Clone)]
pub struct PlanManager {
    db: SqlitePool,
    timeout: Duration,
}

impl PlanManager {
    pub fn new(db: SqlitePool, timeout: Duration) -> Self {
        Self { db, timeout }
    }

    pub async fn list_plans(&self, claims: &Claims) -> HelpdeskResult<Vec<Plan>> {
        policy::authorize(claims, Action::ListPlans)?;

        db::bounded(self.timeout, async {
            let plans = sqlx::query_as::<_, Plan>(
                "SELECT id, name, price, remote_calls, onsite_calls FROM plans ORDER BY id ASC",
            )
            .fetch_all(&self.db)
            .await?;

            tracing::debug!("Retrieved {} plans", plans.len());
            Ok(plans)
        })
        .await
    }

    pub async fn get_plan(&self, claims: &Claims, plan_id: i64) -> HelpdeskResult<Plan> {
        policy::authorize(claims, Action::ReadPlan)?;

        db::bounded(self.timeout, self.fetch_plan(plan_id)).await
    }

    pub async fn create_plan(&self, claims: &Claims, req: PlanRequest) -> HelpdeskResult<Plan> {
        policy::authorize(claims, Action::CreatePlan)?;
        let req = req.checked()?;

        db::bounded(self.timeout, async {
            let result = sqlx::query(
                "INSERT INTO plans (name, price, remote_calls, onsite_calls) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(&req.name)
            .bind(req.price)
            .bind(req.remote_calls)
            .bind(req.onsite_calls)
            .execute(&self.db)
            .await?;

            let id = result.last_insert_rowid();
            tracing::info!("Plan '{}' ({}) created by admin {}", req.name, id, claims.user_id);

            Ok(Plan {
                id,
                name: req.name,
                price: req.price,
                remote_calls: req.remote_calls,
                onsite_calls: req.onsite_calls,
            })
        })
        .await
    }

    pub async fn update_plan(
        &self,
        claims: &Claims,
        plan_id: i64,
        req: PlanRequest,
    ) -> HelpdeskResult<Plan> {
        policy::authorize(claims, Action::UpdatePlan)?;
        let req = req.checked()?;

        db::bounded(self.timeout, async {
            let result = sqlx::query(
                "UPDATE plans SET name = ?1, price = ?2, remote_calls = ?3, onsite_calls = ?4 WHERE id = ?5",
            )
            .bind(&req.name)
            .bind(req.price)
            .bind(req.remote_calls)
            .bind(req.onsite_calls)
            .bind(plan_id)
            .execute(&self.db)
            .await?;

            if result.rows_affected() == 0 {
                return Err(HelpdeskError::NotFound("Plan not found".to_string()));
            }

            tracing::info!("Plan {} updated by admin {}", plan_id, claims.user_id);
            Ok(Plan {
                id: plan_id,
                name: req.name,
                price: req.price,
                remote_calls: req.remote_calls,
                onsite_calls: req.onsite_calls,
            })
        })
        .await
    }

    pub async fn delete_plan(&self, claims: &Claims, plan_id: i64) -> HelpdeskResult<()> {
        policy::authorize(claims, Action::DeletePlan)?;

        db::bounded(self.timeout, async {
            let result = sqlx::query("DELETE FROM plans WHERE id = ?1")
                .bind(plan_id)
                .execute(&self.db)
                .await?;

            if result.rows_affected() == 0 {
                return Err(HelpdeskError::NotFound("Plan not found".to_string()));
            }

            tracing::info!("Plan {} deleted by admin {}", plan_id, claims.user_id);
            Ok(())
        })
        .await
    }

    async fn fetch_plan(&self, plan_id: i64) -> HelpdeskResult<Plan> {
        sqlx::query_as::<_, Plan>(
            "SELECT id, name, price, remote_calls, onsite_calls FROM plans WHERE id = ?1",
        )
        .bind(plan_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| HelpdeskError::NotFound("Plan not found".to_string()))
    }
}

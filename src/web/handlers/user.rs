//! User status and plan handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use crate::db::{NewUser, PaymentRepository, UserRepository};
use crate::quota::{self, Plan};
use crate::web::dto::{
    ApiResponse, CheckUserStatusRequest, PlanResponse, SyncPlanRequest, UserStatusResponse,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// POST /check-user-status - report quota figures, provisioning on first contact.
///
/// A user the frontend knows about but the broker has never seen gets a
/// Free-plan row instead of an error.
pub async fn check_user_status(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CheckUserStatusRequest>,
) -> Result<Json<ApiResponse<UserStatusResponse>>, ApiError> {
    let users = UserRepository::new(state.db.pool());

    let user = match users.get_by_email(&body.email).await? {
        Some(user) => user,
        None => {
            info!(email = %body.email, "provisioning new free-plan user");
            users.create(&NewUser::new(&body.email, Plan::Free)).await?
        }
    };

    // Repair a stale cached limit before reporting figures
    let expected = quota::limit_for(user.plan());
    let user = if user.storage_limit as u64 != expected {
        warn!(
            email = %user.email,
            cached = user.storage_limit,
            expected,
            "repairing stale storage limit"
        );
        users.set_storage_limit(&user.email, expected).await?;
        users
            .get_by_email(&user.email)
            .await?
            .ok_or_else(|| ApiError::not_found("user disappeared during repair"))?
    } else {
        user
    };

    Ok(Json(ApiResponse::new(UserStatusResponse {
        email: user.email.clone(),
        plan: user.plan().to_string(),
        storage_used: user.storage_used.max(0) as u64,
        storage_limit: user.storage_limit.max(0) as u64,
        remaining: user.remaining(),
    })))
}

/// GET /api/user-plan/:email - resolve the plan for an email.
pub async fn user_plan(
    State(state): State<Arc<AppState>>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<PlanResponse>>, ApiError> {
    let users = UserRepository::new(state.db.pool());

    let user = users
        .get_by_email(&email)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user not found: {email}")))?;

    Ok(Json(ApiResponse::new(PlanResponse {
        email: user.email.clone(),
        plan: user.plan().to_string(),
    })))
}

/// POST /api/ste - apply the user's latest payment to their plan.
///
/// Reads the most recent payments row for the email and sets the plan to
/// the purchased product. With no payment on record the plan is left alone.
pub async fn sync_plan(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SyncPlanRequest>,
) -> Result<Json<ApiResponse<PlanResponse>>, ApiError> {
    let users = UserRepository::new(state.db.pool());
    let payments = PaymentRepository::new(state.db.pool());

    let user = users
        .get_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("user not found: {}", body.email)))?;

    let plan = match payments.latest_for_email(&body.email).await? {
        Some(payment) => {
            let plan: Plan = payment.product.parse().unwrap_or_default();
            if plan != user.plan() {
                info!(
                    email = %body.email,
                    from = %user.plan(),
                    to = %plan,
                    "applying plan change from latest payment"
                );
                users.set_plan(&body.email, plan).await?;
            }
            plan
        }
        None => user.plan(),
    };

    Ok(Json(ApiResponse::new(PlanResponse {
        email: body.email,
        plan: plan.to_string(),
    })))
}

//! Reporting endpoints

use axum::extract::{Query, State};
use axum::Json;
use std::sync::Arc;
use trim_core::report::RevenueReport;

use super::DateRangeQuery;
use crate::auth::CurrentUser;
use crate::error::ApiResult;
use crate::services::invoice_service::InvoiceService;
use crate::state::AppState;

/// GET /api/reports/revenue?from=&to=
pub async fn revenue(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    Query(query): Query<DateRangeQuery>,
) -> ApiResult<Json<RevenueReport>> {
    user.ensure_owner()?;
    let business_id = query.business().scoped(&user)?;
    let (from, to) = query.dates()?;
    let report = InvoiceService::new(state)
        .revenue(&business_id, from, to)
        .await?;
    Ok(Json(report))
}

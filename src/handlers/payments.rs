use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::config::AppConfig;
use crate::error::CoreError;
use crate::models::PaginationQuery;
use crate::models::payment_distributions::{
    DistributionListQuery, SettlementAction, SettlementUpdate,
};
use crate::models::payments::{FinalizePayment, RecordPayment};
use crate::services::ledger;

/// POST /api/payments: checkout records money collected for a rental.
pub async fn create_payment(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<RecordPayment>,
) -> Result<HttpResponse, CoreError> {
    let payment = ledger::record_payment(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(payment))
}

/// POST /api/payments/{id}/finalize: split the payment and create its
/// distribution rows.
pub async fn finalize_payment(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    path: web::Path<Uuid>,
    body: web::Json<FinalizePayment>,
) -> Result<HttpResponse, CoreError> {
    let settlement = ledger::finalize_payment(
        db.get_ref(),
        config.get_ref(),
        path.into_inner(),
        body.into_inner(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(settlement))
}

/// GET /api/payments/{id}/distributions: recipient rows of a payment.
pub async fn get_distributions(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CoreError> {
    let rows = ledger::distributions(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/payments/{id}/reconciliation: compare rows with the payment.
pub async fn get_reconciliation(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CoreError> {
    let summary = ledger::reconcile(db.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(summary))
}

/// GET /api/distributions?status=pending&page=1&limit=20: settlement work queue.
pub async fn list_distributions(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    filter: web::Query<DistributionListQuery>,
    paging: web::Query<PaginationQuery>,
) -> Result<HttpResponse, CoreError> {
    let rows = ledger::distributions_by_status(
        db.get_ref(),
        filter.status,
        paging.page(),
        paging.limit(),
    )
    .await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /api/distributions/{id}/{action}: settlement reports progress on a row.
pub async fn settle_distribution(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<(Uuid, SettlementAction)>,
    body: Option<web::Json<SettlementUpdate>>,
) -> Result<HttpResponse, CoreError> {
    let (id, action) = path.into_inner();
    let update = body.map(|b| b.into_inner()).unwrap_or_default();
    let row = ledger::settle_distribution(db.get_ref(), id, action, update).await?;
    Ok(HttpResponse::Ok().json(row))
}

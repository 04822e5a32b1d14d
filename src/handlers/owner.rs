use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::error::CoreError;
use crate::models::driver_assignments::ApproveAssignment;
use crate::services::fleet;

/// GET /api/owner/drivers: the caller's active drivers.
pub async fn get_drivers(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, CoreError> {
    let drivers = fleet::fleet(db.get_ref(), user.0).await?;
    Ok(HttpResponse::Ok().json(drivers))
}

/// POST /api/owner/drivers: add an approved driver to the caller's fleet.
pub async fn add_driver(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<ApproveAssignment>,
) -> Result<HttpResponse, CoreError> {
    let assignment = fleet::approve_assignment(db.get_ref(), user.0, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(assignment))
}

/// DELETE /api/owner/drivers/{assignment_id}: revoke a driver.
pub async fn revoke_driver(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CoreError> {
    let assignment = fleet::revoke_assignment(db.get_ref(), user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(assignment))
}

use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::error::CoreError;
use crate::models::rentals::RejectRental;
use crate::services::{claims, fleet, rentals};

/// GET /api/driver/assignment: the caller's active fleet membership.
pub async fn get_assignment(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, CoreError> {
    let assignment = fleet::active_assignment(db.get_ref(), user.0).await?;
    Ok(HttpResponse::Ok().json(assignment))
}

/// GET /api/driver/jobs/open: rentals the caller may claim.
pub async fn get_open_jobs(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, CoreError> {
    let jobs = claims::open_jobs(db.get_ref(), user.0).await?;
    Ok(HttpResponse::Ok().json(jobs))
}

/// GET /api/driver/jobs: rentals currently held by the caller.
pub async fn get_my_jobs(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
) -> Result<HttpResponse, CoreError> {
    let jobs = rentals::rentals_for_driver(db.get_ref(), user.0).await?;
    Ok(HttpResponse::Ok().json(jobs))
}

/// POST /api/driver/jobs/{rental_id}/claim: take an open rental.
///
/// A 409 with kind `already_claimed` means another driver won; pick a
/// different rental from the open list.
pub async fn claim_job(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CoreError> {
    let receipt = claims::claim_rental(db.get_ref(), user.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(receipt))
}

/// POST /api/driver/rentals/{id}/accept: the assigned driver accepts.
pub async fn accept_rental(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CoreError> {
    let rental = rentals::accept_rental(db.get_ref(), path.into_inner(), user.0).await?;
    Ok(HttpResponse::Ok().json(rental))
}

/// POST /api/driver/rentals/{id}/reject: the assigned driver declines.
pub async fn reject_rental(
    user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<RejectRental>,
) -> Result<HttpResponse, CoreError> {
    let rental =
        rentals::reject_rental(db.get_ref(), path.into_inner(), user.0, &body.reason).await?;
    Ok(HttpResponse::Ok().json(rental))
}

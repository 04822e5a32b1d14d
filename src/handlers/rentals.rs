use actix_web::{HttpResponse, web};
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::auth::middleware::AuthenticatedUser;
use crate::error::CoreError;
use crate::lifecycle;
use crate::models::rentals::{NewRental, UpdateRentalStatus};
use crate::services::rentals;

/// POST /api/rentals: booking flow hands over a new rental.
pub async fn create_rental(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    body: web::Json<NewRental>,
) -> Result<HttpResponse, CoreError> {
    let rental = rentals::register_rental(db.get_ref(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(rental))
}

/// GET /api/rentals/{id}: a rental with its derived driver state.
pub async fn get_rental(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, CoreError> {
    let rental = rentals::get_rental(db.get_ref(), path.into_inner()).await?;
    let driver_state = lifecycle::driver_state(&rental);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "rental": rental,
        "driver_state": driver_state,
    })))
}

/// POST /api/rentals/{id}/status: fulfillment advances the rental.
pub async fn update_status(
    _user: AuthenticatedUser,
    db: web::Data<DatabaseConnection>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateRentalStatus>,
) -> Result<HttpResponse, CoreError> {
    let rental = rentals::change_status(db.get_ref(), path.into_inner(), body.action).await?;
    Ok(HttpResponse::Ok().json(rental))
}

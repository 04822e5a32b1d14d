pub mod driver;
pub mod owner;
pub mod payments;
pub mod rentals;

use actix_web::web;

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // ── Driver routes (caller is the driver) ──
    cfg.service(
        web::scope("/driver")
            .route("/assignment", web::get().to(driver::get_assignment))
            .route("/jobs", web::get().to(driver::get_my_jobs))
            .route("/jobs/open", web::get().to(driver::get_open_jobs))
            .route("/jobs/{rental_id}/claim", web::post().to(driver::claim_job))
            .route("/rentals/{id}/accept", web::post().to(driver::accept_rental))
            .route("/rentals/{id}/reject", web::post().to(driver::reject_rental)),
    );

    // ── Owner routes (caller is the car owner) ──
    cfg.service(
        web::scope("/owner")
            .route("/drivers", web::get().to(owner::get_drivers))
            .route("/drivers", web::post().to(owner::add_driver))
            .route("/drivers/{assignment_id}", web::delete().to(owner::revoke_driver)),
    );

    // ── Rental intake and fulfillment ──
    cfg.service(
        web::scope("/rentals")
            .route("", web::post().to(rentals::create_rental))
            .route("/{id}", web::get().to(rentals::get_rental))
            .route("/{id}/status", web::post().to(rentals::update_status)),
    );

    // ── Payments and distribution ledger ──
    cfg.service(
        web::scope("/payments")
            .route("", web::post().to(payments::create_payment))
            .route("/{id}/finalize", web::post().to(payments::finalize_payment))
            .route("/{id}/distributions", web::get().to(payments::get_distributions))
            .route("/{id}/reconciliation", web::get().to(payments::get_reconciliation)),
    );
    cfg.service(
        web::scope("/distributions")
            .route("", web::get().to(payments::list_distributions))
            .route("/{id}/{action}", web::post().to(payments::settle_distribution)),
    );
}

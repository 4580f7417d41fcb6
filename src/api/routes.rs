// API route configuration

use crate::api::handlers;
use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health_check))
        .service(
            web::scope("/api/v1")
                .route("/health", web::get().to(handlers::health_check))
                .route("/regions", web::get().to(handlers::list_regions))
                .route(
                    "/regions/{region}/machines",
                    web::get().to(handlers::list_machines),
                )
                .route(
                    "/regions/{region}/machines/{machine_type}/history",
                    web::get().to(handlers::machine_history),
                ),
        );
}

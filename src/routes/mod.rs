// Route exports
pub mod meeting_points;

use actix_web::web;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(meeting_points::configure),
    );
}

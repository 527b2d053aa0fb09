use crate::api::attendance;
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{http::Method, web};
use std::sync::Arc;

pub type AttendanceLimiter = Governor<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst. `None` when disabled (0).
pub fn build_limiter(requests_per_min: u32) -> Option<AttendanceLimiter> {
    if requests_per_min == 0 {
        return None;
    }

    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;

    Some(Governor::new(&cfg))
}

pub fn configure(cfg: &mut web::ServiceConfig, limiter: Option<Arc<AttendanceLimiter>>) {
    let scope = web::scope("/attendance")
        // /attendance
        .service(
            web::resource("")
                .route(web::get().to(attendance::list_students))
                .route(web::post().to(attendance::check_in))
                .route(web::head().to(attendance::list_students))
                .route(web::method(Method::OPTIONS).to(attendance::allowed_methods))
                .default_service(web::route().to(attendance::method_not_allowed)),
        )
        // /attendance/{student_id}
        .service(
            web::resource(r"/{student_id:\d+}")
                .route(web::get().to(attendance::get_student_attendance)),
        );

    match limiter {
        Some(limiter) => cfg.service(scope.wrap(limiter)),
        None => cfg.service(scope),
    };
}

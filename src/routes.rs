use crate::{
    api::{attendance, users},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);

    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("non-zero period and burst size");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Login and registration are public; the rest of /auth needs a token
    cfg.service(
        web::scope("/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/register")
                    .wrap(register_limiter.clone())
                    .route(web::post().to(handlers::register)),
            )
            .service(
                web::resource("/logout")
                    .wrap(from_fn(auth_middleware))
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/logout/status")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::get().to(handlers::logout_status)),
            )
            .service(
                web::resource("/allowed-users")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::get().to(handlers::list_allowed_users))
                    .route(web::post().to(handlers::add_allowed_user)),
            )
            .service(
                web::resource("/allowed-users/{email}")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::delete().to(handlers::remove_allowed_user)),
            )
            .service(
                web::resource("/login-restriction")
                    .wrap(from_fn(auth_middleware))
                    .wrap(protected_limiter.clone())
                    .route(web::put().to(handlers::set_login_restriction)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware))
            .wrap(protected_limiter)
            .service(
                web::scope("/users")
                    // /users
                    .route("", web::get().to(users::list_users))
                    .route("/me", web::get().to(users::me))
                    // /users/{id}
                    .route("/{id}", web::get().to(users::get_user))
                    .route("/{id}/activate", web::put().to(users::activate_user))
                    .route("/{id}/deactivate", web::put().to(users::deactivate_user)),
            )
            .service(
                web::scope("/attendance")
                    .route("/clock-in", web::post().to(attendance::clock_in))
                    .route("/clock-out", web::post().to(attendance::clock_out))
                    .route("/cancel-clock-out", web::post().to(attendance::cancel_clock_out))
                    .route("/break/start", web::post().to(attendance::start_break))
                    .route("/break/end", web::post().to(attendance::end_break))
                    .route("/today", web::get().to(attendance::today))
                    .route("/status", web::get().to(attendance::status))
                    .route("/records", web::get().to(attendance::records))
                    .route("/history", web::get().to(attendance::history))
                    .route("/summary/monthly", web::get().to(attendance::monthly_summary))
                    // admin
                    .route("/users/{id}/records", web::get().to(attendance::user_records))
                    .route(
                        "/users/{id}/summary/monthly",
                        web::get().to(attendance::user_monthly_summary),
                    ),
            ),
    );
}

use actix_web::{App, HttpResponse, HttpServer, middleware::Logger, web};
use std::io;
use std::sync::Arc;

use promo_backend::{
    AppError,
    config::Config,
    context::AppContext,
    handlers,
    logging,
    middlewares::{RateLimitMiddleware, RateLimiter, create_cors, security_headers},
    swagger::swagger_config,
    tasks,
    utils::ClientIpPolicy,
};

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; charset=utf-8")
        .body("Promo backend is running")
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    logging::init();

    // 加载配置
    let config = Config::from_toml()
        .map_err(|e| io::Error::other(format!("Failed to load configuration: {e}")))?;

    // 连接存储并运行迁移
    let ctx = AppContext::open(&config)
        .await
        .map_err(|e| io::Error::other(format!("Failed to open store: {e}")))?;

    let claim_service = ctx.claim_service();
    let winner_service = ctx.winner_service(&config);
    let reconciliation_service = ctx.reconciliation_service(&config);
    let rate_limiter = Arc::new(RateLimiter::new(&config.rate_limit));
    let ip_policy = ClientIpPolicy::new(config.server.trust_proxy);

    tasks::spawn_all(reconciliation_service.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let frontend_url = config.cors.frontend_url.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(RateLimitMiddleware::new(rate_limiter.clone(), ip_policy))
            .wrap(security_headers())
            .wrap(create_cors(frontend_url.as_deref()))
            .wrap(Logger::default())
            .app_data(web::JsonConfig::default().error_handler(|err, _req| {
                AppError::ValidationError(format!("Invalid JSON body: {err}")).into()
            }))
            .app_data(ip_policy)
            .app_data(web::Data::new(claim_service.clone()))
            .app_data(web::Data::new(winner_service.clone()))
            .app_data(web::Data::new(reconciliation_service.clone()))
            .configure(swagger_config)
            .route("/", web::get().to(index))
            .service(
                web::scope("/api")
                    .configure(handlers::redemption_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    ctx.close()
        .await
        .map_err(|e| io::Error::other(format!("Failed to close store: {e}")))
}

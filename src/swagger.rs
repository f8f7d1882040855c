use actix_web::web;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::ClaimResult;
use crate::handlers;
use crate::models::*;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::redemption::check_code,
        handlers::redemption::register_winner,
        handlers::admin::export_winners,
        handlers::admin::pending_claims,
    ),
    components(
        schemas(
            CheckCodeRequest,
            CheckCodeResponse,
            RegisterWinnerRequest,
            RegisterWinnerResponse,
            PendingClaimResponse,
            ClaimResult,
            ApiError,
            ErrorResponse,
        )
    ),
    tags(
        (name = "redemption", description = "Code check and prize claim API. Checking a non-prize code consumes it."),
        (name = "admin", description = "Winner export and reconciliation API (key protected)"),
    ),
    info(
        title = "Promo Backend API",
        version = "1.0.0",
        description = "Promotional code redemption REST API documentation"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

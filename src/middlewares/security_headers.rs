use actix_web::http::header::{
    CONTENT_SECURITY_POLICY, REFERRER_POLICY, STRICT_TRANSPORT_SECURITY, X_CONTENT_TYPE_OPTIONS,
    X_FRAME_OPTIONS,
};
use actix_web::middleware::DefaultHeaders;

/// 所有响应附带的安全头；处理器已设置的同名头不会被覆盖
pub fn security_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add((X_CONTENT_TYPE_OPTIONS, "nosniff"))
        .add((X_FRAME_OPTIONS, "DENY"))
        .add((REFERRER_POLICY, "no-referrer"))
        .add((STRICT_TRANSPORT_SECURITY, "max-age=15552000; includeSubDomains"))
        .add((CONTENT_SECURITY_POLICY, "frame-ancestors 'none'"))
        .add(("Cross-Origin-Resource-Policy", "same-site"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::{TestRequest, call_service, init_service};
    use actix_web::{App, HttpResponse, http::StatusCode, web};

    #[actix_web::test]
    async fn responses_carry_security_headers() {
        let app = init_service(
            App::new()
                .wrap(security_headers())
                .route("/", web::get().to(HttpResponse::Ok))
                .route(
                    "/framed",
                    web::get().to(|| async {
                        HttpResponse::Ok()
                            .insert_header((X_FRAME_OPTIONS, "SAMEORIGIN"))
                            .finish()
                    }),
                ),
        )
        .await;

        let resp = call_service(&app, TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers.get(X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(X_FRAME_OPTIONS).unwrap(), "DENY");
        assert_eq!(headers.get(REFERRER_POLICY).unwrap(), "no-referrer");
        assert!(headers.contains_key(STRICT_TRANSPORT_SECURITY));
        assert_eq!(
            headers.get("cross-origin-resource-policy").unwrap(),
            "same-site"
        );

        let resp = call_service(&app, TestRequest::get().uri("/framed").to_request()).await;
        assert_eq!(resp.headers().get(X_FRAME_OPTIONS).unwrap(), "SAMEORIGIN");
    }

    #[actix_web::test]
    async fn error_responses_carry_security_headers() {
        let app = init_service(App::new().wrap(security_headers())).await;
        let resp = call_service(&app, TestRequest::get().uri("/missing").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(resp.headers().get(X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
    }
}

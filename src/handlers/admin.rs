use crate::models::*;
use crate::services::{ReconciliationService, WinnerService};
use actix_web::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/export-winners",
    tag = "admin",
    params(AdminKeyQuery),
    responses(
        (status = 200, description = "中奖名单 CSV（winners.csv）", body = String, content_type = "text/csv"),
        (status = 403, description = "密钥错误", body = ErrorResponse)
    )
)]
pub async fn export_winners(
    winner_service: web::Data<WinnerService>,
    query: web::Query<AdminKeyQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = winner_service.verify_key(query.key.as_deref()) {
        return Ok(e.error_response());
    }

    match winner_service.export_csv().await {
        Ok(csv) => Ok(HttpResponse::Ok()
            .insert_header((CONTENT_TYPE, "text/csv; charset=utf-8"))
            .insert_header((CONTENT_DISPOSITION, "attachment; filename=\"winners.csv\""))
            .body(csv)),
        Err(e) => Ok(e.error_response()),
    }
}

/// 已占用但中奖登记未完成的兑换码，供人工对账
#[utoipa::path(
    get,
    path = "/admin/pending-claims",
    tag = "admin",
    params(AdminKeyQuery),
    responses(
        (status = 200, description = "待对账列表", body = [PendingClaimResponse]),
        (status = 403, description = "密钥错误", body = ErrorResponse)
    )
)]
pub async fn pending_claims(
    winner_service: web::Data<WinnerService>,
    reconciliation_service: web::Data<ReconciliationService>,
    query: web::Query<AdminKeyQuery>,
) -> Result<HttpResponse> {
    if let Err(e) = winner_service.verify_key(query.key.as_deref()) {
        return Ok(e.error_response());
    }

    match reconciliation_service.list_pending().await {
        Ok(pending) => {
            let items: Vec<PendingClaimResponse> =
                pending.into_iter().map(PendingClaimResponse::from).collect();
            Ok(HttpResponse::Ok().json(json!({
                "success": true,
                "data": items
            })))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/export-winners", web::get().to(export_winners))
        .route("/admin/pending-claims", web::get().to(pending_claims));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{CodeGuard, CodeStore, CodeUpdate, MemoryStore, RequestContext, WinnerRegistry};
    use crate::entities::{ClaimResult, winner_entity as winners};
    use actix_web::{App, http::StatusCode, test};
    use chrono::Utc;
    use serde_json::Value;
    use std::sync::Arc;
    use uuid::Uuid;

    async fn app_store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_winner(winners::Model {
                id: Uuid::new_v4(),
                name: "Ana".into(),
                surname: Some("Pérez".into()),
                email: "ana@example.com".into(),
                phone: None,
                address: Some("Av. Libertad, 10".into()),
                winning_code: "X1Y2Z3W4".into(),
                prize_awarded: "Balón".into(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        store.seed("PEND0001", Some("Camiseta")).await;
        store
            .update_code_if(
                "PEND0001",
                CodeGuard::Unclaimed,
                CodeUpdate::claim(
                    Utc::now(),
                    ClaimResult::Pending,
                    Some(Uuid::new_v4()),
                    &RequestContext::default(),
                ),
            )
            .await
            .unwrap();
        store
    }

    macro_rules! admin_app {
        ($store:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(WinnerService::new(
                        $store.clone(),
                        "s3cret".into(),
                    )))
                    .app_data(web::Data::new(ReconciliationService::new($store.clone(), 300)))
                    .service(web::scope("/api").configure(admin_config)),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn export_requires_the_key() {
        let store = app_store().await;
        let app = admin_app!(store);

        for uri in ["/api/export-winners", "/api/export-winners?key=nope"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        }
    }

    #[actix_web::test]
    async fn export_returns_csv_attachment() {
        let store = app_store().await;
        let app = admin_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/export-winners?key=s3cret")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"winners.csv\""
        );

        let body = test::read_body(resp).await;
        let text = std::str::from_utf8(&body).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "Name,Surname,Email,Phone,Address,Prize,Code,Date");
        assert!(lines[1].starts_with(r#""Ana","Pérez","ana@example.com",,"Av. Libertad, 10","Balón","X1Y2Z3W4","#));
    }

    #[actix_web::test]
    async fn pending_claims_are_listed_for_operators() {
        let store = app_store().await;
        let app = admin_app!(store);

        let req = test::TestRequest::get()
            .uri("/api/admin/pending-claims?key=wrong")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/admin/pending-claims?key=s3cret")
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["code"], "PEND0001");
        assert_eq!(body["data"][0]["result"], "pending");
    }
}

use crate::models::*;
use crate::services::{CheckOutcome, ClaimOutcome, ClaimService, PersonalInfo};
use crate::utils::request_context;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

const MSG_INVALID_CODE: &str = "Invalid code. Please check it.";
const MSG_ALREADY_REDEEMED: &str = "This code has already been redeemed.";
const MSG_INVALID_OR_USED: &str = "Error: the code is not valid or has already been used.";
const MSG_NOT_A_PRIZE: &str = "This code has no prize.";

/// 查询兑换码
///
/// 无奖品的兑换码在第一次查询时即被消耗（标记为已使用），之后不能再次查询或领奖。
#[utoipa::path(
    post,
    path = "/check-code",
    tag = "redemption",
    request_body = CheckCodeRequest,
    responses(
        (status = 200, description = "查询完成；success=false 表示码无效或已使用", body = CheckCodeResponse),
        (status = 400, description = "缺少兑换码", body = ErrorResponse),
        (status = 429, description = "请求过于频繁", body = ErrorResponse),
        (status = 500, description = "服务器错误", body = ErrorResponse)
    )
)]
pub async fn check_code(
    claim_service: web::Data<ClaimService>,
    req: HttpRequest,
    request: web::Json<CheckCodeRequest>,
) -> Result<HttpResponse> {
    let ctx = request_context(&req);
    let code = request.into_inner().code.unwrap_or_default();

    match claim_service.check_code(&code, &ctx).await {
        Ok(CheckOutcome::Invalid) => {
            Ok(HttpResponse::Ok().json(CheckCodeResponse::rejected(MSG_INVALID_CODE)))
        }
        Ok(CheckOutcome::AlreadyClaimed) => {
            Ok(HttpResponse::Ok().json(CheckCodeResponse::rejected(MSG_ALREADY_REDEEMED)))
        }
        Ok(CheckOutcome::Valid {
            is_prize,
            prize_type,
        }) => Ok(HttpResponse::Ok().json(CheckCodeResponse::valid(is_prize, prize_type))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/register-winner",
    tag = "redemption",
    request_body = RegisterWinnerRequest,
    responses(
        (status = 200, description = "领奖成功", body = RegisterWinnerResponse),
        (status = 400, description = "码无效、已使用、无奖品或个人信息缺失", body = RegisterWinnerResponse),
        (status = 429, description = "请求过于频繁", body = ErrorResponse),
        (status = 500, description = "领奖处理失败", body = ErrorResponse)
    )
)]
pub async fn register_winner(
    claim_service: web::Data<ClaimService>,
    req: HttpRequest,
    request: web::Json<RegisterWinnerRequest>,
) -> Result<HttpResponse> {
    let ctx = request_context(&req);
    let request = request.into_inner();
    let info = PersonalInfo {
        name: request.name.unwrap_or_default(),
        surname: request.surname,
        email: request.email.unwrap_or_default(),
        phone: request.phone,
        address: request.address,
    };
    let code = request.code.unwrap_or_default();

    match claim_service.claim_prize(&code, info, &ctx).await {
        Ok(ClaimOutcome::Success { prize_type, .. }) => {
            Ok(HttpResponse::Ok().json(RegisterWinnerResponse::won(prize_type)))
        }
        Ok(ClaimOutcome::InvalidOrAlreadyUsed) => Ok(HttpResponse::BadRequest()
            .json(RegisterWinnerResponse::rejected(MSG_INVALID_OR_USED))),
        Ok(ClaimOutcome::NotAPrizeCode) => {
            Ok(HttpResponse::BadRequest().json(RegisterWinnerResponse::rejected(MSG_NOT_A_PRIZE)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn redemption_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/check-code", web::post().to(check_code))
        .route("/register-winner", web::post().to(register_winner));
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 查询兑换码请求
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct CheckCodeRequest {
    #[serde(default)]
    pub code: Option<String>,
}

/// 查询兑换码响应
///
/// 注意：对无奖品的兑换码，查询本身会立即把它标记为已使用（lose），
/// 同一个码第二次查询返回“已兑换”。
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckCodeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_prize: Option<bool>,
    /// 有值时总会输出；无奖品时为 null
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub prize_type: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl CheckCodeResponse {
    pub fn valid(is_prize: bool, prize_type: Option<String>) -> Self {
        Self {
            success: true,
            is_prize: Some(is_prize),
            prize_type: Some(prize_type),
            message: None,
        }
    }

    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            is_prize: None,
            prize_type: None,
            message: Some(message.to_string()),
        }
    }
}

/// 中奖登记请求（个人信息只校验必填项是否存在）
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct RegisterWinnerRequest {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub surname: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterWinnerResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prize: Option<String>,
}

impl RegisterWinnerResponse {
    pub fn won(prize: String) -> Self {
        Self {
            success: true,
            message: "Prize redeemed successfully!".to_string(),
            prize: Some(prize),
        }
    }

    pub fn rejected(message: &str) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            prize: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn non_prize_check_serializes_explicit_null() {
        let body = serde_json::to_value(CheckCodeResponse::valid(false, None)).unwrap();
        assert_eq!(
            body,
            json!({ "success": true, "isPrize": false, "prizeType": null })
        );
    }

    #[test]
    fn rejected_check_carries_only_message() {
        let body = serde_json::to_value(CheckCodeResponse::rejected("nope")).unwrap();
        assert_eq!(body, json!({ "success": false, "message": "nope" }));
    }
}

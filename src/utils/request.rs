use crate::database::RequestContext;
use actix_web::HttpRequest;
use actix_web::dev::ConnectionInfo;
use actix_web::http::header::USER_AGENT;
use std::net::SocketAddr;

/// 是否信任代理头，由 `server.trust_proxy` 决定，以 app_data 注册
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientIpPolicy {
    pub trust_proxy: bool,
}

impl ClientIpPolicy {
    pub fn new(trust_proxy: bool) -> Self {
        Self { trust_proxy }
    }

    /// 未注册时按不信任代理处理
    pub fn of(req: &HttpRequest) -> Self {
        req.app_data::<ClientIpPolicy>().copied().unwrap_or_default()
    }
}

/// 客户端 IP，去掉端口。默认取对端地址；仅在信任代理时读取 Forwarded / X-Forwarded-For
pub fn client_ip(
    info: &ConnectionInfo,
    peer: Option<SocketAddr>,
    policy: ClientIpPolicy,
) -> Option<String> {
    if policy.trust_proxy
        && let Some(raw) = info.realip_remote_addr()
    {
        return match raw.parse::<SocketAddr>() {
            Ok(addr) => Some(addr.ip().to_string()),
            Err(_) => Some(raw.to_string()),
        };
    }
    peer.map(|addr| addr.ip().to_string())
}

/// 领取时记录的审计信息
pub fn request_context(req: &HttpRequest) -> RequestContext {
    RequestContext {
        ip: client_ip(&req.connection_info(), req.peer_addr(), ClientIpPolicy::of(req)),
        user_agent: req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}

use crate::config::RateLimitConfig;
use crate::error::AppError;
use crate::utils::{ClientIpPolicy, client_ip};
use actix_web::http::Method;
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::collections::HashMap;
use std::future::{Ready, ready};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const LIMITED_PREFIX: &str = "/api/";

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
struct Clients {
    windows: HashMap<String, Window>,
    last_prune: Instant,
}

/// 按客户端 IP 的固定窗口计数器
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<Clients>,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            max_requests: config.max_requests,
            window: Duration::from_secs(config.window_secs),
            clients: Mutex::new(Clients {
                windows: HashMap::new(),
                last_prune: Instant::now(),
            }),
        }
    }

    /// 记一次请求；超出窗口内额度时返回 false
    pub fn allow(&self, key: &str, now: Instant) -> bool {
        let mut clients = self.clients.lock().unwrap_or_else(|e| e.into_inner());

        // 过期窗口每个窗口周期最多清理一次
        if now.saturating_duration_since(clients.last_prune) >= self.window {
            let window = self.window;
            clients
                .windows
                .retain(|_, w| now.saturating_duration_since(w.started) < window);
            clients.last_prune = now;
        }

        let entry = clients.windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.saturating_duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        entry.count += 1;
        entry.count <= self.max_requests
    }

    #[cfg(test)]
    fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .windows
            .len()
    }
}

pub struct RateLimitMiddleware {
    limiter: Arc<RateLimiter>,
    ip_policy: ClientIpPolicy,
}

impl RateLimitMiddleware {
    pub fn new(limiter: Arc<RateLimiter>, ip_policy: ClientIpPolicy) -> Self {
        Self { limiter, ip_policy }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RateLimitMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RateLimitMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RateLimitMiddlewareService {
            service,
            limiter: self.limiter.clone(),
            ip_policy: self.ip_policy,
        }))
    }
}

pub struct RateLimitMiddlewareService<S> {
    service: S,
    limiter: Arc<RateLimiter>,
    ip_policy: ClientIpPolicy,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 预检请求与非 API 路径不计数
        if req.method() == Method::OPTIONS || !req.path().starts_with(LIMITED_PREFIX) {
            return Box::pin(self.service.call(req));
        }

        let key = client_ip(&req.connection_info(), req.peer_addr(), self.ip_policy)
            .unwrap_or_else(|| "unknown".to_string());
        if self.limiter.allow(&key, Instant::now()) {
            Box::pin(self.service.call(req))
        } else {
            log::warn!("Rate limit exceeded for {key} on {}", req.path());
            Box::pin(async move { Err(AppError::RateLimited.into()) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use actix_web::test::{TestRequest, call_service, init_service, try_call_service};
    use actix_web::{App, HttpResponse, http::StatusCode, web};
    use std::net::SocketAddr;

    fn limiter(max_requests: u32) -> Arc<RateLimiter> {
        Arc::new(RateLimiter::new(&RateLimitConfig {
            max_requests,
            window_secs: 60,
        }))
    }

    fn peer(ip: &str) -> SocketAddr {
        SocketAddr::new(ip.parse().unwrap(), 40000)
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = limiter(2);
        let start = Instant::now();
        assert!(limiter.allow("10.0.0.1", start));
        assert!(limiter.allow("10.0.0.1", start));
        assert!(!limiter.allow("10.0.0.1", start));
        assert!(limiter.allow("10.0.0.2", start));
        assert!(limiter.allow("10.0.0.1", start + Duration::from_secs(61)));
    }

    #[test]
    fn stale_clients_are_pruned_once_per_window() {
        let limiter = limiter(5);
        let start = Instant::now();
        for i in 0..100 {
            assert!(limiter.allow(&format!("10.0.1.{i}"), start));
        }
        assert_eq!(limiter.tracked_clients(), 100);

        // 同一窗口内不清理
        assert!(limiter.allow("10.0.2.1", start + Duration::from_secs(30)));
        assert_eq!(limiter.tracked_clients(), 101);

        // 窗口过后，过期条目被清理，只留下仍在窗口内的和本次请求
        assert!(limiter.allow("10.0.2.2", start + Duration::from_secs(61)));
        assert_eq!(limiter.tracked_clients(), 2);

        // 刚清理过，不会再次扫描
        assert!(limiter.allow("10.0.2.3", start + Duration::from_secs(100)));
        assert_eq!(limiter.tracked_clients(), 3);
    }

    #[actix_web::test]
    async fn api_requests_past_budget_get_429() {
        let app = init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter(3), ClientIpPolicy::default()))
                .route("/", web::get().to(HttpResponse::Ok))
                .route("/api/check-code", web::post().to(HttpResponse::Ok)),
        )
        .await;

        for _ in 0..3 {
            let req = TestRequest::post()
                .uri("/api/check-code")
                .peer_addr(peer("198.51.100.20"))
                .to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = TestRequest::post()
            .uri("/api/check-code")
            .peer_addr(peer("198.51.100.20"))
            .to_request();
        let err = try_call_service(&app, req).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);

        // 其他客户端与非 API 路径不受影响
        let req = TestRequest::post()
            .uri("/api/check-code")
            .peer_addr(peer("198.51.100.21"))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);

        let req = TestRequest::get()
            .uri("/")
            .peer_addr(peer("198.51.100.20"))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn spoofed_forwarded_header_does_not_reset_budget() {
        let app = init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter(1), ClientIpPolicy::default()))
                .route("/api/check-code", web::post().to(HttpResponse::Ok)),
        )
        .await;

        let req = TestRequest::post()
            .uri("/api/check-code")
            .peer_addr(peer("198.51.100.30"))
            .insert_header(("X-Forwarded-For", "203.0.113.1"))
            .to_request();
        assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);

        let req = TestRequest::post()
            .uri("/api/check-code")
            .peer_addr(peer("198.51.100.30"))
            .insert_header(("X-Forwarded-For", "203.0.113.2"))
            .to_request();
        let err = try_call_service(&app, req).await.unwrap_err();
        assert_eq!(
            err.as_response_error().status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[actix_web::test]
    async fn trusted_proxy_keys_on_forwarded_client() {
        let app = init_service(
            App::new()
                .wrap(RateLimitMiddleware::new(limiter(1), ClientIpPolicy::new(true)))
                .route("/api/check-code", web::post().to(HttpResponse::Ok)),
        )
        .await;

        // 同一代理后的不同客户端各有额度
        for client in ["203.0.113.1", "203.0.113.2"] {
            let req = TestRequest::post()
                .uri("/api/check-code")
                .peer_addr(peer("10.0.0.5"))
                .insert_header(("X-Forwarded-For", client))
                .to_request();
            assert_eq!(call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = TestRequest::post()
            .uri("/api/check-code")
            .peer_addr(peer("10.0.0.5"))
            .insert_header(("X-Forwarded-For", "203.0.113.1"))
            .to_request();
        assert!(try_call_service(&app, req).await.is_err());
    }
}

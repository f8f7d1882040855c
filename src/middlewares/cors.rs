use actix_cors::Cors;

/// 配置了前端地址时只允许该来源，否则放开
pub fn create_cors(frontend_url: Option<&str>) -> Cors {
    let cors = match frontend_url {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allowed_origin_fn(|_, _req_head| true),
    };

    cors.allowed_methods(vec!["GET", "POST", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}

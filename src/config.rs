use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub mailer: MailerConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    #[serde(default)]
    pub redemption: RedemptionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 部署在反向代理之后时开启：客户端 IP 取自 Forwarded / X-Forwarded-For，
    /// 否则一律使用 TCP 对端地址
    #[serde(default)]
    pub trust_proxy: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://...`，或 `memory://` 使用进程内存储（仅本地调试）
    pub url: String,
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    /// 导出中奖名单与对账接口的 `key` 查询参数
    pub export_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailerConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    /// 单次发送的超时（秒）
    #[serde(default = "default_mailer_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_mailer_timeout_secs() -> u64 {
    5
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            from_address: String::new(),
            timeout_secs: default_mailer_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CorsConfig {
    /// 为空时允许任意来源
    #[serde(default)]
    pub frontend_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window_secs: 15 * 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrizeConfig {
    pub label: String,
    #[serde(default = "default_prize_weight")]
    pub weight: u32,
}

fn default_prize_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    pub total_codes: usize,
    pub code_length: usize,
    pub batch_size: usize,
    pub prize_count: usize,
    pub prizes: Vec<PrizeConfig>,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            total_codes: 900_000,
            code_length: 8,
            batch_size: 10_000,
            prize_count: 50,
            prizes: ["Official Jersey", "Official Ball", "Trip to the Final"]
                .into_iter()
                .map(|label| PrizeConfig {
                    label: label.to_string(),
                    weight: 1,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedemptionConfig {
    /// 活动开始时间；开始后禁止再派奖
    #[serde(default)]
    pub opens_at: Option<DateTime<Utc>>,
    /// Pending 超过该秒数视为需要人工对账
    pub pending_alert_after_secs: i64,
}

impl Default for RedemptionConfig {
    fn default() -> Self {
        Self {
            opens_at: None,
            pending_alert_after_secs: 300,
        }
    }
}

fn get_env(name: &str) -> Option<String> {
    env::var(name).ok()
}

fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 配置文件不存在时完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => {
                toml::from_str(&config_str).map_err(|e| format!("Failed to parse {config_path}: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Self::from_env()?,
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        let database_url = get_env("DATABASE_URL")
            .ok_or("DATABASE_URL is not set and no config.toml was found")?;
        let export_key = get_env("ADMIN_EXPORT_KEY")
            .ok_or("ADMIN_EXPORT_KEY is not set and no config.toml was found")?;

        Ok(Config {
            server: ServerConfig {
                host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: get_env_parse("SERVER_PORT", 3000u16),
                trust_proxy: get_env_parse("TRUST_PROXY", false),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                connect_timeout_secs: get_env_parse(
                    "DB_CONNECT_TIMEOUT_SECS",
                    default_connect_timeout_secs(),
                ),
            },
            admin: AdminConfig { export_key },
            mailer: MailerConfig::default(),
            cors: CorsConfig::default(),
            rate_limit: RateLimitConfig::default(),
            provisioning: ProvisioningConfig::default(),
            redemption: RedemptionConfig::default(),
        })
    }

    // 环境变量覆盖（即便文件存在时也覆盖）
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("TRUST_PROXY")
            && let Ok(b) = v.parse()
        {
            self.server.trust_proxy = b;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("DB_CONNECT_TIMEOUT_SECS")
            && let Ok(t) = v.parse()
        {
            self.database.connect_timeout_secs = t;
        }
        if let Ok(v) = env::var("ADMIN_EXPORT_KEY") {
            self.admin.export_key = v;
        }
        if let Ok(v) = env::var("MAILER_API_URL") {
            self.mailer.api_url = v;
        }
        if let Ok(v) = env::var("MAILER_API_KEY") {
            self.mailer.api_key = v;
        }
        if let Ok(v) = env::var("MAILER_FROM_ADDRESS") {
            self.mailer.from_address = v;
        }
        if let Ok(v) = env::var("MAILER_TIMEOUT_SECS")
            && let Ok(t) = v.parse()
        {
            self.mailer.timeout_secs = t;
        }
        if let Ok(v) = env::var("FRONTEND_URL") {
            self.cors.frontend_url = Some(v).filter(|s| !s.is_empty() && s != "*");
        }
        if let Ok(v) = env::var("RATE_LIMIT_MAX_REQUESTS")
            && let Ok(n) = v.parse()
        {
            self.rate_limit.max_requests = n;
        }
        if let Ok(v) = env::var("RATE_LIMIT_WINDOW_SECS")
            && let Ok(n) = v.parse()
        {
            self.rate_limit.window_secs = n;
        }
        if let Ok(v) = env::var("PROVISION_TOTAL_CODES")
            && let Ok(n) = v.parse()
        {
            self.provisioning.total_codes = n;
        }
        if let Ok(v) = env::var("PROVISION_BATCH_SIZE")
            && let Ok(n) = v.parse()
        {
            self.provisioning.batch_size = n;
        }
        if let Ok(v) = env::var("PROVISION_PRIZE_COUNT")
            && let Ok(n) = v.parse()
        {
            self.provisioning.prize_count = n;
        }
        if let Ok(v) = env::var("REDEMPTION_OPENS_AT")
            && let Ok(ts) = DateTime::parse_from_rfc3339(&v)
        {
            self.redemption.opens_at = Some(ts.with_timezone(&Utc));
        }
    }
}

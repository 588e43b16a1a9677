use crate::error::AppError;
use std::{env, path::Path, path::PathBuf, str::FromStr, time::Duration};

#[derive(Clone, Debug)]
pub struct Config {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub env: String,
    pub name: String,
    pub debug: bool,
    pub log_level: String,
    pub log_dir: PathBuf,
    pub timezone: String,
    pub stop_timeout: Duration,
    pub locale: String,
    pub migrations_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    /// Takes precedence over the individual `DB_*` connection parts.
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub ssl_mode: String,
    pub debug: bool,

    // Pool tuning
    pub max_idle_connections: u32,
    pub max_open_connections: u32,
    pub max_lifetime: Duration,

    // Timeouts
    pub slow_sql_threshold: Duration,
    pub connect_timeout: Duration, // pool creation at startup
    pub acquire_timeout: Duration, // waiting for a pooled connection
}

#[derive(Clone, Debug)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub tls: bool,
}

#[derive(Clone, Debug)]
pub struct SwaggerConfig {
    pub enable: bool,
    pub host: String,
    pub scheme: String,
    pub title: String,
    pub description: String,
    pub version: String,
    pub username: String,
    pub password: String,
}

impl Config {
    /// Reads `.env` (when present) and then the process environment.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Defaults only; never touches the environment.
    #[cfg(test)]
    pub fn for_tests() -> Self {
        let http = HttpConfig {
            host: "127.0.0.1".into(),
            port: 8080,
            read_timeout: Duration::from_secs(10),
            write_timeout: Duration::from_secs(30),
            tls: false,
        };
        Self {
            service: ServiceConfig {
                env: "test".into(),
                name: "todo-service".into(),
                debug: false,
                log_level: "info".into(),
                log_dir: PathBuf::from("logs"),
                timezone: "UTC".into(),
                stop_timeout: Duration::from_secs(1),
                locale: "en".into(),
                migrations_dir: PathBuf::from("schema/psql"),
            },
            database: DatabaseConfig {
                url: None,
                host: "localhost".into(),
                port: 5432,
                username: "postgres".into(),
                password: String::new(),
                database: "todos".into(),
                ssl_mode: "disable".into(),
                debug: false,
                max_idle_connections: 0,
                max_open_connections: 1,
                max_lifetime: Duration::from_secs(300),
                slow_sql_threshold: Duration::from_secs(1),
                connect_timeout: Duration::from_secs(1),
                acquire_timeout: Duration::from_secs(1),
            },
            swagger: SwaggerConfig {
                enable: false,
                host: format!("localhost:{}", http.port),
                scheme: "http".into(),
                title: "Todo Service".into(),
                description: "Todo CRUD API".into(),
                version: "1.0".into(),
                username: String::new(),
                password: String::new(),
            },
            http,
        }
    }

    pub fn from_env() -> Result<Self, AppError> {
        let service = ServiceConfig::from_env()?;
        let database = DatabaseConfig::from_env()?;
        let http = HttpConfig::from_env()?;
        let swagger = SwaggerConfig::from_env(&http)?;
        Ok(Self {
            service,
            database,
            http,
            swagger,
        })
    }
}

impl ServiceConfig {
    fn from_env() -> Result<Self, AppError> {
        let timezone = string_env("APP_TIMEZONE", "UTC");
        if !timezone_exists(&timezone) {
            return Err(AppError::invalid_config(format!(
                "APP_TIMEZONE `{timezone}` is not a known zone"
            )));
        }

        let stop_timeout_secs: u64 = parse_env("APP_STOP_TIMEOUT", 10)?;

        Ok(Self {
            env: string_env("APP_ENV", "local"),
            name: string_env("APP_NAME", "todo-service"),
            debug: parse_env("APP_DEBUG", false)?,
            log_level: string_env("APP_LOG_LEVEL", "info"),
            log_dir: PathBuf::from(string_env("APP_LOG_DIR", "logs")),
            timezone,
            stop_timeout: Duration::from_secs(stop_timeout_secs),
            locale: string_env("APP_LOCALE", "en"),
            migrations_dir: PathBuf::from(string_env("MIGRATIONS_DIR", "schema/psql")),
        })
    }
}

impl DatabaseConfig {
    fn from_env() -> Result<Self, AppError> {
        let url = env::var("DATABASE_URL").ok().filter(|u| !u.trim().is_empty());
        if let Some(url) = &url {
            if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
                return Err(AppError::invalid_config(
                    "DATABASE_URL must start with postgres:// or postgresql://",
                ));
            }
        }

        let port: u16 = parse_env("DB_PORT", 5432)?;
        if port == 0 {
            return Err(AppError::invalid_config("DB_PORT must be between 1 and 65535"));
        }

        let max_open_connections: u32 = parse_env("DB_MAX_OPEN_CONNECTIONS", 10)?;
        let max_idle_connections: u32 = parse_env("DB_MAX_IDLE_CONNECTIONS", 0)?;

        if max_open_connections == 0 {
            return Err(AppError::invalid_config(
                "DB_MAX_OPEN_CONNECTIONS must be >= 1",
            ));
        }
        if max_idle_connections > max_open_connections {
            return Err(AppError::invalid_config(
                "DB_MAX_IDLE_CONNECTIONS must be <= DB_MAX_OPEN_CONNECTIONS",
            ));
        }

        let connect_timeout_secs: u64 = parse_env("DB_CONNECT_TIMEOUT_SECS", 5)?;
        let acquire_timeout_secs: u64 = parse_env("DB_ACQUIRE_TIMEOUT_SECS", 2)?;

        if connect_timeout_secs == 0 || connect_timeout_secs > 60 {
            return Err(AppError::invalid_config(
                "DB_CONNECT_TIMEOUT_SECS must be between 1 and 60",
            ));
        }
        if acquire_timeout_secs == 0 || acquire_timeout_secs > 60 {
            return Err(AppError::invalid_config(
                "DB_ACQUIRE_TIMEOUT_SECS must be between 1 and 60",
            ));
        }

        let max_lifetime_secs: u64 = parse_env("DB_MAX_LIFETIME_SECONDS", 300)?;
        let slow_sql_secs: u64 = parse_env("DB_SLOW_SQL_THRESHOLD", 1)?;

        Ok(Self {
            url,
            host: string_env("DB_HOST", "localhost"),
            port,
            username: string_env("DB_USERNAME", "postgres"),
            password: string_env("DB_PASSWORD", ""),
            database: string_env("DB_DATABASE", "todos"),
            ssl_mode: string_env("DB_SSL", "disable"),
            debug: parse_env("DB_DEBUG", false)?,
            max_idle_connections,
            max_open_connections,
            max_lifetime: Duration::from_secs(max_lifetime_secs),
            slow_sql_threshold: Duration::from_secs(slow_sql_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }
}

impl HttpConfig {
    fn from_env() -> Result<Self, AppError> {
        let port: u16 = parse_env("HTTP_PORT", 8080)?;
        if port == 0 {
            return Err(AppError::invalid_config("HTTP_PORT must be between 1 and 65535"));
        }

        let read_timeout_secs: u64 = parse_env("HTTP_READ_TIMEOUT", 10)?;
        let write_timeout_secs: u64 = parse_env("HTTP_WRITE_TIMEOUT", 30)?;

        Ok(Self {
            host: string_env("HTTP_HOST", "0.0.0.0"),
            port,
            read_timeout: Duration::from_secs(read_timeout_secs),
            write_timeout: Duration::from_secs(write_timeout_secs),
            tls: parse_env("HTTP_TLS", false)?,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl SwaggerConfig {
    fn from_env(http: &HttpConfig) -> Result<Self, AppError> {
        let default_scheme = if http.tls { "https" } else { "http" };
        let cfg = Self {
            enable: parse_env("SWAGGER_ENABLE", false)?,
            host: string_env("SWAGGER_HOST", &format!("localhost:{}", http.port)),
            scheme: string_env("SWAGGER_SCHEMES", default_scheme),
            title: string_env("SWAGGER_INFO_TITLE", "Todo Service"),
            description: string_env("SWAGGER_INFO_DESCRIPTION", "Todo CRUD API"),
            version: string_env("SWAGGER_INFO_VERSION", "1.0"),
            username: string_env("SWAGGER_USERNAME", ""),
            password: string_env("SWAGGER_PASSWORD", ""),
        };

        if cfg.enable && (cfg.username.is_empty() || cfg.password.is_empty()) {
            return Err(AppError::invalid_config(
                "SWAGGER_USERNAME and SWAGGER_PASSWORD are required when SWAGGER_ENABLE=true",
            ));
        }

        Ok(cfg)
    }
}

fn string_env(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

/// Unset or blank falls back to `default`; a value that does not parse is an error.
fn parse_env<T: FromStr>(key: &'static str, default: T) -> Result<T, AppError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| AppError::invalid_config(format!("{key} has an invalid value `{raw}`"))),
        _ => Ok(default),
    }
}

fn timezone_exists(tz: &str) -> bool {
    if tz.eq_ignore_ascii_case("utc") || tz == "Local" {
        return true;
    }
    // zone names are paths below the tz database root; reject traversal
    if tz.contains("..") || tz.starts_with('/') {
        return false;
    }
    Path::new("/usr/share/zoneinfo").join(tz).is_file()
}

use std::env;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub swagger: SwaggerConfig,
    pub thread_table: ThreadTableConfig,
    pub assistant: AssistantConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub max_lifetime_secs: u64,
}

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub issuer: Option<String>,
    pub audience: Option<String>,
    pub jwt_leeway: Duration,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub username: Option<String>,
    pub password: Option<String>,
    pub title: String,
    pub version: String,
    pub description: String,
}

/// Maps the canonical thread fields onto an existing table. Every canonical
/// field gets exactly one column; names are validated by the storage layer
/// before being interpolated into SQL.
#[derive(Debug, Clone)]
pub struct ThreadTableConfig {
    pub table: String,
    pub id_column: String,
    pub title_column: String,
    pub user_id_column: String,
    pub organization_id_column: String,
    pub tenant_id_column: String,
    pub metadata_column: String,
    pub created_at_column: String,
    pub updated_at_column: String,
    /// "jsonb" (native) or "text" (serialized JSON string)
    pub metadata_format: String,
}

/// Assistant runtime pass-through configuration. When `runtime_url` is unset
/// the service streams a canned mock reply.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    pub runtime_url: Option<String>,
    pub rate_limit_max_requests: i64,
    pub rate_limit_window_secs: i64,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if exists, ignore if not found (optional for production)
        if let Err(e) = dotenvy::dotenv() {
            if !e.to_string().contains("not found") {
                eprintln!("Warning: Error loading .env file: {}", e);
            }
        }

        Ok(Config {
            app: AppConfig::from_env()?,
            database: DatabaseConfig::from_env()?,
            auth: AuthConfig::from_env()?,
            swagger: SwaggerConfig::from_env()?,
            thread_table: ThreadTableConfig::from_env()?,
            assistant: AssistantConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|e| format!("Invalid PORT: {}", e))?;

        // Parse CORS allowed origins from comma-separated string
        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            host,
            port,
            cors_allowed_origins,
        })
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl DatabaseConfig {
    // Conservative pool defaults for small-medium deployments
    const DEFAULT_MAX_CONNECTIONS: u32 = 10;
    const DEFAULT_MIN_CONNECTIONS: u32 = 1;
    const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;
    const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600; // 10 minutes
    const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800; // 30 minutes

    pub fn from_env() -> Result<Self, String> {
        let url = env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set".to_string())?;

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MAX_CONNECTIONS must be a valid number".to_string())?;

        let min_connections = env::var("DB_MIN_CONNECTIONS")
            .unwrap_or_else(|_| Self::DEFAULT_MIN_CONNECTIONS.to_string())
            .parse::<u32>()
            .map_err(|_| "DB_MIN_CONNECTIONS must be a valid number".to_string())?;

        let acquire_timeout_secs = env::var("DB_ACQUIRE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_ACQUIRE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_ACQUIRE_TIMEOUT_SECS must be a valid number".to_string())?;

        let idle_timeout_secs = env::var("DB_IDLE_TIMEOUT_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_IDLE_TIMEOUT_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_IDLE_TIMEOUT_SECS must be a valid number".to_string())?;

        let max_lifetime_secs = env::var("DB_MAX_LIFETIME_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_MAX_LIFETIME_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "DB_MAX_LIFETIME_SECS must be a valid number".to_string())?;

        Ok(Self {
            url,
            max_connections,
            min_connections,
            acquire_timeout_secs,
            idle_timeout_secs,
            max_lifetime_secs,
        })
    }
}

impl AuthConfig {
    const DEFAULT_JWT_LEEWAY_SECS: u64 = 60; // 1 minute

    pub fn from_env() -> Result<Self, String> {
        let jwt_secret =
            env::var("JWT_SECRET").map_err(|_| "JWT_SECRET must be set".to_string())?;
        if jwt_secret.is_empty() {
            return Err("JWT_SECRET must not be empty".to_string());
        }

        let issuer = env::var("JWT_ISSUER").ok().filter(|s| !s.is_empty());
        let audience = env::var("JWT_AUDIENCE").ok().filter(|s| !s.is_empty());

        let jwt_leeway_secs = env::var("JWT_LEEWAY")
            .unwrap_or_else(|_| Self::DEFAULT_JWT_LEEWAY_SECS.to_string())
            .parse::<u64>()
            .map_err(|_| "JWT_LEEWAY must be a valid number".to_string())?;

        Ok(Self {
            jwt_secret,
            issuer,
            audience,
            jwt_leeway: Duration::from_secs(jwt_leeway_secs),
        })
    }
}

impl SwaggerConfig {
    pub fn from_env() -> Result<Self, String> {
        // Only use credentials if they are non-empty
        let username = env::var("SWAGGER_USERNAME").ok().filter(|s| !s.is_empty());
        let password = env::var("SWAGGER_PASSWORD").ok().filter(|s| !s.is_empty());
        let title = env::var("SWAGGER_TITLE").unwrap_or_else(|_| "Spindle API".to_string());
        let version = env::var("SWAGGER_VERSION").unwrap_or_else(|_| "0.1.0".to_string());
        let description = env::var("SWAGGER_DESCRIPTION")
            .unwrap_or_else(|_| "Multi-tenant conversation-thread API".to_string());

        Ok(Self {
            username,
            password,
            title,
            version,
            description,
        })
    }

    /// Returns credentials in "username:password" format if auth is enabled
    pub fn credentials(&self) -> Option<String> {
        match (&self.username, &self.password) {
            (Some(user), Some(pass)) => Some(format!("{}:{}", user, pass)),
            _ => None,
        }
    }
}

impl ThreadTableConfig {
    pub fn from_env() -> Result<Self, String> {
        let column = |var: &str, default: &str| -> String {
            env::var(var).unwrap_or_else(|_| default.to_string())
        };

        let metadata_format = env::var("THREAD_METADATA_FORMAT")
            .unwrap_or_else(|_| "jsonb".to_string())
            .to_lowercase();
        if metadata_format != "jsonb" && metadata_format != "text" {
            return Err("THREAD_METADATA_FORMAT must be 'jsonb' or 'text'".to_string());
        }

        Ok(Self {
            table: column("THREAD_TABLE", "threads"),
            id_column: column("THREAD_COL_ID", "id"),
            title_column: column("THREAD_COL_TITLE", "title"),
            user_id_column: column("THREAD_COL_USER_ID", "user_id"),
            organization_id_column: column("THREAD_COL_ORGANIZATION_ID", "organization_id"),
            tenant_id_column: column("THREAD_COL_TENANT_ID", "tenant_id"),
            metadata_column: column("THREAD_COL_METADATA", "metadata"),
            created_at_column: column("THREAD_COL_CREATED_AT", "created_at"),
            updated_at_column: column("THREAD_COL_UPDATED_AT", "updated_at"),
            metadata_format,
        })
    }
}

impl AssistantConfig {
    const DEFAULT_RATE_LIMIT_MAX_REQUESTS: i64 = 30;
    const DEFAULT_RATE_LIMIT_WINDOW_SECS: i64 = 3600; // 1 hour

    pub fn from_env() -> Result<Self, String> {
        let runtime_url = env::var("ASSISTANT_RUNTIME_URL")
            .ok()
            .filter(|s| !s.is_empty());

        let rate_limit_max_requests = env::var("ASSISTANT_RATE_LIMIT_MAX")
            .unwrap_or_else(|_| Self::DEFAULT_RATE_LIMIT_MAX_REQUESTS.to_string())
            .parse::<i64>()
            .map_err(|_| "ASSISTANT_RATE_LIMIT_MAX must be a valid number".to_string())?;
        if rate_limit_max_requests < 1 {
            return Err("ASSISTANT_RATE_LIMIT_MAX must be at least 1".to_string());
        }

        let rate_limit_window_secs = env::var("ASSISTANT_RATE_LIMIT_WINDOW_SECS")
            .unwrap_or_else(|_| Self::DEFAULT_RATE_LIMIT_WINDOW_SECS.to_string())
            .parse::<i64>()
            .map_err(|_| "ASSISTANT_RATE_LIMIT_WINDOW_SECS must be a valid number".to_string())?;
        if rate_limit_window_secs < 1 {
            return Err("ASSISTANT_RATE_LIMIT_WINDOW_SECS must be at least 1".to_string());
        }

        Ok(Self {
            runtime_url,
            rate_limit_max_requests,
            rate_limit_window_secs,
        })
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, String> {
        let level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let format = match env::var("LOG_FORMAT")
            .unwrap_or_else(|_| "compact".to_string())
            .to_lowercase()
            .as_str()
        {
            "compact" => LogFormat::Compact,
            "pretty" => LogFormat::Pretty,
            other => return Err(format!("LOG_FORMAT must be 'compact' or 'pretty', got '{}'", other)),
        };

        Ok(Self { level, format })
    }
}

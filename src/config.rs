use std::env;

const LOCAL_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at startup and
/// pulled into handlers and extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Postgres connection string. `None` only in local mode, where it selects the
    // in-memory store.
    pub db_url: Option<String>,
    // Upper bound of the Postgres pool.
    pub db_max_connections: u32,
    // Runtime environment marker. Controls the development identity bypass.
    pub env: Env,
    // Secret key used to decode and validate incoming JWTs.
    pub jwt_secret: String,
    pub port: u16,
    // Handles registered in the in-memory store at startup (`SEED_USERS`, comma
    // separated). Ignored when Postgres is configured.
    pub seed_users: Vec<String>,
}

/// Env
///
/// Runtime context: local development (bypass header allowed, in-memory store
/// allowed) or production (hardened auth, Postgres mandatory).
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

impl Default for AppConfig {
    /// Non-panicking values for test state setup. No database: tests wire their own
    /// repository.
    fn default() -> Self {
        Self {
            db_url: None,
            db_max_connections: 5,
            env: Env::Local,
            jwt_secret: LOCAL_JWT_SECRET.to_string(),
            port: 3000,
            seed_users: Vec::new(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Panics
    /// Panics in production when `DATABASE_URL` or `JWT_SECRET` is missing, and in
    /// any environment when `PORT` or `DB_MAX_CONNECTIONS` is not a number.
    pub fn load() -> Self {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let port = env::var("PORT")
            .map(|p| p.parse::<u16>().expect("FATAL: PORT must be a valid port number"))
            .unwrap_or(3000);

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .map(|n| n.parse::<u32>().expect("FATAL: DB_MAX_CONNECTIONS must be a number"))
            .unwrap_or(5);

        let seed_users = env::var("SEED_USERS")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|handle| !handle.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        match env {
            Env::Local => Self {
                env: Env::Local,
                db_url: env::var("DATABASE_URL").ok(),
                db_max_connections,
                jwt_secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| LOCAL_JWT_SECRET.to_string()),
                port,
                seed_users,
            },
            Env::Production => Self {
                env: Env::Production,
                db_url: Some(
                    env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                ),
                db_max_connections,
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                port,
                seed_users,
            },
        }
    }
}

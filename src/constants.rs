// Column bounds mirrored by the schema's CHECK constraints
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 100;
pub const MAX_TITLE_LENGTH: usize = 200;

// Server defaults
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:4200";
pub const DEFAULT_DATABASE_PATH: &str = "blog.db";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Milliseconds a connection waits on a locked database before giving up.
pub const BUSY_TIMEOUT_MS: u64 = 5_000;

/// Body rendered for every store failure; details stay in the logs.
pub const STORE_FAILURE_MESSAGE: &str = "Database error";

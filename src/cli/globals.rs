use secrecy::SecretString;

/// Settings shared by the server and its handlers.
#[derive(Clone)]
pub struct GlobalArgs {
    pub dsn: SecretString,
    pub db_max_connections: u32,
    pub bcrypt_cost: u32,
    pub expose_password_hash: bool,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(dsn: String) -> Self {
        Self {
            dsn: SecretString::from(dsn),
            db_max_connections: 5,
            bcrypt_cost: crate::credentials::DEFAULT_COST,
            expose_password_hash: false,
        }
    }

    #[must_use]
    pub const fn with_db_max_connections(mut self, max: u32) -> Self {
        self.db_max_connections = max;
        self
    }

    #[must_use]
    pub const fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    #[must_use]
    pub const fn with_expose_password_hash(mut self, expose: bool) -> Self {
        self.expose_password_hash = expose;
        self
    }
}

impl std::fmt::Debug for GlobalArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlobalArgs")
            .field("dsn", &"***")
            .field("db_max_connections", &self.db_max_connections)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("expose_password_hash", &self.expose_password_hash)
            .finish()
    }
}

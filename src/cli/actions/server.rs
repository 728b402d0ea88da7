use crate::{api, cli::globals::GlobalArgs};
use anyhow::Result;
use tracing::info;
use url::Url;

pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub db_max_connections: u32,
    pub bcrypt_cost: u32,
    pub expose_password_hash: bool,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("dsn", &redact_dsn(&self.dsn))
            .field("db_max_connections", &self.db_max_connections)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("expose_password_hash", &self.expose_password_hash)
            .finish()
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the store cannot be opened or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    log_startup_args(&args);

    let globals = GlobalArgs::new(args.dsn)
        .with_db_max_connections(args.db_max_connections)
        .with_bcrypt_cost(args.bcrypt_cost)
        .with_expose_password_hash(args.expose_password_hash);

    api::new(args.port, &globals).await
}

fn log_startup_args(args: &Args) {
    let entries = [
        ("listen", format!("tcp:{}", args.port)),
        ("dsn", redact_dsn(&args.dsn)),
        ("db_max_connections", args.db_max_connections.to_string()),
        ("bcrypt_cost", args.bcrypt_cost.to_string()),
        (
            "expose_password_hash",
            args.expose_password_hash.to_string(),
        ),
    ];

    let max_key_len = entries.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
    let mut message = String::from("Startup configuration:");
    for (key, value) in &entries {
        message.push_str(&format!("\n  {key:<max_key_len$}  {value}"));
    }

    info!("{message}");
}

fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => "invalid-dsn".to_string(),
    }
}

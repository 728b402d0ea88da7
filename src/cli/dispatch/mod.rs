//! Map parsed command-line arguments to the action to run.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::{auth, database, ARG_PORT};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(3000);

    let database_opts = database::Options::parse(matches)?;
    let auth_opts = auth::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        dsn: database_opts.dsn,
        db_max_connections: database_opts.max_connections,
        bcrypt_cost: auth_opts.bcrypt_cost,
        expose_password_hash: auth_opts.expose_password_hash,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_action_from_env() {
        temp_env::with_vars(
            [
                ("DOCREST_DSN", Some("memory://")),
                ("DOCREST_PORT", Some("8081")),
                ("DOCREST_BCRYPT_COST", Some("4")),
                ("DOCREST_EXPOSE_PASSWORD_HASH", Some("true")),
                ("DOCREST_DB_MAX_CONNECTIONS", None),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["docrest"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 8081);
                    assert_eq!(args.dsn, "memory://");
                    assert_eq!(args.db_max_connections, 5);
                    assert_eq!(args.bcrypt_cost, 4);
                    assert!(args.expose_password_hash);
                }
            },
        );
    }
}

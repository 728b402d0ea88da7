use crate::credentials::{DEFAULT_COST, MAX_COST, MIN_COST};
use clap::{Arg, ArgAction, Command};

pub const ARG_BCRYPT_COST: &str = "bcrypt-cost";
pub const ARG_EXPOSE_PASSWORD_HASH: &str = "expose-password-hash";

#[derive(Debug)]
pub struct Options {
    pub bcrypt_cost: u32,
    pub expose_password_hash: bool,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &clap::ArgMatches) -> Self {
        Self {
            bcrypt_cost: matches
                .get_one::<u32>(ARG_BCRYPT_COST)
                .copied()
                .unwrap_or(DEFAULT_COST),
            expose_password_hash: matches.get_flag(ARG_EXPOSE_PASSWORD_HASH),
        }
    }
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_BCRYPT_COST)
                .long(ARG_BCRYPT_COST)
                .help("bcrypt work factor used to hash new passwords")
                .env("DOCREST_BCRYPT_COST")
                .default_value("10")
                .value_parser(
                    clap::value_parser!(u32).range(i64::from(MIN_COST)..=i64::from(MAX_COST)),
                ),
        )
        .arg(
            Arg::new(ARG_EXPOSE_PASSWORD_HASH)
                .long(ARG_EXPOSE_PASSWORD_HASH)
                .help("Include the password hash in signup responses")
                .env("DOCREST_EXPOSE_PASSWORD_HASH")
                .action(ArgAction::SetTrue),
        )
}

//! Registry settings exposed on the command line.

use anyhow::{anyhow, Result};
use clap::{builder::ValueParser, Arg, ArgMatches, Command};

use crate::auth::{DEFAULT_FAILED_ROUTE, DEFAULT_REMEMBER_COOKIE, DEFAULT_SESSION_KEY, ID_FIELD};

pub const ARG_FAILED_ROUTE: &str = "failed-route";
pub const ARG_SESSION_KEY: &str = "session-key";
pub const ARG_REMEMBER_COOKIE: &str = "remember-cookie";
pub const ARG_SERIALIZE_USER: &str = "serialize-user";

#[derive(Debug, Clone)]
pub struct Options {
    pub failed_route: String,
    pub session_key: String,
    pub remember_cookie: String,
    /// Fields kept in the session; empty keeps the whole user.
    pub serialize_user: Vec<String>,
}

impl Options {
    /// Parse registry arguments from matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing or blank.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let read_required = |id: &str| -> Result<String> {
            matches
                .get_one::<String>(id)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("missing required argument: --{id}"))
        };

        let serialize_user = matches
            .get_one::<String>(ARG_SERIALIZE_USER)
            .map(|fields| parse_fields(fields))
            .unwrap_or_default();

        Ok(Self {
            failed_route: read_required(ARG_FAILED_ROUTE)?,
            session_key: read_required(ARG_SESSION_KEY)?,
            remember_cookie: read_required(ARG_REMEMBER_COOKIE)?,
            serialize_user,
        })
    }
}

/// Split a comma-separated field list, dropping blanks.
#[must_use]
pub fn parse_fields(fields: &str) -> Vec<String> {
    fields
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[must_use]
pub fn validator_route() -> ValueParser {
    ValueParser::from(move |route: &str| -> std::result::Result<String, String> {
        if route.starts_with('/') {
            Ok(route.to_string())
        } else {
            Err("route must start with '/'".to_string())
        }
    })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_FAILED_ROUTE)
                .long(ARG_FAILED_ROUTE)
                .help("Where unauthorized requests are redirected")
                .env("AUTHLANE_FAILED_ROUTE")
                .default_value(DEFAULT_FAILED_ROUTE)
                .value_parser(validator_route()),
        )
        .arg(
            Arg::new(ARG_SESSION_KEY)
                .long(ARG_SESSION_KEY)
                .help("Session key holding the signed-in user")
                .env("AUTHLANE_SESSION_KEY")
                .default_value(DEFAULT_SESSION_KEY),
        )
        .arg(
            Arg::new(ARG_REMEMBER_COOKIE)
                .long(ARG_REMEMBER_COOKIE)
                .help("Cookie holding the remember-me token")
                .env("AUTHLANE_REMEMBER_COOKIE")
                .default_value(DEFAULT_REMEMBER_COOKIE),
        )
        .arg(
            Arg::new(ARG_SERIALIZE_USER)
                .long(ARG_SERIALIZE_USER)
                .help("Comma-separated user fields kept in the session")
                .long_help(
                    "Comma-separated user fields kept in the session. An empty value keeps every field of the user.",
                )
                .env("AUTHLANE_SERIALIZE_USER")
                .default_value(ID_FIELD),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("authlane"))
    }

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("AUTHLANE_FAILED_ROUTE", None::<&str>),
                ("AUTHLANE_SESSION_KEY", None),
                ("AUTHLANE_REMEMBER_COOKIE", None),
                ("AUTHLANE_SERIALIZE_USER", None),
            ],
            || {
                let matches = command().get_matches_from(vec!["authlane"]);
                let options = Options::parse(&matches).unwrap();
                assert_eq!(options.failed_route, DEFAULT_FAILED_ROUTE);
                assert_eq!(options.session_key, DEFAULT_SESSION_KEY);
                assert_eq!(options.remember_cookie, DEFAULT_REMEMBER_COOKIE);
                assert_eq!(options.serialize_user, vec![ID_FIELD.to_string()]);
            },
        );
    }

    #[test]
    fn test_serialize_user_list() {
        let matches = command().get_matches_from(vec![
            "authlane",
            "--serialize-user",
            "id, username ,,rank",
        ]);
        let options = Options::parse(&matches).unwrap();
        assert_eq!(options.serialize_user, vec!["id", "username", "rank"]);
    }

    #[test]
    fn test_serialize_user_empty_keeps_whole_user() {
        temp_env::with_vars([("AUTHLANE_SERIALIZE_USER", Some(""))], || {
            let matches = command().get_matches_from(vec!["authlane"]);
            let options = Options::parse(&matches).unwrap();
            assert!(options.serialize_user.is_empty());
        });
    }

    #[test]
    fn test_failed_route_must_be_absolute() {
        let result = command().try_get_matches_from(vec!["authlane", "--failed-route", "login"]);
        assert!(result.is_err());

        let matches = command().get_matches_from(vec!["authlane", "--failed-route", "/login"]);
        let options = Options::parse(&matches).unwrap();
        assert_eq!(options.failed_route, "/login");
    }

    #[test]
    fn test_blank_session_key_is_rejected() {
        let matches = command().get_matches_from(vec!["authlane", "--session-key", " "]);
        let err = Options::parse(&matches).unwrap_err();
        assert!(err.to_string().contains("--session-key"));
    }
}

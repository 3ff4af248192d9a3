pub mod lane;
pub mod logging;

use clap::{
    builder::styling::{AnsiColor, Effects, Styles},
    Arg, ColorChoice, Command,
};

#[must_use]
pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    let long_version: &'static str = Box::leak(
        format!("{} - {}", env!("CARGO_PKG_VERSION"), crate::GIT_COMMIT_HASH).into_boxed_str(),
    );

    let command = Command::new("authlane")
        .about("Pluggable authentication and role authorization")
        .version(env!("CARGO_PKG_VERSION"))
        .long_version(long_version)
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("AUTHLANE_PORT")
                .value_parser(clap::value_parser!(u16)),
        );

    let command = lane::with_args(command);
    logging::with_args(command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane::{ARG_FAILED_ROUTE, ARG_REMEMBER_COOKIE, ARG_SERIALIZE_USER, ARG_SESSION_KEY};
    use logging::ARG_VERBOSITY;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "authlane");
        assert_eq!(
            command.get_about().map(ToString::to_string),
            Some("Pluggable authentication and role authorization".to_string())
        );
        assert_eq!(
            command.get_version().map(ToString::to_string),
            Some(env!("CARGO_PKG_VERSION").to_string())
        );
    }

    #[test]
    fn test_check_args() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "authlane",
            "--port",
            "9090",
            "--failed-route",
            "/login",
            "--session-key",
            "user",
            "--remember-cookie",
            "keep",
            "--serialize-user",
            "id,rank",
        ]);

        assert_eq!(matches.get_one::<u16>("port").copied(), Some(9090));
        assert_eq!(
            matches.get_one::<String>(ARG_FAILED_ROUTE).cloned(),
            Some("/login".to_string())
        );
        assert_eq!(
            matches.get_one::<String>(ARG_SESSION_KEY).cloned(),
            Some("user".to_string())
        );
        assert_eq!(
            matches.get_one::<String>(ARG_REMEMBER_COOKIE).cloned(),
            Some("keep".to_string())
        );
        assert_eq!(
            matches.get_one::<String>(ARG_SERIALIZE_USER).cloned(),
            Some("id,rank".to_string())
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("AUTHLANE_PORT", Some("443")),
                ("AUTHLANE_FAILED_ROUTE", Some("/denied")),
                ("AUTHLANE_SESSION_KEY", Some("who")),
                ("AUTHLANE_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["authlane"]);
                assert_eq!(matches.get_one::<u16>("port").copied(), Some(443));
                assert_eq!(
                    matches.get_one::<String>(ARG_FAILED_ROUTE).cloned(),
                    Some("/denied".to_string())
                );
                assert_eq!(
                    matches.get_one::<String>(ARG_SESSION_KEY).cloned(),
                    Some("who".to_string())
                );
                assert_eq!(matches.get_one::<u8>(ARG_VERBOSITY).copied(), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars([("AUTHLANE_LOG_LEVEL", Some(level))], || {
                let command = new();
                let matches = command.get_matches_from(vec!["authlane"]);
                assert_eq!(
                    matches.get_one::<u8>(ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        let levels = ["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("AUTHLANE_LOG_LEVEL", None::<String>)], || {
                let mut args = vec!["authlane".to_string()];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    args.push(format!("-{}", "v".repeat(index)));
                }

                let command = new();
                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>(ARG_VERBOSITY).copied(),
                    u8::try_from(index).ok()
                );
            });
        }
    }

    #[test]
    fn test_invalid_port() {
        let result = new().try_get_matches_from(vec!["authlane", "--port", "http"]);
        assert!(result.is_err());
    }
}

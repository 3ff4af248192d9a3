//! `-v`/`--verbose` and its `AUTHLANE_LOG_LEVEL` fallback.
//!
//! Both end up as one verbosity count. Each `-v` adds one; the environment
//! variable takes a level name or the count itself:
//!
//! | `AUTHLANE_LOG_LEVEL` | count | flags    |
//! |----------------------|-------|----------|
//! | `error` or `0`       | 0     | none     |
//! | `warn` or `1`        | 1     | `-v`     |
//! | `info` or `2`        | 2     | `-vv`    |
//! | `debug` or `3`       | 3     | `-vvv`   |
//! | `trace` or `4`       | 4     | `-vvvv`  |
//!
//! Names are case-insensitive. The count only sets the default directive of
//! the tracing filter, so `RUST_LOG` still overrides it per target.

use clap::{builder::ValueParser, Arg, ArgAction, Command};

pub const ARG_VERBOSITY: &str = "verbosity";

pub const ENV_LOG_LEVEL: &str = "AUTHLANE_LOG_LEVEL";

/// Level names, indexed by verbosity count.
pub const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Turn a level name or count into a verbosity count.
///
/// # Errors
///
/// Returns a message listing the accepted names when `level` is neither a
/// known name nor a count up to `trace`.
pub fn parse_log_level(level: &str) -> Result<u8, String> {
    let level = level.trim();
    let index = match level.parse::<usize>() {
        Ok(count) => (count < LOG_LEVELS.len()).then_some(count),
        Err(_) => LOG_LEVELS
            .iter()
            .position(|name| name.eq_ignore_ascii_case(level)),
    };

    index
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| {
            format!(
                "invalid log level {level:?}, expected one of {} or 0-{}",
                LOG_LEVELS.join(", "),
                LOG_LEVELS.len() - 1
            )
        })
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command.arg(
        Arg::new(ARG_VERBOSITY)
            .short('v')
            .long("verbose")
            .help("Verbosity level, repeat for more: -v WARN, -vv INFO, -vvv DEBUG, -vvvv TRACE")
            .env(ENV_LOG_LEVEL)
            .global(true)
            .action(ArgAction::Count)
            .value_parser(ValueParser::from(parse_log_level)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_map_to_their_position() {
        assert_eq!(parse_log_level("error"), Ok(0));
        assert_eq!(parse_log_level("WARN"), Ok(1));
        assert_eq!(parse_log_level("Info"), Ok(2));
        assert_eq!(parse_log_level(" debug "), Ok(3));
        assert_eq!(parse_log_level("trace"), Ok(4));
    }

    #[test]
    fn counts_are_accepted_up_to_trace() {
        assert_eq!(parse_log_level("0"), Ok(0));
        assert_eq!(parse_log_level("4"), Ok(4));
        assert!(parse_log_level("5").is_err());
        assert!(parse_log_level("-1").is_err());
    }

    #[test]
    fn unknown_names_list_the_choices() {
        let err = parse_log_level("loud").unwrap_err();
        assert!(err.contains("\"loud\""));
        assert!(err.contains("error, warn, info, debug, trace"));
        assert!(err.contains("0-4"));
    }

    #[test]
    fn flag_is_global() {
        let command = with_args(Command::new("authlane").subcommand(Command::new("serve")));
        temp_env::with_vars([(ENV_LOG_LEVEL, None::<String>)], || {
            let matches = command.get_matches_from(["authlane", "serve", "-vv"]);
            let (_, serve) = matches.subcommand().unwrap();
            assert_eq!(serve.get_one::<u8>(ARG_VERBOSITY).copied(), Some(2));
        });
    }
}

//! Command-line argument dispatch.
//!
//! Maps validated CLI arguments to the action to run, currently only the
//! demonstration server with its registry settings.

use crate::cli::actions::{server::Args, Action};
use crate::cli::commands::lane;
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or blank.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let lane_opts = lane::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        failed_route: lane_opts.failed_route,
        session_key: lane_opts.session_key,
        remember_cookie: lane_opts.remember_cookie,
        serialize_user: lane_opts.serialize_user,
    }))
}

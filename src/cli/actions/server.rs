use crate::{auth::Registry, authlane, cli::telemetry};
use anyhow::Result;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub failed_route: String,
    pub session_key: String,
    pub remember_cookie: String,
    pub serialize_user: Vec<String>,
}

impl Args {
    /// Registry settings, before any strategy is installed.
    #[must_use]
    pub fn registry(&self) -> Registry {
        Registry::new()
            .with_failed_route(self.failed_route.as_str())
            .with_session_key(self.session_key.as_str())
            .with_remember_cookie(self.remember_cookie.as_str())
            .with_serialize_fields(self.serialize_user.iter().map(String::as_str))
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let result = authlane::new(args.port, args.registry()).await;

    telemetry::shutdown_tracer();

    result
}

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR : &str = "KRBASK_LOG";

/// Installs the global subscriber used by the command line tools. The level defaults to
/// `info` and can be overridden through KRBASK_LOG with the usual EnvFilter directives.
/// Records emitted through the `log` macros are forwarded to it.
pub fn setup_logging(verbose : bool) -> Result<(), String> {
	let default_level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };

	let fmt_layer = tracing_subscriber::fmt::layer()
		.compact()
		.without_time()
		.with_target(false);

	let env_filter = EnvFilter::builder()
		.with_default_directive(default_level.into())
		.with_env_var(LOG_ENV_VAR)
		.from_env_lossy();

	tracing_subscriber::registry()
		.with(fmt_layer)
		.with(env_filter)
		.try_init()
		.map_err(|e| format!("failed to set the global subscriber: {}", e))
}

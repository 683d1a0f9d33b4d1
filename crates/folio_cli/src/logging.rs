//! Tracing subscriber setup.

use tracing_subscriber::EnvFilter;

use crate::GlobalArgs;

/// Environment variable overriding the log filter.
pub const LOG_ENV: &str = "FOLIO_LOG";

/// The default filter for the given flags.
pub fn default_filter(global: &GlobalArgs) -> &'static str {
    if global.quiet {
        "folio=error"
    } else if global.verbose {
        "folio=debug"
    } else {
        "folio=info"
    }
}

/// Installs a stderr subscriber. `FOLIO_LOG` takes precedence over the flags.
pub fn init(global: &GlobalArgs) {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(default_filter(global)));
    // A subscriber may already be installed when running under a harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(quiet: bool, verbose: bool) -> GlobalArgs {
        GlobalArgs {
            quiet,
            verbose,
            color: false,
            message_format: crate::MessageFormat::Human,
            config: None,
        }
    }

    #[test]
    fn flags_pick_the_level() {
        assert_eq!(default_filter(&global(false, false)), "folio=info");
        assert_eq!(default_filter(&global(false, true)), "folio=debug");
        assert_eq!(default_filter(&global(true, true)), "folio=error");
    }
}

use tracing_subscriber::EnvFilter;

/// Default filter for `-v` repetitions; `RUST_LOG` overrides it.
pub const fn directive_for_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "strconcat=debug,warn",
        _ => "strconcat=trace,debug",
    }
}

/// Install the stderr subscriber. Later calls are no-ops.
pub fn init(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(directive_for_verbosity(verbose)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_directives() {
        assert_eq!(directive_for_verbosity(0), "warn");
        assert_eq!(directive_for_verbosity(1), "strconcat=debug,warn");
        assert_eq!(directive_for_verbosity(2), directive_for_verbosity(7));
    }
}

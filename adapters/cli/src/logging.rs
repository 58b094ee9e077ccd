//! Log output for headless runs.

use env_logger::{Builder, Env};
use log::LevelFilter;

fn default_filter(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Routes `log` records to stderr. `RUST_LOG` wins over the `--verbose` default.
pub(crate) fn init(verbose: bool) {
    let env = Env::default().default_filter_or(default_filter(verbose).to_string());
    // A second install in the same process is a no-op.
    let _ = Builder::from_env(env).format_timestamp(None).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_flag_lowers_the_default_filter() {
        assert_eq!(default_filter(false), LevelFilter::Info);
        assert_eq!(default_filter(true), LevelFilter::Debug);
    }
}

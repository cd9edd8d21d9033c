use std::env;
use std::io::Write;
use std::process;

use env_logger::{Builder, Target};

use crate::config::Config;

/// Sends log records to stderr. `RUST_LOG` overrides the configured level.
pub fn init_logger(config: &Config) {
    let mut builder = Builder::new();
    builder.filter_level(config.log_level);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder
        .target(Target::Stderr)
        .format(|buf, record| {
            writeln!(
                buf,
                "[PID:{}][{}] {} - {}",
                process::id(),
                record.level(),
                buf.timestamp(),
                record.args()
            )
        });

    // a second init (tests, embedding) keeps the first logger
    let _ = builder.try_init();
}

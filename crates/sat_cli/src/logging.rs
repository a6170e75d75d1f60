//! Tracing setup for the CLI.
//!
//! Enabled only when `TSAT_LOG` (or `RUST_LOG`) is set. Output goes to
//! stderr so it never mixes with transformed code on stdout.
//! `TSAT_LOG_FORMAT=json` switches to one JSON object per event.

use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    let filter = match std::env::var("TSAT_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };

    let json = std::env::var("TSAT_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

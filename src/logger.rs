use chrono::Local;
use std::io::Write;

/// Default filter; `RUST_LOG` overrides it
pub const DEFAULT_FILTER: &str = "info,wgpu=warn,iced=warn,naga=warn,cosmic_text=warn";

/// Install the stderr logger shared by both binaries.
/// Calling it twice is harmless.
pub fn init() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());

    let _ = env_logger::Builder::new()
        .parse_filters(&filter)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {:5} {} - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

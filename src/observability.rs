// In: src/observability.rs

//! One-time logger setup for the codec.
//!
//! The codec itself only emits through the `log` facade (`debug!` on processor
//! derivation, `trace!` on cache misses). Applications that have no logger of
//! their own can call [`enable_verbose_logging`] to route those records through
//! `env_logger`.

use log::LevelFilter;
use std::fs::OpenOptions;
use std::sync::Once;

use crate::error::CodecError;

static INIT_LOGGER: Once = Once::new();

/// Installs an `env_logger` at `level`, printing `[LEVEL] message` lines to
/// stderr or, when `log_file` is given, appending them to that file.
///
/// Only the first call has any effect. The file is opened before the logger
/// is installed, so an unopenable path is reported and leaves logging unset.
pub fn enable_verbose_logging(level: LevelFilter, log_file: Option<&str>) -> Result<(), CodecError> {
    let file = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(|| {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(level);

        // Custom formatter: just print the level and message
        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        // Another logger may already be installed by the host application.
        let _ = builder.try_init();
    });
    Ok(())
}

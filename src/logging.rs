use std::path::Path;

use flexi_logger::{Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, opt_format};

/// Start the global logger.
///
/// The level comes from `RUST_LOG`, falling back to "info". Without a log
/// directory, colored lines go to stderr; with one, logs are written to
/// rotated files and warnings are duplicated to stderr.
pub fn setup_logging(log_dir: Option<&Path>) -> Result<LoggerHandle, flexi_logger::FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str("info")?;
    match log_dir {
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir).basename("pong_pg"))
            .format(opt_format)
            .duplicate_to_stderr(Duplicate::Warn)
            .rotate(
                Criterion::Size(10 * 1024 * 1024), // Rotate logs after they reach 10 MB
                Naming::Numbers,
                Cleanup::KeepLogFiles(7),
            )
            .start(),
        None => logger.format(flexi_logger::colored_default_format).start(),
    }
}

use flexi_logger::{
    colored_default_format, detailed_format, Cleanup, Criterion, Duplicate, FileSpec, FlexiLoggerError, Logger,
    LoggerHandle, Naming,
};
use std::path::Path;

/// Starts the global logger.
///
/// `RUST_LOG` wins over `level`. Without `log_dir` everything goes to stderr;
/// with it, records go to a rotating file in that directory and are duplicated
/// to stderr from `info` up.
pub fn setup_logging(level: &str, log_dir: Option<&Path>) -> Result<LoggerHandle, FlexiLoggerError> {
    let logger = Logger::try_with_env_or_str(level)?;

    match log_dir {
        None => logger.format(colored_default_format).start(),
        Some(dir) => logger
            .log_to_file(FileSpec::default().directory(dir).basename("chess_arena"))
            .format_for_files(detailed_format)
            .format_for_stderr(colored_default_format)
            .duplicate_to_stderr(Duplicate::Info)
            .rotate(
                Criterion::Size(10 * 1024 * 1024), // 10 MB per file
                Naming::Numbers,
                Cleanup::KeepLogFiles(3),
            )
            .start(),
    }
}

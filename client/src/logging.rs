//! Logging setup, adapted from the engine core's `initialize_logger`:
//! stderr always on, an optional rolling-free file appender when a path
//! is given.

use log::{LevelFilter, SetLoggerError};
use log4rs::append::console::{ConsoleAppender, Target};
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::filter::threshold::ThresholdFilter;

pub fn initialize_logger(log_level: LevelFilter, file_path: Option<&str>) -> Result<(), SetLoggerError> {
    let stderr = ConsoleAppender::builder().target(Target::Stderr).build();

    let mut config_builder = Config::builder().appender(
        Appender::builder()
            .filter(Box::new(ThresholdFilter::new(log_level)))
            .build("stderr", Box::new(stderr)),
    );

    let mut root_builder = Root::builder().appender("stderr");

    if let Some(path) = file_path {
        match FileAppender::builder()
            .encoder(Box::new(PatternEncoder::new("{l} - {m}\n")))
            .build(path)
        {
            Ok(logfile) => {
                config_builder = config_builder.appender(Appender::builder().build("logfile", Box::new(logfile)));
                root_builder = root_builder.appender("logfile");
            }
            Err(e) => eprintln!("failed to open log file {path}: {e}, logging to stderr only"),
        }
    }

    let config = config_builder.build(root_builder.build(log_level)).expect("valid log4rs config");
    log4rs::init_config(config)?;
    Ok(())
}

// src/logging.rs
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

/// Initialize the terminal logger. Level comes from GRIDWATCH_LOG
/// (error/warn/info/debug/trace), defaulting to info.
pub fn init() {
    let level = match std::env::var("GRIDWATCH_LOG").as_deref() {
        Ok("error") => LevelFilter::Error,
        Ok("warn") => LevelFilter::Warn,
        Ok("debug") => LevelFilter::Debug,
        Ok("trace") => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };

    // Ignore the error if a logger is already installed (tests).
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    );
}

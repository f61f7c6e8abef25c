use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{error, info};
use simplelog::*;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::error::Result;

pub const LOG_FILE_NAME: &str = "re2-firstperson.log";

pub fn write_colored(color: Color, msg: &str) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    stdout.set_color(ColorSpec::new().set_fg(Some(color)))?;
    writeln!(&mut stdout, "{}", msg)?;
    stdout.reset()
}

/// Prints the message in red and mirrors it into the log file.
pub fn report_error(msg: &str) {
    let _ = write_colored(Color::Red, msg);
    error!("{}", msg);
}

fn create_log_file(dir: &Path) -> io::Result<(File, PathBuf)> {
    let primary = dir.join(LOG_FILE_NAME);

    match File::create(&primary) {
        Ok(f) => Ok((f, primary)),
        Err(_) => {
            let fallback = std::env::temp_dir().join(LOG_FILE_NAME);
            File::create(&fallback).map(|f| (f, fallback))
        }
    }
}

/// Installs the terminal + file logger. The log goes next to the module,
/// or into the temp dir when that isn't writable.
pub fn init(dir: &Path) -> Result<PathBuf> {
    let (log_file, path) = create_log_file(dir)?;

    let config = ConfigBuilder::new()
        .set_time_to_local(true)
        .build();

    CombinedLogger::init(vec![
        TermLogger::new(log::LevelFilter::Info, config.clone(), TerminalMode::Mixed),
        WriteLogger::new(log::LevelFilter::Info, config, log_file),
    ])?;

    info!("[LOG] Log file created at: {:?}", path);
    Ok(path)
}

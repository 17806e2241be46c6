use log::LevelFilter;
use log4rs::{
    append::{console::ConsoleAppender, console::Target, file::FileAppender},
    config::{Appender, Config, Root},
    encode::{Encode, Write, pattern::PatternEncoder, writer::simple::SimpleWriter},
};
use log::Record;
use std::io::Write as _;
use std::path::Path;
use anyhow::Result;

const FILE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} [{l}] {m}{n}";

/// Pattern encoder for the run log file that removes ANSI escape codes, so
/// styled status lines stay readable outside a terminal.
#[derive(Debug)]
struct PlainFileEncoder {
    inner: PatternEncoder,
}

impl PlainFileEncoder {
    fn new(pattern: &str) -> Self {
        Self {
            inner: PatternEncoder::new(pattern),
        }
    }
}

impl Encode for PlainFileEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> Result<()> {
        let mut buf = SimpleWriter(Vec::new());
        self.inner.encode(&mut buf, record)?;
        w.write_all(&strip_ansi_escapes::strip(&buf.0))?;
        Ok(())
    }
}

/// Flushes the logger when the run ends, whether it succeeded or not.
#[must_use = "dropping the guard immediately flushes and ends the run log"]
pub struct RunLogGuard {
    log_file: Option<std::path::PathBuf>,
}

impl RunLogGuard {
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }
}

impl Drop for RunLogGuard {
    fn drop(&mut self) {
        if let Some(path) = &self.log_file {
            log::debug!("Closing run log {}", path.display());
        }
        log::logger().flush();
    }
}

/// Installs the process logger: console output plus, when `log_file` is
/// given, a per-run file with timestamps and levels.
pub fn setup_logging(log_file: Option<&Path>, log_level: LevelFilter) -> Result<RunLogGuard> {
    let console = ConsoleAppender::builder()
        .target(Target::Stderr)
        .encoder(Box::new(PatternEncoder::new("{m}{n}")))
        .build();

    let mut config = Config::builder().appender(Appender::builder().build("console", Box::new(console)));
    let mut root = Root::builder().appender("console");

    if let Some(log_file) = log_file {
        // Create log directory if it doesn't exist
        if let Some(parent) = log_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file_appender = FileAppender::builder()
            .encoder(Box::new(PlainFileEncoder::new(FILE_PATTERN)))
            .append(false)
            .build(log_file)?;

        config = config.appender(Appender::builder().build("file", Box::new(file_appender)));
        root = root.appender("file");
    }

    let config = config.build(root.build(log_level))?;
    log4rs::init_config(config)?;

    Ok(RunLogGuard {
        log_file: log_file.map(Path::to_path_buf),
    })
}

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;
use clap::Parser;

use pira_cli::cli;

fn main() {
    let parsed = match cli::Cli::try_parse() {
        Ok(parsed) => parsed,
        Err(e) => {
            let _ = e.print();
            // Help and version are successes; real argument errors exit 1.
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    init_logger(parsed.log_dir.as_deref());
    std::process::exit(cli::run(parsed));
}

/// Build the logger once for the whole process: records go to stderr and,
/// when the file can be created, to a timestamped per-run log file.
fn init_logger(log_dir: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    let dir = log_dir.unwrap_or(Path::new("."));
    let name = format!("pira_{}.log", Local::now().format("%Y%m%d_%H%M%S"));
    match File::create(dir.join(&name)) {
        Ok(file) => {
            builder.target(env_logger::Target::Pipe(Box::new(Tee::new(file))));
        }
        Err(e) => {
            eprintln!("warning: could not create log file {name}: {e}");
        }
    }

    builder.init();
}

/// Duplicates log output to stderr and the per-run log file.
struct Tee {
    file: File,
}

impl Tee {
    fn new(file: File) -> Tee {
        Tee { file }
    }
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

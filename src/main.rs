extern crate chunkline;

#[macro_use]
extern crate log;
extern crate fern;

use std::env;
use std::error::Error;
use std::fs::File;
use std::io::{self, Write};
use std::process;

use chunkline::{Config, ConsoleSource, Fd, LineReader, RawRead};

const LOG_VAR: &str = "CHUNKLINE_LOG";

type BoxResult<T> = Result<T, Box<dyn Error>>;

fn setup_logging() -> Result<(), log::SetLoggerError> {
    let level = env::var(LOG_VAR)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(log::LevelFilter::Info);
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level)
        .chain(io::stderr())
        .apply()
}

fn main() {
    if let Err(err) = setup_logging() {
        eprintln!("failed to install logger: {}", err);
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{}", err);
            process::exit(2);
        }
    };
    debug!("using {:?}", config);

    let paths: Vec<String> = env::args().skip(1).collect();
    let result = if paths.is_empty() {
        echo_stdin(&config)
    } else {
        interleave_files(&paths, config)
    };

    match result {
        Ok(lines) => info!("wrote {} lines", lines),
        Err(err) => {
            error!("{}", err);
            process::exit(1);
        }
    }
}

fn echo_stdin(config: &Config) -> BoxResult<u64> {
    info!("starting console source");
    let source = ConsoleSource::stdin_with_buffer_size(io::stdout(), config.buffer_size)?;
    match source.run().join() {
        Ok(result) => Ok(result?),
        Err(_) => Err("console source thread panicked".into()),
    }
}

#[cfg(unix)]
fn interleave_files(paths: &[String], config: Config) -> BoxResult<u64> {
    use std::os::unix::io::AsRawFd;

    let files = paths
        .iter()
        .map(File::open)
        .collect::<io::Result<Vec<_>>>()?;
    let fds = files.iter().map(|file| file.as_raw_fd()).collect();
    // `files` outlives the reader, so every descriptor stays open
    let raw = unsafe { chunkline::FdReader::new() };
    round_robin(LineReader::with_config(raw, config)?, fds)
}

#[cfg(not(unix))]
fn interleave_files(paths: &[String], config: Config) -> BoxResult<u64> {
    let mut table = chunkline::StreamTable::new();
    for (fd, path) in paths.iter().enumerate() {
        table.insert(fd as Fd, File::open(path)?);
    }
    let fds = (0..paths.len() as Fd).collect();
    round_robin(LineReader::with_config(table, config)?, fds)
}

/// Prints one line from each descriptor per turn until all are exhausted.
fn round_robin<S: RawRead>(mut reader: LineReader<S>, mut live: Vec<Fd>) -> BoxResult<u64> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut count = 0;

    while !live.is_empty() {
        let mut next = Vec::with_capacity(live.len());
        for fd in live {
            match reader.next_line(fd)? {
                Some(line) => {
                    out.write_all(&line)?;
                    count += 1;
                    next.push(fd);
                }
                None => debug!("descriptor {} finished", fd),
            }
        }
        live = next;
    }
    out.flush()?;

    let stats = reader.stats();
    info!(
        "{} reads, {} bytes read, {} bytes copied into {} lines",
        stats.reads, stats.bytes_read, stats.bytes_copied, stats.lines
    );
    Ok(count)
}

//! this binary starts the dictionary server
//! to see the list of options, type: `dict-server --help`

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{crate_version, App, Arg};
use dict::{BoundedThreadPool, DictError, DictServer, Dictionary, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

const DEFAULT_PORT: &str = "8080";
const DEFAULT_WORKERS: &str = "4";
const DEFAULT_QUEUE: &str = "10";
const DEFAULT_FILE: &str = "dictionary.json";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    port: u16,
    workers: u32,
    queue: usize,
    file: PathBuf,
}

impl Opt {
    /// validates the port, worker count, queue capacity and dictionary file path
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`DictError::Parsing`] if one of the parameters is invalid
    ///
    fn build(port: &str, workers: &str, queue: &str, file: &str) -> Result<Opt> {
        let port: u16 = port
            .parse()
            .ok()
            .filter(|p| (1025..=65535).contains(p))
            .ok_or_else(|| {
                DictError::Parsing(format!(
                    "invalid port number: {}. Must be an integer between 1025 and 65535",
                    port
                ))
            })?;

        let workers: u32 = workers.parse().ok().filter(|&w| w >= 1).ok_or_else(|| {
            DictError::Parsing(format!("invalid worker count: {}. Must be at least 1", workers))
        })?;

        let queue: usize = queue.parse().ok().filter(|&q| q >= 1).ok_or_else(|| {
            DictError::Parsing(format!("invalid queue capacity: {}. Must be at least 1", queue))
        })?;

        let file = Path::new(file);
        if !file.is_file() {
            return Err(DictError::Parsing(format!(
                "dictionary file does not exist or is a directory: {}",
                file.display()
            )));
        }

        Ok(Opt {
            port,
            workers,
            queue,
            file: file.to_path_buf(),
        })
    }
}

fn main() {
    // set up a tracing subscriber to log to STDERR
    subscriber_config();

    // parse command line args
    let matches = App::new("dict-server")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("a multithreaded dictionary server")
        .arg(
            Arg::with_name("port")
                .long("port")
                .value_name("PORT")
                .help("sets the port that the server listens on, between 1025 and 65535")
                .default_value(DEFAULT_PORT),
        )
        .arg(
            Arg::with_name("workers")
                .long("workers")
                .value_name("COUNT")
                .help("sets the number of worker threads handling connections")
                .default_value(DEFAULT_WORKERS),
        )
        .arg(
            Arg::with_name("queue")
                .long("queue")
                .value_name("CAPACITY")
                .help("sets how many accepted connections may wait for a worker before new ones are rejected")
                .default_value(DEFAULT_QUEUE),
        )
        .arg(
            Arg::with_name("file")
                .long("file")
                .value_name("DICTIONARY_FILE")
                .help("sets the JSON file the dictionary is loaded from and persisted to")
                .default_value(DEFAULT_FILE),
        )
        .get_matches();

    let opt = match Opt::build(
        matches.value_of("port").unwrap(),
        matches.value_of("workers").unwrap(),
        matches.value_of("queue").unwrap(),
        matches.value_of("file").unwrap(),
    ) {
        Ok(opt) => opt,
        Err(err) => {
            eprintln!("{}", err);
            exit(1);
        }
    };

    // start the server
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    info!("dict-server {}", env!("CARGO_PKG_VERSION"));
    info!(
        "{} worker(s), queue capacity {}, dictionary file {:?}",
        opt.workers, opt.queue, opt.file
    );

    // a dictionary that fails to load keeps the server from starting at all
    let dictionary = Dictionary::open(&opt.file)?;
    let pool = BoundedThreadPool::new(opt.workers, opt.queue)?;

    let addr = SocketAddr::from(([0, 0, 0, 0], opt.port));
    let server = DictServer::new(dictionary, pool);
    server.run(addr)
}

/// configures a tracing subscriber that will log to STDERR
fn subscriber_config() {
    let subscriber = FmtSubscriber::builder()
        // all spans/events with a level higher than TRACE (e.g, debug, info, warn, etc.)
        // will be written to stdout.
        .with_max_level(Level::TRACE)
        // log to stderr instrad of stdout
        .with_writer(std::io::stderr)
        // completes the builder.
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting tracing default subscriber failed");
}

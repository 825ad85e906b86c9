//! The dict-client executable sends one dictionary request per invocation:
//!
//! `dict-client create <WORD> <MEANING> [--addr IP-PORT]`
//!
//!     Create a new word with its meaning(s).
//!
//! `dict-client read <WORD> [--addr IP-PORT]`
//!
//!     Print the meaning(s) stored for a word.
//!
//! `dict-client update <WORD> <MEANING> <NEW_MEANING> [--addr IP-PORT]`
//!
//!     Replace one existing meaning of a word with a new meaning.
//!
//! `dict-client delete <WORD> [--addr IP-PORT]`
//!
//!     Remove a word and its meaning(s).
//!
//! `dict-client append <WORD> <MEANING> [--addr IP-PORT]`
//!
//!     Add an additional meaning onto a word.
//!
//! --addr accepts an IP address, either v4 or v6, and a port number, with the format
//! IP:PORT. If --addr is not specified then connect on 127.0.0.1:8080. The word is
//! lower-cased before it is sent. A server-side `ERROR` response is printed to stderr
//! and exits with a non-zero code.

use std::net::SocketAddr;
use std::process::exit;

use clap::{crate_version, App, Arg, ArgMatches, SubCommand};
use dict::{DictClient, DictError, Request, Result};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

const DEFAULT_ADDRESS: &str = "127.0.0.1:8080";

/// ['Opt'] holds parsed and validated options from the command line
#[derive(Debug)]
struct Opt {
    /// the server's ip:port
    addr: SocketAddr,
    req: Request,
}

impl Opt {
    /// validates the `addr` parameter is a valid IP address and PORT
    /// returns `Ok<Opt>` if everything is valid
    /// # Errors
    /// returns [`DictError::Parsing`] if one of the parameters is invalid
    ///
    fn build(addr: &str, req: Request) -> Result<Opt> {
        let addr: SocketAddr = addr.parse().map_err(|_| {
            DictError::Parsing(format!("could not parse {} into an IP addess and port", &addr))
        })?;

        Ok(Opt { addr, req })
    }
}

fn main() {
    // configure a subscriber that will log messages to STDERR
    subscriber_config();

    let matches = App::new("dict-client")
        .version(crate_version!())
        .author("strohs <strohs1@gmail.com>")
        .about("a client for the multithreaded dictionary server")
        .subcommands(vec![
            SubCommand::with_name("create")
                .about("Create a new word with its meaning(s)")
                .arg(Arg::with_name("WORD").required(true).index(1))
                .arg(Arg::with_name("MEANING").required(true).index(2)),
            SubCommand::with_name("read")
                .about("Print the meaning(s) stored for a word")
                .arg(Arg::with_name("WORD").required(true).index(1)),
            SubCommand::with_name("update")
                .about("Replace one existing meaning of a word with a new meaning")
                .arg(Arg::with_name("WORD").required(true).index(1))
                .arg(Arg::with_name("MEANING").required(true).index(2))
                .arg(Arg::with_name("NEW_MEANING").required(true).index(3)),
            SubCommand::with_name("delete")
                .about("Remove a word and its meaning(s)")
                .arg(Arg::with_name("WORD").required(true).index(1)),
            SubCommand::with_name("append")
                .about("Add an additional meaning onto a word")
                .arg(Arg::with_name("WORD").required(true).index(1))
                .arg(Arg::with_name("MEANING").required(true).index(2)),
        ])
        .arg(
            Arg::with_name("addr")
                .long("addr")
                .value_name("IP_ADDR:PORT")
                .help("sets the IP_ADDR:PORT of the server to connect to")
                .default_value(DEFAULT_ADDRESS)
                .global(true),
        )
        .get_matches();

    let opt = match parse_options(matches) {
        Ok(opt) => opt,
        Err(e) => {
            eprintln!("{}", e);
            exit(1);
        }
    };
    if let Err(e) = run(opt) {
        eprintln!("{}", e);
        exit(1);
    }
}

/// connects to the server, sends the single request held in `opt` and prints the
/// response message. An `ERROR` response goes to stderr with a non-zero exit code.
fn run(opt: Opt) -> Result<()> {
    let client = DictClient::connect(opt.addr)?;
    let response = client.send(&opt.req)?;
    if response.is_success() {
        println!("{}", response.msg);
    } else {
        eprintln!("{}", response.msg);
        exit(1);
    }
    Ok(())
}

/// parses the matches from the command line into an [`Opt`] struct.
/// `--addr` is a global argument, so its value lives in the subcommand's matches
/// whether it was given before or after the subcommand.
fn parse_options(matches: ArgMatches) -> Result<Opt> {
    match matches.subcommand() {
        ("create", Some(args)) => {
            let word = args.value_of("WORD").unwrap();
            let meaning = args.value_of("MEANING").unwrap();
            Opt::build(args.value_of("addr").unwrap(), Request::create(word, meaning))
        }
        ("read", Some(args)) => {
            let word = args.value_of("WORD").unwrap();
            Opt::build(args.value_of("addr").unwrap(), Request::read(word))
        }
        ("update", Some(args)) => {
            let word = args.value_of("WORD").unwrap();
            let meaning = args.value_of("MEANING").unwrap();
            let new_meaning = args.value_of("NEW_MEANING").unwrap();
            Opt::build(
                args.value_of("addr").unwrap(),
                Request::update(word, meaning, new_meaning),
            )
        }
        ("delete", Some(args)) => {
            let word = args.value_of("WORD").unwrap();
            Opt::build(args.value_of("addr").unwrap(), Request::delete(word))
        }
        ("append", Some(args)) => {
            let word = args.value_of("WORD").unwrap();
            let meaning = args.value_of("MEANING").unwrap();
            Opt::build(args.value_of("addr").unwrap(), Request::append(word, meaning))
        }
        _ => Err(DictError::Parsing(
            "no command given, expected one of: create, read, update, delete, append".to_string(),
        )),
    }
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

use std::io::{BufRead, BufReader, BufWriter, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};

use tracing::{debug, error, info, warn};

use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::protocol::{
    Request, Response, ACTION_APPEND, ACTION_CREATE, ACTION_DELETE, ACTION_READ, ACTION_UPDATE,
};
use crate::thread_pool::BoundedThreadPool;

// handler-level messages, sent before any dictionary operation is attempted
const GENERIC_FAILURE_MSG: &str = "There is something wrong, please try again";
const EMPTY_WORD_MSG: &str = "Word can not be empty, please try again";

/// A TCP server over a shared [`Dictionary`].
///
/// The accept loop assigns every connection a 1-based sequence number and hands it to
/// the worker pool without blocking; when the pool's queue is full the connection is
/// closed on the spot and a rejection is logged. Each claimed connection serves
/// exactly one request: handshake out, one JSON request in, one JSON response line
/// out, close. Connection-level failures are logged and never affect other
/// connections or the accept loop itself.
///
/// Sockets carry no read or write timeouts: a client that connects and never
/// finishes its request parks its worker until the client goes away.
///
/// # Example
/// Serve a dictionary on 127.0.0.1:8080 with 4 workers and room for 10 waiting
/// connections
/// ```rust
/// use dict::{BoundedThreadPool, Dictionary, DictServer};
/// # use dict::Result;
/// # fn main() -> Result<()> {
/// let dictionary = Dictionary::open("dictionary.json")?;
/// let pool = BoundedThreadPool::new(4, 10)?;
/// let server = DictServer::new(dictionary, pool);
/// // server.run("127.0.0.1:8080")?;
/// #
/// # Ok(())
/// # }
/// ```
pub struct DictServer {
    /// the shared store every connection handler gets a clone of
    dictionary: Dictionary,
    /// the pool of workers that run connection handlers
    pool: BoundedThreadPool,
}

impl DictServer {
    /// Creates a new `DictServer` over the given store and worker pool.
    pub fn new(dictionary: Dictionary, pool: BoundedThreadPool) -> Self {
        DictServer { dictionary, pool }
    }

    /// Binds a listener on `addr` and serves connections forever.
    ///
    /// # Errors
    /// returns [`DictError::Io`] if the address cannot be bound; a bind failure is
    /// fatal and is never retried internally
    ///
    /// [`DictError::Io`]: ./enum.DictError.html
    pub fn run<A: ToSocketAddrs>(self, addr: A) -> Result<()> {
        let listener = TcpListener::bind(addr)?;
        self.serve_with(listener)
    }

    /// Serves connections from an already-bound `listener` forever. Exposed so that
    /// callers (tests in particular) can bind port 0 and learn the real address
    /// before starting the loop.
    pub fn serve_with(self, listener: TcpListener) -> Result<()> {
        if let Ok(addr) = listener.local_addr() {
            info!("waiting for client connections on {}", addr);
        }

        let mut counter: u32 = 0;
        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    counter += 1;
                    let request_number = counter;
                    info!("request {} connected", request_number);

                    let dictionary = self.dictionary.clone();
                    let submitted = self.pool.try_spawn(move || {
                        if let Err(e) = serve(dictionary, stream, request_number) {
                            error!("error serving request {}: {}", request_number, e);
                        }
                    });
                    if submitted.is_err() {
                        // dropping the unclaimed job closes the client's socket
                        warn!(
                            "request {} rejected: exceeded maximum server load",
                            request_number
                        );
                    }
                }
                Err(e) => error!("connection failed: {}", e),
            }
        }
        Ok(())
    }
}

/// Handles one client connection end to end: writes the handshake, reads and decodes
/// the single request, runs it against the store, writes the one-line JSON response
/// and lets the connection close on return.
fn serve(dictionary: Dictionary, stream: TcpStream, request_number: u32) -> Result<()> {
    let reader = BufReader::new(&stream);
    let mut writer = BufWriter::new(&stream);

    // the handshake: the sequence number sent as a single UTF-8 encoded char,
    // a diagnostic client number rather than any kind of token
    let tag = char::from_u32(request_number).unwrap_or(char::REPLACEMENT_CHARACTER);
    let mut buf = [0_u8; 4];
    writer.write_all(tag.encode_utf8(&mut buf).as_bytes())?;
    writer.flush()?;

    let raw = read_request_text(reader)?;
    debug!("request {} payload: {}", request_number, raw);

    let response = match serde_json::from_str::<Request>(&raw) {
        Ok(request) => dispatch(&dictionary, &request),
        Err(e) => {
            error!("request {} is malformed: {}", request_number, e);
            Response::error(GENERIC_FAILURE_MSG)
        }
    };

    let mut line = serde_json::to_string(&response)?;
    line.push('\n');
    writer.write_all(line.as_bytes())?;
    writer.flush()?;

    info!("request {} disconnected", request_number);
    Ok(())
}

/// Accumulates physical lines (terminators stripped) until one whose trimmed content
/// ends in `}` arrives, or the peer closes the connection. The request is assumed to
/// be exactly one JSON object; an embedded `}` at the end of a line inside a string
/// value, or a second pipelined object, is not supported by this framing.
fn read_request_text<R: BufRead>(reader: R) -> Result<String> {
    let mut raw = String::new();
    for line in reader.lines() {
        let line = line?;
        let complete = line.trim().ends_with('}');
        raw.push_str(&line);
        if complete {
            break;
        }
    }
    Ok(raw)
}

/// Validates the decoded request and routes it to the matching store operation.
/// The store is never touched for an empty action/word or an unknown action.
fn dispatch(dictionary: &Dictionary, request: &Request) -> Response {
    let action = request.action.as_deref().unwrap_or("");
    let word = request.word.as_deref().unwrap_or("");
    if action.is_empty() || word.is_empty() {
        return Response::error(EMPTY_WORD_MSG);
    }

    let meaning = request.meaning.as_deref().unwrap_or("");
    let new_meaning = request.special_meaning.as_deref().unwrap_or("");

    match action {
        ACTION_CREATE => dictionary.create(word, meaning),
        ACTION_READ => dictionary.read(word),
        ACTION_UPDATE => dictionary.update(word, meaning, new_meaning),
        ACTION_DELETE => dictionary.delete(word),
        ACTION_APPEND => dictionary.append(word, meaning),
        _ => Response::error(GENERIC_FAILURE_MSG),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    fn scratch_dictionary(contents: &str) -> (Dictionary, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dictionary.json");
        std::fs::write(&path, contents).unwrap();
        (Dictionary::open(&path).unwrap(), dir)
    }

    #[test]
    fn framing_joins_lines_until_closing_brace() {
        let text = "{\"action\":\"READ\",\n\"word\":\"cat\"}\n";
        let raw = read_request_text(Cursor::new(text)).unwrap();
        assert_eq!(raw, "{\"action\":\"READ\",\"word\":\"cat\"}");
    }

    #[test]
    fn framing_stops_at_first_complete_object() {
        let text = "{\"action\":\"READ\",\"word\":\"cat\"}\ntrailing\n";
        let raw = read_request_text(Cursor::new(text)).unwrap();
        assert_eq!(raw, "{\"action\":\"READ\",\"word\":\"cat\"}");
    }

    #[test]
    fn framing_tolerates_eof_without_brace() {
        let raw = read_request_text(Cursor::new("half a request")).unwrap();
        assert_eq!(raw, "half a request");
    }

    #[test]
    fn dispatch_requires_action_and_word() {
        let (dict, _dir) = scratch_dictionary("{}");

        let req: Request = serde_json::from_str(r#"{"action":"READ","word":""}"#).unwrap();
        assert_eq!(dispatch(&dict, &req).msg, EMPTY_WORD_MSG);

        let req: Request = serde_json::from_str(r#"{"word":"cat"}"#).unwrap();
        assert_eq!(dispatch(&dict, &req).msg, EMPTY_WORD_MSG);

        let req: Request = serde_json::from_str(r#"{"action":"","word":"cat"}"#).unwrap();
        assert_eq!(dispatch(&dict, &req).msg, EMPTY_WORD_MSG);
    }

    #[test]
    fn dispatch_rejects_unknown_actions_without_touching_the_store() {
        let (dict, _dir) = scratch_dictionary("{}");
        let req: Request =
            serde_json::from_str(r#"{"action":"DESTROY","word":"cat","meaning":"x"}"#).unwrap();
        assert_eq!(dispatch(&dict, &req).msg, GENERIC_FAILURE_MSG);
        assert!(!dict.read("cat").is_success());
    }

    #[test]
    fn dispatch_routes_update_arguments() {
        let (dict, _dir) = scratch_dictionary(r#"{"cat":"feline"}"#);
        let req: Request = serde_json::from_str(
            r#"{"action":"UPDATE","word":"cat","meaning":"feline","specialMeaning":"a feline"}"#,
        )
        .unwrap();
        assert!(dispatch(&dict, &req).is_success());
        assert_eq!(dict.read("cat").msg, "a feline");
    }
}

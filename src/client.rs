use std::io::{BufRead, BufReader, BufWriter, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};

use tracing::debug;

use crate::error::{DictError, Result};
use crate::protocol::{Request, Response};

/// `DictClient` holds one connection to a dictionary server and exchanges exactly one
/// request/response pair over it. The server hands out a client number during the
/// handshake and closes the connection after responding, so [`send`] consumes the
/// client; connect again for the next request.
///
/// [`send`]: #method.send
pub struct DictClient {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    client_number: u32,
}

impl DictClient {
    /// Establishes a connection to the server at `addr` and consumes its handshake.
    ///
    /// # Errors
    /// returns [`DictError::Io`] if the connection could not be established, or
    /// [`DictError::Handshake`] if the server's greeting could not be decoded
    ///
    /// [`DictError::Io`]: ./enum.DictError.html
    /// [`DictError::Handshake`]: ./enum.DictError.html
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self> {
        let tcp_reader = TcpStream::connect(addr)?;
        let tcp_writer = tcp_reader.try_clone()?;
        let mut reader = BufReader::new(tcp_reader);

        let client_number = read_handshake(&mut reader)?;
        debug!("connected as client number {}", client_number);

        Ok(DictClient {
            reader,
            writer: BufWriter::new(tcp_writer),
            client_number,
        })
    }

    /// the diagnostic client number assigned by the server during the handshake
    pub fn client_number(&self) -> u32 {
        self.client_number
    }

    /// Sends `request` and waits for the server's one-line JSON response. The
    /// connection is gone afterwards either way, matching the server's
    /// one-request-per-connection protocol.
    ///
    /// A response with an `ERROR` code is still an `Ok` return: the outcome of a
    /// dictionary operation is data, not a transport failure.
    ///
    /// # Errors
    /// returns [`DictError::Io`] if the exchange failed mid-flight, or
    /// [`DictError::Serde`] if the response line was not a valid response object
    ///
    /// [`DictError::Io`]: ./enum.DictError.html
    /// [`DictError::Serde`]: ./enum.DictError.html
    pub fn send(mut self, request: &Request) -> Result<Response> {
        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;

        let mut response_line = String::new();
        self.reader.read_line(&mut response_line)?;
        let response: Response = serde_json::from_str(response_line.trim_end())?;
        Ok(response)
    }
}

/// Reads the server's greeting: a single UTF-8 encoded char whose code point is this
/// connection's client number.
fn read_handshake<R: Read>(reader: &mut R) -> Result<u32> {
    let mut first = [0_u8; 1];
    reader.read_exact(&mut first)?;

    // leading byte determines how many continuation bytes follow
    let len = match first[0] {
        b if b < 0x80 => 1,
        b if b >= 0xC0 && b < 0xE0 => 2,
        b if b >= 0xE0 && b < 0xF0 => 3,
        b if b >= 0xF0 && b < 0xF8 => 4,
        _ => return Err(DictError::Handshake),
    };

    let mut buf = [0_u8; 4];
    buf[0] = first[0];
    reader.read_exact(&mut buf[1..len])?;

    let tag = std::str::from_utf8(&buf[..len])
        .map_err(|_| DictError::Handshake)?
        .chars()
        .next()
        .ok_or(DictError::Handshake)?;
    Ok(tag as u32)
}

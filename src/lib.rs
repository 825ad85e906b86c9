#![deny(missing_docs)]
//! A multithreaded, persistent dictionary store that maps words to their meaning(s).
//!
//! This crate provides the [`Dictionary`] store itself, the [`DictServer`] that
//! exposes it over TCP through a fixed [`BoundedThreadPool`] of workers, and a
//! [`DictClient`] plus `dict-client`/`dict-server` executables for talking to it.
//! Requests and responses travel as JSON text over plain synchronous sockets.
//!
//! ## Supported Dictionary Operations
//! The store supports five operations (selected by the request's "action"):
//!
//! - `CREATE` a word together with its first meaning(s)
//! - `READ` the meaning(s) stored for a word
//! - `UPDATE` one meaning of a word, replacing it with a new meaning
//! - `DELETE` a word and everything stored for it
//! - `APPEND` an additional meaning onto a word
//!
//! See [`Dictionary`] and the [`Request`] and [`Response`] types for the structure
//! of these operations.
//!
//! ## Dictionary
//! [`Dictionary`] owns the word table and its JSON mirror on disk. It is loaded once
//! at start-up (a missing or unparseable file is fatal), shared by every connection
//! handler, and internally serialized: one mutex guards the table and is held across
//! the file write, so a `SUCCESS` reported to a client means the mirror already
//! contains the mutation. A failed file write is reported as an `ERROR` while the
//! in-memory change is retained; this inconsistency window is part of the inherited
//! contract rather than something the store papers over.
//!
//! ## Server / Worker Pool
//! [`DictServer`] accepts connections, numbers them starting at 1, and submits each
//! one to a [`BoundedThreadPool`]: a fixed set of workers draining a bounded queue.
//! Submission never blocks. When the queue is full the connection is closed
//! immediately, which bounds both in-flight work (worker count) and buffered work
//! (queue capacity) under load.
//!
//! ## Wire Protocol
//! A connection carries exactly one request. The server first writes a handshake: a
//! single UTF-8 char whose code point is the connection's sequence number (a
//! diagnostic client number, nothing more). The client then sends one JSON object
//! (possibly split over several lines; the server accumulates lines until one ends,
//! after trimming, with `}`) with the fields `action`, `word`, `meaning` and
//! `specialMeaning`. The server answers with one line of JSON holding exactly `code`
//! (`SUCCESS` or `ERROR`) and `msg`, then closes the connection.
//!
//! [`Dictionary`]: ./struct.Dictionary.html
//! [`DictServer`]: ./struct.DictServer.html
//! [`DictClient`]: ./struct.DictClient.html
//! [`BoundedThreadPool`]: ./struct.BoundedThreadPool.html
//! [`Request`]: ./struct.Request.html
//! [`Response`]: ./struct.Response.html

pub use client::DictClient;
pub use dictionary::Dictionary;
pub use error::{DictError, Result};
pub use protocol::{Code, Request, Response};
pub use server::DictServer;
pub use thread_pool::{BoundedThreadPool, Rejected};

mod client;
mod dictionary;
mod error;
mod protocol;
mod server;
mod thread_pool;

use serde::{Deserialize, Serialize};

/// action name for creating a new word
pub const ACTION_CREATE: &str = "CREATE";
/// action name for reading the meaning(s) of a word
pub const ACTION_READ: &str = "READ";
/// action name for updating one meaning of a word
pub const ACTION_UPDATE: &str = "UPDATE";
/// action name for deleting a word
pub const ACTION_DELETE: &str = "DELETE";
/// action name for appending a meaning to a word
pub const ACTION_APPEND: &str = "APPEND";

/// A single dictionary request as it travels over the wire: a flat JSON object
/// with an `action` selecting the operation plus up to three string arguments.
///
/// Every field is optional on the wire. Absent fields and JSON `null` decode the
/// same way, and unrecognized fields are ignored. The `action` is deliberately kept
/// as an open string rather than an enum: an unknown action must produce a generic
/// `ERROR` response from the server, not a decode failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    /// the requested operation, one of the `ACTION_*` names
    pub action: Option<String>,
    /// the word being operated on, lower-cased by clients before sending
    pub word: Option<String>,
    /// the primary meaning argument (CREATE/APPEND meaning, UPDATE's current meaning)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
    /// the secondary meaning argument, only used by UPDATE (the new meaning)
    #[serde(rename = "specialMeaning", skip_serializing_if = "Option::is_none")]
    pub special_meaning: Option<String>,
}

impl Request {
    fn new(action: &str, word: &str, meaning: Option<String>, special_meaning: Option<String>) -> Self {
        Request {
            action: Some(action.to_string()),
            // the original client folded the word before sending; keep that contract
            word: Some(word.to_lowercase()),
            meaning,
            special_meaning,
        }
    }

    /// builds a CREATE request for `word` with the given `meaning`
    pub fn create(word: &str, meaning: &str) -> Self {
        Request::new(ACTION_CREATE, word, Some(meaning.to_string()), None)
    }

    /// builds a READ request for `word`
    pub fn read(word: &str) -> Self {
        Request::new(ACTION_READ, word, None, None)
    }

    /// builds an UPDATE request replacing `meaning` with `new_meaning` within `word`'s entry
    pub fn update(word: &str, meaning: &str, new_meaning: &str) -> Self {
        Request::new(
            ACTION_UPDATE,
            word,
            Some(meaning.to_string()),
            Some(new_meaning.to_string()),
        )
    }

    /// builds a DELETE request for `word`
    pub fn delete(word: &str) -> Self {
        Request::new(ACTION_DELETE, word, None, None)
    }

    /// builds an APPEND request adding `meaning` to `word`'s entry
    pub fn append(word: &str, meaning: &str) -> Self {
        Request::new(ACTION_APPEND, word, Some(meaning.to_string()), None)
    }
}

/// The outcome code carried by every [`Response`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Code {
    /// the operation was performed
    Success,
    /// the operation failed; `msg` says why
    Error,
}

/// The uniform response returned for every dictionary request: a status code plus a
/// human readable message. For a successful READ the message is the stored meaning
/// itself. Serialized as a JSON object with exactly the fields `code` and `msg`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// whether the request succeeded
    pub code: Code,
    /// confirmation text, the looked-up meaning, or an error description
    pub msg: String,
}

impl Response {
    /// builds a `SUCCESS` response carrying `msg`
    pub fn success<S: Into<String>>(msg: S) -> Self {
        Response {
            code: Code::Success,
            msg: msg.into(),
        }
    }

    /// builds an `ERROR` response carrying `msg`
    pub fn error<S: Into<String>>(msg: S) -> Self {
        Response {
            code: Code::Error,
            msg: msg.into(),
        }
    }

    /// returns true if this response carries the `SUCCESS` code
    pub fn is_success(&self) -> bool {
        self.code == Code::Success
    }
}

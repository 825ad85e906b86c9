use std::collections::HashMap;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, error, info};

use crate::error::Result;
use crate::protocol::Response;

// message returned for any mutating operation whose file write failed
const WRITE_FAILURE_MSG: &str = "Server error in writing Dictionary file";

/// The dictionary store: an in-memory word -> meaning(s) table mirrored to a JSON
/// file on disk.
///
/// A `Dictionary` is a cheaply clonable handle; every connection handler receives its
/// own clone and all of them share the same underlying table. A single mutex guards
/// the table *and* the persistence write, so operations (reads included) are fully
/// serialized and at most one file write is ever in flight.
///
/// Every operation returns a [`Response`] rather than an error: failed lookups,
/// duplicate words and the like are ordinary outcomes reported back to the client.
/// After a successful mutating operation returns `SUCCESS`, the file on disk already
/// reflects the new table. If the file write fails the operation reports `ERROR`
/// even though the in-memory mutation is retained; the next successful write
/// re-mirrors the whole table.
#[derive(Debug, Clone)]
pub struct Dictionary {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    // path of the JSON mirror, fixed for the lifetime of the store
    path: PathBuf,
    table: Mutex<HashMap<String, String>>,
}

impl Dictionary {
    /// Loads a `Dictionary` from the JSON file at `path`. The file must exist and
    /// parse as a single JSON object mapping words to meaning strings.
    ///
    /// # Errors
    /// returns [`DictError::Io`] if the file cannot be read, or [`DictError::Serde`]
    /// if its contents are not a JSON object of strings. Callers treat either as
    /// fatal: the server must not start without its dictionary.
    ///
    /// [`DictError::Io`]: ../error/enum.DictError.html
    /// [`DictError::Serde`]: ../error/enum.DictError.html
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Dictionary> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let table: HashMap<String, String> = serde_json::from_reader(BufReader::new(file))?;
        info!("loaded {} dictionary entries from {:?}", table.len(), path);

        Ok(Dictionary {
            inner: Arc::new(Inner {
                path,
                table: Mutex::new(table),
            }),
        })
    }

    /// Creates a new entry for `word`.
    ///
    /// Fails if the word already exists, or if `meaning` is empty. On success the
    /// table is persisted before the confirmation is returned.
    pub fn create(&self, word: &str, meaning: &str) -> Response {
        let key = word.to_lowercase();
        let mut table = self.lock();

        if table.contains_key(&key) {
            Response::error(format!(
                "({}) already exist in the Dictionary! You can try update or append new meaning(s).",
                key
            ))
        } else if meaning.is_empty() {
            Response::error(format!("({}) Word meaning(s) cannot be null or empty.", key))
        } else {
            table.insert(key.clone(), meaning.to_string());
            match self.persist(&table) {
                Ok(()) => Response::success(format!("({}) Word meaning(s) successfully created.", key)),
                Err(resp) => resp,
            }
        }
    }

    /// Looks up the meaning(s) of `word`. The stored meaning string is returned as
    /// the response message. Does not touch the file.
    pub fn read(&self, word: &str) -> Response {
        let key = word.to_lowercase();
        let table = self.lock();

        match table.get(&key) {
            Some(meaning) if !meaning.is_empty() => Response::success(meaning.clone()),
            _ => Response::error(format!("({}) does not exist in the Dictionary!", key)),
        }
    }

    /// Replaces every occurrence of `meaning` within `word`'s entry by `new_meaning`.
    ///
    /// Fails if the word is absent, if either argument is empty, or if the stored
    /// meaning string does not contain `meaning`.
    pub fn update(&self, word: &str, meaning: &str, new_meaning: &str) -> Response {
        let key = word.to_lowercase();
        let mut table = self.lock();

        if !table.contains_key(&key) {
            Response::error(format!("({}) does not exist in the Dictionary!", key))
        } else if meaning.is_empty() || new_meaning.is_empty() {
            Response::error("Word meaning(s) cannot be empty.")
        } else {
            // existence was just checked, the entry must be here
            let current = table.get(&key).cloned().unwrap_or_default();
            if !current.contains(meaning) {
                Response::error("Existing meaning not found for the word specified!")
            } else {
                table.insert(key.clone(), current.replace(meaning, new_meaning));
                match self.persist(&table) {
                    Ok(()) => Response::success(format!("({}) has been updated successfully!", key)),
                    Err(resp) => resp,
                }
            }
        }
    }

    /// Removes `word` and its meaning(s). Fails if the word is absent.
    pub fn delete(&self, word: &str) -> Response {
        let key = word.to_lowercase();
        let mut table = self.lock();

        if table.remove(&key).is_none() {
            Response::error(format!("({}) does not exist in the Dictionary!", key))
        } else {
            match self.persist(&table) {
                Ok(()) => Response::success(format!("({}) has been deleted successfully!", key)),
                Err(resp) => resp,
            }
        }
    }

    /// Concatenates `new_meaning` onto the end of `word`'s entry, with no separator.
    ///
    /// Fails if the word is absent, if `new_meaning` is empty, or if the stored
    /// meaning string already contains `new_meaning`.
    pub fn append(&self, word: &str, new_meaning: &str) -> Response {
        let key = word.to_lowercase();
        let mut table = self.lock();

        if !table.contains_key(&key) {
            Response::error(format!("({}) does not exist in the Dictionary!", key))
        } else if new_meaning.is_empty() {
            Response::error("New word meaning cannot be empty.")
        } else {
            let mut current = table.get(&key).cloned().unwrap_or_default();
            if current.contains(new_meaning) {
                Response::error("Meaning already exist for the word specified!")
            } else {
                current.push_str(new_meaning);
                table.insert(key.clone(), current);
                match self.persist(&table) {
                    Ok(()) => Response::success(format!(
                        "New word meaning has been added to ({}) successfully!",
                        key
                    )),
                    Err(resp) => resp,
                }
            }
        }
    }

    /// acquires the table lock, recovering the guard if a previous holder panicked
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        match self.inner.table.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Rewrites the whole JSON mirror from `table`. Called with the table lock held,
    /// which serializes file writes and keeps the mirror consistent with what the
    /// caller is about to report.
    fn persist(&self, table: &HashMap<String, String>) -> std::result::Result<(), Response> {
        let json = match serde_json::to_string(table) {
            Ok(json) => json,
            Err(e) => {
                error!("failed to serialize the dictionary: {}", e);
                return Err(Response::error(WRITE_FAILURE_MSG));
            }
        };
        if let Err(e) = fs::write(&self.inner.path, json) {
            error!("failed to write the dictionary file {:?}: {}", self.inner.path, e);
            return Err(Response::error(WRITE_FAILURE_MSG));
        }
        debug!("persisted {} entries to {:?}", table.len(), self.inner.path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_utils::sync::WaitGroup;
    use std::io::Write;
    use std::thread;
    use tempfile::TempDir;

    // writes `contents` as dictionary.json inside a fresh temp dir and opens it
    fn open_store(contents: &str) -> (Dictionary, TempDir) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dictionary.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (Dictionary::open(&path).unwrap(), dir)
    }

    fn persisted(dir: &TempDir) -> HashMap<String, String> {
        let file = File::open(dir.path().join("dictionary.json")).unwrap();
        serde_json::from_reader(BufReader::new(file)).unwrap()
    }

    #[test]
    fn open_fails_on_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(Dictionary::open(dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn open_fails_on_malformed_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("dictionary.json");
        fs::write(&path, "this is not json").unwrap();
        assert!(Dictionary::open(&path).is_err());
    }

    #[test]
    fn create_then_read_round_trips_and_persists() {
        let (dict, dir) = open_store("{}");

        let resp = dict.create("Cat", "a small domesticated carnivore");
        assert!(resp.is_success());
        assert_eq!(resp.msg, "(cat) Word meaning(s) successfully created.");

        let resp = dict.read("cat");
        assert!(resp.is_success());
        assert_eq!(resp.msg, "a small domesticated carnivore");

        assert_eq!(
            persisted(&dir).get("cat").map(String::as_str),
            Some("a small domesticated carnivore")
        );
    }

    #[test]
    fn create_rejects_existing_word() {
        let (dict, dir) = open_store(r#"{"cat":"feline"}"#);

        let resp = dict.create("CAT", "something else");
        assert!(!resp.is_success());
        assert_eq!(
            resp.msg,
            "(cat) already exist in the Dictionary! You can try update or append new meaning(s)."
        );
        // table and mirror unchanged
        assert_eq!(dict.read("cat").msg, "feline");
        assert_eq!(persisted(&dir).get("cat").map(String::as_str), Some("feline"));
    }

    #[test]
    fn create_rejects_empty_meaning() {
        let (dict, _dir) = open_store("{}");
        let resp = dict.create("dog", "");
        assert!(!resp.is_success());
        assert_eq!(resp.msg, "(dog) Word meaning(s) cannot be null or empty.");
        assert!(!dict.read("dog").is_success());
    }

    #[test]
    fn read_unknown_word_reports_not_found() {
        let (dict, _dir) = open_store("{}");
        let resp = dict.read("zzz");
        assert!(!resp.is_success());
        assert_eq!(resp.msg, "(zzz) does not exist in the Dictionary!");
    }

    #[test]
    fn read_treats_empty_meaning_as_missing() {
        let (dict, _dir) = open_store(r#"{"ghost":""}"#);
        assert!(!dict.read("ghost").is_success());
    }

    #[test]
    fn update_replaces_every_occurrence() {
        let (dict, dir) = open_store(r#"{"echo":"bounce; bounce again"}"#);

        let resp = dict.update("echo", "bounce", "repeat");
        assert!(resp.is_success());
        assert_eq!(resp.msg, "(echo) has been updated successfully!");
        assert_eq!(dict.read("echo").msg, "repeat; repeat again");
        assert_eq!(
            persisted(&dir).get("echo").map(String::as_str),
            Some("repeat; repeat again")
        );
    }

    #[test]
    fn update_requires_matching_current_meaning() {
        let (dict, _dir) = open_store(r#"{"cat":"feline"}"#);
        let resp = dict.update("cat", "canine", "feline");
        assert!(!resp.is_success());
        assert_eq!(resp.msg, "Existing meaning not found for the word specified!");
        assert_eq!(dict.read("cat").msg, "feline");
    }

    #[test]
    fn update_validates_word_then_arguments() {
        let (dict, _dir) = open_store(r#"{"cat":"feline"}"#);

        let resp = dict.update("dog", "a", "b");
        assert_eq!(resp.msg, "(dog) does not exist in the Dictionary!");

        let resp = dict.update("cat", "", "b");
        assert_eq!(resp.msg, "Word meaning(s) cannot be empty.");
        let resp = dict.update("cat", "feline", "");
        assert_eq!(resp.msg, "Word meaning(s) cannot be empty.");
    }

    #[test]
    fn delete_then_read_reports_not_found() {
        let (dict, dir) = open_store(r#"{"cat":"feline","dog":"canine"}"#);

        let resp = dict.delete("cat");
        assert!(resp.is_success());
        assert_eq!(resp.msg, "(cat) has been deleted successfully!");

        assert_eq!(dict.read("cat").msg, "(cat) does not exist in the Dictionary!");
        let table = persisted(&dir);
        assert!(!table.contains_key("cat"));
        assert_eq!(table.get("dog").map(String::as_str), Some("canine"));
    }

    #[test]
    fn delete_unknown_word_fails() {
        let (dict, _dir) = open_store("{}");
        assert!(!dict.delete("cat").is_success());
    }

    #[test]
    fn append_concatenates_without_separator() {
        let (dict, dir) = open_store(r#"{"cat":"feline"}"#);

        let resp = dict.append("cat", "; a pet");
        assert!(resp.is_success());
        assert_eq!(resp.msg, "New word meaning has been added to (cat) successfully!");
        assert_eq!(dict.read("cat").msg, "feline; a pet");
        assert_eq!(
            persisted(&dir).get("cat").map(String::as_str),
            Some("feline; a pet")
        );
    }

    #[test]
    fn append_rejects_duplicate_meaning() {
        let (dict, _dir) = open_store(r#"{"cat":"a feline pet"}"#);
        let resp = dict.append("cat", "feline");
        assert!(!resp.is_success());
        assert_eq!(resp.msg, "Meaning already exist for the word specified!");
        assert_eq!(dict.read("cat").msg, "a feline pet");
    }

    #[test]
    fn append_rejects_empty_meaning() {
        let (dict, _dir) = open_store(r#"{"cat":"feline"}"#);
        let resp = dict.append("cat", "");
        assert_eq!(resp.msg, "New word meaning cannot be empty.");
    }

    #[test]
    fn concurrent_creates_have_exactly_one_winner() {
        let (dict, dir) = open_store("{}");
        let wg = WaitGroup::new();

        let handles: Vec<_> = (0..2)
            .map(|i| {
                let dict = dict.clone();
                let wg = wg.clone();
                thread::spawn(move || {
                    // both threads release from here together
                    wg.wait();
                    dict.create("race", &format!("meaning-{}", i))
                })
            })
            .collect();
        drop(wg);

        let outcomes: Vec<Response> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let wins = outcomes.iter().filter(|r| r.is_success()).count();
        assert_eq!(wins, 1);
        let loss = outcomes.iter().find(|r| !r.is_success()).unwrap();
        assert_eq!(
            loss.msg,
            "(race) already exist in the Dictionary! You can try update or append new meaning(s)."
        );

        // the mirror holds the winner's value, never a partial write
        let stored = dict.read("race").msg;
        assert_eq!(persisted(&dir).get("race"), Some(&stored));
    }
}

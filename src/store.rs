use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tokio::fs;
use tracing::{debug, warn};

use crate::entities::Post;

const NOTES_FILE: &str = "notes.json";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode notes: {0}")]
    Encode(#[source] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> StoreError + '_ {
    move |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Entry {
    Post(Post),
    /// A record this board cannot read, e.g. one written by an older board
    /// with a different section list. Written back exactly as found.
    Unreadable(Value),
}

/// The stored collection in file order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    entries: Vec<Entry>,
}

impl From<Vec<Post>> for Collection {
    fn from(posts: Vec<Post>) -> Self {
        Self {
            entries: posts.into_iter().map(Entry::Post).collect(),
        }
    }
}

impl Collection {
    fn decode(records: Vec<Value>) -> Self {
        let entries = records
            .into_iter()
            .map(|record| match serde_json::from_value::<Post>(record.clone()) {
                Ok(post) => Entry::Post(post),
                Err(e) => {
                    let id = record.get("id").and_then(Value::as_str).unwrap_or("<none>");
                    warn!(id, error = %e, "skipping unreadable note record");
                    Entry::Unreadable(record)
                }
            })
            .collect();
        Self { entries }
    }

    fn encode(&self) -> Result<Vec<Value>, StoreError> {
        self.entries
            .iter()
            .map(|entry| match entry {
                Entry::Post(post) => serde_json::to_value(post).map_err(StoreError::Encode),
                Entry::Unreadable(raw) => Ok(raw.clone()),
            })
            .collect()
    }

    pub fn posts(&self) -> impl Iterator<Item = &Post> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Post(post) => Some(post),
            Entry::Unreadable(_) => None,
        })
    }

    pub fn into_posts(self) -> Vec<Post> {
        self.entries
            .into_iter()
            .filter_map(|entry| match entry {
                Entry::Post(post) => Some(post),
                Entry::Unreadable(_) => None,
            })
            .collect()
    }

    pub fn unreadable_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry, Entry::Unreadable(_)))
            .count()
    }

    pub fn find(&self, id: &str) -> Option<&Post> {
        self.posts().find(|post| post.id == id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut Post> {
        self.entries.iter_mut().find_map(|entry| match entry {
            Entry::Post(post) if post.id == id => Some(post),
            _ => None,
        })
    }

    pub fn prepend(&mut self, post: Post) {
        self.entries.insert(0, Entry::Post(post));
    }

    pub fn remove(&mut self, id: &str) -> Option<Post> {
        let index = self
            .entries
            .iter()
            .position(|entry| matches!(entry, Entry::Post(post) if post.id == id))?;
        match self.entries.remove(index) {
            Entry::Post(post) => Some(post),
            Entry::Unreadable(_) => None,
        }
    }
}

/// The whole post collection, kept as one pretty-printed JSON array.
#[derive(Clone, Debug)]
pub struct NoteStore {
    dir: PathBuf,
    file: PathBuf,
}

impl NoteStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let file = dir.join(NOTES_FILE);
        Self { dir, file }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    async fn ensure_storage(&self) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(io_error(&self.dir))?;

        match fs::metadata(&self.file).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.file.display(), "creating empty notes file");
                fs::write(&self.file, b"[]").await.map_err(io_error(&self.file))
            }
            Err(e) => Err(io_error(&self.file)(e)),
        }
    }

    /// Reads the collection. Only a file that is not a JSON array fails;
    /// single records that do not decode are kept aside untouched.
    pub async fn load(&self) -> Result<Collection, StoreError> {
        self.ensure_storage().await?;
        let raw = fs::read(&self.file).await.map_err(io_error(&self.file))?;
        let records: Vec<Value> =
            serde_json::from_slice(&raw).map_err(|source| StoreError::Corrupt {
                path: self.file.clone(),
                source,
            })?;
        Ok(Collection::decode(records))
    }

    /// Rewrites the file through a sibling temp file so a crash mid-write
    /// leaves the previous collection intact.
    pub async fn save(&self, notes: &Collection) -> Result<(), StoreError> {
        self.ensure_storage().await?;
        let body = serde_json::to_vec_pretty(&notes.encode()?).map_err(StoreError::Encode)?;

        let tmp = self.file.with_extension("json.tmp");
        fs::write(&tmp, body).await.map_err(io_error(&tmp))?;
        fs::rename(&tmp, &self.file)
            .await
            .map_err(io_error(&self.file))
    }
}

//! # Cart Persistence
//!
//! The boundary a cart is loaded from at session start and saved to after
//! each mutation. Stores are best-effort: [`crate::session::CartSession`]
//! logs their errors and keeps the in-memory cart authoritative.

use crate::cart::CartLine;
use crate::error::{CartError, CartResult};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Storage for the line list of each session's cart
pub trait CartStore {
    /// Load the lines saved for a session, `None` if nothing was saved
    fn load(&self, session_id: &str) -> CartResult<Option<Vec<CartLine>>>;

    /// Replace the saved lines for a session
    fn save(&self, session_id: &str, lines: &[CartLine]) -> CartResult<()>;

    /// Forget a session entirely
    fn discard(&self, session_id: &str) -> CartResult<()>;
}

impl<T: CartStore + ?Sized> CartStore for Arc<T> {
    fn load(&self, session_id: &str) -> CartResult<Option<Vec<CartLine>>> {
        (**self).load(session_id)
    }

    fn save(&self, session_id: &str, lines: &[CartLine]) -> CartResult<()> {
        (**self).save(session_id, lines)
    }

    fn discard(&self, session_id: &str) -> CartResult<()> {
        (**self).discard(session_id)
    }
}

/// In-process store, mostly for tests and single-node demos
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    carts: RwLock<HashMap<String, Vec<CartLine>>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions with saved state
    pub fn len(&self) -> usize {
        self.carts.read().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CartStore for MemoryCartStore {
    fn load(&self, session_id: &str) -> CartResult<Option<Vec<CartLine>>> {
        let carts = self
            .carts
            .read()
            .map_err(|_| CartError::Persistence("cart store lock poisoned".to_string()))?;
        Ok(carts.get(session_id).cloned())
    }

    fn save(&self, session_id: &str, lines: &[CartLine]) -> CartResult<()> {
        let mut carts = self
            .carts
            .write()
            .map_err(|_| CartError::Persistence("cart store lock poisoned".to_string()))?;
        carts.insert(session_id.to_string(), lines.to_vec());
        Ok(())
    }

    fn discard(&self, session_id: &str) -> CartResult<()> {
        let mut carts = self
            .carts
            .write()
            .map_err(|_| CartError::Persistence("cart store lock poisoned".to_string()))?;
        carts.remove(session_id);
        Ok(())
    }
}

/// One JSON file per session under a directory
#[derive(Debug, Clone)]
pub struct JsonFileCartStore {
    dir: PathBuf,
}

impl JsonFileCartStore {
    /// Create the store, creating `dir` if needed
    pub fn new(dir: impl Into<PathBuf>) -> CartResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            CartError::Persistence(format!("cannot create {}: {}", dir.display(), e))
        })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, session_id: &str) -> CartResult<PathBuf> {
        validate_session_id(session_id)?;
        Ok(self.dir.join(format!("{}.json", session_id)))
    }
}

/// Longest session id a store will accept
pub const MAX_SESSION_ID_LEN: usize = 128;

/// Check that a session id is 1-128 ASCII letters, digits, `-` or `_`.
///
/// Ids are used verbatim as storage keys, so two distinct valid ids never
/// share saved state.
pub fn validate_session_id(session_id: &str) -> CartResult<()> {
    let valid = !session_id.is_empty()
        && session_id.len() <= MAX_SESSION_ID_LEN
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(CartError::InvalidRequest(format!(
            "session id must be 1-{} letters, digits, '-' or '_': {:?}",
            MAX_SESSION_ID_LEN, session_id
        )))
    }
}

impl CartStore for JsonFileCartStore {
    fn load(&self, session_id: &str) -> CartResult<Option<Vec<CartLine>>> {
        let path = self.path_for(session_id)?;
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CartError::Persistence(format!(
                    "cannot read {}: {}",
                    path.display(),
                    e
                )))
            }
        };
        let lines: Vec<CartLine> = serde_json::from_str(&content)?;
        Ok(Some(lines))
    }

    fn save(&self, session_id: &str, lines: &[CartLine]) -> CartResult<()> {
        let path = self.path_for(session_id)?;
        let json = serde_json::to_string(lines)?;
        // Readers only ever see a complete file
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, json)
            .and_then(|_| std::fs::rename(&tmp, &path))
            .map_err(|e| CartError::Persistence(format!("cannot write {}: {}", path.display(), e)))
    }

    fn discard(&self, session_id: &str) -> CartResult<()> {
        let path = self.path_for(session_id)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CartError::Persistence(format!(
                "cannot remove {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

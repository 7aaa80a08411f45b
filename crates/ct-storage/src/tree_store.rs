//! File system storage for comment trees

use chrono::{DateTime, Utc};
use ct_core::comment::{Association, CommentFlag, CommentPayload, FlagRecord, TreeNode};
use ct_core::error::{Result, TreeError};
use ct_core::path::NodePath;
use ct_core::store::{TreeState, TreeStore};
use ct_core::types::{ContentKey, ContentType, NodeId, SiteId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info};

/// Current store file schema version
pub const CURRENT_SCHEMA_VERSION: &str = "1.0";

const STORE_FILE: &str = "tree.json";
const TEMP_FILE: &str = ".tree.json.tmp";

/// On-disk document, written with a schema version header
#[derive(Serialize)]
struct StoreFileRef<'a> {
    schema_version: &'a str,
    saved_at: DateTime<Utc>,
    state: &'a TreeState,
}

#[derive(Deserialize)]
struct StoreFile {
    schema_version: String,
    #[allow(dead_code)]
    saved_at: DateTime<Utc>,
    state: TreeState,
}

/// Tree storage persisted as one JSON document
///
/// The whole state is held in memory. Every mutation is applied to a copy,
/// written to disk, and only then made visible, so a failed write leaves
/// both the file and the in-memory state unchanged.
pub struct FileSystemStore {
    /// Base directory for the store file
    base_dir: PathBuf,
    state: RwLock<TreeState>,
}

impl FileSystemStore {
    /// Open the store in `base_dir`, creating the directory if needed
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        if !base_dir.exists() {
            fs::create_dir_all(&base_dir).map_err(|e| {
                TreeError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create store directory: {}", e),
                ))
            })?;
            debug!("Created store directory: {:?}", base_dir);
        }

        let state = Self::read_state(&base_dir.join(STORE_FILE))?;
        Ok(Self {
            base_dir,
            state: RwLock::new(state),
        })
    }

    /// Open the store in the platform data directory
    pub fn default_location() -> Result<Self> {
        Self::new(Self::default_dir())
    }

    /// Platform data directory, `~/.comments-tree` as a fallback
    pub fn default_dir() -> PathBuf {
        directories::ProjectDirs::from("com", "comments-tree", "comments-tree")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| {
                dirs::home_dir()
                    .unwrap_or_else(|| PathBuf::from("."))
                    .join(".comments-tree")
            })
    }

    /// Get base directory
    pub fn base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    /// Path of the store document
    pub fn store_path(&self) -> PathBuf {
        self.base_dir.join(STORE_FILE)
    }

    fn temp_path(&self) -> PathBuf {
        self.base_dir.join(TEMP_FILE)
    }

    fn read_state(path: &Path) -> Result<TreeState> {
        let file = match fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No store file at {:?}, starting empty", path);
                return Ok(TreeState::new());
            }
            Err(e) => return Err(TreeError::Io(e)),
        };

        let store_file: StoreFile = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| TreeError::from(e).with_context(format!("reading {}", path.display())))?;

        if store_file.schema_version != CURRENT_SCHEMA_VERSION {
            return Err(TreeError::UnsupportedSchemaVersion(
                store_file.schema_version,
            ));
        }

        store_file.state.verify()?;
        info!(
            "Loaded {} nodes from {:?}",
            store_file.state.len(),
            path
        );
        Ok(store_file.state)
    }

    /// Write state atomically (write to temp, then rename)
    fn atomic_write(&self, state: &TreeState) -> Result<()> {
        let temp_path = self.temp_path();
        let final_path = self.store_path();

        let file = StoreFileRef {
            schema_version: CURRENT_SCHEMA_VERSION,
            saved_at: Utc::now(),
            state,
        };

        let temp_file = fs::File::create(&temp_path).map_err(|e| {
            TreeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to create temp file: {}", e),
            ))
        })?;
        let mut writer = BufWriter::new(temp_file);
        serde_json::to_writer_pretty(&mut writer, &file)?;
        writer.flush()?;

        fs::rename(&temp_path, &final_path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            TreeError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to rename temp file: {}", e),
            ))
        })?;

        debug!("Saved {} nodes to {:?}", state.len(), final_path);
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, TreeState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, TreeState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Apply `op` to a copy of the state, persist it, then publish it
    fn mutate<T>(&self, op: impl FnOnce(&mut TreeState) -> Result<T>) -> Result<T> {
        let mut state = self.write();
        let mut next = state.clone();
        let out = op(&mut next)?;
        self.atomic_write(&next)?;
        *state = next;
        Ok(out)
    }
}

impl TreeStore for FileSystemStore {
    fn get(&self, id: NodeId) -> Result<TreeNode> {
        self.read().get(id)
    }

    fn get_by_path(&self, path: &NodePath) -> Result<TreeNode> {
        self.read().get_by_path(path)
    }

    fn create_root(&self) -> Result<TreeNode> {
        self.mutate(|state| state.create_root())
    }

    fn insert_child(&self, parent: NodeId, payload: CommentPayload) -> Result<TreeNode> {
        self.mutate(|state| state.insert_child(parent, payload))
    }

    fn children(&self, path: &NodePath) -> Result<Vec<TreeNode>> {
        Ok(self.read().children(path))
    }

    fn descendants(&self, path: &NodePath) -> Result<Vec<TreeNode>> {
        Ok(self.read().descendants(path))
    }

    fn descendant_count(&self, path: &NodePath) -> Result<usize> {
        Ok(self.read().descendant_count(path))
    }

    fn children_count(&self, path: &NodePath) -> Result<usize> {
        Ok(self.read().children_count(path))
    }

    fn nodes_under(&self, prefixes: &[NodePath], min_depth: usize) -> Result<Vec<TreeNode>> {
        Ok(self.read().nodes_under(prefixes, min_depth))
    }

    fn scan(&self, filter: &dyn Fn(&TreeNode) -> bool) -> Result<Vec<TreeNode>> {
        Ok(self.read().scan(filter))
    }

    fn find_association(&self, key: &ContentKey, site: SiteId) -> Result<Option<Association>> {
        Ok(self.read().find_association(key, site))
    }

    fn association_for_root(&self, root: NodeId) -> Result<Option<Association>> {
        Ok(self.read().association_for_root(root))
    }

    fn associations_matching(
        &self,
        types: &[ContentType],
        site: Option<SiteId>,
    ) -> Result<Vec<Association>> {
        Ok(self.read().associations_matching(types, site))
    }

    fn insert_association(&self, association: Association) -> Result<()> {
        self.mutate(|state| state.insert_association(association))
    }

    fn discard_root(&self, id: NodeId) -> Result<()> {
        self.mutate(|state| state.discard_root(id))
    }

    fn set_public(&self, id: NodeId, is_public: bool) -> Result<TreeNode> {
        self.mutate(|state| state.set_public(id, is_public))
    }

    fn set_removed(&self, id: NodeId, is_removed: bool) -> Result<TreeNode> {
        self.mutate(|state| state.set_removed(id, is_removed))
    }

    fn update_comment(
        &self,
        id: NodeId,
        comment: String,
        rendered: Option<String>,
    ) -> Result<TreeNode> {
        self.mutate(|state| state.update_comment(id, comment, rendered))
    }

    fn set_public_for_children(&self, parent: NodeId, is_public: bool) -> Result<usize> {
        self.mutate(|state| state.set_public_for_children(parent, is_public))
    }

    fn add_flag(&self, record: FlagRecord) -> Result<()> {
        self.mutate(|state| state.add_flag(record))
    }

    fn flags_for(&self, node: NodeId, flag: CommentFlag) -> Result<Vec<FlagRecord>> {
        Ok(self.read().flags_for(node, flag))
    }

    fn snapshot(&self) -> Result<TreeState> {
        Ok(self.read().clone())
    }
}

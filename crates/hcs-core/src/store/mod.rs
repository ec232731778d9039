//! Zarr v2 directory store: groups, attributes and chunked arrays, backed by
//! a `zarrs` filesystem store.

mod array;
pub mod codec;
mod options;
mod writer;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Map, Value};
use zarrs::filesystem::FilesystemStore;
use zarrs::group::{Group as ZarrGroup, GroupMetadata};

use crate::consts::ZARR_FORMAT;
use crate::element::Element;
use crate::error::{HcsError, Result};

pub use array::{ArrayMetadata, ZarrArray};
pub use options::{out_chunks, resolve_storage_options, DimensionSeparator, StorageOptions};
pub use writer::{persist, persist_graph};

const ZGROUP: &str = ".zgroup";
const ZATTRS: &str = ".zattrs";

/// Handle to a group inside a directory store.
#[derive(Clone)]
pub struct Group {
    store: Arc<FilesystemStore>,
    root: PathBuf,
    path: String,
}

impl std::fmt::Debug for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Group")
            .field("root", &self.root)
            .field("path", &self.path)
            .finish()
    }
}

impl PartialEq for Group {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.path == other.path
    }
}

impl Group {
    /// True if `root` holds a root group.
    pub fn exists(root: &Path) -> bool {
        root.join(ZGROUP).exists()
    }

    /// Create the root group at `root`. The directory may already exist; an
    /// existing group keeps its attributes.
    pub fn create(root: &Path) -> Result<Self> {
        fs::create_dir_all(root)?;
        let group = Self::at(root)?;
        if !Self::exists(root) {
            group.store_metadata(Map::new())?;
        }
        Ok(group)
    }

    /// Open an existing root group.
    pub fn open(root: &Path) -> Result<Self> {
        if !Self::exists(root) {
            return Err(HcsError::InvalidStore {
                path: root.to_path_buf(),
                reason: "missing .zgroup".into(),
            });
        }
        Self::at(root)
    }

    fn at(root: &Path) -> Result<Self> {
        Ok(Self {
            store: Arc::new(FilesystemStore::new(root).map_err(HcsError::zarr)?),
            root: root.to_path_buf(),
            path: String::new(),
        })
    }

    /// Directory of the whole store.
    pub fn store_root(&self) -> &Path {
        &self.root
    }

    /// Path of this group relative to the store root (`""` for the root).
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Directory of this group.
    pub fn dir(&self) -> PathBuf {
        if self.path.is_empty() {
            self.root.clone()
        } else {
            self.root.join(&self.path)
        }
    }

    /// Absolute `zarrs` node path of this group.
    fn node(&self) -> String {
        format!("/{}", self.path)
    }

    fn child_path(&self, name: &str) -> String {
        if self.path.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.path, name)
        }
    }

    fn child(&self, name: &str) -> Self {
        Self {
            store: Arc::clone(&self.store),
            root: self.root.clone(),
            path: self.child_path(name),
        }
    }

    fn store_metadata(&self, attrs: Map<String, Value>) -> Result<()> {
        let metadata: GroupMetadata = serde_json::from_value(json!({ "zarr_format": ZARR_FORMAT }))?;
        let mut group =
            ZarrGroup::new_with_metadata(Arc::clone(&self.store), &self.node(), metadata).map_err(HcsError::zarr)?;
        let empty = attrs.is_empty();
        *group.attributes_mut() = attrs;
        group.store_metadata().map_err(HcsError::zarr)?;
        let zattrs = self.dir().join(ZATTRS);
        if empty && zattrs.exists() {
            fs::remove_file(zattrs)?;
        }
        Ok(())
    }

    /// Open the subgroup `name`, creating it if it does not exist.
    pub fn require_group(&self, name: &str) -> Result<Group> {
        let group = self.child(name);
        let dir = group.dir();
        if !dir.join(ZGROUP).exists() {
            if dir.join(array::ZARRAY).exists() {
                return Err(HcsError::InvalidStore {
                    path: dir,
                    reason: "an array exists where a group was expected".into(),
                });
            }
            group.store_metadata(Map::new())?;
        }
        Ok(group)
    }

    /// Open the existing subgroup `name`.
    pub fn group(&self, name: &str) -> Result<Group> {
        let group = self.child(name);
        if !group.dir().join(ZGROUP).exists() {
            return Err(HcsError::InvalidStore {
                path: group.dir(),
                reason: format!("no group named '{name}'"),
            });
        }
        Ok(group)
    }

    pub fn contains(&self, name: &str) -> bool {
        let dir = self.dir().join(name);
        dir.join(ZGROUP).exists() || dir.join(array::ZARRAY).exists()
    }

    /// All attributes of this group (empty if none were written).
    pub fn attrs(&self) -> Result<Map<String, Value>> {
        let group = ZarrGroup::open(Arc::clone(&self.store), &self.node()).map_err(HcsError::zarr)?;
        Ok(group.attributes().clone())
    }

    pub fn attr(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.attrs()?.remove(key))
    }

    /// Replace all attributes.
    pub fn put_attrs(&self, attrs: Map<String, Value>) -> Result<()> {
        self.store_metadata(attrs)
    }

    /// Set one attribute, keeping the others.
    pub fn set_attr(&self, key: &str, value: impl Serialize) -> Result<()> {
        let mut attrs = self.attrs()?;
        attrs.insert(key.to_string(), serde_json::to_value(value)?);
        self.put_attrs(attrs)
    }

    /// Create (or replace) the array `name` in this group.
    pub fn create_array<T: Element>(
        &self,
        name: &str,
        shape: &[usize],
        chunks: &[usize],
        options: &StorageOptions,
    ) -> Result<ZarrArray<T>> {
        let child = self.child(name);
        ZarrArray::create(&self.store, &child.node(), &child.dir(), shape, chunks, options)
    }

    pub fn open_array<T: Element>(&self, name: &str) -> Result<ZarrArray<T>> {
        let child = self.child(name);
        ZarrArray::open(&self.store, &child.node(), &child.dir())
    }

    /// `.zarray` contents of the array `name`, whatever its element type.
    pub fn array_metadata(&self, name: &str) -> Result<ArrayMetadata> {
        let child = self.child(name);
        if !child.dir().join(array::ZARRAY).exists() {
            return Err(HcsError::InvalidStore {
                path: child.dir(),
                reason: "missing .zarray".into(),
            });
        }
        let array = zarrs::array::Array::open(Arc::clone(&self.store), &child.node()).map_err(HcsError::zarr)?;
        ArrayMetadata::of(&array)
    }
}

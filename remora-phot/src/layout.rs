use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{PhotError, Result};

/// File names of one observed field. Everything lives in a directory named
/// after the field, and every file name starts with the field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    root: PathBuf,
    name: String,
}

impl FieldLayout {
    /// A field directory `name` inside `root`.
    pub fn new(root: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            name: name.into(),
        }
    }

    /// Layout for a field given by its directory, e.g. `data/M33-B01`.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let name = dir
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| {
                PhotError::config(format!("cannot take a field name from {:?}", dir))
            })?;
        let root = dir.parent().map(Path::to_path_buf).unwrap_or_default();
        Ok(Self::new(root, name))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> PathBuf {
        self.root.join(&self.name)
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir().join(format!("{}{}", self.name, suffix))
    }

    pub fn raw_path(&self, partition: usize) -> PathBuf {
        self.file(&format!("_{}.phot", partition))
    }

    pub fn compressed_path(&self, partition: usize) -> PathBuf {
        self.file(&format!("_{}.phot.gz", partition))
    }

    pub fn columns_path(&self, partition: usize) -> PathBuf {
        self.file(&format!("_{}.phot.columns", partition))
    }

    pub fn partition_table_path(&self, partition: usize) -> PathBuf {
        self.file(&format!("_{}.phot.fits", partition))
    }

    pub fn merged_table_path(&self) -> PathBuf {
        self.file(".phot.fits")
    }

    pub fn wcs_path(&self, filter: &str) -> PathBuf {
        self.file(&format!("_{}_drc_wcs.txt", filter))
    }
}

/// Sibling path used while `path` is being written.
pub(crate) fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

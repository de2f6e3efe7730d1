use crate::error::{Cif2StlError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Staging directory holding at most one input file.
///
/// Every `store` clears the directory first so a previous upload can never
/// be picked up by a later generation.
pub struct UploadDir {
    root: PathBuf,
}

impl UploadDir {
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| Cif2StlError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Removes every regular file in the directory; returns how many were removed
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        let entries = fs::read_dir(&self.root).map_err(|e| Cif2StlError::io(&self.root, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| Cif2StlError::io(&self.root, e))?;
            let path = entry.path();
            if path.is_file() {
                fs::remove_file(&path).map_err(|e| Cif2StlError::io(&path, e))?;
                removed += 1;
            }
        }
        if removed > 0 {
            log::debug!("Cleared {} stale file(s) from {:?}", removed, self.root);
        }
        Ok(removed)
    }

    /// Clears the directory, then writes `bytes` under the bare file name
    pub fn store(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let name = Path::new(file_name)
            .file_name()
            .ok_or_else(|| Cif2StlError::InvalidRequest(format!("'{}' is not a file name", file_name)))?;
        self.clear()?;
        let target = self.root.join(name);
        fs::write(&target, bytes).map_err(|e| Cif2StlError::io(&target, e))?;
        log::info!("Staged {:?}", target);
        Ok(target)
    }

    /// Copies an existing file into the (cleared) directory
    pub fn stage(&self, source: &Path) -> Result<PathBuf> {
        let bytes = fs::read(source).map_err(|e| Cif2StlError::io(source, e))?;
        let name = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| Cif2StlError::InvalidRequest(format!("{:?} has no file name", source)))?;
        self.store(name, &bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_replaces_previous_upload() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = UploadDir::open(tmp.path().join("uploads")).unwrap();

        dir.store("first.cif", b"one").unwrap();
        let second = dir.store("second.cif", b"two").unwrap();

        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names.len(), 1);
        assert_eq!(fs::read(second).unwrap(), b"two");
    }

    #[test]
    fn test_store_strips_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = UploadDir::open(tmp.path()).unwrap();
        let p = dir.store("../../evil.cif", b"x").unwrap();
        assert_eq!(p.parent().unwrap(), tmp.path());
    }
}

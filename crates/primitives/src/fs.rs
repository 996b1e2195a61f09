use std::{
    ffi::OsString,
    fs::{self, File},
    io::{self, Write},
    path::{Path, PathBuf},
};

#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("The file could not be created: {0}")]
    /// The file could not be created
    UnableToCreateFile(io::Error),
    #[error("The file could not be read: {0}")]
    /// The file could not be read
    UnableToReadFile(io::Error),
    #[error("The file could not be renamed: {0}")]
    /// The file could not be renamed
    UnableToRenameFile(io::Error),
    #[error("Failed to write bytes to file: {0}")]
    /// Failed to write bytes to file
    UnableToWriteFile(io::Error),
    #[error("Failed to obtain file name of {0:?}")]
    /// The path has no file name component
    UnableToObtainFileName(PathBuf),
}

/// Path of the sibling temporary file used while `file_path` is being replaced.
pub fn temporary_path(file_path: &Path) -> Result<PathBuf, FsError> {
    let name = file_path
        .file_name()
        .ok_or_else(|| FsError::UnableToObtainFileName(file_path.to_path_buf()))?;
    let mut temp_name = OsString::from(".");
    temp_name.push(name);
    temp_name.push(".tmp");
    Ok(file_path.with_file_name(temp_name))
}

/// Write a file atomically by using a temporary file as an intermediate.
///
/// Readers of `file_path` observe either the previous contents or all of `bytes`, never a
/// truncated mix. On failure the temporary file is removed and `file_path` is left untouched.
pub fn write_file_via_temporary(
    file_path: &Path,
    temp_path: &Path,
    bytes: &[u8],
) -> Result<(), FsError> {
    let result = write_and_sync(temp_path, bytes)
        .and_then(|_| fs::rename(temp_path, file_path).map_err(FsError::UnableToRenameFile));

    if result.is_err() {
        // best effort, the original error is what matters
        let _ = fs::remove_file(temp_path);
    }

    result
}

/// Atomically replace `file_path` with `bytes`, staging through [`temporary_path`].
pub fn write_document(file_path: &Path, bytes: &[u8]) -> Result<(), FsError> {
    let temp_path = temporary_path(file_path)?;
    write_file_via_temporary(file_path, &temp_path, bytes)
}

pub fn read_document(file_path: &Path) -> Result<Vec<u8>, FsError> {
    fs::read(file_path).map_err(FsError::UnableToReadFile)
}

fn write_and_sync(path: &Path, bytes: &[u8]) -> Result<(), FsError> {
    let mut file = File::create(path).map_err(FsError::UnableToCreateFile)?;
    file.write_all(bytes).map_err(FsError::UnableToWriteFile)?;
    file.sync_all().map_err(FsError::UnableToWriteFile)?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn temporary_path_is_hidden_sibling() {
        let path = Path::new("/tmp/docs/tx.json");
        assert_eq!(
            temporary_path(path).unwrap(),
            PathBuf::from("/tmp/docs/.tx.json.tmp")
        );
    }

    #[test]
    fn replaces_existing_contents() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tx.json");
        fs::write(&path, b"a much longer previous document").unwrap();

        write_document(&path, b"{}").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"{}");
        assert!(!temporary_path(&path).unwrap().exists());
    }

    #[test]
    fn missing_directory_fails_without_leftovers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("tx.json");

        assert!(matches!(
            write_document(&path, b"{}"),
            Err(FsError::UnableToCreateFile(..))
        ));
        assert!(!path.exists());
    }
}

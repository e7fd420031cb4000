use std::{
    io,
    path::{Path, PathBuf},
};

use shared::domain::DocumentKind;

/// A local file picked or dropped by the user, described the way the upload
/// surface sees it: name, declared media type, and size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub path: PathBuf,
}

impl UploadedFile {
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let metadata = std::fs::metadata(path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{}' is not a regular file", path.display()),
            ));
        }

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("document")
            .to_string();

        Ok(Self {
            name,
            mime_type: declared_mime_type(path),
            size_bytes: metadata.len(),
            path: path.to_path_buf(),
        })
    }

    pub fn kind(&self) -> Option<DocumentKind> {
        DocumentKind::from_mime_type(&self.mime_type)
    }
}

/// Media type derived from the file name, empty when nothing is known.
pub fn declared_mime_type(path: &Path) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .map(str::to_string)
        .unwrap_or_default()
}

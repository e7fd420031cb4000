//! Gate between the upload surface and the orchestrator.

use std::ops::Deref;

use shared::{domain::DocumentKind, error::ValidationError};

use crate::upload::UploadedFile;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

/// Extensions advertised by file pickers. Gating itself is by media type.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = ["pdf", "doc", "docx"];

/// An [`UploadedFile`] that passed [`validate`], unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedFile {
    file: UploadedFile,
    kind: DocumentKind,
}

impl ValidatedFile {
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    pub fn into_inner(self) -> UploadedFile {
        self.file
    }
}

impl Deref for ValidatedFile {
    type Target = UploadedFile;

    fn deref(&self) -> &Self::Target {
        &self.file
    }
}

pub fn validate(file: UploadedFile) -> Result<ValidatedFile, ValidationError> {
    let kind = check(&file.mime_type, file.size_bytes)?;
    Ok(ValidatedFile { file, kind })
}

/// Type first, then size. The declared type is trusted as-is.
pub fn check(mime_type: &str, size_bytes: u64) -> Result<DocumentKind, ValidationError> {
    let kind = DocumentKind::from_mime_type(mime_type).ok_or_else(|| {
        ValidationError::UnsupportedType {
            mime_type: mime_type.to_string(),
        }
    })?;

    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(ValidationError::FileTooLarge {
            size_bytes,
            limit_bytes: MAX_UPLOAD_BYTES,
        });
    }

    Ok(kind)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn candidate(name: &str, mime_type: &str, size_bytes: u64) -> UploadedFile {
        UploadedFile {
            name: name.to_string(),
            mime_type: mime_type.to_string(),
            size_bytes,
            path: PathBuf::from(name),
        }
    }

    #[test]
    fn rejects_plain_text_regardless_of_size() {
        for size in [0, 1, 2048, MAX_UPLOAD_BYTES, MAX_UPLOAD_BYTES + 1] {
            let err = validate(candidate("notes.txt", "text/plain", size)).expect_err("rejected");
            assert!(matches!(err, ValidationError::UnsupportedType { .. }));
            assert_eq!(
                err.to_string(),
                "Please upload a PDF or Word document (.pdf, .doc, .docx)"
            );
        }
    }

    #[test]
    fn accepts_exactly_ten_mebibytes() {
        let validated =
            validate(candidate("nda.pdf", "application/pdf", 10_485_760)).expect("accepted");
        assert_eq!(validated.kind(), DocumentKind::Pdf);
        assert_eq!(validated.size_bytes, 10_485_760);
    }

    #[test]
    fn rejects_one_byte_over_the_limit() {
        let err =
            validate(candidate("nda.pdf", "application/pdf", 10_485_761)).expect_err("too big");
        assert_eq!(
            err,
            ValidationError::FileTooLarge {
                size_bytes: 10_485_761,
                limit_bytes: MAX_UPLOAD_BYTES,
            }
        );
    }

    #[test]
    fn accepts_every_allowed_kind_and_returns_file_unchanged() {
        for kind in DocumentKind::ALL {
            let file = candidate(
                &format!("contract.{}", kind.extension()),
                kind.mime_type(),
                1024,
            );
            let validated = validate(file.clone()).expect("accepted");
            assert_eq!(validated.kind(), kind);
            assert_eq!(validated.into_inner(), file);
        }
    }

    #[test]
    fn unknown_type_is_reported_before_size() {
        let err = check("", MAX_UPLOAD_BYTES * 4).expect_err("rejected");
        assert!(matches!(err, ValidationError::UnsupportedType { .. }));
    }
}

use crate::ApiError;
use reqwest::multipart::{Form, Part};
use std::path::Path;

/// A file to be sent as the `file` part of a multipart request.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub mime_type: Option<String>,
    pub contents: Vec<u8>,
}

impl Upload {
    pub fn new<S: Into<String>>(file_name: S, contents: Vec<u8>) -> Self {
        Upload {
            file_name: file_name.into(),
            mime_type: None,
            contents,
        }
    }

    pub fn with_mime_type<S: Into<String>>(self, mime_type: S) -> Self {
        Upload {
            mime_type: Some(mime_type.into()),
            ..self
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension.
    pub async fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ApiError> {
        let path = path.as_ref();
        let contents =
            tokio::fs::read(path)
                .await
                .map_err(|source| ApiError::File {
                    path: path.to_path_buf(),
                    source,
                })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| String::from("upload"));

        Ok(Upload {
            mime_type: guess_mime_type(path).map(String::from),
            file_name,
            contents,
        })
    }

    pub(crate) fn into_form(self) -> Result<Form, ApiError> {
        let Upload {
            file_name,
            mime_type,
            contents,
        } = self;

        let mut part = Part::bytes(contents).file_name(file_name);
        if let Some(mime_type) = mime_type {
            part = part.mime_str(&mime_type).map_err(|source| {
                ApiError::BadMimeType {
                    mime_type: mime_type.clone(),
                    source,
                }
            })?;
        }

        Ok(Form::new().part("file", part))
    }
}

fn guess_mime_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();

    match extension.as_str() {
        "pdf" => Some("application/pdf"),
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn read_an_upload_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Vacina.PDF");
        std::fs::write(&path, b"%PDF-1.4").unwrap();

        let got = Upload::from_path(&path).await.unwrap();

        assert_eq!(
            got,
            Upload::new("Vacina.PDF", b"%PDF-1.4".to_vec())
                .with_mime_type("application/pdf")
        );
    }

    #[tokio::test]
    async fn missing_files_are_reported() {
        let dir = tempfile::tempdir().unwrap();

        let got = Upload::from_path(dir.path().join("nope.png")).await;

        assert!(matches!(got, Err(ApiError::File { .. })));
    }

    #[test]
    fn garbage_mime_types_are_rejected_before_sending() {
        let upload = Upload::new("receipt.pdf", b"%PDF-1.4".to_vec())
            .with_mime_type("not a mime type");

        let got = upload.into_form();

        match got {
            Err(ApiError::BadMimeType { mime_type, .. }) => {
                assert_eq!(mime_type, "not a mime type")
            },
            other => panic!("Unexpected result: {:?}", other.map(|_| ())),
        }
    }
}

use std::{fmt, path::PathBuf, sync::Arc};

use shared::domain::{StudentId, TeacherId, TestId};

use crate::error::ClientError;

#[derive(Clone)]
enum FileSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

/// A locally selected answer sheet that the server has not acknowledged yet.
#[derive(Clone)]
pub struct PendingFile {
    filename: String,
    source: FileSource,
}

impl PendingFile {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            filename,
            source: FileSource::Path(path),
        }
    }

    pub fn from_bytes(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            source: FileSource::Bytes(Arc::from(bytes.into())),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn mime_type(&self) -> String {
        mime_guess::from_path(&self.filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string()
    }

    pub async fn read(&self) -> Result<Vec<u8>, ClientError> {
        match &self.source {
            FileSource::Path(path) => {
                tokio::fs::read(path)
                    .await
                    .map_err(|source| ClientError::ReadFile {
                        path: path.clone(),
                        source,
                    })
            }
            FileSource::Bytes(bytes) => Ok(bytes.to_vec()),
        }
    }
}

impl fmt::Debug for PendingFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("PendingFile");
        out.field("filename", &self.filename);
        match &self.source {
            FileSource::Path(path) => out.field("path", path),
            FileSource::Bytes(bytes) => out.field("len", &bytes.len()),
        };
        out.finish()
    }
}

/// Everything the answer-copy endpoint receives for one submit attempt.
#[derive(Debug, Clone)]
pub struct AnswerCopySubmission {
    pub student_id: StudentId,
    pub teacher_id: Option<TeacherId>,
    pub test_id: TestId,
    pub files: Vec<PendingFile>,
}

/// Identity of the signed-in student, handed to views at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub student_id: StudentId,
    pub standard: Option<u32>,
}

impl SessionContext {
    pub fn new(student_id: StudentId) -> Self {
        Self {
            student_id,
            standard: None,
        }
    }

    pub fn with_standard(mut self, standard: u32) -> Self {
        self.standard = Some(standard);
        self
    }
}

/// In-app destinations the upload view can leave to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    TestListing,
    Back,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Self::TestListing => "/student/physical-test",
            Self::Back => "..",
        }
    }
}

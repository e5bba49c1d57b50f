use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

id_newtype!(StudentId);
id_newtype!(TeacherId);
id_newtype!(TestId);
id_newtype!(SubjectId);
id_newtype!(SubmissionId);
id_newtype!(TopicId);

/// Submission status of a test as reported in the student's test listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TestStatus {
    Submitted,
    NotSubmitted,
    Delayed,
    Other(String),
}

impl TestStatus {
    /// Case-insensitive parse. Unknown labels are kept verbatim.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submitted" => Self::Submitted,
            "not submitted" => Self::NotSubmitted,
            "delayed" => Self::Delayed,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    /// A missing status is treated as "not submitted".
    pub fn from_optional(raw: Option<&str>) -> Self {
        raw.map(Self::parse).unwrap_or(Self::NotSubmitted)
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Submitted => "Submitted",
            Self::NotSubmitted => "Not Submitted",
            Self::Delayed => "Delayed",
            Self::Other(raw) => raw,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

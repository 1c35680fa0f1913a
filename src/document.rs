use chrono::NaiveDateTime;
use serde_derive::{Deserialize, Serialize};
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

/// The paperwork every volunteer needs to keep on file.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    VaccinationProof,
    IdCard,
    SignedContract,
}

impl DocumentType {
    pub const ALL: [DocumentType; 3] = [
        DocumentType::VaccinationProof,
        DocumentType::IdCard,
        DocumentType::SignedContract,
    ];

    /// The name the backend uses for this document type.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentType::VaccinationProof => "vaccination_proof",
            DocumentType::IdCard => "id_card",
            DocumentType::SignedContract => "signed_contract",
        }
    }
}

impl Display for DocumentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = UnknownDocumentType;

    fn from_str(s: &str) -> Result<DocumentType, Self::Err> {
        DocumentType::ALL
            .iter()
            .copied()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownDocumentType(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error(
    "\"{0}\" isn't a document type, expected vaccination_proof, id_card or signed_contract"
)]
pub struct UnknownDocumentType(String);

/// A file a volunteer uploaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: i64,
    pub user_id: i64,
    pub document_type: DocumentType,
    pub file_path: String,
    pub uploaded_at: NaiveDateTime,
}

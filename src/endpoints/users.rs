use super::Upload;
use crate::{ApiClient, ApiError, Document, DocumentType, RegisteredEvent};
use reqwest::Method;

/// The events the logged in volunteer signed up for.
pub async fn my_events(
    api: &ApiClient,
) -> Result<Vec<RegisteredEvent>, ApiError> {
    let request = api.request(Method::GET, "users/me/events")?;
    api.send_json(request).await
}

pub async fn my_documents(api: &ApiClient) -> Result<Vec<Document>, ApiError> {
    let request = api.request(Method::GET, "users/me/documents")?;
    api.send_json(request).await
}

/// Upload one of the volunteer's documents. Uploading the same type twice
/// replaces the previous file.
pub async fn upload_document(
    api: &ApiClient,
    document_type: DocumentType,
    file: Upload,
) -> Result<Document, ApiError> {
    let request = api
        .request(Method::POST, "users/me/documents")?
        .query(&[("document_type", document_type.as_str())])
        .multipart(file.into_form()?);
    api.send_json(request).await
}

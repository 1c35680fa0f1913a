use super::{Page, Upload};
use crate::{
    ApiClient, ApiError, FinancialRecord, MonthlySummary, NewFinancialRecord,
};
use reqwest::Method;

pub async fn list(
    api: &ApiClient,
    page: Page,
) -> Result<Vec<FinancialRecord>, ApiError> {
    let request = api.request(Method::GET, "financial")?.query(&page);
    api.send_json(request).await
}

pub async fn create(
    api: &ApiClient,
    record: &NewFinancialRecord,
) -> Result<FinancialRecord, ApiError> {
    let request = api.request(Method::POST, "financial")?.json(record);
    api.send_json(request).await
}

/// Attach a receipt or invoice to an existing record.
pub async fn upload_proof(
    api: &ApiClient,
    record_id: i64,
    proof: Upload,
) -> Result<FinancialRecord, ApiError> {
    let path = format!("financial/{}/upload-document", record_id);
    let request = api
        .request(Method::POST, &path)?
        .multipart(proof.into_form()?);
    api.send_json(request).await
}

/// Income, expenses and balance per month, oldest first.
pub async fn summary(api: &ApiClient) -> Result<Vec<MonthlySummary>, ApiError> {
    let request = api.request(Method::GET, "financial/summary")?;
    api.send_json(request).await
}

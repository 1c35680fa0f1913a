use super::{Page, Upload};
use crate::{ApiClient, ApiError, Event, EventRegistration, NewEvent};
use reqwest::Method;

/// Browse the event catalog. No login required.
pub async fn list(api: &ApiClient, page: Page) -> Result<Vec<Event>, ApiError> {
    let request = api.request(Method::GET, "events")?.query(&page);
    api.send_json(request).await
}

pub async fn get(api: &ApiClient, id: i64) -> Result<Event, ApiError> {
    let request = api.request(Method::GET, &format!("events/{}", id))?;
    api.send_json(request).await
}

/// Sign the logged in volunteer up for an event, taking one of its spots.
pub async fn register(
    api: &ApiClient,
    id: i64,
) -> Result<EventRegistration, ApiError> {
    let request =
        api.request(Method::POST, &format!("events/{}/register", id))?;
    api.send_json(request).await
}

pub async fn create(
    api: &ApiClient,
    event: &NewEvent,
) -> Result<Event, ApiError> {
    let request = api.request(Method::POST, "events")?.json(event);
    api.send_json(request).await
}

pub async fn update(
    api: &ApiClient,
    id: i64,
    event: &NewEvent,
) -> Result<Event, ApiError> {
    let request = api
        .request(Method::PUT, &format!("events/{}", id))?
        .json(event);
    api.send_json(request).await
}

pub async fn delete(api: &ApiClient, id: i64) -> Result<(), ApiError> {
    let request = api.request(Method::DELETE, &format!("events/{}", id))?;
    api.send(request).await?;
    Ok(())
}

/// Attach a promotional image to an event.
pub async fn upload_image(
    api: &ApiClient,
    id: i64,
    image: Upload,
) -> Result<Event, ApiError> {
    let request = api
        .request(Method::POST, &format!("events/{}/upload-image", id))?
        .multipart(image.into_form()?);
    api.send_json(request).await
}

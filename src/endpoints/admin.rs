use crate::{ApiClient, ApiError, NewUser, User};
use reqwest::Method;
use serde_derive::Serialize;

/// Everyone with an account. Admin only.
pub async fn list_users(api: &ApiClient) -> Result<Vec<User>, ApiError> {
    let request = api.request(Method::GET, "admin/users")?;
    api.send_json(request).await
}

/// Create an account which is an administrator from the start.
pub async fn create_admin(
    api: &ApiClient,
    new_user: &NewUser,
) -> Result<User, ApiError> {
    let request = api.request(Method::POST, "admin/users")?.json(new_user);
    api.send_json(request).await
}

/// Grant or revoke a user's admin role.
pub async fn set_role(
    api: &ApiClient,
    user_id: i64,
    is_admin: bool,
) -> Result<User, ApiError> {
    let request = api
        .request(Method::PATCH, &format!("admin/users/{}/role", user_id))?
        .json(&RoleData { is_admin });
    api.send_json(request).await
}

#[derive(Debug, Copy, Clone, Serialize)]
struct RoleData {
    is_admin: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::endpoints::stub;
    use axum::{
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, patch},
        Json, Router,
    };
    use serde_json::{json, Value};

    fn admin_only(headers: &HeaderMap) -> Result<(), (StatusCode, Json<Value>)> {
        match stub::bearer(headers).as_deref() {
            Some("admin-token") => Ok(()),
            Some(_) => Err((
                StatusCode::FORBIDDEN,
                Json(json!({"detail": "Not enough permissions"})),
            )),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({"detail": "Not authenticated"})),
            )),
        }
    }

    fn router() -> Router {
        Router::new()
            .route(
                "/admin/users",
                get(|headers: HeaderMap| async move {
                    admin_only(&headers)?;
                    Ok::<_, (StatusCode, Json<Value>)>(Json(json!([
                        stub::user_json(1, true),
                        stub::user_json(2, false),
                    ])))
                }),
            )
            .route(
                "/admin/users/{id}/role",
                patch(
                    |headers: HeaderMap,
                     Path(id): Path<i64>,
                     Json(body): Json<Value>| async move {
                        admin_only(&headers)?;
                        let is_admin = body["is_admin"].as_bool().unwrap();
                        Ok::<_, (StatusCode, Json<Value>)>(Json(
                            stub::user_json(id, is_admin),
                        ))
                    },
                ),
            )
    }

    #[tokio::test]
    async fn admins_see_every_user() {
        let api = stub::logged_in_client(router(), "admin-token", true).await;

        let got = list_users(&api).await.unwrap();

        assert_eq!(got.len(), 2);
        assert!(got[0].is_admin);
        assert!(!got[1].is_admin);
    }

    #[tokio::test]
    async fn volunteers_are_forbidden() {
        let api = stub::logged_in_client(router(), "t1", false).await;

        let err = list_users(&api).await.unwrap_err();

        assert!(matches!(err, ApiError::Forbidden { .. }));
        assert_eq!(err.to_string(), "Not enough permissions");
    }

    #[tokio::test]
    async fn promote_a_volunteer() {
        let api = stub::logged_in_client(router(), "admin-token", true).await;

        let got = set_role(&api, 2, true).await.unwrap();

        assert_eq!(got.id, 2);
        assert!(got.is_admin);
    }
}

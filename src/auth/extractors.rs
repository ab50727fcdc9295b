use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::Role;

/// The authenticated caller, attached to the request by [`AccessFilter`](super::AccessFilter).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Authors may change their own content; administrators may change anything.
    pub fn can_modify(&self, author_id: i64) -> bool {
        self.is_admin() || self.user_id == author_id
    }
}

/// Rejects the request with 401 when no principal was attached.
impl FromRequest for Principal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(current_principal(req).map_err(Into::into))
    }
}

/// A principal holding the administrator role: 401 when anonymous, 403 otherwise.
#[derive(Debug, Clone)]
pub struct AdminPrincipal(pub Principal);

impl FromRequest for AdminPrincipal {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = current_principal(req).and_then(|principal| {
            if principal.is_admin() {
                Ok(AdminPrincipal(principal))
            } else {
                Err(AppError::Forbidden("Administrator role required".into()))
            }
        });
        ready(result.map_err(Into::into))
    }
}

fn current_principal(req: &HttpRequest) -> Result<Principal, AppError> {
    req.extensions()
        .get::<Principal>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Authentication required".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;

    fn principal(role: Role) -> Principal {
        Principal {
            user_id: 7,
            username: "ada".to_string(),
            role,
        }
    }

    #[actix_rt::test]
    async fn test_principal_extractor_success() {
        let req = TestRequest::default().to_http_request();
        req.extensions_mut().insert(principal(Role::User));

        let extracted = Principal::from_request(&req, &mut Payload::None).await.unwrap();
        assert_eq!(extracted.user_id, 7);
        assert!(!extracted.is_admin());
    }

    #[actix_rt::test]
    async fn test_principal_extractor_requires_authentication() {
        let req = TestRequest::default().to_http_request();

        let err = Principal::from_request(&req, &mut Payload::None).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_admin_extractor_distinguishes_anonymous_from_forbidden() {
        let anonymous = TestRequest::default().to_http_request();
        let err = AdminPrincipal::from_request(&anonymous, &mut Payload::None).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);

        let user = TestRequest::default().to_http_request();
        user.extensions_mut().insert(principal(Role::User));
        let err = AdminPrincipal::from_request(&user, &mut Payload::None).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::FORBIDDEN);

        let admin = TestRequest::default().to_http_request();
        admin.extensions_mut().insert(principal(Role::Admin));
        let AdminPrincipal(extracted) = AdminPrincipal::from_request(&admin, &mut Payload::None)
            .await
            .unwrap();
        assert!(extracted.is_admin());
    }

    #[test]
    fn test_can_modify() {
        assert!(principal(Role::User).can_modify(7));
        assert!(!principal(Role::User).can_modify(8));
        assert!(principal(Role::Admin).can_modify(8));
    }
}

/// Route guard middleware
///
/// Classifies page paths as protected, auth-only, or public and redirects
/// based on session state. The decision table is a pure, total function
/// over (class, token state, verified); the middleware only resolves the
/// token state and executes the decision. API paths are never redirected;
/// their handlers authenticate themselves.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    web, Error, HttpResponse,
};
use futures::future::LocalBoxFuture;
use sqlx::PgPool;
use std::rc::Rc;

use crate::auth::{
    clear_session_cookie, is_token_revoked, verify_session_token, Claims, SESSION_COOKIE,
};
use crate::configuration::JwtSettings;

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const VERIFY_PATH: &str = "/verify";
pub const HOME_PATH: &str = "/dashboard";

/// Resources requiring a verified, authenticated session.
const PROTECTED_ROUTES: &[&str] = &["/dashboard", "/messages", "/settings", "/send-message"];

/// Pages only meaningful to an unauthenticated or unverified visitor.
const AUTH_ROUTES: &[&str] = &["/sign-in", "/sign-up", "/verify"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    Protected,
    AuthOnly,
    Public,
}

pub fn classify(path: &str) -> RouteClass {
    if path.starts_with("/api/") {
        return RouteClass::Public;
    }
    if PROTECTED_ROUTES.iter().any(|route| path.starts_with(route)) {
        return RouteClass::Protected;
    }
    if AUTH_ROUTES.iter().any(|route| path.starts_with(route)) {
        return RouteClass::AuthOnly;
    }
    RouteClass::Public
}

/// Session state as seen by the guard. Revoked tokens resolve to `Invalid`.
#[derive(Debug)]
pub enum TokenState {
    Missing,
    Invalid,
    Valid(Claims),
}

#[derive(Debug, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    RedirectToSignIn { clear_cookie: bool },
    RedirectToVerify,
    RedirectToHome,
}

/// The guard's transition table. Total over every (class, token, verified)
/// combination.
pub fn decide(class: RouteClass, token: &TokenState, path: &str) -> GuardDecision {
    match class {
        RouteClass::Public => GuardDecision::Allow,
        RouteClass::Protected => match token {
            TokenState::Missing => GuardDecision::RedirectToSignIn { clear_cookie: false },
            TokenState::Invalid => GuardDecision::RedirectToSignIn { clear_cookie: true },
            TokenState::Valid(claims) => {
                if !claims.verified && path != VERIFY_PATH {
                    GuardDecision::RedirectToVerify
                } else {
                    GuardDecision::Allow
                }
            }
        },
        RouteClass::AuthOnly => match token {
            TokenState::Valid(claims) => {
                if claims.verified {
                    GuardDecision::RedirectToHome
                } else if path != VERIFY_PATH {
                    GuardDecision::RedirectToVerify
                } else {
                    GuardDecision::Allow
                }
            }
            TokenState::Missing | TokenState::Invalid => GuardDecision::Allow,
        },
    }
}

pub struct RouteGuard {
    jwt_config: JwtSettings,
    secure_cookies: bool,
}

impl RouteGuard {
    pub fn new(jwt_config: JwtSettings, secure_cookies: bool) -> Self {
        Self {
            jwt_config,
            secure_cookies,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RouteGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RouteGuardService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RouteGuardService {
            service: Rc::new(service),
            jwt_config: self.jwt_config.clone(),
            secure_cookies: self.secure_cookies,
        }))
    }
}

pub struct RouteGuardService<S> {
    service: Rc<S>,
    jwt_config: JwtSettings,
    secure_cookies: bool,
}

impl<S, B> Service<ServiceRequest> for RouteGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let jwt_config = self.jwt_config.clone();
        let secure_cookies = self.secure_cookies;
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let path = req.path().to_string();
            let class = classify(&path);

            if class == RouteClass::Public {
                return service.call(req).await;
            }

            let token_state = match req.cookie(SESSION_COOKIE) {
                None => TokenState::Missing,
                Some(cookie) => match verify_session_token(cookie.value(), &jwt_config) {
                    Err(_) => TokenState::Invalid,
                    Ok(claims) => match req.app_data::<web::Data<PgPool>>() {
                        Some(pool) => match is_token_revoked(pool, &claims.jti).await {
                            Ok(false) => TokenState::Valid(claims),
                            // Fail closed: unknown revocation status means
                            // the token is not trusted.
                            Ok(true) | Err(_) => TokenState::Invalid,
                        },
                        None => TokenState::Valid(claims),
                    },
                },
            };

            match decide(class, &token_state, &path) {
                GuardDecision::Allow => service.call(req).await,
                GuardDecision::RedirectToSignIn { clear_cookie } => {
                    Err(redirect(SIGN_IN_PATH, clear_cookie, secure_cookies))
                }
                GuardDecision::RedirectToVerify => Err(redirect(VERIFY_PATH, false, secure_cookies)),
                GuardDecision::RedirectToHome => Err(redirect(HOME_PATH, false, secure_cookies)),
            }
        })
    }
}

/// Build a redirect delivered through the error path, so the middleware
/// never has to rewrite the inner service's body type.
fn redirect(location: &str, clear_cookie: bool, secure_cookies: bool) -> Error {
    let mut builder = HttpResponse::SeeOther();
    builder.insert_header((header::LOCATION, location));
    if clear_cookie {
        builder.cookie(clear_session_cookie(secure_cookies));
    }

    actix_web::error::InternalError::from_response("redirect", builder.finish()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn claims(verified: bool) -> Claims {
        Claims::new(
            Uuid::new_v4(),
            "alice@example.com".to_string(),
            "alice".to_string(),
            verified,
            604800,
            "whisperbox".to_string(),
        )
    }

    #[test]
    fn test_classification() {
        assert_eq!(classify("/dashboard"), RouteClass::Protected);
        assert_eq!(classify("/messages"), RouteClass::Protected);
        assert_eq!(classify("/settings"), RouteClass::Protected);
        assert_eq!(classify("/send-message/alice"), RouteClass::Protected);
        assert_eq!(classify("/sign-in"), RouteClass::AuthOnly);
        assert_eq!(classify("/sign-up"), RouteClass::AuthOnly);
        assert_eq!(classify("/verify"), RouteClass::AuthOnly);
        assert_eq!(classify("/"), RouteClass::Public);
        assert_eq!(classify("/health_check"), RouteClass::Public);
        assert_eq!(classify("/api/register"), RouteClass::Public);
        assert_eq!(classify("/api/messages"), RouteClass::Public);
    }

    // The eight rows of the transition table.

    #[test]
    fn test_protected_without_token_redirects_to_sign_in() {
        assert_eq!(
            decide(RouteClass::Protected, &TokenState::Missing, "/dashboard"),
            GuardDecision::RedirectToSignIn { clear_cookie: false }
        );
    }

    #[test]
    fn test_protected_with_invalid_token_clears_cookie_and_redirects() {
        assert_eq!(
            decide(RouteClass::Protected, &TokenState::Invalid, "/dashboard"),
            GuardDecision::RedirectToSignIn { clear_cookie: true }
        );
    }

    #[test]
    fn test_protected_unverified_redirects_to_verify() {
        assert_eq!(
            decide(
                RouteClass::Protected,
                &TokenState::Valid(claims(false)),
                "/dashboard"
            ),
            GuardDecision::RedirectToVerify
        );
    }

    #[test]
    fn test_protected_verified_is_allowed() {
        assert_eq!(
            decide(
                RouteClass::Protected,
                &TokenState::Valid(claims(true)),
                "/dashboard"
            ),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_auth_only_unverified_redirects_to_verify() {
        assert_eq!(
            decide(
                RouteClass::AuthOnly,
                &TokenState::Valid(claims(false)),
                "/sign-in"
            ),
            GuardDecision::RedirectToVerify
        );
    }

    #[test]
    fn test_auth_only_unverified_on_verify_page_is_allowed() {
        assert_eq!(
            decide(
                RouteClass::AuthOnly,
                &TokenState::Valid(claims(false)),
                "/verify"
            ),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_auth_only_verified_redirects_home() {
        assert_eq!(
            decide(
                RouteClass::AuthOnly,
                &TokenState::Valid(claims(true)),
                "/sign-in"
            ),
            GuardDecision::RedirectToHome
        );
        // Even from the verification page itself.
        assert_eq!(
            decide(
                RouteClass::AuthOnly,
                &TokenState::Valid(claims(true)),
                "/verify"
            ),
            GuardDecision::RedirectToHome
        );
    }

    #[test]
    fn test_auth_only_without_token_is_allowed() {
        assert_eq!(
            decide(RouteClass::AuthOnly, &TokenState::Missing, "/sign-in"),
            GuardDecision::Allow
        );
        assert_eq!(
            decide(RouteClass::AuthOnly, &TokenState::Invalid, "/sign-in"),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_public_is_always_allowed() {
        assert_eq!(
            decide(RouteClass::Public, &TokenState::Missing, "/"),
            GuardDecision::Allow
        );
        assert_eq!(
            decide(RouteClass::Public, &TokenState::Invalid, "/"),
            GuardDecision::Allow
        );
        assert_eq!(
            decide(RouteClass::Public, &TokenState::Valid(claims(true)), "/"),
            GuardDecision::Allow
        );
    }
}

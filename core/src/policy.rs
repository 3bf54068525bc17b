//! Status-code policy applied to every response before its body is parsed.
//!
//! | check               | used by                                  |
//! |---------------------|------------------------------------------|
//! | [`check_ok`]        | list endpoints                           |
//! | [`check_auth`]      | `check_item`                             |
//! | [`check_task_detail`] | task detail                            |
//! | [`check_created`]   | job update(s), rest gross weight, password |
//! | [`check_login`]     | login                                    |
//!
//! A 403 wins over every other rule except on login, which has no session
//! to expire.

use crate::error::ApiError;
use crate::http::HttpResponse;

pub fn check_auth(response: &HttpResponse) -> Result<(), ApiError> {
    if response.status == 403 {
        return Err(ApiError::AuthExpired);
    }
    Ok(())
}

/// Reads whose body is taken as-is once the session is known to be valid.
pub fn check_ok(response: &HttpResponse) -> Result<(), ApiError> {
    check_auth(response)
}

pub fn check_task_detail(response: &HttpResponse) -> Result<(), ApiError> {
    check_auth(response)?;
    match response.status {
        200 => Ok(()),
        404 => Err(ApiError::NotFound),
        status => Err(ApiError::Redirected { status }),
    }
}

/// Status-mutating writes answer 201; anything else carries the backend's
/// message in the body.
pub fn check_created(response: &HttpResponse) -> Result<(), ApiError> {
    check_auth(response)?;
    if response.status != 201 {
        return Err(ApiError::ValidationFailure(response.body.clone()));
    }
    Ok(())
}

pub fn check_login(response: &HttpResponse) -> Result<(), ApiError> {
    if !response.is_ok() {
        return Err(ApiError::LoginRejected);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forbidden_is_auth_expired_everywhere_but_login() {
        let forbidden = HttpResponse::new(403, "forbidden");
        assert!(matches!(check_auth(&forbidden), Err(ApiError::AuthExpired)));
        assert!(matches!(check_ok(&forbidden), Err(ApiError::AuthExpired)));
        assert!(matches!(check_task_detail(&forbidden), Err(ApiError::AuthExpired)));
        assert!(matches!(check_created(&forbidden), Err(ApiError::AuthExpired)));
        assert!(matches!(check_login(&forbidden), Err(ApiError::LoginRejected)));
    }

    #[test]
    fn auth_check_lets_other_failures_through() {
        assert!(check_auth(&HttpResponse::new(500, "{}")).is_ok());
        assert!(check_auth(&HttpResponse::new(404, "{}")).is_ok());
    }

    #[test]
    fn ok_check_passes_any_other_status() {
        assert!(check_ok(&HttpResponse::new(200, "[]")).is_ok());
        assert!(check_ok(&HttpResponse::new(500, "[]")).is_ok());
    }

    #[test]
    fn task_detail_statuses() {
        assert!(check_task_detail(&HttpResponse::new(200, "{}")).is_ok());
        assert!(matches!(
            check_task_detail(&HttpResponse::new(404, "")),
            Err(ApiError::NotFound)
        ));
        assert!(matches!(
            check_task_detail(&HttpResponse::new(201, "")),
            Err(ApiError::Redirected { status: 201 })
        ));
        assert!(matches!(
            check_task_detail(&HttpResponse::new(500, "")),
            Err(ApiError::Redirected { status: 500 })
        ));
    }

    #[test]
    fn created_check_requires_exactly_201() {
        assert!(check_created(&HttpResponse::new(201, "")).is_ok());

        let err = check_created(&HttpResponse::new(200, "ok")).unwrap_err();
        assert_eq!(err.to_string(), "ok");

        let err = check_created(&HttpResponse::new(400, "weight mismatch")).unwrap_err();
        assert!(matches!(&err, ApiError::ValidationFailure(msg) if msg == "weight mismatch"));
    }

    #[test]
    fn login_accepts_any_2xx() {
        assert!(check_login(&HttpResponse::new(200, "\"t\"")).is_ok());
        assert!(check_login(&HttpResponse::new(201, "\"t\"")).is_ok());
        let err = check_login(&HttpResponse::new(401, "user locked")).unwrap_err();
        assert_eq!(err.to_string(), "invalid login or password");
    }
}

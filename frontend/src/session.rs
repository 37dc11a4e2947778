use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::model::LoginResponse;
use crate::storage;

const TOKEN_KEY: &str = "access_token";
const STATUS_KEY: &str = "user_status";
const USERNAME_KEY: &str = "username";
const ADMIN_STATUS: &str = "ADM";

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub token: String,
    pub username: Option<String>,
    pub status: Option<String>,
}

/// Decodes the claims segment of a JWT without verifying it.
pub fn parse_jwt_payload(token: &str) -> Option<serde_json::Value> {
    let claims = token.split('.').nth(1)?;
    let bytes = match URL_SAFE_NO_PAD.decode(claims.trim_end_matches('=')) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%err, "token claims are not base64url");
            return None;
        }
    };
    serde_json::from_slice(&bytes).ok()
}

impl Session {
    pub fn claims(&self) -> Option<serde_json::Value> {
        parse_jwt_payload(&self.token)
    }

    /// Claims win; the status stored at login is the fallback.
    pub fn is_admin(&self) -> bool {
        let from_claims = self
            .claims()
            .and_then(|c| c.get("status").and_then(|s| s.as_str()).map(|s| s == ADMIN_STATUS));
        match from_claims {
            Some(true) => true,
            _ => self.status.as_deref() == Some(ADMIN_STATUS),
        }
    }

    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| {
                self.claims()
                    .and_then(|c| c.get("sub").and_then(|s| s.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| "Usuário".to_string())
    }

    pub fn is_expired(&self, now_unix: i64) -> bool {
        self.claims()
            .and_then(|c| c.get("exp").and_then(|e| e.as_f64()))
            .map(|exp| (exp as i64) <= now_unix)
            .unwrap_or(false)
    }

    pub fn from_login(response: &LoginResponse) -> Session {
        let user_status = response
            .user
            .as_ref()
            .and_then(|u| u.status.clone());
        Session {
            token: response.access_token.clone(),
            username: response.user.as_ref().and_then(|u| u.nome.clone()),
            status: response.status.clone().or(user_status),
        }
    }
}

pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Session left by a previous login, unless its token has expired.
pub fn restore() -> Option<Session> {
    let token = storage::get_item(TOKEN_KEY).filter(|t| !t.is_empty())?;
    let session = Session {
        token,
        username: storage::get_item(USERNAME_KEY),
        status: storage::get_item(STATUS_KEY),
    };
    if session.is_expired(now_unix()) {
        tracing::info!("stored token expired, discarding session");
        clear();
        return None;
    }
    Some(session)
}

pub fn store(session: &Session) {
    storage::set_item(TOKEN_KEY, &session.token);
    if let Some(status) = &session.status {
        storage::set_item(STATUS_KEY, status);
    }
    if let Some(username) = &session.username {
        storage::set_item(USERNAME_KEY, username);
    }
}

pub fn clear() {
    storage::remove_item(TOKEN_KEY);
    storage::remove_item(STATUS_KEY);
    storage::remove_item(USERNAME_KEY);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with(claims: serde_json::Value) -> String {
        let body = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        format!("eyJhbGciOiJIUzI1NiJ9.{}.signature", body)
    }

    fn session(token: String, status: Option<&str>) -> Session {
        Session {
            token,
            username: None,
            status: status.map(str::to_string),
        }
    }

    #[test]
    fn reads_claims_from_token() {
        let token = token_with(serde_json::json!({"sub": "diego", "exp": 1700000000}));
        let claims = parse_jwt_payload(&token).unwrap();
        assert_eq!(claims["sub"], "diego");
    }

    #[test]
    fn malformed_tokens_have_no_claims() {
        assert!(parse_jwt_payload("not-a-token").is_none());
        assert!(parse_jwt_payload("a.@@@.c").is_none());
        assert!(parse_jwt_payload("a.bm90IGpzb24.c").is_none());
    }

    #[test]
    fn admin_from_claims_or_stored_status() {
        let adm = token_with(serde_json::json!({"sub": "ana", "status": "ADM"}));
        assert!(session(adm, None).is_admin());

        let plain = token_with(serde_json::json!({"sub": "rute"}));
        assert!(!session(plain.clone(), None).is_admin());
        assert!(session(plain.clone(), Some("ADM")).is_admin());
        assert!(!session(plain, Some("USER")).is_admin());
        assert!(session("garbage".into(), Some("ADM")).is_admin());
    }

    #[test]
    fn expiry_uses_exp_claim() {
        let token = token_with(serde_json::json!({"sub": "alex", "exp": 1000}));
        let s = session(token, None);
        assert!(!s.is_expired(999));
        assert!(s.is_expired(1000));
        let no_exp = session(token_with(serde_json::json!({"sub": "alex"})), None);
        assert!(!no_exp.is_expired(i64::MAX));
    }

    #[test]
    fn login_response_fills_session() {
        let response: LoginResponse = serde_json::from_str(
            r#"{"access_token":"t","token_type":"bearer","user":{"id":1,"nome":"Diego","password":"x","status":"ADM"}}"#,
        )
        .unwrap();
        let s = Session::from_login(&response);
        assert_eq!(s.username.as_deref(), Some("Diego"));
        assert_eq!(s.status.as_deref(), Some("ADM"));
        assert_eq!(s.display_name(), "Diego");
    }
}

//! Session tokens correlating every record of one user/request flow.

/// Cookie carrying the session between services.
pub const SESSION_KEY: &str = "QLOG_SESSION";

/// Generate a fresh session: 32 lower-case hex characters.
pub fn generate() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Extract the session from a raw `Cookie` header value
/// (`a=1; QLOG_SESSION=abc; b=2`). Percent-encoded values are decoded;
/// an empty value counts as absent.
pub fn from_cookie_header(header: &str) -> Option<String> {
    header.split(';').find_map(|pair| {
        let (name, value) = pair.split_once('=')?;
        if name.trim() != SESSION_KEY {
            return None;
        }
        let value = value.trim().trim_matches('"');
        let decoded = urlencoding::decode(value).ok()?.into_owned();
        (!decoded.is_empty()).then_some(decoded)
    })
}

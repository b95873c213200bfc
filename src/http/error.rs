//! Typed HTTP errors callers can downcast to.

use reqwest::StatusCode;

/// The server answered with something other than 200 OK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpStatusError {
    pub url: String,
    pub status: StatusCode,
}

impl HttpStatusError {
    pub fn new(url: impl Into<String>, status: StatusCode) -> Self {
        Self {
            url: url.into(),
            status,
        }
    }

    /// Numeric status code.
    pub fn code(&self) -> u16 {
        self.status.as_u16()
    }
}

impl std::fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status.canonical_reason() {
            Some(reason) => write!(
                f,
                "Server responded {} {} for {}",
                self.status.as_u16(),
                reason,
                self.url
            ),
            None => write!(f, "Server responded {} for {}", self.status.as_u16(), self.url),
        }
    }
}

impl std::error::Error for HttpStatusError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_reason() {
        let err = HttpStatusError::new("https://example.com/x", StatusCode::NOT_FOUND);
        assert_eq!(
            err.to_string(),
            "Server responded 404 Not Found for https://example.com/x"
        );
        assert_eq!(err.code(), 404);
    }

    #[test]
    fn test_display_without_reason() {
        let status = StatusCode::from_u16(599).unwrap();
        let err = HttpStatusError::new("https://example.com", status);
        assert_eq!(err.to_string(), "Server responded 599 for https://example.com");
    }

    #[test]
    fn test_downcast_through_anyhow() {
        let err = anyhow::Error::from(HttpStatusError::new("u", StatusCode::BAD_GATEWAY));
        let err = err.context("Failed to fetch releases");
        let status = err.downcast_ref::<HttpStatusError>().map(|e| e.status);
        assert_eq!(status, Some(StatusCode::BAD_GATEWAY));
    }
}

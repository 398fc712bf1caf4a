use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use whub_domain::constants::ACTOR_HEADER;

const MAX_ACTOR_LEN: usize = 120;

/// Caller identity as declared by the `X-Actor` header, recorded verbatim in the audit trail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Actor(pub Option<String>);

impl Actor {
    #[must_use]
    pub fn as_deref(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let actor = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.chars().take(MAX_ACTOR_LEN).collect());
        Ok(Self(actor))
    }
}

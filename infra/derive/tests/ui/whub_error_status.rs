use std::borrow::Cow;
use whub_derive::whub_error;

#[whub_error]
pub enum ListingError {
    #[http(404)]
    #[error("Listing not found{}: {message}", format_context(.context))]
    NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[http(409)]
    #[error("Listing conflict{}: {message}", format_context(.context))]
    StateConflict { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let missing = ListingError::NotFound { message: "shop:abc".into(), context: None };
    assert_eq!(missing.http_status(), 404);
    assert_eq!(missing.kind(), "not_found");

    let conflict = ListingError::StateConflict { message: "inactive".into(), context: None };
    assert_eq!(conflict.http_status(), 409);
    assert_eq!(conflict.kind(), "state_conflict");

    let internal: ListingError = String::from("boom").into();
    assert_eq!(internal.http_status(), 500);
}

use crate::SAFE_ALPHABET;
use std::borrow::Cow;

#[whub_derive::whub_error]
pub enum ResourceGuardError {
    #[error("Resource validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Checks identifiers coming from request paths before they reach a query.
#[derive(Debug)]
pub struct ResourceGuard;

impl ResourceGuard {
    /// Returns the bare key of `id` after checking it belongs to `expected_table`.
    ///
    /// Accepts `"<table>:<key>"` or just `"<key>"`. Rejects a foreign table prefix, an empty key
    /// and keys with characters outside [`SAFE_ALPHABET`].
    pub fn verify<I, T>(id: I, expected_table: T) -> Result<String, ResourceGuardError>
    where
        I: AsRef<str>,
        T: AsRef<str>,
    {
        let id = id.as_ref().trim();
        let expected = expected_table.as_ref();

        let key = match id.split_once(':') {
            Some((table, key)) if table == expected => key,
            Some((table, _)) => {
                return Err(ResourceGuardError::Validation {
                    message: format!("expected '{expected}', got '{table}'").into(),
                    context: Some("ID table mismatch".into()),
                });
            },
            None => id,
        };

        if key.is_empty() {
            return Err(ResourceGuardError::Validation {
                message: "empty key".into(),
                context: Some(expected.to_owned().into()),
            });
        }
        if let Some(bad) = key.chars().find(|c| !SAFE_ALPHABET.contains(c)) {
            return Err(ResourceGuardError::Validation {
                message: format!("unexpected character '{bad}'").into(),
                context: Some(expected.to_owned().into()),
            });
        }

        Ok(key.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_matching_prefix() {
        assert_eq!(ResourceGuard::verify("shop:Ab3x", "shop").unwrap(), "Ab3x");
        assert_eq!(ResourceGuard::verify("Ab3x", "shop").unwrap(), "Ab3x");
    }

    #[test]
    fn rejects_spoofed_or_malformed_ids() {
        assert!(ResourceGuard::verify("migration:Ab3x", "shop").is_err());
        assert!(ResourceGuard::verify("shop:", "shop").is_err());
        assert!(ResourceGuard::verify("Ab3x; DELETE shop", "shop").is_err());
        assert!(ResourceGuard::verify("l0I1", "shop").is_err());
    }
}

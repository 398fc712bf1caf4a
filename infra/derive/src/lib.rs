#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by every crate of the marketplace workspace.
//!
//! * [`whub_error`] turns an enum into a context-aware error type with an HTTP status table.
//! * [`whub_slice`] turns a struct into a shareable feature-slice handle.
//! * [`api_model`] / [`api_handler`] keep DTOs and Axum handlers consistent with the `OpenAPI`
//!   document.
//! * [`main`] boots the tuned Tokio runtime (re-exported as `whub_runtime::main`).
//!
//! Examples are `ignore`d because proc-macro crates cannot use their own macros in doctests.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bootstrap the tuned Tokio runtime.
///
/// Transforms an `async fn main` returning a `Result` into a plain `fn main` that builds the
/// runtime from a `whub_runtime::RuntimeConfig` preset.
///
/// # Arguments
///
/// * `high_performance` - server preset.
/// * `memory_efficient` - small-footprint preset.
/// * `default` (or nothing) - auto-detected worker threads.
///
/// # Examples
///
/// ```rust,ignore
/// #[whub_runtime::main(high_performance)]
/// async fn main() -> anyhow::Result<()> {
///     Ok(())
/// }
/// ```
#[proc_macro_attribute]
pub fn main(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::runtime::expand_main(args.into(), input).into()
}

/// Defines a request/response model of the public API.
///
/// * Adds `Debug`, `Serialize`, `Deserialize` and `utoipa::ToSchema` derives when missing.
/// * Applies `#[serde(rename_all = "snake_case")]` unless overridden.
/// * Applies `#[serde(deny_unknown_fields)]` unless disabled.
///
/// # Example
///
/// ```rust,ignore
/// #[api_model(rename_all = "camelCase", deny_unknown_fields = false)]
/// pub struct ReviewRequest {
///     pub decision: ReviewDecision,
///     pub notes: Option<String>,
/// }
/// ```
#[proc_macro_attribute]
pub fn api_model(attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    macros::api::expand_api_model(attr.into(), input).into()
}

/// Bridges an Axum handler with the `OpenAPI` document.
///
/// Accepts the usual `utoipa::path` arguments (`get`, `path = "..."`, `params(...)`,
/// `responses(...)`, `tag = ...`) and forwards them verbatim.
///
/// # Example
///
/// ```rust,ignore
/// #[api_handler(
///     get,
///     path = "/api/challenges/{id}",
///     responses((status = OK, body = Challenge)),
///     tag = CHALLENGES_TAG
/// )]
/// pub async fn get_challenge(Path(id): Path<String>) -> Result<Json<Challenge>, ApiError> {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Defines a domain error enum.
///
/// # Generated Items
///
/// * `#[derive(Debug, thiserror::Error)]` when missing.
/// * `<ErrorName>Ext` trait adding `.context(...)` to `Result<T, ErrorName>` and to results of
///   every wrapped source error.
/// * `From<Source>` for variants with a `source` field (or a `#[source]`/`#[from]` field).
/// * `From<&'static str>` / `From<String>` when an `Internal` variant is present.
/// * `http_status()` and `kind()` methods. The status of a variant comes from an optional
///   `#[http(404)]` attribute and defaults to `500`; the kind is the snake-cased variant name.
///
/// # Requirements
///
/// Variants must use named fields; variants with a source must also carry
/// `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// #[whub_error]
/// pub enum ChallengeError {
///     #[http(404)]
///     #[error("Challenge not found{}: {message}", format_context(.context))]
///     NotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
///
///     #[error("Database error{}: {source}", format_context(.context))]
///     Database { source: DatabaseError, context: Option<Cow<'static, str>> },
///
///     #[error("Internal error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
/// ```
#[proc_macro_attribute]
pub fn whub_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Defines a feature-slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` wraps it in an `Arc`, derefs to it and
/// implements `whub_kernel::domain::registry::FeatureSlice` so it can be registered in the API
/// state.
///
/// # Example
/// ```rust,ignore
/// #[whub_derive::whub_slice]
/// pub struct Challenges {
///     repository: ChallengeRepository,
/// }
///
/// let slice = Challenges::new(ChallengesInner { repository });
/// ```
#[proc_macro_attribute]
pub fn whub_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}

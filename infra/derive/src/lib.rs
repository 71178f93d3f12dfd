#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the `VelaUX` workspace.
//!
//! * [`velaux_error`] turns an enum into a context-aware error type.
//! * [`velaux_slice`] wraps feature state into a cheaply clonable slice handle.
//! * [`api_handler`] bridges Axum handlers with `utoipa` path documentation.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, ItemFn, ItemStruct, parse_macro_input};

/// Attribute macro to bridge Axum handlers with `OpenAPI` documentation.
///
/// Accepts the usual `utoipa::path` arguments (`get`, `put`, `path = "..."`,
/// `request_body = ...`, `responses(...)`, `tag = ...`). The `utoipa::path`
/// attribute is only emitted when the consuming crate enables its `server` feature.
///
/// # Example
///
/// ```rust,ignore
/// use velaux_derive::api_handler;
///
/// #[api_handler(
///     get,
///     path = "/health",
///     responses((status = OK, body = HealthResponse)),
///     tag = "System"
/// )]
/// pub async fn health_handler() -> impl IntoResponse {
///     // ...
/// }
/// ```
#[proc_macro_attribute]
pub fn api_handler(args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemFn);
    macros::api::expand_api_handler(args.into(), input).into()
}

/// Defines a domain-specific error enum.
///
/// # Features
///
/// * **Automatic Derives**: injects `#[derive(Debug, thiserror::Error)]` unless already present.
/// * **Context Support**: generates a companion `...Ext` trait adding `.context()` to any
///   `Result` whose error converts into this enum.
/// * **Standard Conversions**: implements `From<T>` for variants with a `source` field
///   (or a field marked `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant exists.
///
/// # Requirements
///
/// 1. Only enums are accepted.
/// 2. Variants must use named fields.
/// 3. Variants with a source must carry `context: Option<Cow<'static, str>>`.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[velaux_derive::velaux_error]
/// pub enum ClusterError {
///     #[error("Kubernetes client error{}: {source}", format_context(.context))]
///     Kube { source: kube::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal cluster error{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn connect(config: kube::Config) -> Result<kube::Client, ClusterError> {
///     kube::Client::try_from(config).context("Building the shared client")
/// }
/// ```
#[proc_macro_attribute]
pub fn velaux_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}

/// Defines a feature slice handle.
///
/// The annotated struct becomes `<Name>Inner`; `<Name>` is generated as an
/// `Arc` wrapper that derefs to the inner state and implements
/// `velaux_domain::registry::FeatureSlice`, so it can be registered in `ApiState`.
///
/// # Example
/// ```rust,ignore
/// #[velaux_derive::velaux_slice]
/// pub struct SystemInfo {
///     pub service: Arc<dyn SystemInfoService>,
/// }
///
/// let slice = SystemInfo::new(SystemInfoInner { service });
/// ```
#[proc_macro_attribute]
pub fn velaux_slice(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = syn::parse_macro_input!(item as ItemStruct);
    macros::slice::expand_slice(input).into()
}

use proc_macro2::TokenStream;
use quote::quote;
use syn::ItemFn;

/// Expands the `#[api_handler]` attribute macro.
///
/// Handlers stay plain async functions; the `OpenAPI` metadata is attached
/// behind the consumer's `server` feature.
pub fn expand_api_handler(args: TokenStream, input: ItemFn) -> TokenStream {
    if input.sig.asyncness.is_none() {
        return syn::Error::new_spanned(&input.sig.ident, "api_handler requires an async fn")
            .to_compile_error();
    }

    let ItemFn { attrs, vis, sig, block } = input;

    quote! {
        #(#attrs)*
        #[allow(clippy::unused_async)]
        #[cfg_attr(feature = "server", ::utoipa::path(#args))]
        #vis #sig #block
    }
}

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{Fields, ItemStruct};

pub fn expand_slice(input: ItemStruct) -> TokenStream {
    let ItemStruct { attrs, vis, ident: handle, fields, .. } = input;
    let inner = format_ident!("{handle}Inner");
    let doc = format!("Shared handle over [`{inner}`].");
    let semi = if matches!(fields, Fields::Named(_)) { quote! {} } else { quote! { ; } };

    quote! {
        #(#attrs)*
        #vis struct #inner #fields #semi

        #[doc = #doc]
        #[derive(Clone)]
        #vis struct #handle {
            inner: ::std::sync::Arc<#inner>,
        }

        impl #handle {
            #[must_use]
            pub fn new(inner: #inner) -> Self {
                Self { inner: ::std::sync::Arc::new(inner) }
            }
        }

        impl ::std::fmt::Debug for #handle {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.debug_struct(stringify!(#handle)).finish_non_exhaustive()
            }
        }

        impl ::std::ops::Deref for #handle {
            type Target = #inner;

            fn deref(&self) -> &Self::Target {
                &self.inner
            }
        }

        impl ::velaux_kernel::domain::registry::FeatureSlice for #handle {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }
    }
}

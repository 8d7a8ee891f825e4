//! Resolution of the runtime crate path for generated code.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

/// Path to the runtime crate as seen from the crate being compiled.
///
/// Prefers a direct `beanmap-mongodb` dependency and falls back to the
/// `beanmap` facade, which re-exports it as `beanmap::mongodb`.
pub(crate) fn runtime_crate() -> syn::Result<TokenStream> {
    use proc_macro_crate::{FoundCrate, crate_name};

    match crate_name("beanmap-mongodb") {
        Ok(FoundCrate::Itself) => return Ok(quote!(::beanmap_mongodb)),
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            return Ok(quote!(::#ident));
        }
        Err(_) => {}
    }

    match crate_name("beanmap") {
        Ok(FoundCrate::Itself) => Ok(quote!(::beanmap::mongodb)),
        Ok(FoundCrate::Name(name)) => {
            let ident = format_ident!("{}", name);
            Ok(quote!(::#ident::mongodb))
        }
        Err(e) => Err(syn::Error::new(
            proc_macro2::Span::call_site(),
            format!(
                "failed to resolve the `beanmap` crate: {}. Add `beanmap` or `beanmap-mongodb` to Cargo.toml dependencies.",
                e
            ),
        )),
    }
}

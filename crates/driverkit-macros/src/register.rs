use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{Ident, ItemFn, LitStr, parse_macro_input};

/// Implementation of `#[register_plugin(driver = "...", family = "...")]`.
///
/// Leaves the decorated constructor unchanged and appends a
/// `#[::driverkit_core::linkme::distributed_slice]` static that wires it into
/// `driverkit_core::PLUGIN_ENTRIES`.
pub fn register_plugin(attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut driver: Option<LitStr> = None;
    let mut family: Option<LitStr> = None;
    let parser = syn::meta::parser(|meta| {
        if meta.path.is_ident("driver") {
            driver = Some(meta.value()?.parse()?);
            Ok(())
        } else if meta.path.is_ident("family") {
            family = Some(meta.value()?.parse()?);
            Ok(())
        } else {
            Err(meta.error("unknown argument, expected one of: driver, family"))
        }
    });
    parse_macro_input!(attr with parser);
    let func = parse_macro_input!(item as ItemFn);

    let (Some(driver), Some(family)) = (driver, family) else {
        return syn::Error::new(
            Span::call_site(),
            "`register_plugin` requires both `driver = \"...\"` and `family = \"...\"`",
        )
        .into_compile_error()
        .into();
    };

    if func.sig.inputs.len() != 1 {
        return syn::Error::new_spanned(
            &func.sig,
            "plugin constructors take exactly one `Option<ConfigMapping>` argument",
        )
        .into_compile_error()
        .into();
    }

    let fn_name = &func.sig.ident;
    let fn_name_upper = fn_name.to_string().to_uppercase();
    let static_name = Ident::new(
        &format!("_PLUGIN_REGISTER_{fn_name_upper}"),
        Span::call_site(),
    );

    quote! {
        #func

        #[::driverkit_core::linkme::distributed_slice(::driverkit_core::PLUGIN_ENTRIES)]
        #[linkme(crate = ::driverkit_core::linkme)]
        static #static_name: ::driverkit_core::PluginEntry =
            ::driverkit_core::PluginEntry::new(#driver, #family, |config| {
                ::std::boxed::Box::new(#fn_name(config))
            });
    }
    .into()
}

use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input};

pub fn derive_component(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let struct_name = &ast.ident;

    // Uses `::weave_ecs::ecs::component::Component`, which resolves both inside
    // the crate (via `extern crate self as weave_ecs;` in lib.rs) and outside it.
    TokenStream::from(quote! {
        impl ::weave_ecs::ecs::component::Component for #struct_name {
        }
    })
}

extern crate proc_macro;
use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, ItemStruct};

#[proc_macro_attribute]
pub fn register_filter(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as ItemStruct);
    let struct_name = &input.ident;

    // Convert struct name to snake_case
    let fn_name_str = heck::ToSnakeCase::to_snake_case(struct_name.to_string().as_str());
    let fn_name = syn::Ident::new(
        &format!("register_filter_{}", fn_name_str),
        struct_name.span(),
    );

    let expanded = quote! {
        // The original struct definition
        #input

        // Registration function that adds the filter to the global registry
        #[ctor::ctor] // This attribute ensures this function runs when the program starts
        fn #fn_name() {
            crate::filters::filter::FilterRegistry::register_filter::<#struct_name>();  // Register the filter
        }
    };

    TokenStream::from(expanded)
}

/// Derives `CopyStaticFieldsTrait`. Fields marked with `#[static_field]` are
/// copied over from the other instance when both sides are the same concrete
/// filter type; everything else is left untouched.
#[proc_macro_derive(CopyStaticFields, attributes(static_field))]
pub fn derive_copy_static_fields(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let struct_name = &input.ident;

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return syn::Error::new_spanned(
                    struct_name,
                    "CopyStaticFields requires named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new_spanned(struct_name, "CopyStaticFields requires a struct")
                .to_compile_error()
                .into();
        }
    };

    let copies = fields
        .iter()
        .filter(|f| f.attrs.iter().any(|a| a.path().is_ident("static_field")))
        .map(|f| {
            let ident = &f.ident;
            quote! { self.#ident = other.#ident.clone(); }
        })
        .collect::<Vec<_>>();

    let expanded = quote! {
        impl crate::filters::filter::CopyStaticFieldsTrait for #struct_name {
            fn copy_static_fields_from(&mut self, other: &dyn crate::filters::filter::CopyStaticFieldsTrait) {
                if let Some(other) = other.downcast_ref::<#struct_name>() {
                    let _ = other;
                    #(#copies)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

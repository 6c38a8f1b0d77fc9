//! `#[derive(Injectable)]` for Sihr.
//!
//! Generates `Injectable::descriptor()` from a struct's fields:
//!
//! | field                   | parameter                                  |
//! |-------------------------|--------------------------------------------|
//! | `Arc<dyn Trait>`        | service declared as `Trait`                |
//! | `Arc<T>`                | service declared as `T`                    |
//! | `Option<T>`             | optional scalar                            |
//! | `#[inject(default)]`    | optional scalar, `Default::default()` if absent |
//! | `#[inject(skip)]`       | not a parameter, always `Default::default()` |
//! | anything else           | required scalar                            |
//!
//! `#[inject(name = "...")]` renames a field's parameter. On the struct it
//! renames the type, and `#[inject(implements = "dyn Trait")]` (repeatable)
//! declares an implemented interface. Fields may hold it as `Arc<dyn Trait>`
//! or with extra `+ Send + Sync` bounds.

extern crate proc_macro;

use darling::ast::{Data, Style};
use darling::util::Ignored;
use darling::{FromDeriveInput, FromField};
use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::ext::IdentExt;
use syn::{DeriveInput, GenericArgument, PathArguments, Type, TypeParamBound, parse_macro_input};

#[derive(FromDeriveInput)]
#[darling(attributes(inject), supports(struct_named, struct_unit))]
struct InjectableInput {
    ident: syn::Ident,
    generics: syn::Generics,
    data: Data<Ignored, InjectableField>,
    #[darling(default)]
    name: Option<String>,
    #[darling(multiple)]
    implements: Vec<String>,
}

#[derive(FromField)]
#[darling(attributes(inject))]
struct InjectableField {
    ident: Option<syn::Ident>,
    ty: Type,
    #[darling(default)]
    name: Option<String>,
    #[darling(default)]
    skip: bool,
    #[darling(default)]
    default: bool,
}

#[proc_macro_derive(Injectable, attributes(inject))]
pub fn derive_injectable(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let parsed = match InjectableInput::from_derive_input(&input) {
        Ok(parsed) => parsed,
        Err(e) => return e.write_errors().into(),
    };

    match expand(parsed) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

fn expand(input: InjectableInput) -> syn::Result<TokenStream2> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Injectable cannot be derived for generic types",
        ));
    }

    let ident = &input.ident;
    let Some(fields) = input.data.take_struct() else {
        return Err(syn::Error::new_spanned(ident, "Injectable can only be derived for structs"));
    };

    let named = input.name.as_ref().map(|name| quote! { .named(#name) });

    let implements = input
        .implements
        .iter()
        .map(|interface| {
            let interface: Type = syn::parse_str(interface).map_err(|e| {
                syn::Error::new_spanned(ident, format!("invalid interface `{interface}`: {e}"))
            })?;
            let casts = trait_object_flavours(&interface)
                .into_iter()
                .map(|flavour| {
                    quote! {
                        .implements::<#flavour>(|this| this as ::std::sync::Arc<#flavour>)
                    }
                });
            Ok(quote! { #(#casts)* })
        })
        .collect::<syn::Result<Vec<_>>>()?;

    let mut params = Vec::new();
    let mut inits = Vec::new();
    for field in &fields.fields {
        let (param, init) = expand_field(field)?;
        params.extend(param);
        inits.push(init);
    }

    let construct = match fields.style {
        Style::Unit => quote! { Self },
        _ => quote! { Self { #(#inits),* } },
    };

    Ok(quote! {
        impl ::sihr::Injectable for #ident {
            #[allow(unused_variables)]
            fn descriptor() -> ::sihr::TypeDescriptor {
                ::sihr::TypeDescriptor::of::<Self>()
                    #named
                    #(#params)*
                    #(#implements)*
                    .constructor(|args| ::core::result::Result::Ok(#construct))
            }
        }
    })
}

/// The builder call declaring `field`, and its initializer.
fn expand_field(field: &InjectableField) -> syn::Result<(Option<TokenStream2>, TokenStream2)> {
    let Some(ident) = &field.ident else {
        return Err(syn::Error::new_spanned(&field.ty, "expected a named field"));
    };
    let ty = &field.ty;

    if field.skip {
        return Ok((None, quote! { #ident: ::core::default::Default::default() }));
    }

    let name = field
        .name
        .clone()
        .unwrap_or_else(|| ident.unraw().to_string());

    if field.default {
        return Ok((
            Some(quote! { .optional_param(#name) }),
            quote! { #ident: args.optional::<#ty>(#name)?.unwrap_or_default() },
        ));
    }

    if let Some(inner) = generic_argument(ty, "Arc") {
        return Ok(match inner {
            Type::TraitObject(_) => (
                Some(quote! { .service::<#inner>(#name) }),
                quote! { #ident: args.interface::<#inner>(#name)? },
            ),
            _ => (
                Some(quote! { .service::<#inner>(#name) }),
                quote! { #ident: args.service::<#inner>(#name)? },
            ),
        });
    }

    if let Some(inner) = generic_argument(ty, "Option") {
        return Ok((
            Some(quote! { .optional_param(#name) }),
            quote! { #ident: args.optional::<#inner>(#name)? },
        ));
    }

    Ok((
        Some(quote! { .param(#name) }),
        quote! { #ident: args.param::<#ty>(#name)? },
    ))
}

/// `T` in `Wrapper<T>`, matched on the last path segment.
fn generic_argument<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    let Type::Path(path) = ty else {
        return None;
    };
    let segment = path.path.segments.last()?;
    if segment.ident != wrapper {
        return None;
    }
    let PathArguments::AngleBracketed(arguments) = &segment.arguments else {
        return None;
    };
    match arguments.args.first()? {
        GenericArgument::Type(inner) if arguments.args.len() == 1 => Some(inner),
        _ => None,
    }
}

/// `dyn Trait` plus its `+ Send` / `+ Sync` variants.
///
/// Constructors may ask for any of them, and each is a separate Rust type.
/// Bounds written in the attribute are kept in every variant; anything
/// that is not a trait object is returned as is.
fn trait_object_flavours(interface: &Type) -> Vec<TokenStream2> {
    let Type::TraitObject(object) = interface else {
        return vec![quote! { #interface }];
    };

    let mut send = false;
    let mut sync = false;
    let mut bounds = Vec::new();
    for bound in &object.bounds {
        match auto_trait(bound) {
            Some("Send") => send = true,
            Some("Sync") => sync = true,
            _ => bounds.push(bound),
        }
    }

    if bounds.is_empty() {
        return vec![quote! { #interface }];
    }

    let mut flavours = Vec::new();
    for with_send in [false, true] {
        for with_sync in [false, true] {
            if (send && !with_send) || (sync && !with_sync) {
                continue;
            }
            let send_bound = with_send.then(|| quote! { + ::core::marker::Send });
            let sync_bound = with_sync.then(|| quote! { + ::core::marker::Sync });
            flavours.push(quote! { dyn #(#bounds)+* #send_bound #sync_bound });
        }
    }
    flavours
}

fn auto_trait(bound: &TypeParamBound) -> Option<&'static str> {
    let TypeParamBound::Trait(bound) = bound else {
        return None;
    };
    let ident = &bound.path.segments.last()?.ident;
    if ident == "Send" {
        Some("Send")
    } else if ident == "Sync" {
        Some("Sync")
    } else {
        None
    }
}

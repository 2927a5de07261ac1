//! Derive support for `remold`'s reflection traits.
//!
//! See [`Reflect`].

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Data, DeriveInput, Fields, LitStr, parse_macro_input, parse_quote};

static REFLECT_ATTRIBUTE_NAME: &str = "reflect";

// -----------------------------------------------------------------------------
// Reflect

/// Implements `remold::Typed`, `remold::Reflect`, and `remold::FromReflect`
/// for a struct.
///
/// - Named-field structs snapshot into a mapping of their fields, with the
///   marker key injected when tagging is enabled. Every field type must
///   implement `Reflect` and `FromReflect`.
/// - Tuple structs snapshot into a plain sequence and are **not** tagged;
///   their type identity is lost on the wire.
/// - Unit structs snapshot into an empty (tagged) mapping.
/// - Enums and unions are not supported.
///
/// The identity defaults to the type's name and can be overridden:
///
/// ```rust, ignore
/// #[derive(Reflect)]
/// #[reflect(identity = "geo.Point")]
/// struct Point { x: i64, y: i64 }
/// ```
///
/// Under the `auto_register` feature, a constructor for every non-generic
/// named-field or unit struct is submitted for link-time collection, so
/// `ConstructorRegistry::new()` can rebuild it without manual registration.
#[proc_macro_derive(Reflect, attributes(reflect))]
pub fn derive_reflect(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: DeriveInput) -> syn::Result<TokenStream2> {
    let identity = parse_identity(&input)?.unwrap_or_else(|| input.ident.to_string());
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => Ok(expand_named(&input, fields, &identity)),
            Fields::Unnamed(fields) => Ok(expand_tuple(&input, fields, &identity)),
            Fields::Unit => Ok(expand_unit(&input, &identity)),
        },
        Data::Enum(_) | Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "`#[derive(Reflect)]` supports structs only",
        )),
    }
}

// -----------------------------------------------------------------------------
// Attribute parsing

fn parse_identity(input: &DeriveInput) -> syn::Result<Option<String>> {
    let mut identity = None;
    for attr in &input.attrs {
        if !attr.path().is_ident(REFLECT_ATTRIBUTE_NAME) {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("identity") {
                let lit: LitStr = meta.value()?.parse()?;
                identity = Some(lit.value());
                Ok(())
            } else {
                Err(meta.error("unknown `reflect` attribute"))
            }
        })?;
    }
    Ok(identity)
}

// -----------------------------------------------------------------------------
// Codegen

// Every type parameter is bounded by the reflection traits; fields of
// non-parameter types bring their own impls.
fn reflect_generics(input: &DeriveInput) -> syn::Generics {
    let mut generics = input.generics.clone();
    let params: Vec<syn::Ident> = input
        .generics
        .type_params()
        .map(|param| param.ident.clone())
        .collect();
    if !params.is_empty() {
        let where_clause = generics.make_where_clause();
        for param in params {
            where_clause
                .predicates
                .push(parse_quote!(#param: remold::Reflect + remold::FromReflect));
        }
    }
    generics
}

fn expand_named(input: &DeriveInput, fields: &syn::FieldsNamed, identity: &str) -> TokenStream2 {
    let ident = &input.ident;
    let generics = reflect_generics(input);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let field_idents: Vec<&syn::Ident> = fields
        .named
        .iter()
        .filter_map(|field| field.ident.as_ref())
        .collect();
    let field_names: Vec<String> = field_idents.iter().map(|ident| ident.to_string()).collect();
    let field_count = field_idents.len();

    let mut output = quote! {
        impl #impl_generics remold::Typed for #ident #ty_generics #where_clause {
            fn type_identity() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#identity)
            }
        }

        impl #impl_generics remold::Reflect for #ident #ty_generics #where_clause {
            fn reflect_identity(&self) -> ::std::borrow::Cow<'static, str> {
                <Self as remold::Typed>::type_identity()
            }

            fn reflect(&self, marker: ::core::option::Option<&str>) -> remold::Value {
                let mut attrs = remold::AttrMap::with_capacity(#field_count + 1);
                if let ::core::option::Option::Some(key) = marker {
                    attrs.insert(
                        key.to_owned(),
                        remold::Value::String(
                            <Self as remold::Typed>::type_identity().into_owned(),
                        ),
                    );
                }
                #(
                    attrs.insert(
                        #field_names.to_owned(),
                        remold::Reflect::reflect(&self.#field_idents, marker),
                    );
                )*
                remold::Value::Mapping(attrs)
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }
        }

        impl #impl_generics remold::FromReflect for #ident #ty_generics #where_clause {
            fn from_reflect(
                value: &remold::Value,
            ) -> ::core::result::Result<Self, remold::ExpandError> {
                let attrs = value.as_mapping().ok_or(remold::ExpandError::ExpectedKind {
                    expected: "MAPPING",
                    found: value.type_tag(),
                })?;
                ::core::result::Result::Ok(Self {
                    #(
                        #field_idents: remold::FromReflect::from_reflect(
                            attrs.get(#field_names).ok_or(
                                remold::ExpandError::MissingAttribute {
                                    identity: ::std::borrow::Cow::Borrowed(#identity),
                                    attribute: ::std::borrow::Cow::Borrowed(#field_names),
                                },
                            )?,
                        )?,
                    )*
                })
            }
        }
    };
    output.extend(auto_register(input, identity));
    output
}

fn expand_tuple(input: &DeriveInput, fields: &syn::FieldsUnnamed, identity: &str) -> TokenStream2 {
    let ident = &input.ident;
    let generics = reflect_generics(input);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let positions: Vec<syn::Index> = (0..fields.unnamed.len()).map(syn::Index::from).collect();
    let labels: Vec<String> = (0..fields.unnamed.len()).map(|i| i.to_string()).collect();

    // List-like internals carry no attribute names, so the snapshot is an
    // untagged sequence and the type identity is lost on the wire.
    quote! {
        impl #impl_generics remold::Typed for #ident #ty_generics #where_clause {
            fn type_identity() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#identity)
            }
        }

        impl #impl_generics remold::Reflect for #ident #ty_generics #where_clause {
            fn reflect_identity(&self) -> ::std::borrow::Cow<'static, str> {
                <Self as remold::Typed>::type_identity()
            }

            fn reflect(&self, marker: ::core::option::Option<&str>) -> remold::Value {
                remold::Value::Sequence(::std::vec![
                    #( remold::Reflect::reflect(&self.#positions, marker), )*
                ])
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }
        }

        impl #impl_generics remold::FromReflect for #ident #ty_generics #where_clause {
            fn from_reflect(
                value: &remold::Value,
            ) -> ::core::result::Result<Self, remold::ExpandError> {
                let items = value.as_sequence().ok_or(remold::ExpandError::ExpectedKind {
                    expected: "SEQUENCE",
                    found: value.type_tag(),
                })?;
                ::core::result::Result::Ok(Self(
                    #(
                        remold::FromReflect::from_reflect(items.get(#positions).ok_or(
                            remold::ExpandError::MissingAttribute {
                                identity: ::std::borrow::Cow::Borrowed(#identity),
                                attribute: ::std::borrow::Cow::Borrowed(#labels),
                            },
                        )?)?,
                    )*
                ))
            }
        }
    }
}

fn expand_unit(input: &DeriveInput, identity: &str) -> TokenStream2 {
    let ident = &input.ident;
    let generics = reflect_generics(input);
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let mut output = quote! {
        impl #impl_generics remold::Typed for #ident #ty_generics #where_clause {
            fn type_identity() -> ::std::borrow::Cow<'static, str> {
                ::std::borrow::Cow::Borrowed(#identity)
            }
        }

        impl #impl_generics remold::Reflect for #ident #ty_generics #where_clause {
            fn reflect_identity(&self) -> ::std::borrow::Cow<'static, str> {
                <Self as remold::Typed>::type_identity()
            }

            fn reflect(&self, marker: ::core::option::Option<&str>) -> remold::Value {
                let mut attrs = remold::AttrMap::with_capacity(1);
                if let ::core::option::Option::Some(key) = marker {
                    attrs.insert(
                        key.to_owned(),
                        remold::Value::String(
                            <Self as remold::Typed>::type_identity().into_owned(),
                        ),
                    );
                }
                remold::Value::Mapping(attrs)
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::core::any::Any> {
                self
            }
        }

        impl #impl_generics remold::FromReflect for #ident #ty_generics #where_clause {
            fn from_reflect(
                _value: &remold::Value,
            ) -> ::core::result::Result<Self, remold::ExpandError> {
                ::core::result::Result::Ok(Self)
            }
        }
    };
    output.extend(auto_register(input, identity));
    output
}

// -----------------------------------------------------------------------------
// auto_register

fn auto_register(input: &DeriveInput, identity: &str) -> TokenStream2 {
    if !cfg!(feature = "auto_register") || !input.generics.params.is_empty() {
        return TokenStream2::new();
    }
    let ident = &input.ident;
    quote! {
        remold::__macro_exports::inventory::submit! {
            remold::registry::RegisteredConstructor::of::<#ident>(#identity)
        }
    }
}

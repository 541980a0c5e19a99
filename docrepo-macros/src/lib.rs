//! Procedural macros for the docrepo project.
//!
//! `#[derive(Entity)]` implements `docrepo::entity::Entity` for a struct with
//! named fields. The identifier field is the one marked `#[entity(id)]`, or the
//! field named `id` when no field is marked. The collection name is the
//! struct's name as written.
//!
//! ```ignore
//! #[derive(Debug, Clone, Serialize, Deserialize, Entity)]
//! pub struct Order {
//!     #[serde(rename = "_id")]
//!     #[entity(id)]
//!     pub key: ObjectId,
//!     pub total: i64,
//! }
//!
//! assert_eq!(Order::collection_name(), "Order");
//! ```

#[allow(unused_extern_crates)]
extern crate self as docrepo_macros;

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Field, Fields, Ident, LitStr};

#[proc_macro_derive(Entity, attributes(entity))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    expand_entity(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_entity(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let collection = LitStr::new(&name.to_string(), name.span());
    let id_field = find_id_field(input)?;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::docrepo::entity::Entity for #name #ty_generics #where_clause {
            fn id(&self) -> ::docrepo::bson::oid::ObjectId {
                self.#id_field
            }

            fn set_id(&mut self, id: ::docrepo::bson::oid::ObjectId) {
                self.#id_field = id;
            }

            fn collection_name() -> &'static str {
                #collection
            }
        }
    })
}

fn find_id_field(input: &DeriveInput) -> syn::Result<&Ident> {
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input.ident,
                    "Entity can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input.ident,
                "Entity can only be derived for structs",
            ));
        }
    };

    let mut marked: Option<&Field> = None;

    for field in fields {
        if is_marked_id(field)? {
            if marked.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may be marked #[entity(id)]",
                ));
            }
            marked = Some(field);
        }
    }

    marked
        .or_else(|| {
            fields
                .iter()
                .find(|field| field.ident.as_ref().is_some_and(|ident| ident == "id"))
        })
        .and_then(|field| field.ident.as_ref())
        .ok_or_else(|| {
            syn::Error::new_spanned(
                &input.ident,
                "Entity requires a field named `id` or a field marked #[entity(id)]",
            )
        })
}

fn is_marked_id(field: &Field) -> syn::Result<bool> {
    let mut marked = false;

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("entity")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("id") {
                marked = true;
                Ok(())
            } else {
                Err(meta.error("unsupported entity attribute, expected `id`"))
            }
        })?;
    }

    Ok(marked)
}

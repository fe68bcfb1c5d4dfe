use crate::node::{MappedField, MappedInput};
use darling::ast::Fields;
use proc_macro2::TokenStream;
use quote::quote;

// record_spec
pub fn record_spec(input: &MappedInput, fields: &Fields<MappedField>) -> TokenStream {
    let name = input.type_name();
    let kind = input.kind.as_ref().map(|kind| quote!(.kind(#kind)));
    let member_of = input
        .member_of
        .as_ref()
        .map(|family| quote!(.member_of::<#family>()));
    let properties = fields.iter().filter(|f| !f.skip).filter_map(property);

    quote! {
        ::docmap::core::model::spec::RecordSpec::<Self>::new(#name)
            #kind
            #member_of
            #(#properties)*
            .into()
    }
}

fn property(field: &MappedField) -> Option<TokenStream> {
    let ident = field.ident.as_ref()?;
    let name = field.property_name(ident);
    let access = quote!(#name, |this| &this.#ident, |this, value| this.#ident = value);

    let tokens = if field.key {
        let options = if field.auto {
            quote!(auto_generated)
        } else {
            quote!(manual)
        };
        quote!(.key(#access, ::docmap::core::key::KeyOptions::#options()))
    } else if field.unindexed {
        quote!(.unindexed(#access))
    } else {
        quote!(.field(#access))
    };

    Some(tokens)
}

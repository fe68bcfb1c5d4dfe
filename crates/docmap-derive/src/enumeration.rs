use crate::node::{MappedInput, MappedVariant};
use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

// enum_spec
pub fn enum_spec(input: &MappedInput) -> TokenStream {
    let name = input.type_name();

    quote! {
        ::docmap::core::model::spec::EnumSpec::of::<Self>(#name).into()
    }
}

/// Ordinals follow the variants' discriminants, explicit or implicit.
pub fn ordinal_impl(ident: &Ident, variants: &[MappedVariant]) -> TokenStream {
    let to_arms = variants.iter().map(|variant| {
        let v = &variant.ident;
        quote!(Self::#v => Self::#v as i64,)
    });
    let from_arms = variants.iter().map(|variant| {
        let v = &variant.ident;
        quote!(ordinal if ordinal == Self::#v as i64 => Some(Self::#v),)
    });

    quote! {
        impl ::docmap::core::traits::EnumOrdinal for #ident {
            fn ordinal(&self) -> i64 {
                match self {
                    #(#to_arms)*
                }
            }

            fn from_ordinal(ordinal: i64) -> Option<Self> {
                match ordinal {
                    #(#from_arms)*
                    _ => None,
                }
            }
        }
    }
}

// family_spec
pub fn family_spec(input: &MappedInput, variants: &[MappedVariant]) -> TokenStream {
    let base = input.type_name();
    let head = match &input.family {
        Some(family) => quote!(::docmap::core::model::spec::FamilySpec::<Self>::named(#base, #family)),
        None => quote!(::docmap::core::model::spec::FamilySpec::<Self>::new(#base)),
    };

    let members = variants.iter().map(|variant| {
        let v = &variant.ident;
        let tag = variant.tag();

        quote! {
            .member(
                #tag,
                |base| match base {
                    Self::#v(member) => Some(member),
                    #[allow(unreachable_patterns)]
                    _ => None,
                },
                Self::#v,
            )
        }
    });

    quote! {
        #head
            #(#members)*
            .into()
    }
}

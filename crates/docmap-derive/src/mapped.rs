use crate::{enumeration, node::MappedInput, record};
use darling::{FromDeriveInput, ast::Data};
use proc_macro2::TokenStream;
use quote::quote;
use syn::DeriveInput;

// derive_mapped
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    let node = match MappedInput::from_derive_input(&input) {
        Ok(node) => node,
        Err(err) => return err.write_errors(),
    };
    if let Err(err) = node.validate() {
        return err.write_errors();
    }

    let ident = &node.ident;
    let (spec, ordinal) = match &node.data {
        Data::Struct(fields) => (record::record_spec(&node, fields), None),
        Data::Enum(variants) if node.is_enumeration() => (
            enumeration::enum_spec(&node),
            Some(enumeration::ordinal_impl(ident, variants)),
        ),
        Data::Enum(variants) => (enumeration::family_spec(&node, variants), None),
    };

    quote! {
        impl ::docmap::core::traits::Mapped for #ident {
            fn type_spec() -> ::docmap::core::model::spec::TypeSpec {
                #spec
            }
        }

        #ordinal
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(input: TokenStream) -> String {
        derive_mapped(input).to_string()
    }

    #[test]
    fn record_declares_key_and_properties_in_field_order() {
        let out = expand(quote! {
            #[mapped(kind = "customers")]
            struct Customer {
                #[mapped(key, auto)]
                id: i64,
                #[mapped(rename = "Name")]
                name: String,
                #[mapped(unindexed)]
                notes: String,
                #[mapped(skip)]
                cache: Vec<u8>,
            }
        });

        assert!(out.contains("RecordSpec :: < Self > :: new (\"Customer\")"));
        assert!(out.contains(". kind (\"customers\")"));
        assert!(out.contains("KeyOptions :: auto_generated ()"));
        assert!(out.contains(". unindexed (\"notes\""));
        assert!(!out.contains("cache"));

        let key = out.find("\"id\"").expect("key declared");
        let name = out.find("\"Name\"").expect("renamed field declared");
        assert!(key < name);
    }

    #[test]
    fn unit_enum_gets_ordinals() {
        let out = expand(quote! {
            enum Status { Pending, Shipped = 5 }
        });

        assert!(out.contains("EnumSpec :: of :: < Self > (\"Status\")"));
        assert!(out.contains("EnumOrdinal for Status"));
    }

    #[test]
    fn newtype_enum_is_a_family() {
        let out = expand(quote! {
            #[mapped(family = "figure")]
            enum Figure {
                #[mapped(tag = "circle")]
                Circle(Circle),
                Square(Square),
            }
        });

        assert!(out.contains("FamilySpec :: < Self > :: named (\"Figure\" , \"figure\")"));
        assert!(out.contains(". member (\"circle\""));
        assert!(out.contains(". member (\"Square\""));
        assert!(!out.contains("EnumOrdinal"));
    }

    #[test]
    fn invalid_attributes_become_compile_errors() {
        let cases = [
            quote! { struct Twice { #[mapped(key)] a: i64, #[mapped(key)] b: i64 } },
            quote! { struct Auto { #[mapped(auto)] id: i64 } },
            quote! { struct Skipped { #[mapped(skip, key)] id: i64 } },
            quote! { enum Mixed { A, B(i64) } },
            quote! { enum Empty {} },
            quote! { struct Generic<T> { value: T } },
            quote! { struct Tuple(i64); },
        ];

        for case in cases {
            let out = expand(case.clone());
            assert!(out.contains("compile_error"), "no error for `{case}`");
        }
    }
}

use proc_macro::TokenStream;

mod enumeration;
mod mapped;
mod node;
mod record;

/// Derive `Mapped` for a record, a fieldless enum, or a family enum whose
/// variants each wrap one member record.
///
/// ```ignore
/// #[derive(Clone, Debug, Default, Mapped)]
/// #[mapped(kind = "customers")]
/// struct Customer {
///     #[mapped(key, auto)]
///     id: i64,
///     #[mapped(rename = "Name")]
///     name: String,
///     #[mapped(unindexed)]
///     notes: String,
///     #[mapped(skip)]
///     cache: Vec<u8>,
/// }
/// ```
#[proc_macro_derive(Mapped, attributes(mapped))]
pub fn derive_mapped(input: TokenStream) -> TokenStream {
    mapped::derive_mapped(input.into()).into()
}

use proc_macro::TokenStream;

mod attrs;
mod classify;
mod entity;

/// Compiles a struct's schema and generates its `rowforge::Entity` impl.
///
/// Field attributes: `#[rowforge(id)]`, `#[rowforge(column = "name")]`,
/// `#[rowforge(one_to_one)]`, `#[rowforge(one_to_many)]`.
/// Struct attribute: `#[rowforge(child_of = Parent)]`.
#[proc_macro_derive(Entity, attributes(rowforge))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    entity::derive_entity(input.into()).into()
}

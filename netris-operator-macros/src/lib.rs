use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, punctuated::Punctuated, token::Comma, Data, DeriveInput, Field, Fields,
    Ident, Type,
};

#[proc_macro_derive(ResolvedSpec, attributes(parent_name, parent_generation))]
pub fn derive_resolved_spec(input: TokenStream) -> TokenStream {
    let parsed_input = parse_macro_input!(input as DeriveInput);
    let struct_ident = parsed_input.ident;
    let parsed_struct = match parsed_input.data {
        Data::Struct(s) => s,
        _ => panic!("This derive macro is only applicable to named structs!"),
    };
    let fields = match parsed_struct.fields {
        Fields::Named(fields) => fields.named,
        _ => panic!("This derive macro is only applicable to named structs!"),
    };
    let name_field = get_attributed_field(&fields, "parent_name");
    let generation_field = get_attributed_field(&fields, "parent_generation");
    let id_type = get_id_field_type(&fields);

    let output = quote! {
        impl crate::resources::meta::ResolvedSpec for #struct_ident {
            type Id = #id_type;

            fn parent_name(&self) -> &str {
                &self.#name_field
            }

            fn recorded_generation(&self) -> i64 {
                self.#generation_field
            }

            fn record_generation(&mut self, generation: i64) {
                self.#generation_field = generation;
            }

            fn imported(&self) -> bool {
                self.imported
            }

            fn set_imported(&mut self, imported: bool) {
                self.imported = imported;
            }

            fn reclaim(&self) -> bool {
                self.reclaim_policy
            }

            fn set_reclaim(&mut self, reclaim: bool) {
                self.reclaim_policy = reclaim;
            }

            fn remote_id(&self) -> &#id_type {
                &self.id
            }

            fn assign_remote_id(&mut self, id: #id_type) {
                self.id = id;
            }
        }
    };

    output.into()
}

fn get_attributed_field<'a>(fields: &'a Punctuated<Field, Comma>, attribute: &str) -> &'a Ident {
    fields
        .iter()
        .find(|f| f.attrs.iter().any(|a| a.meta.path().is_ident(attribute)))
        .unwrap_or_else(|| panic!("This struct is missing a '{attribute}' attribute!"))
        .ident
        .as_ref()
        .unwrap()
}

fn get_id_field_type(fields: &Punctuated<Field, Comma>) -> &Type {
    fields
        .iter()
        .find(|f| f.ident.as_ref().map(|ident| *ident == "id").unwrap_or(false))
        .map(|f| &f.ty)
        .expect("This struct is missing an 'id' field!")
}

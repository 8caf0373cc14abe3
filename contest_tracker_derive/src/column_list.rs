use crate::helper;
use proc_macro2::TokenStream;
use syn::DeriveInput;

pub fn impl_column_list(input: TokenStream) -> TokenStream {
    let ast: DeriveInput = match syn::parse2(input) {
        Ok(ast) => ast,
        Err(e) => return e.to_compile_error(),
    };

    let struct_name = &ast.ident;
    let mut columns: Vec<String> = Vec::new();
    for field in helper::extract_fields(&ast.data).named.iter() {
        let options = match helper::parse_column_options(&field.attrs) {
            Ok(options) => options,
            Err(e) => return e.to_compile_error(),
        };
        if options.skip {
            continue;
        }

        let name = options.rename.or_else(|| {
            field
                .ident
                .as_ref()
                .map(|ident| ident.to_string().trim_start_matches("r#").to_string())
        });
        if let Some(name) = name {
            columns.push(name);
        }
    }
    let column_list = columns.join(", ");

    quote::quote! {
        impl ColumnList for #struct_name {
            fn column_list() -> &'static str {
                #column_list
            }
        }
    }
}

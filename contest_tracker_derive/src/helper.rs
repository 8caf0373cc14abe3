use syn::{Attribute, Data, Fields, FieldsNamed, LitStr};

pub fn extract_fields(data: &Data) -> &FieldsNamed {
    match *data {
        Data::Struct(ref data) => match data.fields {
            Fields::Named(ref fields) => fields,
            _ => panic!("all fields must be named."),
        },
        _ => panic!("struct expected, but got other item."),
    }
}

/// Options given through `#[column(...)]` on a single field.
#[derive(Default)]
pub struct ColumnOptions {
    pub rename: Option<String>,
    pub skip: bool,
}

pub fn parse_column_options(attrs: &[Attribute]) -> syn::Result<ColumnOptions> {
    let mut options = ColumnOptions::default();

    for attr in attrs.iter().filter(|attr| attr.path().is_ident("column")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
                Ok(())
            } else if meta.path.is_ident("rename") {
                let name: LitStr = meta.value()?.parse()?;
                options.rename = Some(name.value());
                Ok(())
            } else {
                Err(meta.error("unsupported column option"))
            }
        })?;
    }

    Ok(options)
}

use heck::ToSnakeCase;
use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, Lit, parse_macro_input};

/// Options from `#[record(...)]` on a field.
#[derive(Default)]
struct FieldOptions {
    skip: bool,
    column: Option<String>,
    kind: Option<String>,
}

fn parse_field_options(field: &syn::Field) -> syn::Result<FieldOptions> {
    let mut options = FieldOptions::default();
    for attr in &field.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("column") {
                options.column = Some(parse_str(&meta)?);
            } else if meta.path.is_ident("kind") {
                options.kind = Some(parse_str(&meta)?);
            } else {
                return Err(meta.error("expected `skip`, `column` or `kind`"));
            }
            Ok(())
        })?;
    }
    Ok(options)
}

/// Parse `#[record(table = "...")]` on the struct.
fn parse_table(input: &DeriveInput) -> syn::Result<String> {
    let mut table = None;
    for attr in &input.attrs {
        if !attr.path().is_ident("record") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("table") {
                table = Some(parse_str(&meta)?);
                Ok(())
            } else {
                Err(meta.error("expected `table`"))
            }
        })?;
    }
    table.ok_or_else(|| {
        syn::Error::new_spanned(
            &input.ident,
            "Record requires #[record(table = \"...\")]",
        )
    })
}

fn parse_str(meta: &syn::meta::ParseNestedMeta) -> syn::Result<String> {
    meta.input.parse::<syn::Token![=]>()?;
    match meta.input.parse::<Lit>()? {
        Lit::Str(s) => Ok(s.value()),
        other => Err(syn::Error::new_spanned(other, "expected a string literal")),
    }
}

/// Map a Rust type to a column kind name.
fn rust_type_to_kind(ty: &syn::Type) -> &'static str {
    let type_str = quote!(#ty).to_string().replace(' ', "");

    // Option<T> is stored as T
    let inner = type_str
        .strip_prefix("Option<")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(&type_str);

    match inner {
        "String" | "&str" | "&'staticstr" => "text",
        "i8" | "i16" | "i32" | "i64" | "u8" | "u16" | "u32" | "u64" | "isize" | "usize" => {
            "integer"
        }
        "f32" | "f64" => "float",
        "bool" => "boolean",
        s if s.ends_with("Value") || s.starts_with("Vec<") || s.contains("Map<") => "json",
        _ => "any",
    }
}

fn kind_tokens(kind: &str, span: &syn::Field) -> syn::Result<proc_macro2::TokenStream> {
    let variant = match kind {
        "any" => quote!(Any),
        "text" => quote!(Text),
        "integer" | "bigint" => quote!(Integer),
        "float" => quote!(Float),
        "boolean" => quote!(Boolean),
        "json" => quote!(Json),
        other => {
            return Err(syn::Error::new_spanned(
                span,
                format!("unknown column kind {:?}", other),
            ));
        }
    };
    Ok(quote!(::record_access::ColumnKind::#variant))
}

/// Derive macro for the `Record` trait.
///
/// Generates `table_name()` and `schema()` from a struct with named fields.
/// Every field becomes an allowlisted column; the lifecycle columns `id`,
/// `created_at` and `updated_at` are always present.
///
/// Attributes:
/// - `#[record(table = "...")]` on the struct (required)
/// - `#[record(skip)]` to leave a field out of the schema
/// - `#[record(column = "...")]` to override the column name
/// - `#[record(kind = "json")]` to override the inferred column kind
///
/// Rows are decoded from snake_case column names, so the struct should not
/// rename its fields for serde.
///
/// ```text
/// #[derive(Record, Deserialize)]
/// #[record(table = "users")]
/// pub struct User {
///     pub id: i64,
///     pub email: String,
///     pub settings: serde_json::Value,
///     pub created_at: i64,
///     pub updated_at: i64,
/// }
/// ```
#[proc_macro_derive(Record, attributes(record))]
pub fn derive_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_record(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_record(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = &input.ident;
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Record only supports structs with named fields",
                ));
            }
        },
        _ => return Err(syn::Error::new_spanned(name, "Record only supports structs")),
    };

    let table_name = parse_table(input)?;

    let mut columns = Vec::new();
    for field in fields {
        let options = parse_field_options(field)?;
        if options.skip {
            continue;
        }

        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let column = options
            .column
            .unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_snake_case());
        let kind = options
            .kind
            .as_deref()
            .unwrap_or_else(|| rust_type_to_kind(&field.ty));
        let kind = kind_tokens(kind, field)?;

        columns.push(quote! { .column(#column, #kind) });
    }

    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    Ok(quote! {
        impl #impl_generics ::record_access::Record for #name #ty_generics #where_clause {
            fn table_name() -> &'static str {
                #table_name
            }

            fn schema() -> ::record_access::Schema {
                ::record_access::Schema::new(#table_name)
                    #(#columns)*
            }
        }
    })
}

//! Internal macros for the pbsat solver.
use proc_macro2::TokenStream;
use quote::quote;
use syn::{parse_quote, Expr, Field, Lit, LitStr, Meta, MetaNameValue};
use synstructure::decl_derive;

/// Extracts the text of a `(Default: ...)` marker from a field's doc comments.
fn documented_default(field: &Field, default_re: &regex::Regex) -> Option<LitStr> {
    for attr in field.attrs.iter() {
        let doc_str = match attr.parse_meta() {
            Ok(Meta::NameValue(MetaNameValue {
                ident,
                lit: Lit::Str(doc_str),
                ..
            })) => {
                if ident != "doc" {
                    continue;
                }
                doc_str
            }
            _ => continue,
        };
        if let Some(captures) = default_re.captures(&doc_str.value()) {
            let default_str = captures.get(1).map_or("", |m| m.as_str());
            return Some(LitStr::new(default_str, doc_str.span()));
        }
    }
    None
}

/// Derives `Default` from the documentation and lists the documented options.
///
/// Every field whose doc comment contains `(Default: <expr>)` is initialized with `<expr>`, all
/// other fields use `Default::default()`. Additionally an inherent `option_docs` function returns
/// pairs of field names and their documented default text.
fn derive_doc_default(s: synstructure::Structure) -> TokenStream {
    let variant = match s.variants() {
        [variant] => variant,
        _ => panic!("DocDefault requires a struct"),
    };

    let default_re = regex::Regex::new(r"\(Default: (.*)\)").unwrap();

    let mut option_names = vec![];
    let mut option_defaults = vec![];

    let body = variant.construct(|field, _| match documented_default(field, &default_re) {
        Some(default_str) => {
            if let Some(ident) = &field.ident {
                option_names.push(LitStr::new(&ident.to_string(), ident.span()));
                option_defaults.push(default_str.clone());
            }
            default_str
                .parse::<Expr>()
                .expect("error parsing default expression")
        }
        None => parse_quote!(Default::default()),
    });

    let default_impl = s.gen_impl(quote! {
        gen impl Default for @Self {
            fn default() -> Self {
                #body
            }
        }
    });

    let name = &s.ast().ident;
    let (impl_generics, ty_generics, where_clause) = s.ast().generics.split_for_impl();

    quote! {
        #default_impl

        impl #impl_generics #name #ty_generics #where_clause {
            /// Names of all documented options together with the text of their default value.
            pub fn option_docs() -> &'static [(&'static str, &'static str)] {
                &[ #( (#option_names, #option_defaults) ),* ]
            }
        }
    }
}

decl_derive!([DocDefault] => derive_doc_default);

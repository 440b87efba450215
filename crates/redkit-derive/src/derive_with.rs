use darling::{FromDeriveInput, FromField};
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{Attribute, Generics, Ident, PathArguments, Type};

#[derive(Debug, FromDeriveInput)]
#[darling(supports(struct_named))]
pub struct Input {
    ident: Ident,
    generics: Generics,
    data: darling::ast::Data<(), InputField>,
}

#[derive(Clone, Debug, FromField)]
#[darling(attributes(with), forward_attrs(doc))]
pub struct InputField {
    ident: Option<Ident>,
    ty: Type,
    attrs: Vec<Attribute>,

    /// 不生成 setter, 常用于由 trait 统一提供的字段
    #[darling(default)]
    skip: bool,

    /// setter 参数使用 `impl Into<T>`
    #[darling(default)]
    into: bool,
}

pub fn derive_with_impl(input: Input) -> Result<TokenStream2, darling::Error> {
    let name = input.ident;
    let generics = input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let data = input.data.take_struct().ok_or_else(|| darling::Error::custom("only named structs are supported"))?;

    let setter_methods = data.fields.iter().filter(|field| !field.skip).map(|field| {
        let field_ident = field.ident.clone().expect("darling guarantees named fields");
        let function_name = Ident::new(&format!("with_{}", field_ident), field_ident.span());
        let docs = &field.attrs;
        let (is_option_type, arg_ty) = extract_arg_type(&field.ty);

        let (param, value) = if field.into {
            (quote! { value: impl ::core::convert::Into<#arg_ty> }, quote! { value.into() })
        } else {
            (quote! { value: #arg_ty }, quote! { value })
        };

        let assign = if is_option_type {
            quote! { self.#field_ident = Some(#value); }
        } else {
            quote! { self.#field_ident = #value; }
        };

        quote! {
            #( #docs )*
            #[must_use]
            pub fn #function_name(mut self, #param) -> Self {
                #assign
                self
            }
        }
    });

    Ok(quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            #( #setter_methods )*
        }
    })
}

fn extract_arg_type(field_ty: &Type) -> (bool, TokenStream2) {
    if let Type::Path(type_path) = field_ty
        && let Some(seg) = type_path.path.segments.last()
        && seg.ident == "Option"
        && let PathArguments::AngleBracketed(ab) = &seg.arguments
        && let Some(syn::GenericArgument::Type(inner)) = ab.args.first()
    {
        (true, quote! { #inner })
    } else {
        (false, quote! { #field_ty })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand(src: &str) -> String {
        let input: syn::DeriveInput = syn::parse_str(src).unwrap();
        let input = Input::from_derive_input(&input).unwrap();
        derive_with_impl(input).unwrap().to_string()
    }

    #[test]
    fn option_field_is_wrapped_in_some() {
        let out = expand("struct A { name: Option<String> }");
        assert!(out.contains("pub fn with_name (mut self , value : String) -> Self"));
        assert!(out.contains("self . name = Some (value)"));
    }

    #[test]
    fn skipped_field_has_no_setter() {
        let out = expand("struct A { #[with(skip)] inner: u32, size: u32 }");
        assert!(!out.contains("with_inner"));
        assert!(out.contains("with_size"));
    }

    #[test]
    fn into_field_takes_impl_into() {
        let out = expand("struct A { #[with(into)] user: Option<String> }");
        assert!(out.contains("impl :: core :: convert :: Into < String >"));
        assert!(out.contains("Some (value . into ())"));
    }

    #[test]
    fn docs_are_forwarded() {
        let out = expand("struct A { /// 最大连接数\n max_size: u32 }");
        assert!(out.contains("doc"));
        assert!(out.contains("最大连接数"));
    }

    #[test]
    fn generics_are_kept() {
        let out = expand("struct A<T> where T: Clone { value: T }");
        assert!(out.contains("impl < T > A < T > where T : Clone"));
    }
}

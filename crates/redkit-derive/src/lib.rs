use darling::FromDeriveInput;
use derive_with::derive_with_impl;
use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

use crate::derive_with::Input;

mod derive_with;

/// 为具名结构体的每个字段生成 `with_<field>` 链式 setter
///
/// - `Option<T>` 字段的 setter 接收 `T` 并写入 `Some(value)`
/// - `#[with(skip)]` 跳过该字段
/// - `#[with(into)]` setter 参数改为 `impl Into<T>`
/// - 字段上的文档注释会复制到生成的 setter 上
#[proc_macro_derive(With, attributes(with))]
pub fn derive_with(tokens: TokenStream) -> TokenStream {
    let input = parse_macro_input!(tokens as DeriveInput);
    let input = match Input::from_derive_input(&input) {
        Ok(v) => v,
        Err(e) => return e.write_errors().into(),
    };

    match derive_with_impl(input) {
        Ok(expanded) => TokenStream::from(expanded),
        Err(e) => TokenStream::from(e.write_errors()),
    }
}

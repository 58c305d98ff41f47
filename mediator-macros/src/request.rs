use crate::utils::{MacroArgs, apply_derives};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, parse_macro_input};

#[derive(Clone, Copy)]
pub(crate) enum RequestKind {
    Command,
    Query,
}

/// #[command] / #[query] 宏实现
/// - 默认派生 Debug、Clone、serde::Serialize（请求需可序列化以生成缓存键）
/// - 实现 `::mediator_application::request::Request`，`NAME` 缺省为类型名
/// - 命令额外实现 `Command`，查询额外实现 `Query`
/// - 查询支持 `cacheable` 标志：生成空的 `CacheableQuery` 实现（键与 TTL 均走默认）
pub(crate) fn expand(kind: RequestKind, attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let input = parse_macro_input!(item as Item);

    match expand_request(kind, args, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_request(
    kind: RequestKind,
    args: MacroArgs,
    mut input: Item,
) -> syn::Result<proc_macro2::TokenStream> {
    let allowed: &[&str] = match kind {
        RequestKind::Command => &["response", "name"],
        RequestKind::Query => &["response", "name", "cacheable"],
    };
    args.ensure_known(allowed)?;

    let (ident, generics, attrs) = match &mut input {
        Item::Struct(s) => (s.ident.clone(), s.generics.clone(), &mut s.attrs),
        Item::Enum(e) => (e.ident.clone(), e.generics.clone(), &mut e.attrs),
        other => {
            return Err(syn::Error::new(
                other.span(),
                "#[command]/#[query] only on struct or enum",
            ));
        }
    };

    let response = args.ty("response")?.unwrap_or_else(|| syn::parse_quote! { () });
    let name = args
        .str("name")?
        .map(|lit| lit.value())
        .unwrap_or_else(|| ident.to_string());
    let cacheable = args.flag("cacheable")?;

    apply_derives(
        attrs,
        vec![
            syn::parse_quote!(Debug),
            syn::parse_quote!(Clone),
            syn::parse_quote!(serde::Serialize),
        ],
    );

    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let marker = match kind {
        RequestKind::Command => quote! {
            impl #impl_generics ::mediator_application::command::Command for #ident #ty_generics #where_clause {}
        },
        RequestKind::Query => quote! {
            impl #impl_generics ::mediator_application::query::Query for #ident #ty_generics #where_clause {}
        },
    };

    let cacheable_impl = cacheable.then(|| {
        quote! {
            impl #impl_generics ::mediator_application::query::CacheableQuery for #ident #ty_generics #where_clause {}
        }
    });

    Ok(quote! {
        #input

        impl #impl_generics ::mediator_application::request::Request for #ident #ty_generics #where_clause {
            const NAME: &'static str = #name;
            type Response = #response;
        }

        #marker

        #cacheable_impl
    })
}

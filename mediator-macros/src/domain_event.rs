use crate::utils::{MacroArgs, apply_derives};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, ItemEnum, LitInt, LitStr, parse_macro_input};

/// #[domain_event] 宏实现
/// - 仅支持枚举；变体可以是具名字段、元组或单元形式
/// - 生成 `::mediator_domain::domain_event::DomainEvent` 实现（event_type/event_version）
/// - 支持：`#[domain_event(version = N)]`（枚举级默认版本，缺省为 1）
/// - 变体可覆写：`#[event(event_type = "...", event_version = N)]`，缺省类型为 `Enum.Variant`
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let input = parse_macro_input!(item as Item);

    match expand_enum(args, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

struct VariantMeta {
    event_type: LitStr,
    event_version: LitInt,
}

fn expand_enum(args: MacroArgs, input: Item) -> syn::Result<proc_macro2::TokenStream> {
    args.ensure_known(&["version"])?;

    let mut enum_item: ItemEnum = match input {
        Item::Enum(e) => e,
        other => {
            return Err(syn::Error::new(
                other.span(),
                "#[domain_event] can only be used on enum types",
            ));
        }
    };

    if enum_item.variants.is_empty() {
        return Err(syn::Error::new(
            enum_item.ident.span(),
            "#[domain_event] requires at least one variant",
        ));
    }

    let default_version = args
        .int("version")?
        .unwrap_or_else(|| syn::parse_quote! { 1 });

    // 合并/追加默认派生：Debug, Clone, PartialEq, Serialize, Deserialize
    let required: Vec<syn::Path> = vec![
        syn::parse_quote!(Debug),
        syn::parse_quote!(Clone),
        syn::parse_quote!(PartialEq),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    apply_derives(&mut enum_item.attrs, required);

    let enum_name = enum_item.ident.to_string();
    let mut metas: Vec<(syn::Ident, VariantMeta)> = Vec::new();

    for v in &mut enum_item.variants {
        let mut variant_args: Option<MacroArgs> = None;
        let mut retained = Vec::new();

        for attr in v.attrs.drain(..) {
            if !attr.path().is_ident("event") {
                retained.push(attr);
                continue;
            }
            if variant_args.is_some() {
                return Err(syn::Error::new(
                    attr.span(),
                    "duplicate #[event(...)] on this variant",
                ));
            }
            let parsed: MacroArgs = attr.parse_args()?;
            parsed.ensure_known(&["event_type", "event_version"])?;
            variant_args = Some(parsed);
        }
        v.attrs = retained;

        let variant_args = variant_args.unwrap_or_else(MacroArgs::empty);
        let event_type = variant_args.str("event_type")?.unwrap_or_else(|| {
            LitStr::new(&format!("{}.{}", enum_name, v.ident), v.ident.span())
        });
        let event_version = variant_args
            .int("event_version")?
            .unwrap_or_else(|| default_version.clone());

        metas.push((
            v.ident.clone(),
            VariantMeta {
                event_type,
                event_version,
            },
        ));
    }

    let type_arms = metas.iter().map(|(ident, meta)| {
        let lit = &meta.event_type;
        quote! { Self::#ident { .. } => #lit }
    });
    let version_arms = metas.iter().map(|(ident, meta)| {
        let lit = &meta.event_version;
        quote! { Self::#ident { .. } => #lit }
    });

    let ident = &enum_item.ident;
    let (impl_generics, ty_generics, where_clause) = enum_item.generics.split_for_impl();

    Ok(quote! {
        #enum_item

        impl #impl_generics ::mediator_domain::domain_event::DomainEvent for #ident #ty_generics #where_clause {
            fn event_type(&self) -> &str { match self { #( #type_arms, )* } }
            fn event_version(&self) -> usize { match self { #( #version_arms, )* } }
        }
    })
}

use crate::utils::{MacroArgs, apply_derives, ensure_leading_field, ensure_trailing_field};
use proc_macro::TokenStream;
use quote::quote;
use syn::spanned::Spanned;
use syn::{Item, ItemStruct, parse_macro_input};

/// #[entity] 宏实现
/// - 若缺失则追加字段：`id: IdType`（置于最前）、`events: EventBuffer<Event>`（置于最后，不参与序列化）
/// - 自动实现 `::mediator_domain::entity::Entity`（TYPE/id/events/events_mut）
/// - 支持参数：`#[entity(event = EventType, id = IdType, name = "...", debug = true|false)]`；
///   - `event` 必填
///   - `id` 默认 `String`
///   - `name` 默认结构体名，作为 `Entity::TYPE`
///   - `debug` 默认 `true`（派生 Debug）。当为 `false` 时不派生 Debug，便于用户自定义实现。
pub(crate) fn expand(attr: TokenStream, item: TokenStream) -> TokenStream {
    let args = parse_macro_input!(attr as MacroArgs);
    let input = parse_macro_input!(item as Item);

    match expand_struct(args, input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand_struct(args: MacroArgs, input: Item) -> syn::Result<proc_macro2::TokenStream> {
    args.ensure_known(&["event", "id", "name", "debug"])?;

    let mut st: ItemStruct = match input {
        Item::Struct(s) => s,
        other => return Err(syn::Error::new(other.span(), "#[entity] only on struct")),
    };

    let event_ty = args.ty("event")?.ok_or_else(|| {
        syn::Error::new(
            st.ident.span(),
            "#[entity] requires `event = EventType`",
        )
    })?;
    let id_ty = args
        .ty("id")?
        .unwrap_or_else(|| syn::parse_quote! { String });
    let type_name = args
        .str("name")?
        .map(|lit| lit.value())
        .unwrap_or_else(|| st.ident.to_string());
    let derive_debug = args.bool("debug")?.unwrap_or(true);

    // 仅支持具名字段结构体
    let fields_named = match &mut st.fields {
        syn::Fields::Named(f) => f,
        _ => {
            return Err(syn::Error::new(
                st.span(),
                "only supports named-field struct",
            ));
        }
    };

    ensure_leading_field(fields_named, "id", &id_ty);
    ensure_trailing_field(
        fields_named,
        syn::parse_quote! {
            #[serde(skip)]
            events: ::mediator_domain::domain_event::EventBuffer<#event_ty>
        },
    );

    // 合并/规范 derive：默认添加 Debug（可通过 debug=false 关闭）、Clone、Default、Serialize、Deserialize
    let mut required: Vec<syn::Path> = vec![
        syn::parse_quote!(Clone),
        syn::parse_quote!(Default),
        syn::parse_quote!(serde::Serialize),
        syn::parse_quote!(serde::Deserialize),
    ];
    if derive_debug {
        required.insert(0, syn::parse_quote!(Debug));
    }
    apply_derives(&mut st.attrs, required);

    let ident = &st.ident;
    let (impl_generics, ty_generics, where_clause) = st.generics.split_for_impl();

    Ok(quote! {
        #st

        impl #impl_generics ::mediator_domain::entity::Entity for #ident #ty_generics #where_clause {
            const TYPE: &'static str = #type_name;
            type Id = #id_ty;
            type Event = #event_ty;

            fn id(&self) -> &Self::Id { &self.id }

            fn events(&self) -> &::mediator_domain::domain_event::EventBuffer<Self::Event> {
                &self.events
            }

            fn events_mut(&mut self) -> &mut ::mediator_domain::domain_event::EventBuffer<Self::Event> {
                &mut self.events
            }
        }
    })
}

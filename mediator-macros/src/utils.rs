use quote::ToTokens;
use syn::parse::{Parse, ParseStream};
use syn::{
    Attribute, Field, FieldsNamed, Ident, LitBool, LitInt, LitStr, Result, Token, Type,
    punctuated::Punctuated,
};

// 提取非 derive 属性与已有 derive 列表
pub(crate) fn split_derives(attrs: &[Attribute]) -> (Vec<Attribute>, Vec<syn::Path>) {
    let mut retained = Vec::new();
    let mut existing = Vec::new();
    for attr in attrs.iter() {
        if attr.path().is_ident("derive") {
            if let Ok(list) = attr.parse_args_with(Punctuated::<syn::Path, Token![,]>::parse_terminated)
            {
                existing.extend(list);
            }
        } else {
            retained.push(attr.clone());
        }
    }
    (retained, existing)
}

// 合并默认与已有 derive（去重，优先保留 required）
pub(crate) fn merge_derives(existing: Vec<syn::Path>, required: Vec<syn::Path>) -> Attribute {
    let mut seen = std::collections::HashSet::<String>::new();
    let mut final_list: Vec<syn::Path> = Vec::new();
    for p in required.into_iter().chain(existing) {
        if seen.insert(derive_key(&p)) {
            final_list.push(p);
        }
    }
    syn::parse_quote!(#[derive(#(#final_list),*)])
}

// 归一化 derive 的 key，避免 Serialize/serde::Serialize 重复
pub(crate) fn derive_key(p: &syn::Path) -> String {
    if let Some(last) = p.segments.last() {
        let last_ident = last.ident.to_string();
        match last_ident.as_str() {
            "Serialize" | "Deserialize" => format!("serde::{}", last_ident),
            _ => last_ident,
        }
    } else {
        p.to_token_stream().to_string()
    }
}

// 直接在 attrs 上应用默认派生合并
pub(crate) fn apply_derives(attrs: &mut Vec<Attribute>, required: Vec<syn::Path>) {
    let (retained, existing) = split_derives(attrs);
    let merged = merge_derives(existing, required);
    *attrs = std::iter::once(merged).chain(retained).collect();
}

pub(crate) fn has_field_named(fields: &FieldsNamed, name: &str) -> bool {
    fields
        .named
        .iter()
        .any(|f| f.ident.as_ref().is_some_and(|i| i == name))
}

/// 确保字段位于最前：已存在则移动到最前，否则新增
pub(crate) fn ensure_leading_field(fields: &mut FieldsNamed, name: &str, ty: &Type) {
    let old_named = std::mem::take(&mut fields.named);
    let mut new_named: Punctuated<Field, Token![,]> = Punctuated::new();

    let existing = old_named
        .iter()
        .find(|f| f.ident.as_ref().is_some_and(|i| i == name))
        .cloned();
    match existing {
        Some(f) => new_named.push(f),
        None => {
            let ident = Ident::new(name, proc_macro2::Span::call_site());
            new_named.push(syn::parse_quote! { #ident: #ty });
        }
    }

    for f in old_named {
        if !f.ident.as_ref().is_some_and(|i| i == name) {
            new_named.push(f);
        }
    }

    fields.named = new_named;
}

/// 若缺失则在末尾追加字段
pub(crate) fn ensure_trailing_field(fields: &mut FieldsNamed, field: Field) {
    let name = field.ident.as_ref().map(|i| i.to_string()).unwrap_or_default();
    if !has_field_named(fields, &name) {
        fields.named.push(field);
    }
}

// -------- attribute parsing --------

pub(crate) enum ArgValue {
    Str(LitStr),
    Int(LitInt),
    Bool(LitBool),
    Type(Box<Type>),
    Flag,
}

/// 宏参数：`key = value` 或单独的标志位，逗号分隔
pub(crate) struct MacroArgs {
    args: Vec<(Ident, ArgValue)>,
}

impl Parse for MacroArgs {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut args: Vec<(Ident, ArgValue)> = Vec::new();

        while !input.is_empty() {
            let key: Ident = input.parse()?;
            let value = if input.peek(Token![=]) {
                input.parse::<Token![=]>()?;
                if input.peek(LitStr) {
                    ArgValue::Str(input.parse()?)
                } else if input.peek(LitInt) {
                    ArgValue::Int(input.parse()?)
                } else if input.peek(LitBool) {
                    ArgValue::Bool(input.parse()?)
                } else {
                    ArgValue::Type(Box::new(input.parse()?))
                }
            } else {
                ArgValue::Flag
            };

            if args.iter().any(|(k, _)| *k == key) {
                return Err(syn::Error::new(
                    key.span(),
                    format!("duplicate key '{key}' in attribute"),
                ));
            }
            args.push((key, value));

            if input.is_empty() {
                break;
            }
            input.parse::<Token![,]>()?;
        }

        Ok(Self { args })
    }
}

impl MacroArgs {
    pub(crate) fn empty() -> Self {
        Self { args: Vec::new() }
    }

    /// 拒绝未知参数
    pub(crate) fn ensure_known(&self, allowed: &[&str]) -> Result<()> {
        for (key, _) in &self.args {
            if !allowed.iter().any(|a| key == a) {
                return Err(syn::Error::new(
                    key.span(),
                    format!("unknown key '{key}'; expected one of: {}", allowed.join(" | ")),
                ));
            }
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Option<(&Ident, &ArgValue)> {
        self.args.iter().find(|(k, _)| k == key).map(|(k, v)| (k, v))
    }

    pub(crate) fn ty(&self, key: &str) -> Result<Option<Type>> {
        match self.get(key) {
            None => Ok(None),
            Some((_, ArgValue::Type(ty))) => Ok(Some((**ty).clone())),
            Some((k, _)) => Err(syn::Error::new(
                k.span(),
                format!("expected a type for '{key}'"),
            )),
        }
    }

    pub(crate) fn str(&self, key: &str) -> Result<Option<LitStr>> {
        match self.get(key) {
            None => Ok(None),
            Some((_, ArgValue::Str(lit))) => Ok(Some(lit.clone())),
            Some((k, _)) => Err(syn::Error::new(
                k.span(),
                format!("expected string literal for '{key}'"),
            )),
        }
    }

    pub(crate) fn int(&self, key: &str) -> Result<Option<LitInt>> {
        match self.get(key) {
            None => Ok(None),
            Some((_, ArgValue::Int(lit))) => Ok(Some(lit.clone())),
            Some((k, _)) => Err(syn::Error::new(
                k.span(),
                format!("expected integer literal for '{key}'"),
            )),
        }
    }

    pub(crate) fn bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key) {
            None => Ok(None),
            Some((_, ArgValue::Bool(b))) => Ok(Some(b.value())),
            Some((k, _)) => Err(syn::Error::new(
                k.span(),
                format!("expected boolean literal for '{key}'"),
            )),
        }
    }

    pub(crate) fn flag(&self, key: &str) -> Result<bool> {
        match self.get(key) {
            None => Ok(false),
            Some((_, ArgValue::Flag)) => Ok(true),
            Some((_, ArgValue::Bool(b))) => Ok(b.value()),
            Some((k, _)) => Err(syn::Error::new(
                k.span(),
                format!("expected flag or boolean literal for '{key}'"),
            )),
        }
    }
}

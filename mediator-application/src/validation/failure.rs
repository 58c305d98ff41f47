use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 单条校验失败：属性路径 + 消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    pub property: String,
    pub message: String,
}

impl ValidationFailure {
    pub fn new(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            message: message.into(),
        }
    }
}

/// 按属性分组的校验错误，序列化为 `{"Name": ["..."], ...}`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    pub fn from_failures(failures: impl IntoIterator<Item = ValidationFailure>) -> Self {
        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for failure in failures {
            grouped
                .entry(failure.property)
                .or_default()
                .push(failure.message);
        }
        Self(grouped)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 出错的属性个数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 失败消息总数
    pub fn failure_count(&self) -> usize {
        self.0.values().map(Vec::len).sum()
    }

    pub fn get(&self, property: &str) -> Option<&[String]> {
        self.0.get(property).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn into_inner(self) -> BTreeMap<String, Vec<String>> {
        self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (property, messages)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{property}: {}", messages.join(" "))?;
        }
        Ok(())
    }
}

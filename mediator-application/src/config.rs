//! 管道配置
//!
//! 默认值：慢请求阈值 500ms，查询结果缓存 30 分钟，校验结果缓存 5 分钟。
//! 可经 serde 从外部配置加载，时长字段以毫秒/秒表示。
use bon::Builder;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// 校验行为的选择（同一槽位，二者互斥）
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStrategy {
    /// 每次都执行全部校验器
    #[default]
    Direct,
    /// 复用昂贵校验器在 TTL 内的结果
    Cached,
}

#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 超过该耗时的请求记录告警
    #[builder(default = Duration::from_millis(500))]
    #[serde(rename = "slow_request_threshold_ms", with = "duration_millis")]
    pub slow_request_threshold: Duration,

    /// 查询结果缓存的默认 TTL
    #[builder(default = Duration::from_secs(30 * 60))]
    #[serde(rename = "default_cache_ttl_secs", with = "duration_secs")]
    pub default_cache_ttl: Duration,

    /// 校验结果缓存的 TTL
    #[builder(default = Duration::from_secs(5 * 60))]
    #[serde(rename = "validation_cache_ttl_secs", with = "duration_secs")]
    pub validation_cache_ttl: Duration,

    #[builder(default)]
    pub validation: ValidationStrategy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(value.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

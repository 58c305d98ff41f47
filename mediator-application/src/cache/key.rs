//! 缓存键派生
//!
//! 请求先转为 JSON 值，再按字典序排列对象键写出规范字节（首字节为编码版本），
//! 最后取 SHA-256 十六进制摘要。字段声明顺序不同但内容相同的请求得到相同的键，
//! 键前缀为请求类型名，避免不同类型间碰撞。
use super::{CacheError, CacheResult};
use crate::query::CacheableQuery;
use crate::request::Request;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// 规范编码版本；编码规则变化时递增，使旧键自然失效
const CANONICAL_VERSION: u8 = 1;

pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> CacheResult<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    let mut out = vec![CANONICAL_VERSION];
    write_canonical(&value, &mut out)?;
    Ok(out)
}

fn write_canonical(value: &Value, out: &mut Vec<u8>) -> CacheResult<()> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push(b'{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                let item = map.get(key).ok_or_else(|| {
                    CacheError::Backend(format!("canonical encoding lost key '{key}'"))
                })?;
                write_canonical(item, out)?;
            }
            out.push(b'}');
        }
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out)?;
            }
            out.push(b']');
        }
        scalar => serde_json::to_writer(&mut *out, scalar)?,
    }
    Ok(())
}

/// 请求内容哈希（十六进制 SHA-256）
pub fn content_hash<T: Serialize + ?Sized>(value: &T) -> CacheResult<String> {
    let bytes = canonical_bytes(value)?;
    Ok(hex::encode(Sha256::digest(&bytes)))
}

/// `{NAME}_{hash}`
pub fn derive_cache_key<R: Request>(request: &R) -> CacheResult<String> {
    Ok(format!("{}_{}", R::NAME, content_hash(request)?))
}

/// 自定义键优先，否则派生
pub fn cache_key_for<Q: CacheableQuery>(query: &Q) -> CacheResult<String> {
    match query.cache_key() {
        Some(key) => Ok(key),
        None => derive_cache_key(query),
    }
}

/// 校验结果缓存键的命名空间
pub const VALIDATION_KEY_PREFIX: &str = "validation";

/// `validation:{request_key}:{validator}`
pub fn validation_cache_key(request_key: &str, validator: &str) -> String {
    format!("{VALIDATION_KEY_PREFIX}:{request_key}:{validator}")
}

/// 匹配某个请求全部校验结果的通配模式；请求键中的通配符会被转义
pub fn validation_cache_pattern(request_key: &str) -> String {
    validation_cache_key(&glob::Pattern::escape(request_key), "*")
}

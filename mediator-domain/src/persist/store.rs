//! 实体存储（EntityStore）协议
//!
//! 存储引擎本身不在本库范围内，这里只定义工作单元所需的最小接口：
//! 按类型与键读取记录、分配序列号，以及开启一个可提交/回滚的事务。
//!
use crate::error::DomainResult;
use async_trait::async_trait;
use serde_json::Value;

/// 单条实体变更
#[derive(Debug, Clone, PartialEq)]
pub struct EntityChange {
    pub entity_type: &'static str,
    pub key: String,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChangeKind {
    /// 新增：键已存在时失败
    Insert(Value),
    /// 更新：键不存在时失败
    Update(Value),
    /// 删除：键不存在时失败
    Delete,
}

/// 实体存储：读取已提交数据并开启事务
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// 读取已提交的实体记录
    async fn load(&self, entity_type: &str, key: &str) -> DomainResult<Option<Value>>;

    /// 为实体类型分配下一个自增序号（从 1 开始）
    async fn next_sequence(&self, entity_type: &str) -> DomainResult<u64>;

    /// 开启事务
    async fn begin(&self) -> DomainResult<Box<dyn StoreTransaction>>;
}

/// 存储事务：暂存变更，提交时原子生效
#[async_trait]
pub trait StoreTransaction: Send + Sync {
    /// 暂存一批变更，返回受影响的记录数
    async fn apply(&mut self, changes: Vec<EntityChange>) -> DomainResult<usize>;

    async fn commit(self: Box<Self>) -> DomainResult<()>;

    async fn rollback(self: Box<Self>) -> DomainResult<()>;
}

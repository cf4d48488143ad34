//! 共享组键
//!
//! 同一共享组内的导出键解析到同一个实例槽。

use crate::export_key::ExportKey;
use infrastructure_common::{IocError, IocResult, SharePolicy, TypeInfo};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 共享组键
///
/// 相等性和哈希只由共享策略和成员列表决定，不包含声明类型。
#[derive(Debug, Clone)]
pub struct SharedGroupKey {
    declaring_type: TypeInfo,
    policy: SharePolicy,
    members: Vec<ExportKey>,
}

impl SharedGroupKey {
    /// 创建共享组键
    ///
    /// 所有成员必须具有相同的声明类型和共享策略；重复成员只保留一个。
    pub fn new(
        declaring_type: TypeInfo,
        policy: SharePolicy,
        members: impl IntoIterator<Item = ExportKey>,
    ) -> IocResult<Self> {
        let mut unique: Vec<ExportKey> = Vec::new();
        for member in members {
            if member.declaring_type() != declaring_type {
                return Err(IocError::initialization(format!(
                    "共享组成员 {member} 的声明类型与共享组 {declaring_type} 不一致"
                )));
            }
            if member.policy() != policy {
                return Err(IocError::initialization(format!(
                    "共享组成员 {member} 的共享策略与共享组策略 {policy} 不一致"
                )));
            }
            if !unique.contains(&member) {
                unique.push(member);
            }
        }

        Ok(Self {
            declaring_type,
            policy,
            members: unique,
        })
    }

    /// 成员共同的声明类型
    pub fn declaring_type(&self) -> TypeInfo {
        self.declaring_type
    }

    /// 共享策略
    pub fn policy(&self) -> SharePolicy {
        self.policy
    }

    /// 成员导出键（去重，保持声明顺序）
    pub fn members(&self) -> &[ExportKey] {
        &self.members
    }

    /// 是否包含导出键
    pub fn contains(&self, key: &ExportKey) -> bool {
        self.members.contains(key)
    }

    /// 身份哈希
    pub fn identity_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for SharedGroupKey {
    fn eq(&self, other: &Self) -> bool {
        self.policy == other.policy && self.members == other.members
    }
}

impl Eq for SharedGroupKey {}

impl Hash for SharedGroupKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.policy.hash(state);
        self.members.hash(state);
    }
}

impl fmt::Display for SharedGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} 共享组 [{}, {} 个成员]",
            self.declaring_type.short_name(),
            self.policy,
            self.members.len()
        )
    }
}

//! 声明式规则校验器与常用谓词
use super::{ValidationFailure, Validator};
use crate::{context::AppContext, error::AppError, request::Request};
use async_trait::async_trait;

type Check<R> = Box<dyn Fn(&R) -> bool + Send + Sync>;

struct Rule<R> {
    property: String,
    check: Check<R>,
    message: String,
}

/// 由 `(属性, 谓词, 消息)` 规则组成的廉价校验器；谓词返回 `true` 表示通过
pub struct RuleValidator<R> {
    name: String,
    rules: Vec<Rule<R>>,
}

impl<R> RuleValidator<R> {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rules: Vec::new(),
        }
    }

    pub fn rule(
        mut self,
        property: impl Into<String>,
        check: impl Fn(&R) -> bool + Send + Sync + 'static,
        message: impl Into<String>,
    ) -> Self {
        self.rules.push(Rule {
            property: property.into(),
            check: Box::new(check),
            message: message.into(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[async_trait]
impl<R> Validator<R> for RuleValidator<R>
where
    R: Request,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn validate(
        &self,
        _ctx: &AppContext,
        request: &R,
    ) -> Result<Vec<ValidationFailure>, AppError> {
        Ok(self
            .rules
            .iter()
            .filter(|rule| !(rule.check)(request))
            .map(|rule| ValidationFailure::new(rule.property.clone(), rule.message.clone()))
            .collect())
    }
}

/// 非空且不全为空白
pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// 宽松的邮箱格式检查：`local@domain.tld`
pub fn email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain
            .split_once('.')
            .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty() && !tail.ends_with('.'))
}

pub fn max_len(value: &str, max: usize) -> bool {
    value.chars().count() <= max
}

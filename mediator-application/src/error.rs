use crate::cache::CacheError;
use crate::validation::ValidationErrors;
use mediator_domain::error::DomainError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("validation: {0}")]
    Validation(ValidationErrors),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("cache: {0}")]
    Cache(#[from] CacheError),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("infra: {0}")]
    Infra(String),

    #[error("handler not found: {0}")]
    HandlerNotFound(&'static str),

    #[error("handler already registered: request={request}")]
    AlreadyRegistered { request: &'static str },

    #[error("type mismatch: expected={expected}, found={found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// 面向外层（如 HTTP 映射）的错误分类
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Unauthorized,
    Cancelled,
    Unexpected,
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Validation(_) => ErrorKind::Validation,
            AppError::NotFound(_) => ErrorKind::NotFound,
            AppError::Conflict(_) => ErrorKind::Conflict,
            AppError::Unauthorized(_) => ErrorKind::Unauthorized,
            AppError::Cancelled => ErrorKind::Cancelled,
            AppError::Domain(err) => match err {
                DomainError::NotFound { .. } => ErrorKind::NotFound,
                DomainError::Conflict { .. } => ErrorKind::Conflict,
                DomainError::Unauthorized { .. } => ErrorKind::Unauthorized,
                DomainError::InvalidValue { .. } => ErrorKind::Validation,
                _ => ErrorKind::Unexpected,
            },
            _ => ErrorKind::Unexpected,
        }
    }

    /// 可恢复错误由调用方处理，不按系统故障上报
    pub fn is_recoverable(&self) -> bool {
        self.kind() != ErrorKind::Unexpected
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            AppError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationFailure;

    #[test]
    fn classifies_domain_errors() {
        let err = AppError::from(DomainError::not_found("user", 7));
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert!(err.is_recoverable());

        let err = AppError::from(DomainError::conflict("duplicate"));
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err = AppError::from(DomainError::store("disk full"));
        assert_eq!(err.kind(), ErrorKind::Unexpected);
        assert!(!err.is_recoverable());
    }

    #[test]
    fn validation_exposes_grouped_failures() {
        let err = AppError::Validation(ValidationErrors::from_failures([
            ValidationFailure::new("Name", "Name is required."),
        ]));
        assert_eq!(err.kind(), ErrorKind::Validation);
        let errors = err.validation_errors().unwrap();
        assert_eq!(errors.get("Name"), Some(&["Name is required.".to_string()][..]));
        assert!(AppError::Cancelled.validation_errors().is_none());
    }
}

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Underlying failure reported by the remote store or a converter, kept for
/// diagnostics only.
pub type Cause = Arc<dyn Error + Send + Sync + 'static>;

/// The operation category an error is classified under.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorCategory {
    FetchOne,
    FetchMany,
    Add,
    Set,
    MergeUpdate,
    Delete,
    ExistsCheck,
    Count,
    Decode,
}

/// Closed error taxonomy: one variant per operation category, plus `Decode`
/// for typed-path conversion failures and `Unknown` for success shapes that
/// carry no usable payload and no classifiable cause.
///
/// Every variant except `Unknown` distinguishes "declared failure" (cause
/// present) from "malformed success" (cause absent). Both are terminal to the
/// caller; the distinction exists for observability.
#[derive(Clone, Debug)]
pub enum OperationError {
    FetchOne { cause: Option<Cause> },
    FetchMany { cause: Option<Cause> },
    Add { cause: Option<Cause> },
    Set { cause: Option<Cause> },
    MergeUpdate { cause: Option<Cause> },
    Delete { cause: Option<Cause> },
    ExistsCheck { cause: Option<Cause> },
    Count { cause: Option<Cause> },
    Decode { cause: Option<Cause> },
    Unknown,
}

/// Maps an operation category and an optional underlying cause to the
/// matching `OperationError` variant. Pure and total; never substitutes
/// `Unknown` for a known category.
pub fn classify(category: ErrorCategory, cause: Option<Cause>) -> OperationError {
    match category {
        ErrorCategory::FetchOne => OperationError::FetchOne { cause },
        ErrorCategory::FetchMany => OperationError::FetchMany { cause },
        ErrorCategory::Add => OperationError::Add { cause },
        ErrorCategory::Set => OperationError::Set { cause },
        ErrorCategory::MergeUpdate => OperationError::MergeUpdate { cause },
        ErrorCategory::Delete => OperationError::Delete { cause },
        ErrorCategory::ExistsCheck => OperationError::ExistsCheck { cause },
        ErrorCategory::Count => OperationError::Count { cause },
        ErrorCategory::Decode => OperationError::Decode { cause },
    }
}

impl OperationError {
    /// Stable machine-readable code for the variant.
    pub fn code_str(&self) -> &'static str {
        match self {
            OperationError::FetchOne { .. } => "docstore/fetch-one",
            OperationError::FetchMany { .. } => "docstore/fetch-many",
            OperationError::Add { .. } => "docstore/add",
            OperationError::Set { .. } => "docstore/set",
            OperationError::MergeUpdate { .. } => "docstore/merge-update",
            OperationError::Delete { .. } => "docstore/delete",
            OperationError::ExistsCheck { .. } => "docstore/exists-check",
            OperationError::Count { .. } => "docstore/count",
            OperationError::Decode { .. } => "docstore/decode",
            OperationError::Unknown => "docstore/unknown",
        }
    }

    /// The underlying cause reported by the store or converter, if any.
    pub fn cause(&self) -> Option<&Cause> {
        match self {
            OperationError::FetchOne { cause }
            | OperationError::FetchMany { cause }
            | OperationError::Add { cause }
            | OperationError::Set { cause }
            | OperationError::MergeUpdate { cause }
            | OperationError::Delete { cause }
            | OperationError::ExistsCheck { cause }
            | OperationError::Count { cause }
            | OperationError::Decode { cause } => cause.as_ref(),
            OperationError::Unknown => None,
        }
    }
}

impl Display for OperationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.cause() {
            Some(cause) => write!(f, "{}: {}", self.code_str(), cause),
            None => write!(f, "{}", self.code_str()),
        }
    }
}

impl Error for OperationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.cause().map(|cause| cause.as_ref() as &(dyn Error + 'static))
    }
}

pub type OperationResult<T> = Result<T, OperationError>;

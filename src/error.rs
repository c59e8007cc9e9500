//! Error types for orgdir
//!
//! This module defines the error hierarchy used throughout the crate.
//! Store-level failures (`DirectoryError`) are converted into the
//! caller-facing taxonomy (`ServiceError`) at the component boundary, and
//! mapped to HTTP statuses by [`http_mapper`].

pub mod http_mapper;

use crate::lifecycle::CreationStep;
use crate::path::ComponentKind;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Invalid path: {0}")]
    Path(#[from] PathError),

    #[error("{0}")]
    Service(#[from] ServiceError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Invalid seed file '{path}': {reason}")]
    Seed { path: String, reason: String },
}

/// Errors raised while building, walking or parsing entry paths
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("path has no components")]
    Empty,

    #[error("path must start at a branch root")]
    MissingBranchRoot,

    #[error("{kind} component cannot follow {after}")]
    UnexpectedComponent {
        kind: ComponentKind,
        after: ComponentKind,
    },

    #[error("expected {expected} leaf, found {found}")]
    UnexpectedLeaf {
        expected: &'static str,
        found: ComponentKind,
    },

    #[error("'{0}' is not directly under a groups container")]
    NotUnderGroupsContainer(String),

    #[error("invalid name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("malformed distinguished name '{dn}': {reason}")]
    MalformedDn { dn: String, reason: String },

    #[error("'{0}' is not under any configured branch root")]
    OutsideBranches(String),

    #[error("invalid branch '{0}', must be 'internal' or 'external'")]
    InvalidBranch(String),
}

/// Errors reported by a directory store implementation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("no such entry: {path}")]
    NoSuchEntry { path: String },

    #[error("entry already exists: {path}")]
    EntryAlreadyExists { path: String },

    #[error("value '{value}' already present in {attribute} of {path}")]
    ValueAlreadyPresent {
        path: String,
        attribute: String,
        value: String,
    },

    #[error("value '{value}' not present in {attribute} of {path}")]
    NoSuchValue {
        path: String,
        attribute: String,
        value: String,
    },

    #[error("object class violation on {path}: {reason}")]
    ObjectClassViolation { path: String, reason: String },

    #[error("directory unavailable: {0}")]
    Unavailable(String),
}

/// Permission failures, computed locally rather than reported by the store
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("'{principal}' may not {action}: {reason}")]
pub struct PermissionDeniedError {
    pub principal: String,
    pub action: String,
    pub reason: String,
}

impl PermissionDeniedError {
    pub fn new(
        principal: impl Into<String>,
        action: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            principal: principal.into(),
            action: action.into(),
            reason: reason.into(),
        }
    }
}

/// Caller-facing error taxonomy of the permission, listing and lifecycle components
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Already exists: {path}")]
    AlreadyExists { path: String },

    #[error("'{value}' is already present in {path}")]
    DuplicateValue { path: String, value: String },

    #[error("'{value}' is not present in {path}")]
    AbsentValue { path: String, value: String },

    #[error("Permission denied: {0}")]
    PermissionDenied(#[from] PermissionDeniedError),

    #[error("Directory store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Directory rejected the operation: {0}")]
    Rejected(String),

    #[error("Invalid path: {0}")]
    InvalidPath(#[from] PathError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Creation of {path} stopped at {step}, structure may be partial: {source}")]
    Incomplete {
        path: String,
        step: CreationStep,
        #[source]
        source: Box<ServiceError>,
    },
}

impl ServiceError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        ServiceError::NotFound {
            resource: resource.into(),
        }
    }

    pub fn missing_argument(name: &str) -> Self {
        ServiceError::InvalidArgument(format!("{} is required", name))
    }

    /// Whether the failure may have left a partially created structure behind
    pub fn is_partial(&self) -> bool {
        matches!(self, ServiceError::Incomplete { .. })
    }
}

impl From<DirectoryError> for ServiceError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NoSuchEntry { path } => ServiceError::NotFound { resource: path },
            DirectoryError::EntryAlreadyExists { path } => ServiceError::AlreadyExists { path },
            DirectoryError::ValueAlreadyPresent { path, value, .. } => {
                ServiceError::DuplicateValue { path, value }
            }
            DirectoryError::NoSuchValue { path, value, .. } => {
                ServiceError::AbsentValue { path, value }
            }
            DirectoryError::ObjectClassViolation { path, reason } => {
                ServiceError::Rejected(format!("{}: {}", path, reason))
            }
            DirectoryError::Unavailable(message) => ServiceError::StoreUnavailable(message),
        }
    }
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for service operations
pub type ServiceResult<T> = std::result::Result<T, ServiceError>;

/// Result type alias for directory store operations
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Result type alias for path operations
pub type PathResult<T> = std::result::Result<T, PathError>;

// Copyright (c) 2026 The Miniflare Authors
// This file is licensed under the Apache-2.0 license

use thiserror::Error;

/// The stable, user-visible error codes named in the external interface.
///
/// These are intentionally decoupled from [`Error`]'s variant names: callers
/// should match on the code, not on enum shape, since the taxonomy is free to
/// grow variants without breaking downstream `match code { "ERR_..." => .. }`
/// consumers.
pub type ErrorCode = &'static str;

/// The full error taxonomy for the simulator core.
///
/// Variants are grouped per the propagation policy: validation and capacity
/// errors surface to user code as-is, state errors are fatal to the current
/// handler, deserialization errors are fatal for the affected key only, and
/// transient conflicts (the transaction manager's internal retry signal)
/// never appear here at all — they are fully hidden from callers.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    // -- validation errors --------------------------------------------------
    #[error("{0}")]
    Validation(String),

    #[error("Key name cannot be empty")]
    EmptyKey,

    #[error("Key name too long: {len} bytes (max {max})")]
    KeyTooLong { len: usize, max: usize },

    #[error("Key name cannot be \".\" or \"..\"")]
    ReservedKeyName,

    #[error("Invalid expiration_ttl of {0}")]
    InvalidExpirationTtl(String),

    #[error("Invalid expiration of {0}")]
    InvalidExpiration(String),

    #[error("Cannot cache response to non-GET request")]
    NonGetRequest,

    #[error("reserved namespace name {0:?}")]
    ReservedNamespace(String),

    // -- capacity errors ------------------------------------------------------
    #[error("value exceeds maximum size of {max} bytes (was {actual})")]
    ValueTooLarge { actual: usize, max: usize },

    #[error("metadata exceeds maximum size of {max} bytes (was {actual})")]
    MetadataTooLarge { actual: usize, max: usize },

    #[error("batch of {actual} keys exceeds the limit of {max}")]
    TooManyKeys { actual: usize, max: usize },

    #[error("Subrequest limit exceeded")]
    SubrequestLimitExceeded,

    #[error("Pipeline depth limit exceeded")]
    PipelineDepthExceeded,

    #[error("Request depth limit exceeded")]
    RequestDepthExceeded,

    #[error("requested range is not satisfiable")]
    RangeNotSatisfiable,

    // -- state errors -----------------------------------------------------
    #[error("operation attempted outside of a request handler")]
    OutsideRequestHandler,

    #[error("invalid transaction state: {0}")]
    InvalidTransactionState(String),

    #[error("transaction aborted after exceeding the maximum number of retries")]
    TransactionAborted,

    #[error("operation cancelled")]
    Cancelled,

    #[error("no fetch handler registered")]
    NoHandler,

    #[error("handler did not return a response")]
    NoResponse,

    #[error("handler returned an invalid response: {0}")]
    ResponseType(String),

    #[error("no upstream configured for passThroughOnException")]
    NoUpstream,

    // -- deserialization errors --------------------------------------------
    #[error("failed to deserialize stored entry: {0}")]
    Deserialization(String),

    // -- type errors (KV put value coercion) -------------------------------
    #[error("{0}")]
    TypeError(String),
}

impl Error {
    /// The stable `ERR_*` code for this error, per the external interface.
    ///
    /// Not every variant has a dedicated public code; variants without one
    /// fall back to the closest listed code or `"ERR_KEY_VALIDATION"` for
    /// generic validation failures, matching how the source runtime collapses
    /// many validation messages behind a handful of stable codes.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::ReservedNamespace(_) => "ERR_RESERVED",
            Error::Deserialization(_) => "ERR_DESERIALIZATION",
            Error::NoHandler => "ERR_NO_HANDLER",
            Error::NoResponse => "ERR_NO_RESPONSE",
            Error::ResponseType(_) => "ERR_RESPONSE_TYPE",
            Error::NoUpstream => "ERR_NO_UPSTREAM",
            Error::SubrequestLimitExceeded => "ERR_SUBREQUEST_LIMIT",
            Error::EmptyKey
            | Error::KeyTooLong { .. }
            | Error::ReservedKeyName
            | Error::InvalidExpirationTtl(_)
            | Error::InvalidExpiration(_)
            | Error::Validation(_)
            | Error::TypeError(_) => "ERR_KEY_VALIDATION",
            _ => "ERR_KEY_VALIDATION",
        }
    }

    /// Whether this error is safe for a handler to catch and continue past
    /// (validation, capacity, and deserialization errors), as opposed to one
    /// that should be treated as fatal to the current request.
    pub fn is_catchable(&self) -> bool {
        !matches!(self, Error::Cancelled | Error::TransactionAborted)
    }
}

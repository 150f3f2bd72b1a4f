//! This module defines the single, unified error type for the entire strata
//! core.
//!
//! By using a single error enum, errors from any kernel can be propagated up
//! to the page reader/writer, which attributes them to the page being
//! processed. The `thiserror` crate is used to reduce boilerplate.
//!
//! There are two semantic families of failure. Corruption
//! (`CorruptedPage`) means the input bytes are structurally invalid; it is
//! fatal for the page and not recoverable by retrying on the same buffer.
//! Unsupported pairings (`NotImplemented`, `InvalidEncoding`) are surfaced by
//! the codec factory before any bytes are consumed or written. Running out of
//! input is *not* an error: batch reads simply return fewer values than
//! requested.

use thiserror::Error;

use crate::types::{Encoding, PhysicalType};

#[derive(Error, Debug)]
pub enum StrataError {
    #[error("Corrupted page: {0}")]
    CorruptedPage(String),

    #[error("Encoding {0} is not implemented for type {1}")]
    NotImplemented(Encoding, PhysicalType),

    #[error("Encoding {0} is invalid for type {1}")]
    InvalidEncoding(Encoding, PhysicalType),

    #[error("Internal logic error (this is a bug): {0}")]
    Internal(String),
}

impl StrataError {
    /// Shorthand for the corruption family, used all over the kernels.
    pub fn corrupted(msg: impl Into<String>) -> Self {
        StrataError::CorruptedPage(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StrataError>;

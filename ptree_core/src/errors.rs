//! Error handling and stable error codes for ptree

use std::fmt;

/// Reasons a tree operation is refused. A refused operation leaves the tree
/// exactly as it was.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An item with an identical full key is already present.
    DuplicateKey,
    /// A mask of the same length and prefix is already present.
    DuplicateMask,
    /// Mask longer than the key, or with non-zero bits past its length.
    InvalidMask,
    /// The item's node is already linked into a tree.
    AlreadyLinked,
    /// The item is not a member of this tree.
    NotLinked,
    /// The item index is outside the slice or the addressable range.
    InvalidItem,
    /// The key operations declare more bits than a node can address.
    KeyTooLong,
}

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    Success = 0,
    DuplicateKey = 1,
    DuplicateMask = 2,
    InvalidMask = 3,
    AlreadyLinked = 4,
    NotLinked = 5,
    InvalidItem = 6,
    KeyTooLong = 7,
    Unknown = 255,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Success => "Success",
            ErrorCode::DuplicateKey => "Duplicate key",
            ErrorCode::DuplicateMask => "Duplicate mask",
            ErrorCode::InvalidMask => "Invalid mask",
            ErrorCode::AlreadyLinked => "Node already linked",
            ErrorCode::NotLinked => "Node not linked",
            ErrorCode::InvalidItem => "Invalid item",
            ErrorCode::KeyTooLong => "Key too long",
            ErrorCode::Unknown => "Unknown error",
        }
    }
}

// Map internal Error to ErrorCode
pub fn map_error(e: &Error) -> ErrorCode {
    use Error::*;
    match e {
        DuplicateKey => ErrorCode::DuplicateKey,
        DuplicateMask => ErrorCode::DuplicateMask,
        InvalidMask => ErrorCode::InvalidMask,
        AlreadyLinked => ErrorCode::AlreadyLinked,
        NotLinked => ErrorCode::NotLinked,
        InvalidItem => ErrorCode::InvalidItem,
        KeyTooLong => ErrorCode::KeyTooLong,
    }
}

/// Code for an operation outcome, `Success` for `Ok`.
pub fn result_code<T>(r: &Result<T, Error>) -> ErrorCode {
    match r {
        Ok(_) => ErrorCode::Success,
        Err(e) => map_error(e),
    }
}

impl From<Error> for ErrorCode {
    fn from(e: Error) -> Self {
        map_error(&e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(map_error(self).as_str())
    }
}

impl std::error::Error for Error {}

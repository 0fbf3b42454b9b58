//! Storage-specific error types.

use std::error::Error;
use std::fmt;

use plume_core::BlockId;

/// Errors that can occur during container operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageError {
    /// A container was configured with a block capacity of zero.
    ZeroCapacity,
    /// Attempted to release a block that still holds live particles.
    BlockNotEmpty {
        /// The block that was not released.
        block: BlockId,
        /// Its current active amount.
        active: usize,
    },
    /// The block is not registered in this container.
    UnknownBlock {
        /// The unrecognised block.
        block: BlockId,
    },
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroCapacity => write!(f, "block capacity must be at least 1"),
            Self::BlockNotEmpty { block, active } => {
                write!(f, "block {block} still has {active} active particles")
            }
            Self::UnknownBlock { block } => write!(f, "unknown block: {block}"),
        }
    }
}

impl Error for StorageError {}

//! Error types for nebula-arena
//!
//! Only environmental and caller errors live here. Broken internal
//! invariants (a rehash that loses entries, a bucket index past the bucket
//! array) are logic bugs and panic instead of producing an [`ArenaError`].

use thiserror::Error;

#[cfg(feature = "logging")]
use tracing::{error, warn};

// ============================================================================
// Main Error Types
// ============================================================================

/// Arena allocation errors
#[must_use = "errors should be handled"]
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    // --- Allocation Errors ---
    #[error("Arena allocation failed: {size} bytes with {align} byte alignment")]
    AllocationFailed { size: usize, align: usize },

    #[error("Invalid alignment: {alignment} (must be a non-zero power of two)")]
    InvalidAlignment { alignment: usize },

    #[error("Size overflow during operation: {operation}")]
    SizeOverflow { operation: String },

    // --- Page Source Errors ---
    #[error("Failed to acquire {size} bytes of pages: {reason}")]
    PageAcquisition { size: usize, reason: String },

    // --- Configuration Errors ---
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    // --- Strategy Errors ---
    #[error("Operation '{operation}' is not supported by the {strategy} strategy")]
    NotSupported {
        strategy: &'static str,
        operation: &'static str,
    },

    // --- Diagnostics ---
    #[error("Arena corruption detected in {component}: {details}")]
    Corruption { component: String, details: String },
}

impl ArenaError {
    /// Get error code for categorization
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::AllocationFailed { .. } => "ARENA:ALLOC:FAILED",
            Self::InvalidAlignment { .. } => "ARENA:ALLOC:ALIGN",
            Self::SizeOverflow { .. } => "ARENA:ALLOC:OVERFLOW",
            Self::PageAcquisition { .. } => "ARENA:PAGES:ACQUIRE",
            Self::InvalidConfig { .. } => "ARENA:CONFIG:INVALID",
            Self::NotSupported { .. } => "ARENA:STRATEGY:UNSUPPORTED",
            Self::Corruption { .. } => "ARENA:SYSTEM:CORRUPTION",
        }
    }

    /// Whether the error means the process is out of usable memory.
    ///
    /// Infallible entry points (`Arena::alloc`, container growth) turn these
    /// into `handle_alloc_error`.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::AllocationFailed { .. } | Self::PageAcquisition { .. }
        )
    }

    // ============================================================================
    // Convenience Constructors
    // ============================================================================

    /// Create allocation failed error
    pub fn allocation_failed(size: usize, align: usize) -> Self {
        #[cfg(feature = "logging")]
        error!(size, align, "arena allocation failed");

        Self::AllocationFailed { size, align }
    }

    /// Create invalid alignment error
    pub fn invalid_alignment(alignment: usize) -> Self {
        Self::InvalidAlignment { alignment }
    }

    /// Create size overflow error
    pub fn size_overflow(operation: &str) -> Self {
        Self::SizeOverflow {
            operation: operation.to_string(),
        }
    }

    /// Create page acquisition error
    pub fn page_acquisition(size: usize, reason: impl Into<String>) -> Self {
        let reason = reason.into();

        #[cfg(feature = "logging")]
        error!(size, reason = %reason, "page acquisition failed");

        Self::PageAcquisition { size, reason }
    }

    /// Create invalid config error
    pub fn invalid_config(reason: &str) -> Self {
        #[cfg(feature = "logging")]
        warn!(reason, "rejected arena configuration");

        Self::InvalidConfig {
            reason: reason.to_string(),
        }
    }

    /// Create not supported error
    pub fn not_supported(strategy: &'static str, operation: &'static str) -> Self {
        Self::NotSupported {
            strategy,
            operation,
        }
    }

    /// Create corruption error
    pub fn corruption(component: &str, details: &str) -> Self {
        #[cfg(feature = "logging")]
        error!("arena corruption: {component} - {details}");

        Self::Corruption {
            component: component.to_string(),
            details: details.to_string(),
        }
    }
}

// ============================================================================
// Result Types
// ============================================================================

/// Result type for arena operations
pub type ArenaResult<T> = core::result::Result<T, ArenaError>;

// ============================================================================
// Tests
// ============================================================================

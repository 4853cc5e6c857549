//! Platform constants needed to convert kernel units.
//!
//! Both constants are resolved in two tiers: a `sysconf` query first, then a
//! named default when the query is unsupported or returns a non-positive value.

use tracing::debug;

/// Clock ticks per second assumed when `_SC_CLK_TCK` cannot be queried.
pub const DEFAULT_CLOCK_TICKS: f64 = 100.0;

/// Page size in bytes assumed when `_SC_PAGESIZE` cannot be queried.
pub const DEFAULT_PAGE_SIZE: u64 = 4096;

/// Queries the kernel clock tick rate.
///
/// Returns `None` on non-Unix platforms or when `sysconf` reports an error
/// (-1) or an undefined value (0).
pub fn clock_ticks() -> Option<f64> {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions for _SC_CLK_TCK
        let tck = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
        if tck > 0 {
            return Some(tck as f64);
        }
    }
    None
}

/// Queries the memory page size in bytes.
pub fn page_size() -> Option<u64> {
    #[cfg(unix)]
    {
        // SAFETY: sysconf has no preconditions for _SC_PAGESIZE
        let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if size > 0 {
            return Some(size as u64);
        }
    }
    None
}

/// Unit conversion constants, fixed for the lifetime of a collector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlatformConstants {
    /// Clock ticks per second.
    pub ticks: f64,
    /// Memory page size in bytes.
    pub pagesize: u64,
}

impl PlatformConstants {
    /// Resolves both constants from the running platform.
    pub fn resolve() -> Self {
        let ticks = clock_ticks().unwrap_or_else(|| {
            debug!(
                "Clock tick query unsupported, using default of {}",
                DEFAULT_CLOCK_TICKS
            );
            DEFAULT_CLOCK_TICKS
        });
        let pagesize = page_size().unwrap_or_else(|| {
            debug!(
                "Page size query unsupported, using default of {}",
                DEFAULT_PAGE_SIZE
            );
            DEFAULT_PAGE_SIZE
        });

        Self { ticks, pagesize }
    }
}

impl Default for PlatformConstants {
    fn default() -> Self {
        Self {
            ticks: DEFAULT_CLOCK_TICKS,
            pagesize: DEFAULT_PAGE_SIZE,
        }
    }
}

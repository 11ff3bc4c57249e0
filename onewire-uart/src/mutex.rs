/// Mutual-exclusion seam guarding a session against concurrent use.
///
/// The lock covers both the session state (ROM buffer, discrepancy marker)
/// and the serial order of UART baudrate changes and exchanges: no other
/// holder of the same UART may change the baudrate between a reset pulse
/// and its restore.
///
/// RTOS integrations implement this over their semaphore primitive; both
/// operations report success the way such ports do. Single-threaded builds
/// use [`NoopMutex`].
pub trait BusMutex {
    /// Acquires the lock, blocking as needed. Returns `false` on failure.
    fn lock(&mut self) -> bool;

    /// Releases the lock. Returns `false` on failure.
    fn unlock(&mut self) -> bool;
}

/// Lock for single-threaded builds: acquisition and release always succeed
/// and do nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMutex;

impl BusMutex for NoopMutex {
    fn lock(&mut self) -> bool {
        true
    }

    fn unlock(&mut self) -> bool {
        true
    }
}

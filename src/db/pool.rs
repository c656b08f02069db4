//! Fixed-size connection checkout.
//!
//! For drivers without a pooling primitive. `pool_size` connections are
//! opened up front and handed out one caller at a time: a [`SlotGuard`] owns
//! its connection exclusively and returns it when dropped, on every exit
//! path. Callers wait up to the configured timeout for a free slot.

use crate::error::{DbError, DbResult};
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Pool of pre-opened connections with exclusive checkout.
///
/// The number of available semaphore permits always equals the number of
/// idle connections.
pub struct ConnectionSlots<C> {
    idle: Arc<Mutex<Vec<C>>>,
    permits: Arc<Semaphore>,
    size: usize,
    timeout: Duration,
}

impl<C> std::fmt::Debug for ConnectionSlots<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSlots")
            .field("size", &self.size)
            .field("available", &self.permits.available_permits())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

fn lock<C>(idle: &Mutex<Vec<C>>) -> MutexGuard<'_, Vec<C>> {
    // The list is only pushed to and popped from, so a poisoned lock is still consistent
    idle.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<C: Send + 'static> ConnectionSlots<C> {
    /// Wrap already-open connections.
    pub fn new(connections: Vec<C>, timeout: Duration) -> Self {
        let size = connections.len();
        Self {
            idle: Arc::new(Mutex::new(connections)),
            permits: Arc::new(Semaphore::new(size)),
            size,
            timeout,
        }
    }

    /// Take exclusive ownership of one idle connection.
    ///
    /// Fails with a timeout error if no slot frees up within the configured
    /// timeout, or a connection error once the pool is closed.
    pub async fn checkout(&self) -> DbResult<SlotGuard<C>> {
        let permit = tokio::time::timeout(self.timeout, Arc::clone(&self.permits).acquire_owned())
            .await
            .map_err(|_| {
                DbError::timeout(format!(
                    "Timed out after {}s waiting for a free connection ({} in use)",
                    self.timeout.as_secs(),
                    self.size
                ))
            })?
            .map_err(|_| DbError::connection("Connection pool is closed"))?;

        let conn = lock(&self.idle)
            .pop()
            .ok_or_else(|| DbError::connection("Connection pool has no idle connection"))?;

        debug!(
            available = self.permits.available_permits(),
            "Checked out connection slot"
        );

        Ok(SlotGuard {
            conn: Some(conn),
            idle: Arc::clone(&self.idle),
            permits: Arc::clone(&self.permits),
            _permit: permit,
        })
    }

    /// Stop handing out connections and return the idle ones.
    ///
    /// Connections still checked out are dropped when their guard is.
    pub fn close(&self) -> Vec<C> {
        self.permits.close();
        std::mem::take(&mut *lock(&self.idle))
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

/// Exclusive handle on one pooled connection.
pub struct SlotGuard<C> {
    conn: Option<C>,
    idle: Arc<Mutex<Vec<C>>>,
    permits: Arc<Semaphore>,
    // Dropped after `Drop::drop` has put the connection back
    _permit: OwnedSemaphorePermit,
}

impl<C> std::fmt::Debug for SlotGuard<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotGuard")
            .field("held", &self.conn.is_some())
            .finish_non_exhaustive()
    }
}

impl<C> Deref for SlotGuard<C> {
    type Target = C;

    fn deref(&self) -> &C {
        self.conn
            .as_ref()
            .expect("slot connection is present until the guard drops")
    }
}

impl<C> DerefMut for SlotGuard<C> {
    fn deref_mut(&mut self) -> &mut C {
        self.conn
            .as_mut()
            .expect("slot connection is present until the guard drops")
    }
}

impl<C> Drop for SlotGuard<C> {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if self.permits.is_closed() {
            // Pool shut down while this connection was out
            drop(conn);
            return;
        }
        lock(&self.idle).push(conn);
    }
}

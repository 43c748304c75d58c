//! Block Scanner
//!
//! Ingests ledger blocks into the [`AddressStore`] along two paths that share
//! one startup head:
//!
//! ```text
//!                      head (processed synchronously at startup)
//!                        │
//!   backward scan  ◀─────┼─────▶  forward poll
//!   head-1 .. max(1, head-depth)   (cursor, latest] every tick
//!   one-shot, best effort          unbounded, owns the cursor
//! ```
//!
//! - The coordinating task fetches the head, processes it, seeds the cursor,
//!   spawns the backward scan and then becomes the forward poll.
//! - Only the forward poll writes the cursor. It keeps it in a local and
//!   publishes snapshots through a `watch` channel.
//! - Per-block failures are logged and skipped on both paths. Only a failed
//!   first head lookup is fatal.
//! - Records from the two paths interleave in arrival order, so an address's
//!   list is not necessarily block-ordered.

pub mod error;
pub mod state;

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::codec;
use crate::config::ScannerConfig;
use crate::facade::QueryFacade;
use crate::models::TransactionRecord;
use crate::rpc::RpcClient;
use crate::shutdown::ShutdownSignal;
use crate::store::AddressStore;

pub use error::ScannerError;
pub use state::ScannerState;

/// Backward scan progress is logged on multiples of this
const BACKWARD_PROGRESS_EVERY: u64 = 1000;

/// Inclusive, descending backward range for a startup `head`.
///
/// Returns `(from, stop_at)` with `from = head - 1` and
/// `stop_at = max(1, head - depth)`, or `None` when the range is empty.
pub fn backward_range(head: u64, depth: u64) -> Option<(u64, u64)> {
    let from = head.checked_sub(1)?;
    let stop_at = head.saturating_sub(depth).max(1);
    (from >= stop_at).then_some((from, stop_at))
}

struct Lifecycle {
    state: ScannerState,
    /// Signal handed to the current `start`, cancelled again by `stop`
    shutdown: Option<ShutdownSignal>,
}

struct ScannerInner {
    client: Arc<dyn RpcClient>,
    store: Arc<dyn AddressStore>,
    config: ScannerConfig,
    cursor: watch::Sender<u64>,
    lifecycle: Mutex<Lifecycle>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    /// Held across a whole drain so concurrent `stop()` calls all wait
    join_lock: tokio::sync::Mutex<()>,
}

/// Ledger scanner feeding an [`AddressStore`].
///
/// Cheap to clone; clones share tasks, cursor and store.
#[derive(Clone)]
pub struct BlockScanner {
    inner: Arc<ScannerInner>,
}

impl BlockScanner {
    pub fn new(
        client: Arc<dyn RpcClient>,
        store: Arc<dyn AddressStore>,
        config: ScannerConfig,
    ) -> Self {
        let (cursor, _) = watch::channel(0);
        Self {
            inner: Arc::new(ScannerInner {
                client,
                store,
                config,
                cursor,
                lifecycle: Mutex::new(Lifecycle {
                    state: ScannerState::NotStarted,
                    shutdown: None,
                }),
                tasks: Mutex::new(Vec::new()),
                join_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.inner.config
    }

    pub fn state(&self) -> ScannerState {
        self.inner.lifecycle().state
    }

    /// Receiver that observes every cursor update
    pub fn watch_cursor(&self) -> watch::Receiver<u64> {
        self.inner.cursor.subscribe()
    }

    /// Spawn the scanning tasks.
    ///
    /// Returns `false` without spawning anything unless the scanner is idle
    /// (`NotStarted` or `Stopped`). Must be called inside a tokio runtime.
    pub fn start(&self, shutdown: ShutdownSignal) -> bool {
        let mut lifecycle = self.inner.lifecycle();
        if !lifecycle.state.can_start() {
            debug!(state = %lifecycle.state, "Scanner start ignored");
            return false;
        }
        lifecycle.state = ScannerState::Running;
        lifecycle.shutdown = Some(shutdown.clone());

        let inner = self.inner.clone();
        let handle = tokio::spawn(async move { inner.poll_loop(shutdown).await });
        // tracked before the guard drops so a racing stop() always sees it
        self.inner.track(handle);

        info!(
            poll_interval = ?self.inner.config.poll_interval(),
            backward_scan = self.inner.config.backward_scan_enabled,
            depth = self.inner.config.backward_scan_depth(),
            "Block scanner started"
        );
        true
    }

    /// Cancel the scanning tasks and wait until every one of them has exited.
    ///
    /// Safe to call before `start`, twice, concurrently, or after the signal
    /// was already set. No store writes happen after this returns.
    pub async fn stop(&self) {
        info!("Stopping block scanner, waiting for tasks to complete...");
        let shutdown = {
            let mut lifecycle = self.inner.lifecycle();
            // Stopped may still have a draining backward task; block restarts
            // until the join below is done
            if matches!(lifecycle.state, ScannerState::Running | ScannerState::Stopped) {
                lifecycle.state = ScannerState::Stopping;
            }
            lifecycle.shutdown.clone()
        };
        if let Some(shutdown) = shutdown {
            shutdown.request_shutdown();
        }

        self.inner.join_all().await;

        let mut lifecycle = self.inner.lifecycle();
        if lifecycle.state == ScannerState::Stopping {
            lifecycle.state = ScannerState::Stopped;
        }
        info!(state = %lifecycle.state, "Block scanner stopped");
    }

    /// Fetch block `number` and file two records per transaction.
    ///
    /// On fetch failure nothing is written. Returns the number of
    /// transactions indexed.
    pub async fn process_block(&self, number: u64) -> Result<usize, ScannerError> {
        self.inner.process_block(number).await
    }
}

impl QueryFacade for BlockScanner {
    fn current_block(&self) -> u64 {
        *self.inner.cursor.borrow()
    }

    fn subscribe(&self, address: &str) -> bool {
        let first = self.inner.store.subscribe(address);
        if first {
            info!(address, "New subscription");
        }
        first
    }

    fn get_transactions(&self, address: &str) -> Vec<TransactionRecord> {
        self.inner.store.get_transactions(address)
    }

    fn subscription_count(&self) -> usize {
        self.inner.store.subscription_count()
    }
}

impl ScannerInner {
    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        // state is a plain enum, a poisoned guard is still consistent
        self.lifecycle.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn tasks(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn track(&self, handle: JoinHandle<()>) {
        self.tasks().push(handle);
    }

    /// Await tracked tasks until none are left (tasks may spawn tasks)
    async fn join_all(&self) {
        let _drain = self.join_lock.lock().await;
        loop {
            let handles = std::mem::take(&mut *self.tasks());
            if handles.is_empty() {
                return;
            }
            for handle in handles {
                if let Err(e) = handle.await {
                    error!("Scanner task ended abnormally: {}", e);
                }
            }
        }
    }

    async fn fetch_head(&self) -> Result<u64, ScannerError> {
        let hex = self
            .client
            .get_block_number()
            .await
            .map_err(ScannerError::HeadFetch)?;
        Ok(codec::parse_int(&hex))
    }

    async fn process_block(&self, number: u64) -> Result<usize, ScannerError> {
        let block = self
            .client
            .get_block_by_number(number, true)
            .await
            .map_err(|source| ScannerError::BlockFetch { number, source })?;

        // decode everything before the first write
        let pairs: Vec<_> = block
            .transactions
            .iter()
            .map(|tx| TransactionRecord::pair_from_rpc(tx, number))
            .collect();

        let count = pairs.len();
        for (outbound, inbound) in pairs {
            let from = outbound.from.clone();
            let to = inbound.to.clone();
            self.store.add_transaction(&from, outbound);
            self.store.add_transaction(&to, inbound);
        }

        debug!(block = number, txs = count, "Processed block");
        Ok(count)
    }

    /// Leave `Running` for an idle state once the coordinating task exits.
    ///
    /// A `stop()` in progress owns the transition instead.
    fn release(&self, next: ScannerState) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state == ScannerState::Running {
            lifecycle.state = next;
            lifecycle.shutdown = None;
        }
    }

    /// Coordinating task: startup, backward spawn, then the forward poll
    async fn poll_loop(self: Arc<Self>, shutdown: ShutdownSignal) {
        let head = match self.fetch_head().await {
            Ok(head) => head,
            Err(e) => {
                error!(
                    code = ?e.rpc_code(),
                    "Failed to initialize current block, scanner not started: {}", e
                );
                self.release(ScannerState::NotStarted);
                return;
            }
        };
        if shutdown.is_shutdown_requested() {
            info!("Scanner cancelled during startup at block {}", head);
            self.release(ScannerState::Stopped);
            return;
        }
        info!("Initialized at block {}", head);

        if let Err(e) = self.process_block(head).await {
            warn!("Failed to process initial block {}: {}", head, e);
        }
        self.cursor.send_replace(head);

        if self.config.backward_scan_enabled
            && let Some((from, stop_at)) = backward_range(head, self.config.backward_scan_depth())
        {
            let inner = self.clone();
            let signal = shutdown.clone();
            let handle =
                tokio::spawn(async move { inner.scan_backward(from, stop_at, signal).await });
            self.track(handle);
        }

        self.scan_forward(head, &shutdown).await;
        self.release(ScannerState::Stopped);
    }

    /// Process `from` down to `stop_at` inclusive; never touches the cursor
    async fn scan_backward(&self, from: u64, stop_at: u64, shutdown: ShutdownSignal) {
        info!("Backward scan starting {} -> {}", from, stop_at);

        for number in (stop_at..=from).rev() {
            if shutdown.is_shutdown_requested() {
                info!("Backward scan cancelled before block {}", number);
                return;
            }
            if let Err(e) = self.process_block(number).await {
                warn!("Backward scan failed to process block {}: {}", number, e);
            }
            if number % BACKWARD_PROGRESS_EVERY == 0 {
                info!(
                    addresses = self.store.address_count(),
                    "Backward scan reached block {}", number
                );
            }
        }

        info!("Backward scan completed ({} -> {})", from, stop_at);
    }

    /// Tick-driven catch-up loop. `cursor` is owned here and only published.
    async fn scan_forward(&self, mut cursor: u64, shutdown: &ShutdownSignal) {
        let period = self.config.poll_interval();
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("Forward scan starting from block {}", cursor);
        loop {
            tokio::select! {
                biased;
                _ = shutdown.requested() => {
                    info!("Forward scan stopping at block {}", cursor);
                    return;
                }
                _ = ticker.tick() => {
                    match self.check_for_new_blocks(cursor, shutdown).await {
                        Ok(next) => cursor = next,
                        Err(e) => {
                            warn!(code = ?e.rpc_code(), "Error checking for new blocks: {}", e)
                        }
                    }
                }
            }
        }
    }

    /// Process `(cursor, head]` ascending and return the new cursor.
    ///
    /// Failed blocks are skipped, not retried; the cursor still moves past
    /// them. If cancelled mid-batch the cursor stops at the last attempted
    /// block.
    async fn check_for_new_blocks(
        &self,
        cursor: u64,
        shutdown: &ShutdownSignal,
    ) -> Result<u64, ScannerError> {
        let head = self.fetch_head().await?;
        if head <= cursor {
            debug!(head, cursor, "No new blocks");
            return Ok(cursor);
        }

        let mut attempted = cursor;
        for number in cursor + 1..=head {
            if shutdown.is_shutdown_requested() {
                info!("Forward batch interrupted after block {}", attempted);
                break;
            }
            match self.process_block(number).await {
                Ok(txs) => info!("Processed block {} ({} txs)", number, txs),
                Err(e) => warn!("Failed to process block {}: {}", number, e),
            }
            attempted = number;
        }

        self.cursor.send_replace(attempted);
        Ok(attempted)
    }
}

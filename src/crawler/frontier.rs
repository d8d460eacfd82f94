use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// A unit of crawl work: a raw URL with its depth accounting
///
/// `depth_actual` counts hops from the seed. `depth_effective` counts hops
/// since the crawler was last inside the home-family allow-list; the crawl
/// function resets it to zero when the URL matches the allow-list, so
/// `depth_effective <= depth_actual` always holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth_actual: u32,
    pub depth_effective: u32,
}

impl FrontierEntry {
    /// Entry for a seed URL, at depth zero
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            depth_actual: 0,
            depth_effective: 0,
        }
    }

    /// Entry for a link found on the page this entry points at
    pub fn child(&self, url: impl Into<String>, depth_effective: u32) -> Self {
        Self {
            url: url.into(),
            depth_actual: self.depth_actual + 1,
            depth_effective: depth_effective + 1,
        }
    }
}

/// Result of a timed frontier pop
#[derive(Debug)]
pub enum PopResult {
    /// An entry was dequeued
    Entry(FrontierEntry),
    /// Nothing arrived within the timeout
    Empty,
    /// The queue was closed and fully drained
    Closed,
}

/// Bounded FIFO of frontier entries shared by all workers
///
/// Enqueue waits when the queue is at capacity, preserving link
/// completeness under backpressure. The unfinished-task counter covers
/// entries that are queued or currently held by a worker; the coordinator
/// joins on it reaching zero, mirroring queue join semantics.
pub struct Frontier {
    tx: async_channel::Sender<FrontierEntry>,
    rx: async_channel::Receiver<FrontierEntry>,
    unfinished: AtomicUsize,
}

impl Frontier {
    /// Creates a frontier with the given capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, rx) = async_channel::bounded(capacity);
        Self {
            tx,
            rx,
            unfinished: AtomicUsize::new(0),
        }
    }

    /// Enqueues an entry, waiting while the queue is full
    ///
    /// Returns false when the frontier has been closed for shutdown.
    pub async fn push(&self, entry: FrontierEntry) -> bool {
        // Count before sending so the join loop never observes a sent
        // entry with a zero unfinished count.
        self.unfinished.fetch_add(1, Ordering::SeqCst);
        match self.tx.send(entry).await {
            Ok(()) => true,
            Err(_) => {
                self.unfinished.fetch_sub(1, Ordering::SeqCst);
                false
            }
        }
    }

    /// Dequeues an entry, giving up after the timeout
    pub async fn pop_timeout(&self, timeout: Duration) -> PopResult {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Ok(entry)) => PopResult::Entry(entry),
            Ok(Err(_)) => PopResult::Closed,
            Err(_) => PopResult::Empty,
        }
    }

    /// Marks one previously-popped entry as fully handled
    pub fn task_done(&self) {
        self.unfinished.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of entries queued or held by workers
    pub fn unfinished(&self) -> usize {
        self.unfinished.load(Ordering::SeqCst)
    }

    /// Number of entries currently queued
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Returns whether the queue is currently empty
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Closes the queue; pending entries can still be drained
    pub fn close(&self) {
        self.tx.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_entry_depths() {
        let parent = FrontierEntry::seed("http://home.test");
        let child = parent.child("http://home.test/a", 0);
        assert_eq!(child.depth_actual, 1);
        assert_eq!(child.depth_effective, 1);

        let grandchild = child.child("http://other.test/b", 1);
        assert_eq!(grandchild.depth_actual, 2);
        assert_eq!(grandchild.depth_effective, 2);
    }

    #[tokio::test]
    async fn test_push_pop_fifo() {
        let frontier = Frontier::with_capacity(10);
        assert!(frontier.push(FrontierEntry::seed("http://a.test")).await);
        assert!(frontier.push(FrontierEntry::seed("http://b.test")).await);

        match frontier.pop_timeout(Duration::from_millis(50)).await {
            PopResult::Entry(entry) => assert_eq!(entry.url, "http://a.test"),
            other => panic!("expected entry, got {other:?}"),
        }
        match frontier.pop_timeout(Duration::from_millis(50)).await {
            PopResult::Entry(entry) => assert_eq!(entry.url, "http://b.test"),
            other => panic!("expected entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pop_times_out_when_empty() {
        let frontier = Frontier::with_capacity(10);
        assert!(matches!(
            frontier.pop_timeout(Duration::from_millis(20)).await,
            PopResult::Empty
        ));
    }

    #[tokio::test]
    async fn test_pop_reports_closed() {
        let frontier = Frontier::with_capacity(10);
        frontier.close();
        assert!(matches!(
            frontier.pop_timeout(Duration::from_millis(20)).await,
            PopResult::Closed
        ));
    }

    #[tokio::test]
    async fn test_push_after_close_fails() {
        let frontier = Frontier::with_capacity(10);
        frontier.close();
        assert!(!frontier.push(FrontierEntry::seed("http://a.test")).await);
        assert_eq!(frontier.unfinished(), 0);
    }

    #[tokio::test]
    async fn test_unfinished_counts_held_entries() {
        let frontier = Frontier::with_capacity(10);
        frontier.push(FrontierEntry::seed("http://a.test")).await;
        assert_eq!(frontier.unfinished(), 1);

        let PopResult::Entry(_entry) = frontier.pop_timeout(Duration::from_millis(50)).await
        else {
            panic!("expected entry");
        };
        // Popped but not yet done.
        assert_eq!(frontier.unfinished(), 1);

        frontier.task_done();
        assert_eq!(frontier.unfinished(), 0);
    }
}

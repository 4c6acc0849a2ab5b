//! Batched producer/consumer buffer for captured frames.
//!
//! The playback loop [`enqueue`](ScreenshotQueue::enqueue)s cloned frames;
//! the drain task removes them in fixed-size batches. A condition variable
//! wakes the drain task as soon as a batch fills up instead of leaving it to
//! its next poll.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use crate::frame::Frame;

/// FIFO queue of captured frames with all-or-nothing batch removal.
///
/// The queue itself is unbounded; `batch_size` only decides when a drain
/// happens.
///
/// # Example
///
/// ```
/// use stillframe::{Frame, ScreenshotQueue};
///
/// let queue = ScreenshotQueue::new();
/// for index in 0..3 {
///     queue.enqueue(Frame::from_packed_bgr(1, 1, vec![0, 0, 0], index).unwrap());
/// }
/// assert!(queue.take_batch(4).is_none());
/// let batch = queue.take_batch(2).unwrap();
/// assert_eq!(batch[0].position_index(), 0);
/// assert_eq!(queue.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct ScreenshotQueue {
    frames: Mutex<VecDeque<Frame>>,
    changed: Condvar,
}

impl ScreenshotQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Frame>> {
        // A panicking writer cannot leave a VecDeque half-updated.
        self.frames
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append a frame to the tail. Never blocks on the consumer.
    pub fn enqueue(&self, frame: Frame) {
        self.lock().push_back(frame);
        self.changed.notify_all();
    }

    /// Number of buffered frames.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Remove the `batch_size` oldest frames, or nothing if fewer are
    /// buffered.
    pub fn take_batch(&self, batch_size: usize) -> Option<Vec<Frame>> {
        Self::split_batch(&mut self.lock(), batch_size)
    }

    /// Like [`take_batch`](ScreenshotQueue::take_batch), but waits up to
    /// `timeout` for the batch to fill.
    ///
    /// Returns early with `None` when [`wake`](ScreenshotQueue::wake) is
    /// called, so a stop request never waits out the full timeout.
    pub fn wait_for_batch(&self, batch_size: usize, timeout: Duration) -> Option<Vec<Frame>> {
        let batch_size = batch_size.max(1);
        let mut frames = self.lock();
        if frames.len() < batch_size {
            frames = match self.changed.wait_timeout(frames, timeout) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        Self::split_batch(&mut frames, batch_size)
    }

    /// Wake any thread blocked in
    /// [`wait_for_batch`](ScreenshotQueue::wait_for_batch).
    pub fn wake(&self) {
        self.changed.notify_all();
    }

    /// Drop every buffered frame and return how many there were.
    pub fn clear(&self) -> usize {
        let mut frames = self.lock();
        let discarded = frames.len();
        frames.clear();
        discarded
    }

    fn split_batch(frames: &mut VecDeque<Frame>, batch_size: usize) -> Option<Vec<Frame>> {
        let batch_size = batch_size.max(1);
        if frames.len() < batch_size {
            return None;
        }
        Some(frames.drain(..batch_size).collect())
    }
}

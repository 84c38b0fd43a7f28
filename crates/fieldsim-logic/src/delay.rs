//! Latency- and throughput-bounded FIFO.
//!
//! Models a processing station: an item put at time `t` becomes available
//! strictly after `t + latency`, and when a throughput is set, two releases
//! are never closer than `1 / throughput` seconds.

use std::collections::VecDeque;

use crate::error::{SimError, SimResult};

#[derive(Debug, Clone)]
pub struct DelayQueue<T> {
    latency: f64,
    throughput: Option<f64>,
    latest_time: f64,
    last_release: Option<f64>,
    entries: VecDeque<(T, f64)>,
}

impl<T> DelayQueue<T> {
    /// Queue with unlimited throughput.
    pub fn new(latency: f64) -> Self {
        Self {
            latency,
            throughput: None,
            latest_time: 0.0,
            last_release: None,
            entries: VecDeque::new(),
        }
    }

    /// Queue that releases at most `throughput` items per second.
    pub fn with_throughput(latency: f64, throughput: f64) -> Self {
        Self {
            throughput: Some(throughput),
            ..Self::new(latency)
        }
    }

    pub fn latency(&self) -> f64 {
        self.latency
    }

    pub fn throughput(&self) -> Option<f64> {
        self.throughput
    }

    /// Time of the most recent release, if anything has been released.
    pub fn last_release(&self) -> Option<f64> {
        self.last_release
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Enqueue `item` at `time`. Times must be non-decreasing.
    pub fn put(&mut self, item: T, time: f64) -> SimResult<()> {
        if time < self.latest_time {
            return Err(SimError::TimeWentBackwards {
                time,
                latest: self.latest_time,
            });
        }
        self.latest_time = time;
        self.entries.push_back((item, time));
        Ok(())
    }

    /// Release the oldest item if it is due as of `as_of`.
    pub fn get(&mut self, as_of: f64) -> SimResult<Option<T>> {
        let Some(&(_, item_time)) = self.entries.front() else {
            return Ok(None);
        };

        // Only a throughput-limited queue cares about the release clock.
        if let (Some(throughput), Some(last_release)) = (self.throughput, self.last_release) {
            if as_of < last_release {
                return Err(SimError::ReleaseBeforeLastRelease {
                    as_of,
                    last_release,
                });
            }
            if as_of - last_release < 1.0 / throughput {
                return Ok(None);
            }
        }

        if as_of > item_time + self.latency {
            self.last_release = Some(as_of);
            Ok(self.entries.pop_front().map(|(item, _)| item))
        } else {
            Ok(None)
        }
    }

    /// Release everything `get` would release right now, oldest first.
    pub fn select(&mut self, as_of: f64) -> SimResult<Vec<T>> {
        let mut released = Vec::new();
        while let Some(item) = self.get(as_of)? {
            released.push(item);
        }
        Ok(released)
    }

    /// Items still waiting, oldest first, with their enqueue times.
    pub fn iter(&self) -> impl Iterator<Item = (&T, f64)> + '_ {
        self.entries.iter().map(|(item, t)| (item, *t))
    }
}

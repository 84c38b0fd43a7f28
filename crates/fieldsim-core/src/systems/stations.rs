//! Processing stations: delay queues that hold bodies off the field and
//! return them at a fixed point.

use fieldsim_logic::config::StationConfig;
use fieldsim_logic::delay::DelayQueue;
use fieldsim_logic::{SimResult, Vec3};

use crate::components::BodyRecord;

#[derive(Debug, Clone)]
pub struct Station {
    name: &'static str,
    queue: DelayQueue<BodyRecord>,
    return_point: Vec3,
    return_velocity: Vec3,
}

impl Station {
    pub fn new(name: &'static str, config: &StationConfig) -> Self {
        let queue = match config.throughput {
            Some(throughput) => DelayQueue::with_throughput(config.latency_s, throughput),
            None => DelayQueue::new(config.latency_s),
        };
        Self {
            name,
            queue,
            return_point: config.return_point,
            return_velocity: config.return_velocity,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn queue(&self) -> &DelayQueue<BodyRecord> {
        &self.queue
    }

    pub fn admit(&mut self, record: BodyRecord, time: f64) -> SimResult<()> {
        self.queue.put(record, time)
    }

    /// Everything due as of `as_of`, moved to the return point with the
    /// return velocity.
    pub fn release(&mut self, as_of: f64) -> SimResult<Vec<BodyRecord>> {
        let mut released = self.queue.select(as_of)?;
        for record in &mut released {
            record.body.position = self.return_point;
            record.body.velocity = self.return_velocity;
        }
        Ok(released)
    }
}

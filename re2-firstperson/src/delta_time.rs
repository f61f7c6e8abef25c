use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

/// Upper bound on the frame delta fed into the smoothing, so hitches
/// (alt-tab, loading screens) don't make the camera overshoot.
pub const MAX_DELTA_TIME: f32 = 0.1;

pub fn clamp_delta(delta_time: f32) -> f32 {
    delta_time.min(MAX_DELTA_TIME)
}

/// Wall clock delta per component. Each key gets its own timeline, since
/// different transforms update at different points of the frame.
pub struct DeltaTimer<K> {
    update_times: HashMap<K, Instant>,
    delta_times: HashMap<K, f32>,
}

impl<K: Hash + Eq + Copy> DeltaTimer<K> {
    pub fn new() -> Self {
        Self {
            update_times: HashMap::new(),
            delta_times: HashMap::new(),
        }
    }

    pub fn update(&mut self, key: K) -> f32 {
        self.update_at(key, Instant::now())
    }

    /// Seconds since the previous update of `key`. A key with no previous
    /// update counts as a full `MAX_DELTA_TIME` frame, so the first frame
    /// after a reset already moves the smoothing.
    pub fn update_at(&mut self, key: K, now: Instant) -> f32 {
        let delta_time = self
            .update_times
            .insert(key, now)
            .map_or(MAX_DELTA_TIME, |last| now.saturating_duration_since(last).as_secs_f32());

        self.delta_times.insert(key, delta_time);
        delta_time
    }

    pub fn last_delta(&self, key: K) -> Option<f32> {
        self.delta_times.get(&key).copied()
    }

    pub fn clear(&mut self) {
        self.update_times.clear();
        self.delta_times.clear();
    }
}

impl<K: Hash + Eq + Copy> Default for DeltaTimer<K> {
    fn default() -> Self {
        Self::new()
    }
}

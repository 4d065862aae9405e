/// Sends the day/night angle only after it drifts past a threshold.
#[derive(Clone, Debug)]
pub struct TimeSync {
    threshold: f32,
    last_sent: Option<f32>,
}

/// Shortest distance between two angles in degrees.
fn angle_delta(a: f32, b: f32) -> f32 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

impl TimeSync {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            last_sent: None,
        }
    }

    /// True when `angle` should go out now; records it as sent.
    pub fn should_send(&mut self, angle: f32) -> bool {
        match self.last_sent {
            Some(last) if angle_delta(angle, last) < self.threshold => false,
            _ => {
                self.last_sent = Some(angle);
                true
            }
        }
    }

    /// Forces the next call to send, e.g. after an ownership change.
    pub fn reset(&mut self) {
        self.last_sent = None;
    }
}

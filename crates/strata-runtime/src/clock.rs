use strata_geom::Vec3;

/// Fixed-step pacing for the simulation.
#[derive(Clone, Debug)]
pub struct TickClock {
    period: f32,
    speed: f32,
    max_ticks: u32,
    accum: f32,
    ticks: u64,
    capped: u64,
}

impl TickClock {
    /// `rate` in ticks per simulated second; `speed` scales real time.
    pub fn new(rate: f32, speed: f32, max_ticks: u32) -> Self {
        Self {
            period: 1.0 / rate.max(f32::EPSILON),
            speed: speed.max(0.0),
            max_ticks: max_ticks.max(1),
            accum: 0.0,
            ticks: 0,
            capped: 0,
        }
    }

    /// Seconds of simulated time per tick.
    pub fn period(&self) -> f32 {
        self.period
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Frames that hit the per-frame tick ceiling.
    pub fn capped_frames(&self) -> u64 {
        self.capped
    }

    /// Adds `dt` real seconds and returns how many ticks to run now.
    ///
    /// At most `max_ticks` per call. Backlog past that is kept for the next
    /// frame, up to one frame's worth.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.accum += dt.max(0.0) * self.speed;
        let mut n = 0;
        while self.accum >= self.period && n < self.max_ticks {
            self.accum -= self.period;
            n += 1;
        }
        self.ticks += u64::from(n);
        if self.accum >= self.period {
            self.capped += 1;
            log::warn!(
                target: "sched",
                "tick ceiling hit: ran {} ticks, {:.1} behind",
                n,
                self.accum / self.period
            );
            self.accum = self.accum.min(self.period * self.max_ticks as f32);
        }
        n
    }
}

/// Day/night angle in degrees and the lighting terms derived from it.
#[derive(Clone, Debug)]
pub struct DayCycle {
    angle: f32,
    /// Degrees per second.
    pub speed: f32,
    pub min_ambient: f32,
}

impl DayCycle {
    pub fn new(speed: f32, min_ambient: f32) -> Self {
        Self {
            angle: 0.0,
            speed,
            min_ambient,
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    pub fn set_angle(&mut self, angle: f32) {
        self.angle = angle.rem_euclid(360.0);
    }

    pub fn advance(&mut self, dt: f32) {
        self.set_angle(self.angle + dt * self.speed);
    }

    /// Direction the sunlight travels; rotates about the x axis.
    pub fn sun_forward(&self) -> Vec3 {
        let r = self.angle.to_radians();
        Vec3::new(0.0, -r.cos(), r.sin())
    }

    pub fn sun_intensity(&self) -> f32 {
        (0.5 - Vec3::UP.dot(self.sun_forward())).max(0.0)
    }

    pub fn ambient(&self) -> f32 {
        self.sun_intensity().max(self.min_ambient)
    }
}

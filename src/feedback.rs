use rand::seq::SliceRandom;
use rand::Rng;
use std::time::SystemTime;

/// How strong a clear feels. Yellow clears burst with less material than
/// green or red clears; the two levels are part of the game's contract even
/// though the drawing itself is cosmetic.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BurstIntensity {
    Minor,
    Major,
}

impl BurstIntensity {
    fn particle_count(self) -> usize {
        match self {
            BurstIntensity::Minor => 50,
            BurstIntensity::Major => 100,
        }
    }

    /// Horizontal velocity span; wider for major bursts.
    fn spread(self) -> f64 {
        match self {
            BurstIntensity::Minor => 1.5,
            BurstIntensity::Major => 3.0,
        }
    }
}

/// Single confetti particle with simple ballistic physics.
#[derive(Debug, Clone)]
pub struct BurstParticle {
    pub x: f64,
    pub y: f64,
    pub vel_x: f64,
    pub vel_y: f64,
    pub symbol: char,
    pub color_index: usize,
    pub age: f64,
    pub max_age: f64,
}

impl BurstParticle {
    fn new(x: f64, y: f64, spread: f64) -> Self {
        let mut rng = rand::thread_rng();

        Self {
            x,
            y,
            vel_x: rng.gen_range(-spread..spread),
            vel_y: rng.gen_range(-4.0..-1.0),
            symbol: *['*', '+', 'o', '.', '~'].choose(&mut rng).unwrap_or(&'*'),
            color_index: rng.gen_range(0..7),
            age: 0.0,
            max_age: rng.gen_range(1.5..3.0),
        }
    }

    /// Advance one timestep; returns false once the particle expires.
    fn update(&mut self, dt: f64) -> bool {
        self.x += self.vel_x * dt;
        self.y += self.vel_y * dt;
        self.vel_y += 15.0 * dt; // gravity

        self.age += dt;
        self.age < self.max_age
    }
}

/// Short-lived particle burst played when a target clears.
#[derive(Debug)]
pub struct FeedbackBurst {
    pub particles: Vec<BurstParticle>,
    pub start_time: SystemTime,
    pub duration: f64,
    pub is_active: bool,
    pub area_width: f64,
    pub area_height: f64,
}

impl FeedbackBurst {
    pub fn new() -> Self {
        Self {
            particles: Vec::new(),
            start_time: SystemTime::now(),
            duration: 2.0,
            is_active: false,
            area_width: 80.0,
            area_height: 24.0,
        }
    }

    pub fn start(&mut self, intensity: BurstIntensity, width: u16, height: u16) {
        let mut rng = rand::thread_rng();

        self.particles.clear();
        self.start_time = SystemTime::now();
        self.is_active = true;
        self.area_width = width as f64;
        self.area_height = height as f64;

        let center_x = width as f64 / 2.0;
        let origin_y = height as f64 * 0.6;

        for _ in 0..intensity.particle_count() {
            let offset_x = rng.gen_range(-6.0..6.0);
            let offset_y = rng.gen_range(-2.0..2.0);
            self.particles.push(BurstParticle::new(
                center_x + offset_x,
                origin_y + offset_y,
                intensity.spread(),
            ));
        }
    }

    pub fn update(&mut self) {
        if !self.is_active {
            return;
        }

        let elapsed = self.start_time.elapsed().unwrap_or_default().as_secs_f64();
        if elapsed >= self.duration {
            self.is_active = false;
            self.particles.clear();
            return;
        }

        let dt = 0.1; // fixed timestep, matches the event-loop tick
        let (width, height) = (self.area_width, self.area_height);
        self.particles.retain_mut(|particle| {
            let still_alive = particle.update(dt);

            let buffer = 5.0;
            let off_screen = particle.y > height + buffer
                || particle.x < -buffer
                || particle.x > width + buffer;
            still_alive && !off_screen
        });
    }
}

impl Default for FeedbackBurst {
    fn default() -> Self {
        Self::new()
    }
}

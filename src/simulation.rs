//! Simulation resource, per-frame step, and the Bevy plugin that drives it.
//!
//! [`Simulation`] owns every particle in one `Vec` and the spatial grid that
//! indexes them.  Each frame [`Simulation::step`] clears the grid, then for
//! each particle in order runs [`update_particle`] and re-inserts it at its
//! new position, so later particles collide against earlier ones that have
//! already moved this frame.
//!
//! ## Systems
//!
//! | System                            | Schedule | Purpose                                |
//! |-----------------------------------|----------|----------------------------------------|
//! | `setup_simulation`                | Startup  | Build grid, spawn particles, profiler  |
//! | `quit_input_system`               | Update   | Escape → `AppExit`                     |
//! | `particle_count_input_system`     | Update   | ArrowUp / ArrowDown add / remove       |
//! | `simulation_step_system`          | Update   | Profile the frame, then step           |
//! | `export_profile_on_exit_system`   | Last     | Write the FPS profile on shutdown      |

use crate::collision::{update_particle, CollisionTelemetry};
use crate::config::SimConfig;
use crate::constants::{MIN_PARTICLES, SPAWN_COLOUR_MIN};
use crate::error::SimResult;
use crate::particle::{Particle, Rgb};
use crate::profiler::FpsProfiler;
use crate::spatial_partition::{SpatialHashGrid, Viewport};
use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Ordering anchors for systems that read simulation state.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Keyboard handling that mutates the particle collection.
    Input,
    /// The per-frame update.
    Step,
}

pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        app.configure_sets(Update, (SimulationSet::Input, SimulationSet::Step).chain())
            .add_systems(Startup, setup_simulation)
            .add_systems(
                Update,
                (
                    quit_input_system,
                    particle_count_input_system.run_if(resource_exists::<Simulation>),
                )
                    .in_set(SimulationSet::Input),
            )
            .add_systems(
                Update,
                simulation_step_system
                    .run_if(resource_exists::<Simulation>)
                    .in_set(SimulationSet::Step),
            )
            .add_systems(
                Last,
                export_profile_on_exit_system.run_if(resource_exists::<FpsProfiler>),
            );
    }
}

// ── Spawning ──────────────────────────────────────────────────────────────────

/// Random particle factory for startup and ArrowUp requests.
#[derive(Debug, Clone)]
pub struct ParticleSpawner {
    rng: StdRng,
    viewport: Viewport,
    radius: f32,
    velocity_max: f32,
    spawn_speed: i32,
}

impl ParticleSpawner {
    pub fn new(config: &SimConfig, viewport: Viewport) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            viewport,
            radius: config.particle_radius,
            velocity_max: config.velocity_max,
            spawn_speed: config.spawn_speed.max(0),
        }
    }

    /// A particle at a random interior pixel with a random whole-number
    /// velocity and a light random colour.  Acceleration starts at zero.
    pub fn spawn(&mut self) -> Particle {
        let max_x = (self.viewport.width - 1.0).max(1.0);
        let max_y = (self.viewport.height - 1.0).max(1.0);
        let position = Vec2::new(
            self.rng.gen_range(1.0..=max_x).floor(),
            self.rng.gen_range(1.0..=max_y).floor(),
        );
        let speed = self.spawn_speed;
        let velocity = Vec2::new(
            self.rng.gen_range(-speed..=speed) as f32,
            self.rng.gen_range(-speed..=speed) as f32,
        );
        let colour = Rgb::new(
            self.rng.gen_range(SPAWN_COLOUR_MIN..=u8::MAX),
            self.rng.gen_range(SPAWN_COLOUR_MIN..=u8::MAX),
            self.rng.gen_range(SPAWN_COLOUR_MIN..=u8::MAX),
        );
        Particle::new(
            position,
            velocity,
            Vec2::ZERO,
            colour,
            self.velocity_max,
            self.radius,
        )
    }
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// Owned particle collection plus the grid that indexes it.
///
/// The grid stores indices into `particles`; any structural change to the
/// collection clears it, and it is rebuilt during the next step.
#[derive(Resource, Debug, Clone)]
pub struct Simulation {
    particles: Vec<Particle>,
    grid: SpatialHashGrid,
    spawner: ParticleSpawner,
}

impl Simulation {
    /// Build the grid from the configured viewport and spawn `particle_count` particles.
    pub fn new(config: &SimConfig) -> SimResult<Self> {
        config.validate()?;
        let mut sim = Self::with_particles(config, Vec::with_capacity(config.particle_count))?;
        sim.add_particles(config.particle_count);
        Ok(sim)
    }

    /// Build around an explicit particle set (no random spawning).
    pub fn with_particles(config: &SimConfig, particles: Vec<Particle>) -> SimResult<Self> {
        let viewport = Viewport::new(config.window_width as f32, config.window_height as f32);
        let grid = SpatialHashGrid::new(viewport, config.cell_size)?;
        Ok(Self {
            particles,
            grid,
            spawner: ParticleSpawner::new(config, viewport),
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.grid.viewport()
    }

    pub fn grid(&self) -> &SpatialHashGrid {
        &self.grid
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.particles.iter().map(|p| p.position)
    }

    /// Invoke `draw(position, radius, colour)` once per particle.
    pub fn draw(&self, mut draw: impl FnMut(Vec2, f32, Rgb)) {
        for p in &self.particles {
            draw(p.position, p.radius, p.colour);
        }
    }

    /// Advance every particle by `dt` seconds.  Returns the number of
    /// overlapping pairs resolved this step.
    pub fn step(&mut self, dt: f32, telemetry: &mut impl CollisionTelemetry) -> usize {
        let Self {
            particles, grid, ..
        } = self;
        let bounds = grid.viewport();

        grid.clear();
        let mut hits = 0;
        for index in 0..particles.len() {
            hits += update_particle(particles, index, grid, bounds, dt, telemetry);
            grid.insert(index, &particles[index]);
        }
        hits
    }

    pub fn push(&mut self, particle: Particle) {
        self.particles.push(particle);
        self.grid.clear();
    }

    /// Spawn `amount` random particles.
    pub fn add_particles(&mut self, amount: usize) {
        self.particles.reserve(amount);
        for _ in 0..amount {
            let particle = self.spawner.spawn();
            self.particles.push(particle);
        }
        self.grid.clear();
    }

    /// Remove the `amount` oldest particles.
    ///
    /// Rejected, leaving the collection untouched, when fewer than
    /// [`MIN_PARTICLES`] would remain.
    pub fn remove_particles(&mut self, amount: usize) -> bool {
        match self.particles.len().checked_sub(amount) {
            Some(remaining) if remaining >= MIN_PARTICLES => {
                self.particles.drain(..amount);
                self.grid.clear();
                true
            }
            _ => false,
        }
    }
}

// ── Systems ───────────────────────────────────────────────────────────────────

/// Startup: build the simulation and profiler from [`SimConfig`].
///
/// Bad geometry is reported and the app exits instead of panicking.
pub fn setup_simulation(
    mut commands: Commands,
    config: Res<SimConfig>,
    mut exit: MessageWriter<AppExit>,
) {
    match Simulation::new(&config) {
        Ok(sim) => {
            info!(
                "[SETUP] Spawned {} particles in a {}x{} grid of {} px cells",
                sim.particle_count(),
                sim.grid().columns(),
                sim.grid().rows(),
                sim.grid().cell_size()
            );
            commands.insert_resource(sim);
            commands.insert_resource(FpsProfiler::new(&config.profile_output));
        }
        Err(err) => {
            error!("Failed to build simulation: {err}");
            exit.write(AppExit::error());
        }
    }
}

/// Escape quits; the profile is exported by [`export_profile_on_exit_system`].
pub fn quit_input_system(keys: Res<ButtonInput<KeyCode>>, mut exit: MessageWriter<AppExit>) {
    if keys.just_pressed(KeyCode::Escape) {
        exit.write(AppExit::Success);
    }
}

/// ArrowUp / ArrowDown add or remove `particle_step` particles.
pub fn particle_count_input_system(
    keys: Res<ButtonInput<KeyCode>>,
    config: Res<SimConfig>,
    mut sim: ResMut<Simulation>,
) {
    let step = config.particle_step;
    if keys.just_pressed(KeyCode::ArrowUp) {
        sim.add_particles(step);
        info!("Particle count: {}", sim.particle_count());
    }
    if keys.just_pressed(KeyCode::ArrowDown) {
        if sim.remove_particles(step) {
            info!("Particle count: {}", sim.particle_count());
        } else {
            warn!(
                "Cannot remove {} particles: only {} left",
                step,
                sim.particle_count()
            );
        }
    }
}

/// Profile the frame, then advance the simulation by the frame's delta time.
pub fn simulation_step_system(
    time: Res<Time>,
    mut sim: ResMut<Simulation>,
    mut profiler: ResMut<FpsProfiler>,
) {
    let dt = time.delta_secs();
    profiler.run(sim.particle_count(), dt, time.elapsed_secs());
    sim.step(dt, &mut *profiler);
}

/// Write the FPS profile once when the app is shutting down.
pub fn export_profile_on_exit_system(
    mut exits: MessageReader<AppExit>,
    profiler: Res<FpsProfiler>,
) {
    if exits.read().next().is_none() {
        return;
    }
    match profiler.export() {
        Ok(path) => info!("Exported FPS profile to {}", path.display()),
        Err(err) => error!("{err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimConfig {
        SimConfig {
            window_width: 320,
            window_height: 240,
            particle_count: 50,
            particle_step: 10,
            seed: Some(1234),
            ..Default::default()
        }
    }

    fn ball(x: f32, y: f32, vx: f32, vy: f32, radius: f32) -> Particle {
        Particle {
            position: Vec2::new(x, y),
            velocity: Vec2::new(vx, vy),
            radius,
            ..Default::default()
        }
    }

    #[test]
    fn new_spawns_configured_count_inside_viewport() {
        let sim = Simulation::new(&config()).unwrap();
        assert_eq!(sim.particle_count(), 50);
        for p in sim.particles() {
            assert!(sim.viewport().contains(p.position), "{:?}", p.position);
            assert!(p.velocity.x.abs() <= 50.0 && p.velocity.y.abs() <= 50.0);
            assert_eq!(p.acceleration, Vec2::ZERO);
            assert!(p.colour.r >= SPAWN_COLOUR_MIN);
        }
    }

    #[test]
    fn seeded_runs_are_reproducible() {
        let a = Simulation::new(&config()).unwrap();
        let b = Simulation::new(&config()).unwrap();
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn step_rebuilds_grid_with_every_particle() {
        let mut sim = Simulation::new(&config()).unwrap();
        let mut checks = 0u64;
        sim.step(1.0 / 60.0, &mut checks);
        for (i, p) in sim.particles().iter().enumerate() {
            for cell in sim.grid().cell_indices_for(p).iter() {
                assert!(sim.grid().bucket(cell).unwrap().contains(&i));
            }
        }
    }

    #[test]
    fn step_resolves_overlap_and_counts_checks() {
        let particles = vec![
            ball(100.0, 100.0, 10.0, 0.0, 5.0),
            ball(103.0, 100.0, -10.0, 0.0, 5.0),
        ];
        let mut sim = Simulation::with_particles(&config(), particles).unwrap();
        let mut checks = 0u64;
        let hits = sim.step(0.0, &mut checks);
        // Particle 0 sees an empty grid; particle 1 sees particle 0.
        assert_eq!((hits, checks), (1, 1));
        let gap = (sim.particles()[0].position - sim.particles()[1].position).length();
        assert!((gap - 10.0).abs() < 1e-4);
    }

    #[test]
    fn step_reflects_particle_outside_viewport() {
        let particles = vec![ball(325.0, 100.0, 40.0, 0.0, 1.0)];
        let mut sim = Simulation::with_particles(&config(), particles).unwrap();
        let mut checks = 0u64;
        sim.step(0.0, &mut checks);
        assert_eq!(sim.particles()[0].position.x, 319.0);
        assert_eq!(sim.particles()[0].velocity.x, -40.0);
    }

    #[test]
    fn particles_stay_near_viewport_over_many_steps() {
        let mut sim = Simulation::new(&config()).unwrap();
        let mut checks = 0u64;
        for _ in 0..600 {
            sim.step(1.0 / 60.0, &mut checks);
        }
        // Corrections can nudge a particle past an edge until its next reflection.
        let margin = 5.0;
        for p in sim.particles() {
            assert!(p.position.is_finite());
            assert!(p.position.x > -margin && p.position.x < 320.0 + margin);
            assert!(p.position.y > -margin && p.position.y < 240.0 + margin);
        }
        assert!(checks > 0);
    }

    #[test]
    fn add_and_remove_particles() {
        let mut sim = Simulation::new(&config()).unwrap();
        sim.add_particles(10);
        assert_eq!(sim.particle_count(), 60);
        assert!(sim.remove_particles(59));
        assert_eq!(sim.particle_count(), 1);
        assert!(sim.grid().is_empty());
    }

    #[test]
    fn removal_below_floor_is_rejected() {
        let mut sim = Simulation::new(&config()).unwrap();
        let before = sim.particles().to_vec();
        assert!(!sim.remove_particles(50));
        assert!(!sim.remove_particles(500));
        assert_eq!(sim.particles(), before.as_slice());
    }

    #[test]
    fn removal_drops_oldest_first() {
        let particles = vec![
            ball(10.0, 10.0, 0.0, 0.0, 1.0),
            ball(20.0, 10.0, 0.0, 0.0, 1.0),
            ball(30.0, 10.0, 0.0, 0.0, 1.0),
        ];
        let mut sim = Simulation::with_particles(&config(), particles).unwrap();
        assert!(sim.remove_particles(2));
        assert_eq!(sim.particles()[0].position.x, 30.0);
    }

    #[test]
    fn draw_visits_each_particle_once() {
        let sim = Simulation::new(&config()).unwrap();
        let mut seen = Vec::new();
        sim.draw(|pos, radius, _| seen.push((pos, radius)));
        assert_eq!(seen.len(), sim.particle_count());
        assert_eq!(seen[0].0, sim.particles()[0].position);
        assert_eq!(sim.positions().count(), sim.particle_count());
    }

    #[test]
    fn invalid_config_is_rejected() {
        let bad = SimConfig {
            cell_size: 0,
            ..config()
        };
        assert!(Simulation::new(&bad).is_err());
    }
}

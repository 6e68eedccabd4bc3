use std::path::{Path, PathBuf};

use character_collision::CollisionProfile;
use character_motor_locomotion::math::look_rotation;
use character_motor_locomotion::{CameraBasis, CameraBasisProvider, DirectionKeys, LocomotionConfig};
use clap::{Parser, Subcommand};
use ecs::{
    hash_entity_state, new_world, spawn_character, ActiveCamera, EcsSchedules, InputCommand,
    InputStream,
};
use engine_core::logging::{self, LogLevel};
use physics_rapier::PhysicsWorld;
use player_camera::{OrbitSettings, PlayerCamera};
use player_controller::{DirectInputAdapter, PlayerController, RawInput};
use rapier3d::math::{Isometry, Rotation, Translation, Vector};
use rapier3d::prelude::Real;

const EXIT_SUCCESS: i32 = 0;
const EXIT_USAGE: i32 = 2;
const EXIT_CONFIG: i32 = 3;
const EXIT_REPLAY: i32 = 4;

const GRAVITY_Y: Real = -50.0;
const FLOOR_HALF_EXTENT: Real = 500.0;

#[derive(Parser)]
#[command(name = "tools", version, about = "Locomotion tools CLI")]
struct Cli {
    /// error, warn, info or debug.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    Simulate(SimulateArgs),
    Batch(BatchArgs),
    CheckConfig {
        #[arg(long, value_name = "PATH")]
        config: PathBuf,
    },
}

#[derive(Parser)]
struct SimulateArgs {
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 120)]
    ticks: u32,

    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: Real,

    /// Forward axis held every tick.
    #[arg(long, default_value_t = 1.0, allow_hyphen_values = true)]
    forward: Real,

    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    lateral: Real,

    /// Tick at which input flips to the opposite direction.
    #[arg(long)]
    reverse_at: Option<u32>,

    /// Ticks on which the jump button is pressed.
    #[arg(long, value_delimiter = ',')]
    jump_at: Vec<u32>,

    /// Camera yaw in degrees; 0 looks down -Z, 90 down +X.
    #[arg(long, default_value_t = 0.0, allow_hyphen_values = true)]
    yaw: Real,

    /// Print one line per this many ticks.
    #[arg(long, default_value_t = 10)]
    every: u32,
}

#[derive(Parser)]
struct BatchArgs {
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long, default_value_t = 16)]
    characters: usize,

    #[arg(long, default_value_t = 600)]
    ticks: usize,

    /// Shared camera yaw in degrees; omit to map input straight to world axes.
    #[arg(long, allow_hyphen_values = true)]
    yaw: Option<Real>,
}

fn main() {
    let cli = Cli::parse();
    match LogLevel::parse(&cli.log_level) {
        Some(level) => logging::set_max_level(level),
        None => {
            eprintln!("unknown log level: {}", cli.log_level);
            std::process::exit(EXIT_USAGE);
        }
    }
    let exit_code = match cli.command {
        Commands::Simulate(args) => run_simulate(args),
        Commands::Batch(args) => run_batch(args),
        Commands::CheckConfig { config } => run_check_config(&config),
    };
    std::process::exit(exit_code);
}

fn load_config(path: Option<&Path>) -> Result<LocomotionConfig, i32> {
    let Some(path) = path else {
        return Ok(LocomotionConfig::default());
    };
    match LocomotionConfig::load(path) {
        Ok(config) => {
            logging::info(format!("loaded locomotion config {}", path.display()));
            Ok(config)
        }
        Err(err) => {
            logging::error(format!("{}: {}", path.display(), err));
            Err(EXIT_CONFIG)
        }
    }
}

fn run_check_config(path: &Path) -> i32 {
    match load_config(Some(path)) {
        Ok(config) => {
            match config.to_toml() {
                Ok(text) => println!("{}", text.trim_end()),
                Err(err) => logging::warn(format!("config echo failed: {}", err)),
            }
            println!("config ok: {}", path.display());
            EXIT_SUCCESS
        }
        Err(code) => code,
    }
}

fn run_simulate(args: SimulateArgs) -> i32 {
    if !(args.dt > 0.0) {
        eprintln!("--dt must be > 0");
        return EXIT_USAGE;
    }
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let mut world = PhysicsWorld::new(Vector::new(0.0, GRAVITY_Y, 0.0));
    world.insert_ground_slab(FLOOR_HALF_EXTENT);
    world.step(args.dt);

    let profile = CollisionProfile::default();
    let mut camera = PlayerCamera::new(OrbitSettings::default());
    camera.set_look(args.yaw.to_radians(), 0.0);
    // Start facing where the camera looks so forward input is not a reversal.
    let facing = camera
        .camera_basis()
        .and_then(|basis| look_rotation(basis.forward()))
        .unwrap_or_else(Rotation::identity);
    let start = Isometry::from_parts(
        Translation::new(0.0, profile.foot_offset() + 0.05, 0.0),
        facing,
    );
    let mut controller =
        PlayerController::new(DirectInputAdapter::default(), config, profile, camera, start);

    logging::info(format!(
        "simulate: {} ticks at dt {:.4} (top speed {})",
        args.ticks, args.dt, config.top_speed
    ));
    println!("tick,x,y,z,speed,vertical,grounded,mode");
    let every = args.every.max(1);
    for tick in 0..args.ticks {
        let sign = match args.reverse_at {
            Some(at) if tick >= at => -1.0,
            _ => 1.0,
        };
        let raw = RawInput {
            keys: DirectionKeys::default(),
            move_axis: [args.lateral * sign, args.forward * sign],
            jump: args.jump_at.contains(&tick),
            look_delta: [0.0, 0.0],
            scroll: 0.0,
        };
        let frame = controller.tick(&world, raw, args.dt);
        if tick % every == 0 || tick + 1 == args.ticks {
            let p = frame.position.translation.vector;
            let state = frame.report.output.state;
            println!(
                "{},{:.3},{:.3},{:.3},{:.3},{:.3},{},{:?}",
                tick, p.x, p.y, p.z, frame.speed, state.vertical_velocity, frame.grounded, state.mode
            );
        }
    }
    EXIT_SUCCESS
}

fn batch_frames(characters: usize, ticks: usize) -> Vec<Vec<InputCommand>> {
    (0..ticks)
        .map(|tick| {
            (0..characters)
                .map(|slot| {
                    let phase = (tick / 40 + slot) % 4;
                    let move_axis = match phase {
                        0 => [0.0, 1.0],
                        1 => [1.0, 0.0],
                        2 => [0.0, -1.0],
                        _ => [0.0, 0.0],
                    };
                    InputCommand {
                        move_axis,
                        jump: (tick + slot * 7) % 90 == 0,
                    }
                })
                .collect()
        })
        .collect()
}

fn replay_hash(
    config: LocomotionConfig,
    camera: Option<CameraBasis>,
    characters: usize,
    ticks: usize,
) -> u64 {
    let mut world = new_world();
    world.insert_resource(InputStream::new(batch_frames(characters, ticks)));
    world.insert_resource(ActiveCamera(camera));
    let entities: Vec<_> = (0..characters)
        .map(|slot| {
            let origin = Vector::new(slot as Real * 4.0, 0.0, 0.0);
            spawn_character(&mut world, config, origin, Vector::z(), slot)
        })
        .collect();
    let mut schedules = EcsSchedules::new();
    for _ in 0..ticks {
        schedules.run_fixed(&mut world);
    }
    entities.iter().fold(0u64, |acc, entity| {
        let hash = hash_entity_state(&world, *entity).unwrap_or_default();
        acc.rotate_left(5) ^ hash
    })
}

fn run_batch(args: BatchArgs) -> i32 {
    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(code) => return code,
    };
    logging::info(format!(
        "batch: {} characters x {} ticks",
        args.characters, args.ticks
    ));
    let camera = args.yaw.map(|yaw| CameraBasis::from_yaw(yaw.to_radians()));
    let first = replay_hash(config, camera, args.characters, args.ticks);
    let second = replay_hash(config, camera, args.characters, args.ticks);
    println!("replay hash: {:016x} / {:016x}", first, second);
    if first != second {
        logging::error("batch replay diverged");
        return EXIT_REPLAY;
    }
    println!("batch replay ok");
    EXIT_SUCCESS
}

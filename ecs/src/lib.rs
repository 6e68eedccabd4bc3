//! Batch locomotion over `bevy_ecs`: one motion record per character, advanced by a
//! fixed-step schedule.
#![forbid(unsafe_code)]

use std::hash::{Hash, Hasher};

use bevy_ecs::prelude::*;
use bevy_ecs::schedule::{Schedule, ScheduleLabel};
use character_motor_locomotion::{
    sample_axes, tick, CameraBasis, LocomotionConfig, MotionState, MoveReport, RigidMotionMover,
    TickInput,
};
use rapier3d::math::Vector;
use rapier3d::prelude::Real;

#[derive(Component, Copy, Clone, Debug, PartialEq)]
pub struct Motion(pub MotionState);

#[derive(Component, Copy, Clone, Debug, PartialEq)]
pub struct Tuning(pub LocomotionConfig);

/// Feet position in world space.
#[derive(Component, Copy, Clone, Debug, Default, PartialEq)]
pub struct Position(pub Vector<Real>);

#[derive(Component, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct GroundContact(pub bool);

#[derive(Component, Copy, Clone, Debug, Default, PartialEq)]
pub struct Intent(pub TickInput);

/// Column of each input frame this character reads, plus jump edge state.
#[derive(Component, Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct InputSlot {
    pub index: usize,
    jump_held: bool,
}

impl InputSlot {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            jump_held: false,
        }
    }
}

#[derive(Resource, Copy, Clone, Debug)]
pub struct FixedTimeStep {
    pub dt_seconds: Real,
}

impl Default for FixedTimeStep {
    fn default() -> Self {
        Self {
            dt_seconds: 1.0 / 60.0,
        }
    }
}

/// Camera basis shared by every character this tick; `None` means world axes.
#[derive(Resource, Copy, Clone, Debug, Default)]
pub struct ActiveCamera(pub Option<CameraBasis>);

#[derive(Resource, Copy, Clone, Debug, Default)]
pub struct GroundPlane {
    pub height: Real,
}

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct InputCommand {
    pub move_axis: [Real; 2],
    pub jump: bool,
}

/// Recorded input: one frame per fixed tick, one command per input slot.
#[derive(Resource, Debug, Default)]
pub struct InputStream {
    frames: Vec<Vec<InputCommand>>,
    cursor: usize,
}

impl InputStream {
    pub fn new(frames: Vec<Vec<InputCommand>>) -> Self {
        Self { frames, cursor: 0 }
    }

    fn next(&mut self) -> Option<&[InputCommand]> {
        let frame = self.frames.get(self.cursor)?;
        self.cursor += 1;
        Some(frame.as_slice())
    }
}

/// Infinite horizontal floor; anything pushed below it is clamped back on top.
pub struct PlaneMover<'a> {
    pub position: &'a mut Vector<Real>,
    pub ground_height: Real,
}

impl RigidMotionMover for PlaneMover<'_> {
    fn move_by(&mut self, displacement: Vector<Real>, _dt: Real) -> MoveReport {
        let before = *self.position;
        let mut next = before + displacement;
        let grounded = next.y <= self.ground_height;
        if grounded {
            next.y = self.ground_height;
        }
        *self.position = next;
        MoveReport {
            translation: next - before,
            grounded,
        }
    }
}

#[derive(ScheduleLabel, Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct FixedUpdate;

pub struct EcsSchedules {
    fixed: Schedule,
}

impl EcsSchedules {
    pub fn new() -> Self {
        let mut fixed = Schedule::new(FixedUpdate);
        fixed.add_systems((apply_input, advance_locomotion).chain());
        Self { fixed }
    }

    pub fn run_fixed(&mut self, world: &mut World) {
        self.fixed.run(world);
    }
}

impl Default for EcsSchedules {
    fn default() -> Self {
        Self::new()
    }
}

pub fn new_world() -> World {
    let mut world = World::new();
    world.insert_resource(FixedTimeStep::default());
    world.insert_resource(ActiveCamera::default());
    world.insert_resource(GroundPlane::default());
    world.insert_resource(InputStream::default());
    world
}

pub fn spawn_character(
    world: &mut World,
    config: LocomotionConfig,
    position: Vector<Real>,
    forward: Vector<Real>,
    slot: usize,
) -> Entity {
    world
        .spawn((
            Motion(MotionState::new(forward)),
            Tuning(config),
            Position(position),
            GroundContact(false),
            Intent::default(),
            InputSlot::new(slot),
        ))
        .id()
}

fn apply_input(mut query: Query<(&mut Intent, &mut InputSlot)>, mut stream: ResMut<InputStream>) {
    // Past the end of the recording every character goes idle.
    let frame = stream.next().map(|frame| frame.to_vec()).unwrap_or_default();
    for (mut intent, mut slot) in &mut query {
        let command = frame.get(slot.index).copied().unwrap_or_default();
        let jump_pressed = command.jump && !slot.jump_held;
        slot.jump_held = command.jump;
        intent.0 = TickInput {
            intent: sample_axes(command.move_axis),
            jump_pressed,
        };
    }
}

fn advance_locomotion(
    mut query: Query<(
        &mut Motion,
        &Tuning,
        &Intent,
        &mut Position,
        &mut GroundContact,
    )>,
    time: Res<FixedTimeStep>,
    camera: Res<ActiveCamera>,
    ground: Res<GroundPlane>,
) {
    let dt = time.dt_seconds;
    let basis = camera.0;
    for (mut motion, tuning, intent, mut position, mut contact) in &mut query {
        let output = tick(&motion.0, &tuning.0, intent.0, basis.as_ref(), contact.0, dt);
        let mut mover = PlaneMover {
            position: &mut position.0,
            ground_height: ground.height,
        };
        let report = mover.move_by(output.displacement, dt);
        motion.0 = output.state;
        contact.0 = report.grounded;
    }
}

pub fn hash_entity_state(world: &World, entity: Entity) -> Option<u64> {
    let position = world.get::<Position>(entity)?;
    let motion = world.get::<Motion>(entity)?;
    let contact = world.get::<GroundContact>(entity)?;
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    let state = &motion.0;
    hash_vector(&position.0, &mut hasher);
    hash_vector(&state.planar_velocity, &mut hasher);
    state.vertical_velocity.to_bits().hash(&mut hasher);
    hash_vector(&state.move_heading, &mut hasher);
    hash_vector(&state.last_committed_direction, &mut hasher);
    for coord in state.orientation.coords.iter() {
        coord.to_bits().hash(&mut hasher);
    }
    state.mode.hash(&mut hasher);
    contact.0.hash(&mut hasher);
    Some(hasher.finish())
}

fn hash_vector(vec: &Vector<Real>, hasher: &mut impl Hasher) {
    vec.x.to_bits().hash(hasher);
    vec.y.to_bits().hash(hasher);
    vec.z.to_bits().hash(hasher);
}

use glam::Vec3;
use procedural_walk::{
    InstanceArena, LegConfig, Pose, StepEvent, TerrainWorld, TickInput, Transform, WalkConfig,
};
use std::error::Error;

const FRAME_TIME: f32 = 1.0 / 60.0;
const WALK_SPEED: f32 = 1.0;
const DURATION: f32 = 12.0;

/// Pelvis plus two three-bone legs, model space, feet resting on y = 0.
fn biped_rest_pose() -> Pose {
    let mut bones = vec![Transform::from_position(Vec3::new(0.0, 0.95, 0.0))];
    for side in [1.0, -1.0] {
        let x = 0.1 * side;
        bones.push(Transform::from_position(Vec3::new(x, 0.9, 0.0)));
        bones.push(Transform::from_position(Vec3::new(x, 0.5, 0.03)));
        bones.push(Transform::from_position(Vec3::new(x, 0.08, 0.0)));
    }
    Pose::new(bones)
}

fn biped_config() -> WalkConfig {
    WalkConfig::default()
        .with_leg(LegConfig::new("left", 1, 2, 3))
        .with_leg(LegConfig::new("right", 4, 5, 6).with_start_delay(0.4))
}

/// Flat run, a gap, a low step and a ramp, laid out along +Z.
fn course() -> TerrainWorld {
    let mut world = TerrainWorld::new();
    world
        .add_box(Vec3::new(0.0, -0.5, 1.5), Vec3::new(2.0, 0.5, 2.5))
        .add_box(Vec3::new(0.0, -0.5, 7.25), Vec3::new(2.0, 0.5, 2.75))
        .add_box(Vec3::new(0.0, 0.05, 6.5), Vec3::new(2.0, 0.05, 0.5));

    let (start, end, rise) = (10.0, 12.0, 0.25);
    let a = Vec3::new(-2.0, 0.0, start);
    let b = Vec3::new(2.0, 0.0, start);
    let c = Vec3::new(2.0, rise, end);
    let d = Vec3::new(-2.0, rise, end);
    world.add_triangle(a, b, c).add_triangle(a, c, d);
    world
}

fn load_config() -> Result<WalkConfig, Box<dyn Error>> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("loading walk config from {}", path);
            let text = std::fs::read_to_string(&path)?;
            Ok(WalkConfig::from_json(&text)?)
        }
        None => Ok(biped_config()),
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let rest_pose = biped_rest_pose();
    let world = course();

    let mut arena = InstanceArena::new();
    let handle = arena.spawn(load_config()?, &rest_pose)?;

    let velocity = Vec3::Z * WALK_SPEED;
    let mut root = Transform::IDENTITY;
    let mut time = 0.0;
    let (mut steps, mut degraded_ticks) = (0usize, 0usize);

    while time < DURATION {
        let input = TickInput::new(&rest_pose, &world, FRAME_TIME)
            .with_root(root)
            .with_velocity(velocity);
        let Some(output) = arena.tick(handle, &input) else {
            log::error!("instance {:?} vanished", handle);
            break;
        };

        for event in &output.events {
            match *event {
                StepEvent::FootUp { leg, position } => {
                    log::debug!("t={:.2} leg {} up at {:?}", time, leg, position);
                }
                StepEvent::FootDown {
                    leg,
                    position,
                    grounded,
                    ..
                } => {
                    steps += 1;
                    log::info!(
                        "t={:.2} leg {} down at ({:.2}, {:.2}, {:.2}){}",
                        time,
                        leg,
                        position.x,
                        position.y,
                        position.z,
                        if grounded { "" } else { " [no ground]" }
                    );
                }
            }
        }
        if !output.degradations.is_empty() {
            degraded_ticks += 1;
            log::debug!("t={:.2} {:?}", time, output.degradations);
        }
        if output.body_offset < -0.01 {
            log::trace!("t={:.2} body lowered by {:.3}", time, -output.body_offset);
        }

        root.position += velocity * FRAME_TIME;
        time += FRAME_TIME;
    }

    log::info!(
        "walked {:.1} m in {:.1} s: {} steps, {} degraded ticks",
        root.position.z,
        DURATION,
        steps,
        degraded_ticks
    );
    Ok(())
}

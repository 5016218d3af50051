//! Aim director: raw input → clamped, snapped, smoothed weapon rotation.
//!
//! # Variants
//!
//! - `Planar`: XY plane, rotation about Z, reference axis +X. A flipped
//!   owner mirrors the aim horizontally; angles are measured from the
//!   facing direction (positive = up).
//! - `Spatial`: XZ ground plane, yaw about Y (0 = -Z), optional pitch.
//!   Angles are measured from the owner's yaw.
//!
//! Pipeline per tick: raw vector → facing-relative angle → snap (2/4/8)
//! → + additional angle → clamp `[min, max]` → slerp toward target.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::weapon::OwnerFacing;

/// Inputs shorter than this are treated as zero.
const MIN_AIM_LENGTH: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum AimVariant {
    #[default]
    Planar,
    Spatial,
}

impl AimVariant {
    /// Zero-angle direction of the weapon rotation.
    pub fn reference_axis(&self) -> Vec3 {
        match self {
            AimVariant::Planar => Vec3::X,
            AimVariant::Spatial => Vec3::NEG_Z,
        }
    }

    /// Axis projectile spread rotates around.
    pub fn spread_axis(&self) -> Vec3 {
        match self {
            AimVariant::Planar => Vec3::Z,
            AimVariant::Spatial => Vec3::Y,
        }
    }

    /// Movement-stick vector → world direction.
    pub fn stick_to_world(&self, stick: Vec2) -> Vec3 {
        match self {
            AimVariant::Planar => Vec3::new(stick.x, stick.y, 0.0),
            AimVariant::Spatial => Vec3::new(stick.x, 0.0, -stick.y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum AimSource {
    /// No input: facing forward
    Disabled,
    #[default]
    PrimaryMovement,
    SecondaryMovement,
    SecondaryThenPrimary,
    PrimaryThenSecondary,
    /// Pointer ray projected onto the ground plane
    Pointer,
    /// `AimState::script_aim`
    Script,
    /// Primary stick relative to the camera's forward
    CameraRelative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum RotationMode {
    #[default]
    Free,
    /// Spatial only: pitch discarded
    LockedAxis,
    Strict2,
    Strict4,
    Strict8,
}

impl RotationMode {
    /// Snap step in degrees (`None` = free rotation).
    pub fn snap_step(&self) -> Option<f32> {
        match self {
            RotationMode::Free | RotationMode::LockedAxis => None,
            RotationMode::Strict2 => Some(180.0),
            RotationMode::Strict4 => Some(90.0),
            RotationMode::Strict8 => Some(45.0),
        }
    }

    pub fn keeps_pitch(&self) -> bool {
        matches!(self, RotationMode::Free)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct AimConfig {
    pub source: AimSource,
    pub rotation_mode: RotationMode,
    /// Degrees, facing-relative
    pub min_angle: f32,
    pub max_angle: f32,
    /// Slerp factor per second (0 = instant)
    pub rotation_speed: f32,
    /// Dead zone for stick input
    pub aim_threshold: f32,
    /// Height of the plane pointer rays are projected onto (spatial)
    pub ground_height: f32,
}

impl Default for AimConfig {
    fn default() -> Self {
        Self {
            source: AimSource::PrimaryMovement,
            rotation_mode: RotationMode::Free,
            min_angle: -180.0,
            max_angle: 180.0,
            rotation_speed: 0.0,
            aim_threshold: 0.1,
            ground_height: 0.0,
        }
    }
}

impl AimConfig {
    /// Right stick aims, left stick as fallback.
    pub fn twin_stick() -> Self {
        Self {
            source: AimSource::SecondaryThenPrimary,
            rotation_speed: 20.0,
            ..Self::default()
        }
    }

    /// Side-view shooter: front half-plane only.
    pub fn side_scroller() -> Self {
        Self {
            source: AimSource::PrimaryMovement,
            min_angle: -90.0,
            max_angle: 90.0,
            ..Self::default()
        }
    }

    pub fn pointer() -> Self {
        Self {
            source: AimSource::Pointer,
            aim_threshold: 0.0,
            ..Self::default()
        }
    }

    /// Clamp range with `min <= max` enforced.
    pub fn bounds(&self) -> (f32, f32) {
        (
            self.min_angle.min(self.max_angle),
            self.max_angle.max(self.min_angle),
        )
    }
}

/// Aim configuration of one weapon.
#[derive(Component, Debug, Clone, Copy, PartialEq, Default, Reflect)]
#[reflect(Component)]
#[require(AimState)]
pub struct AimDirector {
    pub variant: AimVariant,
    pub config: AimConfig,
}

impl AimDirector {
    pub fn planar(config: AimConfig) -> Self {
        Self {
            variant: AimVariant::Planar,
            config,
        }
    }

    pub fn spatial(config: AimConfig) -> Self {
        Self {
            variant: AimVariant::Spatial,
            config,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct PointerRay {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl PointerRay {
    /// Intersection with the horizontal plane `y = height`.
    pub fn hit_ground(&self, height: f32) -> Option<Vec3> {
        if self.direction.y.abs() < MIN_AIM_LENGTH {
            return None;
        }
        let t = (height - self.origin.y) / self.direction.y;
        (t >= 0.0).then(|| self.origin + self.direction * t)
    }
}

/// Raw aim inputs of an owner (written by the input source).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AimInput {
    pub primary: Vec2,
    pub secondary: Vec2,
    pub pointer: Option<PointerRay>,
    pub camera_forward: Vec3,
}

impl Default for AimInput {
    fn default() -> Self {
        Self {
            primary: Vec2::ZERO,
            secondary: Vec2::ZERO,
            pointer: None,
            camera_forward: Vec3::NEG_Z,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct AimState {
    pub variant: AimVariant,
    /// World aim direction after smoothing (normalized)
    pub current_aim: Vec3,
    /// Facing-independent aim (never mirrored)
    pub current_aim_absolute: Vec3,
    /// Degrees, in `[min, max]`; `[-max, -min]` for a flipped planar owner
    pub current_angle: f32,
    /// Degrees, always in `[min, max]`
    pub current_angle_relative: f32,
    pub current_rotation: Quat,
    /// Transient offset added before clamping (recoil kick, sway)
    pub additional_angle: f32,
    /// Direction used by `AimSource::Script`
    pub script_aim: Option<Vec3>,
    /// Overrides every source while set (auto-aim)
    pub script_override: Option<Vec3>,
    pub last_non_null: Option<Vec3>,
}

impl Default for AimState {
    fn default() -> Self {
        Self::new(AimVariant::Planar)
    }
}

impl AimState {
    pub fn new(variant: AimVariant) -> Self {
        Self {
            variant,
            current_aim: variant.reference_axis(),
            current_aim_absolute: variant.reference_axis(),
            current_angle: 0.0,
            current_angle_relative: 0.0,
            current_rotation: Quat::IDENTITY,
            additional_angle: 0.0,
            script_aim: None,
            script_override: None,
            last_non_null: None,
        }
    }

    /// Direction for spawned projectiles.
    pub fn fire_direction(&self) -> Vec3 {
        self.current_aim.normalize_or_zero()
    }

    /// One tick of the director.
    pub fn update(
        &mut self,
        director: &AimDirector,
        input: &AimInput,
        facing: OwnerFacing,
        origin: Vec3,
        delta: f32,
    ) {
        self.variant = director.variant;
        let config = &director.config;

        let raw = self
            .script_override
            .or_else(|| raw_aim(director, input, self.script_aim, origin));

        let direction = match raw {
            Some(direction) => {
                self.last_non_null = Some(direction);
                Some(direction)
            }
            None => self.last_non_null,
        };

        let (relative, pitch) = match direction {
            Some(direction) => relative_angle(director.variant, direction, facing),
            None => (0.0, 0.0),
        };

        let snapped = match config.rotation_mode.snap_step() {
            Some(step) => snap_angle(relative, step),
            None => relative,
        };

        let (min, max) = config.bounds();
        let clamped = (wrap_degrees(snapped + self.additional_angle)).clamp(min, max);
        let pitch = if config.rotation_mode.keeps_pitch() {
            pitch
        } else {
            0.0
        };

        let target = world_rotation(director.variant, clamped, pitch, facing);
        self.current_rotation = if config.rotation_speed <= 0.0 {
            target
        } else {
            let t = (config.rotation_speed * delta).clamp(0.0, 1.0);
            self.current_rotation.slerp(target, t)
        };

        self.current_angle_relative = clamped;
        self.current_angle = match director.variant {
            AimVariant::Planar => facing.sign() * clamped,
            AimVariant::Spatial => clamped,
        };
        self.current_aim = (self.current_rotation * director.variant.reference_axis()).normalize_or_zero();
        self.current_aim_absolute =
            (world_rotation(director.variant, clamped, pitch, OwnerFacing::default())
                * director.variant.reference_axis())
            .normalize_or_zero();
    }
}

/// Pick the raw world-space direction from the configured source.
fn raw_aim(
    director: &AimDirector,
    input: &AimInput,
    script_aim: Option<Vec3>,
    origin: Vec3,
) -> Option<Vec3> {
    let variant = director.variant;
    let threshold = director.config.aim_threshold.max(MIN_AIM_LENGTH);
    let stick = |value: Vec2| (value.length() > threshold).then(|| variant.stick_to_world(value));

    match director.config.source {
        AimSource::Disabled => None,
        AimSource::PrimaryMovement => stick(input.primary),
        AimSource::SecondaryMovement => stick(input.secondary),
        AimSource::SecondaryThenPrimary => stick(input.secondary).or_else(|| stick(input.primary)),
        AimSource::PrimaryThenSecondary => stick(input.primary).or_else(|| stick(input.secondary)),
        AimSource::Pointer => {
            let ray = input.pointer?;
            let point = match variant {
                AimVariant::Planar => Vec3::new(ray.origin.x, ray.origin.y, origin.z),
                AimVariant::Spatial => {
                    let hit = ray.hit_ground(director.config.ground_height)?;
                    Vec3::new(hit.x, origin.y, hit.z)
                }
            };
            let direction = point - origin;
            (direction.length() > MIN_AIM_LENGTH).then_some(direction)
        }
        AimSource::Script => script_aim.filter(|aim| aim.length() > MIN_AIM_LENGTH),
        AimSource::CameraRelative => {
            let value = input.primary;
            if value.length() <= threshold {
                return None;
            }
            match variant {
                AimVariant::Planar => Some(variant.stick_to_world(value)),
                AimVariant::Spatial => {
                    let forward = Vec3::new(input.camera_forward.x, 0.0, input.camera_forward.z)
                        .normalize_or_zero();
                    if forward == Vec3::ZERO {
                        return Some(variant.stick_to_world(value));
                    }
                    let right = forward.cross(Vec3::Y);
                    Some(right * value.x + forward * value.y)
                }
            }
        }
    }
}

/// Facing-relative angle (degrees) and pitch (radians) of a world direction.
pub fn relative_angle(variant: AimVariant, direction: Vec3, facing: OwnerFacing) -> (f32, f32) {
    match variant {
        AimVariant::Planar => {
            let angle = direction.y.atan2(facing.sign() * direction.x).to_degrees();
            (angle, 0.0)
        }
        AimVariant::Spatial => {
            let flat = Vec2::new(direction.x, direction.z);
            if flat.length() <= MIN_AIM_LENGTH {
                return (0.0, 0.0);
            }
            let yaw = (-direction.x).atan2(-direction.z).to_degrees();
            let pitch = direction.y.atan2(flat.length());
            (wrap_degrees(yaw - facing.yaw.to_degrees()), pitch)
        }
    }
}

/// World rotation for a facing-relative angle.
pub fn world_rotation(variant: AimVariant, relative: f32, pitch: f32, facing: OwnerFacing) -> Quat {
    match variant {
        AimVariant::Planar => {
            let world = if facing.flipped {
                180.0 - relative
            } else {
                relative
            };
            Quat::from_rotation_z(world.to_radians())
        }
        AimVariant::Spatial => {
            let yaw = facing.yaw + relative.to_radians();
            Quat::from_rotation_y(yaw) * Quat::from_rotation_x(pitch)
        }
    }
}

/// Nearest multiple of `step`, wrapped into `(-180, 180]`.
pub fn snap_angle(angle: f32, step: f32) -> f32 {
    wrap_degrees((angle / step).round() * step)
}

/// Wrap into `(-180, 180]`.
pub fn wrap_degrees(angle: f32) -> f32 {
    let wrapped = (angle + 180.0).rem_euclid(360.0) - 180.0;
    if wrapped <= -180.0 {
        180.0
    } else {
        wrapped
    }
}

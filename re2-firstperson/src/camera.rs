use std::collections::{BTreeMap, HashMap};

use nalgebra::Rotation3;
use nalgebra_glm as glm;

use crate::delta_time::clamp_delta;

/// Distance of the point the camera looks at, along the controller's forward.
const LOOK_DISTANCE: f32 = 8192.0;

/// Camera matrices face the other way on X and Z compared to bones.
pub fn mirror_xz() -> glm::Mat4 {
    glm::diagonal4x4(&glm::vec4(-1.0, 1.0, -1.0, 1.0))
}

/// Upper 3x3 of `m`, with no translation.
pub fn extract_rotation(m: &glm::Mat4) -> glm::Mat4 {
    let mut out = glm::Mat4::identity();
    out.fixed_view_mut::<3, 3>(0, 0).copy_from(&m.fixed_view::<3, 3>(0, 0));
    out
}

fn translation(m: &glm::Mat4) -> glm::Vec3 {
    glm::vec4_to_vec3(&glm::column(m, 3))
}

/// Average distance between the three basis columns of `a` and `b`.
pub fn column_distance(a: &glm::Mat4, b: &glm::Mat4) -> f32 {
    (0..3)
        .map(|i| glm::distance(&glm::column(a, i), &glm::column(b, i)))
        .sum::<f32>()
        / 3.0
}

/// Rotates `m1` toward `m2` by `delta` of the angle between them and lerps
/// the translation by the same amount.
pub fn interpolate(m1: &glm::Mat4, m2: &glm::Mat4, delta: f32) -> glm::Mat4 {
    let m1_rot = extract_rotation(m1);
    let delta_rotation = m2 * glm::transpose(&m1_rot);
    let delta_3: glm::Mat3 = delta_rotation.fixed_view::<3, 3>(0, 0).into_owned();

    let mut out = match Rotation3::from_matrix_unchecked(delta_3).axis_angle() {
        Some((axis, angle)) if angle.is_finite() => glm::rotation(angle * delta, &axis.into_inner()) * m1_rot,
        _ => m1_rot,
    };

    for i in 0..3 {
        out[(i, 3)] = m1[(i, 3)] + delta * (m2[(i, 3)] - m1[(i, 3)]);
    }

    out
}

/// Interpolation factor for this frame. Grows with the angular error so big
/// snaps catch up quickly. Not capped: past 1 the interpolation overshoots.
pub fn smoothing_gain(delta_time: f32, scale: f32, distance: f32) -> f32 {
    clamp_delta(delta_time) * scale * distance
}

/// World rotation of a camera at `eye` looking at `target`, world up as reference.
pub fn look_rotation(eye: &glm::Vec3, target: &glm::Vec3) -> glm::Mat4 {
    let view = glm::look_at_lh(eye, target, &glm::vec3(0.0, 1.0, 0.0));
    extract_rotation(&glm::transpose(&view))
}

/// Head position: bone translation plus the per-model offset in bone space.
pub fn head_position(bone_matrix: &glm::Mat4, offset: &glm::Vec3) -> glm::Vec3 {
    let scaled = glm::vec4(offset.x * -0.1, offset.y * 0.1, offset.z * 0.1, 0.0);
    let rotated = extract_rotation(bone_matrix) * scaled;

    translation(bone_matrix) + glm::vec4_to_vec3(&rotated)
}

/// Camera offsets per player model. Unknown models get a zero offset.
#[derive(Debug, Clone, Default)]
pub struct AttachOffsets(HashMap<String, glm::Vec3>);

impl AttachOffsets {
    pub fn from_config(offsets: &BTreeMap<String, [f32; 3]>) -> Self {
        Self(
            offsets
                .iter()
                .map(|(name, v)| (name.clone(), glm::make_vec3(v)))
                .collect(),
        )
    }

    pub fn get(&self, player: &str) -> glm::Vec3 {
        self.0.get(player).copied().unwrap_or_else(glm::Vec3::zeros)
    }

    pub fn entry(&mut self, player: &str) -> &mut glm::Vec3 {
        self.0.entry(player.to_string()).or_insert_with(glm::Vec3::zeros)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CameraTuning {
    pub offset: glm::Vec3,
    /// "CameraSpeed": how fast the view catches up with the look direction.
    pub camera_scale: f32,
    /// "CameraShake": how closely the view follows the head bone.
    pub bone_scale: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct CameraSolution {
    pub position: glm::Vec4,
    pub rotation: glm::Quat,
    pub world_matrix: glm::Mat4,
}

#[derive(Debug, Clone, Copy)]
pub struct ControllerSync {
    pub position: glm::Vec4,
    pub rotation: glm::Quat,
    pub camera_matrix: glm::Mat4,
}

/// Frame to frame camera state. Lives behind the matrix lock.
#[derive(Debug, Clone)]
pub struct Smoothing {
    pub last_camera_matrix: glm::Mat4,
    pub last_bone_matrix: glm::Mat4,
    pub interpolated_bone: glm::Mat4,
    pub rotation_offset: glm::Mat4,
    pub last_controller_pos: glm::Vec4,
    pub last_controller_rotation: glm::Quat,
}

impl Smoothing {
    pub fn new() -> Self {
        Self {
            last_camera_matrix: glm::Mat4::identity(),
            last_bone_matrix: glm::Mat4::identity(),
            interpolated_bone: glm::Mat4::identity(),
            rotation_offset: glm::Mat4::identity(),
            last_controller_pos: glm::Vec4::zeros(),
            last_controller_rotation: glm::quat_identity(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Last camera matrix expressed in bone orientation.
    pub fn bone_basis(&self) -> glm::Mat4 {
        self.last_camera_matrix * mirror_xz()
    }

    /// Produces this frame's camera transform and remembers it as the last
    /// camera matrix.
    pub fn step(&mut self, delta_time: f32, tuning: &CameraTuning) -> CameraSolution {
        let cam_pos = glm::vec4_to_vec3(&self.last_controller_pos);

        let bone_matrix = glm::set_column(&self.bone_basis(), 3, &glm::column(&self.last_bone_matrix, 3));

        let cam_rot = extract_rotation(&glm::quat_to_mat4(&self.last_controller_rotation));
        let head_rot = extract_rotation(&self.last_bone_matrix);
        let cam_forward = glm::vec4_to_vec3(&glm::column(&cam_rot, 2));

        let final_pos = head_position(&bone_matrix, &tuning.offset);

        let dist = column_distance(&self.interpolated_bone, &head_rot);
        let bone_gain = smoothing_gain(delta_time, tuning.bone_scale, dist);
        self.interpolated_bone = interpolate(&self.interpolated_bone, &head_rot, bone_gain);

        // Follow the bone, but turn toward where the controller is looking
        let look = look_rotation(&final_pos, &(cam_pos + cam_forward * LOOK_DISTANCE));
        let wanted = glm::inverse(&self.interpolated_bone) * look;

        let dist = column_distance(&self.rotation_offset, &wanted);
        let camera_gain = smoothing_gain(delta_time, tuning.camera_scale, dist);
        self.rotation_offset = interpolate(&self.rotation_offset, &wanted, camera_gain);

        let final_mat = self.interpolated_bone * self.rotation_offset;
        let rotation = glm::to_quat(&final_mat);
        let position = glm::vec4(final_pos.x, final_pos.y, final_pos.z, 1.0);
        let world_matrix = glm::set_column(&final_mat, 3, &position);

        self.last_camera_matrix = world_matrix;

        CameraSolution {
            position,
            rotation,
            world_matrix,
        }
    }

    /// Re-derives the head position from the last camera matrix, for the
    /// controller update that runs before the transform tree.
    pub fn sync_controller(&mut self, offset: &glm::Vec3) -> ControllerSync {
        let bone_matrix = self.bone_basis();
        let pos = head_position(&bone_matrix, offset);
        let position = glm::vec4(pos.x, pos.y, pos.z, glm::column(&bone_matrix, 3).w);
        let rotation = glm::to_quat(&self.last_camera_matrix);

        self.last_camera_matrix = glm::set_column(&self.last_camera_matrix, 3, &position);

        ControllerSync {
            position,
            rotation,
            camera_matrix: self.last_camera_matrix,
        }
    }

    /// Attach joint matrix with its rotation replaced by the camera's, or
    /// collapsed to nothing when the mesh should be hidden.
    pub fn bone_pose(&self, joint: &glm::Mat4, hide_mesh: bool) -> glm::Mat4 {
        let wanted = self.bone_basis();
        let mut out = *joint;

        for i in 0..3 {
            let col = if hide_mesh { glm::Vec4::zeros() } else { glm::column(&wanted, i) };
            out.set_column(i, &col);
        }

        out
    }
}

impl Default for Smoothing {
    fn default() -> Self {
        Self::new()
    }
}

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::info;
use nalgebra_glm as glm;

use crate::camera::{AttachOffsets, CameraTuning, Smoothing};
use crate::config::Config;
use crate::delta_time::DeltaTimer;
use crate::error::{Error, Result};
use crate::fov::FovBlender;
use crate::host::{CameraRef, CameraSystemRef, ControllerRef, Host, Patch, TransformRef};
use crate::mods::Mod;
use crate::scan::Pattern;
use crate::ui::Ui;

pub const CAMERA_SYSTEM_NAME: &str = "app.ropeway.camera.CameraSystem";
pub const PLAYER_CAMERA_CONTROLLER_NAME: &str = "PlayerCameraController";

pub const DISABLE_VIGNETTE_PATTERN: &str = "8B 87 3C 01 00 00 89 83 DC 00 00 00";
// xor eax, eax
const DISABLE_VIGNETTE_BYTES: [u8; 6] = [0x31, 0xC0, 0x90, 0x90, 0x90, 0x90];

/// Poisoning only means another callback panicked mid-frame; the state is
/// still usable for the next one.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Engine objects found through the camera system, re-acquired every frame.
#[derive(Debug, Clone, Default)]
pub struct Pointers {
    pub camera_system: Option<CameraSystemRef>,
    pub camera: Option<CameraRef>,
    pub player_transform: Option<TransformRef>,
    pub player_camera_controller: Option<ControllerRef>,
    pub player_name: String,
}

/// Everything the overlay can change.
pub struct Settings {
    pub enabled: bool,
    pub hide_mesh: bool,
    pub disable_vignette: bool,
    pub attach_bone: String,
    pub attach_names: Vec<String>,
    pub attach_selected: usize,
    pub attach_offsets: AttachOffsets,
    pub camera_scale: f32,
    pub bone_scale: f32,
    pub fov: FovBlender,
    pub(crate) vignette_patch: Option<Box<dyn Patch>>,
}

impl Settings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            enabled: config.enabled,
            hide_mesh: config.hide_mesh,
            disable_vignette: config.disable_vignette,
            attach_bone: config.attach_bone.clone(),
            attach_names: Vec::with_capacity(256),
            attach_selected: 0,
            attach_offsets: AttachOffsets::from_config(&config.attach_offsets),
            camera_scale: config.camera_scale.clamp(0.0, 250.0),
            bone_scale: config.bone_scale.clamp(0.0, 250.0),
            fov: FovBlender::new(config.fov_offset, config.fov_multiplier),
            vignette_patch: None,
        }
    }
}

/// First person camera mode.
///
/// Lock order is matrices, then delta times, then settings, then pointers.
/// Only the matrix lock is ever held across callbacks.
pub struct FirstPerson<H> {
    pub(crate) host: Arc<H>,
    pub(crate) matrices: Mutex<Smoothing>,
    pub(crate) delta_times: Mutex<DeltaTimer<TransformRef>>,
    pub(crate) settings: Mutex<Settings>,
    pub(crate) pointers: Mutex<Pointers>,
}

impl<H: Host> FirstPerson<H> {
    pub fn new(host: Arc<H>, config: &Config) -> Self {
        Self {
            host,
            matrices: Mutex::new(Smoothing::new()),
            delta_times: Mutex::new(DeltaTimer::new()),
            settings: Mutex::new(Settings::from_config(config)),
            pointers: Mutex::new(Pointers::default()),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn is_enabled(&self) -> bool {
        lock(&self.settings).enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        lock(&self.settings).enabled = enabled;
    }

    pub fn pointers(&self) -> Pointers {
        lock(&self.pointers).clone()
    }

    pub fn joint_names(&self) -> Vec<String> {
        lock(&self.settings).attach_names.clone()
    }

    pub fn smoothing(&self) -> Smoothing {
        lock(&self.matrices).clone()
    }

    pub(crate) fn tuning(&self, player_name: &str) -> CameraTuning {
        let settings = lock(&self.settings);

        CameraTuning {
            offset: settings.attach_offsets.get(player_name),
            camera_scale: settings.camera_scale,
            bone_scale: settings.bone_scale,
        }
    }

    pub fn update_delta_time(&self, transform: TransformRef) -> f32 {
        lock(&self.delta_times).update(transform)
    }

    /// The tracked player camera is the one the camera system currently drives.
    pub(crate) fn player_camera_active(&self, p: &Pointers) -> bool {
        let host = &*self.host;

        if p.camera.and_then(|c| host.camera_owner(c)).is_none() {
            return false;
        }

        if p.player_camera_controller.is_none() || p.player_transform.is_none() {
            return false;
        }

        // can change to action camera
        match p.camera_system.and_then(|cs| host.camera_system_controller(cs)) {
            Some(controller) => host.controller_active_camera(controller) == p.player_camera_controller,
            None => false,
        }
    }

    /// Drops all smoothing history and the joint cache.
    pub fn reset(&self) {
        let mut matrices = lock(&self.matrices);
        self.reset_with(&mut matrices);
    }

    pub(crate) fn reset_with(&self, matrices: &mut Smoothing) {
        matrices.reset();
        lock(&self.delta_times).clear();
        lock(&self.settings).attach_names.clear();
    }

    fn is_player_controller(&self, controller: ControllerRef, p: &Pointers) -> bool {
        p.player_camera_controller.is_some()
            && self.host.controller_active_camera(controller) == p.player_camera_controller
            && p.player_transform.is_some()
    }

    /// First controller hook. Puts the controller back on the head so the
    /// game's own rotation doesn't drift away from ours.
    pub fn on_update_camera_controller(&self, controller: ControllerRef) {
        if !self.is_enabled() {
            return;
        }

        let p = self.pointers();
        if !self.is_player_controller(controller, &p) {
            return;
        }

        let offset = self.tuning(&p.player_name).offset;
        let host = &*self.host;

        let mut matrices = lock(&self.matrices);
        let sync = matrices.sync_controller(&offset);

        host.set_controller_world_position(controller, sync.position);
        host.set_controller_world_rotation(controller, sync.rotation);

        if let Some(transform) = p.camera.and_then(|c| host.camera_transform(c)) {
            host.set_world_matrix(transform, &sync.camera_matrix);
            host.set_transform_angles(transform, sync.rotation);
        }
    }

    /// Second controller hook: FOV, then remember where the game wanted the
    /// camera before anything below overwrites it.
    pub fn on_update_camera_controller2(&self, controller: ControllerRef) {
        if !self.is_enabled() {
            return;
        }

        let p = self.pointers();
        if !self.is_player_controller(controller, &p) {
            return;
        }

        {
            let mut settings = lock(&self.settings);
            self.update_fov(&mut settings, Some(controller));
        }

        let mut matrices = lock(&self.matrices);
        matrices.last_controller_pos = self.host.controller_world_position(controller);
        matrices.last_controller_rotation = self.host.controller_world_rotation(controller);
    }

    pub(crate) fn update_fov(&self, settings: &mut Settings, controller: Option<ControllerRef>) {
        let controller = match controller {
            Some(controller) => controller,
            None => return,
        };

        let host = &*self.host;
        let p = self.pointers();

        let is_active_camera = match p.camera_system.and_then(|cs| host.camera_system_controller(cs)) {
            Some(root) => {
                host.controller_camera_param(root).is_some()
                    && host.controller_active_camera(root) == p.player_camera_controller
            }
            None => false,
        };

        if !is_active_camera {
            return;
        }

        if let Some(param) = host.controller_camera_param(controller) {
            let fov = settings.fov.blend(host.camera_param_fov(param));

            if let Some(player_controller) = p.player_camera_controller {
                host.set_controller_fov(player_controller, fov);
            }

            host.set_camera_param_use_param(param, !settings.enabled);
        }
    }
}

impl<H: Host> Mod for FirstPerson<H> {
    fn name(&self) -> &str {
        "FirstPerson"
    }

    fn on_initialize(&self) -> Result<()> {
        let image = self.host.module_image().ok_or(Error::ModuleUnavailable)?;
        let pattern = Pattern::parse(DISABLE_VIGNETTE_PATTERN)?;

        let offset = match pattern.find(image.bytes, 0) {
            Some(offset) => offset,
            None => {
                self.host.signal_error("Failed to find Disable Vignette pattern");
                return Err(Error::PatternNotFound {
                    name: "Disable Vignette".to_string(),
                    pattern: DISABLE_VIGNETTE_PATTERN.to_string(),
                });
            }
        };

        let address = image.base + offset;
        info!("[FIRSTPERSON] Disable Vignette code at 0x{:x}", address);

        let mut settings = lock(&self.settings);
        let patch = self
            .host
            .create_patch(address, DISABLE_VIGNETTE_BYTES.to_vec(), settings.disable_vignette);
        settings.vignette_patch = Some(patch);

        Ok(())
    }

    fn on_frame(&self) {
        if !self.is_enabled() {
            return;
        }

        let camera_system = self.pointers().camera_system;

        if camera_system.and_then(|cs| self.host.camera_system_owner(cs)).is_none() {
            let camera_system = self.host.resolve(CAMERA_SYSTEM_NAME).map(CameraSystemRef::from);
            lock(&self.pointers).camera_system = camera_system;
            self.reset();
        }
    }

    fn on_draw_ui(&self, ui: &mut dyn Ui) {
        if !ui.collapsing_header(self.name()) {
            return;
        }

        let host = &*self.host;
        let mut guard = lock(&self.settings);
        let settings = &mut *guard;

        let mut enabled = settings.enabled;
        if ui.checkbox("Enabled", &mut enabled) {
            settings.enabled = enabled;

            // hand the FOV back to the game
            if !enabled {
                if let Some(cs) = self.pointers().camera_system {
                    self.update_fov(settings, host.camera_system_controller(cs));
                }
            }
        }

        ui.checkbox("Hide Joint Mesh", &mut settings.hide_mesh);

        if ui.checkbox("Disable Vignette", &mut settings.disable_vignette) {
            let disable = settings.disable_vignette;
            if let Some(patch) = settings.vignette_patch.as_mut() {
                patch.toggle(disable);
            }
        }

        if ui.button("Refresh Joints") {
            settings.attach_names.clear();
        }

        let p = self.pointers();

        let offset = settings.attach_offsets.entry(&p.player_name);
        let mut values = [offset.x, offset.y, offset.z];
        if ui.slider_float3("CameraOffset", &mut values, -2.0, 2.0) {
            *offset = glm::make_vec3(&values);
        }

        ui.slider_float("CameraSpeed", &mut settings.camera_scale, 0.0, 250.0);
        ui.slider_float("CameraShake", &mut settings.bone_scale, 0.0, 250.0);

        if let Some(player_controller) = p.player_camera_controller {
            let root = p.camera_system.and_then(|cs| host.camera_system_controller(cs));

            if settings.fov.offset.draw(ui, "FOVOffset") {
                self.update_fov(settings, root);
            }

            if settings.fov.multiplier.draw(ui, "FOVMultiplier") {
                self.update_fov(settings, root);
                settings.fov.commit_multiplier();
            }

            ui.value_float("CurrentFOV", host.controller_fov(player_controller));
        }

        ui.input_text("Joint", &mut settings.attach_bone);

        if ui.list_box("Joints", &mut settings.attach_selected, &settings.attach_names) {
            if let Some(name) = settings.attach_names.get(settings.attach_selected) {
                settings.attach_bone = name.clone();
            }
        }
    }
}

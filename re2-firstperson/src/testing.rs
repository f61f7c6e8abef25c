//! In-memory stand-ins for the game and the overlay renderer.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use nalgebra_glm as glm;

use crate::config::Config;
use crate::first_person::FirstPerson;
use crate::host::*;
use crate::mods::Mod;
use crate::ui::Ui;

/// Overlay that answers widgets from scripted inputs. Each input is used once.
#[derive(Default)]
pub struct ScriptedUi {
    pub collapsed: bool,
    pub checkboxes: HashMap<String, bool>,
    pub buttons: HashSet<String>,
    pub sliders: HashMap<String, f32>,
    pub sliders3: HashMap<String, [f32; 3]>,
    pub texts: HashMap<String, String>,
    pub list_selection: HashMap<String, usize>,

    pub drawn: Vec<String>,
    pub values: HashMap<String, f32>,
    pub list_items: HashMap<String, Vec<String>>,
}

impl Ui for ScriptedUi {
    fn collapsing_header(&mut self, label: &str) -> bool {
        self.drawn.push(label.to_string());
        !self.collapsed
    }

    fn checkbox(&mut self, label: &str, value: &mut bool) -> bool {
        self.drawn.push(label.to_string());
        match self.checkboxes.remove(label) {
            Some(new_value) => {
                *value = new_value;
                true
            }
            None => false,
        }
    }

    fn button(&mut self, label: &str) -> bool {
        self.drawn.push(label.to_string());
        self.buttons.remove(label)
    }

    fn slider_float(&mut self, label: &str, value: &mut f32, _min: f32, _max: f32) -> bool {
        self.drawn.push(label.to_string());
        match self.sliders.remove(label) {
            Some(new_value) => {
                *value = new_value;
                true
            }
            None => false,
        }
    }

    fn slider_float3(&mut self, label: &str, value: &mut [f32; 3], _min: f32, _max: f32) -> bool {
        self.drawn.push(label.to_string());
        match self.sliders3.remove(label) {
            Some(new_value) => {
                *value = new_value;
                true
            }
            None => false,
        }
    }

    fn value_float(&mut self, label: &str, value: f32) {
        self.drawn.push(label.to_string());
        self.values.insert(label.to_string(), value);
    }

    fn input_text(&mut self, label: &str, buffer: &mut String) -> bool {
        self.drawn.push(label.to_string());
        match self.texts.remove(label) {
            Some(text) => {
                *buffer = text;
                true
            }
            None => false,
        }
    }

    fn list_box(&mut self, label: &str, selected: &mut usize, items: &[String]) -> bool {
        self.drawn.push(label.to_string());
        self.list_items.insert(label.to_string(), items.to_vec());
        match self.list_selection.remove(label) {
            Some(index) if index < items.len() => {
                *selected = index;
                true
            }
            _ => false,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
enum Link {
    Owner,
    Transform,
    MainCamera,
    PlayerJoint,
    Controller,
    ActiveCamera,
    CameraParam,
    Parent,
}

#[derive(Default)]
struct World {
    globals: HashMap<String, usize>,
    names: HashMap<usize, String>,
    links: HashMap<(usize, Link), usize>,
    controller_positions: HashMap<usize, glm::Vec4>,
    controller_rotations: HashMap<usize, glm::Quat>,
    controller_fovs: HashMap<usize, f32>,
    param_fovs: HashMap<usize, f32>,
    use_params: HashMap<usize, bool>,
    world_matrices: HashMap<usize, glm::Mat4>,
    positions: HashMap<usize, glm::Vec4>,
    angles: HashMap<usize, glm::Quat>,
    joints: HashMap<usize, Vec<(String, glm::Mat4)>>,
    errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatchRecord {
    pub address: usize,
    pub bytes: Vec<u8>,
    /// Initial state followed by every toggle.
    pub states: Vec<bool>,
}

struct FakePatch {
    log: Arc<Mutex<Vec<PatchRecord>>>,
    index: usize,
}

impl Patch for FakePatch {
    fn toggle(&mut self, enabled: bool) -> bool {
        let mut log = self.log.lock().unwrap();
        log[self.index].states.push(enabled);
        true
    }
}

pub struct FakeHost {
    pub module_base: usize,
    module: Vec<u8>,
    module_cleared: AtomicBool,
    patches: Arc<Mutex<Vec<PatchRecord>>>,
    world: Mutex<World>,
}

fn handle<T: From<ObjectRef>>(addr: usize) -> Option<T> {
    ObjectRef::from_addr(addr).map(T::from)
}

impl FakeHost {
    pub fn new() -> Self {
        let mut module = vec![0xCC; 0x100];
        let vignette = [0x8B, 0x87, 0x3C, 0x01, 0x00, 0x00, 0x89, 0x83, 0xDC, 0x00, 0x00, 0x00];
        module[0x40..0x40 + vignette.len()].copy_from_slice(&vignette);

        Self {
            module_base: 0x4000_0000,
            module,
            module_cleared: AtomicBool::new(false),
            patches: Arc::new(Mutex::new(Vec::new())),
            world: Mutex::new(World::default()),
        }
    }

    fn world(&self) -> MutexGuard<'_, World> {
        self.world.lock().unwrap()
    }

    fn link<T: From<ObjectRef>>(&self, from: usize, link: Link) -> Option<T> {
        self.world().links.get(&(from, link)).and_then(|&addr| handle(addr))
    }

    fn set_link(&self, from: usize, link: Link, to: usize) {
        self.world().links.insert((from, link), to);
    }

    pub fn clear_module(&self) {
        self.module_cleared.store(true, Ordering::SeqCst);
    }

    pub fn patches(&self) -> Vec<PatchRecord> {
        self.patches.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.world().errors.clone()
    }

    pub fn set_global(&self, name: &str, addr: usize) {
        self.world().globals.insert(name.to_string(), addr);
    }

    pub fn set_name(&self, obj: GameObjectRef, name: &str) {
        self.world().names.insert(obj.addr(), name.to_string());
    }

    pub fn unlink_camera_system_owner(&self, system: CameraSystemRef) {
        self.world().links.remove(&(system.addr(), Link::Owner));
    }

    pub fn unlink_main_camera(&self, system: CameraSystemRef) {
        self.world().links.remove(&(system.addr(), Link::MainCamera));
    }

    pub fn set_active_camera(&self, controller: ControllerRef, active: Option<ControllerRef>) {
        match active {
            Some(active) => self.set_link(controller.addr(), Link::ActiveCamera, active.addr()),
            None => {
                self.world().links.remove(&(controller.addr(), Link::ActiveCamera));
            }
        }
    }

    pub fn remove_joints(&self, transform: TransformRef) {
        self.world().joints.remove(&transform.addr());
    }

    pub fn set_joint_parent(&self, joint: JointRef, transform: TransformRef) {
        self.set_link(joint.addr(), Link::Parent, transform.addr());
    }

    /// Transform owned by a named game object, with a root and a head joint.
    pub fn add_player(&self, transform: usize, object: usize, name: &str) -> TransformRef {
        self.set_link(object, Link::Transform, transform);
        self.set_link(transform, Link::Owner, object);

        let mut world = self.world();
        world.names.insert(object, name.to_string());
        world.joints.insert(
            transform,
            vec![
                ("root".to_string(), glm::Mat4::identity()),
                ("head".to_string(), glm::translation(&glm::vec3(0.0, 1.6, 0.0))),
            ],
        );
        drop(world);

        handle(transform).unwrap()
    }

    pub fn set_param_fov(&self, param: CameraParamRef, fov: f32) {
        self.world().param_fovs.insert(param.addr(), fov);
    }

    pub fn use_param(&self, param: CameraParamRef) -> Option<bool> {
        self.world().use_params.get(&param.addr()).copied()
    }

    pub fn joint(&self, transform: TransformRef, index: usize) -> glm::Mat4 {
        self.world().joints[&transform.addr()][index].1
    }

    pub fn rename_joint(&self, transform: TransformRef, index: usize, name: &str) {
        self.world().joints.get_mut(&transform.addr()).unwrap()[index].0 = name.to_string();
    }

    pub fn transform_position(&self, transform: TransformRef) -> glm::Vec4 {
        self.world().positions.get(&transform.addr()).copied().unwrap_or_else(glm::Vec4::zeros)
    }
}

impl Host for FakeHost {
    fn resolve(&self, name: &str) -> Option<ObjectRef> {
        self.world().globals.get(name).and_then(|&addr| ObjectRef::from_addr(addr))
    }

    fn module_image(&self) -> Option<ModuleImage<'_>> {
        let bytes: &[u8] = if self.module_cleared.load(Ordering::SeqCst) { &[] } else { &self.module };

        Some(ModuleImage {
            base: self.module_base,
            bytes,
        })
    }

    fn create_patch(&self, address: usize, bytes: Vec<u8>, enabled: bool) -> Box<dyn Patch> {
        let mut log = self.patches.lock().unwrap();
        log.push(PatchRecord {
            address,
            bytes,
            states: vec![enabled],
        });

        Box::new(FakePatch {
            log: self.patches.clone(),
            index: log.len() - 1,
        })
    }

    fn signal_error(&self, message: &str) {
        self.world().errors.push(message.to_string());
    }

    fn game_object_name(&self, obj: GameObjectRef) -> Option<String> {
        self.world().names.get(&obj.addr()).cloned()
    }

    fn game_object_transform(&self, obj: GameObjectRef) -> Option<TransformRef> {
        self.link(obj.addr(), Link::Transform)
    }

    fn camera_system_owner(&self, system: CameraSystemRef) -> Option<GameObjectRef> {
        self.link(system.addr(), Link::Owner)
    }

    fn camera_system_main_camera(&self, system: CameraSystemRef) -> Option<CameraRef> {
        self.link(system.addr(), Link::MainCamera)
    }

    fn camera_system_player_joint(&self, system: CameraSystemRef) -> Option<JointRef> {
        self.link(system.addr(), Link::PlayerJoint)
    }

    fn camera_system_controller(&self, system: CameraSystemRef) -> Option<ControllerRef> {
        self.link(system.addr(), Link::Controller)
    }

    fn camera_owner(&self, camera: CameraRef) -> Option<GameObjectRef> {
        self.link(camera.addr(), Link::Owner)
    }

    fn controller_owner(&self, controller: ControllerRef) -> Option<GameObjectRef> {
        self.link(controller.addr(), Link::Owner)
    }

    fn controller_active_camera(&self, controller: ControllerRef) -> Option<ControllerRef> {
        self.link(controller.addr(), Link::ActiveCamera)
    }

    fn controller_camera_param(&self, controller: ControllerRef) -> Option<CameraParamRef> {
        self.link(controller.addr(), Link::CameraParam)
    }

    fn controller_world_position(&self, controller: ControllerRef) -> glm::Vec4 {
        self.world()
            .controller_positions
            .get(&controller.addr())
            .copied()
            .unwrap_or_else(glm::Vec4::zeros)
    }

    fn set_controller_world_position(&self, controller: ControllerRef, pos: glm::Vec4) {
        self.world().controller_positions.insert(controller.addr(), pos);
    }

    fn controller_world_rotation(&self, controller: ControllerRef) -> glm::Quat {
        self.world()
            .controller_rotations
            .get(&controller.addr())
            .copied()
            .unwrap_or_else(glm::quat_identity)
    }

    fn set_controller_world_rotation(&self, controller: ControllerRef, rot: glm::Quat) {
        self.world().controller_rotations.insert(controller.addr(), rot);
    }

    fn controller_fov(&self, controller: ControllerRef) -> f32 {
        self.world().controller_fovs.get(&controller.addr()).copied().unwrap_or(0.0)
    }

    fn set_controller_fov(&self, controller: ControllerRef, fov: f32) {
        self.world().controller_fovs.insert(controller.addr(), fov);
    }

    fn camera_param_fov(&self, param: CameraParamRef) -> f32 {
        self.world().param_fovs.get(&param.addr()).copied().unwrap_or(0.0)
    }

    fn set_camera_param_use_param(&self, param: CameraParamRef, use_param: bool) {
        self.world().use_params.insert(param.addr(), use_param);
    }

    fn joint_parent_transform(&self, joint: JointRef) -> Option<TransformRef> {
        self.link(joint.addr(), Link::Parent)
    }

    fn transform_owner(&self, transform: TransformRef) -> Option<GameObjectRef> {
        self.link(transform.addr(), Link::Owner)
    }

    fn world_matrix(&self, transform: TransformRef) -> glm::Mat4 {
        self.world()
            .world_matrices
            .get(&transform.addr())
            .copied()
            .unwrap_or_else(glm::Mat4::identity)
    }

    fn set_world_matrix(&self, transform: TransformRef, mtx: &glm::Mat4) {
        self.world().world_matrices.insert(transform.addr(), *mtx);
    }

    fn set_transform_position(&self, transform: TransformRef, pos: glm::Vec4) {
        self.world().positions.insert(transform.addr(), pos);
    }

    fn set_transform_angles(&self, transform: TransformRef, rot: glm::Quat) {
        self.world().angles.insert(transform.addr(), rot);
    }

    fn joint_count(&self, transform: TransformRef) -> usize {
        self.world().joints.get(&transform.addr()).map_or(0, Vec::len)
    }

    fn joint_name(&self, transform: TransformRef, index: usize) -> Option<String> {
        let world = self.world();
        world.joints.get(&transform.addr())?.get(index).map(|(name, _)| name.clone())
    }

    fn joint_world_matrix(&self, transform: TransformRef, index: usize) -> Option<glm::Mat4> {
        let world = self.world();
        world.joints.get(&transform.addr())?.get(index).map(|(_, mtx)| *mtx)
    }

    fn set_joint_world_matrix(&self, transform: TransformRef, index: usize, mtx: &glm::Mat4) -> bool {
        let mut world = self.world();
        match world.joints.get_mut(&transform.addr()).and_then(|joints| joints.get_mut(index)) {
            Some(joint) => {
                joint.1 = *mtx;
                true
            }
            None => false,
        }
    }
}

/// A camera system following Leon, with the player camera active.
pub struct Scene {
    pub host: Arc<FakeHost>,
    pub camera_system: CameraSystemRef,
    pub camera_system_transform: TransformRef,
    pub camera: CameraRef,
    pub camera_transform: TransformRef,
    pub root_controller: ControllerRef,
    pub player_controller: ControllerRef,
    pub player_controller_object: GameObjectRef,
    pub param: CameraParamRef,
    pub joint: JointRef,
    pub player_transform: TransformRef,
    pub player_object: GameObjectRef,
    /// Some transform below the player.
    pub child_transform: TransformRef,
}

const CAMERA_SYSTEM: usize = 0x100;
const CAMERA_SYSTEM_OBJECT: usize = 0x110;
const CAMERA_SYSTEM_TRANSFORM: usize = 0x120;
const CAMERA: usize = 0x200;
const CAMERA_OBJECT: usize = 0x210;
const CAMERA_TRANSFORM: usize = 0x220;
const ROOT_CONTROLLER: usize = 0x300;
const ROOT_CONTROLLER_OBJECT: usize = 0x310;
const PLAYER_CONTROLLER: usize = 0x400;
const PLAYER_CONTROLLER_OBJECT: usize = 0x410;
const PARAM: usize = 0x500;
const JOINT: usize = 0x600;
const PLAYER_TRANSFORM: usize = 0x700;
const PLAYER_OBJECT: usize = 0x710;
const CHILD_TRANSFORM: usize = 0x800;

pub fn scene() -> Scene {
    let host = FakeHost::new();

    host.set_global(crate::first_person::CAMERA_SYSTEM_NAME, CAMERA_SYSTEM);
    host.set_link(CAMERA_SYSTEM, Link::Owner, CAMERA_SYSTEM_OBJECT);
    host.set_link(CAMERA_SYSTEM_OBJECT, Link::Transform, CAMERA_SYSTEM_TRANSFORM);

    host.set_link(CAMERA_SYSTEM, Link::MainCamera, CAMERA);
    host.set_link(CAMERA, Link::Owner, CAMERA_OBJECT);
    host.set_link(CAMERA_OBJECT, Link::Transform, CAMERA_TRANSFORM);
    host.world()
        .joints
        .insert(CAMERA_TRANSFORM, vec![("camera".to_string(), glm::Mat4::identity())]);

    host.set_link(CAMERA_SYSTEM, Link::PlayerJoint, JOINT);
    let player_transform = host.add_player(PLAYER_TRANSFORM, PLAYER_OBJECT, "pl1000");
    host.set_link(JOINT, Link::Parent, PLAYER_TRANSFORM);

    host.set_link(CAMERA_SYSTEM, Link::Controller, ROOT_CONTROLLER);
    host.set_link(ROOT_CONTROLLER, Link::Owner, ROOT_CONTROLLER_OBJECT);
    host.set_link(ROOT_CONTROLLER, Link::ActiveCamera, PLAYER_CONTROLLER);
    host.set_link(ROOT_CONTROLLER, Link::CameraParam, PARAM);
    host.set_link(PLAYER_CONTROLLER, Link::Owner, PLAYER_CONTROLLER_OBJECT);
    host.world()
        .names
        .insert(PLAYER_CONTROLLER_OBJECT, "PlayerCameraController".to_string());
    host.world().param_fovs.insert(PARAM, 70.0);

    Scene {
        host: Arc::new(host),
        camera_system: handle(CAMERA_SYSTEM).unwrap(),
        camera_system_transform: handle(CAMERA_SYSTEM_TRANSFORM).unwrap(),
        camera: handle(CAMERA).unwrap(),
        camera_transform: handle(CAMERA_TRANSFORM).unwrap(),
        root_controller: handle(ROOT_CONTROLLER).unwrap(),
        player_controller: handle(PLAYER_CONTROLLER).unwrap(),
        player_controller_object: handle(PLAYER_CONTROLLER_OBJECT).unwrap(),
        param: handle(PARAM).unwrap(),
        joint: handle(JOINT).unwrap(),
        player_transform,
        player_object: handle(PLAYER_OBJECT).unwrap(),
        child_transform: handle(CHILD_TRANSFORM).unwrap(),
    }
}

impl Scene {
    pub fn first_person(&self, config: Config) -> FirstPerson<FakeHost> {
        FirstPerson::new(self.host.clone(), &config)
    }

    /// Enabled, with every pointer resolved.
    pub fn ready_first_person(&self) -> FirstPerson<FakeHost> {
        self.ready_first_person_with(Config::default())
    }

    pub fn ready_first_person_with(&self, config: Config) -> FirstPerson<FakeHost> {
        let fp = self.first_person(Config { enabled: true, ..config });
        fp.on_frame();
        assert!(fp.update_pointers_from_camera_system(Some(self.camera_system)));
        fp
    }

    pub fn head_matrix(&self) -> glm::Mat4 {
        glm::translation(&glm::vec3(0.0, 1.6, 0.0))
    }
}

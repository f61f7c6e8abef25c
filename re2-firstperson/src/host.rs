//! The slice of the game's object model the camera code touches.
//!
//! Every engine object is addressed through an opaque handle. Handles only
//! compare by identity; nothing here ever looks at the object's contents
//! directly. A `Host` implementation owns the actual memory layouts.

use std::fmt;
use std::num::NonZeroUsize;

use nalgebra_glm as glm;

macro_rules! handle {
    ($($(#[$meta:meta])* $name:ident;)*) => {$(
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(NonZeroUsize);

        impl $name {
            pub fn from_addr(addr: usize) -> Option<Self> {
                NonZeroUsize::new(addr).map(Self)
            }

            pub fn addr(self) -> usize {
                self.0.get()
            }
        }

        impl From<ObjectRef> for $name {
            fn from(obj: ObjectRef) -> Self {
                Self(obj.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({:#x})"), self.0.get())
            }
        }
    )*};
}

/// Untyped reference returned by the global object locator.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ObjectRef(NonZeroUsize);

impl ObjectRef {
    pub fn from_addr(addr: usize) -> Option<Self> {
        NonZeroUsize::new(addr).map(Self)
    }

    pub fn addr(self) -> usize {
        self.0.get()
    }
}

handle! {
    GameObjectRef;
    TransformRef;
    JointRef;
    CameraRef;
    /// `app.ropeway.camera.CameraSystem`
    CameraSystemRef;
    /// Player camera controllers, including the system's root controller.
    ControllerRef;
    CameraParamRef;
}

/// Toggleable code patch. The byte-swapping primitive itself lives on the host side.
pub trait Patch: Send {
    fn toggle(&mut self, enabled: bool) -> bool;
}

/// Loaded image of the game's main module.
#[derive(Clone, Copy)]
pub struct ModuleImage<'a> {
    pub base: usize,
    pub bytes: &'a [u8],
}

pub trait Host: Send + Sync {
    fn resolve(&self, name: &str) -> Option<ObjectRef>;

    fn module_image(&self) -> Option<ModuleImage<'_>>;
    fn create_patch(&self, address: usize, bytes: Vec<u8>, enabled: bool) -> Box<dyn Patch>;

    fn signal_error(&self, message: &str) {
        crate::logging::report_error(message);
    }

    fn game_object_name(&self, obj: GameObjectRef) -> Option<String>;
    fn game_object_transform(&self, obj: GameObjectRef) -> Option<TransformRef>;

    fn camera_system_owner(&self, system: CameraSystemRef) -> Option<GameObjectRef>;
    fn camera_system_main_camera(&self, system: CameraSystemRef) -> Option<CameraRef>;
    fn camera_system_player_joint(&self, system: CameraSystemRef) -> Option<JointRef>;
    fn camera_system_controller(&self, system: CameraSystemRef) -> Option<ControllerRef>;

    fn camera_owner(&self, camera: CameraRef) -> Option<GameObjectRef>;

    fn controller_owner(&self, controller: ControllerRef) -> Option<GameObjectRef>;
    fn controller_active_camera(&self, controller: ControllerRef) -> Option<ControllerRef>;
    fn controller_camera_param(&self, controller: ControllerRef) -> Option<CameraParamRef>;
    fn controller_world_position(&self, controller: ControllerRef) -> glm::Vec4;
    fn set_controller_world_position(&self, controller: ControllerRef, pos: glm::Vec4);
    fn controller_world_rotation(&self, controller: ControllerRef) -> glm::Quat;
    fn set_controller_world_rotation(&self, controller: ControllerRef, rot: glm::Quat);
    fn controller_fov(&self, controller: ControllerRef) -> f32;
    fn set_controller_fov(&self, controller: ControllerRef, fov: f32);

    fn camera_param_fov(&self, param: CameraParamRef) -> f32;
    /// When false the camera ignores the FOV stored in the param.
    fn set_camera_param_use_param(&self, param: CameraParamRef, use_param: bool);

    fn joint_parent_transform(&self, joint: JointRef) -> Option<TransformRef>;

    fn transform_owner(&self, transform: TransformRef) -> Option<GameObjectRef>;
    fn world_matrix(&self, transform: TransformRef) -> glm::Mat4;
    fn set_world_matrix(&self, transform: TransformRef, mtx: &glm::Mat4);
    fn set_transform_position(&self, transform: TransformRef, pos: glm::Vec4);
    fn set_transform_angles(&self, transform: TransformRef, rot: glm::Quat);

    fn joint_count(&self, transform: TransformRef) -> usize;
    fn joint_name(&self, transform: TransformRef, index: usize) -> Option<String>;
    fn joint_world_matrix(&self, transform: TransformRef, index: usize) -> Option<glm::Mat4>;
    /// Returns false when the transform has no matrix slot at `index`.
    fn set_joint_world_matrix(&self, transform: TransformRef, index: usize, mtx: &glm::Mat4) -> bool;

    /// Transform of the game object owning `camera`.
    fn camera_transform(&self, camera: CameraRef) -> Option<TransformRef> {
        self.camera_owner(camera).and_then(|go| self.game_object_transform(go))
    }

    fn find_joint(&self, transform: TransformRef, name: &str) -> Option<usize> {
        (0..self.joint_count(transform)).find(|&i| self.joint_name(transform, i).as_deref() == Some(name))
    }
}

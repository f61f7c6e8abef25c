use log::info;

use crate::first_person::{lock, FirstPerson, PLAYER_CAMERA_CONTROLLER_NAME};
use crate::host::{CameraSystemRef, Host};

impl<H: Host> FirstPerson<H> {
    /// Walks from the camera system to the main camera, the player's transform
    /// and the player camera controller. Returns false if any of them is
    /// missing, in which case the caller resets the smoothing state.
    pub fn update_pointers_from_camera_system(&self, camera_system: Option<CameraSystemRef>) -> bool {
        let camera_system = match camera_system {
            Some(camera_system) => camera_system,
            None => return false,
        };

        let host = &*self.host;
        let mut pointers = lock(&self.pointers);

        pointers.camera = host.camera_system_main_camera(camera_system);
        if pointers.camera.is_none() {
            pointers.player_transform = None;
            return false;
        }

        let joint = match host.camera_system_player_joint(camera_system) {
            Some(joint) => joint,
            None => {
                pointers.player_transform = None;
                return false;
            }
        };

        let parent = host.joint_parent_transform(joint);

        if let Some(parent) = parent {
            if pointers.player_transform != Some(parent) {
                let owner = match host.transform_owner(parent) {
                    Some(owner) => owner,
                    None => return false,
                };

                let name = host.game_object_name(owner).unwrap_or_default();
                if name.is_empty() {
                    return false;
                }

                info!("[RESOLVER] Found Player {} {:?}", name, parent);
                pointers.player_name = name;
            }
        }

        pointers.player_transform = parent;
        if pointers.player_transform.is_none() {
            return false;
        }

        if pointers.player_camera_controller.is_none() {
            let active = host
                .camera_system_controller(camera_system)
                .filter(|&controller| host.controller_owner(controller).is_some())
                .and_then(|controller| host.controller_active_camera(controller));

            let active = match active {
                Some(active) => active,
                None => return false,
            };

            let name = match host.controller_owner(active).and_then(|go| host.game_object_name(go)) {
                Some(name) => name,
                None => return false,
            };

            if name == PLAYER_CAMERA_CONTROLLER_NAME {
                info!("[RESOLVER] Found PlayerCameraController {:?}", active);
                pointers.player_camera_controller = Some(active);
            }

            return pointers.player_camera_controller.is_some();
        }

        true
    }
}

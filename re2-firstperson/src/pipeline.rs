//! Transform tree interception.
//!
//! The engine updates transforms depth first, possibly from several worker
//! threads at once. A `TraversalContext` belongs to one of those threads and
//! carries the matrix lock from the pre-callback of the player transform to
//! its post-callback, so the bones of its children are written against one
//! consistent camera state.
//!
//! Hooks that can't carry a context from the pre to the post callback use
//! `hook_pre_update_transform`/`hook_update_transform`, which keep one
//! context per thread. Those need the mod to live for the whole process
//! (`bootstrap` hands out a `&'static FirstPerson`).

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::camera::Smoothing;
use crate::first_person::{lock, FirstPerson, Pointers};
use crate::host::{Host, TransformRef};

pub struct TraversalContext<'a> {
    in_player_transform: bool,
    first_time: bool,
    root: Option<TransformRef>,
    matrices: Option<MutexGuard<'a, Smoothing>>,
}

impl<'a> TraversalContext<'a> {
    pub fn new() -> Self {
        Self {
            in_player_transform: false,
            first_time: true,
            root: None,
            matrices: None,
        }
    }

    pub fn in_player_transform(&self) -> bool {
        self.in_player_transform
    }

    pub fn holds_matrices(&self) -> bool {
        self.matrices.is_some()
    }

    fn enter(&mut self, root: TransformRef, matrices: &'a Mutex<Smoothing>) {
        if self.matrices.is_none() {
            self.matrices = Some(lock(matrices));
        }

        self.in_player_transform = true;
        self.first_time = true;
        self.root = Some(root);
    }

    fn leave(&mut self) {
        self.in_player_transform = false;
        self.root = None;
        self.matrices = None;
    }
}

impl Default for TraversalContext<'_> {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    // keyed by mod address, holds `TraversalContext<'static>`
    static CONTEXTS: RefCell<HashMap<usize, Box<dyn Any>>> = RefCell::new(HashMap::new());
}

impl<H: Host + 'static> FirstPerson<H> {
    pub fn hook_pre_update_transform(&'static self, transform: TransformRef) {
        self.with_thread_context(|ctx| self.on_pre_update_transform(ctx, transform));
    }

    pub fn hook_update_transform(&'static self, transform: TransformRef) {
        self.with_thread_context(|ctx| self.on_update_transform(ctx, transform));
    }

    fn with_thread_context(&'static self, f: impl FnOnce(&mut TraversalContext<'static>)) {
        CONTEXTS.with(|contexts| {
            let mut contexts = contexts.borrow_mut();
            let ctx = contexts
                .entry(self as *const Self as usize)
                .or_insert_with(|| Box::new(TraversalContext::<'static>::new()) as Box<dyn Any>);

            if let Some(ctx) = ctx.downcast_mut::<TraversalContext<'static>>() {
                f(ctx);
            }
        });
    }
}

impl<H: Host> FirstPerson<H> {
    pub fn traversal(&self) -> TraversalContext<'_> {
        TraversalContext::new()
    }

    /// Runs `f` on the smoothing state, through the context's guard if this
    /// thread is already inside the player subtree.
    fn with_matrices<'a, R>(&'a self, ctx: &mut TraversalContext<'a>, f: impl FnOnce(&mut Smoothing) -> R) -> R {
        match ctx.matrices.as_mut() {
            Some(matrices) => f(&mut **matrices),
            None => f(&mut *lock(&self.matrices)),
        }
    }

    pub fn on_pre_update_transform<'a>(&'a self, ctx: &mut TraversalContext<'a>, transform: TransformRef) {
        if !self.is_enabled() {
            return;
        }

        let p = self.pointers();
        if !self.player_camera_active(&p) {
            return;
        }

        // The player transform updates the bone matrices; its children all
        // work off what it wrote.
        if Some(transform) == p.player_transform {
            ctx.enter(transform, &self.matrices);
        } else if ctx.in_player_transform {
            self.update_player_bones(ctx, &p);
        }
    }

    pub fn on_update_transform<'a>(&'a self, ctx: &mut TraversalContext<'a>, transform: TransformRef) {
        // before anything else, so a disabled toggle mid-traversal still unlocks
        if ctx.in_player_transform && ctx.root == Some(transform) {
            self.update_joint_names();
            ctx.leave();
        }

        if !self.is_enabled() {
            return;
        }

        let camera_system = self.pointers().camera_system;

        if let Some(camera_system) = camera_system {
            let host = &*self.host;
            let system_transform = host
                .camera_system_owner(camera_system)
                .and_then(|owner| host.game_object_transform(owner));

            if system_transform == Some(transform) && !self.update_pointers_from_camera_system(Some(camera_system)) {
                self.with_matrices(ctx, |matrices| self.reset_with(matrices));
                return;
            }
        }

        let p = self.pointers();
        if !self.player_camera_active(&p) {
            return;
        }

        if p.camera.and_then(|camera| self.host.camera_transform(camera)) == Some(transform) {
            self.update_camera_transform(ctx, transform, &p);
        }
    }

    fn update_camera_transform<'a>(&'a self, ctx: &mut TraversalContext<'a>, transform: TransformRef, p: &Pointers) {
        let delta_time = self.update_delta_time(transform);
        let tuning = self.tuning(&p.player_name);
        let host = &*self.host;

        self.with_matrices(ctx, |matrices| {
            let solution = matrices.step(delta_time, &tuning);

            if let Some(controller) = p.camera_system.and_then(|cs| host.camera_system_controller(cs)) {
                host.set_controller_world_position(controller, solution.position);
                host.set_controller_world_rotation(controller, solution.rotation);
            }

            host.set_transform_position(transform, solution.position);
            host.set_transform_angles(transform, solution.rotation);
            host.set_world_matrix(transform, &solution.world_matrix);
            host.set_joint_world_matrix(transform, 0, &solution.world_matrix);
        });
    }

    fn update_player_bones(&self, ctx: &mut TraversalContext<'_>, p: &Pointers) {
        let player = match p.player_transform {
            Some(player) => player,
            None => return,
        };

        let (attach_bone, hide_mesh) = {
            let settings = lock(&self.settings);
            (settings.attach_bone.clone(), settings.hide_mesh)
        };

        let host = &*self.host;
        let index = match host.find_joint(player, &attach_bone) {
            Some(index) => index,
            None => return,
        };

        let joint = match host.joint_world_matrix(player, index) {
            Some(joint) => joint,
            None => return,
        };

        let matrices = match ctx.matrices.as_mut() {
            Some(matrices) => matrices,
            None => return,
        };

        if ctx.first_time {
            matrices.last_bone_matrix = joint;
            ctx.first_time = false;
        }

        host.set_joint_world_matrix(player, index, &matrices.bone_pose(&joint, hide_mesh));
    }

    /// Fills the joint list shown in the overlay, once per player.
    pub fn update_joint_names(&self) {
        let player = match self.pointers().player_transform {
            Some(player) => player,
            None => return,
        };

        let mut settings = lock(&self.settings);
        if !settings.attach_names.is_empty() {
            return;
        }

        let host = &*self.host;
        let names = (0..host.joint_count(player)).filter_map(|i| host.joint_name(player, i));
        settings.attach_names.extend(names);
    }
}

use log::{error, info};

use crate::error::Result;
use crate::ui::Ui;

pub trait Mod: Send + Sync {
    fn name(&self) -> &str;

    fn on_initialize(&self) -> Result<()> {
        Ok(())
    }

    fn on_frame(&self) {}

    fn on_draw_ui(&self, _ui: &mut dyn Ui) {}
}

/// Registered mods, called in registration order. Mods live for the whole
/// process, like the DLL that hosts them.
#[derive(Default)]
pub struct Mods {
    mods: Vec<&'static dyn Mod>,
}

impl Mods {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, m: &'static dyn Mod) {
        self.mods.push(m);
    }

    pub fn len(&self) -> usize {
        self.mods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mods.is_empty()
    }

    /// Stops at the first mod that fails.
    pub fn on_initialize(&self) -> Result<()> {
        for m in &self.mods {
            info!("{}::on_initialize()", m.name());

            if let Err(e) = m.on_initialize() {
                error!("{}::on_initialize() has failed: {}", m.name(), e);
                return Err(e);
            }
        }

        Ok(())
    }

    pub fn on_frame(&self) {
        for m in &self.mods {
            m.on_frame();
        }
    }

    pub fn on_draw_ui(&self, ui: &mut dyn Ui) {
        for m in &self.mods {
            m.on_draw_ui(ui);
        }
    }
}

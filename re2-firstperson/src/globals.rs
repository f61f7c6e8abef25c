//! Locates the engine's singleton managed objects by type name.
//!
//! Every singleton is published through a static slot that the game loads
//! with `lea rcx, [rip+slot]` right before a tagged `mov rax`. Scanning the
//! module for that sequence yields the slot addresses; reading the slots and
//! asking each object for its type name builds the lookup map.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use log::{debug, info};

use crate::error::Result;
use crate::host::{ModuleImage, ObjectRef};
use crate::scan::{relative_target, Pattern};

pub const GLOBAL_SLOT_PATTERN: &str = "48 8D 0D ? ? ? ? 48 B8 00 00 00 00 00 00 00 80";

/// Reads slots and object metadata out of the live process.
pub trait ManagedObjectReader: Send + Sync {
    /// Pointer currently stored in `slot`, `None` if unreadable or null.
    fn read_slot(&self, slot: usize) -> Option<ObjectRef>;
    /// Type name, `None` if `obj` isn't a managed object.
    fn type_name(&self, obj: ObjectRef) -> Option<String>;
}

#[derive(Default)]
struct SlotMap {
    by_name: HashMap<String, usize>,
    acknowledged: HashSet<usize>,
}

pub struct ObjectLocator<R> {
    reader: R,
    slots: Vec<usize>,
    map: Mutex<SlotMap>,
}

impl<R: ManagedObjectReader> ObjectLocator<R> {
    pub fn scan(image: ModuleImage<'_>, reader: R) -> Result<Self> {
        info!("[GLOBALS] Scanning for global objects");

        let pattern = Pattern::parse(GLOBAL_SLOT_PATTERN)?;
        let mut seen = HashSet::new();
        let mut slots = Vec::new();

        for offset in pattern.find_iter(image.bytes) {
            let slot = match relative_target(image.bytes, image.base, offset + 3) {
                Some(slot) => slot,
                None => continue,
            };

            if seen.insert(slot) {
                debug!("[GLOBALS] Slot at 0x{:x}", slot);
                slots.push(slot);
            }
        }

        let locator = Self {
            reader,
            slots,
            map: Mutex::new(SlotMap::default()),
        };

        locator.safe_refresh();
        info!("[GLOBALS] Finished scanning, {} slots", locator.slots.len());

        Ok(locator)
    }

    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    fn refresh(&self, map: &mut SlotMap) {
        for &slot in &self.slots {
            let obj = match self.reader.read_slot(slot) {
                Some(obj) => obj,
                None => continue,
            };

            let name = match self.reader.type_name(obj) {
                Some(name) if !name.is_empty() => name,
                _ => continue,
            };

            if map.acknowledged.insert(slot) {
                info!("[GLOBALS] 0x{:x}->0x{:x} ({})", slot, obj.addr(), name);
            }

            map.by_name.insert(name, slot);
        }
    }

    pub fn safe_refresh(&self) {
        if let Ok(mut map) = self.map.lock() {
            self.refresh(&mut map);
        }
    }

    /// Current object for `name`. A miss triggers one refresh, since objects
    /// are often created after the first scan.
    pub fn get(&self, name: &str) -> Option<ObjectRef> {
        let mut map = self.map.lock().ok()?;

        let lookup = |map: &SlotMap| {
            map.by_name
                .get(name)
                .and_then(|&slot| self.reader.read_slot(slot))
        };

        if let Some(obj) = lookup(&map) {
            return Some(obj);
        }

        self.refresh(&mut map);
        lookup(&map)
    }
}

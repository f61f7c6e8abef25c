use std::path::Path;
use std::sync::Arc;

use log::info;

pub mod camera;
pub mod config;
pub mod delta_time;
pub mod error;
pub mod first_person;
pub mod fov;
pub mod globals;
pub mod host;
pub mod logging;
pub mod mods;
pub mod pipeline;
mod resolver;
pub mod scan;
pub mod ui;

#[cfg(windows)]
pub mod platform;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{Error, Result};
pub use first_person::FirstPerson;
pub use host::Host;
pub use mods::{Mod, Mods};
pub use pipeline::TraversalContext;

/// Loads the config from `dir`, registers the first person mod and
/// initializes it. The returned handle is what the transform and controller
/// hooks call into; it stays alive until the process exits.
pub fn bootstrap<H: Host + 'static>(host: Arc<H>, dir: &Path) -> Result<(Mods, &'static FirstPerson<H>)> {
    let config = Config::load_or_create(&dir.join(config::CONFIG_FILE_NAME));
    let first_person: &'static FirstPerson<H> = Box::leak(Box::new(FirstPerson::new(host, &config)));

    let mut mods = Mods::new();
    mods.push(first_person);

    if let Err(e) = mods.on_initialize() {
        #[cfg(windows)]
        platform::error_message(&e.to_string());

        return Err(e);
    }

    info!("Initialized {} mod(s)", mods.len());

    Ok((mods, first_person))
}

#[cfg(windows)]
#[no_mangle]
pub unsafe extern "system" fn DllMain(
    hinstance: winapi::shared::minwindef::HINSTANCE,
    fdw_reason: winapi::shared::minwindef::DWORD,
    _lpv_reserved: winapi::shared::minwindef::LPVOID,
) -> winapi::shared::minwindef::BOOL {
    if fdw_reason == winapi::um::winnt::DLL_PROCESS_ATTACH {
        winapi::um::libloaderapi::DisableThreadLibraryCalls(hinstance);

        let module = hinstance as usize;
        std::thread::spawn(move || platform::attach(module));
    }

    winapi::shared::minwindef::TRUE
}

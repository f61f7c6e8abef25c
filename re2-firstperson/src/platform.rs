//! Win32 side of the mod: the main module image and byte patches.

use std::ffi::CString;
use std::mem;
use std::path::PathBuf;

use log::{error, info};
use memory_rs::internal::injections::{Inject, Injection};
use memory_rs::internal::memory::resolve_module_path;
use winapi::shared::minwindef::HMODULE;
use winapi::um::consoleapi::AllocConsole;
use winapi::um::libloaderapi::GetModuleHandleA;
use winapi::um::processthreadsapi::GetCurrentProcess;
use winapi::um::psapi::{GetModuleInformation, MODULEINFO};
use winapi::um::winuser;

use crate::host::{ModuleImage, Patch};
use crate::logging;

/// The game executable as mapped in memory.
pub struct ProcessModule {
    base: usize,
    size: usize,
}

impl ProcessModule {
    pub fn main() -> Option<Self> {
        unsafe {
            let module: HMODULE = GetModuleHandleA(std::ptr::null());
            if module.is_null() {
                return None;
            }

            let mut info: MODULEINFO = mem::zeroed();
            let ok = GetModuleInformation(
                GetCurrentProcess(),
                module,
                &mut info,
                mem::size_of::<MODULEINFO>() as u32,
            );

            if ok == 0 {
                return None;
            }

            Some(Self {
                base: info.lpBaseOfDll as usize,
                size: info.SizeOfImage as usize,
            })
        }
    }

    pub fn image(&self) -> ModuleImage<'_> {
        // mapped for as long as the process runs
        let bytes = unsafe { std::slice::from_raw_parts(self.base as *const u8, self.size) };

        ModuleImage { base: self.base, bytes }
    }
}

/// Code patch backed by a `memory_rs` injection.
pub struct InjectionPatch {
    injection: Injection,
    enabled: bool,
}

impl InjectionPatch {
    pub fn new(address: usize, bytes: Vec<u8>, enabled: bool) -> Self {
        let mut injection = Injection::new(address, bytes);
        if enabled {
            injection.inject();
        }

        Self { injection, enabled }
    }
}

impl Patch for InjectionPatch {
    fn toggle(&mut self, enabled: bool) -> bool {
        if enabled != self.enabled {
            if enabled {
                self.injection.inject();
            } else {
                self.injection.remove_injection();
            }
            self.enabled = enabled;
        }

        true
    }
}

impl Drop for InjectionPatch {
    fn drop(&mut self) {
        if self.enabled {
            self.injection.remove_injection();
        }
    }
}

pub fn error_message(message: &str) {
    let title = CString::new("RE2 First Person Error").unwrap_or_default();
    let message = CString::new(message).unwrap_or_default();

    unsafe {
        winuser::MessageBoxA(std::ptr::null_mut(), message.as_ptr(), title.as_ptr(), 0x10);
    }
}

/// Directory holding the DLL, where the config and log live.
pub fn module_dir(module: usize) -> PathBuf {
    let mut path = resolve_module_path(module as *const std::ffi::c_void).unwrap_or_else(|_| PathBuf::from("."));
    if path.is_file() {
        path.pop();
    }
    path
}

/// Runs on its own thread right after the DLL is attached.
pub fn attach(module: usize) {
    unsafe {
        AllocConsole();
    }

    match logging::init(&module_dir(module)) {
        Ok(path) => info!("[PLATFORM] Logging to {}", path.display()),
        Err(e) => {
            error!("[PLATFORM] {}", e);
            error_message(&format!("Failed to initialize logging: {}", e));
            return;
        }
    }

    info!("re2-firstperson {} loaded", env!("CARGO_PKG_VERSION"));
}

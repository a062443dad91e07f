//! Proxy over the functions exported by `Rainmeter.dll`.

use std::ffi::{c_int, c_void};
use std::ptr::{self, NonNull};

use drizzle_core::marshal::{from_host_string, to_host_string};
use drizzle_core::{HostApi, HostPointer, LogLevel, Result};

const RMG_MEASURE_NAME: c_int = 0;
const RMG_SKIN: c_int = 1;
const RMG_SETTINGS_FILE: c_int = 2;
const RMG_SKIN_NAME: c_int = 3;
const RMG_SKIN_WINDOW_HANDLE: c_int = 4;

// Every host export is `__stdcall`; on x86 the names are exported without decoration.
#[cfg_attr(
    target_arch = "x86",
    link(name = "Rainmeter", kind = "raw-dylib", import_name_type = "undecorated")
)]
#[cfg_attr(not(target_arch = "x86"), link(name = "Rainmeter", kind = "raw-dylib"))]
unsafe extern "system" {
    fn RmLog(rm: *mut c_void, level: c_int, message: *const u16);
    fn RmReadString(
        rm: *mut c_void,
        option: *const u16,
        default_value: *const u16,
        replace_measures: c_int,
    ) -> *const u16;
    fn RmReadFormula(rm: *mut c_void, option: *const u16, default_value: f64) -> f64;
    fn RmReplaceVariables(rm: *mut c_void, text: *const u16) -> *const u16;
    fn RmPathToAbsolute(rm: *mut c_void, relative_path: *const u16) -> *const u16;
    fn RmGet(rm: *mut c_void, kind: c_int) -> *mut c_void;
    fn RmExecute(skin: *mut c_void, command: *const u16);
}

/// The real host proxy, bound to the `rm` context of one measure.
pub struct RainmeterHost {
    rm: NonNull<c_void>,
}

// SAFETY: the context is an opaque token; the host calls each measure from
// its own update thread and the proxy never dereferences the pointer itself.
unsafe impl Send for RainmeterHost {}

impl RainmeterHost {
    pub fn new(rm: NonNull<c_void>) -> Self {
        Self { rm }
    }

    fn rm(&self) -> *mut c_void {
        self.rm.as_ptr()
    }

    /// Copies a host string, logging before failing.
    fn host_string(&self, ptr: *const u16, caller: &'static str) -> Result<String> {
        // SAFETY: host strings stay valid until the next API call.
        unsafe { from_host_string(ptr, caller) }.map_err(|err| {
            self.log(
                LogLevel::Error,
                &format!("Marshalling pointer to unicode non-null string failed in '{caller}'!"),
            );
            err
        })
    }
}

impl HostApi for RainmeterHost {
    fn log(&self, level: LogLevel, message: &str) {
        let message = to_host_string(message);
        // SAFETY: `message` outlives the call.
        unsafe { RmLog(self.rm(), level.code(), message.as_ptr()) }
    }

    fn read_string(&self, option: &str, default: &str, replace_measures: bool) -> Result<String> {
        let option = to_host_string(option);
        let default = to_host_string(default);
        // SAFETY: both strings outlive the call.
        let value = unsafe {
            RmReadString(
                self.rm(),
                option.as_ptr(),
                default.as_ptr(),
                c_int::from(replace_measures),
            )
        };
        self.host_string(value, "ReadString")
    }

    fn read_path(&self, option: &str, default: &str) -> Result<String> {
        let relative = to_host_string(&self.read_string(option, default, true)?);
        // SAFETY: `relative` outlives the call.
        let value = unsafe { RmPathToAbsolute(self.rm(), relative.as_ptr()) };
        self.host_string(value, "ReadPath")
    }

    fn read_double(&self, option: &str, default: f64) -> f64 {
        let option = to_host_string(option);
        // SAFETY: `option` outlives the call.
        unsafe { RmReadFormula(self.rm(), option.as_ptr(), default) }
    }

    fn read_int(&self, option: &str, default: i32) -> i32 {
        self.read_double(option, f64::from(default)) as i32
    }

    fn replace_variables(&self, text: &str) -> Result<String> {
        let text = to_host_string(text);
        // SAFETY: `text` outlives the call.
        let value = unsafe { RmReplaceVariables(self.rm(), text.as_ptr()) };
        self.host_string(value, "ReplaceVariables")
    }

    fn measure_name(&self) -> Result<String> {
        // SAFETY: RmGet only reads host state.
        let value = unsafe { RmGet(self.rm(), RMG_MEASURE_NAME) };
        self.host_string(value as *const u16, "GetMeasureName")
    }

    fn skin(&self) -> HostPointer {
        // SAFETY: RmGet only reads host state.
        HostPointer::from_raw(unsafe { RmGet(self.rm(), RMG_SKIN) } as usize)
    }

    fn skin_name(&self) -> Result<String> {
        // SAFETY: RmGet only reads host state.
        let value = unsafe { RmGet(self.rm(), RMG_SKIN_NAME) };
        self.host_string(value as *const u16, "GetSkinName")
    }

    fn skin_window(&self) -> HostPointer {
        // SAFETY: RmGet only reads host state.
        HostPointer::from_raw(unsafe { RmGet(self.rm(), RMG_SKIN_WINDOW_HANDLE) } as usize)
    }

    fn settings_file(&self) -> Result<String> {
        // The settings file is global; the host expects a null context here.
        // SAFETY: RmGet only reads host state.
        let value = unsafe { RmGet(ptr::null_mut(), RMG_SETTINGS_FILE) };
        self.host_string(value as *const u16, "GetSettingsFile")
    }

    fn execute(&self, command: &str) {
        let skin = self.skin();
        if skin.is_null() {
            self.log(LogLevel::Warning, "Execute ignored, the host returned no skin");
            return;
        }

        let command = to_host_string(command);
        // SAFETY: `command` outlives the call; `skin` came from the host.
        unsafe { RmExecute(skin.raw() as *mut c_void, command.as_ptr()) }
    }
}

//! Export macro for measure plugin crates.

/// Exports the host entry points for one [`Measure`](drizzle_core::Measure) type.
///
/// Expands to a private dispatcher static plus the seven unmangled
/// `extern "C"` functions the host resolves by name: `Initialize`, `Reload`,
/// `Update`, `GetString`, `ExecuteBang`, `CustomFunc` and `Finalize`. Use it
/// once per `cdylib`; two invocations in one library collide at link time.
///
/// # Example
///
/// ```ignore
/// drizzle_plugin::export_measure!(drizzle_measures::HelloMeasure);
/// ```
#[macro_export]
macro_rules! export_measure {
    ($measure:ty) => {
        static __DRIZZLE_PLUGIN: $crate::Plugin<$measure> = $crate::Plugin::new();

        /// Creates a measure and writes its handle to `data`.
        ///
        /// # Safety
        ///
        /// Called by the host with a writable `data` slot and its API context.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn Initialize(
            data: *mut *mut ::std::ffi::c_void,
            rm: *mut ::std::ffi::c_void,
        ) {
            unsafe { $crate::ffi::initialize(&__DRIZZLE_PLUGIN, data, rm) }
        }

        /// Re-reads the measure options.
        ///
        /// # Safety
        ///
        /// Called by the host with its API context and a writable `max_value`.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn Reload(
            data: *mut ::std::ffi::c_void,
            rm: *mut ::std::ffi::c_void,
            max_value: *mut f64,
        ) {
            unsafe { $crate::ffi::reload(&__DRIZZLE_PLUGIN, data, rm, max_value) }
        }

        /// Returns the numeric value of the measure.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub extern "C" fn Update(data: *mut ::std::ffi::c_void) -> f64 {
            $crate::ffi::update(&__DRIZZLE_PLUGIN, data)
        }

        /// Returns the string value of the measure, or null.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub extern "C" fn GetString(data: *mut ::std::ffi::c_void) -> *const u16 {
            $crate::ffi::get_string(&__DRIZZLE_PLUGIN, data)
        }

        /// Handles a `!CommandMeasure` bang.
        ///
        /// # Safety
        ///
        /// `args` must be null or a NUL-terminated wide string.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn ExecuteBang(data: *mut ::std::ffi::c_void, args: *const u16) {
            unsafe { $crate::ffi::execute_bang(&__DRIZZLE_PLUGIN, data, args) }
        }

        /// Handles a section variable function call.
        ///
        /// # Safety
        ///
        /// `argv` must hold `argc` NUL-terminated wide strings.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub unsafe extern "C" fn CustomFunc(
            data: *mut ::std::ffi::c_void,
            argc: ::std::ffi::c_int,
            argv: *const *const u16,
        ) -> *const u16 {
            unsafe { $crate::ffi::custom_func(&__DRIZZLE_PLUGIN, data, argc, argv) }
        }

        /// Disposes the measure. The handle is dead afterwards.
        #[allow(non_snake_case)]
        #[unsafe(no_mangle)]
        pub extern "C" fn Finalize(data: *mut ::std::ffi::c_void) {
            $crate::ffi::finalize(&__DRIZZLE_PLUGIN, data)
        }
    };
}

//! Rainmeter plugin reporting the operating system version.
//!
//! ```ini
//! [MeasureVersion]
//! Measure=Plugin
//! Plugin=drizzle_system_version
//! ; String (default), Major, Minor or Number
//! Type=Major
//! ```

drizzle_plugin::export_measure!(drizzle_measures::SystemVersionMeasure);

#[cfg(all(test, debug_assertions))]
mod tests {
    use super::*;
    use drizzle_core::marshal::{from_host_string, to_host_string};
    use drizzle_measures::OsVersion;
    use std::ptr;

    #[test]
    fn test_default_mode_formats_version() {
        let mut data = ptr::null_mut();
        unsafe { Initialize(&mut data, ptr::null_mut()) };
        assert!(!data.is_null());

        let mut max_value = 0.0;
        unsafe { Reload(data, ptr::null_mut(), &mut max_value) };
        assert_eq!(Update(data), 0.0);

        let text = unsafe { from_host_string(GetString(data), "test") }.unwrap();
        assert_eq!(text, OsVersion::current().to_string());
        assert!(text.contains("(Build "));

        Finalize(data);
    }

    #[test]
    fn test_unsupported_calls_return_null() {
        let mut data = ptr::null_mut();
        unsafe { Initialize(&mut data, ptr::null_mut()) };

        let bang = to_host_string("Refresh");
        unsafe { ExecuteBang(data, bang.as_ptr()) };

        let arg = to_host_string("Hello");
        let argv = [arg.as_ptr()];
        assert!(unsafe { CustomFunc(data, 1, argv.as_ptr()) }.is_null());

        Finalize(data);
    }
}

//! Rainmeter plugin reporting "Hello World!".
//!
//! ```ini
//! [MeasureHello]
//! Measure=Plugin
//! Plugin=drizzle_hello
//! ```

drizzle_plugin::export_measure!(drizzle_measures::HelloMeasure);

#[cfg(all(test, debug_assertions))]
mod tests {
    use super::*;
    use drizzle_core::marshal::{from_host_string, to_host_string};
    use std::ptr;

    #[test]
    fn test_console_sequence() {
        let mut data = ptr::null_mut();
        unsafe { Initialize(&mut data, ptr::null_mut()) };
        assert!(!data.is_null());

        let mut max_value = 0.0;
        for _ in 0..3 {
            unsafe { Reload(data, ptr::null_mut(), &mut max_value) };
            assert_eq!(Update(data), 0.0);
            let text = unsafe { from_host_string(GetString(data), "test") }.unwrap();
            assert_eq!(text, "Hello World!");
        }

        let first = to_host_string("Hello");
        let second = to_host_string("Custom Function");
        let argv = [first.as_ptr(), second.as_ptr()];
        let reply = unsafe { CustomFunc(data, 2, argv.as_ptr()) };
        let reply = unsafe { from_host_string(reply, "test") }.unwrap();
        assert_eq!(reply, "Your custom invocation could be here!");

        let bang = to_host_string("Refresh");
        unsafe { ExecuteBang(data, bang.as_ptr()) };

        Finalize(data);
    }

    #[test]
    fn test_instances_are_independent() {
        let mut first = ptr::null_mut();
        let mut second = ptr::null_mut();
        unsafe {
            Initialize(&mut first, ptr::null_mut());
            Initialize(&mut second, ptr::null_mut());
        }
        assert_ne!(first, second);

        Update(first);
        Finalize(first);

        Update(second);
        let text = unsafe { from_host_string(GetString(second), "test") }.unwrap();
        assert_eq!(text, "Hello World!");
        Finalize(second);
    }
}

//! Browser builds: route panic messages to the developer console instead of a bare `abort`.

pub fn set_panic_hook() {
    console_error_panic_hook::set_once();
}

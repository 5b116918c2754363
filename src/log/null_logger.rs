/*!

A "logger" used when the `logging` feature is off. It outputs nothing but keeps the public API.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    /// Only updates `log::max_level`; there is no backend to configure.
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}

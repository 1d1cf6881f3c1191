pub mod check;
pub mod repair;
pub mod run;

use cartoprep::RepairOptions;

use crate::cli::RepairFlags;

impl RepairFlags {
    /// Repair options after applying `--no-discard`.
    pub fn options(&self) -> RepairOptions {
        RepairOptions {
            min_area: if self.no_discard { 0.0 } else { self.min_area },
            skip_validation: self.skip_validation,
        }
    }
}

/// Map a process-style exit code onto `ExitCode`; codes outside 0..=255 become 1.
pub fn to_exit_code(code: i32) -> std::process::ExitCode {
    u8::try_from(code)
        .map(std::process::ExitCode::from)
        .unwrap_or(std::process::ExitCode::FAILURE)
}

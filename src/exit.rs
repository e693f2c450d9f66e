// src/exit.rs
//! Process exit codes for `codegauge`.
//!
//! Provides a stable contract for scripts and CI.

use std::process::Termination;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum GaugeExit {
    /// Operation completed successfully.
    Success = 0,
    /// Generic error (IO, config, pool).
    Error = 1,
    /// The target path or arguments were unusable.
    InvalidInput = 2,
    /// The quality score fell below the requested threshold.
    CheckFailed = 3,
}

impl GaugeExit {
    #[must_use]
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn exit(self) -> ! {
        std::process::exit(self.code())
    }
}

impl Termination for GaugeExit {
    fn report(self) -> std::process::ExitCode {
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        std::process::ExitCode::from(self.code() as u8)
    }
}

impl From<anyhow::Result<()>> for GaugeExit {
    fn from(res: anyhow::Result<()>) -> Self {
        match res {
            Ok(()) => Self::Success,
            Err(e) => {
                eprintln!("Error: {e}");
                Self::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(GaugeExit::Success.code(), 0);
        assert_eq!(GaugeExit::Error.code(), 1);
        assert_eq!(GaugeExit::InvalidInput.code(), 2);
        assert_eq!(GaugeExit::CheckFailed.code(), 3);
        assert_eq!(GaugeExit::from(Ok(())), GaugeExit::Success);
        assert_eq!(GaugeExit::from(Err(anyhow::anyhow!("boom"))), GaugeExit::Error);
    }
}

use thiserror::Error;

/// Failures of individual installer stages.
///
/// Variants carry the raw diagnostic text of the failing command so the
/// interactive front end can show it verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InstallError {
    #[error("Requirement not met: {0}")]
    Requirement(String),

    #[error("Could not prepare install directory: {0}")]
    Filesystem(String),

    #[error("Failed to clone repository")]
    SourceFetch { output: String },

    #[error("Failed to create build environment: {message}")]
    Environment { message: String, output: String },

    #[error("Failed to install dependencies")]
    Dependency { output: String },

    #[error("Failed to apply database schema")]
    Schema { output: String },

    #[error("Failed to start the service: {0}")]
    ServiceStart(String),

    #[error("Failed to collect static assets")]
    StaticAsset { output: String },

    #[error("Failed to create shortcuts: {0}")]
    Shortcut(String),

    #[error("Failed to open browser: {0}")]
    Browser(String),
}

impl InstallError {
    /// Whether the pipeline stops at this error.
    #[must_use]
    pub const fn is_halting(&self) -> bool {
        !matches!(
            self,
            Self::StaticAsset { .. } | Self::Shortcut(_) | Self::Browser(_)
        )
    }

    /// Captured command output, when the failure came from a subprocess.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        match self {
            Self::SourceFetch { output }
            | Self::Environment { output, .. }
            | Self::Dependency { output }
            | Self::Schema { output }
            | Self::StaticAsset { output } => Some(output.as_str()).filter(|o| !o.is_empty()),
            Self::Requirement(_)
            | Self::Filesystem(_)
            | Self::ServiceStart(_)
            | Self::Shortcut(_)
            | Self::Browser(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_late_stage_failures_are_non_halting() {
        assert!(InstallError::Requirement("git".into()).is_halting());
        assert!(
            InstallError::Schema {
                output: String::new()
            }
            .is_halting()
        );
        assert!(
            !InstallError::StaticAsset {
                output: String::new()
            }
            .is_halting()
        );
        assert!(!InstallError::Browser("no opener".into()).is_halting());
        assert!(!InstallError::Shortcut("read-only".into()).is_halting());
    }

    #[test]
    fn empty_output_is_hidden() {
        let err = InstallError::SourceFetch {
            output: String::new(),
        };
        assert_eq!(err.output(), None);

        let err = InstallError::SourceFetch {
            output: "fatal: repository not found".into(),
        };
        assert_eq!(err.output(), Some("fatal: repository not found"));
    }
}

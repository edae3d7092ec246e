use regex::Regex;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// A `major.minor.patch` tool version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct ToolVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ToolVersion {
    #[must_use]
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Finds the first version number in tool output such as
    /// `rustc 1.85.0 (4d91de4e4 2025-02-17)` or `git version 2.43.0`.
    #[must_use]
    pub fn find_in(text: &str) -> Option<Self> {
        static RE: OnceLock<Regex> = OnceLock::new();
        let re = RE.get_or_init(|| {
            Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").expect("Invalid regex pattern defined in code")
        });

        let caps = re.captures(text)?;
        let part = |i: usize| {
            caps.get(i)
                .map_or(Some(0), |m| m.as_str().parse::<u32>().ok())
        };

        Some(Self::new(part(1)?, part(2)?, part(3)?))
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ToolVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match Self::find_in(trimmed) {
            Some(version) if trimmed.starts_with(|c: char| c.is_ascii_digit()) => Ok(version),
            _ => Err(format!("Invalid version '{trimmed}', expected MAJOR.MINOR.PATCH")),
        }
    }
}

/// Checks `rustc --version` output against the minimum.
pub fn check_rust_version(output: &str, minimum: ToolVersion) -> Result<ToolVersion, String> {
    let found = ToolVersion::find_in(output)
        .ok_or_else(|| format!("Could not read Rust version from '{}'", output.trim()))?;

    if found < minimum {
        return Err(format!(
            "Rust {minimum} or newer is required, found {found}"
        ));
    }

    Ok(found)
}

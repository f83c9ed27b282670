//! Kernel boot parameters shipped inside a commit.

use std::fmt;

/// Whitespace-separated kernel arguments passed to the deploy step
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootParams(Vec<String>);

impl BootParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the contents of a boot-parameter file
    pub fn parse(text: &str) -> Self {
        Self(text.split_whitespace().map(str::to_string).collect())
    }

    pub fn args(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for BootParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(" "))
    }
}

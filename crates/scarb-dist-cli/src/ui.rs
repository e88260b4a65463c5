//! Console progress output.

use scarb_dist_core::Reporter;
use scarb_dist_core::types::{Platform, Version};

/// Line-oriented [`Reporter`] writing to stderr.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter {
    quiet: bool,
}

impl ConsoleReporter {
    pub fn new(quiet: bool) -> Self {
        Self { quiet }
    }

    fn line(&self, symbol: &str, version: &Version, platform: Platform, detail: &str) {
        if !self.quiet {
            eprintln!("  {symbol} scarb {version:<12} {:<28} {detail}", platform.as_triple());
        }
    }
}

impl Reporter for ConsoleReporter {
    fn section(&self, title: &str) {
        if !self.quiet {
            eprintln!("\n{title}");
        }
    }

    fn downloading(&self, version: &Version, platform: Platform) {
        self.line("↓", version, platform, "downloading");
    }

    fn extracting(&self, version: &Version, platform: Platform) {
        self.line("…", version, platform, "extracting");
    }

    fn installing(&self, version: &Version, platform: Platform) {
        self.line("…", version, platform, "installing");
    }

    fn done(&self, version: &Version, platform: Platform, detail: &str) {
        self.line("✓", version, platform, detail);
    }

    fn failed(&self, version: &Version, platform: Platform, reason: &str) {
        // failures are shown even when quiet
        eprintln!("  ✗ scarb {version:<12} {:<28} {reason}", platform.as_triple());
    }

    fn info(&self, msg: &str) {
        if !self.quiet {
            eprintln!("  {msg}");
        }
    }

    fn warning(&self, msg: &str) {
        eprintln!("  warning: {msg}");
    }
}

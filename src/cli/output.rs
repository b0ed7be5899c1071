//! Colored output helpers for CLI
//!
//! Consistent terminal output for the lore-server binary. Every helper has a
//! plain fallback used with `--no-color`.

use owo_colors::OwoColorize;

/// Output style configuration
pub struct Output {
    /// Whether to use colored output
    pub colored: bool,
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}

impl Output {
    pub fn new() -> Self {
        Self { colored: true }
    }

    pub fn no_color() -> Self {
        Self { colored: false }
    }

    pub fn banner(&self) {
        let version = format!("v{}", env!("CARGO_PKG_VERSION"));
        if self.colored {
            println!(
                "\n   {} {}\n   {}\n",
                "lore".bright_cyan().bold(),
                version.dimmed(),
                "research jobs: prompt in, cited report out".bright_white()
            );
        } else {
            println!(
                "\n   lore {}\n   research jobs: prompt in, cited report out\n",
                version
            );
        }
    }

    pub fn success(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "✓".green().bold(), message.green());
        } else {
            println!("  [OK] {}", message);
        }
    }

    pub fn info(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "•".blue(), message);
        } else {
            println!("  [INFO] {}", message);
        }
    }

    pub fn warning(&self, message: &str) {
        if self.colored {
            println!("  {} {}", "⚠".yellow().bold(), message.yellow());
        } else {
            println!("  [WARN] {}", message);
        }
    }

    /// Errors go to stderr
    pub fn error(&self, message: &str) {
        if self.colored {
            eprintln!("  {} {}", "✗".red().bold(), message.red());
        } else {
            eprintln!("  [ERROR] {}", message);
        }
    }

    pub fn header(&self, title: &str) {
        if self.colored {
            println!("\n  {}", title.bright_white().bold().underline());
        } else {
            println!("\n  === {} ===", title);
        }
    }

    /// Aligned key-value line inside a section
    pub fn kv(&self, key: &str, value: &str) {
        let key = format!("{:<22}", format!("{}:", key));
        if self.colored {
            println!("    {} {}", key.dimmed(), value.bright_white());
        } else {
            println!("    {} {}", key, value);
        }
    }

    pub fn hint(&self, message: &str) {
        if self.colored {
            println!("\n  {}", message.dimmed().italic());
        } else {
            println!("\n  [TIP] {}", message);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_modes() {
        assert!(Output::new().colored);
        assert!(Output::default().colored);
        assert!(!Output::no_color().colored);
    }

    #[test]
    fn test_plain_output_does_not_panic() {
        let output = Output::no_color();
        output.banner();
        output.header("Jobs");
        output.kv("workers", "2");
        output.kv("a key longer than the alignment column", "");
        output.hint("set RUST_LOG=debug for more detail");
    }
}

use std::env;
use std::io::stdout;

use colored::{ColoredString, Colorize};
use is_terminal::IsTerminal;

/// Color mode configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorMode {
    /// Color when stdout is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

impl std::str::FromStr for ColorMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(ColorMode::Auto),
            "always" => Ok(ColorMode::Always),
            "never" => Ok(ColorMode::Never),
            _ => Err(format!(
                "Invalid color mode: '{}'. Valid options: auto, always, never",
                s
            )),
        }
    }
}

/// How a harness line is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Pass,
    Fail,
    Warn,
    Info,
    Header,
}

impl Tone {
    /// Bracketed tag printed before the message, if any.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Tone::Pass => Some("[PASS]"),
            Tone::Fail => Some("[FAIL]"),
            Tone::Warn => Some("[WARN]"),
            Tone::Info => Some("[INFO]"),
            Tone::Header => None,
        }
    }
}

/// TTY-aware color helper that respects NO_COLOR
#[derive(Debug, Clone)]
pub struct ColorHelper {
    mode: ColorMode,
    stdout_is_terminal: bool,
    no_color: bool,
}

impl ColorHelper {
    pub fn new(mode: ColorMode) -> Self {
        Self {
            mode,
            stdout_is_terminal: stdout().is_terminal(),
            no_color: env::var("NO_COLOR").is_ok_and(|v| !v.is_empty()),
        }
    }

    /// Helper that never emits escape codes, whatever the environment.
    pub fn plain() -> Self {
        Self {
            mode: ColorMode::Never,
            stdout_is_terminal: false,
            no_color: true,
        }
    }

    pub fn should_color_stdout(&self) -> bool {
        if self.no_color {
            return false;
        }

        match self.mode {
            ColorMode::Never => false,
            ColorMode::Always => true,
            ColorMode::Auto => self.stdout_is_terminal,
        }
    }

    /// Render `message` with its tag, colored for `tone`.
    pub fn line(&self, tone: Tone, message: &str) -> String {
        let text = match tone.tag() {
            Some(tag) => format!("{} {}", tag, message),
            None => message.to_string(),
        };
        self.paint(tone, &text).to_string()
    }

    pub fn paint(&self, tone: Tone, text: &str) -> ColoredString {
        if !self.should_color_stdout() {
            return text.normal();
        }
        match tone {
            Tone::Pass => text.green(),
            Tone::Fail => text.red(),
            Tone::Warn => text.yellow(),
            Tone::Info => text.blue(),
            Tone::Header => text.bold(),
        }
    }
}

impl Default for ColorHelper {
    fn default() -> Self {
        Self::new(ColorMode::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_parsing() {
        assert_eq!("auto".parse::<ColorMode>().unwrap(), ColorMode::Auto);
        assert_eq!("ALWAYS".parse::<ColorMode>().unwrap(), ColorMode::Always);
        assert_eq!("never".parse::<ColorMode>().unwrap(), ColorMode::Never);
        assert!("invalid".parse::<ColorMode>().is_err());
    }

    #[test]
    fn test_never_mode_is_plain() {
        let helper = ColorHelper::new(ColorMode::Never);
        assert!(!helper.should_color_stdout());
        assert_eq!(helper.line(Tone::Pass, "OK"), "[PASS] OK");
        assert_eq!(helper.line(Tone::Header, "Summary"), "Summary");
    }

    #[test]
    fn test_always_mode_colors_unless_no_color() {
        let helper = ColorHelper::new(ColorMode::Always);
        if !helper.no_color {
            assert!(helper.should_color_stdout());
        }
        assert!(!ColorHelper::plain().should_color_stdout());
    }
}

// ABOUTME: Configuration and constants for the interpreter driver

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const WELCOME_MESSAGE: &str = "PSIL interactive mode";
pub const WELCOME_FOOTER: &str = "Use (quit) to exit";

pub const PROMPT: &str = "> ";
pub const HISTORY_FILE: &str = ".psil_history";

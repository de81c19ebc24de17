// Discord commands module.
// Each feature gets its own command file.

pub mod about;

// Bot presence management
pub mod presence;

//! CLI subcommand implementations.

pub mod add;
pub mod clock;
pub mod edit;
pub mod invoice;
pub mod log;
pub mod status;
pub mod util;

mod info;
mod rid;
mod run;
mod targets;

pub use info::cmd_info;
pub use rid::cmd_rid;
pub use run::{RunOptions, cmd_run};
pub use targets::cmd_targets;

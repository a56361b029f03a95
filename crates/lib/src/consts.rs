/// Application name, used for log prefixes and default file names.
pub const APP_NAME: &str = "hostpack";

/// Default build configuration file looked up in the working directory.
pub const CONFIG_FILENAME: &str = "hostpack.json";

/// Environment variable naming an explicit build configuration file.
pub const CONFIG_ENV: &str = "HOSTPACK_CONFIG";

/// File extension of the packages produced by the packaging step.
pub const PACKAGE_EXTENSION: &str = "nupkg";

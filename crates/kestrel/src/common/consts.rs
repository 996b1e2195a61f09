/// Names for the default directories and files.
pub const DEFAULT_ROOT_DIR: &str = ".kestrel";
pub const DEFAULT_CONFIG_FILENAME: &str = "config.yml";

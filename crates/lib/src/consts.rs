/// Application name, used for default directories.
pub const APP_NAME: &str = "parcel";

/// Default project manifest file name.
pub const MANIFEST_FILENAME: &str = "parcel.toml";

/// Packaging kind used when neither the request nor the project names one.
pub const DEFAULT_PACKAGING: &str = "zip";

/// Type given to companion descriptor artifacts.
pub const DESCRIPTOR_TYPE: &str = "pom";

/// Version directory used in the repository layout for unversioned artifacts.
pub const UNVERSIONED: &str = "unversioned";

/// Separator between the segments of a hierarchical project name.
pub const PROJECT_SEPARATOR: char = ':';

/// Per-project directory names, relative to the project base dir.
pub const TARGET_DIR: &str = "target";
pub const OUTPUT_DIR: &str = "out";
pub const SOURCES_DIR: &str = "src";
pub const DOCS_DIR: &str = "doc";

/// Directory under the target dir holding spec-addressed package outputs.
pub const PACKAGES_DIR: &str = "pkg";

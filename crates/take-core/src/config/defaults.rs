//! Default configuration values

/// Default namespace separator
pub const DEFAULT_NAMESPACE_SEPARATOR: &str = ":";

/// Default parent directive
pub const DEFAULT_NAMESPACE_PARENT: &str = "^";

/// Default program used to run shell commands
pub const DEFAULT_SHELL: &str = "sh";

/// Default Takefile name (YAML)
pub const DEFAULT_TAKEFILE_YAML: &str = "Takefile.yaml";

/// Default Takefile name (TOML)
pub const DEFAULT_TAKEFILE_TOML: &str = "Takefile.toml";

/// Get list of Takefile names to search for, in priority order
pub fn takefile_names() -> Vec<&'static str> {
    vec![
        DEFAULT_TAKEFILE_YAML,
        "Takefile.yml",
        DEFAULT_TAKEFILE_TOML,
        "Takefile",
        ".takefile.yaml",
    ]
}

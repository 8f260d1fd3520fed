//! Built-in tool implementations for yaa.
//!
//! Tools give the agent the ability to look around the machine it runs
//! on: read files, list directories, fetch web pages, and check the
//! clock and the working directory.

pub mod current_dir;
pub mod fetch;
pub mod get_time;
pub mod list_files;
pub mod read_file;

use yaa_core::tool::ToolRegistry;

/// Startup-time knobs for the built-in tools.
#[derive(Debug, Clone, Default)]
pub struct ToolOptions {
    /// User-Agent sent by `fetch`; the HTTP client default when `None`
    pub user_agent: Option<String>,
}

/// Create a tool registry with all built-in tools.
pub fn default_registry(options: &ToolOptions) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(read_file::definition());
    registry.register(list_files::definition());
    registry.register(fetch::definition(options.user_agent.clone()));
    registry.register(get_time::definition());
    registry.register(current_dir::definition());
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_tools() {
        let registry = default_registry(&ToolOptions::default());
        let mut names = registry.names();
        names.sort();
        assert_eq!(
            names,
            vec!["current_dir", "fetch", "get_time", "list_files", "read_file"]
        );
    }

    #[test]
    fn catalog_exports() {
        let registry = default_registry(&ToolOptions {
            user_agent: Some("yaa/0.1".into()),
        });
        let catalog = registry.catalog_for_model().unwrap();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.iter().all(|spec| !spec.description.is_empty()));
    }
}

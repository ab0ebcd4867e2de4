// ABOUTME: Ordered list of migration action display names, "Setup" first
// ABOUTME: Built once from the engine's declared content-type pipeline and shared by reference

use crate::engine::ContentType;

pub const SETUP_ACTION: &str = "Setup";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionCatalog {
    actions: Vec<String>,
}

impl ActionCatalog {
    pub fn from_content_types(content_types: &[ContentType]) -> Self {
        let mut actions = Vec::with_capacity(content_types.len() + 1);
        actions.push(SETUP_ACTION.to_string());
        actions.extend(content_types.iter().map(ContentType::display_name));
        Self { actions }
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.actions.get(index).map(String::as_str)
    }

    /// Position of `name`, or -1 when it is not part of the pipeline.
    pub fn index_of(&self, name: &str) -> i64 {
        self.actions
            .iter()
            .position(|action| action == name)
            .map_or(-1, |i| i as i64)
    }
}

/// "ServerExtractRefreshTask" -> "Server Extract Refresh Task"
pub fn split_camel_case(key: &str) -> String {
    let mut label = String::with_capacity(key.len() + 4);
    for (i, ch) in key.chars().enumerate() {
        if i > 0 && ch.is_uppercase() {
            label.push(' ');
        }
        label.push(ch);
    }
    label
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> ActionCatalog {
        ActionCatalog::from_content_types(&[
            ContentType::new("User"),
            ContentType::new("DataSource"),
            ContentType::new("ServerExtractRefreshTask"),
        ])
    }

    #[test]
    fn test_setup_comes_first() {
        let catalog = catalog();
        assert_eq!(
            catalog.actions(),
            ["Setup", "User", "Data Source", "Server Extract Refresh Task"]
        );
        assert_eq!(catalog.len(), 4);
    }

    #[test]
    fn test_index_of() {
        let catalog = catalog();
        assert_eq!(catalog.index_of("Setup"), 0);
        assert_eq!(catalog.index_of("Data Source"), 2);
        assert_eq!(catalog.index_of("DataSource"), -1);
        assert_eq!(catalog.index_of(""), -1);
    }

    #[test]
    fn test_split_camel_case() {
        assert_eq!(split_camel_case("Workbook"), "Workbook");
        assert_eq!(split_camel_case("CustomView"), "Custom View");
        assert_eq!(split_camel_case(""), "");
    }
}

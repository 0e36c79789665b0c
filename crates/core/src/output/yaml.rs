use super::FormatError;
use serde::Serialize;

/// YAML of a fold map, a grouped map or a single file
pub fn to_yaml<T: Serialize + ?Sized>(value: &T) -> Result<String, FormatError> {
    serde_yaml::to_string(value).map_err(FormatError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoldOutline, FoldType};

    #[test]
    fn test_nested_folds_yaml() {
        let method = FoldOutline {
            fold_type: FoldType::Code,
            start_offset: 12,
            end_offset: Some(30),
            start_line: 1,
            end_line: 3,
            line_count: 2,
            collapsed: false,
            children: vec![],
        };
        let class = FoldOutline {
            start_offset: 8,
            end_offset: Some(32),
            start_line: 0,
            end_line: 4,
            line_count: 4,
            children: vec![method.clone()],
            ..method
        };

        let yaml = to_yaml(&class).unwrap();
        assert!(yaml.contains("fold_type: code"));
        assert!(yaml.contains("children:"));
        assert!(yaml.contains("  start_line: 1"));
    }
}

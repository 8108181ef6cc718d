use std::collections::HashMap;
use voxchat_core::EngineError;

use crate::recognizer::SpeechRecognizer;

pub struct EngineRegistry {
    factories: HashMap<String, fn() -> Box<dyn SpeechRecognizer>>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            factories: HashMap::new(),
        };
        registry.register("null", || {
            Box::new(crate::null_recognizer::NullRecognizer::new())
        });
        #[cfg(feature = "whisper")]
        registry.register("whisper", || {
            Box::new(crate::whisper_recognizer::WhisperRecognizer::new())
        });
        registry
    }

    pub fn register(&mut self, name: &str, factory: fn() -> Box<dyn SpeechRecognizer>) {
        self.factories.insert(name.to_string(), factory);
    }

    pub fn create(&self, name: &str) -> Result<Box<dyn SpeechRecognizer>, EngineError> {
        self.factories
            .get(name)
            .map(|f| f())
            .ok_or_else(|| EngineError::EngineNotFound(name.to_string()))
    }

    pub fn list_engines(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::null_recognizer::NullRecognizer;

    #[test]
    fn test_registry_new_has_null_recognizer() {
        let registry = EngineRegistry::new();
        assert!(registry.create("null").is_ok());
    }

    #[test]
    fn test_registry_create_null_returns_correct_name() {
        let registry = EngineRegistry::new();
        let engine = registry.create("null").unwrap();
        assert_eq!(engine.name(), "null");
    }

    #[test]
    fn test_registry_create_unknown_returns_error() {
        let registry = EngineRegistry::new();
        match registry.create("nope") {
            Err(EngineError::EngineNotFound(name)) => assert_eq!(name, "nope"),
            _ => panic!("expected EngineNotFound error"),
        }
    }

    #[test]
    fn test_registry_register_custom_recognizer() {
        let mut registry = EngineRegistry::new();
        registry.register("custom", || Box::new(NullRecognizer::new()));
        let engine = registry.create("custom").unwrap();
        assert_eq!(engine.name(), "null");
    }

    #[test]
    fn test_registry_list_engines_includes_null() {
        let registry = EngineRegistry::new();
        assert!(registry.list_engines().contains(&"null"));
    }
}

use std::collections::HashMap;

// Locale is the host-provided localization function. Every user-facing
// string of the dashboard is looked up here by its English msgid; a missing
// entry falls back to the msgid itself.
#[derive(Debug, Clone, Default)]
pub struct Locale {
    catalog: HashMap<String, String>,
}

impl Locale {
    pub fn new(catalog: HashMap<String, String>) -> Self {
        Self { catalog }
    }

    pub fn tr(&self, msgid: &str) -> String {
        match self.catalog.get(msgid) {
            Some(msg) if !msg.is_empty() => msg.clone(),
            _ => msgid.to_string(),
        }
    }
}

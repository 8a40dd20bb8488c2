use gembridge_protocol::gemini::get_model::types::Model;
use gembridge_protocol::gemini::list_models::response::ListModelsResponse;

const MODEL_PREFIX: &str = "models/";

/// The fixed set of model ids clients may address.
#[derive(Debug, Clone, Default)]
pub struct ModelCatalog {
    models: Vec<String>,
}

impl ModelCatalog {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = Vec::new();
        for model in models {
            let model = model.into();
            let id = model.trim().trim_start_matches(MODEL_PREFIX);
            if !id.is_empty() && !ids.iter().any(|known| known == id) {
                ids.push(id.to_string());
            }
        }
        Self { models: ids }
    }

    pub fn contains(&self, model: &str) -> bool {
        let id = model.trim_start_matches(MODEL_PREFIX);
        self.models.iter().any(|known| known == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.models
    }

    pub fn get(&self, name: &str) -> Option<Model> {
        let id = name.trim_start_matches(MODEL_PREFIX);
        self.contains(id).then(|| describe(id))
    }

    pub fn list(&self) -> ListModelsResponse {
        ListModelsResponse {
            models: self.models.iter().map(|id| describe(id)).collect(),
            next_page_token: None,
        }
    }
}

fn describe(id: &str) -> Model {
    Model {
        name: format!("{MODEL_PREFIX}{id}"),
        base_model_id: id.to_string(),
        version: "001".to_string(),
        display_name: Some(id.to_string()),
        description: Some(format!("{id} served through GitHub Copilot chat completions")),
        supported_generation_methods: Some(vec![
            "generateContent".to_string(),
            "streamGenerateContent".to_string(),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_and_duplicates_are_normalised() {
        let catalog = ModelCatalog::new(["gpt-4o", "models/gpt-4o", " claude-sonnet-4 ", ""]);
        assert_eq!(catalog.ids(), ["gpt-4o".to_string(), "claude-sonnet-4".to_string()]);
        assert!(catalog.contains("models/claude-sonnet-4"));
        assert!(!catalog.contains("gemini-2.5-pro"));
    }

    #[test]
    fn models_are_described_in_gemini_shape() {
        let catalog = ModelCatalog::new(["gpt-4o"]);

        let listed = serde_json::to_value(catalog.list()).unwrap();
        assert_eq!(listed["models"][0]["name"], "models/gpt-4o");
        assert_eq!(listed["models"][0]["baseModelId"], "gpt-4o");
        assert_eq!(
            listed["models"][0]["supportedGenerationMethods"],
            serde_json::json!(["generateContent", "streamGenerateContent"])
        );
        assert_eq!(catalog.get("models/gpt-4o").map(|model| model.base_model_id), Some("gpt-4o".to_string()));
        assert!(catalog.get("o3").is_none());
    }
}

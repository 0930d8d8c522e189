//! Typed helpers over a [`KeyValueStore`].

use super::{KeyValueStore, StoreError};
use crate::prompts::{DEFAULT_PROMPTS, DEFAULT_PROMPT_NAME};
use cf_protocol::automation_models::Automation;
use cf_protocol::config_models::{ModelDescriptor, ModuleId, ProviderConfig};
use cf_protocol::run_models::InteractionRecord;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

const AUTOMATIONS_KEY: &str = "automations";
const CUSTOM_PROMPTS_KEY: &str = "system_prompts";
const CURRENT_PROMPT_KEY: &str = "current_system_prompt";
const ACTIVE_MODEL_KEY: &str = "active_model";
const ACTIVE_MODULES_KEY: &str = "active_modules";
const PROVIDER_KEY: &str = "provider_config";
const INTERACTIONS_KEY: &str = "interaction_log";

/// Highest accepted validation score.
pub const MAX_VALIDATION_SCORE: u8 = 10;

/// Typed access to everything the application persists.
#[derive(Clone)]
pub struct Records {
    store: Arc<dyn KeyValueStore>,
}

impl Records {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StoreError> {
        match self.store.get(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        self.store.set(key, serde_json::to_value(value)?).await
    }

    // Automations

    pub async fn automations(&self) -> Result<Vec<Automation>, StoreError> {
        Ok(self.read(AUTOMATIONS_KEY).await?.unwrap_or_default())
    }

    /// Insert `automation`, replacing any stored automation with the same id.
    pub async fn save_automation(&self, automation: Automation) -> Result<(), StoreError> {
        let mut automations = self.automations().await?;
        match automations.iter_mut().find(|a| a.id == automation.id) {
            Some(existing) => *existing = automation,
            None => automations.push(automation),
        }
        self.write(AUTOMATIONS_KEY, &automations).await
    }

    /// Delete by id. Returns whether anything was removed.
    pub async fn delete_automation(&self, id: &str) -> Result<bool, StoreError> {
        let mut automations = self.automations().await?;
        let before = automations.len();
        automations.retain(|a| a.id != id);
        if automations.len() == before {
            return Ok(false);
        }
        self.write(AUTOMATIONS_KEY, &automations).await?;
        Ok(true)
    }

    /// All automations as a pretty-printed JSON array.
    pub async fn export_automations(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.automations().await?)?)
    }

    /// Replace all automations with the JSON array in `json`.
    ///
    /// Nothing is written unless the whole array parses.
    pub async fn import_automations(&self, json: &str) -> Result<usize, StoreError> {
        let automations: Vec<Automation> = serde_json::from_str(json)?;
        self.write(AUTOMATIONS_KEY, &automations).await?;
        Ok(automations.len())
    }

    // System prompts

    /// Built-in prompts merged with custom ones; a custom prompt overrides a
    /// built-in of the same name.
    pub async fn system_prompts(&self) -> Result<BTreeMap<String, String>, StoreError> {
        let mut prompts: BTreeMap<String, String> = DEFAULT_PROMPTS
            .iter()
            .map(|(name, text)| ((*name).to_string(), (*text).to_string()))
            .collect();
        let custom: BTreeMap<String, String> =
            self.read(CUSTOM_PROMPTS_KEY).await?.unwrap_or_default();
        prompts.extend(custom);
        Ok(prompts)
    }

    /// Save a custom prompt and make it the current one.
    pub async fn save_system_prompt(&self, name: &str, text: &str) -> Result<(), StoreError> {
        let mut custom: BTreeMap<String, String> =
            self.read(CUSTOM_PROMPTS_KEY).await?.unwrap_or_default();
        custom.insert(name.to_string(), text.to_string());
        self.write(CUSTOM_PROMPTS_KEY, &custom).await?;
        self.write(CURRENT_PROMPT_KEY, &text).await
    }

    /// The prompt text currently applied, falling back to the built-in default.
    pub async fn current_system_prompt(&self) -> Result<String, StoreError> {
        if let Some(text) = self.read::<String>(CURRENT_PROMPT_KEY).await? {
            return Ok(text);
        }
        Ok(crate::prompts::default_prompt(DEFAULT_PROMPT_NAME)
            .unwrap_or_default()
            .to_string())
    }

    /// Delete a custom prompt. Built-in prompts are protected.
    pub async fn delete_system_prompt(&self, name: &str) -> Result<bool, StoreError> {
        if crate::prompts::default_prompt(name).is_some() {
            return Err(StoreError::ProtectedPrompt(name.to_string()));
        }
        let mut custom: BTreeMap<String, String> =
            self.read(CUSTOM_PROMPTS_KEY).await?.unwrap_or_default();
        if custom.remove(name).is_none() {
            return Ok(false);
        }
        self.write(CUSTOM_PROMPTS_KEY, &custom).await?;
        Ok(true)
    }

    // Model, modules, provider

    pub async fn active_model(&self) -> Result<Option<ModelDescriptor>, StoreError> {
        self.read(ACTIVE_MODEL_KEY).await
    }

    pub async fn set_active_model(&self, model: Option<&ModelDescriptor>) -> Result<(), StoreError> {
        match model {
            Some(model) => self.write(ACTIVE_MODEL_KEY, model).await,
            None => self.store.remove(ACTIVE_MODEL_KEY).await,
        }
    }

    pub async fn active_modules(&self) -> Result<Vec<ModuleId>, StoreError> {
        Ok(self.read(ACTIVE_MODULES_KEY).await?.unwrap_or_default())
    }

    pub async fn set_active_modules(&self, modules: &[ModuleId]) -> Result<(), StoreError> {
        self.write(ACTIVE_MODULES_KEY, &modules).await
    }

    pub async fn provider_config(&self) -> Result<Option<ProviderConfig>, StoreError> {
        self.read(PROVIDER_KEY).await
    }

    pub async fn save_provider_config(&self, config: &ProviderConfig) -> Result<(), StoreError> {
        self.write(PROVIDER_KEY, config).await
    }

    pub async fn clear_provider_config(&self) -> Result<(), StoreError> {
        self.store.remove(PROVIDER_KEY).await
    }

    // Interaction log

    pub async fn interactions(&self) -> Result<Vec<InteractionRecord>, StoreError> {
        Ok(self.read(INTERACTIONS_KEY).await?.unwrap_or_default())
    }

    pub async fn log_interaction(&self, record: InteractionRecord) -> Result<(), StoreError> {
        let mut log = self.interactions().await?;
        log.push(record);
        self.write(INTERACTIONS_KEY, &log).await
    }

    /// Rate the most recent interaction. Resubmitting overwrites the score.
    pub async fn score_last_interaction(&self, score: u8) -> Result<(), StoreError> {
        if score > MAX_VALIDATION_SCORE {
            return Err(StoreError::InvalidScore(score));
        }
        let mut log = self.interactions().await?;
        let last = log.last_mut().ok_or(StoreError::EmptyLog)?;
        last.validated = true;
        last.validation_score = score;
        self.write(INTERACTIONS_KEY, &log).await
    }

    /// Interactions that were rated, for exporting training data.
    pub async fn validated_interactions(&self) -> Result<Vec<InteractionRecord>, StoreError> {
        Ok(self
            .interactions()
            .await?
            .into_iter()
            .filter(|record| record.validated)
            .collect())
    }

    pub async fn clear_interactions(&self) -> Result<(), StoreError> {
        self.store.remove(INTERACTIONS_KEY).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::Utc;
    use cf_protocol::config_models::ModelProvider;
    use uuid::Uuid;

    fn records() -> Records {
        Records::new(Arc::new(MemoryStore::new()))
    }

    fn automation(id: &str, name: &str) -> Automation {
        Automation {
            id: id.to_string(),
            name: name.to_string(),
            prompts: vec!["A".to_string()],
            infinite_loop: false,
        }
    }

    fn interaction(prompt: &str) -> InteractionRecord {
        InteractionRecord {
            run_id: Uuid::new_v4(),
            prompt: prompt.to_string(),
            code: Some("fn a() {}".to_string()),
            validated: false,
            validation_score: 0,
            debugged: false,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_automation_upsert_and_delete() {
        let records = records();
        records.save_automation(automation("a1", "First")).await.unwrap();
        records.save_automation(automation("a2", "Second")).await.unwrap();
        records.save_automation(automation("a1", "Renamed")).await.unwrap();

        let automations = records.automations().await.unwrap();
        assert_eq!(automations.len(), 2);
        assert_eq!(automations[0].name, "Renamed");

        assert!(records.delete_automation("a2").await.unwrap());
        assert!(!records.delete_automation("a2").await.unwrap());
        assert_eq!(records.automations().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_automation_export_import() {
        let source = records();
        source.save_automation(automation("a1", "First")).await.unwrap();
        let exported = source.export_automations().await.unwrap();

        let target = records();
        target.save_automation(automation("old", "Old")).await.unwrap();
        assert_eq!(target.import_automations(&exported).await.unwrap(), 1);
        assert_eq!(target.automations().await.unwrap()[0].id, "a1");

        assert!(target.import_automations("{\"not\": \"an array\"}").await.is_err());
        assert_eq!(target.automations().await.unwrap()[0].id, "a1");
    }

    #[tokio::test]
    async fn test_system_prompts() {
        let records = records();
        assert!(records
            .current_system_prompt()
            .await
            .unwrap()
            .starts_with("You are an AI assistant specialized"));

        records.save_system_prompt("rust", "You are a Rust expert.").await.unwrap();
        assert_eq!(
            records.current_system_prompt().await.unwrap(),
            "You are a Rust expert."
        );

        let prompts = records.system_prompts().await.unwrap();
        assert!(prompts.contains_key("python"));
        assert!(prompts.contains_key("rust"));

        assert!(matches!(
            records.delete_system_prompt("python").await,
            Err(StoreError::ProtectedPrompt(_))
        ));
        assert!(records.delete_system_prompt("rust").await.unwrap());
        assert!(!records.system_prompts().await.unwrap().contains_key("rust"));
    }

    #[tokio::test]
    async fn test_model_and_modules() {
        let records = records();
        assert_eq!(records.active_model().await.unwrap(), None);

        let model = ModelDescriptor {
            id: "codellama".to_string(),
            name: "CodeLlama".to_string(),
            description: String::new(),
            provider: ModelProvider::Ollama,
        };
        records.set_active_model(Some(&model)).await.unwrap();
        assert_eq!(records.active_model().await.unwrap(), Some(model));
        records.set_active_model(None).await.unwrap();
        assert_eq!(records.active_model().await.unwrap(), None);

        records
            .set_active_modules(&[ModuleId::Code, ModuleId::Debug])
            .await
            .unwrap();
        assert_eq!(
            records.active_modules().await.unwrap(),
            vec![ModuleId::Code, ModuleId::Debug]
        );
    }

    #[tokio::test]
    async fn test_interaction_scoring() {
        let records = records();
        assert!(matches!(
            records.score_last_interaction(5).await,
            Err(StoreError::EmptyLog)
        ));

        records.log_interaction(interaction("first")).await.unwrap();
        records.log_interaction(interaction("second")).await.unwrap();
        records.score_last_interaction(7).await.unwrap();
        records.score_last_interaction(9).await.unwrap();

        assert!(matches!(
            records.score_last_interaction(11).await,
            Err(StoreError::InvalidScore(11))
        ));

        let validated = records.validated_interactions().await.unwrap();
        assert_eq!(validated.len(), 1);
        assert_eq!(validated[0].prompt, "second");
        assert_eq!(validated[0].validation_score, 9);
    }
}

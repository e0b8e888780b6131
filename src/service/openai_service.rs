use async_trait::async_trait;

use crate::clients::openai_client::{self, OpenAISettings};

#[async_trait]
pub trait OpenAIClient: Send + Sync {
    async fn generate_prompt(
        &self,
        prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>>;
}

pub struct OpenAIService {
    settings: OpenAISettings,
}

impl OpenAIService {
    pub fn new(settings: OpenAISettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &OpenAISettings {
        &self.settings
    }
}

#[async_trait]
impl OpenAIClient for OpenAIService {
    async fn generate_prompt(
        &self,
        prompt: &str,
        prompt_type: &str,
    ) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
        openai_client::generate_openai_prompt(prompt, prompt_type, &self.settings).await
    }
}

// src/ai_fill.rs
//! Fill a whole CV from a free-text job description using the generative service

use serde_json::{json, Value};
use std::sync::Arc;
use thiserror::Error;

use crate::app_log;
use crate::core::ContentGenerator;
use crate::types::CvDocument;

pub const AI_FILL_FAILED_MESSAGE: &str = "Failed to generate CV data. Please try again.";

#[derive(Debug, Error)]
pub enum AiFillError {
    #[error("generative service call failed: {0:#}")]
    Service(anyhow::Error),
    #[error("generative service returned an empty response")]
    EmptyResponse,
    #[error("generated CV could not be parsed: {0}")]
    Parse(String),
}

impl AiFillError {
    /// The one message shown to users for any generation failure
    pub fn user_message(&self) -> &'static str {
        AI_FILL_FAILED_MESSAGE
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Service(_) => "AI_SERVICE_ERROR",
            Self::EmptyResponse => "AI_EMPTY_RESPONSE",
            Self::Parse(_) => "AI_PARSE_ERROR",
        }
    }
}

#[derive(Clone)]
pub struct AiFillAdapter {
    generator: Arc<dyn ContentGenerator>,
}

impl AiFillAdapter {
    pub fn new(generator: Arc<dyn ContentGenerator>) -> Self {
        Self { generator }
    }

    pub async fn generate(&self, prompt: &str) -> Result<CvDocument, AiFillError> {
        let full_prompt = build_prompt(prompt);
        app_log!(info, "Generating CV from a {} character prompt", prompt.len());

        let text = self
            .generator
            .generate_json(&full_prompt, &cv_schema())
            .await
            .map_err(|e| {
                app_log!(error, "Generative service failed: {:#}", e);
                AiFillError::Service(e)
            })?;

        let document = parse_document(&text)?;
        app_log!(
            info,
            "Generated CV with {} experiences, {} projects",
            document.experiences.len(),
            document.projects.len()
        );
        Ok(document)
    }
}

pub fn build_prompt(prompt: &str) -> String {
    format!(
        "Based on the following job role or description, generate a complete, professional CV in JSON format. The CV should be well-written, tailored to the role, and contain realistic but impressive details. Job Role/Description: \"{}\"",
        prompt
    )
}

/// Parse generated text into a document; missing or null fields take their defaults
pub fn parse_document(text: &str) -> Result<CvDocument, AiFillError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AiFillError::EmptyResponse);
    }

    let value: Value =
        serde_json::from_str(text).map_err(|e| AiFillError::Parse(e.to_string()))?;
    if !value.is_object() {
        return Err(AiFillError::Parse(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }

    serde_json::from_value(value).map_err(|e| AiFillError::Parse(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Response schema sent with every generation request
pub fn cv_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "fullName": { "type": "STRING", "description": "Full name of the person." },
            "title": { "type": "STRING", "description": "Professional title or role, like 'Senior Software Engineer'." },
            "contact": {
                "type": "OBJECT",
                "properties": {
                    "email": { "type": "STRING", "description": "Email address." },
                    "phone": { "type": "STRING", "description": "Phone number." },
                    "website": { "type": "STRING", "description": "Personal website or portfolio URL." },
                    "linkedin": { "type": "STRING", "description": "LinkedIn profile URL." }
                },
                "required": ["email", "phone"]
            },
            "summary": { "type": "STRING", "description": "A 3-4 sentence professional summary." },
            "experiences": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "role": { "type": "STRING" },
                        "company": { "type": "STRING" },
                        "duration": { "type": "STRING", "description": "e.g., 'Jan 2020 - Present'" },
                        "details": { "type": "STRING", "description": "Bulleted list of responsibilities and achievements." }
                    },
                    "required": ["role", "company", "duration", "details"]
                }
            },
            "education": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "degree": { "type": "STRING", "description": "e.g., 'B.S. in Computer Science'" },
                        "institute": { "type": "STRING" },
                        "year": { "type": "STRING", "description": "e.g., '2016 - 2020'" }
                    },
                    "required": ["degree", "institute", "year"]
                }
            },
            "skills": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "A list of relevant technical and soft skills."
            },
            "projects": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": { "type": "STRING" },
                        "link": { "type": "STRING", "description": "URL to the project or repository." },
                        "details": { "type": "STRING", "description": "A brief description of the project." }
                    },
                    "required": ["title", "details"]
                }
            },
            "certifications": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "name": { "type": "STRING" },
                        "issuer": { "type": "STRING" },
                        "year": { "type": "STRING" }
                    },
                    "required": ["name", "issuer"]
                }
            },
            "languages": {
                "type": "ARRAY",
                "items": { "type": "STRING" },
                "description": "List of languages spoken, e.g., 'English (Native)', 'Spanish (Professional)'"
            },
            "hobbies": { "type": "STRING", "description": "A short list of hobbies or interests." }
        },
        "required": ["fullName", "title", "contact", "summary", "experiences", "education", "skills"]
    })
}

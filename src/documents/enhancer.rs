use axum::async_trait;
use tracing::debug;

/// Result of running an enhancement: rewritten text plus the ordered list of
/// improvement descriptions. The two always travel together so the document
/// store can persist them atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enhancement {
    pub enhanced_text: String,
    pub improvements: Vec<String>,
}

/// Where an enhancement request came from. Each trigger produces a slightly
/// different rewrite template and improvements list.
#[derive(Debug, Clone, Copy)]
pub enum EnhanceTrigger<'a> {
    /// Document created from pasted text; enhanced immediately.
    Created,
    /// Document created from a file upload; enhanced immediately.
    Uploaded { file_name: &'a str },
    /// Explicit enhance call on an existing document.
    Requested,
}

#[async_trait]
pub trait EnhancementProvider: Send + Sync {
    async fn enhance(
        &self,
        text: &str,
        trigger: EnhanceTrigger<'_>,
    ) -> anyhow::Result<Enhancement>;
}

/// Deterministic provider: embeds the original text into a fixed template and
/// returns a canned improvements list. No model call happens anywhere.
#[derive(Debug, Clone, Default)]
pub struct TemplateEnhancer;

const BASE_IMPROVEMENTS: [&str; 9] = [
    "Improved sentence structure for better readability",
    "Enhanced vocabulary and word choice",
    "Added transitional phrases for smoother flow",
    "Corrected grammar and punctuation errors",
    "Strengthened opening and closing statements",
    "Improved paragraph organization",
    "Enhanced clarity and conciseness",
    "Better use of active voice",
    "Improved document structure and hierarchy",
];

fn improvements_for(trigger: EnhanceTrigger<'_>) -> Vec<String> {
    let mut list: Vec<String> = BASE_IMPROVEMENTS.iter().map(|s| s.to_string()).collect();
    match trigger {
        EnhanceTrigger::Created => {}
        EnhanceTrigger::Requested => {
            list.push("Added professional formatting and presentation".into());
        }
        EnhanceTrigger::Uploaded { .. } => {
            list.push("Added professional formatting and presentation".into());
            list.push("Enhanced narrative flow and engagement".into());
            list.push("Optimized content for target audience".into());
        }
    }
    list
}

fn created_template(text: &str) -> String {
    format!(
        "Enhanced version of: {text}\n\
         \n\
         This document has been improved with AI-powered enhancements:\n\
         \n\
         ORIGINAL CONTENT:\n\
         {text}\n\
         \n\
         ENHANCED VERSION:\n\
         {text}\n\
         \n\
         The enhanced version includes:\n\
         - Better structure and flow\n\
         - Enhanced clarity and readability\n\
         - Improved grammar and style\n\
         - Stronger narrative elements\n\
         - More engaging language\n\
         - Professional tone and presentation\n\
         \n\
         This enhanced version maintains your original message while improving \
         clarity, engagement, and professional presentation."
    )
}

fn requested_template(text: &str) -> String {
    format!(
        "Enhanced version of: {text}\n\
         \n\
         This document has been improved with AI-powered enhancements:\n\
         \n\
         ORIGINAL CONTENT:\n\
         {text}\n\
         \n\
         ENHANCED VERSION:\n\
         {text}\n\
         \n\
         The enhanced version includes:\n\
         - Better structure and flow\n\
         - Enhanced clarity and readability\n\
         - Improved grammar and style\n\
         - Stronger narrative elements\n\
         - More engaging language\n\
         - Professional tone and presentation\n\
         \n\
         AI IMPROVEMENTS APPLIED:\n\
         - Restructured for better logical flow\n\
         - Enhanced vocabulary with precise word choices\n\
         - Added smooth transitions between ideas\n\
         - Improved sentence variety and rhythm\n\
         - Strengthened opening and closing statements\n\
         - Polished grammar and punctuation throughout\n\
         \n\
         This enhanced version maintains your original message while improving \
         clarity, engagement, and professional presentation."
    )
}

fn uploaded_template(file_name: &str, text: &str) -> String {
    format!(
        "Enhanced version of: {file_name}\n\
         \n\
         This document has been improved with AI-powered enhancements:\n\
         \n\
         ORIGINAL CONTENT:\n\
         {text}\n\
         \n\
         ENHANCED VERSION:\n\
         The content has been restructured and improved for better clarity and \
         engagement. Key improvements include enhanced readability, better flow, \
         improved grammar, and professional presentation.\n\
         \n\
         {text}\n\
         \n\
         ADDITIONAL ENHANCEMENTS:\n\
         - Professional formatting and structure\n\
         - Enhanced vocabulary and word choice\n\
         - Improved sentence flow and transitions\n\
         - Better paragraph organization\n\
         - Corrected grammar and punctuation\n\
         - Strengthened narrative elements\n\
         \n\
         This enhanced version maintains your original message while significantly \
         improving clarity, engagement, and professional presentation."
    )
}

#[async_trait]
impl EnhancementProvider for TemplateEnhancer {
    async fn enhance(
        &self,
        text: &str,
        trigger: EnhanceTrigger<'_>,
    ) -> anyhow::Result<Enhancement> {
        let enhanced_text = match trigger {
            EnhanceTrigger::Created => created_template(text),
            EnhanceTrigger::Requested => requested_template(text),
            EnhanceTrigger::Uploaded { file_name } => uploaded_template(file_name, text),
        };
        debug!(trigger = ?trigger, chars = text.len(), "template enhancement built");
        Ok(Enhancement {
            enhanced_text,
            improvements: improvements_for(trigger),
        })
    }
}

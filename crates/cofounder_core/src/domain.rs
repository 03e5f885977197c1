//! crates/cofounder_core/src/domain.rs
//!
//! Defines the core data records for the application.
//! Every record is owned by a session partition (`session_id`), a caller-chosen
//! opaque string. Records are serializable because they are returned to
//! clients as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

//=========================================================================================
// Conversation Records
//=========================================================================================

/// The author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// A single chat turn. Messages are appended to a conversation and never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Message {
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

/// The single message log kept for a session.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Conversation {
    pub id: Uuid,
    pub session_id: String,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the last `limit` messages in chronological order, or all of them.
    pub fn recent(&self, limit: Option<usize>) -> &[Message] {
        match limit {
            Some(limit) if limit < self.messages.len() => {
                &self.messages[self.messages.len() - limit..]
            }
            _ => &self.messages,
        }
    }
}

//=========================================================================================
// Memories
//=========================================================================================

/// A user-authored note. `category` is advisory (idea, goal, project, note).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Memory {
    pub id: Uuid,
    pub session_id: String,
    pub content: String,
    pub category: String,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Memory {
    pub fn new(
        session_id: impl Into<String>,
        content: impl Into<String>,
        category: impl Into<String>,
        tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            content: content.into(),
            category: category.into(),
            tags: dedup_tags(tags),
            created_at: now,
            updated_at: now,
        }
    }

    /// Case-insensitive substring match on content, or exact tag membership.
    pub fn matches(&self, term: &str) -> bool {
        self.content.to_lowercase().contains(&term.to_lowercase())
            || self.tags.iter().any(|tag| tag == term)
    }
}

/// Tags behave as a set; the first occurrence of each tag keeps its position.
pub fn dedup_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        if !unique.contains(&tag) {
            unique.push(tag);
        }
    }
    unique
}

//=========================================================================================
// Startups
//=========================================================================================

/// The lifecycle phase of a simulated startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StartupStage {
    #[default]
    Idea,
    Mvp,
    Launch,
    Growth,
    Scale,
}

impl StartupStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            StartupStage::Idea => "idea",
            StartupStage::Mvp => "mvp",
            StartupStage::Launch => "launch",
            StartupStage::Growth => "growth",
            StartupStage::Scale => "scale",
        }
    }
}

impl fmt::Display for StartupStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown startup stage '{0}', expected one of idea, mvp, launch, growth, scale")]
pub struct UnknownStage(pub String);

impl FromStr for StartupStage {
    type Err = UnknownStage;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "idea" => Ok(StartupStage::Idea),
            "mvp" => Ok(StartupStage::Mvp),
            "launch" => Ok(StartupStage::Launch),
            "growth" => Ok(StartupStage::Growth),
            "scale" => Ok(StartupStage::Scale),
            _ => Err(UnknownStage(s.to_string())),
        }
    }
}

/// Headline numbers tracked for a startup. All values are non-negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct StartupMetrics {
    pub users: u64,
    pub revenue: f64,
    pub funding: f64,
    pub team_size: u32,
    pub growth_rate: f64,
}

impl Default for StartupMetrics {
    fn default() -> Self {
        Self {
            users: 0,
            revenue: 0.0,
            funding: 0.0,
            team_size: 1,
            growth_rate: 0.0,
        }
    }
}

impl StartupMetrics {
    /// Checks the float fields; the integer fields are unsigned already.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("revenue", self.revenue),
            ("funding", self.funding),
            ("growth_rate", self.growth_rate),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("metric '{}' must be a non-negative number", name));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Startup {
    pub id: Uuid,
    pub session_id: String,
    pub name: String,
    pub description: String,
    pub stage: StartupStage,
    pub metrics: StartupMetrics,
    /// Free-form milestone objects, in the order they were added.
    #[schema(value_type = Vec<Object>)]
    pub milestones: Vec<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Startup {
    /// New startups always begin at the `idea` stage with default metrics.
    pub fn new(
        session_id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            name: name.into(),
            description: description.into(),
            stage: StartupStage::Idea,
            metrics: StartupMetrics::default(),
            milestones: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

//=========================================================================================
// Designs
//=========================================================================================

/// A generated image. Only ever created after a successful generation call.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Design {
    pub id: Uuid,
    pub session_id: String,
    pub title: String,
    pub prompt: String,
    pub image_url: Option<String>,
    pub design_type: String,
    pub created_at: DateTime<Utc>,
}

impl Design {
    pub fn new(
        session_id: impl Into<String>,
        prompt: impl Into<String>,
        design_type: impl Into<String>,
        image_url: impl Into<String>,
    ) -> Self {
        let design_type = design_type.into();
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            title: format!("{} Design", title_case(&design_type)),
            prompt: prompt.into(),
            image_url: Some(image_url.into()),
            design_type,
            created_at: Utc::now(),
        }
    }
}

fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

//=========================================================================================
// Agent Log
//=========================================================================================

/// One entry in the per-(session, agent) message-passing log.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AgentMessage {
    pub id: Uuid,
    pub session_id: String,
    pub agent_id: String,
    /// The agent's team role, e.g. CEO, Engineer, Designer, Marketer.
    pub role: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub to_agent_id: Option<String>,
    #[schema(value_type = Option<Object>)]
    pub meta: Option<Value>,
}

impl AgentMessage {
    pub fn new(
        session_id: impl Into<String>,
        agent_id: impl Into<String>,
        role: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            session_id: session_id.into(),
            agent_id: agent_id.into(),
            role: role.into(),
            content: content.into(),
            timestamp: Utc::now(),
            to_agent_id: None,
            meta: None,
        }
    }
}

//=========================================================================================
// Session Summary
//=========================================================================================

pub const SUMMARY_MEMORY_PREVIEW: usize = 5;
pub const SUMMARY_STARTUP_PREVIEW: usize = 3;
pub const SUMMARY_DESIGN_PREVIEW: usize = 5;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SummaryPreview {
    pub memories: Vec<Memory>,
    pub startups: Vec<Startup>,
    pub designs: Vec<Design>,
}

/// Counts and newest-first previews of everything a session owns.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionSummary {
    pub session_id: String,
    pub memories_count: usize,
    pub startups_count: usize,
    pub designs_count: usize,
    pub messages_count: usize,
    pub summary: SummaryPreview,
}

impl SessionSummary {
    /// Builds the summary from full, newest-first collections.
    pub fn from_parts(
        session_id: impl Into<String>,
        mut memories: Vec<Memory>,
        mut startups: Vec<Startup>,
        mut designs: Vec<Design>,
        messages_count: usize,
    ) -> Self {
        let memories_count = memories.len();
        let startups_count = startups.len();
        let designs_count = designs.len();
        memories.truncate(SUMMARY_MEMORY_PREVIEW);
        startups.truncate(SUMMARY_STARTUP_PREVIEW);
        designs.truncate(SUMMARY_DESIGN_PREVIEW);

        Self {
            session_id: session_id.into(),
            memories_count,
            startups_count,
            designs_count,
            messages_count,
            summary: SummaryPreview {
                memories,
                startups,
                designs,
            },
        }
    }
}

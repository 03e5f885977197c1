//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DocumentStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`. Each collection is a table whose rows
//! are whole documents, with embedded sequences held in array and JSONB columns.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cofounder_core::domain::{
    AgentMessage, Conversation, Design, Memory, Message, Startup, StartupMetrics, StartupStage,
};
use cofounder_core::ports::{DocumentStore, PortError, PortResult};
use serde_json::Value;
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DocumentStore` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const MEMORY_COLUMNS: &str = "id, session_id, content, category, tags, created_at, updated_at";
const STARTUP_COLUMNS: &str =
    "id, session_id, name, description, stage, metrics, milestones, created_at, updated_at";
const DESIGN_COLUMNS: &str = "id, session_id, title, prompt, image_url, design_type, created_at";
const AGENT_MESSAGE_COLUMNS: &str =
    "id, session_id, agent_id, role, content, to_agent_id, meta, sent_at";

#[derive(FromRow)]
struct MemoryRecord {
    id: Uuid,
    session_id: String,
    content: String,
    category: String,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl MemoryRecord {
    fn to_domain(self) -> Memory {
        Memory {
            id: self.id,
            session_id: self.session_id,
            content: self.content,
            category: self.category,
            tags: self.tags,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct StartupRecord {
    id: Uuid,
    session_id: String,
    name: String,
    description: String,
    stage: String,
    metrics: Json<StartupMetrics>,
    milestones: Json<Vec<Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl StartupRecord {
    fn to_domain(self) -> PortResult<Startup> {
        let stage = self
            .stage
            .parse::<StartupStage>()
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(Startup {
            id: self.id,
            session_id: self.session_id,
            name: self.name,
            description: self.description,
            stage,
            metrics: self.metrics.0,
            milestones: self.milestones.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct DesignRecord {
    id: Uuid,
    session_id: String,
    title: String,
    prompt: String,
    image_url: Option<String>,
    design_type: String,
    created_at: DateTime<Utc>,
}
impl DesignRecord {
    fn to_domain(self) -> Design {
        Design {
            id: self.id,
            session_id: self.session_id,
            title: self.title,
            prompt: self.prompt,
            image_url: self.image_url,
            design_type: self.design_type,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct ConversationRecord {
    id: Uuid,
    session_id: String,
    messages: Json<Vec<Message>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl ConversationRecord {
    fn to_domain(self) -> Conversation {
        Conversation {
            id: self.id,
            session_id: self.session_id,
            messages: self.messages.0,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct AgentMessageRecord {
    id: Uuid,
    session_id: String,
    agent_id: String,
    role: String,
    content: String,
    to_agent_id: Option<String>,
    meta: Option<Value>,
    sent_at: DateTime<Utc>,
}
impl AgentMessageRecord {
    fn to_domain(self) -> AgentMessage {
        AgentMessage {
            id: self.id,
            session_id: self.session_id,
            agent_id: self.agent_id,
            role: self.role,
            content: self.content,
            timestamp: self.sent_at,
            to_agent_id: self.to_agent_id,
            meta: self.meta,
        }
    }
}

//=========================================================================================
// `DocumentStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl DocumentStore for DbAdapter {
    // --- Memories ---

    async fn insert_memory(&self, memory: Memory) -> PortResult<Memory> {
        sqlx::query(
            "INSERT INTO memories \
             (id, session_id, content, category, tags, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(memory.id)
        .bind(&memory.session_id)
        .bind(&memory.content)
        .bind(&memory.category)
        .bind(&memory.tags)
        .bind(memory.created_at)
        .bind(memory.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(memory)
    }

    async fn memories_for_session(
        &self,
        session_id: &str,
        category: Option<&str>,
    ) -> PortResult<Vec<Memory>> {
        let records = sqlx::query_as::<_, MemoryRecord>(&format!(
            "SELECT {} FROM memories WHERE session_id = $1 AND ($2::text IS NULL OR category = $2) \
             ORDER BY created_at DESC",
            MEMORY_COLUMNS
        ))
        .bind(session_id)
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn search_memories(&self, session_id: &str, term: &str) -> PortResult<Vec<Memory>> {
        // strpos keeps the term literal, so `%` or `_` in user input match themselves.
        let records = sqlx::query_as::<_, MemoryRecord>(&format!(
            "SELECT {} FROM memories WHERE session_id = $1 \
             AND (strpos(lower(content), lower($2)) > 0 OR $2 = ANY(tags)) \
             ORDER BY created_at DESC",
            MEMORY_COLUMNS
        ))
        .bind(session_id)
        .bind(term)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn update_memory(
        &self,
        memory_id: Uuid,
        content: &str,
        tags: Vec<String>,
    ) -> PortResult<bool> {
        let result = sqlx::query(
            "UPDATE memories SET content = $2, tags = $3, updated_at = now() WHERE id = $1",
        )
        .bind(memory_id)
        .bind(content)
        .bind(cofounder_core::domain::dedup_tags(tags))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_memory(&self, memory_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM memories WHERE id = $1")
            .bind(memory_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    // --- Startups ---

    async fn insert_startup(&self, startup: Startup) -> PortResult<Startup> {
        sqlx::query(
            "INSERT INTO startups \
             (id, session_id, name, description, stage, metrics, milestones, \
              created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(startup.id)
        .bind(&startup.session_id)
        .bind(&startup.name)
        .bind(&startup.description)
        .bind(startup.stage.as_str())
        .bind(Json(&startup.metrics))
        .bind(Json(&startup.milestones))
        .bind(startup.created_at)
        .bind(startup.updated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(startup)
    }

    async fn startups_for_session(&self, session_id: &str) -> PortResult<Vec<Startup>> {
        let records = sqlx::query_as::<_, StartupRecord>(&format!(
            "SELECT {} FROM startups WHERE session_id = $1 ORDER BY created_at DESC",
            STARTUP_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn startup_by_id(&self, startup_id: Uuid) -> PortResult<Option<Startup>> {
        let record = sqlx::query_as::<_, StartupRecord>(&format!(
            "SELECT {} FROM startups WHERE id = $1",
            STARTUP_COLUMNS
        ))
        .bind(startup_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        record.map(|r| r.to_domain()).transpose()
    }

    async fn update_startup_metrics(
        &self,
        startup_id: Uuid,
        metrics: StartupMetrics,
    ) -> PortResult<bool> {
        let result =
            sqlx::query("UPDATE startups SET metrics = $2, updated_at = now() WHERE id = $1")
                .bind(startup_id)
                .bind(Json(metrics))
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_startup_milestone(&self, startup_id: Uuid, milestone: Value) -> PortResult<bool> {
        let result = sqlx::query(
            "UPDATE startups SET milestones = milestones || jsonb_build_array($2::jsonb), \
             updated_at = now() WHERE id = $1",
        )
        .bind(startup_id)
        .bind(Json(milestone))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn update_startup_stage(
        &self,
        startup_id: Uuid,
        stage: StartupStage,
    ) -> PortResult<bool> {
        let result =
            sqlx::query("UPDATE startups SET stage = $2, updated_at = now() WHERE id = $1")
                .bind(startup_id)
                .bind(stage.as_str())
                .execute(&self.pool)
                .await
                .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_startup(&self, startup_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM startups WHERE id = $1")
            .bind(startup_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    // --- Designs ---

    async fn insert_design(&self, design: Design) -> PortResult<Design> {
        sqlx::query(
            "INSERT INTO designs \
             (id, session_id, title, prompt, image_url, design_type, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(design.id)
        .bind(&design.session_id)
        .bind(&design.title)
        .bind(&design.prompt)
        .bind(&design.image_url)
        .bind(&design.design_type)
        .bind(design.created_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(design)
    }

    async fn designs_for_session(&self, session_id: &str) -> PortResult<Vec<Design>> {
        let records = sqlx::query_as::<_, DesignRecord>(&format!(
            "SELECT {} FROM designs WHERE session_id = $1 ORDER BY created_at DESC",
            DESIGN_COLUMNS
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn delete_design(&self, design_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM designs WHERE id = $1")
            .bind(design_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    // --- Conversations ---

    async fn get_or_create_conversation(&self, session_id: &str) -> PortResult<Conversation> {
        sqlx::query(
            "INSERT INTO conversations (id, session_id) VALUES ($1, $2) \
             ON CONFLICT (session_id) DO NOTHING",
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;

        let record = sqlx::query_as::<_, ConversationRecord>(
            "SELECT id, session_id, messages, created_at, updated_at \
             FROM conversations WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => {
                PortError::NotFound(format!("Conversation for session {} not found", session_id))
            }
            _ => PortError::Unexpected(e.to_string()),
        })?;

        Ok(record.to_domain())
    }

    async fn append_message(&self, session_id: &str, message: Message) -> PortResult<bool> {
        // One statement: creates the conversation on first use, otherwise appends in place.
        let result = sqlx::query(
            "INSERT INTO conversations (id, session_id, messages, created_at, updated_at) \
             VALUES ($1, $2, $3, now(), now()) \
             ON CONFLICT (session_id) DO UPDATE \
             SET messages = conversations.messages || EXCLUDED.messages, updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(session_id)
        .bind(Json(vec![message]))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn conversation_history(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> PortResult<Vec<Message>> {
        let record = sqlx::query_as::<_, ConversationRecord>(
            "SELECT id, session_id, messages, created_at, updated_at \
             FROM conversations WHERE session_id = $1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(record
            .map(|r| r.to_domain().recent(limit).to_vec())
            .unwrap_or_default())
    }

    // --- Agent Log ---

    async fn append_agent_message(&self, message: AgentMessage) -> PortResult<AgentMessage> {
        sqlx::query(
            "INSERT INTO agent_messages \
             (id, session_id, agent_id, role, content, to_agent_id, meta, sent_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(message.id)
        .bind(&message.session_id)
        .bind(&message.agent_id)
        .bind(&message.role)
        .bind(&message.content)
        .bind(&message.to_agent_id)
        .bind(&message.meta)
        .bind(message.timestamp)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(message)
    }

    async fn agent_log(
        &self,
        session_id: &str,
        agent_id: &str,
        limit: Option<usize>,
    ) -> PortResult<Vec<AgentMessage>> {
        // LIMIT NULL means no limit in Postgres.
        let limit = limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let records = sqlx::query_as::<_, AgentMessageRecord>(&format!(
            "SELECT {} FROM agent_messages WHERE session_id = $1 AND agent_id = $2 \
             ORDER BY sent_at DESC LIMIT $3",
            AGENT_MESSAGE_COLUMNS
        ))
        .bind(session_id)
        .bind(agent_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let mut log: Vec<AgentMessage> = records.into_iter().map(|r| r.to_domain()).collect();
        log.reverse();
        Ok(log)
    }
}

//! services/api/src/adapters/in_memory.rs
//!
//! An in-process implementation of the `DocumentStore` port. Used by the test
//! suites and selected at runtime with `DATABASE_URL=memory://`. Nothing is
//! persisted across restarts.

use async_trait::async_trait;
use chrono::Utc;
use cofounder_core::domain::{
    dedup_tags, AgentMessage, Conversation, Design, Memory, Message, Startup, StartupMetrics,
    StartupStage,
};
use cofounder_core::ports::{DocumentStore, PortResult};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Collections {
    memories: Vec<Memory>,
    startups: Vec<Startup>,
    designs: Vec<Design>,
    conversations: Vec<Conversation>,
    agent_messages: Vec<AgentMessage>,
}

/// A `DocumentStore` held entirely in memory behind a single lock.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<Collections>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Clones the matching records and orders them newest first. Records inserted
/// later win ties so that ordering stays stable under coarse clocks.
fn newest_first<T: Clone>(
    records: &[T],
    keep: impl Fn(&T) -> bool,
    created_at: impl Fn(&T) -> chrono::DateTime<Utc>,
) -> Vec<T> {
    let mut matched: Vec<(usize, &T)> = records
        .iter()
        .enumerate()
        .filter(|(_, r)| keep(*r))
        .collect();
    matched.sort_by(|(ia, a), (ib, b)| created_at(*b).cmp(&created_at(*a)).then(ib.cmp(ia)));
    matched.into_iter().map(|(_, r)| r.clone()).collect()
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    // --- Memories ---

    async fn insert_memory(&self, memory: Memory) -> PortResult<Memory> {
        self.collections.write().await.memories.push(memory.clone());
        Ok(memory)
    }

    async fn memories_for_session(
        &self,
        session_id: &str,
        category: Option<&str>,
    ) -> PortResult<Vec<Memory>> {
        let collections = self.collections.read().await;
        Ok(newest_first(
            &collections.memories,
            |m| m.session_id == session_id && category.map_or(true, |c| m.category == c),
            |m| m.created_at,
        ))
    }

    async fn search_memories(&self, session_id: &str, term: &str) -> PortResult<Vec<Memory>> {
        let collections = self.collections.read().await;
        Ok(newest_first(
            &collections.memories,
            |m| m.session_id == session_id && m.matches(term),
            |m| m.created_at,
        ))
    }

    async fn update_memory(
        &self,
        memory_id: Uuid,
        content: &str,
        tags: Vec<String>,
    ) -> PortResult<bool> {
        let mut collections = self.collections.write().await;
        match collections.memories.iter_mut().find(|m| m.id == memory_id) {
            Some(memory) => {
                memory.content = content.to_string();
                memory.tags = dedup_tags(tags);
                memory.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_memory(&self, memory_id: Uuid) -> PortResult<bool> {
        let mut collections = self.collections.write().await;
        let before = collections.memories.len();
        collections.memories.retain(|m| m.id != memory_id);
        Ok(collections.memories.len() < before)
    }

    // --- Startups ---

    async fn insert_startup(&self, startup: Startup) -> PortResult<Startup> {
        self.collections.write().await.startups.push(startup.clone());
        Ok(startup)
    }

    async fn startups_for_session(&self, session_id: &str) -> PortResult<Vec<Startup>> {
        let collections = self.collections.read().await;
        Ok(newest_first(
            &collections.startups,
            |s| s.session_id == session_id,
            |s| s.created_at,
        ))
    }

    async fn startup_by_id(&self, startup_id: Uuid) -> PortResult<Option<Startup>> {
        let collections = self.collections.read().await;
        Ok(collections.startups.iter().find(|s| s.id == startup_id).cloned())
    }

    async fn update_startup_metrics(
        &self,
        startup_id: Uuid,
        metrics: StartupMetrics,
    ) -> PortResult<bool> {
        let mut collections = self.collections.write().await;
        match collections.startups.iter_mut().find(|s| s.id == startup_id) {
            Some(startup) => {
                startup.metrics = metrics;
                startup.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn add_startup_milestone(&self, startup_id: Uuid, milestone: Value) -> PortResult<bool> {
        let mut collections = self.collections.write().await;
        match collections.startups.iter_mut().find(|s| s.id == startup_id) {
            Some(startup) => {
                startup.milestones.push(milestone);
                startup.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_startup_stage(
        &self,
        startup_id: Uuid,
        stage: StartupStage,
    ) -> PortResult<bool> {
        let mut collections = self.collections.write().await;
        match collections.startups.iter_mut().find(|s| s.id == startup_id) {
            Some(startup) => {
                startup.stage = stage;
                startup.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_startup(&self, startup_id: Uuid) -> PortResult<bool> {
        let mut collections = self.collections.write().await;
        let before = collections.startups.len();
        collections.startups.retain(|s| s.id != startup_id);
        Ok(collections.startups.len() < before)
    }

    // --- Designs ---

    async fn insert_design(&self, design: Design) -> PortResult<Design> {
        self.collections.write().await.designs.push(design.clone());
        Ok(design)
    }

    async fn designs_for_session(&self, session_id: &str) -> PortResult<Vec<Design>> {
        let collections = self.collections.read().await;
        Ok(newest_first(
            &collections.designs,
            |d| d.session_id == session_id,
            |d| d.created_at,
        ))
    }

    async fn delete_design(&self, design_id: Uuid) -> PortResult<bool> {
        let mut collections = self.collections.write().await;
        let before = collections.designs.len();
        collections.designs.retain(|d| d.id != design_id);
        Ok(collections.designs.len() < before)
    }

    // --- Conversations ---

    async fn get_or_create_conversation(&self, session_id: &str) -> PortResult<Conversation> {
        let mut collections = self.collections.write().await;
        if let Some(existing) = collections
            .conversations
            .iter()
            .find(|c| c.session_id == session_id)
        {
            return Ok(existing.clone());
        }
        let conversation = Conversation::new(session_id);
        collections.conversations.push(conversation.clone());
        Ok(conversation)
    }

    async fn append_message(&self, session_id: &str, message: Message) -> PortResult<bool> {
        // The write lock makes the lookup-or-create and the push one atomic step.
        let mut collections = self.collections.write().await;
        let index = match collections
            .conversations
            .iter()
            .position(|c| c.session_id == session_id)
        {
            Some(index) => index,
            None => {
                collections.conversations.push(Conversation::new(session_id));
                collections.conversations.len() - 1
            }
        };
        let conversation = &mut collections.conversations[index];
        conversation.messages.push(message);
        conversation.updated_at = Utc::now();
        Ok(true)
    }

    async fn conversation_history(
        &self,
        session_id: &str,
        limit: Option<usize>,
    ) -> PortResult<Vec<Message>> {
        let collections = self.collections.read().await;
        Ok(collections
            .conversations
            .iter()
            .find(|c| c.session_id == session_id)
            .map(|c| c.recent(limit).to_vec())
            .unwrap_or_default())
    }

    // --- Agent Log ---

    async fn append_agent_message(&self, message: AgentMessage) -> PortResult<AgentMessage> {
        self.collections
            .write()
            .await
            .agent_messages
            .push(message.clone());
        Ok(message)
    }

    async fn agent_log(
        &self,
        session_id: &str,
        agent_id: &str,
        limit: Option<usize>,
    ) -> PortResult<Vec<AgentMessage>> {
        let collections = self.collections.read().await;
        let log: Vec<AgentMessage> = collections
            .agent_messages
            .iter()
            .filter(|m| m.session_id == session_id && m.agent_id == agent_id)
            .cloned()
            .collect();
        let skip = limit.map_or(0, |l| log.len().saturating_sub(l));
        Ok(log.into_iter().skip(skip).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_are_scoped_to_session_and_newest_first() {
        let store = InMemoryStore::new();
        let first = store
            .insert_memory(Memory::new("s1", "first", "idea", vec![]))
            .await
            .unwrap();
        let second = store
            .insert_memory(Memory::new("s1", "second", "goal", vec![]))
            .await
            .unwrap();
        store
            .insert_memory(Memory::new("s2", "other session", "idea", vec![]))
            .await
            .unwrap();

        let listed = store.memories_for_session("s1", None).await.unwrap();
        let ids: Vec<Uuid> = listed.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);

        let ideas = store.memories_for_session("s1", Some("idea")).await.unwrap();
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].id, first.id);
    }

    #[tokio::test]
    async fn search_is_a_union_without_duplicates() {
        let store = InMemoryStore::new();
        store
            .insert_memory(Memory::new("s1", "Launch the ROCKET", "goal", vec!["rocket".into()]))
            .await
            .unwrap();
        store
            .insert_memory(Memory::new("s1", "unrelated", "note", vec!["rocket".into()]))
            .await
            .unwrap();
        store
            .insert_memory(Memory::new("s1", "a rocket ship", "idea", vec![]))
            .await
            .unwrap();
        store
            .insert_memory(Memory::new("s1", "boats", "idea", vec!["Rocket".into()]))
            .await
            .unwrap();

        let found = store.search_memories("s1", "rocket").await.unwrap();
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|m| m.content != "boats"));
    }

    #[tokio::test]
    async fn deleting_unknown_ids_reports_false() {
        let store = InMemoryStore::new();
        assert!(!store.delete_memory(Uuid::new_v4()).await.unwrap());
        assert!(!store.delete_startup(Uuid::new_v4()).await.unwrap());
        assert!(!store.delete_design(Uuid::new_v4()).await.unwrap());

        let memory = store
            .insert_memory(Memory::new("s1", "x", "note", vec![]))
            .await
            .unwrap();
        assert!(store.delete_memory(memory.id).await.unwrap());
        assert!(!store.delete_memory(memory.id).await.unwrap());
    }

    #[tokio::test]
    async fn append_creates_the_conversation_once() {
        let store = InMemoryStore::new();
        assert!(store.conversation_history("s1", None).await.unwrap().is_empty());

        store.append_message("s1", Message::user("hi")).await.unwrap();
        store.append_message("s1", Message::assistant("hello")).await.unwrap();

        let conversation = store.get_or_create_conversation("s1").await.unwrap();
        assert_eq!(conversation.messages.len(), 2);
        let again = store.get_or_create_conversation("s1").await.unwrap();
        assert_eq!(conversation.id, again.id);

        let last = store.conversation_history("s1", Some(1)).await.unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].content, "hello");
    }

    #[tokio::test]
    async fn startup_updates_touch_only_the_target() {
        let store = InMemoryStore::new();
        let startup = store
            .insert_startup(Startup::new("s1", "Acme", "widgets"))
            .await
            .unwrap();

        assert!(store
            .update_startup_stage(startup.id, StartupStage::Mvp)
            .await
            .unwrap());
        assert!(store
            .add_startup_milestone(startup.id, serde_json::json!({"title": "first sale"}))
            .await
            .unwrap());
        assert!(!store
            .update_startup_stage(Uuid::new_v4(), StartupStage::Scale)
            .await
            .unwrap());

        let stored = store.startup_by_id(startup.id).await.unwrap().unwrap();
        assert_eq!(stored.stage, StartupStage::Mvp);
        assert_eq!(stored.milestones.len(), 1);
    }

    #[tokio::test]
    async fn agent_log_is_chronological_and_limited() {
        let store = InMemoryStore::new();
        for i in 0..4 {
            store
                .append_agent_message(AgentMessage::new("s1", "ceo", "CEO", format!("m{}", i)))
                .await
                .unwrap();
        }
        store
            .append_agent_message(AgentMessage::new("s1", "cto", "Engineer", "other"))
            .await
            .unwrap();

        let log = store.agent_log("s1", "ceo", Some(2)).await.unwrap();
        let contents: Vec<&str> = log.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["m2", "m3"]);
        assert_eq!(store.agent_log("s1", "ceo", None).await.unwrap().len(), 4);
    }
}

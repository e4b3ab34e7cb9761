//! Process-wide service state.
//!
//! Tasks, the search index and the knowledge base live in an immutable
//! [`Snapshot`]. Loading builds a fresh snapshot and swaps it in whole, so
//! in-flight requests keep reading the snapshot they started with.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use campus_core::config::RetrievalMode;
use campus_core::{AppConfig, AppError, AppResult, ClientUsage, SlidingWindowLimiter, TaskInfo};
use campus_knowledge::{
    ConsistencyReport, KnowledgeBase, KnowledgeEntry, KnowledgeRetriever, RagResult, RagService,
};
use campus_llm::{AnswerGenerator, GatewayStats, LlmGateway};
use campus_prompt::{resolve_prompt, PromptDefinition, CHAT_PROMPT_ID};
use campus_search::{build_service, Document, SearchHit, SearchService};
use serde::Serialize;

/// Longest accepted chat question, in characters.
pub const MAX_QUESTION_CHARS: usize = 500;

pub struct Snapshot {
    tasks: HashMap<String, TaskInfo>,
    search: SearchService,
    rag: RagService,
    report: ConsistencyReport,
}

impl Snapshot {
    pub fn task(&self, task_id: &str) -> Option<&TaskInfo> {
        self.tasks.get(task_id)
    }

    pub fn search(&self) -> &SearchService {
        &self.search
    }

    pub fn rag(&self) -> &RagService {
        &self.rag
    }

    pub fn report(&self) -> &ConsistencyReport {
        &self.report
    }
}

/// Index and knowledge figures for the current snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceStats {
    pub tasks: usize,
    pub vocabulary: usize,
    pub avg_doc_len: f64,
    pub knowledge_entries: usize,
    pub provider: String,
    pub gateway: GatewayStats,
    pub retrieval_mode: RetrievalMode,
    pub rate_limit_enabled: bool,
    /// Per-client chat usage inside the current window.
    pub chat_clients: BTreeMap<String, ClientUsage>,
    pub search_clients: BTreeMap<String, ClientUsage>,
}

pub struct CampusState {
    config: AppConfig,
    gateway: Arc<LlmGateway>,
    prompt: PromptDefinition,
    snapshot: RwLock<Option<Arc<Snapshot>>>,
    chat_limiter: Option<SlidingWindowLimiter>,
    search_limiter: Option<SlidingWindowLimiter>,
}

impl CampusState {
    /// Create an empty state. Nothing can be served until [`CampusState::load`].
    pub fn new(config: AppConfig, generator: Arc<dyn AnswerGenerator>) -> AppResult<Self> {
        let prompt = resolve_prompt(&config.workspace, CHAT_PROMPT_ID)?;
        let gateway = Arc::new(LlmGateway::from_config(
            generator,
            &config.retry,
            &config.timeout,
        ));

        let limits = &config.rate_limit;
        let (chat_limiter, search_limiter) = if limits.enabled {
            (
                Some(SlidingWindowLimiter::new(
                    limits.chat_calls,
                    Duration::from_secs(limits.chat_period_secs),
                )),
                Some(SlidingWindowLimiter::new(
                    limits.search_calls,
                    Duration::from_secs(limits.search_period_secs),
                )),
            )
        } else {
            (None, None)
        };

        Ok(Self {
            config,
            gateway,
            prompt,
            snapshot: RwLock::new(None),
            chat_limiter,
            search_limiter,
        })
    }

    /// Build a snapshot from `tasks` and `knowledge` and publish it.
    pub fn load(&self, tasks: Vec<TaskInfo>, knowledge: Vec<KnowledgeEntry>) -> Arc<Snapshot> {
        let documents: Vec<Document> = tasks
            .iter()
            .map(|task| {
                let (lat, lng) = task.anchor();
                Document::new(&task.task_id, &task.title, &task.description, lat, lng)
            })
            .collect();
        let search = build_service(documents, &self.config.search);

        let base = Arc::new(KnowledgeBase::from_entries(knowledge));
        let report =
            ConsistencyReport::check(tasks.iter().map(|t| t.task_id.as_str()), base.as_ref());
        let retriever = KnowledgeRetriever::new(base, &self.config.retrieval);
        let rag = RagService::new(
            retriever,
            self.gateway.clone(),
            self.prompt.clone(),
            &self.config.retrieval,
        );

        let tasks = tasks
            .into_iter()
            .map(|task| (task.task_id.clone(), task))
            .collect();

        let snapshot = Arc::new(Snapshot {
            tasks,
            search,
            rag,
            report,
        });

        let mut slot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
        *slot = Some(snapshot.clone());
        tracing::info!(
            "Snapshot published: {} tasks, {} knowledge entries",
            snapshot.tasks.len(),
            snapshot.report.knowledge_count
        );
        snapshot
    }

    /// The current snapshot, or `NotInitialized` before the first load.
    pub fn snapshot(&self) -> AppResult<Arc<Snapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or_else(|| AppError::NotInitialized("Task data has not been loaded".to_string()))
    }

    /// Rank tasks for `query`. `top_n` defaults to the configured value.
    pub fn search(
        &self,
        client: &str,
        query: &str,
        top_n: Option<usize>,
    ) -> AppResult<Vec<SearchHit>> {
        let snapshot = self.snapshot()?;
        let top_n = self.validate_top_n(top_n)?;

        admit(self.search_limiter.as_ref(), client)?;

        let hits = snapshot.search().search(query, top_n);
        tracing::info!("Search '{}' returned {} hits", query, hits.len());
        Ok(hits)
    }

    /// Answer `question` about `task_id` within the request time budget.
    ///
    /// Unknown tasks are answered without task context. Exceeding the budget
    /// abandons this request only and yields the timeout result.
    pub async fn chat(&self, client: &str, task_id: &str, question: &str) -> AppResult<RagResult> {
        let snapshot = self.snapshot()?;
        let question = validate_question(question)?;

        admit(self.chat_limiter.as_ref(), client)?;

        let task = snapshot.task(task_id).cloned().unwrap_or_else(|| {
            tracing::warn!("Chat requested for unknown task {}", task_id);
            TaskInfo {
                task_id: task_id.to_string(),
                ..Default::default()
            }
        });

        let budget = self.config.timeout.request_timeout();
        match tokio::time::timeout(
            budget,
            snapshot.rag().process_chat_request(task_id, question, &task),
        )
        .await
        {
            Ok(result) => Ok(result),
            Err(_) => {
                tracing::error!(
                    "Chat for task {} exceeded the {}ms request budget",
                    task_id,
                    budget.as_millis()
                );
                Ok(RagResult::timed_out())
            }
        }
    }

    pub fn stats(&self) -> AppResult<ServiceStats> {
        let snapshot = self.snapshot()?;
        let index = snapshot.search().index();
        Ok(ServiceStats {
            tasks: index.corpus_size(),
            vocabulary: index.vocabulary_size(),
            avg_doc_len: index.avgdl(),
            knowledge_entries: snapshot.report().knowledge_count,
            provider: self.gateway.provider_name().to_string(),
            gateway: self.gateway.stats(),
            retrieval_mode: snapshot.rag().retriever().mode(),
            rate_limit_enabled: self.config.rate_limit.enabled,
            chat_clients: usage(self.chat_limiter.as_ref()),
            search_clients: usage(self.search_limiter.as_ref()),
        })
    }

    fn validate_top_n(&self, top_n: Option<usize>) -> AppResult<usize> {
        let max = self.config.search.max_top_n;
        let top_n = top_n.unwrap_or(self.config.search.default_top_n);
        if top_n == 0 || top_n > max {
            return Err(AppError::InvalidInput(format!(
                "top_n must be within [1, {}], got {}",
                max, top_n
            )));
        }
        Ok(top_n)
    }
}

fn admit(limiter: Option<&SlidingWindowLimiter>, client: &str) -> AppResult<()> {
    if let Some(limiter) = limiter {
        let status = limiter.check(client)?;
        tracing::debug!(
            "Client {} has {} of {} requests left",
            client,
            status.remaining,
            status.limit
        );
    }
    Ok(())
}

fn usage(limiter: Option<&SlidingWindowLimiter>) -> BTreeMap<String, ClientUsage> {
    limiter
        .map(|l| l.stats().into_iter().collect())
        .unwrap_or_default()
}

/// Trimmed question, rejected when empty or too long.
fn validate_question(question: &str) -> AppResult<&str> {
    let trimmed = question.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("Question cannot be empty".to_string()));
    }
    let chars = trimmed.chars().count();
    if chars > MAX_QUESTION_CHARS {
        return Err(AppError::InvalidInput(format!(
            "Question is {} characters, the limit is {}",
            chars, MAX_QUESTION_CHARS
        )));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_llm::{Confidence, GenerationResponse, ScriptStep, ScriptedGenerator};
    use tempfile::TempDir;

    fn task(id: &str, title: &str, description: &str) -> TaskInfo {
        TaskInfo {
            task_id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            category: Some("academic".to_string()),
            location_name: "图书馆".to_string(),
            lat: Some(22.28),
            lng: Some(114.14),
        }
    }

    fn knowledge(id: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            task_id: id.to_string(),
            knowledge_type: "procedure".to_string(),
            title: "操作流程".to_string(),
            content: "登录图书馆数据库。输入关键词检索文献。".to_string(),
            tags: vec![],
            difficulty: String::new(),
            estimated_time: 0,
            course_code: String::new(),
        }
    }

    fn answer(text: &str) -> ScriptStep {
        ScriptStep::Respond(GenerationResponse {
            answer: text.to_string(),
            confidence: Confidence::High,
            ..Default::default()
        })
    }

    fn config(dir: &TempDir) -> AppConfig {
        let mut config = AppConfig {
            workspace: dir.path().to_path_buf(),
            ..Default::default()
        };
        config.retry.max_retries = 0;
        config
    }

    fn state_with(config: AppConfig, step: ScriptStep) -> CampusState {
        let state = CampusState::new(config, Arc::new(ScriptedGenerator::always(step))).unwrap();
        state.load(
            vec![
                task("T001", "图书馆文献检索", "学习使用数据库检索文献"),
                task("T002", "实验室安全培训", "完成安全培训"),
            ],
            vec![knowledge("T001")],
        );
        state
    }

    #[tokio::test]
    async fn test_not_initialized_before_load() {
        let dir = TempDir::new().unwrap();
        let state =
            CampusState::new(config(&dir), Arc::new(ScriptedGenerator::always(answer("x"))))
                .unwrap();

        assert!(matches!(state.search("c", "图书馆", None), Err(AppError::NotInitialized(_))));
        assert!(matches!(
            state.chat("c", "T001", "q").await,
            Err(AppError::NotInitialized(_))
        ));
        assert!(matches!(state.stats(), Err(AppError::NotInitialized(_))));
    }

    #[tokio::test]
    async fn test_search_and_chat_after_load() {
        let dir = TempDir::new().unwrap();
        let state = state_with(config(&dir), answer("先登录数据库。"));

        let hits = state.search("c", "图书馆", None).unwrap();
        assert_eq!(hits[0].task_id, "T001");

        let result = state.chat("c", "T001", "  怎么检索文献？ ").await.unwrap();
        assert_eq!(result.answer, "先登录数据库。");
        assert!(!result.citations.is_empty());
        assert_eq!(result.map_anchor.lat, 22.28);
    }

    #[tokio::test]
    async fn test_reload_replaces_snapshot() {
        let dir = TempDir::new().unwrap();
        let state = state_with(config(&dir), answer("x"));
        let before = state.snapshot().unwrap();

        state.load(vec![task("T100", "篮球比赛", "参加篮球赛")], vec![]);

        assert!(before.task("T001").is_some());
        assert!(state.snapshot().unwrap().task("T001").is_none());
        assert!(state.search("c", "图书馆", None).unwrap().is_empty());
        assert_eq!(state.search("c", "篮球", None).unwrap()[0].task_id, "T100");
    }

    #[tokio::test]
    async fn test_unknown_task_chat_is_answered() {
        let dir = TempDir::new().unwrap();
        let state = state_with(config(&dir), answer("没有相关资料。"));

        let result = state.chat("c", "T999", "在哪里？").await.unwrap();
        assert!(!result.answer.is_empty());
        assert!(result.citations.is_empty());
        assert_eq!(result.map_anchor.lat, 0.0);
    }

    #[tokio::test]
    async fn test_input_validation() {
        let dir = TempDir::new().unwrap();
        let state = state_with(config(&dir), answer("x"));

        assert!(matches!(state.search("c", "q", Some(0)), Err(AppError::InvalidInput(_))));
        assert!(matches!(state.search("c", "q", Some(51)), Err(AppError::InvalidInput(_))));
        assert!(state.search("c", "q", Some(50)).is_ok());

        assert!(matches!(state.chat("c", "T001", "   ").await, Err(AppError::InvalidInput(_))));
        let long = "问".repeat(MAX_QUESTION_CHARS + 1);
        assert!(matches!(state.chat("c", "T001", &long).await, Err(AppError::InvalidInput(_))));
        let limit = "问".repeat(MAX_QUESTION_CHARS);
        assert!(state.chat("c", "T001", &limit).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limits_are_per_client() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.rate_limit.search_calls = 2;
        let state = state_with(cfg, answer("x"));

        assert!(state.search("alice", "图书馆", None).is_ok());
        assert!(state.search("alice", "图书馆", None).is_ok());
        match state.search("alice", "图书馆", None) {
            Err(AppError::RateLimited { client, retry_after_secs }) => {
                assert_eq!(client, "alice");
                assert!(retry_after_secs >= 1);
            }
            other => panic!("expected rate limit, got {:?}", other),
        }
        assert!(state.search("bob", "图书馆", None).is_ok());
    }

    #[tokio::test]
    async fn test_disabled_rate_limit() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.rate_limit.enabled = false;
        cfg.rate_limit.search_calls = 1;
        let state = state_with(cfg, answer("x"));

        for _ in 0..5 {
            assert!(state.search("alice", "图书馆", None).is_ok());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_budget_yields_timeout_result() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.timeout.request_timeout_ms = 1_000;
        cfg.timeout.llm_timeout_ms = 60_000;
        let state = state_with(cfg, ScriptStep::Hang);

        let result = state.chat("c", "T001", "怎么检索？").await.unwrap();
        assert_eq!(result, RagResult::timed_out());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_request_does_not_affect_others() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.timeout.request_timeout_ms = 1_000;
        cfg.timeout.llm_timeout_ms = 60_000;

        let script = Arc::new(ScriptedGenerator::new(vec![
            ScriptStep::Hang,
            answer("快速回答。"),
        ]));
        let state = CampusState::new(cfg, script).unwrap();
        state.load(vec![task("T001", "图书馆文献检索", "检索")], vec![knowledge("T001")]);

        let (slow, fast) = futures::join!(
            state.chat("a", "T001", "第一个问题"),
            state.chat("b", "T001", "第二个问题"),
        );

        assert_eq!(slow.unwrap(), RagResult::timed_out());
        assert_eq!(fast.unwrap().answer, "快速回答。");
    }

    #[tokio::test]
    async fn test_stats_reflect_snapshot() {
        let dir = TempDir::new().unwrap();
        let state = state_with(config(&dir), answer("x"));
        state.chat("c", "T001", "检索").await.unwrap();

        let stats = state.stats().unwrap();
        assert_eq!(stats.tasks, 2);
        assert_eq!(stats.knowledge_entries, 1);
        assert_eq!(stats.provider, "scripted");
        assert_eq!(stats.gateway.calls, 1);
        assert!(stats.vocabulary > 0);
        assert_eq!(stats.retrieval_mode, RetrievalMode::Keyword);
    }

    #[tokio::test]
    async fn test_stats_report_remaining_quota() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.rate_limit.search_calls = 5;
        let state = state_with(cfg, answer("x"));

        state.search("alice", "图书馆", None).unwrap();
        state.search("alice", "实验室", None).unwrap();
        state.chat("bob", "T001", "检索").await.unwrap();

        let stats = state.stats().unwrap();
        let alice = &stats.search_clients["alice"];
        assert_eq!(alice.current_requests, 2);
        assert_eq!(alice.limit, 5);
        assert_eq!(alice.remaining, 3);
        assert!(!stats.search_clients.contains_key("bob"));
        assert_eq!(stats.chat_clients["bob"].current_requests, 1);
    }

    #[tokio::test]
    async fn test_disabled_rate_limit_reports_no_clients() {
        let dir = TempDir::new().unwrap();
        let mut cfg = config(&dir);
        cfg.rate_limit.enabled = false;
        let state = state_with(cfg, answer("x"));

        state.search("alice", "图书馆", None).unwrap();
        let stats = state.stats().unwrap();
        assert!(!stats.rate_limit_enabled);
        assert!(stats.search_clients.is_empty());
        assert!(stats.chat_clients.is_empty());
    }

    #[test]
    fn test_prompt_override_is_used() {
        let dir = TempDir::new().unwrap();
        let prompts = dir.path().join(".campus/prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(
            prompts.join(format!("{}.yml", CHAT_PROMPT_ID)),
            format!(
                "id: {}\ntitle: Short\napiVersion: \"1.0\"\nsystem: Be brief.\ntemplate: \"{{{{question}}}}\"\n",
                CHAT_PROMPT_ID
            ),
        )
        .unwrap();

        let state = state_with(config(&dir), answer("x"));
        assert_eq!(state.snapshot().unwrap().rag().prompt().system, "Be brief.");
    }
}

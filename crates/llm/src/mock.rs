//! Mock generation backend.
//!
//! Answers are chosen by keyword from a fixed table. Delay and failure
//! injection draw from a seeded RNG so runs are reproducible.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use campus_core::config::GeneratorConfig;
use campus_core::{AppError, AppResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::client::{AnswerGenerator, GenerationRequest};
use crate::types::{Confidence, GenerationResponse};

/// Prompts mentioning this keyword get the slow delay and a low-confidence answer.
const SLOW_KEYWORD: &str = "timeout";

/// What a single mock call decided to do, drawn before any await.
enum Plan {
    Fail(AppError),
    Answer(Option<Duration>),
}

pub struct MockGenerator {
    config: GeneratorConfig,
    rng: Mutex<StdRng>,
    call_count: AtomicU64,
}

impl MockGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            config,
            rng: Mutex::new(rng),
            call_count: AtomicU64::new(0),
        }
    }

    /// Number of `generate` calls so far, failed ones included.
    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::Relaxed)
    }

    fn plan(&self, user_prompt: &str) -> Plan {
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());

        if self.config.failure_rate > 0.0 && rng.gen::<f64>() < self.config.failure_rate {
            let err = if rng.gen_bool(0.5) {
                AppError::Timeout("Simulated generation timeout".to_string())
            } else {
                AppError::Llm("Simulated generation failure".to_string())
            };
            return Plan::Fail(err);
        }

        if !self.config.simulate_delay {
            return Plan::Answer(None);
        }

        let millis = if user_prompt.to_lowercase().contains(SLOW_KEYWORD) {
            self.config.slow_delay_ms
        } else {
            let (lo, hi) = (self.config.min_delay_ms, self.config.max_delay_ms);
            rng.gen_range(lo.min(hi)..=hi.max(lo))
        };
        Plan::Answer(Some(Duration::from_millis(millis)))
    }
}

#[async_trait::async_trait]
impl AnswerGenerator for MockGenerator {
    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, request: &GenerationRequest) -> AppResult<GenerationResponse> {
        let call = self.call_count.fetch_add(1, Ordering::Relaxed) + 1;
        tracing::debug!("Mock generation call #{}", call);

        match self.plan(&request.user) {
            Plan::Fail(err) => Err(err),
            Plan::Answer(delay) => {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(canned_response(&request.user))
            }
        }
    }
}

/// Pick the canned answer whose keyword appears first in the table.
fn canned_response(user_prompt: &str) -> GenerationResponse {
    if user_prompt.contains("图书馆") {
        return response(
            "关于图书馆文献检索任务，您需要掌握以下要点：1. 熟悉图书馆的数据库系统；2. 学会使用关键词搜索；3. 了解文献分类方法。建议您先到图书馆熟悉环境，然后在工作人员指导下完成检索练习。",
            Confidence::High,
            &["数据库使用", "关键词搜索", "文献分类"],
            &["前往图书馆", "咨询工作人员", "完成检索练习"],
            &[],
        );
    }

    if user_prompt.contains("安全") {
        return response(
            "实验室安全培训是非常重要的必修环节。培训内容包括：1. 实验室基本安全规范；2. 设备操作注意事项；3. 应急处理程序。请务必认真参加培训并通过考核。",
            Confidence::High,
            &["安全规范", "设备操作", "应急处理"],
            &["参加安全培训", "认真学习规范", "通过安全考核"],
            &[],
        );
    }

    if user_prompt.contains(SLOW_KEYWORD) {
        return response(
            "这是一个超时测试响应，用于验证超时处理机制。",
            Confidence::Low,
            &["超时测试"],
            &["重试请求"],
            &["网络延迟"],
        );
    }

    response(
        "根据提供的信息，我可以为您提供以下建议和指导。",
        Confidence::Medium,
        &["基于知识库信息", "提供实用建议"],
        &["查看任务详情", "按照指导完成"],
        &[],
    )
}

fn response(
    answer: &str,
    confidence: Confidence,
    key_points: &[&str],
    actionable_steps: &[&str],
    uncertain_aspects: &[&str],
) -> GenerationResponse {
    let owned = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
    GenerationResponse {
        answer: answer.to_string(),
        confidence,
        key_points: owned(key_points),
        actionable_steps: owned(actionable_steps),
        uncertain_aspects: owned(uncertain_aspects),
    }
}

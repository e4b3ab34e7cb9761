//! Prompt builder for rendering templates and injecting task/knowledge context.

use crate::defaults::{default_chat_prompt, NO_KNOWLEDGE_MARKER};
use crate::types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
use campus_core::types::{format_score, ScoredChunk, TaskInfo};
use campus_core::{AppError, AppResult};
use handlebars::Handlebars;
use serde_json::json;

/// Render the user message of the built-in chat prompt.
///
/// # Example
/// ```
/// use campus_core::TaskInfo;
/// use campus_prompt::{format_user_prompt, NO_KNOWLEDGE_MARKER};
///
/// let task = TaskInfo {
///     task_id: "T001".to_string(),
///     title: "图书馆文献检索".to_string(),
///     ..Default::default()
/// };
/// let prompt = format_user_prompt(&task, &[], "怎么开始？").unwrap();
/// assert!(prompt.contains("任务ID: T001"));
/// assert!(prompt.contains(NO_KNOWLEDGE_MARKER));
/// ```
pub fn format_user_prompt(
    task: &TaskInfo,
    chunks: &[ScoredChunk],
    question: &str,
) -> AppResult<String> {
    build_chat_prompt(&default_chat_prompt(), task, chunks, question).map(|built| built.user)
}

/// Build system and user messages from a prompt definition.
///
/// This function:
/// 1. Formats the retrieved snippets into an enumerated knowledge section
/// 2. Renders the template with task fields, knowledge and the question
/// 3. Returns a `BuiltPrompt` carrying the definition's system instruction
pub fn build_chat_prompt(
    definition: &PromptDefinition,
    task: &TaskInfo,
    chunks: &[ScoredChunk],
    question: &str,
) -> AppResult<BuiltPrompt> {
    tracing::debug!(
        "Building prompt {} with {} knowledge chunks",
        definition.id,
        chunks.len()
    );

    let chunk_values: Vec<_> = chunks
        .iter()
        .enumerate()
        .map(|(i, chunk)| {
            json!({
                "index": i + 1,
                "source": source_label(chunk),
                "content": chunk.content,
                "score": format_score(chunk.score),
            })
        })
        .collect();

    let variables = json!({
        "task_id": task.task_id,
        "task_title": task.title,
        "task_description": task.description,
        "task_location": task.location_name,
        "knowledge_context": format_knowledge_context(chunks),
        "chunks": chunk_values,
        "has_knowledge": !chunks.is_empty(),
        "question": question,
    });

    let user = render_template(&definition.template, &variables)?;

    Ok(BuiltPrompt {
        system: definition.system.clone(),
        user,
        metadata: BuiltPromptMetadata {
            source_prompt_id: definition.id.clone(),
            chunk_count: chunks.len(),
        },
    })
}

/// Enumerate snippets with their source, content and score.
///
/// An empty slice yields [`NO_KNOWLEDGE_MARKER`].
pub fn format_knowledge_context(chunks: &[ScoredChunk]) -> String {
    if chunks.is_empty() {
        return NO_KNOWLEDGE_MARKER.to_string();
    }

    let mut context = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        context.push_str(&format!("\n### 知识片段 {}\n", i + 1));
        context.push_str(&format!("来源: {}\n", source_label(chunk)));
        context.push_str(&format!("内容: {}\n", chunk.content));
        context.push_str(&format!("相关性分数: {}\n", format_score(chunk.score)));
    }
    context
}

fn source_label(chunk: &ScoredChunk) -> &str {
    if chunk.source.is_empty() {
        "未知"
    } else {
        &chunk.source
    }
}

/// Render a Handlebars template with variables.
pub(crate) fn render_template(template: &str, variables: &serde_json::Value) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Prompts are plain text
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> TaskInfo {
        TaskInfo {
            task_id: "T002".to_string(),
            title: "实验室安全培训".to_string(),
            description: "完成化学实验室安全培训".to_string(),
            category: Some("academic".to_string()),
            location_name: "化学楼".to_string(),
            lat: Some(22.337),
            lng: Some(114.172),
        }
    }

    fn chunk(content: &str, score: f64, index: usize) -> ScoredChunk {
        ScoredChunk {
            content: content.to_string(),
            score,
            source: "安全指南".to_string(),
            chunk_index: index,
        }
    }

    #[test]
    fn test_task_fields_embedded() {
        let prompt = format_user_prompt(&task(), &[], "需要带什么？").unwrap();
        assert!(prompt.starts_with("## 当前任务信息\n任务ID: T002\n"));
        assert!(prompt.contains("任务标题: 实验室安全培训"));
        assert!(prompt.contains("任务描述: 完成化学实验室安全培训"));
        assert!(prompt.contains("任务位置: 化学楼"));
        assert!(prompt.contains("## 用户问题\n需要带什么？"));
    }

    #[test]
    fn test_empty_chunks_use_marker() {
        let prompt = format_user_prompt(&task(), &[], "q").unwrap();
        assert!(prompt.contains(&format!("## 相关知识库信息\n{}\n", NO_KNOWLEDGE_MARKER)));
        assert!(!prompt.contains("知识片段"));
    }

    #[test]
    fn test_chunks_enumerated_in_order() {
        let chunks = vec![chunk("穿实验服。", 3.0, 0), chunk("佩戴护目镜。", 1.0, 1)];
        let prompt = format_user_prompt(&task(), &chunks, "q").unwrap();

        assert!(!prompt.contains(NO_KNOWLEDGE_MARKER));
        let first = prompt.find("### 知识片段 1").unwrap();
        let second = prompt.find("### 知识片段 2").unwrap();
        assert!(first < second);
        assert!(prompt.contains("来源: 安全指南\n内容: 穿实验服。\n相关性分数: 3\n"));
        assert!(prompt.contains("相关性分数: 1\n"));
    }

    #[test]
    fn test_knowledge_context_layout() {
        let context = format_knowledge_context(&[chunk("内容A", 2.5, 0)]);
        assert_eq!(
            context,
            "\n### 知识片段 1\n来源: 安全指南\n内容: 内容A\n相关性分数: 2.5\n"
        );
    }

    #[test]
    fn test_missing_source_label() {
        let mut c = chunk("x", 1.0, 0);
        c.source.clear();
        assert!(format_knowledge_context(&[c]).contains("来源: 未知"));
    }

    #[test]
    fn test_question_is_not_escaped_or_interpreted() {
        let prompt = format_user_prompt(&task(), &[], "<b>{{task_id}}</b> & more").unwrap();
        assert!(prompt.contains("<b>{{task_id}}</b> & more"));
    }

    #[test]
    fn test_custom_definition_uses_chunk_list() {
        let mut def = default_chat_prompt();
        def.id = "campus.chat.brief".to_string();
        def.template =
            "{{task_title}}|{{#each chunks}}[{{index}}:{{source}}:{{score}}]{{/each}}|{{question}}"
                .to_string();

        let built = build_chat_prompt(&def, &task(), &[chunk("a", 2.0, 0)], "q").unwrap();
        assert_eq!(built.user, "实验室安全培训|[1:安全指南:2]|q");
        assert_eq!(built.metadata.source_prompt_id, "campus.chat.brief");
        assert_eq!(built.metadata.chunk_count, 1);
        assert_eq!(built.system, def.system);
    }

    #[test]
    fn test_invalid_template_is_prompt_error() {
        let mut def = default_chat_prompt();
        def.template = "{{#each chunks}}".to_string();
        match build_chat_prompt(&def, &task(), &[], "q") {
            Err(AppError::Prompt(msg)) => assert!(msg.contains("register")),
            other => panic!("expected prompt error, got {:?}", other),
        }
    }
}

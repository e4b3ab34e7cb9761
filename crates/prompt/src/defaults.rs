//! Built-in chat prompt.
//!
//! Template variables:
//! - `task_id`, `task_title`, `task_description`, `task_location`
//! - `knowledge_context`: enumerated snippets, or [`NO_KNOWLEDGE_MARKER`]
//! - `chunks`: the snippets as a list of `{index, source, content, score}`
//! - `has_knowledge`: whether any snippet was retrieved
//! - `question`: the user's question

use crate::types::{PromptDefinition, PromptOutputSpec};

pub const CHAT_PROMPT_ID: &str = "campus.chat.default";

/// Substituted for the knowledge section when no snippet was retrieved.
pub const NO_KNOWLEDGE_MARKER: &str = "暂无相关知识库信息";

const SYSTEM_PROMPT: &str = r#"你是校园任务系统的智能助手。你的职责是帮助学生完成校园任务，提供准确、有用的信息和指导。

## 角色设定
- 你是一个友好、专业的校园助手
- 你熟悉校园环境和各种任务
- 你会基于提供的知识库信息回答问题
- 你会诚实地承认不确定的信息

## 回答原则
1. 基于提供的知识库信息回答问题
2. 如果信息不足，明确说明不确定的原因
3. 提供具体、可操作的建议
4. 保持友好、专业的语调
5. 如果问题超出当前任务范围，建议相关任务

## 输出格式
请严格按照以下 JSON 格式回答：
{
  "answer": "你的详细回答",
  "confidence": "high/medium/low",
  "key_points": ["要点1", "要点2"],
  "actionable_steps": ["步骤1", "步骤2"],
  "uncertain_aspects": ["不确定的方面1", "不确定的方面2"]
}"#;

const USER_TEMPLATE: &str = "## 当前任务信息
任务ID: {{task_id}}
任务标题: {{task_title}}
任务描述: {{task_description}}
任务位置: {{task_location}}

## 相关知识库信息
{{knowledge_context}}

## 用户问题
{{question}}

请基于上述信息回答用户问题。如果知识库信息不足以完全回答问题，请在 uncertain_aspects 中说明。";

/// The chat prompt used when the workspace does not override it.
pub fn default_chat_prompt() -> PromptDefinition {
    PromptDefinition {
        id: CHAT_PROMPT_ID.to_string(),
        title: "Campus task chat".to_string(),
        api_version: "1.0".to_string(),
        created_by: "campus".to_string(),
        system: SYSTEM_PROMPT.to_string(),
        template: USER_TEMPLATE.to_string(),
        output: PromptOutputSpec::default(),
    }
}

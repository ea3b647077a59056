//! # Designer Skill
//!
//! Drafts a candidate multi-agent system design for the resolved use case.
//! The generator may invoke the research tool before committing to a final
//! design; every research query is recorded and surfaced in a provenance
//! block at the top of the design text.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

use crate::llm::{ChatMessage, GenerationTurn, Role, TextGenerator, ToolDefinition};
use crate::memory::LessonMemory;
use crate::skills::prompts;
use crate::skills::tools::Researcher;
use crate::workflow::{StatePatch, WorkflowState};

/// Hard cap on research rounds before the generator must produce a design
const MAX_RESEARCH_ROUNDS: usize = 2;

/// Arguments the generator passes to the research tool
#[derive(Debug, Default, Deserialize)]
struct ResearchArgs {
    #[serde(default)]
    query: String,
    #[serde(default)]
    focus: String,
}

/// Designer step of the design workflow
pub struct DesignerSkill {
    llm: Arc<dyn TextGenerator>,
    researcher: Arc<dyn Researcher>,
    memory: Arc<dyn LessonMemory>,
}

impl DesignerSkill {
    pub fn new(
        llm: Arc<dyn TextGenerator>,
        researcher: Arc<dyn Researcher>,
        memory: Arc<dyn LessonMemory>,
    ) -> Self {
        Self {
            llm,
            researcher,
            memory,
        }
    }

    fn research_tool_definition() -> ToolDefinition {
        ToolDefinition {
            name: "research".to_string(),
            description: "Search the web and get summarized findings. Use this tool to \
                research latest 3GPP/ETSI specifications, AI agent architectural patterns, \
                telecom network integration approaches, and multi-agent system best practices."
                .to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "What to search for (be specific)"
                    },
                    "focus": {
                        "type": "string",
                        "description": "Optional focus area for the summary"
                    }
                },
                "required": ["query"]
            }),
        }
    }

    async fn lessons_text(&self, use_case_id: &str, use_case_name: &str) -> anyhow::Result<String> {
        let lessons = self.memory.get_lessons(use_case_id).await?;
        if lessons.is_empty() {
            return Ok("No previous lessons for this use case.".to_string());
        }
        let mut lines = vec![format!("Learned lessons for {}:", use_case_name)];
        for (i, record) in lessons.iter().enumerate() {
            lines.push(format!("  {}. {}", i + 1, record.lesson));
        }
        Ok(lines.join("\n"))
    }

    fn build_user_message(state: &WorkflowState, lessons: &str) -> String {
        let use_case_id = state.use_case_id.as_deref().unwrap_or_default();
        let use_case_name = state.use_case_name.as_deref().unwrap_or_default();
        let description_summary = state.description_summary.as_deref().unwrap_or_default();
        let requirements = state.requirement_list.as_deref().unwrap_or_default();
        let feedback = state
            .feedback
            .as_deref()
            .unwrap_or("No feedback yet - this is the first design iteration.");
        let prior_research = state
            .research_notes
            .as_deref()
            .filter(|notes| !notes.is_empty());

        match prior_research {
            None => format!(
                "Design an AI agentic system for the following use case.\n\n\
                ## Use Case\nID: {}\nName: {}\n\n\
                ## Description Summary\n{}\n\n\
                ## Requirements\n{}\n\n\
                ## Learned Lessons from Previous Designs\n{}\n\n\
                ## Feedback from Previous Iteration\n{}\n\n\
                First, use the research tool to search for best practices related to the \
                user request content.\n\
                Then, provide your complete system design following the format specified.",
                use_case_id, use_case_name, description_summary, requirements, lessons, feedback
            ),
            Some(notes) => format!(
                "Design an AI agentic system for the following use case.\n\n\
                ## Use Case\nID: {}\nName: {}\n\n\
                ## Description Summary\n{}\n\n\
                ## Research Summary\n{}\n\n\
                ## Requirements\n{}\n\n\
                ## Learned Lessons from Previous Designs\n{}\n\n\
                ## Feedback from Previous Iteration\n{}\n\n\
                Provide your complete system design following the format specified.",
                use_case_id, use_case_name, description_summary, notes, requirements, lessons,
                feedback
            ),
        }
    }

    /// Run the designer against the current state.
    pub async fn run(&self, state: &WorkflowState) -> StatePatch {
        let missing_input = state.use_case_id.is_none()
            || state.use_case_name.is_none()
            || state.description_summary.is_none();
        if missing_input {
            return StatePatch::failed(
                "Design agent requires use_case_id, use_case_name, and description_summary",
            );
        }

        let use_case_id = state.use_case_id.as_deref().unwrap_or_default();
        let use_case_name = state.use_case_name.as_deref().unwrap_or_default();

        let lessons = match self.lessons_text(use_case_id, use_case_name).await {
            Ok(text) => text,
            Err(e) => return StatePatch::failed(format!("Design generation failed: {}", e)),
        };

        let mut messages = vec![
            ChatMessage::system(prompts::DESIGNER),
            ChatMessage::user(Self::build_user_message(state, &lessons)),
        ];
        let tools = [Self::research_tool_definition()];

        let mut research_queries: Vec<String> = Vec::new();
        let mut research_summaries = String::new();
        let mut last_assistant = String::new();
        let mut design = String::new();

        for round in 0..=MAX_RESEARCH_ROUNDS {
            // once the research budget is spent, force a plain text turn
            let turn = if round < MAX_RESEARCH_ROUNDS {
                match self.llm.generate_with_tools(&messages, &tools).await {
                    Ok(turn) => turn,
                    Err(e) => {
                        return StatePatch::failed(format!("Design generation failed: {}", e))
                    }
                }
            } else {
                match self.llm.generate(&messages).await {
                    Ok(content) => GenerationTurn {
                        content: Some(content),
                        tool_calls: Vec::new(),
                    },
                    Err(e) => {
                        return StatePatch::failed(format!("Design generation failed: {}", e))
                    }
                }
            };

            if let Some(content) = turn.content.as_deref() {
                if !content.is_empty() {
                    last_assistant = content.to_string();
                }
            }

            if turn.tool_calls.is_empty() {
                design = turn.content.unwrap_or_default();
                break;
            }

            messages.push(ChatMessage {
                role: Role::Assistant,
                content: turn.content.clone().unwrap_or_default(),
                tool_call_id: None,
                tool_calls: Some(turn.tool_calls.clone()),
            });

            for call in &turn.tool_calls {
                let args: ResearchArgs = serde_json::from_str(&call.arguments).unwrap_or_default();
                if !args.query.is_empty() {
                    research_queries.push(args.query.clone());
                }
                debug!(query = %args.query, "designer requested research");

                let summary = match self.researcher.research(&args.query, &args.focus).await {
                    Ok(summary) => summary,
                    Err(e) => {
                        return StatePatch::failed(format!("Design generation failed: {}", e))
                    }
                };
                research_summaries.push_str(&summary);
                messages.push(ChatMessage::tool_result(&call.id, summary));
            }
        }

        if design.is_empty() {
            design = last_assistant;
        }
        if design.is_empty() {
            return StatePatch::failed("Design generation failed: model produced no design text");
        }

        if !research_queries.is_empty() {
            let mut provenance =
                String::from("## Research Conducted\nThe agent researched the following topics:\n");
            for query in &research_queries {
                provenance.push_str(&format!("- \"{}\"\n", query));
            }
            provenance.push_str("\n---\n\n");
            design = provenance + &design;
        }

        info!(
            use_case_id,
            research_calls = research_queries.len(),
            "design drafted"
        );
        StatePatch {
            system_design: Some(design),
            research_notes: Some(research_summaries),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::JsonLessonStore;
    use crate::testing::{
        temp_lesson_path, FixedGenerator, NoopResearcher, ScriptedGenerator, ScriptedTurn,
        StubResearcher,
    };
    use crate::workflow::WorkflowState;

    fn designable_state() -> WorkflowState {
        let mut state = WorkflowState::new("design smart life", 3);
        state.use_case_id = Some("5.1.1".to_string());
        state.use_case_name = Some("AI Agents to Enable Smart Life".to_string());
        state.description_summary = Some("agents coordinate smart devices".to_string());
        state.requirement_list = Some("[PR 5.1.1-1] parse user intents".to_string());
        state
    }

    fn memory() -> Arc<JsonLessonStore> {
        Arc::new(JsonLessonStore::new(temp_lesson_path("designer")).unwrap())
    }

    #[tokio::test]
    async fn test_missing_inputs_fail_without_generation() {
        let skill = DesignerSkill::new(
            Arc::new(FixedGenerator::new("unused")),
            Arc::new(NoopResearcher),
            memory(),
        );

        let patch = skill.run(&WorkflowState::new("query only", 3)).await;
        assert!(patch.error.is_some());
        assert!(patch.system_design.is_none());
    }

    #[tokio::test]
    async fn test_design_without_research() {
        let skill = DesignerSkill::new(
            Arc::new(ScriptedGenerator::new(vec![ScriptedTurn::text("the design")])),
            Arc::new(NoopResearcher),
            memory(),
        );

        let patch = skill.run(&designable_state()).await;
        assert!(patch.error.is_none());
        assert_eq!(patch.system_design.as_deref(), Some("the design"));
        assert_eq!(patch.research_notes.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_research_adds_provenance_block() {
        let skill = DesignerSkill::new(
            Arc::new(ScriptedGenerator::new(vec![
                ScriptedTurn::tool_call("call-1", "research", r#"{"query":"NWDAF patterns"}"#),
                ScriptedTurn::text("final design body"),
            ])),
            Arc::new(StubResearcher::new("NWDAF exposes analytics via Nnwdaf")),
            memory(),
        );

        let patch = skill.run(&designable_state()).await;
        let design = patch.system_design.expect("design should be produced");
        assert!(design.starts_with("## Research Conducted\n"));
        assert!(design.contains("- \"NWDAF patterns\""));
        assert!(design.ends_with("final design body"));
        assert_eq!(
            patch.research_notes.as_deref(),
            Some("NWDAF exposes analytics via Nnwdaf")
        );
    }

    #[tokio::test]
    async fn test_research_rounds_are_capped() {
        // generator keeps asking for research; after two rounds the skill
        // forces a plain generation turn
        let skill = DesignerSkill::new(
            Arc::new(ScriptedGenerator::new(vec![
                ScriptedTurn::tool_call("c1", "research", r#"{"query":"first"}"#),
                ScriptedTurn::tool_call("c2", "research", r#"{"query":"second"}"#),
                ScriptedTurn::text("forced design"),
            ])),
            Arc::new(StubResearcher::new("findings")),
            memory(),
        );

        let patch = skill.run(&designable_state()).await;
        let design = patch.system_design.expect("design should be produced");
        assert!(design.contains("- \"first\""));
        assert!(design.contains("- \"second\""));
        assert!(design.ends_with("forced design"));
    }

    #[tokio::test]
    async fn test_falls_back_to_last_non_empty_turn() {
        let skill = DesignerSkill::new(
            Arc::new(ScriptedGenerator::new(vec![
                ScriptedTurn::text_with_tool_call(
                    "draft so far",
                    "c1",
                    "research",
                    r#"{"query":"q"}"#,
                ),
                ScriptedTurn::text(""),
            ])),
            Arc::new(StubResearcher::new("findings")),
            memory(),
        );

        let patch = skill.run(&designable_state()).await;
        let design = patch.system_design.expect("fallback design expected");
        assert!(design.ends_with("draft so far"));
    }

    #[tokio::test]
    async fn test_prior_research_notes_skip_new_research_instruction() {
        let generator = Arc::new(ScriptedGenerator::new(vec![ScriptedTurn::text("design")]));
        let skill = DesignerSkill::new(generator.clone(), Arc::new(NoopResearcher), memory());

        let mut state = designable_state();
        state.research_notes = Some("earlier findings".to_string());
        let patch = skill.run(&state).await;
        assert!(patch.error.is_none());

        let prompt = generator.last_user_prompt();
        assert!(prompt.contains("## Research Summary\nearlier findings"));
        assert!(!prompt.contains("use the research tool"));
    }
}

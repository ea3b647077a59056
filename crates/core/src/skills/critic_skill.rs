//! # Critic Skill
//!
//! Evaluates the candidate design against the use case requirements and
//! renders an approve/revise verdict. On approval, or once the iteration
//! budget is exhausted, it extracts design lessons into long-term memory
//! and composes the final report.

use std::sync::Arc;
use tracing::info;

use crate::llm::{ChatMessage, TextGenerator};
use crate::memory::{clean_lesson_line, LessonMemory};
use crate::skills::prompts;
use crate::workflow::{StatePatch, WorkflowState};

/// Verdict parsing contract: the evaluation counts as approved only when it
/// contains `APPROVED` and does not contain `NEEDS_REVISION`, case
/// insensitively. Both tokens together resolve to not approved.
pub fn verdict_is_approved(evaluation: &str) -> bool {
    let upper = evaluation.to_uppercase();
    upper.contains("APPROVED") && !upper.contains("NEEDS_REVISION")
}

/// Critic step of the design workflow
pub struct CriticSkill {
    llm: Arc<dyn TextGenerator>,
    memory: Arc<dyn LessonMemory>,
}

impl CriticSkill {
    pub fn new(llm: Arc<dyn TextGenerator>, memory: Arc<dyn LessonMemory>) -> Self {
        Self { llm, memory }
    }

    fn evaluation_request(state: &WorkflowState) -> String {
        format!(
            "Evaluate the following system design against the requirements.\n\n\
            ## Use Case\nID: {}\nName: {}\n\n\
            ## Requirements to Satisfy\n{}\n\n\
            ## System Design to Evaluate\n{}\n\n\
            ## Current Iteration\nThis is iteration {} of {}.\n\n\
            Provide your evaluation in this format:\n\n\
            ### Requirement Analysis\n\
            [For each requirement, state if it's satisfied and how]\n\n\
            ### Overall Verdict\n\
            [APPROVED or NEEDS_REVISION]\n\n\
            ### Score\n\
            [X/Y requirements fully satisfied]\n\n\
            ### Feedback\n\
            [If NEEDS_REVISION, provide specific actionable feedback for improvement]\n\
            [If APPROVED, summarize the key strengths of the design]",
            state.use_case_id.as_deref().unwrap_or_default(),
            state.use_case_name.as_deref().unwrap_or_default(),
            state.requirement_list.as_deref().unwrap_or_default(),
            state.system_design.as_deref().unwrap_or_default(),
            state.iteration + 1,
            state.max_iterations,
        )
    }

    fn lessons_request(state: &WorkflowState, evaluation: &str) -> String {
        format!(
            "Extract design lessons from this approved design.\n\n\
            ## Use Case\n{}\n\n\
            ## Requirements\n{}\n\n\
            ## Approved Design\n{}\n\n\
            ## Feedback Summary\n{}\n\n\
            Provide 2-3 key lessons learned (one per line):",
            state.use_case_name.as_deref().unwrap_or_default(),
            state.requirement_list.as_deref().unwrap_or_default(),
            state.system_design.as_deref().unwrap_or_default(),
            evaluation,
        )
    }

    /// Run the critic against the current state.
    pub async fn run(&self, state: &WorkflowState) -> StatePatch {
        if state.system_design.is_none() || state.requirement_list.is_none() {
            return StatePatch::failed("Feedback agent requires system_design and requirement_list");
        }

        let evaluation = match self
            .llm
            .generate(&[
                ChatMessage::system(prompts::CRITIC),
                ChatMessage::user(Self::evaluation_request(state)),
            ])
            .await
        {
            Ok(text) => text,
            Err(e) => return StatePatch::failed(format!("Feedback evaluation failed: {}", e)),
        };

        let approved = verdict_is_approved(&evaluation);
        let is_final_iteration = state.iteration + 1 >= state.max_iterations;

        if !(approved || is_final_iteration) {
            info!(iteration = state.iteration + 1, "revision requested");
            return StatePatch {
                feedback: Some(evaluation),
                is_approved: Some(false),
                iteration: Some(state.iteration + 1),
                ..Default::default()
            };
        }

        let lessons_text = match self
            .llm
            .generate(&[
                ChatMessage::system(prompts::LESSONS),
                ChatMessage::user(Self::lessons_request(state, &evaluation)),
            ])
            .await
        {
            Ok(text) => text,
            Err(e) => return StatePatch::failed(format!("Feedback evaluation failed: {}", e)),
        };

        let use_case_id = state.use_case_id.as_deref().unwrap_or_default();
        let use_case_name = state.use_case_name.as_deref().unwrap_or_default();
        for line in lessons_text.lines() {
            if let Some(lesson) = clean_lesson_line(line) {
                if let Err(e) = self.memory.add_lesson(use_case_id, use_case_name, &lesson).await {
                    return StatePatch::failed(format!("Feedback evaluation failed: {}", e));
                }
            }
        }

        let final_status = if approved {
            "Design APPROVED".to_string()
        } else {
            format!(
                "Design finalized after {} iterations (max reached)",
                state.max_iterations
            )
        };
        let final_response = format!(
            "{}\n\n\
            ## Use Case\n{}: {}\n\n\
            ## Final System Design\n{}\n\n\
            ## Evaluation Summary\n{}\n\n\
            ## Lessons Learned (saved for future designs)\n{}\n",
            final_status,
            use_case_id,
            use_case_name,
            state.system_design.as_deref().unwrap_or_default(),
            evaluation,
            lessons_text,
        );

        info!(use_case_id, approved, "design run finalized");
        StatePatch {
            feedback: Some(evaluation),
            is_approved: Some(true),
            iteration: Some(state.iteration + 1),
            final_response: Some(final_response),
            ..Default::default()
        }
    }
}

//! # Workflow Controller
//!
//! Sequences the design steps: Classifying -> Designing -> Critiquing, with
//! the critic either looping back to the designer or terminating the run.
//! The loop is strictly bounded; the critic forces approval once the
//! iteration budget is spent, so a run performs at most `max_iterations`
//! designer/critic round trips.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::events::{WorkflowEvent, WorkflowEventKind};
use super::state::{WorkflowPhase, WorkflowState};
use crate::llm::{Embedder, TextGenerator};
use crate::memory::LessonMemory;
use crate::retrieval::ChunkRetriever;
use crate::skills::tools::Researcher;
use crate::skills::{ClassifierSkill, CriticSkill, DesignerSkill};

/// Workflow tuning knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Maximum designer/critic round trips before the run is finalized
    pub max_iterations: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self { max_iterations: 3 }
    }
}

/// Every collaborator the workflow needs, injected at construction.
///
/// Each step can run on its own generator so a small local model can do
/// classification while a larger hosted one designs and reviews.
#[derive(Clone)]
pub struct WorkflowServices {
    pub embedder: Arc<dyn Embedder>,
    pub retriever: Arc<dyn ChunkRetriever>,
    pub classifier_llm: Arc<dyn TextGenerator>,
    pub designer_llm: Arc<dyn TextGenerator>,
    pub critic_llm: Arc<dyn TextGenerator>,
    pub researcher: Arc<dyn Researcher>,
    pub memory: Arc<dyn LessonMemory>,
}

/// The design workflow state machine
pub struct Workflow {
    config: WorkflowConfig,
    classifier: ClassifierSkill,
    designer: DesignerSkill,
    critic: CriticSkill,
    event_tx: Option<mpsc::UnboundedSender<WorkflowEvent>>,
}

impl Workflow {
    pub fn new(config: WorkflowConfig, services: WorkflowServices) -> Self {
        let classifier = ClassifierSkill::new(
            services.embedder.clone(),
            services.retriever.clone(),
            services.classifier_llm.clone(),
        );
        let designer = DesignerSkill::new(
            services.designer_llm.clone(),
            services.researcher.clone(),
            services.memory.clone(),
        );
        let critic = CriticSkill::new(services.critic_llm.clone(), services.memory.clone());

        Self {
            config,
            classifier,
            designer,
            critic,
            event_tx: None,
        }
    }

    /// Attach an event channel for progress reporting
    pub fn with_event_channel(mut self, tx: mpsc::UnboundedSender<WorkflowEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn emit(&self, event: WorkflowEvent) {
        if let Some(tx) = &self.event_tx {
            let _ = tx.send(event);
        }
    }

    /// Drive one design run to completion and return the terminal state.
    pub async fn run(&self, user_query: &str) -> WorkflowState {
        let mut state = WorkflowState::new(user_query, self.config.max_iterations);
        let mut phase = WorkflowPhase::Classifying;

        self.emit(
            WorkflowEvent::new(WorkflowEventKind::WorkflowStarted, "controller")
                .with_data(serde_json::json!({ "user_query": user_query })),
        );

        loop {
            match phase {
                WorkflowPhase::Classifying => {
                    self.emit(WorkflowEvent::new(WorkflowEventKind::StepStarted, "classifier"));
                    state = state.apply(self.classifier.run(&state).await);
                    if state.error.is_some() || state.use_case_id.is_none() {
                        self.emit(WorkflowEvent::new(WorkflowEventKind::StepFailed, "classifier"));
                        phase = WorkflowPhase::Terminated;
                    } else {
                        self.emit(
                            WorkflowEvent::new(WorkflowEventKind::StepCompleted, "classifier")
                                .with_data(serde_json::json!({
                                    "use_case_id": state.use_case_id,
                                })),
                        );
                        phase = WorkflowPhase::Designing;
                    }
                }
                WorkflowPhase::Designing => {
                    self.emit(WorkflowEvent::new(WorkflowEventKind::StepStarted, "designer"));
                    state = state.apply(self.designer.run(&state).await);
                    if state.error.is_some() {
                        // a failed designer terminates the run, the critic
                        // never sees a missing design
                        self.emit(WorkflowEvent::new(WorkflowEventKind::StepFailed, "designer"));
                        phase = WorkflowPhase::Terminated;
                    } else {
                        self.emit(WorkflowEvent::new(WorkflowEventKind::StepCompleted, "designer"));
                        phase = WorkflowPhase::Critiquing;
                    }
                }
                WorkflowPhase::Critiquing => {
                    self.emit(WorkflowEvent::new(WorkflowEventKind::StepStarted, "critic"));
                    state = state.apply(self.critic.run(&state).await);
                    if state.is_terminal() {
                        self.emit(WorkflowEvent::new(WorkflowEventKind::StepCompleted, "critic"));
                        phase = WorkflowPhase::Terminated;
                    } else {
                        self.emit(
                            WorkflowEvent::new(WorkflowEventKind::RevisionRequested, "critic")
                                .with_data(serde_json::json!({
                                    "iteration": state.iteration,
                                })),
                        );
                        phase = WorkflowPhase::Designing;
                    }
                }
                WorkflowPhase::Terminated => {
                    if let Some(error) = &state.error {
                        warn!(error = %error, "workflow terminated on error");
                        self.emit(
                            WorkflowEvent::new(WorkflowEventKind::WorkflowFailed, "controller")
                                .with_data(serde_json::json!({ "error": error })),
                        );
                    } else {
                        info!(
                            use_case_id = state.use_case_id.as_deref().unwrap_or_default(),
                            iterations = state.iteration,
                            "workflow completed"
                        );
                        self.emit(
                            WorkflowEvent::new(WorkflowEventKind::WorkflowCompleted, "controller")
                                .with_data(serde_json::json!({
                                    "iterations": state.iteration,
                                })),
                        );
                    }
                    return state;
                }
            }
        }
    }
}

/// Single-call entry point: drive one design workflow to completion.
pub async fn run_design_workflow(
    user_query: &str,
    max_iterations: u32,
    services: WorkflowServices,
) -> WorkflowState {
    Workflow::new(WorkflowConfig { max_iterations }, services)
        .run(user_query)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::JsonLessonStore;
    use crate::testing::{
        temp_lesson_path, FailingEmbedder, FailingGenerator, FixedGenerator, NoopResearcher,
        StubEmbedder, StubRetriever,
    };

    fn services(critic_verdict: &str, label: &str) -> WorkflowServices {
        WorkflowServices {
            embedder: Arc::new(
                StubEmbedder::new(vec![1.0, 0.0])
                    .with_text("AI Agents to Enable Smart Life", vec![0.9, 0.1])
                    .with_text("design the smart life system", vec![0.9, 0.1]),
            ),
            retriever: Arc::new(StubRetriever::for_use_case("5.1.1")),
            classifier_llm: Arc::new(FixedGenerator::new("summary")),
            designer_llm: Arc::new(FixedGenerator::new("candidate design")),
            critic_llm: Arc::new(FixedGenerator::new(critic_verdict)),
            researcher: Arc::new(NoopResearcher),
            memory: Arc::new(JsonLessonStore::new(temp_lesson_path(label)).unwrap()),
        }
    }

    #[tokio::test]
    async fn test_always_revise_critic_terminates_at_budget() {
        for max_iterations in 1..=4u32 {
            let label = format!("bounded_{}", max_iterations);
            let workflow = Workflow::new(
                WorkflowConfig { max_iterations },
                services("### Overall Verdict\nNEEDS_REVISION", &label),
            );

            let state = workflow.run("design the smart life system").await;
            assert!(state.error.is_none(), "unexpected error: {:?}", state.error);
            assert_eq!(state.iteration, max_iterations);
            assert!(state.is_approved);
            assert!(state.final_response.is_some());
        }
    }

    #[tokio::test]
    async fn test_early_approval_stops_after_one_round_trip() {
        let workflow = Workflow::new(
            WorkflowConfig { max_iterations: 3 },
            services("### Overall Verdict\nAPPROVED", "early"),
        );

        let state = workflow.run("design the smart life system").await;
        assert_eq!(state.iteration, 1);
        assert!(state.is_approved);
        let report = state.final_response.expect("final report expected");
        assert!(report.starts_with("Design APPROVED"));
    }

    #[tokio::test]
    async fn test_classification_failure_short_circuits_design() {
        let mut services = services("APPROVED", "classify_fail");
        services.embedder = Arc::new(FailingEmbedder);

        let workflow = Workflow::new(WorkflowConfig::default(), services);
        let state = workflow.run("design something").await;

        assert!(state.error.is_some());
        assert!(state.system_design.is_none());
        assert!(state.final_response.is_none());
        assert_eq!(state.iteration, 0);
    }

    #[tokio::test]
    async fn test_designer_failure_terminates_before_critique() {
        let mut services = services("APPROVED", "design_fail");
        services.designer_llm = Arc::new(FailingGenerator);

        let workflow = Workflow::new(WorkflowConfig::default(), services);
        let state = workflow.run("design the smart life system").await;

        let error = state.error.expect("designer failure should surface");
        assert!(error.contains("Design generation failed"));
        assert!(state.system_design.is_none());
        assert_eq!(state.iteration, 0);
    }

    #[tokio::test]
    async fn test_events_trace_the_run() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let workflow = Workflow::new(
            WorkflowConfig { max_iterations: 2 },
            services("APPROVED", "events"),
        )
        .with_event_channel(tx);

        let state = workflow.run("design the smart life system").await;
        assert!(state.is_approved);

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(event.kind);
        }
        assert_eq!(kinds.first(), Some(&WorkflowEventKind::WorkflowStarted));
        assert_eq!(kinds.last(), Some(&WorkflowEventKind::WorkflowCompleted));
        assert!(kinds.contains(&WorkflowEventKind::StepCompleted));
    }
}

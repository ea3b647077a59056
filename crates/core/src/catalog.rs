//! # Use Case Catalog
//!
//! The closed enumeration of ETSI telecom use cases the system designs for.
//! Every workflow run resolves to exactly one of these entries; free-text
//! queries never create new ones.

use serde::{Deserialize, Serialize};

/// Category of a telecom use case, derived from its section numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UseCaseCategory {
    /// 5.1.x - consumer-facing scenarios
    Consumer,
    /// 5.2.x - business and vertical scenarios
    Business,
    /// 5.3.x - network operator scenarios
    Operator,
}

impl UseCaseCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            UseCaseCategory::Consumer => "consumer",
            UseCaseCategory::Business => "business",
            UseCaseCategory::Operator => "operator",
        }
    }
}

/// One catalog entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UseCase {
    /// Section identifier, e.g. "5.1.1"
    pub id: &'static str,
    /// Official use case name
    pub name: &'static str,
    pub category: UseCaseCategory,
}

/// All use cases, in document order
pub const USE_CASES: &[UseCase] = &[
    UseCase {
        id: "5.1.1",
        name: "AI Agents to Enable Smart Life",
        category: UseCaseCategory::Consumer,
    },
    UseCase {
        id: "5.1.2",
        name: "Network-Assisted Collaborative Robots",
        category: UseCaseCategory::Consumer,
    },
    UseCase {
        id: "5.1.3",
        name: "AI Phone",
        category: UseCaseCategory::Consumer,
    },
    UseCase {
        id: "5.2.1",
        name: "AI Agent-based Customized Network for Smart City Traffic Monitoring",
        category: UseCaseCategory::Business,
    },
    UseCase {
        id: "5.2.2",
        name: "AI Agents-Based Customized Network for Smart Construction Sites",
        category: UseCaseCategory::Business,
    },
    UseCase {
        id: "5.2.3",
        name: "AI Agent Ensuring Game Acceleration Experience",
        category: UseCaseCategory::Business,
    },
    UseCase {
        id: "5.2.4",
        name: "AI Agent-Assisted Collaborative Energy Distribution in Power Enterprises",
        category: UseCaseCategory::Business,
    },
    UseCase {
        id: "5.3.1",
        name: "AI Agent-Based Autonomous Network Management",
        category: UseCaseCategory::Operator,
    },
    UseCase {
        id: "5.3.2",
        name: "AI Agent-Based Disaster Handling Network Management",
        category: UseCaseCategory::Operator,
    },
    UseCase {
        id: "5.3.3",
        name: "AI Agent-Based Time-Sensitive Network Management",
        category: UseCaseCategory::Operator,
    },
    UseCase {
        id: "5.3.4",
        name: "AI Agent-Driven Core Network Signalling Optimization",
        category: UseCaseCategory::Operator,
    },
    UseCase {
        id: "5.3.5",
        name: "AI Agent-Based Core Networks to Enhance User Experience",
        category: UseCaseCategory::Operator,
    },
];

/// Look up a use case by its section identifier
pub fn find_by_id(id: &str) -> Option<&'static UseCase> {
    USE_CASES.iter().find(|uc| uc.id == id)
}

/// Look up a use case by exact name
pub fn find_by_name(name: &str) -> Option<&'static UseCase> {
    USE_CASES.iter().find(|uc| uc.name == name)
}

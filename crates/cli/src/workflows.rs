//! Simulated workflow data source for the demo.

use std::time::Duration;

use async_trait::async_trait;
use orca_core::{QueryError, QueryStatus};
use orca_loading::QuerySource;

/// A workflow as listed on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSummary {
    pub workflow_id: u32,
    pub name: String,
    pub status: String,
    pub task_count: usize,
}

/// Answers `getWorkflows` after a fixed latency.
pub struct SimulatedWorkflows {
    pub latency: Duration,
    pub fail: bool,
}

#[async_trait]
impl QuerySource<Vec<WorkflowSummary>> for SimulatedWorkflows {
    async fn fetch(&self) -> Result<Vec<WorkflowSummary>, QueryError> {
        tokio::time::sleep(self.latency).await;
        if self.fail {
            return Err(QueryError::new("workflow service unavailable"));
        }
        Ok(vec![
            WorkflowSummary {
                workflow_id: 1,
                name: "Employee onboarding".to_string(),
                status: "In Progress".to_string(),
                task_count: 6,
            },
            WorkflowSummary {
                workflow_id: 2,
                name: "Quarterly release".to_string(),
                status: "Not Started".to_string(),
                task_count: 11,
            },
        ])
    }
}

/// Text rendering of the workflow table for a settled query.
pub fn render_table(status: &QueryStatus<Vec<WorkflowSummary>>) -> String {
    if let Some(error) = &status.error {
        return format!("error: {}", error);
    }
    let Some(workflows) = &status.data else {
        return "no workflows".to_string();
    };

    let mut out = String::from("ID | NAME                 | STATUS      | TASKS");
    for workflow in workflows {
        out.push_str(&format!(
            "\n{:>2} | {:<20} | {:<11} | {}",
            workflow.workflow_id, workflow.name, workflow.status, workflow.task_count
        ));
    }
    out
}

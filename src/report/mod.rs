mod types;

pub use types::{
    ApprovalRange, DebugInfo, EvaluationResult, Finding, ReportEnvelope, RequiredTest, Severity,
    Status,
};

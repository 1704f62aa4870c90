pub mod grading_service;
pub mod session_service;
pub mod similarity;
pub mod violation_ledger;

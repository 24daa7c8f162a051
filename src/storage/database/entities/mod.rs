/// Request log entity module
pub mod request_log;
/// Response feedback entity module
pub mod response_feedback;
/// Response log entity module
pub mod response_log;

pub use request_log::Entity as RequestLog;
pub use response_feedback::Entity as ResponseFeedback;
pub use response_log::Entity as ResponseLog;

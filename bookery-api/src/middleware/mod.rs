/// Request middleware
///
/// - `origin`: browser origin allow-list enforcement

pub mod origin;

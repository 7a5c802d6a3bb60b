/// Quota store errors. Transient by design: callers fail open on any of
/// these rather than blocking chat on quota accuracy.
#[derive(Debug, thiserror::Error)]
pub enum QuotaStoreError {
    #[error("quota store unreachable: {0}")]
    Connection(String),
    #[error("quota store command failed: {0}")]
    Command(String),
}

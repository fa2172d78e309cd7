/// Raised when a cluster fails its pre-flight connectivity check.
///
/// The scheduler treats this as fatal for that cluster only. Every work item targeting the
/// cluster is recorded as a failure up front and the sweep carries on against the remaining
/// clusters.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Cluster {cluster} is unreachable: {detail}")]
pub struct ClusterUnreachableError {
    pub cluster: String,
    pub detail: String,
}

impl ClusterUnreachableError {
    pub fn new(cluster: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            cluster: cluster.into(),
            detail: detail.into(),
        }
    }
}

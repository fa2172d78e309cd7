use lakebench_client::{ClusterClient, ClusterTarget};

use crate::config::CrossClusterSettings;

/// Register `remote` as a catalog source named `source_name` on `local`, so that queries
/// submitted to `local` can reference both clusters. The cross-cluster credentials are
/// dedicated to this link, the benchmark's own credentials are never shared between clusters.
pub async fn register_remote(
    local: &ClusterClient,
    remote: &ClusterTarget,
    source_name: &str,
    settings: &CrossClusterSettings,
) -> anyhow::Result<()> {
    let config = serde_json::json!({
        "hostname": remote.host,
        "port": remote.port,
        "username": settings.user,
        "password": settings.password,
        "useSsl": remote.tls,
    });

    local.create_source(source_name, "REMOTE", config).await?;

    log::info!(
        "Registered cluster {} as source '{source_name}' on cluster {}",
        remote.id,
        local.target().id
    );

    Ok(())
}

/// Link every pair of clusters in both directions.
///
/// With exactly two clusters the configured source name is used as-is, mirroring the common
/// A/B comparison setup. With more clusters each source is suffixed with the remote's id to
/// keep catalog names unique.
pub async fn link_all(
    clients: &[ClusterClient],
    settings: &CrossClusterSettings,
) -> anyhow::Result<()> {
    for local in clients {
        for remote_client in clients {
            let remote = remote_client.target();
            if remote.id == local.target().id {
                continue;
            }

            let source_name = if clients.len() == 2 {
                settings.source_name.clone()
            } else {
                format!("{}_{}", settings.source_name, remote.id)
            };
            register_remote(local, remote, &source_name, settings).await?;
        }
    }

    Ok(())
}

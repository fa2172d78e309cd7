use std::collections::HashMap;
use std::time::Duration;

use futures::future::BoxFuture;
use lakebench_client::{ClusterClient, ClusterTarget, QueryResult};

/// Seam between the scheduler and the clusters it benchmarks.
///
/// The production implementation is [HttpBackend]; tests substitute their own to exercise the
/// scheduler without a network.
pub trait ClusterBackend: Send + Sync {
    /// Connectivity check for one cluster, run once before any of its work items are dispatched.
    fn probe<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, anyhow::Result<()>>;

    /// Execute one query against one cluster under the given timeout.
    fn execute<'a>(
        &'a self,
        cluster: &'a str,
        sql: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, anyhow::Result<QueryResult>>;
}

/// Routes calls to the [ClusterClient] for the addressed cluster.
pub struct HttpBackend {
    clients: HashMap<String, ClusterClient>,
}

impl HttpBackend {
    pub fn connect(targets: &[ClusterTarget]) -> anyhow::Result<Self> {
        let mut clients = HashMap::new();
        for target in targets {
            let client = ClusterClient::connect(target.clone())?;
            clients.insert(target.id.clone(), client);
        }

        Ok(Self { clients })
    }

    fn client(&self, cluster: &str) -> anyhow::Result<&ClusterClient> {
        self.clients
            .get(cluster)
            .ok_or_else(|| anyhow::anyhow!("No client configured for cluster {cluster}"))
    }
}

impl ClusterBackend for HttpBackend {
    fn probe<'a>(&'a self, cluster: &'a str) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            self.client(cluster)?.probe().await?;
            Ok(())
        })
    }

    fn execute<'a>(
        &'a self,
        cluster: &'a str,
        sql: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, anyhow::Result<QueryResult>> {
        Box::pin(async move {
            let result = self.client(cluster)?.execute(sql, timeout).await?;
            Ok(result)
        })
    }
}

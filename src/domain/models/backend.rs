use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Backend APIs the registry knows how to construct clients for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Primary orchestration cluster (core API).
    Cluster,
    /// Service-mesh extension API.
    ServiceMesh,
    /// Gateway/routing extension API.
    Gateway,
}

impl BackendKind {
    /// Every slot the registry holds, in a stable order.
    pub const ALL: [Self; 3] = [Self::Cluster, Self::ServiceMesh, Self::Gateway];

    /// Stable name used in logs, flags and JSON output.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cluster => "cluster",
            Self::ServiceMesh => "service-mesh",
            Self::Gateway => "gateway",
        }
    }

    /// Whether this backend is an extension on top of the primary cluster API.
    pub const fn is_extension(&self) -> bool {
        !matches!(self, Self::Cluster)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cluster" | "kubernetes" | "core" => Ok(Self::Cluster),
            "service-mesh" | "mesh" | "istio" => Ok(Self::ServiceMesh),
            "gateway" | "gateway-api" => Ok(Self::Gateway),
            other => Err(format!(
                "unknown backend '{other}' (expected one of: cluster, service-mesh, gateway)"
            )),
        }
    }
}

use async_trait::async_trait;
use clientgen::domain::models::{ApiRequest, ApiResponse};
use clientgen::infrastructure::backends::SERVICE_MESH_API;
use clientgen::infrastructure::transport::last_path_segment;
use clientgen::{
    BackendKind, ClientConstructionError, ClientFactories, ClientRegistry, ConnectionConfig,
    CredentialResolver, ExtensionClient, Transport, TransportError,
};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

struct NoopTransport;

#[async_trait]
impl Transport for NoopTransport {
    async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, TransportError> {
        Ok(ApiResponse::new(200, "{}"))
    }
}

fn registry() -> ClientRegistry {
    let resolver = CredentialResolver::new().without_default_kubeconfig();
    let factories = ClientFactories::with_resolver(&resolver).with_service_mesh(
        |_: &ConnectionConfig| -> Result<ExtensionClient, ClientConstructionError> {
            Ok(ExtensionClient::new(
                BackendKind::ServiceMesh,
                SERVICE_MESH_API,
                Arc::new(NoopTransport),
                "default",
            ))
        },
    );
    ClientRegistry::builder(ConnectionConfig::new())
        .with_resolver(resolver)
        .with_factories(factories)
        .build()
}

fn bench_cached_accessor(c: &mut Criterion) {
    let mut group = c.benchmark_group("cached_accessor");

    let registry = registry();
    registry.service_mesh().expect("mesh client");

    group.bench_function("service_mesh", |b| {
        b.iter(|| black_box(registry.service_mesh().unwrap()));
    });
    group.bench_function("get_client", |b| {
        b.iter(|| black_box(registry.get_client(BackendKind::ServiceMesh).unwrap()));
    });

    group.finish();
}

fn bench_path_reduction(c: &mut Criterion) {
    let mut group = c.benchmark_group("last_path_segment");

    let paths = [
        ("short", "/version"),
        ("namespaced", "/api/v1/namespaces/default/pods?limit=500"),
        (
            "extension",
            "/apis/gateway.networking.k8s.io/v1/namespaces/edge/httproutes/public#status",
        ),
    ];
    for (label, path) in paths {
        group.bench_with_input(BenchmarkId::from_parameter(label), path, |b, p| {
            b.iter(|| last_path_segment(black_box(p)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_cached_accessor, bench_path_reduction);
criterion_main!(benches);

//! Common test utilities for integration tests
//!
//! Kubeconfig and service-account fixtures shared by the integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const IN_CLUSTER_ENV: [&str; 2] = ["KUBERNETES_SERVICE_HOST", "KUBERNETES_SERVICE_PORT"];

/// Write a single-context kubeconfig into `dir` and return its path.
///
/// `server` may be empty to leave the cluster without an address.
pub fn write_kubeconfig(dir: &Path, file_name: &str, server: &str, token: &str) -> PathBuf {
    let server_line = if server.is_empty() {
        String::new()
    } else {
        format!("    server: {server}\n")
    };
    let contents = format!(
        "apiVersion: v1
kind: Config
current-context: test
clusters:
- name: test-cluster
  cluster:
{server_line}    insecure-skip-tls-verify: true
users:
- name: test-user
  user:
    token: {token}
contexts:
- name: test
  context:
    cluster: test-cluster
    user: test-user
    namespace: team-a
"
    );
    let path = dir.join(file_name);
    std::fs::write(&path, contents).expect("Failed to write kubeconfig");
    path
}

/// Kubeconfig in a fresh temp dir. Keep the `TempDir` alive for the test.
pub fn kubeconfig(server: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = write_kubeconfig(dir.path(), "config", server, "test-token");
    (dir, path)
}

/// Mounted service-account directory with a token and namespace.
pub fn service_account_dir(token: &str) -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("token"), token).expect("Failed to write token");
    std::fs::write(dir.path().join("namespace"), "kube-system").expect("Failed to write namespace");
    dir
}

/// Initialize a test-writer tracing subscriber, ignoring repeat calls.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

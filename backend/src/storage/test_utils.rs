//! Test utilities shared by the storage, domain and REST tests
//!
//! Each `TestBackend` owns a temporary directory that is removed when the
//! value is dropped, even if the test panics.

use serde::Serialize;
use std::path::PathBuf;
use tempfile::TempDir;

use super::backend::StorageBackend;
use super::document::connection::CASH_FLOWS;
use super::document::DocumentConnection;
use super::sqlite::DbConnection;
use crate::config::{StorageConfig, StorageKind};

/// A freshly connected backend living in its own temporary directory
pub struct TestBackend {
    pub backend: StorageBackend,
    pub config: StorageConfig,
    _temp_dir: TempDir, // Keep alive to prevent cleanup
}

impl TestBackend {
    pub async fn new(kind: StorageKind) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let document_path: PathBuf = temp_dir.path().join("documents");
        let sqlite_path = temp_dir.path().join("cashbook.db");

        let config = StorageConfig {
            kind,
            document_path,
            sqlite_url: format!("sqlite://{}", sqlite_path.display()),
            timeout_ms: 5000,
        };
        let backend = StorageBackend::connect(&config)
            .await
            .expect("Failed to connect test backend");

        Self {
            backend,
            config,
            _temp_dir: temp_dir,
        }
    }
}

#[derive(Serialize)]
struct CashFlowDocument<'a> {
    id: &'a str,
    category_id: &'a str,
    amount: f64,
    flow_date: String,
    description: &'a str,
}

/// Store a cash flow record referencing `category_id`, the way the cash flow
/// subsystem would
pub async fn seed_cash_flow(test: &TestBackend, category_id: &str, amount: f64) {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let flow_date = chrono::Utc::now().to_rfc3339();

    match test.config.kind {
        StorageKind::Document => {
            let connection = DocumentConnection::new(&test.config.document_path).unwrap();
            let document = CashFlowDocument {
                id: &id,
                category_id,
                amount,
                flow_date,
                description: "seeded",
            };
            connection
                .write_document(CASH_FLOWS, &id, &document)
                .await
                .expect("Failed to seed cash flow document");
        }
        StorageKind::Sqlite => {
            let db = DbConnection::new(&test.config.sqlite_url).await.unwrap();
            sqlx::query(
                "INSERT INTO cash_flows (id, category_id, amount, flow_date, description) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(category_id)
            .bind(amount)
            .bind(&flow_date)
            .bind("seeded")
            .execute(db.pool())
            .await
            .expect("Failed to seed cash flow row");
        }
    }
}

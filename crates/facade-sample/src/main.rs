//! # Facade Sample
//!
//! Boots the API server, prints the facade listing and drives a few requests through the
//! router, including the failures a client can see.
//!
//! ```bash
//! RUST_LOG=info cargo run -p facade-sample
//! FACADE_DISABLED="MigrationMaster(2)" RUST_LOG=debug cargo run -p facade-sample
//! ```

use facade_framework::tracing::setup_tracing;
use facade_framework::Permission;
use facade_sample::block::BlockApi;
use facade_sample::migration_master::{MigrationMasterApi, MigrationMasterApiV1};
use facade_sample::model::{BlockType, MigrationPhase};
use facade_sample::server::{ApiServer, ServerConfig, Session};
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    setup_tracing();

    let config = ServerConfig::from_env()?;
    let server = ApiServer::new(&config);
    server.state().add_agent("machine-0");
    server.state().add_charm("ch:postgresql-12");

    println!("{}", serde_json::to_string_pretty(&server.list_facades())?);

    let _agent = server.connect(Session::machine_agent("machine-0"));
    let controller = server.connect(Session::controller("controller-0"));
    server.state().start_migration("controller-target");

    let span = tracing::info_span!("migration_v3");
    async {
        let api = controller.facade::<MigrationMasterApi>("MigrationMaster", 3)?;
        api.prechecks().await?;
        api.set_phase(MigrationPhase::Quiesce).await?;
        info!(
            timeout = ?api.minion_report_timeout(),
            reports = ?api.minion_reports().await?,
            "Migration quiescing"
        );
        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .instrument(span)
    .await?;

    let span = tracing::info_span!("migration_v1");
    async {
        let api = controller.facade::<MigrationMasterApiV1>("MigrationMaster", 1)?;
        let status = api.migration_status().await?;
        info!(
            migration_id = %status.migration_id,
            phase = %status.phase,
            "Old client sees the same migration"
        );
        Ok::<_, Box<dyn std::error::Error>>(())
    }
    .instrument(span)
    .await?;

    let client = server.connect(Session::client("user-bob", &[Permission::Write]));
    let blocks = client.facade::<BlockApi>("Block", 2)?;
    blocks.switch_block_on(BlockType::Remove, "migration in progress").await?;
    info!(blocks = ?blocks.list().await?, "Blocks");

    if let Err(err) = client.dispatch("MigrationMaster", 3, "") {
        error!(%err, "Client may not drive a migration");
    }
    if let Err(err) = client.dispatch("MigrationMaster", 4, "") {
        error!(%err, "Unknown facade version");
    }

    info!("Done");
    Ok(())
}

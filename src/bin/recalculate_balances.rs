use anyhow::{Context, Result, bail};
use chrono::Datelike;
use clap::Parser;
use peopleops::{
    config::ConfigLoader,
    db,
    leave::{LeaveLedger, LeaveWorkflow},
    repositories::{LeaveTypeRepository, TeamMemberRepository, TenantRepository},
    seeds, telemetry,
};
use tracing::{info, warn};
use uuid::Uuid;

/// Rebuilds a tenant's leave balances from its leave requests.
#[derive(Parser, Debug)]
#[command(name = "recalculate_balances", version, about, long_about = None)]
struct Cli {
    /// Tenant whose balances are reconciled
    #[arg(long)]
    tenant: Uuid,

    /// Ledger year to reconcile
    #[arg(long)]
    year: i32,

    /// Roll unused days of the previous year into `--year` first
    #[arg(long)]
    carry_forward: bool,

    /// Seed the default leave types and policies before reconciling
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = ConfigLoader::new()
        .load()
        .context("loading configuration")?;
    telemetry::init_tracing(&config).context("initializing tracing")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;
    db::run_migrations(&db).await.context("running migrations")?;

    if !TenantRepository::new(&db)
        .tenant_exists(cli.tenant)
        .await
        .context("looking up tenant")?
    {
        bail!("tenant {} does not exist", cli.tenant);
    }

    if cli.seed {
        seeds::seed_leave_types(&db, cli.tenant)
            .await
            .context("seeding leave types")?;
        seeds::seed_default_leave_policies(&db, cli.tenant)
            .await
            .context("seeding leave policies")?;
    }

    if cli.carry_forward {
        let from_year = cli.year - 1;
        let members = TeamMemberRepository::new(&db)
            .list(cli.tenant)
            .await
            .context("listing team members")?;
        let leave_types = LeaveTypeRepository::new(&db)
            .list_active(cli.tenant)
            .await
            .context("listing leave types")?;

        let workflow = LeaveWorkflow::new(&db);
        let mut applied = 0usize;
        for member in members
            .iter()
            .filter(|m| m.is_active && m.joined_date.year() <= from_year)
        {
            for leave_type in &leave_types {
                workflow
                    .apply_carry_forward(cli.tenant, member.id, leave_type.id, from_year)
                    .await
                    .with_context(|| {
                        format!(
                            "applying carry-forward for member {} and leave type {}",
                            member.id, leave_type.code
                        )
                    })?;
                applied += 1;
            }
        }
        info!(tenant_id = %cli.tenant, from_year, applied, "Carry-forward applied");
    }

    let report = LeaveLedger::new(&db)
        .reconcile(cli.tenant, cli.year)
        .await
        .context("reconciling leave balances")?;

    for drift in &report.drifted {
        warn!(
            balance_id = %drift.balance_id,
            team_member_id = %drift.team_member_id,
            leave_type_id = %drift.leave_type_id,
            stored_used = drift.stored_used,
            used = drift.used,
            stored_pending = drift.stored_pending,
            pending = drift.pending,
            stored_available = drift.stored_available,
            available = drift.available,
            "Corrected drifted leave balance"
        );
    }

    println!(
        "Reconciled {} balances for tenant {} in {} ({} corrected)",
        report.checked,
        cli.tenant,
        cli.year,
        report.drifted.len()
    );

    Ok(())
}

//! Operator CLI for the CareLink scheduling core.
//!
//! Every domain command runs as a stored user (`--actor`); the role comes from
//! the users table. Writes go through `serialized_write` so conflict checks
//! and inserts share one immediate transaction.

use std::path::PathBuf;

use anyhow::Context;
use carelink_core::db::migrations::latest_version;
use carelink_core::{
    init_logging, open_db, serialized_write, ActivityInput, ActivityScheduler, AuthContext,
    CareWindowInput, CareWindowRegistry, CaregiverInput, CoreConfig, CoreResult,
    DirectoryRepository, DirectoryService, ErrorResponse, PatientInput, Role,
    SqliteActivityRepository, SqliteCareWindowRepository, SqliteDirectoryRepository, SystemClock,
    User,
};
use clap::{Parser, Subcommand};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "carelink")]
#[command(about = "Care window and activity scheduling for caregiving teams", long_about = None)]
struct Cli {
    /// SQLite database file (overrides CARELINK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Log level (overrides CARELINK_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Absolute log directory (overrides CARELINK_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or upgrade the database schema
    InitDb,
    /// Bootstrap an administrator account
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        name: String,
    },
    /// Register a patient
    AddPatient {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        birthdate: Option<String>,
    },
    /// Register a caregiver account
    AddCaregiver {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        name: String,
        /// YYYY-MM-DD
        #[arg(long)]
        birthdate: String,
        #[arg(long)]
        contact: String,
    },
    /// List patients visible to the actor
    Patients {
        #[arg(long)]
        actor: Uuid,
    },
    /// Assign a weekly care window
    AddWindow {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        patient: String,
        #[arg(long)]
        caregiver: String,
        /// 0 = Sunday .. 6 = Saturday
        #[arg(long)]
        weekday: i64,
        /// HH:MM
        #[arg(long)]
        start: String,
        /// HH:MM
        #[arg(long)]
        end: String,
    },
    /// Remove a care window
    RemoveWindow {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        id: Uuid,
    },
    /// List windows linking a patient and a caregiver
    Windows {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        patient: Uuid,
        #[arg(long)]
        caregiver: Uuid,
    },
    /// Schedule an activity for a patient
    Schedule {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        patient: Uuid,
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: Option<String>,
        /// YYYY-MM-DD HH:MM
        #[arg(long)]
        start: String,
        /// YYYY-MM-DD HH:MM
        #[arg(long)]
        end: String,
    },
    /// Cancel a scheduled activity
    Cancel {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        id: Uuid,
    },
    /// List a patient's activities visible to the actor
    Activities {
        #[arg(long)]
        actor: Uuid,
        #[arg(long)]
        patient: Uuid,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir).context("failed to initialize logging")?;
    }

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open database `{}`", config.db_path.display()))?;

    match cli.command {
        Commands::InitDb => {
            println!(
                "Schema ready at version {} in {}.",
                latest_version(),
                config.db_path.display()
            );
        }
        Commands::CreateAdmin { username, name } => {
            let directory = SqliteDirectoryRepository::try_new(&conn)?;
            let admin = User::new(username, name, Role::Admin);
            directory
                .create_user(&admin)
                .context("failed to create administrator")?;
            info!("event=admin_bootstrap module=cli status=ok user_id={}", admin.id);
            print_json(&admin)?;
        }
        Commands::AddPatient {
            actor,
            name,
            birthdate,
        } => {
            let ctx = resolve_actor(&conn, actor)?;
            let input = PatientInput {
                name: Some(name),
                birthdate,
            };
            let result = serialized_write(&conn, || -> CoreResult<_> {
                directory_service(&conn)?.create_patient(input, &ctx)
            });
            emit(result)?;
        }
        Commands::AddCaregiver {
            actor,
            name,
            birthdate,
            contact,
        } => {
            let ctx = resolve_actor(&conn, actor)?;
            let input = CaregiverInput {
                name: Some(name),
                birthdate: Some(birthdate),
                contact: Some(contact),
            };
            let result = serialized_write(&conn, || -> CoreResult<_> {
                directory_service(&conn)?.create_caregiver(input, &ctx)
            });
            emit(result)?;
        }
        Commands::Patients { actor } => {
            let ctx = resolve_actor(&conn, actor)?;
            emit(directory_service(&conn).and_then(|service| service.list_patients(&ctx)))?;
        }
        Commands::AddWindow {
            actor,
            patient,
            caregiver,
            weekday,
            start,
            end,
        } => {
            let ctx = resolve_actor(&conn, actor)?;
            let input = CareWindowInput {
                patient_id: Some(patient),
                caregiver_id: Some(caregiver),
                weekday: Some(weekday),
                start_time: Some(start),
                end_time: Some(end),
            };
            let result = serialized_write(&conn, || -> CoreResult<_> {
                registry(&conn)?.create(input, &ctx)
            });
            emit(result)?;
        }
        Commands::RemoveWindow { actor, id } => {
            let ctx = resolve_actor(&conn, actor)?;
            let result = serialized_write(&conn, || -> CoreResult<_> {
                registry(&conn)?.delete(id, &ctx)
            });
            emit(result.map(|()| serde_json::json!({ "deleted": id })))?;
        }
        Commands::Windows {
            actor,
            patient,
            caregiver,
        } => {
            let ctx = resolve_actor(&conn, actor)?;
            let windows = registry(&conn)
                .and_then(|registry| registry.list_for_pair(patient, caregiver, &ctx));
            emit(windows)?;
        }
        Commands::Schedule {
            actor,
            patient,
            title,
            description,
            start,
            end,
        } => {
            let ctx = resolve_actor(&conn, actor)?;
            let input = ActivityInput {
                title: Some(title),
                description,
                start_datetime: Some(start),
                end_datetime: Some(end),
            };
            let result = serialized_write(&conn, || -> CoreResult<_> {
                scheduler(&conn)?.create(patient, input, &ctx)
            });
            emit(result)?;
        }
        Commands::Cancel { actor, id } => {
            let ctx = resolve_actor(&conn, actor)?;
            let result = serialized_write(&conn, || -> CoreResult<_> {
                scheduler(&conn)?.delete(id, &ctx)
            });
            emit(result.map(|()| serde_json::json!({ "deleted": id })))?;
        }
        Commands::Activities { actor, patient } => {
            let ctx = resolve_actor(&conn, actor)?;
            let activities = scheduler(&conn)
                .and_then(|scheduler| scheduler.list_for_patient(patient, &ctx));
            emit(activities)?;
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let mut config = CoreConfig::from_env().context("invalid CARELINK_* environment")?;
    if let Some(db) = &cli.db {
        config.db_path = db.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(dir) = &cli.log_dir {
        config.log_dir = Some(dir.clone());
    }
    config.validate().context("invalid command line options")?;
    Ok(config)
}

/// Builds the acting identity from a stored user.
fn resolve_actor(conn: &Connection, actor: Uuid) -> anyhow::Result<AuthContext> {
    let directory = SqliteDirectoryRepository::try_new(conn)?;
    let user = directory
        .get_user(actor)?
        .with_context(|| format!("actor {actor} is not a known user"))?;
    Ok(AuthContext::new(user.id, user.role))
}

type SqliteRegistry<'conn> =
    CareWindowRegistry<SqliteCareWindowRepository<'conn>, SqliteDirectoryRepository<'conn>>;
type SqliteScheduler<'conn> = ActivityScheduler<
    SqliteActivityRepository<'conn>,
    SqliteCareWindowRepository<'conn>,
    SqliteDirectoryRepository<'conn>,
    SystemClock,
>;
type SqliteDirectoryService<'conn> = DirectoryService<
    SqliteDirectoryRepository<'conn>,
    SqliteCareWindowRepository<'conn>,
    SystemClock,
>;

fn registry(conn: &Connection) -> CoreResult<SqliteRegistry<'_>> {
    Ok(CareWindowRegistry::new(
        SqliteCareWindowRepository::try_new(conn)?,
        SqliteDirectoryRepository::try_new(conn)?,
    ))
}

fn scheduler(conn: &Connection) -> CoreResult<SqliteScheduler<'_>> {
    Ok(ActivityScheduler::new(
        SqliteActivityRepository::try_new(conn)?,
        SqliteCareWindowRepository::try_new(conn)?,
        SqliteDirectoryRepository::try_new(conn)?,
        SystemClock,
    ))
}

fn directory_service(conn: &Connection) -> CoreResult<SqliteDirectoryService<'_>> {
    Ok(DirectoryService::new(
        SqliteDirectoryRepository::try_new(conn)?,
        SqliteCareWindowRepository::try_new(conn)?,
        SystemClock,
    ))
}

/// Prints a success payload, or the boundary error payload on stderr.
fn emit<T: Serialize>(result: CoreResult<T>) -> anyhow::Result<()> {
    match result {
        Ok(value) => print_json(&value),
        Err(err) => {
            let response = ErrorResponse::from(&err);
            eprintln!("{}", serde_json::to_string_pretty(&response)?);
            Err(anyhow::Error::new(err)
                .context(format!("request failed with status {}", response.status)))
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Cli, Commands};
    use clap::Parser;

    #[test]
    fn parses_schedule_with_global_db_flag() {
        let cli = Cli::try_parse_from([
            "carelink",
            "schedule",
            "--db",
            "/tmp/care.sqlite3",
            "--actor",
            "6f1c1b1e-8a53-4c35-9f0c-2f1f4a1d2b3c",
            "--patient",
            "0b8f5a4e-3b1e-4f42-8a3c-9e6d7c5b4a21",
            "--title",
            "Morning walk",
            "--start",
            "2030-03-11 09:15",
            "--end",
            "2030-03-11 09:45",
        ])
        .unwrap();

        assert_eq!(cli.db.as_deref(), Some(std::path::Path::new("/tmp/care.sqlite3")));
        match cli.command {
            Commands::Schedule { title, description, .. } => {
                assert_eq!(title, "Morning walk");
                assert!(description.is_none());
            }
            _ => panic!("expected schedule command"),
        }
    }

    #[test]
    fn rejects_malformed_actor_id() {
        assert!(Cli::try_parse_from(["carelink", "patients", "--actor", "not-a-uuid"]).is_err());
    }
}

use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;

use carebase_core::{ActionStatus, Notification};
use carebase_runtime::CarebaseApp;
use carebase_stores::{
    ActionStore, AllergyStore, EducationStore, MessageStore, PracticeStore, PrescriptionStore,
    SettingsStore, UserStore, VitalStore,
};

/// How long to wait for announcements emitted by the last operation.
const NOTIFICATION_GRACE: Duration = Duration::from_millis(150);

#[derive(Debug, Parser)]
#[command(name = "carebase", about = "Carebase API client")]
pub struct Cli {
    #[arg(long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List a patient's allergies, or remove one
    Allergies(AllergyArgs),
    /// List a patient's vitals
    Vitals(PatientArgs),
    /// List or search a patient's education records
    Education(EducationArgs),
    /// List a patient's prescriptions
    Prescriptions(PatientArgs),
    /// List practices
    Practices,
    /// Show practice settings
    Settings,
    /// List a user's messages
    Messages(MessageArgs),
    /// List or search user accounts
    Users(SearchArgs),
}

#[derive(Debug, Args, Clone)]
struct PatientArgs {
    #[arg(long)]
    patient: String,
}

#[derive(Debug, Args, Clone)]
struct AllergyArgs {
    #[arg(long)]
    patient: String,
    /// Remove this allergy instead of listing
    #[arg(long)]
    remove: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct EducationArgs {
    #[arg(long)]
    patient: String,
    #[arg(long)]
    query: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct MessageArgs {
    #[arg(long)]
    user: String,
}

#[derive(Debug, Args, Clone)]
struct SearchArgs {
    #[arg(long)]
    query: Option<String>,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        ensure_log_filter(self.verbose);
        let app = CarebaseApp::from_env()?;
        let printer = app
            .notifier()
            .subscribe(Arc::new(|notification: &Notification| {
                print_notification(notification)
            }));

        let result = dispatch(&app, self.command).await;

        tokio::time::sleep(NOTIFICATION_GRACE).await;
        printer.unsubscribe();
        result
    }
}

async fn dispatch(app: &CarebaseApp, command: Command) -> anyhow::Result<()> {
    let stores = app.stores();
    match command {
        Command::Allergies(args) => match args.remove {
            Some(allergy_id) => {
                let store = &stores.allergies;
                let status = store.remove(&args.patient, &allergy_id).await;
                report(store.state(), AllergyStore::REMOVE, status)
            }
            None => {
                let store = &stores.allergies;
                let status = store.get_all(&args.patient).await;
                report(store.state(), AllergyStore::GET_ALL, status)
            }
        },
        Command::Vitals(args) => {
            let store = &stores.vitals;
            let status = store.get_all(&args.patient).await;
            report(store.state(), VitalStore::GET_ALL, status)
        }
        Command::Education(args) => {
            let store = &stores.education;
            match args.query {
                Some(query) => {
                    let status = store.search(&args.patient, &query).await;
                    report(store.state(), EducationStore::SEARCH, status)
                }
                None => {
                    let status = store.get_all(&args.patient).await;
                    report(store.state(), EducationStore::GET_ALL, status)
                }
            }
        }
        Command::Prescriptions(args) => {
            let store = &stores.prescriptions;
            let status = store.get_all(&args.patient).await;
            report(store.state(), PrescriptionStore::GET_ALL, status)
        }
        Command::Practices => {
            let store = &stores.practices;
            let status = store.get_all().await;
            report(store.state(), PracticeStore::GET_ALL, status)
        }
        Command::Settings => {
            let store = &stores.settings;
            let status = store.get().await;
            report(store.state(), SettingsStore::GET, status)
        }
        Command::Messages(args) => {
            let store = &stores.messages;
            let status = store.get_all(&args.user).await;
            if status == ActionStatus::Fulfilled {
                eprintln!("{} unread", store.unread_count());
            }
            report(store.state(), MessageStore::GET_ALL, status)
        }
        Command::Users(args) => {
            let store = &stores.users;
            match args.query {
                Some(query) => {
                    let status = store.search(&query).await;
                    report(store.state(), UserStore::SEARCH, status)
                }
                None => {
                    let status = store.get_all().await;
                    report(store.state(), UserStore::GET_ALL, status)
                }
            }
        }
    }
}

fn report<D>(store: &ActionStore<D>, operation: &str, status: ActionStatus) -> anyhow::Result<()>
where
    D: Clone + Serialize + Send + Sync + 'static,
{
    tracing::debug!(store = store.name(), operation, status = ?status, "operation settled");
    match status {
        ActionStatus::Fulfilled => {
            println!("{}", serde_json::to_string_pretty(&store.data())?);
            Ok(())
        }
        _ => {
            let message = store
                .error_message(operation)
                .unwrap_or_else(|| "request failed".to_string());
            bail!("{} {operation}: {message}", store.name())
        }
    }
}

fn print_notification(notification: &Notification) {
    match &notification.payload.description {
        Some(description) => eprintln!(
            "[{}] {}: {}",
            notification.kind, notification.payload.title, description
        ),
        None => eprintln!("[{}] {}", notification.kind, notification.payload.title),
    }
}

fn ensure_log_filter(verbose: bool) {
    if env::var("RUST_LOG").is_ok() {
        return;
    }
    env::set_var("RUST_LOG", if verbose { "debug" } else { "warn" });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_patient_subcommands() {
        let cli = Cli::try_parse_from(["carebase", "allergies", "--patient", "p1", "--remove", "a1"])
            .unwrap();
        match cli.command {
            Command::Allergies(args) => {
                assert_eq!(args.patient, "p1");
                assert_eq!(args.remove.as_deref(), Some("a1"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_patient_is_required() {
        assert!(Cli::try_parse_from(["carebase", "vitals"]).is_err());
    }

    #[test]
    fn test_global_verbose_flag() {
        let cli = Cli::try_parse_from(["carebase", "users", "--query", "ada", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Users(SearchArgs { query: Some(_) })));
    }
}

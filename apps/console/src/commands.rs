use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use tracing::debug;
use uuid::Uuid;

use crate::client::ApiClient;
use crate::endpoints::{applications, cooptations, job_postings, opportunities};
use crate::errors::{describe, ApiError};
use crate::models::application::{
    Application, ApplicationReview, ApplicationStatus, PublicApplication,
};
use crate::models::cooptation::{Cooptation, CooptationStatus, NewCooptation};
use crate::models::job_posting::{JobPosting, JobPostingQuery, JobPostingStatus, NewJobPosting};
use crate::models::opportunity::OpportunityQuery;
use crate::models::Page;
use crate::session::{SessionEvent, SessionStore, SessionTokens};

#[derive(Debug, Parser)]
#[command(name = "hr-console", version, about = "Recruitment back-office console")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Browse open opportunities
    Opportunities {
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        page_size: Option<u32>,
    },
    /// Manage job postings
    Postings {
        #[command(subcommand)]
        action: PostingAction,
    },
    /// Review applications received for a posting
    Applications {
        #[command(subcommand)]
        action: ApplicationAction,
    },
    /// Track employee referrals
    Cooptations {
        #[command(subcommand)]
        action: CooptationAction,
    },
    /// Inspect or replace the stored session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum PostingAction {
    List {
        #[arg(long, value_enum)]
        status: Option<JobPostingStatus>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        page: Option<u32>,
    },
    Show {
        id: Uuid,
    },
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        contract_type: Option<String>,
    },
    Publish {
        id: Uuid,
    },
    Archive {
        id: Uuid,
    },
    Delete {
        id: Uuid,
    },
}

#[derive(Debug, Subcommand)]
pub enum ApplicationAction {
    List {
        posting: Uuid,
        #[arg(long)]
        page: Option<u32>,
    },
    Show {
        id: Uuid,
    },
    Review {
        id: Uuid,
        #[arg(value_enum)]
        status: ApplicationStatus,
        #[arg(long)]
        note: Option<String>,
    },
    /// Send an application through the public candidate form
    Submit {
        #[arg(long)]
        posting: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        cover_letter: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CooptationAction {
    List {
        #[arg(long, value_enum)]
        status: Option<CooptationStatus>,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        posting: Option<Uuid>,
    },
    SetStatus {
        id: Uuid,
        #[arg(value_enum)]
        status: CooptationStatus,
    },
}

#[derive(Debug, Subcommand)]
pub enum SessionAction {
    Show,
    /// Store tokens issued by the web sign-in
    Import {
        #[arg(long)]
        access: String,
        #[arg(long)]
        refresh: Option<String>,
    },
    Clear,
}

pub async fn run(command: Command, client: &ApiClient) -> Result<()> {
    match command {
        Command::Opportunities {
            search,
            page,
            page_size,
        } => {
            let query = OpportunityQuery {
                search,
                page,
                page_size,
            };
            let page = opportunities::list_opportunities(client, &query).await?;
            print_footer(&page);
            for o in &page.results {
                println!(
                    "{}  {}  {}",
                    o.id,
                    o.title,
                    o.company.as_deref().unwrap_or("-")
                );
            }
        }
        Command::Postings { action } => run_postings(action, client).await?,
        Command::Applications { action } => run_applications(action, client).await?,
        Command::Cooptations { action } => run_cooptations(action, client).await?,
        Command::Session { action } => run_session(action, client),
    }
    Ok(())
}

async fn run_postings(action: PostingAction, client: &ApiClient) -> Result<()> {
    match action {
        PostingAction::List {
            status,
            search,
            page,
        } => {
            let query = JobPostingQuery {
                status,
                search,
                page,
            };
            let page = job_postings::list_job_postings(client, &query).await?;
            print_footer(&page);
            page.results.iter().for_each(print_posting);
        }
        PostingAction::Show { id } => {
            let posting = job_postings::get_job_posting(client, id).await?;
            print_posting(&posting);
            println!("\n{}", posting.description);
        }
        PostingAction::Create {
            title,
            description,
            location,
            contract_type,
        } => {
            let posting = job_postings::create_job_posting(
                client,
                &NewJobPosting {
                    title,
                    description,
                    location,
                    contract_type,
                },
            )
            .await?;
            print_posting(&posting);
        }
        PostingAction::Publish { id } => {
            let posting =
                job_postings::set_job_posting_status(client, id, JobPostingStatus::Published)
                    .await?;
            print_posting(&posting);
        }
        PostingAction::Archive { id } => {
            let posting =
                job_postings::set_job_posting_status(client, id, JobPostingStatus::Archived)
                    .await?;
            print_posting(&posting);
        }
        PostingAction::Delete { id } => {
            job_postings::delete_job_posting(client, id).await?;
            println!("Deleted {id}");
        }
    }
    Ok(())
}

async fn run_applications(action: ApplicationAction, client: &ApiClient) -> Result<()> {
    match action {
        ApplicationAction::List { posting, page } => {
            let page = applications::list_applications(client, posting, page).await?;
            print_footer(&page);
            page.results.iter().for_each(print_application);
        }
        ApplicationAction::Show { id } => {
            let application = applications::get_application(client, id).await?;
            print_application(&application);
            if let Some(note) = &application.review_note {
                println!("  note: {note}");
            }
        }
        ApplicationAction::Review { id, status, note } => {
            let review = ApplicationReview {
                status,
                review_note: note,
            };
            let application = applications::review_application(client, id, &review).await?;
            print_application(&application);
        }
        ApplicationAction::Submit {
            posting,
            name,
            email,
            phone,
            cover_letter,
        } => {
            let form = PublicApplication {
                job_posting: posting,
                candidate_name: name,
                email,
                phone,
                cover_letter,
            };
            applications::submit_public_application(client, &form).await?;
            println!("Application sent");
        }
    }
    Ok(())
}

async fn run_cooptations(action: CooptationAction, client: &ApiClient) -> Result<()> {
    match action {
        CooptationAction::List { status } => {
            let page = cooptations::list_cooptations(client, status).await?;
            print_footer(&page);
            page.results.iter().for_each(print_cooptation);
        }
        CooptationAction::Create {
            name,
            email,
            posting,
        } => {
            let cooptation = cooptations::create_cooptation(
                client,
                &NewCooptation {
                    candidate_name: name,
                    candidate_email: email,
                    job_posting: posting,
                },
            )
            .await?;
            print_cooptation(&cooptation);
        }
        CooptationAction::SetStatus { id, status } => {
            let cooptation = cooptations::update_cooptation_status(client, id, status).await?;
            print_cooptation(&cooptation);
        }
    }
    Ok(())
}

fn run_session(action: SessionAction, client: &ApiClient) {
    let store = client.session();
    match action {
        SessionAction::Show => {
            let tokens = store.tokens();
            let has = |present: bool| if present { "yes" } else { "no" };
            println!(
                "access token:  {}",
                has(tokens.as_ref().and_then(|t| t.access()).is_some())
            );
            println!(
                "refresh token: {}",
                has(tokens.as_ref().and_then(|t| t.refresh()).is_some())
            );
            match store.identity() {
                Some(identity) => println!("identity:      {}", identity.0),
                None => println!("identity:      -"),
            }
        }
        SessionAction::Import { access, refresh } => {
            store.set_auth(store.identity(), SessionTokens::new(access, refresh));
            println!("Session stored");
        }
        SessionAction::Clear => store.logout(),
    }
}

fn print_footer<T>(page: &Page<T>) {
    let more = if page.has_more() { " (more available)" } else { "" };
    println!("{} result(s){more}", page.count);
}

fn print_posting(p: &JobPosting) {
    println!(
        "{}  [{}]  {}  {}",
        p.id,
        p.status.as_str(),
        p.title,
        p.location.as_deref().unwrap_or("-")
    );
}

fn print_application(a: &Application) {
    println!(
        "{}  [{:?}]  {} <{}>  {}",
        a.id,
        a.status,
        a.candidate_name,
        a.email,
        a.submitted_at.format("%Y-%m-%d")
    );
}

fn print_cooptation(c: &Cooptation) {
    println!(
        "{}  [{}]  {} <{}>  referred by {}",
        c.id,
        c.status.as_str(),
        c.candidate_name,
        c.candidate_email,
        c.referrer.as_deref().unwrap_or("-")
    );
}

/// Drains pending session events and reports whether the session was ended.
///
/// When the receiver lagged, the skipped events may have included the logout,
/// so the store itself decides.
pub fn drain_signed_out(
    events: &mut broadcast::Receiver<SessionEvent>,
    store: &dyn SessionStore,
) -> bool {
    let mut signed_out = false;
    loop {
        match events.try_recv() {
            Ok(SessionEvent::LoggedOut) => signed_out = true,
            Ok(SessionEvent::Authenticated) => {}
            Err(TryRecvError::Lagged(skipped)) => {
                debug!("Skipped {skipped} session events");
                signed_out |= store.tokens().is_none();
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => return signed_out,
        }
    }
}

/// Rewrites a backend failure into its user-facing message.
pub fn user_facing(error: anyhow::Error) -> anyhow::Error {
    let message = error.downcast_ref::<ApiError>().map(describe);
    match message {
        Some(message) => anyhow!(message),
        None => error,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::client::testing::ScriptedTransport;
    use crate::client::AuthPaths;
    use crate::session::MemorySessionStore;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_application_review() {
        let id = Uuid::new_v4();
        let id_arg = id.to_string();
        let cli = Cli::try_parse_from([
            "hr-console",
            "applications",
            "review",
            id_arg.as_str(),
            "shortlisted",
            "--note",
            "Bon profil",
        ])
        .unwrap();

        match cli.command {
            Command::Applications {
                action:
                    ApplicationAction::Review {
                        id: parsed,
                        status,
                        note,
                    },
            } => {
                assert_eq!(parsed, id);
                assert_eq!(status, ApplicationStatus::Shortlisted);
                assert_eq!(note.as_deref(), Some("Bon profil"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        let result = Cli::try_parse_from(["hr-console", "postings", "list", "--status", "live"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_session_import_and_clear() {
        let store = Arc::new(MemorySessionStore::new());
        let client = ApiClient::new(
            Arc::new(ScriptedTransport::new()),
            store.clone(),
            AuthPaths::default(),
        );

        run(
            Command::Session {
                action: SessionAction::Import {
                    access: "a".to_string(),
                    refresh: Some("r".to_string()),
                },
            },
            &client,
        )
        .await
        .unwrap();
        assert_eq!(store.refresh_token().as_deref(), Some("r"));

        run(
            Command::Session {
                action: SessionAction::Clear,
            },
            &client,
        )
        .await
        .unwrap();
        assert!(store.tokens().is_none());
    }

    #[test]
    fn test_drain_reports_logout() {
        let store = MemorySessionStore::with_tokens(None, SessionTokens::new("a", None));
        let mut events = store.subscribe();
        store.logout();
        store.set_auth(None, SessionTokens::new("b", None));

        assert!(drain_signed_out(&mut events, &store));
        assert!(!drain_signed_out(&mut events, &store));
    }

    #[test]
    fn test_drain_without_logout_is_quiet() {
        let store = MemorySessionStore::new();
        let mut events = store.subscribe();
        store.set_auth(None, SessionTokens::new("a", None));

        assert!(!drain_signed_out(&mut events, &store));
    }

    #[test]
    fn test_drain_keeps_going_after_lag() {
        let store = MemorySessionStore::new();
        let mut events = store.subscribe();
        for i in 0..40 {
            store.set_auth(None, SessionTokens::new(format!("access-{i}"), None));
            store.logout();
        }

        assert!(drain_signed_out(&mut events, &store));
    }

    #[test]
    fn test_lagged_drain_with_live_session_is_not_signed_out() {
        let store = MemorySessionStore::new();
        let mut events = store.subscribe();
        for i in 0..64 {
            store.set_auth(None, SessionTokens::new(format!("access-{i}"), None));
        }

        assert!(!drain_signed_out(&mut events, &store));
    }

    #[test]
    fn test_user_facing_uses_server_detail() {
        let api_error = ApiError::from_status(
            reqwest::StatusCode::CONFLICT,
            Some(serde_json::json!({"detail": "Offre déjà archivée."})),
        );
        let err = user_facing(anyhow::Error::from(api_error));
        assert_eq!(err.to_string(), "Offre déjà archivée.");

        let other = user_facing(anyhow!("Failed to open session store"));
        assert_eq!(other.to_string(), "Failed to open session store");
    }
}

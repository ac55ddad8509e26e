//! friction-intake - terminal front end for the COO intake chat
//!
//! Restores the saved conversation, then reads lines from stdin. Plain text
//! is sent to the analyzer; slash commands drive everything else.

mod cli;

use cli::{Command, HELP};
use friction_finder::api::ApiClient;
use friction_finder::auth::{self, Credential, CredentialHolder};
use friction_finder::config::AppConfig;
use friction_finder::intake::Role;
use friction_finder::report::{export_file_name, Currency, ReportOptions};
use friction_finder::runtime::{
    spawn_intake, ApiAnalyzer, IntakeHandle, IntakeUpdate, LocalSnapshotStore, LoggingAnalyzer,
};
use friction_finder::store::LocalStore;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Library and binary events both log at info unless `RUST_LOG` says otherwise
const DEFAULT_LOG_FILTER: &str = "friction_finder=info,friction_intake=info";

struct App {
    client: ApiClient,
    store: LocalStore,
    credentials: CredentialHolder,
    intake: IntakeHandle,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr; stdout carries the conversation
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = AppConfig::from_env()?;

    tracing::info!(path = %config.store_path.display(), "Opening local store");
    let store = LocalStore::open(&config.store_path)?;

    let credentials = CredentialHolder::from_store(&store);
    if let Some(credential) = config.app_password.as_deref().and_then(Credential::new) {
        credentials.set(credential);
    }
    if !credentials.is_set() {
        tracing::warn!("No app password configured. Use /login or set FRICTION_APP_PASSWORD.");
    }

    let client = ApiClient::new(&config.api_url);
    tracing::info!(api_url = %client.base_url(), "Friction Finder client ready");

    let analyzer = LoggingAnalyzer::new(ApiAnalyzer::new(client.clone(), credentials.clone()));
    let intake = spawn_intake(
        analyzer,
        LocalSnapshotStore::new(store.clone()),
        &config.greeting,
        config.context.clone(),
    );

    let view = intake.view();
    for turn in view.session.transcript.turns() {
        println!("{}", cli::render_turn(turn));
    }
    if let Some(verdict) = &view.session.verdict {
        for line in cli::render_verdict(verdict) {
            println!("  {line}");
        }
    }
    println!("(type /help for commands)");

    let printer = tokio::spawn(print_updates(intake.subscribe()));

    let app = App {
        client,
        store,
        credentials,
        intake,
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        match Command::parse(&line) {
            Ok(Command::Quit) => break,
            Ok(command) => app.run(command).await,
            Err(e) => println!("{e}"),
        }
    }

    app.intake.teardown().await;
    printer.abort();
    Ok(())
}

async fn print_updates(mut updates: broadcast::Receiver<IntakeUpdate>) {
    loop {
        match updates.recv().await {
            Ok(IntakeUpdate::TurnAppended { turn }) if turn.role == Role::Assistant => {
                println!("{}", cli::render_turn(&turn));
            }
            Ok(IntakeUpdate::Settled { verdict }) => {
                for line in cli::render_verdict(&verdict) {
                    println!("  {line}");
                }
            }
            Ok(IntakeUpdate::StateChanged { state }) if state != "idle" => {
                println!("  ... {}", state.replace('_', " "));
            }
            Ok(IntakeUpdate::Failed { message, .. }) => println!("  error: {message}"),
            Ok(IntakeUpdate::Ignored { reason }) => println!("  {reason}"),
            Ok(IntakeUpdate::SessionReset { greeting }) => {
                println!("-- new session --");
                println!("{}", cli::render_turn(&greeting));
            }
            Ok(_) => {}
            Err(broadcast::error::RecvError::Lagged(n)) => {
                tracing::warn!(skipped = n, "Update printer lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

impl App {
    async fn run(&self, command: Command) {
        let credential = self.credentials.current();
        let credential = credential.as_ref();

        let result: Result<Vec<String>, Box<dyn std::error::Error>> = match command {
            Command::Message(text) => self
                .intake
                .send_message(text)
                .await
                .map(|()| vec![])
                .map_err(Into::into),
            Command::Commit => self
                .intake
                .commit_now()
                .await
                .map(|()| vec![])
                .map_err(Into::into),
            Command::New => self
                .intake
                .reset()
                .await
                .map(|()| vec![])
                .map_err(Into::into),
            Command::Status => Ok(self.status()),
            Command::Context { key, value } => self.edit_context(&key, &value).await,
            Command::Login(password) => {
                auth::login(&self.client, &self.store, &self.credentials, &password)
                    .await
                    .map(|()| vec!["Logged in.".to_string()])
                    .map_err(Into::into)
            }
            Command::Logout => auth::logout(&self.store, &self.credentials)
                .map(|()| vec!["Logged out.".to_string()])
                .map_err(Into::into),
            Command::Dashboard => self
                .client
                .dashboard(credential)
                .await
                .map(|m| cli::render_dashboard(&m))
                .map_err(Into::into),
            Command::PainPoints(filter) => self
                .client
                .list_pain_points(&filter, credential)
                .await
                .map(|items| cli::render_pain_points(&items))
                .map_err(Into::into),
            Command::PainPoint(id) => self
                .client
                .pain_point(id, credential)
                .await
                .map(|detail| cli::render_pain_point(&detail))
                .map_err(Into::into),
            Command::Report { currency, rate } => self.preview_report(currency, rate).await,
            Command::Export(path) => self.export_report(path).await,
            Command::Demo { reset } => self
                .client
                .seed_demo(reset, credential)
                .await
                .map(|summary| vec![cli::render_demo_seed(&summary)])
                .map_err(Into::into),
            Command::Help => Ok(HELP.lines().map(String::from).collect()),
            Command::Quit => Ok(vec![]),
        };

        match result {
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Err(e) => println!("error: {e}"),
        }
    }

    fn status(&self) -> Vec<String> {
        let view = self.intake.view();
        let mut lines = vec![
            format!("State: {}", view.state.name()),
            format!(
                "Turns: {} | team {} | role {}",
                view.session.transcript.len(),
                view.session.context.team,
                view.session.context.role
            ),
            format!(
                "Password: {}",
                if self.credentials.is_set() { "set" } else { "not set" }
            ),
        ];
        match &view.session.verdict {
            Some(verdict) => lines.extend(cli::render_verdict(verdict)),
            None => lines.push("No verdict yet.".to_string()),
        }
        lines
    }

    async fn edit_context(
        &self,
        key: &str,
        value: &str,
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let mut context = self.intake.view().session.context;
        context.set_field(key, value)?;
        self.intake.update_context(context).await?;
        Ok(vec![format!("Updated {key}.")])
    }

    fn report_options(
        &self,
        currency: Option<Currency>,
        rate: Option<u32>,
    ) -> ReportOptions {
        let mut options = ReportOptions::load(&self.store);
        if let Some(currency) = currency {
            options.currency = currency;
        }
        if let Some(rate) = rate {
            options.hourly_rate = rate;
        }
        options
    }

    async fn preview_report(
        &self,
        currency: Option<Currency>,
        rate: Option<u32>,
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let options = self.report_options(currency, rate);
        if let Err(e) = options.save(&self.store) {
            tracing::warn!(error = %e, "Failed to save report preferences");
        }

        let html = self
            .client
            .report_html(&options, self.credentials.current().as_ref())
            .await?;
        let preset = options
            .preset()
            .map_or_else(|| "custom".to_string(), |p| p.label().to_string());
        Ok(vec![
            format!(
                "Report: {} at {}/hour ({preset}), {} KB",
                options.currency,
                options.hourly_rate,
                html.len().div_ceil(1024)
            ),
            self.client.url(&options.html_path()),
        ])
    }

    async fn export_report(
        &self,
        path: Option<PathBuf>,
    ) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let options = self.report_options(None, None);
        let bytes = self
            .client
            .report_pdf(&options, self.credentials.current().as_ref())
            .await?;
        let path = path.unwrap_or_else(|| {
            PathBuf::from(export_file_name(chrono::Local::now().date_naive()))
        });
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Report exported");
        Ok(vec![format!("Saved {}", path.display())])
    }
}

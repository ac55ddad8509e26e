//! Terminal commands and rendering for `friction-intake`

use friction_finder::api::{
    DashboardMetrics, DemoSeedSummary, PainPointDetail, PainPointFilter, PainPointListItem,
};
use friction_finder::intake::{PainCategory, Role, Turn, Verdict};
use friction_finder::report::{parse_rate, Currency};
use std::path::PathBuf;
use thiserror::Error;

pub const HELP: &str = "\
Type a message to describe an operational pain point.
Commands:
  /commit                      analyze the conversation and add it to the report
  /new                         start a new session
  /status                      show state and last verdict
  /context key=value           set name, email, team, role, location or consent
  /login <password>            verify and remember the app password
  /logout                      forget the app password
  /dashboard                   show dashboard totals
  /pain-points [team=..] [category=..] [min=..]
  /pain-point <id>
  /report [currency] [rate]    preview the report (rate: number or preset id)
  /export [path]               download the report PDF
  /demo [reset]                seed demo interviews (reset wipes existing data)
  /quit";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Message(String),
    Commit,
    New,
    Status,
    Context { key: String, value: String },
    Login(String),
    Logout,
    Dashboard,
    PainPoints(PainPointFilter),
    PainPoint(i64),
    Report {
        currency: Option<Currency>,
        rate: Option<u32>,
    },
    Export(Option<PathBuf>),
    Demo { reset: bool },
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: /{0} (try /help)")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl Command {
    pub fn parse(line: &str) -> Result<Self, CommandError> {
        let Some(rest) = line.trim().strip_prefix('/') else {
            return Ok(Command::Message(line.to_string()));
        };

        let (name, args) = rest
            .split_once(char::is_whitespace)
            .map_or((rest, ""), |(n, a)| (n, a.trim()));

        match name {
            "commit" => Ok(Command::Commit),
            "new" => Ok(Command::New),
            "status" => Ok(Command::Status),
            "logout" => Ok(Command::Logout),
            "dashboard" => Ok(Command::Dashboard),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            "context" => {
                let (key, value) = args
                    .split_once('=')
                    .ok_or(CommandError::Usage("/context key=value"))?;
                Ok(Command::Context {
                    key: key.trim().to_string(),
                    value: value.trim().to_string(),
                })
            }
            "login" if !args.is_empty() => Ok(Command::Login(args.to_string())),
            "login" => Err(CommandError::Usage("/login <password>")),
            "pain-points" => parse_filter(args).map(Command::PainPoints),
            "pain-point" => args
                .parse()
                .map(Command::PainPoint)
                .map_err(|_| CommandError::Usage("/pain-point <id>")),
            "report" => {
                let mut currency = None;
                let mut rate = None;
                for arg in args.split_whitespace() {
                    match arg.parse::<Currency>() {
                        Ok(c) => currency = Some(c),
                        Err(_) => rate = Some(parse_rate(arg)),
                    }
                }
                Ok(Command::Report { currency, rate })
            }
            "export" => Ok(Command::Export(
                (!args.is_empty()).then(|| PathBuf::from(args)),
            )),
            "demo" => match args {
                "" => Ok(Command::Demo { reset: false }),
                "reset" => Ok(Command::Demo { reset: true }),
                _ => Err(CommandError::Usage("/demo [reset]")),
            },
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

const FILTER_USAGE: &str = "/pain-points [team=..] [category=..] [min=..]";

fn parse_filter(args: &str) -> Result<PainPointFilter, CommandError> {
    let mut filter = PainPointFilter::default();
    for arg in args.split_whitespace() {
        let (key, value) = arg.split_once('=').ok_or(CommandError::Usage(FILTER_USAGE))?;
        match key {
            "team" => filter.team = Some(value.to_string()),
            "category" => {
                filter.category =
                    Some(PainCategory::from_id(value).ok_or(CommandError::Usage(FILTER_USAGE))?);
            }
            "min" => {
                filter.priority_min =
                    Some(value.parse().map_err(|_| CommandError::Usage(FILTER_USAGE))?);
            }
            _ => return Err(CommandError::Usage(FILTER_USAGE)),
        }
    }
    Ok(filter)
}

pub fn render_turn(turn: &Turn) -> String {
    let who = match turn.role {
        Role::User => "you",
        Role::Assistant => "coo",
    };
    format!("{who}> {}", turn.content)
}

/// Status lines shown under the conversation
pub fn render_verdict(verdict: &Verdict) -> Vec<String> {
    let mut lines = vec![verdict.headline().to_string()];
    if let Some(root_cause) = verdict.root_cause_signal() {
        lines.push(format!("Root cause: {root_cause}"));
    }
    lines.push(format!(
        "Category: {} | est. {:.1} h/week",
        verdict.category, verdict.estimated_impact_hours_per_week
    ));
    if let Some(summary) = verdict.backlog_summary() {
        lines.push(summary);
    }
    lines
}

pub fn render_dashboard(metrics: &DashboardMetrics) -> Vec<String> {
    let mut lines = vec![format!(
        "{} pain points, {:.1} hours/week",
        metrics.total_pain_points, metrics.total_hours_per_week
    )];
    if !metrics.top_categories.is_empty() {
        let categories: Vec<String> = metrics
            .top_categories
            .iter()
            .map(|c| format!("{} ({})", c.category, c.count))
            .collect();
        lines.push(format!("Top categories: {}", categories.join(", ")));
    }
    for entry in &metrics.top_backlog {
        lines.push(format!(
            "  #{} {} [{}] priority {:.1}, {:.1} h/week",
            entry.pain_point_id,
            entry.title,
            entry.team,
            entry.priority_score,
            entry.impact_hours_per_week
        ));
    }
    if !metrics.quick_wins.is_empty() {
        lines.push("Quick wins:".to_string());
        for win in &metrics.quick_wins {
            lines.push(format!("  #{} {} [{}]", win.pain_point_id, win.title, win.team));
        }
    }
    lines
}

pub fn render_demo_seed(summary: &DemoSeedSummary) -> String {
    format!(
        "Seeded {} respondents, {} interviews, {} pain points.",
        summary.respondents, summary.interviews, summary.pain_points
    )
}

fn score(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

pub fn render_pain_points(items: &[PainPointListItem]) -> Vec<String> {
    if items.is_empty() {
        return vec!["No pain points match.".to_string()];
    }
    items
        .iter()
        .map(|item| {
            format!(
                "#{} {} [{} / {}] priority {}{}",
                item.id,
                item.title,
                item.team,
                item.category,
                score(item.priority_score),
                if item.quick_win { " (quick win)" } else { "" }
            )
        })
        .collect()
}

pub fn render_pain_point(detail: &PainPointDetail) -> Vec<String> {
    let mut lines = vec![
        format!("#{} {}", detail.id, detail.title),
        format!("{} / {} / {}", detail.team, detail.role, detail.category),
        detail.description.clone(),
        format!(
            "{:.1}x per week, {:.0} min each, {} people",
            detail.frequency_per_week, detail.minutes_per_occurrence, detail.people_affected
        ),
        format!(
            "Impact {} h/week | priority {}",
            score(detail.impact_hours_per_week),
            score(detail.priority_score)
        ),
    ];
    if !detail.systems_involved.is_empty() {
        lines.push(format!("Systems: {}", detail.systems_involved.join(", ")));
    }
    if let Some(solution) = &detail.suggested_solution {
        lines.push(format!("Suggested: {solution}"));
    }
    lines
}

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use apex_chat::render::{self, Body, Bubble, OfferCard};
use apex_chat::reply::ReplyGenerator;
use apex_chat::{Config, Conversation, Role};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;

mod app;
mod handler;
mod logging;
mod tui;
mod ui;

use app::App;
use tui::{AppEvent, EventHandler};

#[derive(Parser)]
#[command(name = "apex-gpt")]
#[command(about = "Chat with a demo AI travel-booking assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Simulated reply delay in milliseconds
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Make every reply fail, to see the error path
    #[arg(long, global = true)]
    fail: bool,

    /// JSON file with the flight offers to reply with
    #[arg(long, global = true)]
    offers: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat interface (default)
    Chat,
    /// Send one message and print the reply
    Ask {
        /// Your message
        message: String,
    },
    /// List the flight offers the assistant replies with
    Offers,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load().context("Failed to load config")?;
    if let Some(ms) = cli.delay_ms {
        config.reply_delay_ms = ms;
    }
    if cli.fail {
        config.failure_rate = 1.0;
    }
    if let Some(path) = cli.offers {
        config.offers_path = Some(path);
    }

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_chat(&config).await,
        Commands::Ask { message } => {
            logging::init_stderr()?;
            ask(&config, &message).await
        }
        Commands::Offers => {
            logging::init_stderr()?;
            list_offers(&config)
        }
    }
}

async fn run_chat(config: &Config) -> Result<()> {
    let (_log_guard, log_path) = logging::init_file()?;
    let generator: Arc<dyn ReplyGenerator> = Arc::new(config.reply_generator()?);
    info!(log = %log_path.display(), delay_ms = config.reply_delay_ms, "starting chat");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(tui::TICK_RATE);
    let mut app = App::new(generator);

    let result = event_loop(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    result
}

enum Step {
    Event(Option<AppEvent>),
    Reply(Result<apex_chat::Content, apex_chat::ReplyError>),
}

async fn event_loop(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    loop {
        app.sync();
        terminal.draw(|frame| ui::render(app, frame))?;

        if app.should_quit {
            return Ok(());
        }

        let step = tokio::select! {
            event = events.next() => Step::Event(event),
            outcome = app.next_reply() => Step::Reply(outcome),
        };

        match step {
            Step::Event(Some(event)) => handler::handle_event(app, event)?,
            Step::Event(None) => return Ok(()),
            Step::Reply(outcome) => app.finish_reply(outcome),
        }
    }
}

async fn ask(config: &Config, message: &str) -> Result<()> {
    let generator: Arc<dyn ReplyGenerator> = Arc::new(config.reply_generator()?);
    let mut conversation = Conversation::new();

    println!("{} {}", "You:".bold().cyan(), message.trim());
    println!("{}", "AI is thinking…".dimmed().italic());

    if conversation.send(generator, message).await.is_none() {
        println!("{}", "Nothing to send: the message is empty".red());
        return Ok(());
    }

    for m in conversation.messages().iter().filter(|m| m.role() == Role::Assistant) {
        print_bubble(&render::bubble(m));
    }
    Ok(())
}

fn list_offers(config: &Config) -> Result<()> {
    let offers = config.offers()?;
    println!("\n{}", "✈️  Configured flight offers".bold().blue());
    println!("{}", "=".repeat(40).dimmed());
    for offer in &offers.offers {
        print_card(&render::card(offer));
    }
    Ok(())
}

fn print_bubble(bubble: &Bubble) {
    println!("{}", "APEX-GPT:".bold().yellow());
    match &bubble.body {
        Body::Text(text) => println!("{text}"),
        Body::Offers { heading, cards } => {
            for line in heading {
                println!("{}", line.bold());
            }
            for card in cards {
                print_card(card);
            }
        }
    }
}

fn print_card(card: &OfferCard) {
    let edge = if card.is_sponsored() { "│".yellow() } else { "│".dimmed() };

    match card.badge {
        Some(badge) => println!("\n{} {}  {}", edge, card.title.bold(), badge.black().on_yellow()),
        None => println!("\n{} {}", edge, card.title.bold()),
    }
    if let Some(note) = card.note {
        println!("{} {}", edge, note.green());
    }
    for (label, value) in &card.details {
        println!("{} {} {}", edge, format!("{label}:").bold(), value);
    }
    println!("{} {}", edge, card.link.href.blue().underline());
}

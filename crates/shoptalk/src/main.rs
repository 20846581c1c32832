//! A terminal chat shell for the e-commerce assistant.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use shoptalk_core::{SessionBuilder, SessionEvent};
use shoptalk_groq_model::{GroqConfigBuilder, GroqProvider};
use tokio::io::{self, AsyncBufReadExt};

const BAR_CHAR: &str = "▎";
const GREETING: &str =
    "Hello! I'm your e-commerce assistant. How can I help you today?";

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let builder = match env::var("GROQ_API_KEY") {
        Ok(api_key) => {
            let mut config = GroqConfigBuilder::with_api_key(api_key);
            if let Ok(model) = env::var("GROQ_MODEL") {
                config = config.with_model(model);
            }
            if let Ok(base_url) = env::var("GROQ_BASE_URL") {
                config = config.with_base_url(base_url);
            }
            SessionBuilder::with_provider(GroqProvider::new(config.build()))
        }
        Err(_) => {
            eprintln!(
                "warning: GROQ_API_KEY is not set; replies will fail until \
                 it is configured"
            );
            SessionBuilder::unconfigured()
        }
    };

    // The accumulated reply text already on screen for the current turn.
    let rendered = Arc::new(Mutex::new(String::new()));
    let spinner = Arc::new(Mutex::new(None::<ProgressBar>));

    let mut session = builder
        .with_system_prompt(include_str!("./system_prompt.md"))
        .with_greeting(GREETING)
        .on_event({
            let rendered = Arc::clone(&rendered);
            let spinner = Arc::clone(&spinner);
            move |event| {
                let (SessionEvent::Partial(text)
                | SessionEvent::Finalized(text)) = event;
                if let Some(spinner) = spinner.lock().unwrap().take() {
                    spinner.finish_and_clear();
                    print!("{}🤖 ", BAR_CHAR.bright_cyan());
                }
                let out = next_output(&mut rendered.lock().unwrap(), &text);
                print!("{}", out.bright_white());
                std::io::stdout().flush().unwrap();
            }
        })
        .build();

    println!("{}", "E-commerce Assistant".bold());
    println!(
        "Ask me anything about our products, orders, or services! \
         Type /clear to start over."
    );
    println!();
    print_greeting();

    loop {
        print!("> ");
        std::io::stdout().flush().unwrap();

        let Some(line) = read_line().await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "/clear" {
            session.reset();
            println!();
            print_greeting();
            continue;
        }

        rendered.lock().unwrap().clear();
        *spinner.lock().unwrap() = Some(new_spinner());

        session.submit(line).await;

        println!();
        println!();
    }
}

/// Returns what to print for an event carrying the accumulated text
/// `text`, given what is already on screen, and records the new state.
///
/// Partial updates extend what is already rendered, so only the suffix
/// is printed. A finalized error reply after a mid-stream failure is
/// unrelated to the streamed partial; it goes on a fresh line instead.
fn next_output(rendered: &mut String, text: &str) -> String {
    let out = match text.strip_prefix(rendered.as_str()) {
        Some(suffix) => suffix.to_owned(),
        None => format!("\n{text}"),
    };
    *rendered = text.to_owned();
    out
}

fn print_greeting() {
    println!("{}🤖 {}", BAR_CHAR.bright_cyan(), GREETING.bright_white());
    println!();
}

fn new_spinner() -> ProgressBar {
    let style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(style);
    spinner.set_message("🤔 Thinking...");
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

async fn read_line() -> Option<String> {
    let mut stdin = io::BufReader::new(io::stdin());
    let mut line = String::new();

    match stdin.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

//! Terminal front end: one conversation view driven from stdin.

pub mod command;

use std::io::Write;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::models::{ContentType, Message, MessageRole};
use crate::routes::view_route::{Navigator, ViewRoute};
use crate::service::{ChatServices, ChatState, Outcome, Phase, SessionController};
use command::{Command, HELP};

#[derive(Debug, Parser)]
#[command(name = "entity-chat", version, about = "Talk to a topic's conversation backend")]
pub struct Args {
    /// Topic slug (`medusa`) or a full view address (`/medusa/<session-id>`)
    pub topic: String,

    /// Session to resume; overrides the locally cached one
    pub session_id: Option<String>,
}

impl Args {
    pub fn route(&self) -> Option<ViewRoute> {
        if self.topic.contains('/') {
            let mut route = ViewRoute::parse(&self.topic)?;
            if self.session_id.is_some() {
                route.session_id = self.session_id.clone();
            }
            Some(route)
        } else if self.topic.is_empty() {
            None
        } else {
            Some(ViewRoute::new(self.topic.clone(), self.session_id.clone()))
        }
    }
}

/// Keeps the address the controller asked for and any pending reload.
#[derive(Default)]
pub struct TerminalNavigator {
    address: Mutex<Option<ViewRoute>>,
    reload: Mutex<Option<ViewRoute>>,
}

impl TerminalNavigator {
    /// Latest address the view was moved to, if any.
    pub fn address(&self) -> Option<ViewRoute> {
        self.address.lock().ok().and_then(|slot| slot.clone())
    }

    pub fn take_reload(&self) -> Option<ViewRoute> {
        self.reload.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl Navigator for TerminalNavigator {
    fn replace(&self, route: &ViewRoute) {
        info!("Address replaced with {route}");
        if let Ok(mut slot) = self.address.lock() {
            *slot = Some(route.clone());
        }
    }

    fn reload(&self, route: &ViewRoute) {
        info!("Reload requested for {route}");
        if let Ok(mut slot) = self.reload.lock() {
            *slot = Some(route.clone());
        }
    }
}

fn render(message: &Message) -> String {
    let who = match message.role {
        MessageRole::User => "you",
        MessageRole::Assistant => "them",
    };
    match (message.content_type, &message.content, &message.media_url) {
        (ContentType::Text, Some(text), _) => format!("{who}> {text}"),
        (kind, _, Some(url)) => format!("{who}> [{kind}] {url}"),
        (kind, text, None) => format!("{who}> [{kind}] {}", text.as_deref().unwrap_or("")),
    }
}

fn print_header(state: &ChatState) {
    if let Some(topic) = &state.topic {
        match &topic.subtitle {
            Some(subtitle) => println!("── {} · {subtitle} ──", topic.name),
            None => println!("── {} ──", topic.name),
        }
    }
}

fn print_from(state: &ChatState, shown: &mut usize) {
    for message in state.messages.iter().skip(*shown) {
        println!("{}", render(message));
    }
    *shown = state.messages.len();
}

/// Runs views until the user quits. A wipe remounts a fresh view at the
/// topic's base address, the way a browser reload would.
pub async fn run(
    services: ChatServices,
    navigator: Arc<TerminalNavigator>,
    mut route: ViewRoute,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let controller = SessionController::new(services.clone(), route.clone());
        controller.initialize().await;
        let state = controller.snapshot();
        if state.phase == Phase::Errored {
            if let Some(error) = state.error {
                eprintln!("{error}");
            }
            return Ok(());
        }

        print_header(&state);
        if let Some(address) = navigator.address() {
            println!("(resume later with: entity-chat {address})");
        }
        let mut shown = 0;
        print_from(&state, &mut shown);

        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };

            let outcome = match Command::parse(&line) {
                Command::Quit => return Ok(()),
                Command::Help => {
                    println!("{HELP}");
                    continue;
                }
                Command::Invalid(reason) => {
                    eprintln!("{reason}");
                    continue;
                }
                Command::Text(text) => controller.send_text(&text).await,
                Command::Image(path) => match tokio::fs::read(&path).await {
                    Ok(bytes) => controller.send_image(bytes).await,
                    Err(e) => {
                        warn!("Cannot read {}: {e}", path.display());
                        eprintln!("cannot read {}", path.display());
                        continue;
                    }
                },
                Command::Voice(path) => match tokio::fs::read(&path).await {
                    Ok(bytes) => controller.send_voice(bytes).await,
                    Err(e) => {
                        warn!("Cannot read {}: {e}", path.display());
                        eprintln!("cannot read {}", path.display());
                        continue;
                    }
                },
                Command::Reset => {
                    let outcome = controller.reset().await;
                    if outcome == Outcome::Done {
                        shown = 0;
                    }
                    outcome
                }
                Command::Wipe => controller.wipe().await,
            };

            let state = controller.snapshot();
            if outcome == Outcome::Failed {
                if let Some(error) = state.error {
                    eprintln!("{error}");
                }
            }
            print_from(&state, &mut shown);

            if let Some(next) = navigator.take_reload() {
                route = next;
                break;
            }
        }
    }
}

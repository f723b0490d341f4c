//! Runtime driver for the search console.
//!
//! `SearchConsole` feeds messages into [`AppState::update`] and carries out
//! the returned commands: fetches run as tokio tasks whose completions come
//! back through a channel, and starting a fetch aborts the previous one.

use anyhow::{Context, Result};
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

use crate::config::ConsoleConfig;

pub mod application;
pub mod domain;
pub mod state;

use self::application::backend::BackendClient;
use self::state::app_state::AppState;
use self::state::commands::{Command, FetchPlan};
use self::state::events::Message;

pub struct SearchConsole {
    state: AppState,
    client: Arc<BackendClient>,
    console_url: Url,
    sender: UnboundedSender<Message>,
    receiver: UnboundedReceiver<Message>,
    in_flight: Option<(u64, JoinHandle<()>)>,
    opened: Vec<Url>,
}

impl SearchConsole {
    pub fn new(config: &ConsoleConfig, state: AppState) -> Result<Self> {
        let console_url = Url::parse(&config.console_url)
            .with_context(|| format!("Invalid console URL: {}", config.console_url))?;
        let client = BackendClient::new(&config.api_base_url, config.request_timeout_secs);
        let (sender, receiver) = mpsc::unbounded_channel();

        Ok(Self {
            state,
            client: Arc::new(client),
            console_url,
            sender,
            receiver,
            in_flight: None,
            opened: Vec::new(),
        })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Applies one message. Must be called inside a tokio runtime.
    pub fn dispatch(&mut self, message: Message) {
        let command = self.state.update(message);
        self.execute_command(command);
    }

    /// Waits for the next completion and applies it. Returns `false` when
    /// nothing is in flight.
    pub async fn next_completion(&mut self) -> bool {
        if self.in_flight.is_none() {
            return false;
        }
        match self.receiver.recv().await {
            Some(message) => {
                if let Message::SearchCompleted { id, .. } = &message {
                    if self.in_flight.as_ref().is_some_and(|(current, _)| current == id) {
                        self.in_flight = None;
                    }
                }
                self.dispatch(message);
                true
            }
            None => false,
        }
    }

    /// Runs until the current search has settled.
    pub async fn settle(&mut self) {
        while self.state.results.loading {
            if !self.next_completion().await {
                break;
            }
        }
    }

    /// URLs opened in new browsing contexts since the last call.
    pub fn take_opened(&mut self) -> Vec<Url> {
        std::mem::take(&mut self.opened)
    }

    fn execute_command(&mut self, command: Command) {
        match command {
            Command::None => {}
            Command::Fetch(plan) => {
                self.abort_in_flight();
                self.spawn_fetch(plan);
            }
            Command::Cancel => self.abort_in_flight(),
            Command::PushUrl(params) => self.dispatch(Message::UrlChanged(params)),
            Command::OpenNavigation(params) => {
                let url = params.apply_to(&self.console_url);
                tracing::info!(event = "console.navigation_opened", url = %url, "opened in new context");
                self.opened.push(url);
            }
        }
    }

    fn spawn_fetch(&mut self, plan: FetchPlan) {
        let client = Arc::clone(&self.client);
        let sender = self.sender.clone();
        let FetchPlan { id, call } = plan;

        let handle = tokio::spawn(async move {
            let outcome = client.execute(&call).await;
            // The receiver lives as long as the console.
            let _ = sender.send(Message::SearchCompleted { id, outcome });
        });
        self.in_flight = Some((id, handle));
    }

    fn abort_in_flight(&mut self) {
        if let Some((id, handle)) = self.in_flight.take() {
            if !handle.is_finished() {
                tracing::debug!(event = "search.aborted", id, "aborting superseded request");
            }
            handle.abort();
        }
    }
}

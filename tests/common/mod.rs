//! Shared fixtures for integration tests

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use finch_bot::{
    Bot, BotError, BotInfo, Command, CommandBase, CommandError, CommandRegistry, CommandState,
    ConfigStore, Finch, Help, Message, OutgoingMessage, Update, User,
};

pub const BOT_USERNAME: &str = "finch_test_bot";

/// Bot that keeps every message it is asked to send
#[derive(Default)]
pub struct RecordingBot {
    sent: Mutex<Vec<OutgoingMessage>>,
}

impl RecordingBot {
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }
}

#[async_trait]
impl Bot for RecordingBot {
    async fn send_message(&self, message: OutgoingMessage) -> Result<i64, BotError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push(message);
        Ok(sent.len() as i64)
    }

    fn bot_info(&self) -> BotInfo {
        BotInfo {
            id: 99,
            name: "Finch".to_string(),
            username: BOT_USERNAME.to_string(),
        }
    }
}

/// Shared, ordered log of command invocations
pub type Calls = Arc<Mutex<Vec<String>>>;

pub fn calls() -> Calls {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn taken(calls: &Calls) -> Vec<String> {
    std::mem::take(&mut *calls.lock().unwrap())
}

/// What a scripted command does when `run` fires
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum OnRun {
    Nothing,
    /// Start waiting; clear the flag in `run_as_reply`
    AwaitReply,
    /// Start waiting; never clear it
    AwaitReplyForever,
    Fail,
    Panic,
}

/// Command that logs `name:run:text` / `name:reply:text`
pub struct Scripted {
    base: CommandBase,
    name: String,
    trigger: Option<String>,
    on_run: OnRun,
    fail_init: bool,
    calls: Calls,
    predicate_checks: Arc<AtomicUsize>,
}

impl Scripted {
    /// Fires on `/trigger`; `None` fires on everything
    pub fn new(name: &str, trigger: Option<&str>, calls: &Calls) -> Self {
        Self {
            base: CommandBase::new(),
            name: name.to_string(),
            trigger: trigger.map(str::to_string),
            on_run: OnRun::Nothing,
            fail_init: false,
            calls: calls.clone(),
            predicate_checks: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn on_run(mut self, on_run: OnRun) -> Self {
        self.on_run = on_run;
        self
    }

    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn predicate_checks(&self) -> Arc<AtomicUsize> {
        self.predicate_checks.clone()
    }

    fn log(&self, kind: &str, message: &Message) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}:{}", self.name, kind, message.text));
    }
}

#[async_trait]
impl Command for Scripted {
    fn help(&self) -> Help {
        Help::new(self.name.clone())
            .with_description(format!("{} test command", self.name))
            .with_example(format!("/{}", self.name))
    }

    async fn init(&self, state: Arc<CommandState>, finch: &Finch) -> Result<(), CommandError> {
        self.base.init(state, finch)?;
        if self.fail_init {
            return Err(CommandError::ExecutionFailed("cannot load".to_string()));
        }
        Ok(())
    }

    fn should_run(&self, message: &Message) -> bool {
        self.predicate_checks.fetch_add(1, Ordering::SeqCst);
        match &self.trigger {
            Some(trigger) => self.base.is_command(trigger, message),
            None => true,
        }
    }

    async fn run(&self, _finch: &Finch, message: &Message) -> Result<(), CommandError> {
        self.log("run", message);
        match self.on_run {
            OnRun::Nothing => Ok(()),
            OnRun::AwaitReply | OnRun::AwaitReplyForever => {
                self.base.wait_for_reply();
                Ok(())
            }
            OnRun::Fail => Err(CommandError::ExecutionFailed("boom".to_string())),
            OnRun::Panic => panic!("{} exploded", self.name),
        }
    }

    async fn run_as_reply(&self, _finch: &Finch, message: &Message) -> Result<(), CommandError> {
        self.log("reply", message);
        if self.on_run == OnRun::AwaitReply {
            self.base.reply_received();
        }
        Ok(())
    }
}

/// Bot instance over a fresh temp store, with commands already initialized
pub async fn start(registry: CommandRegistry, dir: &TempDir) -> (Arc<Finch>, Arc<RecordingBot>) {
    let bot = Arc::new(RecordingBot::default());
    let config = ConfigStore::load(dir.path().join("config.json")).await;
    let finch = Arc::new(Finch::new(bot.clone(), config, registry));
    finch.init_commands().await;
    (finch, bot)
}

pub fn user(name: &str) -> User {
    User::new(name.len() as i64).with_username(name)
}

pub fn update(id: i64, sender: &str, text: &str) -> Update {
    let message = Message::new(100, user(sender), text).with_id(id);
    Update::new(id, message)
}

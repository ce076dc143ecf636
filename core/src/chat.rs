use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use prospector_backend_client::ApiError;
use prospector_backend_client::ChatRequest;
use tokio::sync::watch;
use uuid::Uuid;

use crate::api::ProspectorApi;
use crate::filters::FilterBoard;
use crate::payload::IcpPayload;
use crate::records::to_text;
use crate::search_sync::SearchSync;

pub const CHAT_FAILED: &str = "Chat failed";
pub const GREETING: &str =
    "Welcome! Add filters or tell me your target ICP here and I'll populate results live.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
}

/// Append-only transcript plus the backend's conversation id, once known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    id: Option<String>,
    messages: Vec<Message>,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    /// A new conversation opens with the assistant's greeting.
    pub fn new() -> Self {
        let mut conversation = Self {
            id: None,
            messages: Vec::new(),
        };
        conversation.push(Sender::Bot, GREETING);
        conversation
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    fn push(&mut self, sender: Sender, text: impl Into<String>) {
        self.messages.push(Message {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
        });
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant replied.
    Sent,
    /// The exchange failed; the failure was appended as a bot message.
    Failed,
    /// Nothing to send.
    Blank,
    /// Another send is still outstanding.
    Busy,
}

/// Drives the chat pane: posts prompts, records replies and feeds any
/// targeting criteria in a reply into the filters and the result set.
pub struct ChatOrchestrator {
    api: Arc<dyn ProspectorApi>,
    filters: Arc<FilterBoard>,
    search: Arc<SearchSync>,
    conversation: watch::Sender<Conversation>,
    sending: AtomicBool,
}

impl ChatOrchestrator {
    pub fn new(
        api: Arc<dyn ProspectorApi>,
        filters: Arc<FilterBoard>,
        search: Arc<SearchSync>,
    ) -> Self {
        let (conversation, _) = watch::channel(Conversation::new());
        Self {
            api,
            filters,
            search,
            conversation,
            sending: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Conversation> {
        self.conversation.subscribe()
    }

    pub fn conversation(&self) -> Conversation {
        self.conversation.borrow().clone()
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// Sends `prompt`. Errors never escape: a failed exchange is reported in
    /// the transcript.
    pub async fn send(&self, prompt: &str) -> SendOutcome {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return SendOutcome::Blank;
        }
        let Some(_sending) = SendingGuard::acquire(&self.sending) else {
            tracing::debug!("chat send rejected while another is outstanding");
            return SendOutcome::Busy;
        };

        self.append(Sender::User, prompt);
        match self.exchange(prompt).await {
            Ok(()) => SendOutcome::Sent,
            Err(err) => {
                tracing::warn!("chat exchange failed: {err}");
                self.append(Sender::Bot, err.user_message(CHAT_FAILED));
                SendOutcome::Failed
            }
        }
    }

    async fn exchange(&self, prompt: &str) -> Result<(), ApiError> {
        let request = ChatRequest {
            prompt: prompt.to_string(),
            conversation_id: self.conversation.borrow().id.clone(),
        };
        let response = self.api.chat(&request).await?;

        let reply = to_text(&response.reply);
        self.conversation.send_modify(|conversation| {
            if let Some(id) = &response.conversation_id {
                conversation.id = Some(id.clone());
            }
            conversation.push(Sender::Bot, reply.as_str());
        });

        if let Some(results) = response.inline_results() {
            self.search.replace_results(results);
        }

        if let Some(payload) = IcpPayload::extract(&reply) {
            self.filters.merge_payload(&payload);
            if response.results.is_none() {
                let limit = self.filters.canonical().limit;
                self.search.search_body(&payload.search_body(limit)).await?;
            }
        }
        Ok(())
    }

    fn append(&self, sender: Sender, text: impl Into<String>) {
        let text = text.into();
        self.conversation
            .send_modify(|conversation| conversation.push(sender, text));
    }
}

struct SendingGuard<'a>(&'a AtomicBool);

impl<'a> SendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

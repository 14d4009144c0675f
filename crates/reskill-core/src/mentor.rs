//! AI career mentor chat.
//!
//! The transcript lives only in memory. Each turn sends the whole
//! conversation, flattened into `Pessoa:` / `Mentor:` lines, as one prompt.

use std::fmt;

use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::genai::Generator;

pub const WELCOME_MESSAGE: &str = "Oi! Sou seu mentor de carreira com IA. Me conta seu objetivo e quanto tempo você tem por semana para estudar 🤝";
pub const APOLOGY_MESSAGE: &str =
    "Tive um problema para responder agora. Tenta de novo em alguns instantes 🙏";

const WELCOME_ID: &str = "welcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Ai,
}

impl Role {
    /// Speaker label used in the prompt transcript.
    fn speaker(self) -> &'static str {
        match self {
            Self::User => "Pessoa",
            Self::Ai => "Mentor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::User => "user",
            Self::Ai => "ai",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub text: String,
}

impl ChatMessage {
    fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            text: text.into(),
        }
    }
}

/// Flatten a transcript into the mentor prompt.
pub fn build_mentor_prompt(messages: &[ChatMessage]) -> String {
    let transcript = messages
        .iter()
        .map(|m| format!("{}: {}", m.role.speaker(), m.text))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Você é um mentor de carreira focado em requalificação profissional.\n\
         Responda em tom humano, amigável e prático. Use parágrafos curtos.\n\n\
         Conversa até agora:\n\
         {transcript}\n\n\
         Responda apenas a próxima mensagem da pessoa."
    )
}

/// One chat session with the mentor.
#[derive(Debug, Clone)]
pub struct MentorChat {
    messages: Vec<ChatMessage>,
    sending: bool,
}

impl Default for MentorChat {
    fn default() -> Self {
        Self::new()
    }
}

impl MentorChat {
    /// A chat opened by the mentor's welcome message.
    pub fn new() -> Self {
        Self {
            messages: vec![ChatMessage {
                id: WELCOME_ID.to_string(),
                role: Role::Ai,
                text: WELCOME_MESSAGE.to_string(),
            }],
            sending: false,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_sending(&self) -> bool {
        self.sending
    }

    /// Send one user message and append the mentor's reply.
    ///
    /// Blank input (or a send already underway) does nothing and returns
    /// `None`. A failed request appends an apology instead of a reply.
    pub async fn send(&mut self, generator: &dyn Generator, input: &str) -> Option<&ChatMessage> {
        let text = input.trim();
        if text.is_empty() || self.sending {
            return None;
        }

        self.messages.push(ChatMessage::new(Role::User, text));
        self.sending = true;
        let prompt = build_mentor_prompt(&self.messages);
        let reply = match generator.generate(&prompt).await {
            Ok(reply) => ChatMessage::new(Role::Ai, reply.trim()),
            Err(e) => {
                warn!(error = %e, "mentor reply failed");
                ChatMessage::new(Role::Ai, APOLOGY_MESSAGE)
            }
        };
        self.sending = false;

        self.messages.push(reply);
        self.messages.last()
    }
}

use serde::Serialize;
use uuid::Uuid;

use crate::ai::Content;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

/// One transcript entry, shaped the way the client renders it.
#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: ChatRole::Model,
            text: text.into(),
        }
    }
}

/// One user's live assistant conversation. The stored instruction decides
/// staleness: when profile or plan edits change the rebuilt instruction,
/// the session no longer matches and gets replaced.
#[derive(Debug, Clone)]
pub struct ChatSession {
    system_instruction: String,
    messages: Vec<ChatMessage>,
}

impl ChatSession {
    pub fn new(system_instruction: String) -> Self {
        Self {
            system_instruction,
            messages: Vec::new(),
        }
    }

    pub fn is_stale(&self, current_instruction: &str) -> bool {
        self.system_instruction != current_instruction
    }

    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The transcript as generation contents, oldest first.
    pub fn contents(&self) -> Vec<Content> {
        self.messages
            .iter()
            .map(|m| match m.role {
                ChatRole::User => Content::user_text(m.text.clone()),
                ChatRole::Model => Content::model_text(m.text.clone()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::Role;

    #[test]
    fn session_goes_stale_when_the_instruction_changes() {
        let session = ChatSession::new("perfil A".into());
        assert!(!session.is_stale("perfil A"));
        assert!(session.is_stale("perfil B"));
    }

    #[test]
    fn contents_mirror_the_transcript_in_order() {
        let mut session = ChatSession::new("instr".into());
        session.push(ChatMessage::user("Olá"));
        session.push(ChatMessage::model("Olá! Como posso ajudar?"));
        session.push(ChatMessage::user("Que almoço sugeres?"));

        let contents = session.contents();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0].role, Role::User);
        assert_eq!(contents[1].role, Role::Model);
        assert_eq!(contents[2].role, Role::User);
    }

    #[test]
    fn messages_serialize_with_lowercase_roles() {
        let msg = ChatMessage::model("Bom dia!");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["role"], "model");
        assert_eq!(json["text"], "Bom dia!");
        assert!(json["id"].is_string());
    }
}

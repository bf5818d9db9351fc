//! Transcript types shared by the session store and the completion gateway

/// Message role within a transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One role-tagged message unit. Immutable once appended; the ordered
/// sequence of turns is replayed in full as the model's context on every
/// request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    #[allow(dead_code)] // Constructor for API completeness
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    #[allow(dead_code)] // Constructor for API completeness
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

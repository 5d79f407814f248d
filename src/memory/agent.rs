//! 各阶段对话记忆
//!
//! 按 AgentIdentity（会话 id + 阶段角色）保存追加式消息日志；存储不设上限，
//! 读取时按窗口截取最近 N 条拼入阶段上下文。

use std::collections::HashMap;
use std::fmt;

use crate::memory::{Message, Role};
use crate::stage::StageRole;

/// 阶段记忆的键：会话 id + 角色，避免裸字符串键冲突
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AgentIdentity {
    pub session: String,
    pub role: StageRole,
}

impl AgentIdentity {
    pub fn new(session: impl Into<String>, role: StageRole) -> Self {
        Self {
            session: session.into(),
            role,
        }
    }
}

impl fmt::Display for AgentIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.session, self.role)
    }
}

/// 阶段记忆存储：身份 → 追加式消息日志，首次 append 时惰性创建
#[derive(Debug, Default)]
pub struct AgentMemoryStore {
    memories: HashMap<AgentIdentity, Vec<Message>>,
}

impl AgentMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定身份的完整历史；未写入过时返回空切片
    pub fn history(&self, id: &AgentIdentity) -> &[Message] {
        self.memories.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn append(&mut self, id: &AgentIdentity, role: Role, content: impl Into<String>) {
        let msg = Message {
            role,
            content: content.into(),
        };
        self.memories.entry(id.clone()).or_default().push(msg);
    }

    /// 最近 max_count 条（历史更短时全量返回），窗口内保持最旧在前
    pub fn recent_window(&self, id: &AgentIdentity, max_count: usize) -> &[Message] {
        let history = self.history(id);
        let start = history.len().saturating_sub(max_count);
        &history[start..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> AgentIdentity {
        AgentIdentity::new("s1", StageRole::Planner)
    }

    #[test]
    fn window_never_exceeds_max() {
        let mut store = AgentMemoryStore::new();
        for i in 0..7 {
            store.append(&id(), Role::User, format!("msg {}", i));
        }
        let window = store.recent_window(&id(), 3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].content, "msg 4");
        assert_eq!(window[2].content, "msg 6");
    }

    #[test]
    fn window_returns_all_when_history_is_short() {
        let mut store = AgentMemoryStore::new();
        store.append(&id(), Role::User, "a");
        store.append(&id(), Role::Assistant, "b");
        let window = store.recent_window(&id(), 10);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].content, "a");
    }

    #[test]
    fn unknown_identity_is_empty() {
        let store = AgentMemoryStore::new();
        assert!(store.history(&id()).is_empty());
        assert!(store.recent_window(&id(), 5).is_empty());
    }

    #[test]
    fn identities_do_not_collide_across_roles() {
        let mut store = AgentMemoryStore::new();
        let planner = AgentIdentity::new("s1", StageRole::Planner);
        let researcher = AgentIdentity::new("s1", StageRole::Researcher);
        store.append(&planner, Role::User, "plan this");
        assert!(store.history(&researcher).is_empty());
        assert_eq!(store.history(&planner).len(), 1);
    }

    #[test]
    fn identity_renders_session_and_role() {
        assert_eq!(id().to_string(), "s1-planner");
    }
}

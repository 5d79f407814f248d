//! 会话状态
//!
//! 每个会话恰好一个 SessionState，单写者访问：闲聊历史（追加，仅显式 clear 时清空）
//! 与至多一个待恢复任务。

use crate::memory::Message;

/// 被暂停、等待用户补充信息的任务
#[derive(Clone, Debug)]
pub struct PendingTask {
    pub original_query: String,
}

/// 轻量的会话级状态
#[derive(Debug, Default)]
pub struct SessionState {
    pub chat_history: Vec<Message>,
    pub pending_task: Option<PendingTask>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记下待恢复任务；同一时刻至多一个，后设的覆盖先前的
    pub fn set_pending(&mut self, original_query: impl Into<String>) {
        self.pending_task = Some(PendingTask {
            original_query: original_query.into(),
        });
    }

    /// 取走待恢复任务（恢复流程要求在重新分发前清除，避免无限恢复循环）
    pub fn take_pending(&mut self) -> Option<PendingTask> {
        self.pending_task.take()
    }

    /// 闲聊历史的最近 n 条
    pub fn recent_chat(&self, n: usize) -> &[Message] {
        let start = self.chat_history.len().saturating_sub(n);
        &self.chat_history[start..]
    }

    /// 显式重置：清空历史与待恢复任务
    pub fn clear(&mut self) {
        self.chat_history.clear();
        self.pending_task = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_most_one_pending_task() {
        let mut s = SessionState::new();
        s.set_pending("first");
        s.set_pending("second");
        assert_eq!(s.take_pending().unwrap().original_query, "second");
        assert!(s.pending_task.is_none());
    }

    #[test]
    fn clear_resets_everything() {
        let mut s = SessionState::new();
        s.chat_history.push(Message::user("hi"));
        s.set_pending("task");
        s.clear();
        assert!(s.chat_history.is_empty());
        assert!(s.pending_task.is_none());
    }

    #[test]
    fn recent_chat_window() {
        let mut s = SessionState::new();
        for i in 0..12 {
            s.chat_history.push(Message::user(format!("m{}", i)));
        }
        let recent = s.recent_chat(10);
        assert_eq!(recent.len(), 10);
        assert_eq!(recent[0].content, "m2");
    }
}

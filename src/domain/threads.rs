use crate::domain::{ChatMessage, Role};

/// Appended as the assistant reply when the chat call fails in any way
/// (transport error, non-success status, malformed body). The thread stays
/// usable afterwards.
pub const REPLY_FAILURE_TEXT: &str =
    "Sorry, I couldn't get a response right now. Please try again in a moment.";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChatThread {
    pub id: u64,
    pub name: String,
    pub messages: Vec<ChatMessage>,
    /// A reply request is outstanding; further sends on this thread are
    /// rejected until it settles.
    pub awaiting_reply: bool,
}

impl ChatThread {
    fn new(id: u64) -> Self {
        Self {
            id,
            name: format!("Session {id}"),
            messages: Vec::new(),
            awaiting_reply: false,
        }
    }
}

/// All chat threads of the current process, in memory only. Exactly one
/// thread is active at a time; threads are never deleted and never persisted.
#[derive(Clone, Debug)]
pub struct ThreadSet {
    threads: Vec<ChatThread>,
    active_id: u64,
    next_id: u64,
}

impl ThreadSet {
    pub fn new() -> Self {
        Self {
            threads: vec![ChatThread::new(1)],
            active_id: 1,
            next_id: 2,
        }
    }

    pub fn threads(&self) -> &[ChatThread] {
        &self.threads
    }

    pub fn active_id(&self) -> u64 {
        self.active_id
    }

    pub fn active(&self) -> &ChatThread {
        self.threads
            .iter()
            .find(|thread| thread.id == self.active_id)
            .unwrap_or(&self.threads[0])
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut ChatThread> {
        self.threads.iter_mut().find(|thread| thread.id == id)
    }

    /// Allocates the next sequential id, an auto-generated label and an empty
    /// message list, and makes the new thread active.
    pub fn create_thread(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.threads.push(ChatThread::new(id));
        self.active_id = id;
        id
    }

    /// Switches the active thread. Unknown ids are ignored.
    pub fn switch_to(&mut self, id: u64) {
        if self.threads.iter().any(|thread| thread.id == id) {
            self.active_id = id;
        }
    }

    pub fn switch_relative(&mut self, delta: isize) {
        let Some(pos) = self
            .threads
            .iter()
            .position(|thread| thread.id == self.active_id)
        else {
            return;
        };
        let len = self.threads.len() as isize;
        let next = (pos as isize + delta).rem_euclid(len) as usize;
        self.active_id = self.threads[next].id;
    }

    pub fn append_user(&mut self, thread_id: u64, text: String) {
        if let Some(thread) = self.get_mut(thread_id) {
            thread.messages.push(ChatMessage {
                role: Role::User,
                text,
            });
            thread.awaiting_reply = true;
        }
    }

    /// Settles an outstanding reply: the parsed response on success, the
    /// fixed failure text otherwise.
    pub fn append_reply(&mut self, thread_id: u64, result: Result<String, String>) {
        if let Some(thread) = self.get_mut(thread_id) {
            let text = match result {
                Ok(reply) => reply,
                Err(_) => REPLY_FAILURE_TEXT.to_string(),
            };
            thread.messages.push(ChatMessage {
                role: Role::Assistant,
                text,
            });
            thread.awaiting_reply = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_thread_gets_fresh_id_and_empty_messages() {
        let mut set = ThreadSet::new();
        set.append_user(1, "hello".to_string());

        let id = set.create_thread();
        assert_eq!(id, 2);
        assert_eq!(set.active_id(), 2);
        assert!(set.active().messages.is_empty());

        let id = set.create_thread();
        assert_eq!(id, 3);
    }

    #[test]
    fn switching_threads_never_mixes_messages() {
        let mut set = ThreadSet::new();
        set.append_user(1, "first thread".to_string());
        let second = set.create_thread();
        set.append_user(second, "second thread".to_string());

        set.switch_to(1);
        assert_eq!(set.active().messages.len(), 1);
        assert_eq!(set.active().messages[0].text, "first thread");

        set.switch_to(second);
        assert_eq!(set.active().messages[0].text, "second thread");
    }

    #[test]
    fn switch_to_unknown_id_is_ignored() {
        let mut set = ThreadSet::new();
        set.switch_to(99);
        assert_eq!(set.active_id(), 1);
    }

    #[test]
    fn reply_failure_appends_exactly_one_fixed_message() {
        let mut set = ThreadSet::new();
        set.append_user(1, "are you there?".to_string());
        assert!(set.active().awaiting_reply);

        set.append_reply(1, Err("connection refused".to_string()));

        let messages = &set.active().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].text, "are you there?");
        assert_eq!(messages[1].role, Role::Assistant);
        assert_eq!(messages[1].text, REPLY_FAILURE_TEXT);
        assert!(!set.active().awaiting_reply);
    }

    #[test]
    fn successful_reply_appends_response_text() {
        let mut set = ThreadSet::new();
        set.append_user(1, "hi".to_string());
        set.append_reply(1, Ok("hello there".to_string()));
        assert_eq!(set.active().messages[1].text, "hello there");
    }

    #[test]
    fn switch_relative_wraps_around() {
        let mut set = ThreadSet::new();
        set.create_thread();
        set.create_thread();
        assert_eq!(set.active_id(), 3);
        set.switch_relative(1);
        assert_eq!(set.active_id(), 1);
        set.switch_relative(-1);
        assert_eq!(set.active_id(), 3);
    }
}

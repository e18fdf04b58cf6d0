//! Parent/child index over the messages of one session.

use std::collections::{HashMap, HashSet};

use snafu::{OptionExt, ensure};

use super::error::{
    ConversationResult, DanglingParentSnafu, DuplicateMessageSnafu, ParentCycleSnafu,
    SessionMismatchSnafu, UnknownMessageSnafu,
};
use super::ids::{MessageId, SessionId};
use super::message::Message;

pub struct ConversationTree<'a> {
    session_id: SessionId,
    messages: HashMap<MessageId, &'a Message>,
    children: HashMap<MessageId, Vec<MessageId>>,
    roots: Vec<MessageId>,
}

impl<'a> ConversationTree<'a> {
    /// Indexes `messages`, which must all belong to `session_id`, carry distinct
    /// ids and only point at parents inside the same slice.
    pub fn build(session_id: SessionId, messages: &'a [Message]) -> ConversationResult<Self> {
        let mut by_id = HashMap::with_capacity(messages.len());
        for message in messages {
            ensure!(
                message.session_id == session_id,
                SessionMismatchSnafu {
                    stage: "conversation-build-session",
                    id: message.id,
                    expected: session_id,
                    found: message.session_id,
                }
            );
            ensure!(
                by_id.insert(message.id, message).is_none(),
                DuplicateMessageSnafu {
                    stage: "conversation-build-unique",
                    id: message.id,
                }
            );
        }

        let mut ordered = messages.iter().collect::<Vec<_>>();
        ordered.sort_by_key(|message| (message.created_at_unix_seconds, message.id));

        let mut children: HashMap<MessageId, Vec<MessageId>> = HashMap::new();
        let mut roots = Vec::new();
        for message in ordered {
            match message.parent_id {
                Some(parent_id) => {
                    ensure!(
                        by_id.contains_key(&parent_id),
                        DanglingParentSnafu {
                            stage: "conversation-build-parent",
                            id: message.id,
                            parent_id,
                        }
                    );
                    children.entry(parent_id).or_default().push(message.id);
                }
                None => roots.push(message.id),
            }
        }

        Ok(Self {
            session_id,
            messages: by_id,
            children,
            roots,
        })
    }

    pub fn session_id(&self) -> SessionId {
        self.session_id
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn get(&self, id: MessageId) -> Option<&'a Message> {
        self.messages.get(&id).copied()
    }

    /// Messages without a parent, oldest first.
    pub fn roots(&self) -> &[MessageId] {
        &self.roots
    }

    /// Direct replies to `id`, oldest first.
    pub fn children(&self, id: MessageId) -> ConversationResult<&[MessageId]> {
        self.require(id, "conversation-children")?;
        Ok(self.children.get(&id).map(Vec::as_slice).unwrap_or_default())
    }

    /// `id` followed by every descendant in pre-order; the set a cascading
    /// delete of `id` removes.
    pub fn subtree(&self, id: MessageId) -> ConversationResult<Vec<MessageId>> {
        self.require(id, "conversation-subtree")?;

        let mut visited = HashSet::new();
        let mut ordered = Vec::new();
        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            ensure!(
                visited.insert(current),
                ParentCycleSnafu {
                    stage: "conversation-subtree-walk",
                    id,
                    hops: ordered.len(),
                }
            );
            ordered.push(current);
            if let Some(children) = self.children.get(&current) {
                pending.extend(children.iter().rev().copied());
            }
        }
        Ok(ordered)
    }

    /// Parent chain of `id`, nearest first.
    pub fn ancestors(&self, id: MessageId) -> ConversationResult<Vec<MessageId>> {
        let mut current = self.require(id, "conversation-ancestors")?;
        let mut chain = Vec::new();

        // A chain longer than the conversation can only come from a cycle.
        while let Some(parent_id) = current.parent_id {
            ensure!(
                chain.len() < self.messages.len(),
                ParentCycleSnafu {
                    stage: "conversation-ancestors-walk",
                    id,
                    hops: chain.len(),
                }
            );
            chain.push(parent_id);
            current = self.require(parent_id, "conversation-ancestors-parent")?;
        }
        Ok(chain)
    }

    pub fn depth(&self, id: MessageId) -> ConversationResult<usize> {
        self.ancestors(id).map(|chain| chain.len())
    }

    fn require(&self, id: MessageId, stage: &'static str) -> ConversationResult<&'a Message> {
        self.get(id).context(UnknownMessageSnafu { stage, id })
    }
}

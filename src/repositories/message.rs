//! MessageRepository - Repository per la sub-collection messaggi di ogni conversazione

use super::{Create, DocumentStore, Read, StoreError, Update};
use crate::dtos::{CreateMessageDTO, MessageCursor, UpdateMessageDTO};
use crate::entities::Message;
use crate::live::feed::ChangeEvent;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// MESSAGE REPO
#[derive(Clone)]
pub struct MessageRepository {
    store: Arc<DocumentStore>,
}

impl MessageRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Get the most recent `limit` messages of a conversation
    ///
    /// # Returns
    /// Messages ordered from newest to oldest
    #[instrument(skip(self))]
    pub async fn find_latest(
        &self,
        conversation_id: &str,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        self.store.ensure_online()?;
        let messages = self
            .store
            .messages
            .get(conversation_id)
            .map(|list| list.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default();
        Ok(messages)
    }

    /// Get up to `limit` messages strictly older than `before`
    ///
    /// # Returns
    /// Messages ordered from newest to oldest, all `< before` in (timestamp, id) order
    #[instrument(skip(self, before))]
    pub async fn find_older(
        &self,
        conversation_id: &str,
        before: &MessageCursor,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        self.store.ensure_online()?;
        let messages = self
            .store
            .messages
            .get(conversation_id)
            .map(|list| {
                list.iter()
                    .rev()
                    .filter(|m| MessageCursor::from(*m) < *before)
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(messages)
    }

    /// Get every message sent by `sender_id` that is still unread
    #[instrument(skip(self))]
    pub async fn find_unread_from(
        &self,
        conversation_id: &str,
        sender_id: &str,
    ) -> Result<Vec<Message>, StoreError> {
        self.store.ensure_online()?;
        Ok(self
            .store
            .messages
            .get(conversation_id)
            .map(|list| {
                list.iter()
                    .filter(|m| m.sender_id == sender_id && !m.read)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    #[instrument(skip(self))]
    pub async fn count(&self, conversation_id: &str) -> Result<usize, StoreError> {
        self.store.ensure_online()?;
        Ok(self
            .store
            .messages
            .get(conversation_id)
            .map(|list| list.len())
            .unwrap_or(0))
    }

    /// Replaces the placeholder image of the message carrying `local_image_id`
    /// with the hosted URL and clears the correlation id.
    ///
    /// # Returns
    /// * `Ok(Some(Message))` - the patched message
    /// * `Ok(None)` - no message carries that correlation id (already patched)
    #[instrument(skip(self, hosted_url))]
    pub async fn patch_by_correlation_id(
        &self,
        conversation_id: &str,
        local_image_id: &str,
        hosted_url: &str,
    ) -> Result<Option<Message>, StoreError> {
        self.store.ensure_online()?;
        let patched = {
            let mut list = self
                .store
                .messages
                .get_mut(conversation_id)
                .ok_or(StoreError::NotFound)?;
            list.iter_mut()
                .find(|m| m.local_image_id.as_deref() == Some(local_image_id))
                .map(|m| {
                    m.image = Some(hosted_url.to_string());
                    m.local_image_id = None;
                    m.clone()
                })
        };

        match &patched {
            Some(message) => {
                info!(message_id = %message.message_id, "Hosted image patched into message");
                self.store.publish(conversation_id, ChangeEvent::Messages);
            }
            None => debug!("No message waiting for this correlation id"),
        }
        Ok(patched)
    }

    /// Grouped read-receipt write: flags every unread message from `sender_id`
    /// as read and stamps `reader_id`'s last-read timestamp on the parent
    /// conversation, as one atomic unit.
    ///
    /// Nothing is written when there is nothing unread.
    ///
    /// # Returns
    /// Number of messages flipped to read
    #[instrument(skip(self))]
    pub async fn mark_read_batch(
        &self,
        conversation_id: &str,
        reader_id: &str,
        sender_id: &str,
    ) -> Result<usize, StoreError> {
        self.store.ensure_online()?;
        let flipped = {
            // ordine dei lock: messaggi, poi conversazione
            let mut list = self
                .store
                .messages
                .get_mut(conversation_id)
                .ok_or(StoreError::NotFound)?;
            let mut conversation = self
                .store
                .conversations
                .get_mut(conversation_id)
                .ok_or(StoreError::NotFound)?;

            let mut flipped = 0;
            for message in list
                .iter_mut()
                .filter(|m| m.sender_id == sender_id && !m.read)
            {
                message.read = true;
                flipped += 1;
            }
            if flipped > 0 {
                let now = self.store.server_timestamp();
                conversation.last_read.insert(reader_id.to_string(), now);
            }
            flipped
        };

        if flipped > 0 {
            debug!(flipped, "Read receipts committed");
            self.store.publish(conversation_id, ChangeEvent::Messages);
            self.store.publish(conversation_id, ChangeEvent::Conversation);
        }
        Ok(flipped)
    }
}

impl Create<Message, CreateMessageDTO> for MessageRepository {
    #[instrument(skip(self, data), fields(conversation_id = %data.conversation_id))]
    async fn create(&self, data: &CreateMessageDTO) -> Result<Message, StoreError> {
        self.store.ensure_online()?;
        let message = {
            let mut list = self
                .store
                .messages
                .get_mut(&data.conversation_id)
                .ok_or(StoreError::NotFound)?;
            let message = Message {
                message_id: DocumentStore::new_document_id(),
                conversation_id: data.conversation_id.clone(),
                sender_id: data.sender_id.clone(),
                text: data.text.clone(),
                created_at: self.store.server_timestamp(),
                read: false,
                image: data.image.clone(),
                local_image_id: data.local_image_id.clone(),
                shared_post: data.shared_post.clone(),
            };
            list.push(message.clone());
            message
        };

        debug!(message_id = %message.message_id, "Message created");
        self.store
            .publish(&data.conversation_id, ChangeEvent::Messages);
        Ok(message)
    }
}

impl Read<Message, (String, String)> for MessageRepository {
    async fn read(&self, id: &(String, String)) -> Result<Option<Message>, StoreError> {
        self.store.ensure_online()?;
        let (conversation_id, message_id) = id;
        Ok(self.store.messages.get(conversation_id).and_then(|list| {
            list.iter()
                .find(|m| &m.message_id == message_id)
                .cloned()
        }))
    }
}

impl Update<Message, UpdateMessageDTO, (String, String)> for MessageRepository {
    async fn update(
        &self,
        id: &(String, String),
        data: &UpdateMessageDTO,
    ) -> Result<Message, StoreError> {
        self.store.ensure_online()?;
        let (conversation_id, message_id) = id;
        let updated = {
            let mut list = self
                .store
                .messages
                .get_mut(conversation_id)
                .ok_or(StoreError::NotFound)?;
            let message = list
                .iter_mut()
                .find(|m| &m.message_id == message_id)
                .ok_or(StoreError::NotFound)?;

            if let Some(image) = &data.image {
                message.image = Some(image.clone());
            }
            if data.clear_local_image_id {
                message.local_image_id = None;
            }
            if let Some(read) = data.read {
                message.read = read;
            }
            message.clone()
        };

        self.store.publish(conversation_id, ChangeEvent::Messages);
        Ok(updated)
    }
}

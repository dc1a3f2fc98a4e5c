//! ConversationRepository - Repository per la gestione delle conversazioni

use super::{Create, Delete, DocumentStore, Read, StoreError, Update};
use crate::dtos::{CreateConversationDTO, UpdateConversationDTO};
use crate::entities::Conversation;
use crate::live::feed::ChangeEvent;
use dashmap::mapref::entry::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

// CONVERSATION REPOSITORY
#[derive(Clone)]
pub struct ConversationRepository {
    store: Arc<DocumentStore>,
}

impl ConversationRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Point lookup on the unique pair index (order of the two ids is irrelevant)
    #[instrument(skip(self), fields(user1 = %user1_id, user2 = %user2_id))]
    pub async fn find_by_pair(
        &self,
        user1_id: &str,
        user2_id: &str,
    ) -> Result<Option<Conversation>, StoreError> {
        self.store.ensure_online()?;
        let key = Conversation::pair_key(user1_id, user2_id);
        let conversation_id = match self.store.pair_index.get(&key) {
            Some(id) => id.value().clone(),
            None => {
                debug!("No conversation found for pair");
                return Ok(None);
            }
        };
        Ok(self
            .store
            .conversations
            .get(&conversation_id)
            .map(|c| c.value().clone()))
    }

    /// Creates the conversation for the pair unless one already exists.
    ///
    /// The insertion happens while the pair index entry is held, so two
    /// concurrent first contacts resolve to the same document.
    ///
    /// # Returns
    /// `(conversation, created)` where `created` is true only for the caller
    /// that actually inserted the document.
    #[instrument(skip(self, data))]
    pub async fn create_or_get(
        &self,
        data: &CreateConversationDTO,
    ) -> Result<(Conversation, bool), StoreError> {
        self.store.ensure_online()?;
        let [a, b] = &data.participants;
        let key = Conversation::pair_key(a, b);

        match self.store.pair_index.entry(key.clone()) {
            Entry::Occupied(existing) => {
                let conversation_id = existing.get().clone();
                drop(existing);
                debug!(%conversation_id, "Conversation already exists for pair");
                self.store
                    .conversations
                    .get(&conversation_id)
                    .map(|c| (c.value().clone(), false))
                    .ok_or(StoreError::NotFound)
            }
            Entry::Vacant(slot) => {
                let conversation = Conversation {
                    conversation_id: DocumentStore::new_document_id(),
                    participants: data.participants.clone(),
                    pair_key: key,
                    last_message: String::new(),
                    last_message_at: None,
                    last_sender_id: None,
                    typing: HashMap::new(),
                    last_read: HashMap::new(),
                    created_at: self.store.server_timestamp(),
                };
                self.store
                    .conversations
                    .insert(conversation.conversation_id.clone(), conversation.clone());
                self.store
                    .messages
                    .insert(conversation.conversation_id.clone(), Vec::new());
                slot.insert(conversation.conversation_id.clone());
                info!(conversation_id = %conversation.conversation_id, "Conversation created");
                Ok((conversation, true))
            }
        }
    }

    /// All conversations listing `user_id` among the participants
    #[instrument(skip(self))]
    pub async fn find_many_by_participant(
        &self,
        user_id: &str,
    ) -> Result<Vec<Conversation>, StoreError> {
        self.store.ensure_online()?;
        let conversations: Vec<Conversation> = self
            .store
            .conversations
            .iter()
            .filter(|c| c.has_participant(user_id))
            .map(|c| c.value().clone())
            .collect();
        debug!(count = conversations.len(), "Conversations found for user");
        Ok(conversations)
    }
}

impl Create<Conversation, CreateConversationDTO> for ConversationRepository {
    async fn create(&self, data: &CreateConversationDTO) -> Result<Conversation, StoreError> {
        match self.create_or_get(data).await? {
            (conversation, true) => Ok(conversation),
            (_, false) => Err(StoreError::AlreadyExists),
        }
    }
}

impl Read<Conversation, String> for ConversationRepository {
    #[instrument(skip(self), fields(conversation_id = %id))]
    async fn read(&self, id: &String) -> Result<Option<Conversation>, StoreError> {
        self.store.ensure_online()?;
        Ok(self.store.conversations.get(id).map(|c| c.value().clone()))
    }
}

impl Update<Conversation, UpdateConversationDTO, String> for ConversationRepository {
    #[instrument(skip(self, data), fields(conversation_id = %id))]
    async fn update(
        &self,
        id: &String,
        data: &UpdateConversationDTO,
    ) -> Result<Conversation, StoreError> {
        self.store.ensure_online()?;
        let updated = {
            let mut conversation = self
                .store
                .conversations
                .get_mut(id)
                .ok_or(StoreError::NotFound)?;

            if let Some((text, sender_id)) = &data.preview {
                conversation.last_message = text.clone();
                conversation.last_sender_id = Some(sender_id.clone());
                conversation.last_message_at = Some(self.store.server_timestamp());
            }

            if let Some((user_id, typing)) = &data.typing {
                if *typing {
                    let now = self.store.server_timestamp();
                    conversation.typing.insert(user_id.clone(), now);
                } else {
                    conversation.typing.remove(user_id);
                }
            }

            conversation.value().clone()
        };

        self.store.publish(id, ChangeEvent::Conversation);
        Ok(updated)
    }
}

impl Delete<String> for ConversationRepository {
    /// Deletes the conversation, its pair index entry and its messages
    #[instrument(skip(self), fields(conversation_id = %id))]
    async fn delete(&self, id: &String) -> Result<(), StoreError> {
        self.store.ensure_online()?;
        if let Some((_, conversation)) = self.store.conversations.remove(id) {
            self.store
                .pair_index
                .remove_if(&conversation.pair_key, |_, cid| cid == id);
            self.store.messages.remove(id);
            info!("Conversation deleted");
            self.store.publish(id, ChangeEvent::ConversationDeleted);
        } else {
            debug!("Conversation already gone");
        }
        Ok(())
    }
}

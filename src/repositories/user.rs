//! UserRepository - Repository per la gestione degli utenti

use super::{Create, DocumentStore, Read, ReadMany, StoreError, Update};
use crate::dtos::{CreateUserDTO, UpdateUserDTO};
use crate::entities::User;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, instrument};

// USER REPOSITORY
#[derive(Clone)]
pub struct UserRepository {
    store: Arc<DocumentStore>,
}

impl UserRepository {
    pub fn new(store: Arc<DocumentStore>) -> Self {
        Self { store }
    }

    /// Find a user by email (case-insensitive)
    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.store.ensure_online()?;
        let user = self
            .store
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .map(|u| u.value().clone());
        debug!(found = user.is_some(), "User lookup by email");
        Ok(user)
    }
}

impl Create<User, CreateUserDTO> for UserRepository {
    async fn create(&self, data: &CreateUserDTO) -> Result<User, StoreError> {
        self.store.ensure_online()?;
        if self.find_by_email(&data.email).await?.is_some() {
            return Err(StoreError::AlreadyExists);
        }
        let user = User {
            user_id: DocumentStore::new_document_id(),
            email: data.email.clone(),
            name: data.name.clone(),
            profile_picture: None,
            push_token: None,
            password: data.password.clone(),
            email_verified: false,
            liked_posts: BTreeSet::new(),
        };
        self.store.users.insert(user.user_id.clone(), user.clone());
        Ok(user)
    }
}

impl Read<User, String> for UserRepository {
    async fn read(&self, id: &String) -> Result<Option<User>, StoreError> {
        self.store.ensure_online()?;
        Ok(self.store.users.get(id).map(|u| u.value().clone()))
    }
}

impl ReadMany<User, String> for UserRepository {
    async fn read_many(&self, ids: &[String]) -> Result<Vec<User>, StoreError> {
        self.store.ensure_online()?;
        Ok(ids
            .iter()
            .filter_map(|id| self.store.users.get(id).map(|u| u.value().clone()))
            .collect())
    }
}

impl Update<User, UpdateUserDTO, String> for UserRepository {
    async fn update(&self, id: &String, data: &UpdateUserDTO) -> Result<User, StoreError> {
        self.store.ensure_online()?;
        let mut user = self.store.users.get_mut(id).ok_or(StoreError::NotFound)?;

        if let Some(name) = &data.name {
            user.name = name.clone();
        }
        if let Some(picture) = &data.profile_picture {
            user.profile_picture = Some(picture.clone());
        }
        if let Some(token) = &data.push_token {
            user.push_token = Some(token.clone());
        }
        if let Some(password) = &data.password {
            user.password = password.clone();
        }
        if let Some(verified) = data.email_verified {
            user.email_verified = verified;
        }
        if let Some((post_id, liked)) = &data.liked_post {
            if *liked {
                user.liked_posts.insert(post_id.clone());
            } else {
                user.liked_posts.remove(post_id);
            }
        }
        Ok(user.value().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(email: &str, name: &str) -> CreateUserDTO {
        CreateUserDTO {
            email: email.to_string(),
            name: name.to_string(),
            password: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn read_many_keeps_order_and_skips_missing() {
        let repo = UserRepository::new(Arc::new(DocumentStore::new()));
        let ada = repo.create(&dto("ada@example.com", "Ada")).await.unwrap();
        let bruno = repo.create(&dto("bruno@example.com", "Bruno")).await.unwrap();

        let users = repo
            .read_many(&[
                bruno.user_id.clone(),
                "ghost".to_string(),
                ada.user_id.clone(),
            ])
            .await
            .unwrap();
        let names: Vec<&str> = users.iter().map(|u| u.name.as_str()).collect();
        assert_eq!(names, ["Bruno", "Ada"]);

        assert!(repo.read_many(&[]).await.unwrap().is_empty());
    }
}

//! In-memory store doubles for handler tests.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::StoreError;
use crate::records::RecordStore;
use crate::s3::BlobStore;
use crate::types::{Attachment, User, UserPatch};

#[derive(Default)]
pub struct InMemoryRecordStore {
    users: Mutex<HashMap<String, User>>,
    writes: Mutex<usize>,
}

impl InMemoryRecordStore {
    pub fn get(&self, user_id: &str) -> Option<User> {
        self.users.lock().unwrap().get(user_id).cloned()
    }

    pub fn insert(&self, user: User) {
        self.users.lock().unwrap().insert(user.user_id.clone(), user);
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap()
    }

    fn bump(&self) {
        *self.writes.lock().unwrap() += 1;
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.get(user_id))
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.bump();
        self.insert(user.clone());
        Ok(())
    }

    async fn update_user(
        &self,
        user_id: &str,
        patch: &UserPatch,
        updated_at: &str,
    ) -> Result<Option<User>, StoreError> {
        self.bump();
        let mut users = self.users.lock().unwrap();
        let Some(user) = users.get_mut(user_id) else {
            return Ok(None);
        };
        if let Some(Some(name)) = &patch.name {
            user.name = name.clone();
        }
        if let Some(email) = &patch.email {
            user.email = email.clone();
        }
        if let Some(phone) = &patch.phone {
            user.phone = phone.clone();
        }
        user.updated_at = Some(updated_at.to_string());
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.bump();
        self.users.lock().unwrap().remove(user_id);
        Ok(())
    }

    async fn append_attachment(
        &self,
        user_id: &str,
        attachment: &Attachment,
    ) -> Result<bool, StoreError> {
        self.bump();
        let mut users = self.users.lock().unwrap();
        match users.get_mut(user_id) {
            Some(user) => {
                user.attachments.push(attachment.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Blob store double. Keys listed in `failing` error on delete and presign.
#[derive(Default)]
pub struct InMemoryBlobStore {
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    failing: Mutex<HashSet<String>>,
    delete_attempts: Mutex<Vec<String>>,
}

impl InMemoryBlobStore {
    pub fn fail_on(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn object(&self, key: &str) -> Option<(Vec<u8>, String)> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.delete_attempts.lock().unwrap().clone()
    }

    fn is_failing(&self, key: &str) -> bool {
        self.failing.lock().unwrap().contains(key)
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<(), StoreError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (bytes, content_type.to_string()));
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), StoreError> {
        self.delete_attempts.lock().unwrap().push(key.to_string());
        if self.is_failing(key) {
            return Err(StoreError::backend("DeleteObject", "AccessDenied"));
        }
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presigned_get_url(&self, key: &str, expires_in: Duration) -> Result<String, StoreError> {
        if self.is_failing(key) {
            return Err(StoreError::backend("PresignGetObject", "no credentials"));
        }
        Ok(format!(
            "https://test-bucket.s3.amazonaws.com/{}?X-Amz-Expires={}",
            key,
            expires_in.as_secs()
        ))
    }
}

use async_trait::async_trait;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::{AttributeValue, ReturnValue};
use aws_sdk_dynamodb::Client as DynamoClient;
use std::collections::HashMap;

use crate::error::StoreError;
use crate::types::{Attachment, User, UserPatch};

const KEY_ATTR: &str = "userId";
const RECORD_EXISTS: &str = "attribute_exists(userId)";

/// Key-value store holding one item per user.
#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Unconditional write of the full record.
    async fn put_user(&self, user: &User) -> Result<(), StoreError>;

    /// Apply the supplied fields and stamp `updated_at`.
    /// Returns `None` when no record exists for `user_id`.
    async fn update_user(
        &self,
        user_id: &str,
        patch: &UserPatch,
        updated_at: &str,
    ) -> Result<Option<User>, StoreError>;

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError>;

    /// Append to the attachment list, creating it if absent.
    /// Returns `false` when no record exists for `user_id`.
    async fn append_attachment(
        &self,
        user_id: &str,
        attachment: &Attachment,
    ) -> Result<bool, StoreError>;
}

pub struct DynamoRecordStore {
    client: DynamoClient,
    table_name: String,
}

impl DynamoRecordStore {
    pub fn new(client: DynamoClient, table_name: impl Into<String>) -> Self {
        Self {
            client,
            table_name: table_name.into(),
        }
    }

    fn key(user_id: &str) -> AttributeValue {
        AttributeValue::S(user_id.to_string())
    }
}

#[async_trait]
impl RecordStore for DynamoRecordStore {
    async fn get_user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(KEY_ATTR, Self::key(user_id))
            .send()
            .await
            .map_err(|e| StoreError::backend("GetItem", DisplayErrorContext(&e)))?;

        result.item().map(user_from_item).transpose()
    }

    async fn put_user(&self, user: &User) -> Result<(), StoreError> {
        self.client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(user_to_item(user)))
            .send()
            .await
            .map_err(|e| StoreError::backend("PutItem", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn update_user(
        &self,
        user_id: &str,
        patch: &UserPatch,
        updated_at: &str,
    ) -> Result<Option<User>, StoreError> {
        let expr = PatchExpression::build(patch, updated_at);
        let mut builder = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTR, Self::key(user_id))
            .condition_expression(RECORD_EXISTS)
            .return_values(ReturnValue::AllNew)
            .update_expression(expr.expression);

        for (k, v) in expr.names {
            builder = builder.expression_attribute_names(k, v);
        }
        for (k, v) in expr.values {
            builder = builder.expression_attribute_values(k, v);
        }

        let result = builder.send().await;

        match result {
            Ok(output) => output.attributes().map(user_from_item).transpose(),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false);
                if missing {
                    Ok(None)
                } else {
                    Err(StoreError::backend("UpdateItem", DisplayErrorContext(&e)))
                }
            }
        }
    }

    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError> {
        self.client
            .delete_item()
            .table_name(&self.table_name)
            .key(KEY_ATTR, Self::key(user_id))
            .send()
            .await
            .map_err(|e| StoreError::backend("DeleteItem", DisplayErrorContext(&e)))?;
        Ok(())
    }

    async fn append_attachment(
        &self,
        user_id: &str,
        attachment: &Attachment,
    ) -> Result<bool, StoreError> {
        let result = self
            .client
            .update_item()
            .table_name(&self.table_name)
            .key(KEY_ATTR, Self::key(user_id))
            .condition_expression(RECORD_EXISTS)
            .update_expression("SET arquivos = list_append(if_not_exists(arquivos, :empty_list), :new_file)")
            .expression_attribute_values(":empty_list", AttributeValue::L(vec![]))
            .expression_attribute_values(
                ":new_file",
                AttributeValue::L(vec![attachment_to_value(attachment)]),
            )
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_conditional_check_failed_exception())
                    .unwrap_or(false);
                if missing {
                    Ok(false)
                } else {
                    Err(StoreError::backend("UpdateItem", DisplayErrorContext(&e)))
                }
            }
        }
    }
}

// ========== UPDATE EXPRESSION ==========

/// `SET` for supplied values, `REMOVE` for explicit nulls. `updated_at` is always set.
struct PatchExpression {
    expression: String,
    names: Vec<(String, String)>,
    values: Vec<(String, AttributeValue)>,
}

impl PatchExpression {
    fn build(patch: &UserPatch, updated_at: &str) -> Self {
        let mut sets = vec!["updated_at = :updated_at".to_string()];
        let mut removes = Vec::new();
        let mut names = Vec::new();
        let mut values = vec![(
            ":updated_at".to_string(),
            AttributeValue::S(updated_at.to_string()),
        )];

        let fields = [
            ("nome", &patch.name),
            ("email", &patch.email),
            ("telefone", &patch.phone),
        ];
        for (attr, change) in fields {
            match change {
                Some(Some(value)) => {
                    sets.push(format!("#{attr} = :{attr}"));
                    names.push((format!("#{attr}"), attr.to_string()));
                    values.push((format!(":{attr}"), AttributeValue::S(value.clone())));
                }
                Some(None) => {
                    removes.push(format!("#{attr}"));
                    names.push((format!("#{attr}"), attr.to_string()));
                }
                None => {}
            }
        }

        let mut expression = format!("SET {}", sets.join(", "));
        if !removes.is_empty() {
            expression.push_str(&format!(" REMOVE {}", removes.join(", ")));
        }

        Self {
            expression,
            names,
            values,
        }
    }
}

// ========== ITEM CONVERSION ==========

fn user_to_item(user: &User) -> HashMap<String, AttributeValue> {
    let mut item = HashMap::new();
    item.insert(KEY_ATTR.to_string(), AttributeValue::S(user.user_id.clone()));
    item.insert("nome".to_string(), AttributeValue::S(user.name.clone()));
    item.insert("created_at".to_string(), AttributeValue::S(user.created_at.clone()));
    if let Some(email) = &user.email {
        item.insert("email".to_string(), AttributeValue::S(email.clone()));
    }
    if let Some(phone) = &user.phone {
        item.insert("telefone".to_string(), AttributeValue::S(phone.clone()));
    }
    if let Some(updated_at) = &user.updated_at {
        item.insert("updated_at".to_string(), AttributeValue::S(updated_at.clone()));
    }
    item.insert(
        "arquivos".to_string(),
        AttributeValue::L(user.attachments.iter().map(attachment_to_value).collect()),
    );
    item
}

fn user_from_item(item: &HashMap<String, AttributeValue>) -> Result<User, StoreError> {
    let user_id = get_s(item, KEY_ATTR)
        .ok_or_else(|| StoreError::MalformedItem("missing userId".to_string()))?;
    let name = get_s(item, "nome")
        .ok_or_else(|| StoreError::MalformedItem(format!("user {} has no nome", user_id)))?;

    let attachments = match item.get("arquivos").and_then(|v| v.as_l().ok()) {
        Some(values) => values
            .iter()
            .map(attachment_from_value)
            .collect::<Result<Vec<_>, _>>()?,
        None => Vec::new(),
    };

    Ok(User {
        user_id,
        name,
        email: get_s(item, "email"),
        phone: get_s(item, "telefone"),
        created_at: get_s(item, "created_at").unwrap_or_default(),
        updated_at: get_s(item, "updated_at"),
        attachments,
    })
}

fn attachment_to_value(attachment: &Attachment) -> AttributeValue {
    let mut map = HashMap::new();
    map.insert("file_id".to_string(), AttributeValue::S(attachment.file_id.clone()));
    map.insert("nome_original".to_string(), AttributeValue::S(attachment.filename.clone()));
    map.insert("s3_key".to_string(), AttributeValue::S(attachment.storage_key.clone()));
    map.insert("content_type".to_string(), AttributeValue::S(attachment.content_type.clone()));
    map.insert("uploaded_at".to_string(), AttributeValue::S(attachment.uploaded_at.clone()));
    AttributeValue::M(map)
}

fn attachment_from_value(value: &AttributeValue) -> Result<Attachment, StoreError> {
    let map = value
        .as_m()
        .map_err(|_| StoreError::MalformedItem("attachment entry is not a map".to_string()))?;
    let storage_key = get_s(map, "s3_key")
        .ok_or_else(|| StoreError::MalformedItem("attachment without s3_key".to_string()))?;

    Ok(Attachment {
        file_id: get_s(map, "file_id").unwrap_or_default(),
        filename: get_s(map, "nome_original").unwrap_or_default(),
        storage_key,
        content_type: get_s(map, "content_type")
            .unwrap_or_else(|| crate::types::DEFAULT_CONTENT_TYPE.to_string()),
        uploaded_at: get_s(map, "uploaded_at").unwrap_or_default(),
    })
}

fn get_s(item: &HashMap<String, AttributeValue>, key: &str) -> Option<String> {
    item.get(key).and_then(|v| v.as_s().ok()).map(|s| s.to_string())
}

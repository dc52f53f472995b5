use serde::{Deserialize, Deserializer, Serialize};

pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

// ========== USER ==========
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "telefone", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "arquivos", default)]
    pub attachments: Vec<Attachment>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(rename = "nome", alias = "name")]
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "telefone", alias = "phone")]
    pub phone: Option<String>,
}

/// Fields explicitly supplied in an update body.
///
/// `None` leaves the field alone, `Some(None)` (an explicit `null`) clears it.
#[derive(Debug, Deserialize, Default, Clone, PartialEq)]
pub struct UserPatch {
    #[serde(rename = "nome", alias = "name", default, deserialize_with = "present")]
    pub name: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub email: Option<Option<String>>,
    #[serde(rename = "telefone", alias = "phone", default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
}

// Only called when the key is in the body, so a JSON null becomes Some(None).
fn present<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.phone.is_none()
    }
}

// ========== ATTACHMENT ==========
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Attachment {
    pub file_id: String,
    #[serde(rename = "nome_original")]
    pub filename: String,
    #[serde(rename = "s3_key")]
    pub storage_key: String,
    pub content_type: String,
    pub uploaded_at: String,
}

impl Attachment {
    /// Storage key: users/{user_id}/{file_id}_{filename}
    pub fn storage_key_for(user_id: &str, file_id: &str, filename: &str) -> String {
        format!("users/{}/{}_{}", user_id, file_id, filename)
    }
}

#[derive(Debug, Deserialize)]
pub struct UploadAttachmentRequest {
    #[serde(rename = "arquivo_base64", alias = "file_base64")]
    pub file_base64: Option<String>,
    #[serde(rename = "nome_arquivo", alias = "filename")]
    pub filename: Option<String>,
    pub content_type: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DownloadLink {
    pub file_id: String,
    #[serde(rename = "nome_original")]
    pub filename: String,
    pub download_url: String,
    pub uploaded_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_format() {
        assert_eq!(
            Attachment::storage_key_for("u-1", "f-2", "doc.pdf"),
            "users/u-1/f-2_doc.pdf"
        );
    }

    #[test]
    fn test_patch_accepts_english_aliases() {
        let patch: UserPatch = serde_json::from_str(r#"{"name":"Ana","phone":"123"}"#).unwrap();
        assert_eq!(patch.name, Some(Some("Ana".to_string())));
        assert_eq!(patch.phone, Some(Some("123".to_string())));
        assert_eq!(patch.email, None);
        assert!(!patch.is_empty());

        let empty: UserPatch = serde_json::from_str("{}").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_patch_null_means_clear() {
        let patch: UserPatch = serde_json::from_str(r#"{"email":null}"#).unwrap();
        assert_eq!(patch.email, Some(None));
        assert_eq!(patch.phone, None);
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_user_wire_names() {
        let user = User {
            user_id: "abc".to_string(),
            name: "Ana".to_string(),
            email: None,
            phone: Some("555".to_string()),
            created_at: "2024-01-01T00:00:00+00:00".to_string(),
            updated_at: None,
            attachments: vec![],
        };
        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["userId"], "abc");
        assert_eq!(json["nome"], "Ana");
        assert_eq!(json["telefone"], "555");
        assert_eq!(json["arquivos"], serde_json::json!([]));
        assert!(json.get("email").is_none());
        assert!(json.get("updated_at").is_none());
    }
}

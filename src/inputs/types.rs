use crate::api::{UserInputRequest, ValidationError};

/// Contact-sales / feedback form as the user filled it in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInputForm {
    pub name: String,
    pub email: String,
    pub phone_number: String,
    pub title: String,
    pub content: String,
}

impl UserInputForm {
    /// First blank required field, if any. Phone number is optional.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let required = [
            ("name", &self.name),
            ("email", &self.email),
            ("title", &self.title),
            ("content", &self.content),
        ];
        match required.iter().find(|(_, value)| value.trim().is_empty()) {
            Some((field, _)) => Err(ValidationError::missing(*field)),
            None => Ok(()),
        }
    }

    pub fn into_request(self, user_id: Option<i64>) -> UserInputRequest {
        UserInputRequest {
            user_id,
            name: self.name,
            email: self.email,
            phone_number: self.phone_number,
            title: self.title,
            content: self.content,
        }
    }
}

use super::types::UserInputForm;
use crate::api::{ApiClient, ApiError, Notice};
use crate::auth::User;
use std::sync::Arc;
use tracing::info;

pub struct InputsService {
    api: Arc<ApiClient>,
}

impl InputsService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Anonymous requests are allowed; a signed-in user is attached.
    pub async fn contact_sales(
        &self,
        form: UserInputForm,
        user: Option<&User>,
    ) -> Result<Notice, ApiError> {
        form.validate()?;
        self.api
            .submit_contact_sales(&form.into_request(user.map(|u| u.id)))
            .await?;
        info!("Contact-sales request submitted");
        Ok(Notice::info(
            "Request submitted",
            "Our sales team will contact you soon.",
        ))
    }

    pub async fn feedback(
        &self,
        form: UserInputForm,
        user: Option<&User>,
    ) -> Result<Notice, ApiError> {
        let user = user.ok_or_else(|| {
            ApiError::Unauthenticated("Please log in to submit feedback.".into())
        })?;
        form.validate()?;
        self.api
            .submit_feedback(&form.into_request(Some(user.id)))
            .await?;
        info!("Feedback submitted by user {}", user.id);
        Ok(Notice::info("Feedback submitted", "Thank you for your feedback!"))
    }
}

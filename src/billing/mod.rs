use crate::api::{
    ApiClient, ApiError, CheckoutSession, CreditPackEntity, CreditPackRequest, PlanEntity,
    SubscribeRequest, UserCreditsEntity, UserSubscriptionEntity,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Plans, credit packs, balance and the user's subscription.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlanOverview {
    pub plans: Vec<PlanEntity>,
    pub credit_packs: Vec<CreditPackEntity>,
    pub credits: UserCreditsEntity,
    pub subscription: Option<UserSubscriptionEntity>,
    pub current_plan: Option<PlanEntity>,
}

impl PlanOverview {
    pub fn has_active_subscription(&self) -> bool {
        self.subscription
            .as_ref()
            .and_then(|s| s.status.as_deref())
            .is_some_and(|status| status.eq_ignore_ascii_case("active"))
    }
}

/// The subscribed plan; without a subscription the free plan, else the first.
pub fn select_current_plan(
    plans: &[PlanEntity],
    subscription: Option<&UserSubscriptionEntity>,
) -> Option<PlanEntity> {
    match subscription {
        Some(subscription) => plans.iter().find(|p| p.id == subscription.plan_id).cloned(),
        None => plans
            .iter()
            .find(|p| p.price_monthly == 0.0)
            .or_else(|| plans.first())
            .cloned(),
    }
}

/// Site root for checkout return links: the API base without its `/api` suffix.
pub fn site_origin(api_base_url: &str) -> String {
    let trimmed = api_base_url.trim_end_matches('/');
    trimmed.strip_suffix("/api").unwrap_or(trimmed).to_string()
}

pub struct BillingService {
    api: Arc<ApiClient>,
    origin: String,
}

impl BillingService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let origin = site_origin(api.base_url());
        Self { api, origin }
    }

    fn success_url(&self) -> String {
        format!("{}/my-plan?success=true", self.origin)
    }

    fn cancel_url(&self) -> String {
        format!("{}/error", self.origin)
    }

    pub async fn load_overview(&self, user_id: i64) -> Result<PlanOverview, ApiError> {
        let (plans, credit_packs, credits, subscription) = tokio::join!(
            self.api.get_plans(),
            self.api.get_credit_packs(),
            self.api.get_credit_balance(),
            self.api.get_user_plan(user_id),
        );

        let plans = plans?;
        let subscription = match subscription {
            Ok(subscription) => Some(subscription),
            Err(e) => {
                warn!("No subscription for user {}: {}", user_id, e);
                None
            }
        };
        let current_plan = select_current_plan(&plans, subscription.as_ref());

        Ok(PlanOverview {
            credit_packs: credit_packs?,
            credits: credits?,
            plans,
            subscription,
            current_plan,
        })
    }

    fn checkout_url(result: CheckoutSession, endpoint: &str) -> Result<String, ApiError> {
        result
            .checkout_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| ApiError::EmptyResponse {
                endpoint: endpoint.to_string(),
            })
    }

    /// Start a plan checkout; returns the URL to complete payment at.
    pub async fn subscribe(&self, user_id: i64, plan_id: i64) -> Result<String, ApiError> {
        let result = self
            .api
            .subscribe(&SubscribeRequest {
                user_id,
                plan_id,
                success_url: Some(self.success_url()),
                cancel_url: Some(self.cancel_url()),
            })
            .await?;
        info!("Checkout started for plan {}", plan_id);
        Self::checkout_url(result, "/StripeSubscription/subscribe")
    }

    pub async fn buy_credit_pack(&self, user_id: i64, pack_id: i64) -> Result<String, ApiError> {
        let result = self
            .api
            .buy_credit_pack(&CreditPackRequest {
                user_id,
                pack_id,
                success_url: Some(self.success_url()),
                cancel_url: Some(self.cancel_url()),
            })
            .await?;
        info!("Checkout started for credit pack {}", pack_id);
        Self::checkout_url(result, "/StripeSubscription/buy/pack")
    }

    pub async fn cancel_subscription(&self, user_id: i64) -> Result<(), ApiError> {
        self.api.cancel_subscription(user_id).await?;
        info!("Subscription cancelled for user {}", user_id);
        Ok(())
    }
}

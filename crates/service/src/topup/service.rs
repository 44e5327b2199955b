use std::{sync::Arc, time::Duration};

use models::user::User;
use rand::Rng;
use tracing::{info, instrument, warn};

use super::domain::{parse_amount, SlipUpload, TopupMethod, TopupReceipt};
use super::errors::TopupError;
use crate::errors::ServiceError;
use crate::notify::{dispatch, Notifier, TopupEvent};
use crate::users::UserRepository;

/// Substring a gift link must contain to be accepted.
pub const GIFT_LINK_DOMAIN: &str = "gift.truemoney.com";
/// Inclusive range of the simulated gift voucher value.
pub const GIFT_AMOUNT_MIN: u32 = 20;
pub const GIFT_AMOUNT_MAX: u32 = 119;

#[derive(Clone, Debug)]
pub struct TopupSettings {
    pub gift_delay: Duration,
    pub slip_delay: Duration,
}

impl Default for TopupSettings {
    fn default() -> Self {
        Self { gift_delay: Duration::from_millis(1500), slip_delay: Duration::from_millis(2000) }
    }
}

impl TopupSettings {
    /// No simulated verification delay.
    pub fn immediate() -> Self {
        Self { gift_delay: Duration::ZERO, slip_delay: Duration::ZERO }
    }
}

#[derive(Clone)]
pub struct TopupService {
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
    settings: TopupSettings,
}

impl TopupService {
    pub fn new(users: Arc<dyn UserRepository>, notifier: Arc<dyn Notifier>, settings: TopupSettings) -> Self {
        Self { users, notifier, settings }
    }

    /// Redeem a gift link. The link is only checked for the voucher domain and
    /// the credited value is drawn at random.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn redeem_gift_link(&self, user: &User, link: &str, phone: Option<&str>) -> Result<TopupReceipt, TopupError> {
        info!(username = %user.username, link, has_phone = phone.is_some(), "processing gift link");
        pause(self.settings.gift_delay).await;

        if !link.contains(GIFT_LINK_DOMAIN) {
            return Err(TopupError::InvalidGiftLink);
        }
        let amount = rand::thread_rng().gen_range(GIFT_AMOUNT_MIN..=GIFT_AMOUNT_MAX) as f64;
        self.credit(user, TopupMethod::GiftLink, amount).await
    }

    /// Accept a slip for `raw_amount`. The stored file is removed once the
    /// simulated check is over, whether or not the amount is usable.
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn verify_slip(&self, user: &User, slip: SlipUpload, raw_amount: &str) -> Result<TopupReceipt, TopupError> {
        info!(
            username = %user.username,
            amount = raw_amount,
            file = slip.original_name.as_deref().unwrap_or("-"),
            size = slip.size,
            "verifying slip"
        );
        pause(self.settings.slip_delay).await;

        if let Err(e) = tokio::fs::remove_file(&slip.path).await {
            warn!(path = %slip.path.display(), error = %e, "failed to remove uploaded slip");
        }

        let amount = parse_amount(raw_amount)?;
        self.credit(user, TopupMethod::Slip, amount).await
    }

    async fn credit(&self, user: &User, method: TopupMethod, amount: f64) -> Result<TopupReceipt, TopupError> {
        let updated = match self.users.credit(&user.id, amount).await {
            Ok(u) => u,
            Err(ServiceError::Model(e)) => return Err(TopupError::InvalidAmount(e.to_string())),
            Err(e) => return Err(e.into()),
        };
        info!(user_id = %updated.id, method = method.label(), amount, balance = updated.credits, "topup_credited");

        let message = format!("Topup {}: {} THB", method.label(), amount);
        dispatch(Arc::clone(&self.notifier), TopupEvent::new(&updated.id, &updated.username, message));

        Ok(TopupReceipt { method, amount, balance: updated.credits })
    }
}

async fn pause(d: Duration) {
    if !d.is_zero() {
        tokio::time::sleep(d).await;
    }
}

//! Unused coupon listing.

use serde::Deserialize;
use tracing::{info, warn};

use super::{lenient, CityboxApi};
use crate::auth::Credentials;
use crate::transport::HttpRequest;
use crate::types::RemoteOutcome;

/// Cash coupons carry the currency unit in their name.
pub const CURRENCY_MARKER: &str = "元";

const PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Coupon {
    pub card_name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    pub to_date: String,
}

impl Coupon {
    pub fn is_cash(&self) -> bool {
        self.card_name.contains(CURRENCY_MARKER)
    }
}

impl<'a> CityboxApi<'a> {
    /// Unused cash coupons, or `None` if the listing failed.
    pub async fn check_coupons(&self, account: &str, creds: &Credentials) -> Option<Vec<Coupon>> {
        let mut request = HttpRequest::get(&self.endpoints.coupon_list)
            .headers(creds.headers.clone())
            .query("status", 0)
            .query("page", 1)
            .query("page_size", PAGE_SIZE);
        if let Some(sign) = &self.endpoints.coupon_sign {
            request = request.header("sign", sign);
        }

        let coupons = match self.execute::<Vec<Coupon>>(request).await {
            RemoteOutcome::Success(coupons) => coupons,
            other => {
                warn!(account, outcome = %other, "Coupon request failed");
                return None;
            }
        };

        let cash: Vec<Coupon> = coupons.into_iter().filter(Coupon::is_cash).collect();
        if !cash.is_empty() {
            let listing = cash
                .iter()
                .map(|c| format!("{} {}", c.card_name, c.to_date))
                .collect::<Vec<_>>()
                .join(", ");
            info!(account, count = cash.len(), coupons = %listing, "Unused coupons");
        }
        Some(cash)
    }
}

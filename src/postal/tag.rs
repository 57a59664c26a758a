use std::fmt;

const TENANT: &str = "tenant";
const CAMPAIGN: &str = "campaign";
const SUBSCRIBER: &str = "subscriber";

/// Identifies which tenant, campaign and subscriber a delivered message
/// belongs to. Travels through Postal's `tag` field and comes back on
/// webhooks.
///
/// Two wire forms exist:
///
/// * `tenant-<tenant>-campaign-<campaign>-subscriber-<subscriber>`
/// * `campaign-<campaign>-subscriber-<subscriber>` when no tenant is set
///
/// Decoding never fails. Input that does not match either form yields a tag
/// with `valid == false` and zeroed ids, so check [`CorrelationTag::is_valid`]
/// (or use [`CorrelationTag::ids`]) before trusting the numbers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationTag {
    pub tenant_id: u32,
    pub campaign_id: u32,
    pub subscriber_id: u64,
    pub valid: bool,
}

impl CorrelationTag {
    /// A tenant id of `0` means "unspecified" and selects the short form.
    pub fn new(tenant_id: u32, campaign_id: u32, subscriber_id: u64) -> Self {
        Self {
            tenant_id,
            campaign_id,
            subscriber_id,
            valid: true,
        }
    }

    pub fn decode(tag: &str) -> Self {
        let tokens: Vec<&str> = tag.split('-').collect();
        let parsed = match tokens.as_slice() {
            [TENANT, tenant, CAMPAIGN, campaign, SUBSCRIBER, subscriber] => {
                parse_ids(Some(*tenant), campaign, subscriber)
            }
            [CAMPAIGN, campaign, SUBSCRIBER, subscriber] => parse_ids(None, campaign, subscriber),
            _ => None,
        };
        parsed.unwrap_or_default()
    }

    pub fn encode(&self) -> String {
        self.to_string()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// `(tenant_id, campaign_id, subscriber_id)`, only for a valid tag.
    pub fn ids(&self) -> Option<(u32, u32, u64)> {
        self.valid
            .then(|| (self.tenant_id, self.campaign_id, self.subscriber_id))
    }
}

fn parse_ids(tenant: Option<&str>, campaign: &str, subscriber: &str) -> Option<CorrelationTag> {
    let tenant_id = match tenant {
        Some(tenant) => tenant.parse().ok()?,
        None => 0,
    };
    Some(CorrelationTag::new(
        tenant_id,
        campaign.parse().ok()?,
        subscriber.parse().ok()?,
    ))
}

impl fmt::Display for CorrelationTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.tenant_id > 0 {
            write!(f, "{}-{}-", TENANT, self.tenant_id)?;
        }
        write!(
            f,
            "{}-{}-{}-{}",
            CAMPAIGN, self.campaign_id, SUBSCRIBER, self.subscriber_id
        )
    }
}

use std::collections::HashMap;

/// An outbound email as handed to a messenger. Messengers only read it.
#[derive(Debug, Default, Clone)]
pub struct Message {
    pub to: Vec<String>,
    pub from: String,
    pub subject: String,
    pub body: Vec<u8>,
    pub content_type: ContentType,
    /// Plain-text alternative for HTML messages.
    pub alt_body: Option<Vec<u8>>,
    pub headers: HashMap<String, Vec<String>>,
    pub attachments: Vec<Attachment>,
    pub campaign: Option<CampaignRef>,
    pub subscriber: Option<SubscriberRef>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Plain,
    #[default]
    Html,
}

#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
pub struct CampaignRef {
    pub id: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct SubscriberRef {
    pub id: u64,
}

impl Message {
    pub fn is_plain(&self) -> bool {
        self.content_type == ContentType::Plain
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn alt_body_text(&self) -> Option<String> {
        self.alt_body
            .as_deref()
            .map(|body| String::from_utf8_lossy(body).into_owned())
    }

    /// Plain-text part: the body itself for plain messages, otherwise the
    /// alternative body if one was supplied.
    pub fn text_part(&self) -> Option<String> {
        if self.is_plain() {
            Some(self.body_text())
        } else {
            self.alt_body_text()
        }
    }

    pub fn html_part(&self) -> Option<String> {
        (!self.is_plain()).then(|| self.body_text())
    }

    /// Campaign and subscriber ids, when the message belongs to a campaign
    /// send.
    pub fn campaign_context(&self) -> Option<(u32, u64)> {
        match (self.campaign, self.subscriber) {
            (Some(campaign), Some(subscriber)) => Some((campaign.id, subscriber.id)),
            _ => None,
        }
    }
}

/// Splits `"Name <address>"` into its display name and address. Anything
/// without angle brackets is returned as a bare address.
pub fn split_address(address: &str) -> (Option<&str>, &str) {
    let address = address.trim();
    match (address.rfind('<'), address.ends_with('>')) {
        (Some(open), true) => {
            let name = address[..open].trim().trim_matches('"').trim();
            let email = address[open + 1..address.len() - 1].trim();
            ((!name.is_empty()).then(|| name), email)
        }
        _ => (None, address),
    }
}

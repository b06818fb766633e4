use url::Url;

pub const DEFAULT_API_BASE: &str = "https://agentic-commerce-api-f1fx.onrender.com";

const STREAM_QUERY_FLAG: (&str, &str) = ("stream", "1");

/// Resolved backend URLs for one API base.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    base: Url,
    chat: Url,
    shop: Url,
    checkout_execute: Url,
}

impl ApiEndpoints {
    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        let mut base = Url::parse(base.trim())?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }

        Ok(Self {
            chat: base.join("chat")?,
            shop: base.join("shop")?,
            checkout_execute: base.join("checkout/execute")?,
            base,
        })
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    pub fn chat(&self) -> &Url {
        &self.chat
    }

    pub fn shop(&self) -> &Url {
        &self.shop
    }

    pub fn checkout_execute(&self) -> &Url {
        &self.checkout_execute
    }

    pub fn checkout_execute_streaming(&self) -> Url {
        let mut url = self.checkout_execute.clone();
        url.query_pairs_mut()
            .append_pair(STREAM_QUERY_FLAG.0, STREAM_QUERY_FLAG.1);
        url
    }
}

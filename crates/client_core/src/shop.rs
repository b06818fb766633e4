//! Chat and product search against the shopping backend.

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{ChatSessionId, ItemId, Product},
    error::{ApiError, ApiException},
    protocol::{
        CategoryResult, ChatRequest, ChatResponse, FinalResults, Pick, ShopResponse, ShoppingSpec,
        SpecItem,
    },
};
use tracing::{debug, info};
use url::Url;

use crate::{currency::DEFAULT_CURRENCY, endpoints::ApiEndpoints, error::ShopError};

const PLACEHOLDER_IMAGE: &str = "https://via.placeholder.com/300?text=Product";
const DEFAULT_PRODUCT_NAME: &str = "Product";
const DEFAULT_BRAND: &str = "Unknown";
const DEFAULT_DELIVERY: &str = "Check retailer";
const DEFAULT_RATING: f32 = 4.0;
const LINK_TAIL_CHARS: usize = 8;

pub struct ShopClient {
    http: Client,
    endpoints: ApiEndpoints,
}

impl ShopClient {
    pub fn new(http: Client, endpoints: ApiEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// Sends one chat turn. The conversation lives on the server; pass the
    /// session id from the previous reply to continue it.
    pub async fn chat(
        &self,
        session_id: Option<&ChatSessionId>,
        message: &str,
    ) -> Result<ChatResponse, ShopError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(ShopError::EmptyMessage);
        }

        let body = ChatRequest {
            session_id: session_id.map(|id| id.as_str().to_string()).unwrap_or_default(),
            message: message.to_string(),
        };
        let response: ChatResponse = self
            .post_json(self.endpoints.chat(), &body, "Request failed")
            .await?;
        debug!(
            session = %response.session_id,
            has_spec = response.json_output.is_some(),
            "shop: chat reply received"
        );
        Ok(response)
    }

    pub async fn run_shop(&self, spec: &ShoppingSpec) -> Result<ShopResponse, ShopError> {
        if spec.items.is_empty() {
            return Err(ShopError::EmptySpec);
        }
        info!(items = spec.items.len(), "shop: searching");
        self.post_json(self.endpoints.shop(), spec, "Shop request failed")
            .await
    }

    /// Re-runs the search for a single category with the context of the last
    /// spec, optionally replacing that category's preferences.
    pub async fn refine_category(
        &self,
        last_spec: &ShoppingSpec,
        category: &str,
        preferences_override: Option<&str>,
    ) -> Result<ShopResponse, ShopError> {
        let spec = refine_spec(last_spec, category, preferences_override);
        info!(category, "shop: refining category");
        self.post_json(self.endpoints.shop(), &spec, "Refine failed")
            .await
    }

    async fn post_json<B, R>(&self, url: &Url, body: &B, fallback: &str) -> Result<R, ShopError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self.http.post(url.clone()).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let error: ApiError = serde_json::from_str(&text).unwrap_or_default();
            return Err(ApiException::from_body(status.as_u16(), &error, fallback).into());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// One-item spec for refining `category`. The query is matched against the
/// last spec case-insensitively; unknown categories search for themselves.
pub fn refine_spec(
    last_spec: &ShoppingSpec,
    category: &str,
    preferences_override: Option<&str>,
) -> ShoppingSpec {
    let item = last_spec
        .items
        .iter()
        .find(|item| item.query.to_lowercase() == category.to_lowercase());

    let query = item
        .map(|item| item.query.clone())
        .filter(|query| !query.is_empty())
        .unwrap_or_else(|| category.to_string());
    let preferences = match preferences_override {
        Some(preferences) => preferences.trim().to_string(),
        None => item.map(|item| item.preferences.clone()).unwrap_or_default(),
    };

    ShoppingSpec {
        delivery_pincode: last_spec.delivery_pincode.clone(),
        delivery_deadline_date: last_spec.delivery_deadline_date.clone(),
        total_budget: last_spec.total_budget.clone(),
        budget_currency: Some(
            last_spec
                .budget_currency
                .clone()
                .filter(|currency| !currency.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        ),
        items: vec![SpecItem { query, preferences }],
    }
}

/// Replaces `category` in `previous` with the matching entry of a
/// single-category response. Falls back to the response's first entry when
/// the backend renamed the category.
pub fn merge_category_into_results(
    mut previous: ShopResponse,
    refined: ShopResponse,
    category: &str,
) -> ShopResponse {
    if let Some(mut new_items) = refined.final_results.map(|results| results.items) {
        if let Some(key) = pick_key(&new_items, category) {
            if let Some(value) = new_items.remove(&key) {
                previous
                    .final_results
                    .get_or_insert_with(FinalResults::default)
                    .items
                    .insert(key, value);
            }
        }
    }

    if let Some(mut new_raw) = refined.raw_results {
        if let Some(key) = pick_key(&new_raw, category) {
            if let Some(value) = new_raw.remove(&key) {
                previous
                    .raw_results
                    .get_or_insert_with(Default::default)
                    .insert(key, value);
            }
        }
    }

    previous
}

fn pick_key(map: &serde_json::Map<String, serde_json::Value>, category: &str) -> Option<String> {
    if map.contains_key(category) {
        Some(category.to_string())
    } else {
        map.keys().next().cloned()
    }
}

/// Search results and the spec that produced them.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    results: Option<ShopResponse>,
    last_spec: Option<ShoppingSpec>,
}

impl SearchState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn results(&self) -> Option<&ShopResponse> {
        self.results.as_ref()
    }

    pub fn last_spec(&self) -> Option<&ShoppingSpec> {
        self.last_spec.as_ref()
    }

    pub async fn search(
        &mut self,
        client: &ShopClient,
        spec: ShoppingSpec,
    ) -> Result<&ShopResponse, ShopError> {
        if spec.items.is_empty() {
            return Err(ShopError::EmptySpec);
        }
        let response = client.run_shop(&spec).await;
        self.last_spec = Some(spec);
        Ok(self.results.insert(response?))
    }

    pub async fn refine(
        &mut self,
        client: &ShopClient,
        category: &str,
        preferences_override: Option<&str>,
    ) -> Result<(), ShopError> {
        let last_spec = self.last_spec.as_ref().ok_or(ShopError::NoSpec)?;
        let refined = client
            .refine_category(last_spec, category, preferences_override)
            .await?;

        self.results = Some(match self.results.take() {
            Some(previous) => merge_category_into_results(previous, refined, category),
            None => refined,
        });
        Ok(())
    }

    pub fn clear(&mut self) {
        self.results = None;
        self.last_spec = None;
    }

    pub fn categories(&self) -> Vec<CategoryData> {
        build_category_data(
            self.results
                .as_ref()
                .and_then(|results| results.final_results.as_ref()),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryData {
    pub category: String,
    pub best_pick: Option<Product>,
    pub alternatives: Vec<Product>,
}

/// Products per category in server order. Categories without any pick are
/// left out.
pub fn build_category_data(final_results: Option<&FinalResults>) -> Vec<CategoryData> {
    let Some(final_results) = final_results else {
        return Vec::new();
    };

    final_results
        .items
        .iter()
        .filter_map(|(category, value)| {
            let result: CategoryResult =
                serde_json::from_value(value.clone()).unwrap_or_default();
            let picks = result.recommendations;

            let best_pick = picks.best_pick.as_ref().map(|pick| Product {
                is_best_pick: true,
                ..map_pick_to_product(pick, category, 0)
            });
            let alternatives: Vec<Product> = [(&picks.runner_up, 1), (&picks.budget_pick, 2)]
                .into_iter()
                .filter_map(|(pick, index)| {
                    pick.as_ref()
                        .map(|pick| map_pick_to_product(pick, category, index))
                })
                .collect();

            (best_pick.is_some() || !alternatives.is_empty()).then(|| CategoryData {
                category: category.clone(),
                best_pick,
                alternatives,
            })
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

pub fn map_pick_to_product(pick: &Pick, category: &str, index: usize) -> Product {
    let link = non_empty(&pick.link);
    let id = match link {
        Some(link) => {
            let tail_start = link.chars().count().saturating_sub(LINK_TAIL_CHARS);
            let tail: String = link.chars().skip(tail_start).collect();
            format!("search-{category}-{index}-{tail}")
        }
        None => format!("search-{category}-{index}"),
    };

    Product {
        id: ItemId::new(id),
        name: non_empty(&pick.title)
            .unwrap_or(DEFAULT_PRODUCT_NAME)
            .to_string(),
        brand: non_empty(&pick.source).unwrap_or(DEFAULT_BRAND).to_string(),
        price: parse_price(pick.price.as_deref().unwrap_or_default()),
        original_price: None,
        image: non_empty(&pick.image_link)
            .or_else(|| non_empty(&pick.thumbnail))
            .unwrap_or(PLACEHOLDER_IMAGE)
            .to_string(),
        rating: DEFAULT_RATING,
        reviews: 0,
        delivery: non_empty(&pick.delivery)
            .unwrap_or(DEFAULT_DELIVERY)
            .to_string(),
        reason: pick.reasoning.clone().unwrap_or_default(),
        url: link.unwrap_or_default().to_string(),
        is_best_pick: false,
    }
}

/// Reads a display price such as `"$1,299.99"`. Only digits and dots count,
/// and anything from a second dot on is ignored, so a dotted currency prefix
/// misreads: `"Rs. 450"` becomes `0.45`.
pub fn parse_price(raw: &str) -> f64 {
    let digits: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    let number = match digits.match_indices('.').nth(1) {
        Some((second_dot, _)) => &digits[..second_dot],
        None => digits.as_str(),
    };
    number
        .parse::<f64>()
        .ok()
        .filter(|price| price.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
#[path = "tests/shop_tests.rs"]
mod tests;

use async_trait::async_trait;
use shared::{
    domain::{ItemId, Product},
    protocol::{CheckoutCart, CheckoutItem},
};
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub struct CartEntry {
    pub product: Product,
    pub quantity: u32,
}

/// In-memory cart keyed by product id, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    fn position(&self, id: &ItemId) -> Option<usize> {
        self.entries.iter().position(|entry| &entry.product.id == id)
    }

    pub fn quantity(&self, id: &ItemId) -> u32 {
        self.position(id)
            .map(|index| self.entries[index].quantity)
            .unwrap_or(0)
    }

    /// Adds one unit, refreshing the stored product details.
    pub fn add(&mut self, product: Product) {
        match self.position(&product.id) {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.quantity = entry.quantity.saturating_add(1);
                entry.product = product;
            }
            None => self.entries.push(CartEntry {
                product,
                quantity: 1,
            }),
        }
    }

    pub fn remove(&mut self, id: &ItemId) {
        self.entries.retain(|entry| &entry.product.id != id);
    }

    /// Sets the quantity of an existing entry; zero removes it.
    pub fn update_quantity(&mut self, id: &ItemId, quantity: u32) {
        if quantity == 0 {
            self.remove(id);
            return;
        }
        if let Some(index) = self.position(id) {
            self.entries[index].quantity = quantity;
        }
    }

    /// Inserts or replaces an entry with an explicit quantity; zero removes it.
    pub fn set_product_quantity(&mut self, product: Product, quantity: u32) {
        if quantity == 0 {
            self.remove(&product.id);
            return;
        }
        match self.position(&product.id) {
            Some(index) => self.entries[index] = CartEntry { product, quantity },
            None => self.entries.push(CartEntry { product, quantity }),
        }
    }

    pub fn products(&self) -> Vec<&CartEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.quantity > 0)
            .collect()
    }

    /// Entries the executor can act on, i.e. the ones with a purchase link.
    pub fn checkout_cart(&self) -> CheckoutCart {
        CheckoutCart {
            items: self
                .products()
                .into_iter()
                .filter(|entry| entry.product.has_purchase_link())
                .map(|entry| CheckoutItem {
                    item_id: entry.product.id.clone(),
                    url: entry.product.url.clone(),
                    quantity: entry.quantity,
                    title: entry.product.name.clone(),
                    name: entry.product.name.clone(),
                    brand: entry.product.brand.clone(),
                })
                .collect(),
        }
    }

    pub fn total_items(&self) -> u32 {
        self.entries.iter().map(|entry| entry.quantity).sum()
    }

    pub fn total_price(&self) -> f64 {
        self.entries
            .iter()
            .map(|entry| entry.product.price * f64::from(entry.quantity))
            .sum()
    }

    pub fn total_savings(&self) -> f64 {
        self.entries
            .iter()
            .filter_map(|entry| {
                entry
                    .product
                    .original_price
                    .map(|original| (original - entry.product.price) * f64::from(entry.quantity))
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// What the checkout flow needs from whoever owns the cart.
#[async_trait]
pub trait CartStore: Send + Sync {
    async fn checkout_items(&self) -> Vec<CheckoutItem>;
    async fn clear_cart(&self);
}

#[async_trait]
impl CartStore for Mutex<Cart> {
    async fn checkout_items(&self) -> Vec<CheckoutItem> {
        self.lock().await.checkout_cart().items
    }

    async fn clear_cart(&self) {
        self.lock().await.clear();
    }
}

#[cfg(test)]
#[path = "tests/cart_tests.rs"]
mod tests;

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::{
    models::{Article, CartItem},
    storage::{Storage, CART_KEY},
};

/// Ordered cart lines, each bounded by its article's stock.
///
/// Every mutation writes the full item list back to storage before
/// returning. Quantities always satisfy `1 <= quantity <= article.stock`
/// for articles that still have stock.
pub struct CartStore {
    storage: Arc<dyn Storage>,
    items: Vec<CartItem>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("items", &self.items)
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Build a cart and rehydrate it from storage.
    ///
    /// Unreadable or malformed stored data is logged and yields an empty cart.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let mut store = Self {
            storage,
            items: Vec::new(),
        };
        store.load_from_storage();
        store
    }

    /// Add `quantity` units of `article`, capped at its stock.
    ///
    /// An existing line grows to `min(existing + quantity, stock)` and takes
    /// the incoming article as its snapshot; a line whose article has run out
    /// of stock is dropped. Returns the resulting quantity, zero when the
    /// article is not in the cart afterwards.
    pub fn add_item(&mut self, article: &Article, quantity: u32) -> u32 {
        let resulting = match self.position(article.id) {
            Some(index) => {
                let item = &mut self.items[index];
                let next = item.quantity.saturating_add(quantity).min(article.stock);
                if next == 0 {
                    warn!(article_id = article.id, "article is out of stock, dropping cart line");
                    self.items.remove(index);
                    self.save_to_storage();
                    return 0;
                }
                item.article = article.clone();
                item.quantity = next;
                next
            }
            None => {
                let initial = quantity.min(article.stock);
                if initial == 0 {
                    warn!(article_id = article.id, requested = quantity, "nothing to add to cart");
                    return 0;
                }
                self.items.push(CartItem {
                    article: article.clone(),
                    quantity: initial,
                });
                initial
            }
        };
        debug!(article_id = article.id, quantity = resulting, "cart item added");
        self.save_to_storage();
        resulting
    }

    /// Drop the line for `article_id`. Absent lines are ignored.
    pub fn remove_item(&mut self, article_id: u64) {
        self.items.retain(|item| item.article.id != article_id);
        self.save_to_storage();
    }

    /// Set the quantity of an existing line, clamped into `[1, stock]`.
    ///
    /// Absent lines are ignored. Returns the stored quantity when the line exists.
    pub fn update_quantity(&mut self, article_id: u64, quantity: i64) -> Option<u32> {
        let index = self.position(article_id)?;
        let item = &mut self.items[index];
        let clamped = quantity.min(i64::from(item.article.stock)).max(1);
        item.quantity = u32::try_from(clamped).unwrap_or(1);
        let updated = item.quantity;
        self.save_to_storage();
        Some(updated)
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.items.clear();
        self.save_to_storage();
    }

    /// Sum of all line quantities.
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Sum of `quantity * price` over all lines.
    pub fn total(&self) -> f64 {
        self.items.iter().map(CartItem::subtotal).sum()
    }

    /// Whether a line exists for `article_id`.
    pub fn is_in_cart(&self, article_id: u64) -> bool {
        self.position(article_id).is_some()
    }

    /// Quantity held for `article_id`, or 0.
    pub fn item_quantity(&self, article_id: u64) -> u32 {
        self.position(article_id)
            .map(|index| self.items[index].quantity)
            .unwrap_or(0)
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn position(&self, article_id: u64) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.article.id == article_id)
    }

    fn save_to_storage(&self) {
        let serialized = match serde_json::to_string(&self.items) {
            Ok(serialized) => serialized,
            Err(err) => {
                error!("failed to serialize cart: {err}");
                return;
            }
        };
        if let Err(err) = self.storage.set(CART_KEY, &serialized) {
            error!("failed to save cart: {err}");
        }
    }

    fn load_from_storage(&mut self) {
        let stored = match self.storage.get(CART_KEY) {
            Ok(Some(stored)) if !stored.trim().is_empty() => stored,
            Ok(_) => return,
            Err(err) => {
                error!("failed to read cart: {err}");
                return;
            }
        };
        match serde_json::from_str::<Vec<CartItem>>(&stored) {
            Ok(items) => {
                debug!(lines = items.len(), "restored cart");
                self.items = items;
            }
            Err(err) => {
                error!("failed to load cart: {err}");
                self.items.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::fixtures::article,
        storage::{FileStorage, MemoryStorage, NoopStorage},
    };
    use tempfile::tempdir;

    fn empty_cart() -> (Arc<MemoryStorage>, CartStore) {
        let storage = Arc::new(MemoryStorage::new());
        let cart = CartStore::load(storage.clone());
        (storage, cart)
    }

    #[test]
    fn add_caps_new_item_at_stock() {
        for (requested, stock, expected) in [(3, 5, 3), (9, 5, 5), (1, 1, 1)] {
            let (_, mut cart) = empty_cart();
            assert_eq!(cart.add_item(&article(1, stock, 1.0), requested), expected);
            assert_eq!(cart.item_quantity(1), expected);
        }
    }

    #[test]
    fn repeated_add_caps_the_sum_not_each_part() {
        let (_, mut cart) = empty_cart();
        let mate = article(1, 5, 1.0);
        cart.add_item(&mate, 3);
        cart.add_item(&mate, 4);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_quantity(1), 5);
    }

    #[test]
    fn add_refreshes_article_snapshot() {
        let (_, mut cart) = empty_cart();
        cart.add_item(&article(1, 5, 1.0), 2);
        cart.add_item(&article(1, 3, 2.0), 4);

        assert_eq!(cart.item_quantity(1), 3);
        assert_eq!(cart.items()[0].article.stock, 3);
        assert_eq!(cart.total(), 6.0);
    }

    #[test]
    fn out_of_stock_article_is_not_added() {
        let (storage, mut cart) = empty_cart();
        assert_eq!(cart.add_item(&article(1, 0, 1.0), 2), 0);
        assert!(cart.is_empty());
        assert!(!cart.is_in_cart(1));
        assert!(storage.is_empty());
    }

    #[test]
    fn sold_out_article_drops_existing_line() -> anyhow::Result<()> {
        let (storage, mut cart) = empty_cart();
        cart.add_item(&article(1, 5, 1.0), 3);
        cart.add_item(&article(2, 5, 1.0), 1);

        assert_eq!(cart.add_item(&article(1, 0, 1.0), 1), 0);
        assert!(!cart.is_in_cart(1));
        assert_eq!(cart.item_quantity(1), 0);
        assert_eq!(cart.total_items(), 1);

        let reloaded = CartStore::load(storage.clone());
        assert!(!reloaded.is_in_cart(1));
        assert!(reloaded.is_in_cart(2));
        Ok(())
    }

    #[test]
    fn update_quantity_clamps_into_range() {
        let (_, mut cart) = empty_cart();
        cart.add_item(&article(1, 5, 1.0), 2);

        for (requested, expected) in [(0, 1), (-7, 1), (4, 4), (99, 5), (i64::MAX, 5)] {
            assert_eq!(cart.update_quantity(1, requested), Some(expected));
            assert_eq!(cart.item_quantity(1), expected);
        }
    }

    #[test]
    fn absent_lines_are_ignored() {
        let (_, mut cart) = empty_cart();
        cart.add_item(&article(1, 5, 1.0), 2);

        assert_eq!(cart.update_quantity(42, 3), None);
        cart.remove_item(42);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_quantity(42), 0);
    }

    #[test]
    fn totals_accept_string_prices() -> anyhow::Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(
            CART_KEY,
            r#"[
                {"article": {"id": 1, "nombre": "A", "descripcion": "", "stock": 9, "precio": "10.50",
                  "vendedorId": 7, "createdAt": "2024-05-01T12:00:00Z", "updatedAt": "2024-05-01T12:00:00Z"},
                 "cantidad": 2},
                {"article": {"id": 2, "nombre": "B", "descripcion": "", "stock": 9, "precio": 5,
                  "vendedorId": 7, "createdAt": "2024-05-01T12:00:00Z", "updatedAt": "2024-05-01T12:00:00Z"},
                 "cantidad": 1}
            ]"#,
        )?;

        let cart = CartStore::load(storage);
        assert_eq!(cart.total_items(), 3);
        assert_eq!(cart.total(), 26.0);
        Ok(())
    }

    #[test]
    fn mutations_write_through() -> anyhow::Result<()> {
        let dir = tempdir()?;
        let storage: Arc<dyn Storage> = Arc::new(FileStorage::new(dir.path()));
        let mut cart = CartStore::load(storage.clone());
        cart.add_item(&article(1, 5, 2.5), 2);
        cart.add_item(&article(2, 3, 4.0), 1);
        cart.update_quantity(2, 3);

        let reloaded = CartStore::load(storage.clone());
        assert_eq!(reloaded.items(), cart.items());

        cart.remove_item(1);
        assert_eq!(CartStore::load(storage.clone()).items().len(), 1);

        cart.clear();
        assert!(CartStore::load(storage.clone()).is_empty());
        assert_eq!(storage.get(CART_KEY)?.as_deref(), Some("[]"));
        Ok(())
    }

    #[test]
    fn malformed_stored_cart_loads_empty() -> anyhow::Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(CART_KEY, "[{\"article\": 1}]")?;

        let mut cart = CartStore::load(storage.clone());
        assert!(cart.is_empty());

        cart.add_item(&article(3, 2, 1.0), 1);
        assert_eq!(CartStore::load(storage).item_quantity(3), 1);
        Ok(())
    }

    #[test]
    fn noop_storage_keeps_cart_in_memory() {
        let mut cart = CartStore::load(Arc::new(NoopStorage));
        cart.add_item(&article(1, 5, 1.0), 2);
        assert_eq!(cart.total_items(), 2);
        assert!(CartStore::load(Arc::new(NoopStorage)).is_empty());
    }
}

//! Cart editing commands.
//!
//! # Usage
//!
//! ```bash
//! qb-cli show
//! qb-cli add -n Mango -p 20 -q 2 --image mango.png
//! qb-cli remove -n Mango
//! qb-cli clear
//! ```
//!
//! Lines are keyed by trimmed name, the same way the storefront merges
//! repeated adds of one product.

use quickbasket_cart_storage::{CartStore, StorageBackend};
use quickbasket_core::{CartItem, Quantity, UnitPrice, cart_subtotal};

use super::CommandError;

/// Arguments for [`add`].
#[derive(Debug, Clone)]
pub struct AddItem {
    pub name: String,
    pub price: String,
    pub quantity: u64,
    pub image: Option<String>,
    pub id: Option<String>,
}

impl AddItem {
    fn to_item(&self) -> Result<CartItem, CommandError> {
        let price = UnitPrice::parse(&self.price)?;
        let quantity = Quantity::new(self.quantity)?;

        let mut item = CartItem::new(&self.name, price, quantity)?;
        if let Some(image) = &self.image {
            item = item.with_image(image.as_str());
        }
        if let Some(id) = &self.id {
            item = item.with_id(id.as_str());
        }
        Ok(item)
    }
}

/// Print the stored cart and its subtotal.
pub fn show<B: StorageBackend>(store: &CartStore<B>) -> Result<(), CommandError> {
    let items = store.load_cart();
    let rendered = serde_json::to_string_pretty(&items)?;

    #[allow(clippy::print_stdout)]
    {
        println!("{rendered}");
        println!("subtotal: {:.2}", cart_subtotal(&items));
    }
    Ok(())
}

/// Add an item, merging with an existing line of the same name.
pub fn add<B: StorageBackend>(store: &CartStore<B>, args: &AddItem) -> Result<(), CommandError> {
    let item = args.to_item()?;
    let name = item.name().to_owned();

    let items = merge_item(store.load_cart(), item);
    if !store.save_cart(&items) {
        return Err(CommandError::SaveFailed);
    }

    tracing::info!(name = %name, lines = items.len(), "Item added");
    Ok(())
}

/// Remove the line named `name`.
pub fn remove<B: StorageBackend>(store: &CartStore<B>, name: &str) -> Result<(), CommandError> {
    let mut items = store.load_cart();
    let before = items.len();
    items.retain(|item| item.name() != name.trim());

    if items.len() == before {
        return Err(CommandError::NotFound(name.to_owned()));
    }
    if !store.save_cart(&items) {
        return Err(CommandError::SaveFailed);
    }

    tracing::info!(name, "Item removed");
    Ok(())
}

/// Delete the stored cart.
pub fn clear<B: StorageBackend>(store: &CartStore<B>) -> Result<(), CommandError> {
    if store.clear_cart() {
        Ok(())
    } else {
        Err(CommandError::ClearFailed)
    }
}

/// Merge `item` into `items` by name.
///
/// An existing line keeps its position and id, gains the new quantity, and
/// takes the new price. The image is replaced only when the new one is set.
fn merge_item(mut items: Vec<CartItem>, item: CartItem) -> Vec<CartItem> {
    let Some(existing) = items.iter_mut().find(|line| line.name() == item.name()) else {
        items.push(item);
        return items;
    };

    let mut merged = existing
        .clone()
        .with_quantity(existing.quantity().saturating_add(item.quantity()))
        .with_price(item.price());
    if !item.image().is_empty() {
        merged = merged.with_image(item.image());
    }
    *existing = merged;
    items
}

//! Random demo orders

use rand::Rng;
use rand::seq::SliceRandom;
use shared::kitchen::{KitchenItem, KitchenOrder, OrderId, OrderStatus, ServiceKind};

const DISHES: &[&str] = &[
    "Samosa",
    "Paneer Tikka",
    "Butter Chicken",
    "Dal Makhani",
    "Garlic Naan",
    "Biryani",
];
const DRINKS: &[&str] = &["Mango Lassi", "Masala Chai"];
const NOTES: &[&str] = &["No onion", "Extra spicy", "Allergy: nuts"];

fn random_item(rng: &mut impl Rng, area: &str) -> KitchenItem {
    // 饮品由吧台制作，不在厨房屏幕显示
    let (name, prep) = if rng.gen_bool(0.2) {
        (DRINKS.choose(rng).copied().unwrap_or("Water"), "bar")
    } else {
        (DISHES.choose(rng).copied().unwrap_or("Thali"), area)
    };

    KitchenItem {
        name: name.to_string(),
        quantity: rng.gen_range(1..4),
        prep: Some(prep.to_string()),
    }
}

/// Random order waiting in the kitchen, stamped with `timestamp`
pub fn random_order(rng: &mut impl Rng, seq: u32, area: &str, timestamp: i64) -> KitchenOrder {
    let service = if rng.gen_bool(0.5) {
        ServiceKind::DineIn
    } else {
        ServiceKind::Takeaway
    };
    let table = match service {
        ServiceKind::DineIn => rng.gen_range(1..20).to_string(),
        ServiceKind::Takeaway => "-".to_string(),
    };
    let count = rng.gen_range(1..5);

    KitchenOrder {
        id: OrderId::new(format!("demo-{seq}")),
        label: format!("K-{seq:03}"),
        table,
        service,
        items: (0..count).map(|_| random_item(rng, area)).collect(),
        notes: rng
            .gen_bool(0.3)
            .then(|| NOTES.choose(rng).copied().unwrap_or_default().to_string()),
        timestamp: Some(timestamp),
        status: OrderStatus::InKitchen,
    }
}
